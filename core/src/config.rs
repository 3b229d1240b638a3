use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalyticsError;

pub const DEFAULT_REGION: &str = "GA";
pub const DEFAULT_UPPER_THRESHOLD: u32 = 2500;
pub const DEFAULT_LOWER_THRESHOLD: u32 = 1000;
pub const DEFAULT_BIN_SIZE: u32 = 500;

const DATA_DIR_NAME: &str = ".covidstats";
const CONFIG_FILE_NAME: &str = "config.json";

/// Report parameters: the region to analyse, the day-count thresholds and the histogram bin size.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub region: String,
    pub upper_threshold: u32,
    pub lower_threshold: u32,
    pub bin_size: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            upper_threshold: DEFAULT_UPPER_THRESHOLD,
            lower_threshold: DEFAULT_LOWER_THRESHOLD,
            bin_size: DEFAULT_BIN_SIZE,
        }
    }
}

impl ReportConfig {
    /// Reads `config.json` from `data_dir`, falling back to defaults when it is absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: ReportConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        self.validate()?;
        fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(data_dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), AnalyticsError> {
        if self.bin_size < 1 {
            return Err(AnalyticsError::InvalidArgument(format!(
                "bin size must be at least 1, got {}",
                self.bin_size
            )));
        }
        if self.region.trim().is_empty() {
            return Err(AnalyticsError::InvalidArgument("region must not be empty".to_string()));
        }
        Ok(())
    }
}

/// `~/.covidstats` unless a directory is given.
pub fn resolve_data_dir(base_dir: Option<PathBuf>) -> Result<PathBuf> {
    match base_dir {
        Some(dir) => Ok(dir),
        None => {
            let home_dir = dirs::home_dir()
                .ok_or_else(|| anyhow!("Could not determine home directory"))?;
            Ok(home_dir.join(DATA_DIR_NAME))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = ReportConfig::load(dir.path())?;
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.bin_size, 500);
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let dir = tempdir()?;
        let config = ReportConfig {
            region: "AL".to_string(),
            upper_threshold: 100,
            lower_threshold: 10,
            bin_size: 25,
        };
        config.save(dir.path())?;

        assert_eq!(ReportConfig::load(dir.path())?, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"bin_size": 250}"#)?;

        let config = ReportConfig::load(dir.path())?;
        assert_eq!(config.bin_size, 250);
        assert_eq!(config.region, DEFAULT_REGION);
        Ok(())
    }

    #[test]
    fn test_zero_bin_size_is_rejected() {
        let config = ReportConfig { bin_size: 0, ..ReportConfig::default() };
        assert!(matches!(config.validate(), Err(AnalyticsError::InvalidArgument(_))));
    }

    #[test]
    fn test_load_rejects_invalid_saved_config() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"bin_size": 0}"#)?;

        assert!(ReportConfig::load(dir.path()).is_err());
        Ok(())
    }
}
