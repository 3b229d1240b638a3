use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::collection::RecordCollection;
use crate::repository::traits::RecordRepository;

const DEFAULT_FILE_NAME: &str = "records.json";

/// Stores the collection as a pretty-printed JSON array in `<data_dir>/records.json`.
#[derive(Clone)]
pub struct FileRecordRepository {
    file_path: PathBuf,
}

impl FileRecordRepository {
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Could not create {}", data_dir.display()))?;
        let path = data_dir.join(DEFAULT_FILE_NAME);

        if !path.exists() {
            let mut writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(&mut writer, &RecordCollection::new())?;
            writer.flush()?;
        }

        Ok(FileRecordRepository { file_path: path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl RecordRepository for FileRecordRepository {
    fn load(&self) -> Result<RecordCollection> {
        let file = File::open(&self.file_path)?;
        let reader = BufReader::new(file);
        let records: RecordCollection = serde_json::from_reader(reader)
            .with_context(|| format!("Corrupt record store at {}", self.file_path.display()))?;
        debug!(count = records.len(), "loaded records");
        Ok(records)
    }

    fn save(&self, records: &RecordCollection) -> Result<()> {
        let file = File::create(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush()?;
        debug!(count = records.len(), "saved records");
        Ok(())
    }
}
