use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::{info, warn};

use crate::model::collection::RecordCollection;
use crate::model::record::{CovidRecord, DailyCounts};
use crate::time::parse_record_date;

const HEADER: [&str; 7] = [
    "date",
    "state",
    "positiveIncrease",
    "negativeIncrease",
    "hospitalizedCurrently",
    "hospitalizedIncrease",
    "deathIncrease",
];

const DATE_FIELD: usize = 0;
const STATE_FIELD: usize = 1;
const POSITIVE_FIELD: usize = 2;
const NEGATIVE_FIELD: usize = 3;
const CURRENT_HOSPITALIZED_FIELD: usize = 4;
const HOSPITALIZED_FIELD: usize = 5;
const DEATH_FIELD: usize = 6;

/// Records parsed from a data file plus the lines that could not be used.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub records: Vec<CovidRecord>,
    /// Raw text of rejected lines keyed by 1-based line number.
    pub error_lines: BTreeMap<usize, String>,
}

impl LoadOutcome {
    pub fn for_region(&self, region: &str) -> RecordCollection {
        self.records
            .iter()
            .filter(|r| r.region() == region)
            .cloned()
            .collect()
    }

    pub fn into_collection(self) -> RecordCollection {
        self.records.into()
    }

    pub fn format_error_lines(&self) -> String {
        self.error_lines
            .iter()
            .map(|(line, text)| format!("Line {}: {}\n", line, text))
            .collect()
    }
}

/// Parses CSV text whose first line is a header.
///
/// Missing or empty counts become zero and negative counts are clamped to zero.
/// Lines with a bad date, a non-numeric count or no region are skipped and kept
/// in `error_lines`.
pub fn load_csv_str(text: &str) -> LoadOutcome {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut outcome = LoadOutcome::default();

    for result in reader.records() {
        match result {
            Ok(fields) => {
                let line = fields.position().map(|p| p.line() as usize).unwrap_or_default();
                match parse_fields(&fields) {
                    Ok(record) => outcome.records.push(record),
                    Err(e) => {
                        let raw = fields.iter().collect::<Vec<_>>().join(",");
                        warn!(line, error = %e, "skipping line");
                        outcome.error_lines.insert(line, raw);
                    }
                }
            }
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or_default();
                warn!(line, error = %e, "unreadable line");
                outcome.error_lines.insert(line, e.to_string());
            }
        }
    }

    info!(
        records = outcome.records.len(),
        errors = outcome.error_lines.len(),
        "parsed data file"
    );
    outcome
}

pub fn load_csv_file(path: &Path) -> Result<LoadOutcome> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow!("Could not read {}: {}", path.display(), e))?;
    Ok(load_csv_str(&text))
}

/// Writes records back out in the same column layout, with ISO dates.
pub fn write_csv<W: Write>(records: &RecordCollection, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(HEADER)?;

    for record in records {
        let counts = record.counts();
        writer.write_record([
            record.date().format("%Y-%m-%d").to_string(),
            record.region().to_string(),
            counts.positive_increase.to_string(),
            counts.negative_increase.to_string(),
            counts.current_hospitalized.to_string(),
            counts.hospitalized_increase.to_string(),
            counts.death_increase.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn parse_fields(fields: &StringRecord) -> Result<CovidRecord> {
    let date = parse_record_date(fields.get(DATE_FIELD).unwrap_or_default())?;
    let region = fields.get(STATE_FIELD).unwrap_or_default();

    let counts = DailyCounts {
        positive_increase: parse_count(fields.get(POSITIVE_FIELD))?,
        negative_increase: parse_count(fields.get(NEGATIVE_FIELD))?,
        current_hospitalized: parse_count(fields.get(CURRENT_HOSPITALIZED_FIELD))?,
        death_increase: parse_count(fields.get(DEATH_FIELD))?,
        hospitalized_increase: parse_count(fields.get(HOSPITALIZED_FIELD))?,
    };

    Ok(CovidRecord::new(date, region, counts)?)
}

fn parse_count(field: Option<&str>) -> Result<u32> {
    let text = match field {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(0),
    };

    let value: i64 = text
        .parse()
        .map_err(|_| anyhow!("Invalid count: {}", text))?;
    if value < 0 {
        return Ok(0);
    }
    u32::try_from(value).map_err(|_| anyhow!("Count out of range: {}", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
date,state,positiveIncrease,negativeIncrease,hospitalizedCurrently,hospitalizedIncrease,deathIncrease
10/14/2020,GA,1000,5000,300,20,15
10/15/2020,GA,-4,,,,
10/16/2020,AL,12,30,1,2,3
13/40/2020,GA,1,1,1,1,1
10/17/2020,GA,abc,1,1,1,1
10/18/2020,,1,1,1,1,1
10/19/2020,GA,7
";

    #[test]
    fn test_parses_valid_lines_and_collects_errors() {
        let outcome = load_csv_str(SAMPLE);

        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.error_lines.len(), 3);
        assert!(outcome.error_lines.contains_key(&5));
        assert!(outcome.error_lines.contains_key(&6));
        assert!(outcome.error_lines.contains_key(&7));
    }

    #[test]
    fn test_column_mapping() {
        let outcome = load_csv_str(SAMPLE);
        let first = &outcome.records[0];

        assert_eq!(first.date(), NaiveDate::from_ymd_opt(2020, 10, 14).unwrap());
        assert_eq!(first.region(), "GA");
        assert_eq!(first.counts(), DailyCounts::new(1000, 5000, 300, 15, 20));
    }

    #[test]
    fn test_missing_and_negative_counts_become_zero() {
        let outcome = load_csv_str(SAMPLE);

        assert_eq!(outcome.records[1].counts(), DailyCounts::default());
        assert_eq!(outcome.records[3].counts(), DailyCounts::new(7, 0, 0, 0, 0));
    }

    #[test]
    fn test_for_region() {
        let outcome = load_csv_str(SAMPLE);
        assert_eq!(outcome.for_region("GA").len(), 3);
        assert_eq!(outcome.for_region("AL").len(), 1);
    }

    #[test]
    fn test_format_error_lines() {
        let outcome = load_csv_str(SAMPLE);
        let text = outcome.format_error_lines();
        assert!(text.starts_with("Line 5: 13/40/2020,GA,1,1,1,1,1\n"));
    }

    #[test]
    fn test_written_csv_loads_back() {
        let outcome = load_csv_str(SAMPLE);
        let collection = outcome.for_region("GA");

        let mut buffer = Vec::new();
        write_csv(&collection, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("date,state,positiveIncrease"));
        let reloaded = load_csv_str(&text);
        assert!(reloaded.error_lines.is_empty());
        assert_eq!(reloaded.into_collection(), collection);
    }
}
