use anyhow::Result;
use tracing::info;

use crate::model::collection::{DuplicateResolution, RecordCollection, Resolution};
use crate::model::record::CovidRecord;
use crate::repository::RecordRepository;

/// What to do with the working collection when a file is imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Discard the working collection and keep only the imported records.
    Replace,
    /// Add the imported records, resolving days that already exist.
    Merge(DuplicateResolution),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub replaced: usize,
    pub merged: usize,
}

impl ImportSummary {
    fn record(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Added => self.added += 1,
            Resolution::Replaced => self.replaced += 1,
            Resolution::Merged => self.merged += 1,
        }
    }
}

pub struct ImportUseCase<'a, R: RecordRepository> {
    repo: &'a R,
}

impl<'a, R: RecordRepository> ImportUseCase<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub fn import(&self, incoming: RecordCollection, action: FileAction) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        let working = match action {
            FileAction::Replace => {
                summary.added = incoming.len();
                incoming
            }
            FileAction::Merge(mode) => {
                let mut working = self.repo.load()?;
                for record in incoming {
                    summary.record(working.insert_or_resolve(record, mode)?);
                }
                working
            }
        };

        self.repo.save(&working)?;
        info!(
            added = summary.added,
            replaced = summary.replaced,
            merged = summary.merged,
            total = working.len(),
            "import finished"
        );
        Ok(summary)
    }

    /// Adds one record, resolving an existing day with `mode`.
    pub fn add(&self, record: CovidRecord, mode: DuplicateResolution) -> Result<Resolution> {
        let mut working = self.repo.load()?;
        let resolution = working.insert_or_resolve(record, mode)?;
        self.repo.save(&working)?;
        Ok(resolution)
    }
}
