use crate::model::collection::RecordCollection;
use anyhow::Result;

/// Persistent home of the working record collection.
pub trait RecordRepository {
    fn load(&self) -> Result<RecordCollection>;
    fn save(&self, records: &RecordCollection) -> Result<()>;
}
