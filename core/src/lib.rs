pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod repository;
pub mod service;
pub mod time;
pub mod usecase;

pub use config::{resolve_data_dir, ReportConfig};
pub use error::{AnalyticsError, AnalyticsResult};
pub use loader::{load_csv_file, load_csv_str, write_csv, LoadOutcome};
pub use model::collection::{DuplicateResolution, RecordCollection, Resolution, Segment};
pub use model::monthly::MonthlyCollectionSet;
pub use model::record::{CovidRecord, DailyCounts};
pub use repository::{FileRecordRepository, RecordRepository};
pub use service::dto::SummaryDto;
pub use service::report::ReportFormatter;
pub use time::{parse_human_date, parse_record_date};
pub use usecase::{FileAction, ImportSummary, ImportUseCase, ReportUseCase};
