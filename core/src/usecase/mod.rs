pub mod import;
pub mod report;

pub use import::{FileAction, ImportSummary, ImportUseCase};
pub use report::ReportUseCase;
