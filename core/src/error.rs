use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised by the record collection and the queries built on it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Collection contains no elements")]
    EmptyCollection,
    #[error("Collection contains no days with positive cases")]
    NoPositiveRecords,
    #[error("No records qualify for {0}")]
    NoQualifyingRecords(&'static str),
    #[error("No record for {region} on {date}")]
    RecordNotFound { date: NaiveDate, region: String },
    #[error("Division by zero while computing {0}")]
    DivideByZero(&'static str),
}

pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;
