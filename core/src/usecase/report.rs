use tracing::{debug, warn};

use crate::config::ReportConfig;
use crate::error::AnalyticsResult;
use crate::model::collection::RecordCollection;
use crate::model::monthly::MonthlyCollectionSet;
use crate::service::dto::SummaryDto;
use crate::service::report::ReportFormatter;

/// Builds reports for the configured region of a working collection.
pub struct ReportUseCase<'a> {
    records: RecordCollection,
    config: &'a ReportConfig,
}

impl<'a> ReportUseCase<'a> {
    pub fn new(working: &RecordCollection, config: &'a ReportConfig) -> Self {
        let records = working.for_region(&config.region);
        debug!(region = %config.region, count = records.len(), "selected region");
        Self { records, config }
    }

    pub fn records(&self) -> &RecordCollection {
        &self.records
    }

    pub fn general(&self) -> AnalyticsResult<String> {
        ReportFormatter::new(&self.records)
            .format_general(self.config.upper_threshold, self.config.lower_threshold)
    }

    pub fn histogram(&self) -> AnalyticsResult<String> {
        ReportFormatter::new(&self.records).format_histogram(self.config.bin_size)
    }

    /// Partitions the region's records afresh and formats every non-empty month.
    pub fn monthly(&self) -> AnalyticsResult<String> {
        let monthly = MonthlyCollectionSet::partition(&self.records)?;
        Ok(ReportFormatter::format_monthly(&monthly))
    }

    /// General, histogram and monthly sections. A section that cannot be
    /// computed is replaced by a one-line explanation.
    pub fn full_report(&self) -> String {
        let sections = [
            ("General", self.general()),
            ("Histogram", self.histogram()),
            ("Monthly", self.monthly()),
        ];

        let mut out = format!("COVID-19 Report for {}\n", self.config.region);
        for (title, section) in sections {
            out.push('\n');
            match section {
                Ok(text) => out.push_str(&text),
                Err(e) => {
                    warn!(section = title, error = %e, "report section unavailable");
                    out.push_str(&format!("{}: {}\n", title, e));
                }
            }
        }
        out
    }

    pub fn summary(&self) -> SummaryDto {
        SummaryDto::from_collection(&self.records, self.config)
    }
}
