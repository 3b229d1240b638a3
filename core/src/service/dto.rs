use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::error::AnalyticsResult;
use crate::model::collection::{RecordCollection, Segment};
use crate::model::record::CovidRecord;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DayDto {
    pub date: NaiveDate,
    pub value: u64,
}

impl DayDto {
    fn pick(result: AnalyticsResult<&CovidRecord>, value: impl Fn(&CovidRecord) -> u64) -> Option<Self> {
        result.ok().map(|r| Self {
            date: r.date(),
            value: value(r),
        })
    }
}

/// Flattened view of the general report section for `--json` output.
///
/// A query that cannot be answered for the collection serializes as `null`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SummaryDto {
    pub region: String,
    pub record_count: usize,
    pub first_positive_date: Option<NaiveDate>,

    pub highest_positive: Option<DayDto>,
    pub highest_negative: Option<DayDto>,
    pub highest_total_tests: Option<DayDto>,
    pub highest_deaths: Option<DayDto>,
    pub highest_hospitalized: Option<DayDto>,
    pub highest_current_hospitalized: Option<DayDto>,
    pub lowest_positive: Option<DayDto>,
    pub lowest_total_tests: Option<DayDto>,
    pub lowest_current_hospitalized: Option<DayDto>,

    pub highest_positive_percentage_date: Option<NaiveDate>,
    pub highest_positive_percentage: Option<f64>, // ratio, 0.25 == 25%

    pub average_positive_since_first_positive: Option<f64>,
    pub average_tests_per_day: Option<f64>,
    pub average_current_hospitalized: Option<f64>,
    pub overall_positivity_rate: Option<f64>,

    pub upper_threshold: u32,
    pub days_over_upper_threshold: Option<usize>,
    pub lower_threshold: u32,
    pub days_under_lower_threshold: Option<usize>,

    pub histogram: Option<Vec<Segment>>,
}

impl SummaryDto {
    pub fn from_collection(records: &RecordCollection, config: &ReportConfig) -> Self {
        let percentage_day = records.highest_positive_percentage_day().ok();

        Self {
            region: config.region.clone(),
            record_count: records.len(),
            first_positive_date: records.first_positive_date().ok(),

            highest_positive: DayDto::pick(records.highest_positive_day(), |r| r.positive_increase().into()),
            highest_negative: DayDto::pick(records.highest_negative_day(), |r| r.negative_increase().into()),
            highest_total_tests: DayDto::pick(records.highest_test_day(), |r| r.total_tests()),
            highest_deaths: DayDto::pick(records.highest_death_day(), |r| r.death_increase().into()),
            highest_hospitalized: DayDto::pick(records.highest_hospitalized_day(), |r| {
                r.hospitalized_increase().into()
            }),
            highest_current_hospitalized: DayDto::pick(records.highest_current_hospitalized_day(), |r| {
                r.current_hospitalized().into()
            }),
            lowest_positive: DayDto::pick(records.lowest_positive_day(), |r| r.positive_increase().into()),
            lowest_total_tests: DayDto::pick(records.lowest_total_test_day(), |r| r.total_tests()),
            lowest_current_hospitalized: DayDto::pick(records.lowest_current_hospitalized_day(), |r| {
                r.current_hospitalized().into()
            }),

            highest_positive_percentage_date: percentage_day.map(|r| r.date()),
            highest_positive_percentage: percentage_day.map(|r| r.positive_percentage()),

            average_positive_since_first_positive: records.average_positive_cases_since_first_positive().ok(),
            average_tests_per_day: records.average_tests_per_day().ok(),
            average_current_hospitalized: records.average_current_hospitalized().ok(),
            overall_positivity_rate: records.overall_positivity_rate().ok(),

            upper_threshold: config.upper_threshold,
            days_over_upper_threshold: records.days_over_threshold(config.upper_threshold).ok(),
            lower_threshold: config.lower_threshold,
            days_under_lower_threshold: records.days_under_threshold(config.lower_threshold).ok(),

            histogram: records.histogram(config.bin_size).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::DailyCounts;

    fn record(day: u32, counts: DailyCounts) -> CovidRecord {
        CovidRecord::new(NaiveDate::from_ymd_opt(2020, 6, day).unwrap(), "GA", counts).unwrap()
    }

    #[test]
    fn test_summary_values() {
        let records: RecordCollection = vec![
            record(1, DailyCounts::new(0, 50, 0, 0, 0)),
            record(2, DailyCounts::new(3000, 7000, 200, 9, 14)),
            record(3, DailyCounts::new(500, 1500, 150, 2, 6)),
        ]
        .into();
        let summary = SummaryDto::from_collection(&records, &ReportConfig::default());

        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.first_positive_date, NaiveDate::from_ymd_opt(2020, 6, 2));
        let highest = summary.highest_positive.unwrap();
        assert_eq!(highest.value, 3000);
        assert_eq!(summary.highest_total_tests.unwrap().value, 10000);
        assert_eq!(summary.lowest_current_hospitalized.unwrap().value, 150);
        assert_eq!(summary.days_over_upper_threshold, Some(1));
        assert_eq!(summary.days_under_lower_threshold, Some(1));
        assert_eq!(summary.histogram.map(|h| h.len()), Some(6));
        let rate = summary.overall_positivity_rate.unwrap();
        assert!((rate - 3500.0 / 12050.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_collection_serializes_nulls() {
        let summary = SummaryDto::from_collection(&RecordCollection::new(), &ReportConfig::default());
        assert!(summary.highest_positive.is_none());
        assert!(summary.histogram.is_none());

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["first_positive_date"].is_null());
        assert!(json["histogram"].is_null());
        assert_eq!(json["region"], "GA");
    }

    #[test]
    fn test_no_positive_days_gives_empty_histogram() {
        let records: RecordCollection = vec![record(1, DailyCounts::new(0, 50, 0, 0, 0))].into();
        let summary = SummaryDto::from_collection(&records, &ReportConfig::default());

        assert_eq!(summary.histogram, Some(vec![]));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["histogram"], serde_json::json!([]));
    }

    #[test]
    fn test_unusable_bin_size_serializes_null_histogram() {
        let records: RecordCollection = vec![record(1, DailyCounts::new(7, 50, 0, 0, 0))].into();
        let config = ReportConfig { bin_size: 0, ..ReportConfig::default() };
        let summary = SummaryDto::from_collection(&records, &config);

        assert!(summary.histogram.is_none());
        assert_eq!(summary.record_count, 1);
    }
}
