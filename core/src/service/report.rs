use chrono::Datelike;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::collection::RecordCollection;
use crate::model::monthly::MonthlyCollectionSet;
use crate::model::record::CovidRecord;
use crate::time::{ordinal_day, short_date};

/// Printed in a monthly section when a query has nothing to work with.
pub const INSUFFICIENT_DATA: &str = "insufficient data";

/// Renders query results from a [`RecordCollection`] as plain text.
pub struct ReportFormatter<'a> {
    records: &'a RecordCollection,
}

impl<'a> ReportFormatter<'a> {
    pub fn new(records: &'a RecordCollection) -> Self {
        Self { records }
    }

    /// Overall figures for the whole collection. Any failing query aborts the section.
    pub fn format_general(&self, upper_threshold: u32, lower_threshold: u32) -> AnalyticsResult<String> {
        let records = self.records;
        let first_positive = records.first_positive_date()?;
        let region = records
            .iter()
            .find(|r| r.date() == first_positive && r.positive_increase() > 0)
            .map(|r| r.region().to_string())
            .unwrap_or_default();

        let mut lines = Vec::new();
        lines.push(format!("First Positive Case in {}: {}", region, short_date(first_positive)));

        let day = records.highest_positive_day()?;
        lines.push(format!(
            "Highest Number of Positive Cases in a Single Day: {} with {} cases",
            short_date(day.date()),
            group_thousands(day.positive_increase().into())
        ));

        let day = records.highest_negative_day()?;
        lines.push(format!(
            "Highest Number of Negative Cases in a Single Day: {} with {} cases",
            short_date(day.date()),
            group_thousands(day.negative_increase().into())
        ));

        let day = records.highest_test_day()?;
        lines.push(format!(
            "Highest Number of Tests in a Single Day: {} with {} tests",
            short_date(day.date()),
            group_thousands(day.total_tests())
        ));

        let day = records.highest_death_day()?;
        lines.push(format!(
            "Highest Number of Deaths in a Single Day: {} with {} deaths",
            short_date(day.date()),
            group_thousands(day.death_increase().into())
        ));

        let day = records.highest_hospitalized_day()?;
        lines.push(format!(
            "Highest Number of Hospitalized in a Single Day: {} with {} hospitalized",
            short_date(day.date()),
            group_thousands(day.hospitalized_increase().into())
        ));

        let day = records.highest_current_hospitalized_day()?;
        lines.push(format!(
            "Highest Number of Currently Hospitalized in a Single Day: {} with {} hospitalized",
            short_date(day.date()),
            group_thousands(day.current_hospitalized().into())
        ));

        let day = records.highest_positive_percentage_day()?;
        lines.push(format!(
            "Highest Positive Test Percentage in a Single Day: {} with {}",
            short_date(day.date()),
            format_percent(day.positive_percentage())
        ));

        lines.push(format!(
            "Average Positive Tests Per Day Since First Positive: {} cases per day",
            format_decimal(records.average_positive_cases_since_first_positive()?)
        ));

        lines.push(format!(
            "Overall Positivity Rate: {}",
            format_percent(records.overall_positivity_rate()?)
        ));

        lines.push(format!(
            "Number of Days With Over {} Positive Cases: {} days",
            group_thousands(upper_threshold.into()),
            group_thousands(records.days_over_threshold(upper_threshold)? as u64)
        ));

        lines.push(format!(
            "Number of Days With Less Than {} Positive Cases: {} days",
            group_thousands(lower_threshold.into()),
            group_thousands(records.days_under_threshold(lower_threshold)? as u64)
        ));

        Ok(join_lines(lines))
    }

    /// One row per bin: `start - end: count`, right-aligned.
    pub fn format_histogram(&self, segment_size: u32) -> AnalyticsResult<String> {
        let segments = self.records.histogram(segment_size)?;

        let mut lines = vec![format!(
            "Positive Cases Histogram (bin size {}):",
            group_thousands(segment_size.into())
        )];
        for segment in segments {
            lines.push(format!(
                "{:>10} -{:>9}:{:>9}",
                group_thousands(segment.start),
                group_thousands(segment.end),
                group_thousands(segment.count as u64)
            ));
        }

        Ok(join_lines(lines))
    }

    /// Per-month breakdown. Empty months are skipped and failing queries are
    /// replaced by an "insufficient data" line.
    pub fn format_monthly(monthly: &MonthlyCollectionSet) -> String {
        let mut sections = Vec::new();

        for (month, data) in monthly.iter() {
            if data.is_empty() {
                continue;
            }

            let mut lines = vec![format!(
                "{} {} ({} days of data):",
                &month.name()[..3],
                monthly.year(),
                data.len()
            )];

            lines.push(or_insufficient("Highest Positive Cases", || {
                let value = data.highest_positive_day()?.positive_increase();
                Ok(tied_days(value.into(), &data.ties_for(|r| r.positive_increase(), &value)))
            }));
            lines.push(or_insufficient("Lowest Positive Cases", || {
                let value = data.lowest_positive_day()?.positive_increase();
                Ok(tied_days(value.into(), &data.ties_for(|r| r.positive_increase(), &value)))
            }));
            lines.push(or_insufficient("Most Tests in a Single Day", || {
                let value = data.highest_test_day()?.total_tests();
                Ok(tied_days(value, &data.ties_for(|r| r.total_tests(), &value)))
            }));
            lines.push(or_insufficient("Least Tests in a Single Day", || {
                let value = data.lowest_total_test_day()?.total_tests();
                Ok(tied_days(value, &data.ties_for(|r| r.total_tests(), &value)))
            }));
            lines.push(or_insufficient("Highest Currently Hospitalized", || {
                let value = data.highest_current_hospitalized_day()?.current_hospitalized();
                if value == 0 {
                    return Err(AnalyticsError::NoQualifyingRecords("highest current hospitalized"));
                }
                Ok(tied_days(value.into(), &data.ties_for(|r| r.current_hospitalized(), &value)))
            }));
            lines.push(or_insufficient("Lowest Currently Hospitalized", || {
                let value = data.lowest_current_hospitalized_day()?.current_hospitalized();
                Ok(tied_days(value.into(), &data.ties_for(|r| r.current_hospitalized(), &value)))
            }));
            lines.push(or_insufficient("Average Positive Tests Per Day Since First Positive", || {
                Ok(format!(
                    "{} cases per day",
                    format_decimal(data.average_positive_cases_since_first_positive()?)
                ))
            }));
            lines.push(or_insufficient("Average Tests Per Day", || {
                Ok(format!("{} tests per day", format_decimal(data.average_tests_per_day()?)))
            }));
            lines.push(or_insufficient("Average Currently Hospitalized", || {
                Ok(format!(
                    "{} per day",
                    format_decimal(data.average_current_hospitalized()?)
                ))
            }));

            sections.push(join_lines(lines));
        }

        sections.join("\n")
    }
}

fn or_insufficient<F>(label: &str, query: F) -> String
where
    F: FnOnce() -> AnalyticsResult<String>,
{
    match query() {
        Ok(text) => format!("{}: {}", label, text),
        Err(_) => format!("{}: {}", label, INSUFFICIENT_DATA),
    }
}

fn tied_days(value: u64, days: &[&CovidRecord]) -> String {
    format!("{} occurred on the {}", group_thousands(value), list_days(days))
}

/// `3rd`, `3rd and 9th`, `3rd, 9th, and 21st`.
pub fn list_days(days: &[&CovidRecord]) -> String {
    let ordinals: Vec<String> = days.iter().map(|r| ordinal_day(r.date().day())).collect();
    match ordinals.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Two decimals with grouped integer part: `12345.678` -> `12,345.68`.
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = int_part
        .parse::<u64>()
        .map(group_thousands)
        .unwrap_or_else(|_| int_part.to_string());
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// A ratio rendered as a percentage: `0.0545` -> `5.45%`.
pub fn format_percent(ratio: f64) -> String {
    format!("{}%", format_decimal(ratio * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::DailyCounts;
    use chrono::NaiveDate;

    fn record(month: u32, day: u32, counts: DailyCounts) -> CovidRecord {
        CovidRecord::new(NaiveDate::from_ymd_opt(2020, month, day).unwrap(), "GA", counts).unwrap()
    }

    fn sample() -> RecordCollection {
        vec![
            record(3, 1, DailyCounts::new(0, 40, 0, 0, 0)),
            record(3, 2, DailyCounts::new(5, 5, 0, 1, 2)),
            record(3, 3, DailyCounts::new(1, 99, 0, 0, 1)),
            record(4, 1, DailyCounts::new(2600, 7400, 120, 30, 40)),
            record(4, 2, DailyCounts::new(2600, 400, 80, 12, 5)),
        ]
        .into()
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_format_decimal_and_percent() {
        assert_eq!(format_decimal(7.75), "7.75");
        assert_eq!(format_decimal(12345.678), "12,345.68");
        assert_eq!(format_decimal(0.0), "0.00");
        assert_eq!(format_percent(6.0 / 110.0), "5.45%");
    }

    #[test]
    fn test_list_days() {
        let records = sample();
        let all: Vec<&CovidRecord> = records.iter().take(3).collect();
        assert_eq!(list_days(&all[..1]), "1st");
        assert_eq!(list_days(&all[..2]), "1st and 2nd");
        assert_eq!(list_days(&all), "1st, 2nd, and 3rd");
    }

    #[test]
    fn test_general_section() {
        let records = sample();
        let text = ReportFormatter::new(&records).format_general(2500, 1000).unwrap();

        assert!(text.starts_with("First Positive Case in GA: 3/2/2020\n"));
        assert!(text.contains("Highest Number of Positive Cases in a Single Day: 4/1/2020 with 2,600 cases"));
        assert!(text.contains("Highest Number of Tests in a Single Day: 4/1/2020 with 10,000 tests"));
        assert!(text.contains("Highest Positive Test Percentage in a Single Day: 4/2/2020 with 86.67%"));
        assert!(text.contains("Number of Days With Over 2,500 Positive Cases: 2 days"));
        assert!(text.contains("Number of Days With Less Than 1,000 Positive Cases: 2 days"));
    }

    #[test]
    fn test_general_section_propagates_failures() {
        let records: RecordCollection = vec![record(3, 1, DailyCounts::new(0, 4, 0, 0, 0))].into();
        assert!(ReportFormatter::new(&records).format_general(10, 5).is_err());
    }

    #[test]
    fn test_histogram_rows() {
        let records = sample();
        let text = ReportFormatter::new(&records).format_histogram(1000).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "         0 -    1,000:        3");
        assert_eq!(rows[1], "     1,001 -    2,000:        0");
        assert_eq!(rows[2], "     2,001 -    3,000:        2");
    }

    #[test]
    fn test_monthly_sections_list_ties_and_fill_gaps() {
        let records = sample();
        let monthly = MonthlyCollectionSet::partition(&records).unwrap();
        let text = ReportFormatter::format_monthly(&monthly);

        assert!(text.contains("Mar 2020 (3 days of data):"));
        assert!(text.contains("Apr 2020 (2 days of data):"));
        assert!(!text.contains("Jan 2020"));
        assert!(text.contains("Highest Positive Cases: 2,600 occurred on the 1st and 2nd"));
        assert!(text.contains("Lowest Currently Hospitalized: insufficient data"));
        assert!(text.contains("Highest Currently Hospitalized: insufficient data"));
        assert!(text.contains("Lowest Currently Hospitalized: 80 occurred on the 2nd"));
    }

    #[test]
    fn test_monthly_section_survives_month_without_positives() {
        let records: RecordCollection = vec![
            record(5, 1, DailyCounts::new(0, 4, 0, 0, 0)),
            record(6, 1, DailyCounts::new(3, 4, 0, 0, 0)),
        ]
        .into();
        let monthly = MonthlyCollectionSet::partition(&records).unwrap();
        let text = ReportFormatter::format_monthly(&monthly);

        assert!(text.contains("May 2020 (1 days of data):"));
        assert!(text.contains("Average Positive Tests Per Day Since First Positive: insufficient data"));
        assert!(text.contains("Average Positive Tests Per Day Since First Positive: 3.00 cases per day"));
    }
}
