use chrono::{Datelike, Duration, Local, NaiveDate};
use anyhow::{anyhow, Result};

const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%Y%m%d"];

/// Parses a date as it appears in data files: `MM/DD/YYYY`, `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_record_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Empty date string"));
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .ok_or_else(|| anyhow!("Could not parse date: {}", input))
}

/// Like [`parse_record_date`], plus a few relative keywords for interactive use.
pub fn parse_human_date(input: &str) -> Result<NaiveDate> {
    let today = Local::now().date_naive();

    match input.trim().to_lowercase().as_str() {
        "today" | "tod" => return Ok(today),
        "yesterday" | "yest" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    // -Nd: N days ago
    if let Some(rest) = input.trim().strip_prefix('-') {
        if let Some(num_str) = rest.strip_suffix('d') {
            let count: i64 = num_str.parse().map_err(|_| anyhow!("Invalid relative format"))?;
            return Ok(today - Duration::days(count));
        }
    }

    parse_record_date(input)
}

/// `M/D/YYYY` without zero padding.
pub fn short_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Day of month with its English ordinal suffix: 1st, 2nd, 3rd, 4th, 11th, 21st.
pub fn ordinal_day(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_record_date_formats() {
        assert_eq!(parse_record_date("03/07/2020").unwrap(), date(2020, 3, 7));
        assert_eq!(parse_record_date("2020-03-07").unwrap(), date(2020, 3, 7));
        assert_eq!(parse_record_date("20200307").unwrap(), date(2020, 3, 7));
        assert_eq!(parse_record_date(" 3/7/2020 ").unwrap(), date(2020, 3, 7));
        assert!(parse_record_date("").is_err());
        assert!(parse_record_date("02/30/2020").is_err());
        assert!(parse_record_date("not a date").is_err());
    }

    #[test]
    fn test_parse_human_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_human_date("today").unwrap(), today);
        assert_eq!(parse_human_date("yest").unwrap(), today - Duration::days(1));
        assert_eq!(parse_human_date("-3d").unwrap(), today - Duration::days(3));
        assert_eq!(parse_human_date("2020-10-14").unwrap(), date(2020, 10, 14));
        assert!(parse_human_date("-xd").is_err());
    }

    #[test]
    fn test_short_date() {
        assert_eq!(short_date(date(2020, 3, 7)), "3/7/2020");
        assert_eq!(short_date(date(2020, 12, 25)), "12/25/2020");
    }

    #[test]
    fn test_ordinal_day() {
        let expected = [
            (1, "1st"), (2, "2nd"), (3, "3rd"), (4, "4th"), (10, "10th"),
            (11, "11th"), (12, "12th"), (13, "13th"), (21, "21st"),
            (22, "22nd"), (23, "23rd"), (30, "30th"), (31, "31st"),
        ];
        for (day, text) in expected {
            assert_eq!(ordinal_day(day), text);
        }
    }
}
