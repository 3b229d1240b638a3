use chrono::{Datelike, Month};

use crate::error::AnalyticsResult;
use crate::model::collection::RecordCollection;

/// A collection split into one bucket per calendar month.
///
/// Built once from a source collection and never updated; rebuild it when the
/// source changes.
#[derive(Debug, Clone)]
pub struct MonthlyCollectionSet {
    year: i32,
    months: [RecordCollection; 12],
}

impl MonthlyCollectionSet {
    /// Routes every record into the bucket for its month, keeping source order.
    ///
    /// The year comes from the first positive day, so this fails with
    /// `NoPositiveRecords` (or `EmptyCollection`) like that query does.
    pub fn partition(source: &RecordCollection) -> AnalyticsResult<Self> {
        let year = source.first_positive_date()?.year();
        let mut months: [RecordCollection; 12] = Default::default();

        for record in source {
            let index = record.date().month0() as usize;
            months[index].add(record.clone());
        }

        Ok(Self { year, months })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Bucket for a 1-based month number.
    pub fn month(&self, month: u32) -> Option<&RecordCollection> {
        if month == 0 {
            return None;
        }
        self.months.get(month as usize - 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Month, &RecordCollection)> {
        self.months
            .iter()
            .enumerate()
            .filter_map(|(i, bucket)| Month::try_from(i as u8 + 1).ok().map(|m| (m, bucket)))
    }

    pub fn total_len(&self) -> usize {
        self.months.iter().map(|m| m.len()).sum()
    }
}
