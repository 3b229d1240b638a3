use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::record::CovidRecord;

/// Upper bound on histogram bins for a single call.
pub const MAX_SEGMENTS: u64 = 100_000;

/// How a day that already exists in the collection is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateResolution {
    /// Swap the stored record for the incoming one.
    #[default]
    Replace,
    /// Add the incoming counts onto the stored record, keeping the stored record.
    Merge,
}

/// What [`RecordCollection::insert_or_resolve`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Added,
    Replaced,
    Merged,
}

/// One histogram bin over `positive_increase`, bounds inclusive.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: u64,
    pub end: u64,
    pub count: usize,
}

/// Ordered collection of daily records.
///
/// Insertion order is preserved and never re-sorted. Duplicate days may coexist
/// after [`add`](Self::add); [`replace_or_merge`](Self::replace_or_merge) is the
/// explicit way to resolve them.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct RecordCollection {
    records: Vec<CovidRecord>,
}

impl RecordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CovidRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CovidRecord> {
        self.records.get(index)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    // ---- mutation ----

    pub fn add(&mut self, record: CovidRecord) {
        self.records.push(record);
    }

    /// Removes the first record structurally equal to `record`.
    pub fn remove(&mut self, record: &CovidRecord) -> bool {
        match self.records.iter().position(|r| r == record) {
            Some(pos) => {
                self.records.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains_day(&self, date: NaiveDate, region: &str) -> bool {
        self.records.iter().any(|r| r.date() == date && r.region() == region)
    }

    /// Resolves `record` against the first stored record for the same date and region.
    pub fn replace_or_merge(
        &mut self,
        record: CovidRecord,
        mode: DuplicateResolution,
    ) -> AnalyticsResult<&CovidRecord> {
        if self.records.is_empty() {
            return Err(AnalyticsError::InvalidState(
                "cannot resolve a duplicate day in an empty collection".to_string(),
            ));
        }

        let index = self
            .records
            .iter()
            .position(|existing| existing.is_same_day(&record))
            .ok_or_else(|| AnalyticsError::RecordNotFound {
                date: record.date(),
                region: record.region().to_string(),
            })?;

        match mode {
            DuplicateResolution::Replace => {
                debug!(date = %record.date(), region = record.region(), "replacing day");
                self.records[index] = record;
            }
            DuplicateResolution::Merge => {
                debug!(date = %record.date(), region = record.region(), "merging day");
                self.records[index].absorb(&record);
            }
        }

        Ok(&self.records[index])
    }

    /// Adds `record` when its day is new, otherwise resolves it with `mode`.
    pub fn insert_or_resolve(
        &mut self,
        record: CovidRecord,
        mode: DuplicateResolution,
    ) -> AnalyticsResult<Resolution> {
        if !self.contains_day(record.date(), record.region()) {
            self.add(record);
            return Ok(Resolution::Added);
        }

        self.replace_or_merge(record, mode)?;
        Ok(match mode {
            DuplicateResolution::Replace => Resolution::Replaced,
            DuplicateResolution::Merge => Resolution::Merged,
        })
    }

    pub fn for_region(&self, region: &str) -> RecordCollection {
        self.records
            .iter()
            .filter(|r| r.region() == region)
            .cloned()
            .collect()
    }

    pub fn regions(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.region()).collect();
        set.into_iter().collect()
    }

    /// All records whose `key` equals `value`, in collection order.
    pub fn ties_for<K, F>(&self, key: F, value: &K) -> Vec<&CovidRecord>
    where
        K: PartialEq,
        F: Fn(&CovidRecord) -> K,
    {
        self.records.iter().filter(|r| key(*r) == *value).collect()
    }

    // ---- queries ----

    fn ensure_not_empty(&self) -> AnalyticsResult<()> {
        if self.records.is_empty() {
            return Err(AnalyticsError::EmptyCollection);
        }
        Ok(())
    }

    pub fn first_positive_date(&self) -> AnalyticsResult<NaiveDate> {
        self.ensure_not_empty()?;
        self.records
            .iter()
            .filter(|r| r.positive_increase() > 0)
            .map(|r| r.date())
            .min()
            .ok_or(AnalyticsError::NoPositiveRecords)
    }

    pub fn highest_positive_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.highest_by(|r| r.positive_increase())
    }

    pub fn highest_negative_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.highest_by(|r| r.negative_increase())
    }

    pub fn highest_test_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.highest_by(|r| r.total_tests())
    }

    pub fn highest_death_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.highest_by(|r| r.death_increase())
    }

    pub fn highest_hospitalized_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.highest_by(|r| r.hospitalized_increase())
    }

    pub fn highest_current_hospitalized_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.highest_by(|r| r.current_hospitalized())
    }

    pub fn highest_positive_percentage_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.highest_by(|r| r.positive_percentage())
    }

    pub fn lowest_positive_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.lowest_by(|r| r.positive_increase())
    }

    pub fn lowest_total_test_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.lowest_by(|r| r.total_tests())
    }

    /// Lowest `current_hospitalized` among days that report any hospitalizations.
    ///
    /// Zero-valued days count as missing data and are skipped.
    pub fn lowest_current_hospitalized_day(&self) -> AnalyticsResult<&CovidRecord> {
        self.ensure_not_empty()?;
        first_extreme(
            self.records.iter().filter(|r| r.current_hospitalized() > 0),
            |r| r.current_hospitalized(),
            |candidate, best| candidate < best,
        )
        .ok_or(AnalyticsError::NoQualifyingRecords("lowest current hospitalized"))
    }

    pub fn average_positive_cases_since_first_positive(&self) -> AnalyticsResult<f64> {
        let first = self.first_positive_date()?;
        mean(
            self.records
                .iter()
                .filter(|r| r.date() >= first)
                .map(|r| f64::from(r.positive_increase())),
        )
        .ok_or(AnalyticsError::NoPositiveRecords)
    }

    pub fn average_current_hospitalized(&self) -> AnalyticsResult<f64> {
        self.ensure_not_empty()?;
        mean(self.records.iter().map(|r| f64::from(r.current_hospitalized())))
            .ok_or(AnalyticsError::EmptyCollection)
    }

    /// Mean of `total_tests` over days that ran at least one test.
    pub fn average_tests_per_day(&self) -> AnalyticsResult<f64> {
        self.ensure_not_empty()?;
        mean(
            self.records
                .iter()
                .map(|r| r.total_tests())
                .filter(|&total| total > 0)
                .map(|total| total as f64),
        )
        .ok_or(AnalyticsError::NoQualifyingRecords("average tests per day"))
    }

    /// Pooled rate: summed positives over summed tests.
    pub fn overall_positivity_rate(&self) -> AnalyticsResult<f64> {
        self.ensure_not_empty()?;
        let positives: u64 = self.records.iter().map(|r| u64::from(r.positive_increase())).sum();
        let tests: u64 = self.records.iter().map(|r| r.total_tests()).sum();
        if tests == 0 {
            return Err(AnalyticsError::DivideByZero("overall positivity rate"));
        }
        Ok(positives as f64 / tests as f64)
    }

    pub fn days_over_threshold(&self, threshold: u32) -> AnalyticsResult<usize> {
        self.ensure_not_empty()?;
        Ok(self
            .records
            .iter()
            .filter(|r| r.positive_increase() > threshold)
            .count())
    }

    /// Days with some positives, on or after the first positive day, below `threshold`.
    pub fn days_under_threshold(&self, threshold: u32) -> AnalyticsResult<usize> {
        let first = match self.first_positive_date() {
            Ok(date) => date,
            Err(AnalyticsError::NoPositiveRecords) => return Ok(0),
            Err(e) => return Err(e),
        };

        Ok(self
            .records
            .iter()
            .filter(|r| r.positive_increase() > 0 && r.date() >= first)
            .filter(|r| r.positive_increase() < threshold)
            .count())
    }

    pub fn positive_cases_between(&self, lower: u32, upper: u32) -> AnalyticsResult<usize> {
        self.ensure_not_empty()?;
        Ok(self.count_positive_in(u64::from(lower), u64::from(upper)))
    }

    /// Whether the single highest `positive_increase` lies in `[lower, upper]`.
    pub fn bounds_contain_highest_increase(&self, lower: u32, upper: u32) -> AnalyticsResult<bool> {
        let highest = self.highest_positive_day()?.positive_increase();
        Ok(lower <= highest && highest <= upper)
    }

    pub fn segment_counts(&self, segment_size: u32) -> AnalyticsResult<Vec<usize>> {
        Ok(self
            .histogram(segment_size)?
            .into_iter()
            .map(|segment| segment.count)
            .collect())
    }

    /// Bins covering `0..=max(positive_increase)`.
    ///
    /// The first bin is `[0, size]`; bin `i + 1` starts at `end_i + 1` and ends at
    /// `size * (i + 2)`.
    pub fn histogram(&self, segment_size: u32) -> AnalyticsResult<Vec<Segment>> {
        if segment_size < 1 {
            return Err(AnalyticsError::InvalidArgument(format!(
                "segment size must be at least 1, got {}",
                segment_size
            )));
        }

        let max = u64::from(self.highest_positive_day()?.positive_increase());
        let size = u64::from(segment_size);
        let bins = max.div_ceil(size);
        if bins > MAX_SEGMENTS {
            return Err(AnalyticsError::InvalidArgument(format!(
                "segment size {} would need {} bins, limit is {}",
                segment_size, bins, MAX_SEGMENTS
            )));
        }

        let mut segments = Vec::new();
        let mut start = 0;
        let mut end = size;
        for i in 0..bins {
            segments.push(Segment {
                start,
                end,
                count: self.count_positive_in(start, end),
            });
            start = end + 1;
            end = size * (i + 2);
        }

        Ok(segments)
    }

    fn count_positive_in(&self, lower: u64, upper: u64) -> usize {
        self.records
            .iter()
            .map(|r| u64::from(r.positive_increase()))
            .filter(|&value| lower <= value && value <= upper)
            .count()
    }

    fn highest_by<K, F>(&self, key: F) -> AnalyticsResult<&CovidRecord>
    where
        K: PartialOrd,
        F: Fn(&CovidRecord) -> K,
    {
        first_extreme(self.records.iter(), key, |candidate, best| candidate > best)
            .ok_or(AnalyticsError::EmptyCollection)
    }

    fn lowest_by<K, F>(&self, key: F) -> AnalyticsResult<&CovidRecord>
    where
        K: PartialOrd,
        F: Fn(&CovidRecord) -> K,
    {
        first_extreme(self.records.iter(), key, |candidate, best| candidate < best)
            .ok_or(AnalyticsError::EmptyCollection)
    }
}

/// Picks the record whose key wins under `better`; ties keep the earliest record.
fn first_extreme<'a, I, K, F, B>(records: I, key: F, better: B) -> Option<&'a CovidRecord>
where
    I: Iterator<Item = &'a CovidRecord>,
    F: Fn(&CovidRecord) -> K,
    B: Fn(&K, &K) -> bool,
{
    let mut best: Option<(&'a CovidRecord, K)> = None;
    for record in records {
        let value = key(record);
        let replace = match &best {
            Some((_, best_value)) => better(&value, best_value),
            None => true,
        };
        if replace {
            best = Some((record, value));
        }
    }
    best.map(|(record, _)| record)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

impl FromIterator<CovidRecord> for RecordCollection {
    fn from_iter<T: IntoIterator<Item = CovidRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<CovidRecord>> for RecordCollection {
    fn from(records: Vec<CovidRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a CovidRecord;
    type IntoIter = std::slice::Iter<'a, CovidRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for RecordCollection {
    type Item = CovidRecord;
    type IntoIter = std::vec::IntoIter<CovidRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::DailyCounts;

    fn record(day: u32, region: &str, counts: DailyCounts) -> CovidRecord {
        CovidRecord::new(NaiveDate::from_ymd_opt(2020, 10, day).unwrap(), region, counts).unwrap()
    }

    #[test]
    fn test_add_grows_by_one() {
        let mut collection = RecordCollection::new();
        collection.add(record(14, "GA", DailyCounts::new(10, 10, 10, 10, 0)));
        assert_eq!(collection.len(), 1);

        collection.add(record(14, "GA", DailyCounts::new(10, 10, 10, 10, 0)));
        assert_eq!(collection.len(), 2, "duplicates are tolerated on add");
    }

    #[test]
    fn test_remove_first_structural_match() {
        let mut collection = RecordCollection::new();
        let a = record(14, "GA", DailyCounts::new(1, 0, 0, 0, 0));
        let b = record(15, "GA", DailyCounts::new(2, 0, 0, 0, 0));
        collection.add(a.clone());
        collection.add(b.clone());
        collection.add(a.clone());

        assert!(collection.remove(&a));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(0), Some(&b));
        assert!(!collection.remove(&record(20, "GA", DailyCounts::default())));
    }

    #[test]
    fn test_merge_keeps_stored_record() {
        let mut collection = RecordCollection::new();
        let existing = record(14, "GA", DailyCounts::new(5, 0, 0, 2, 0));
        let existing_id = existing.id();
        collection.add(existing);

        let incoming = record(14, "GA", DailyCounts::new(3, 0, 0, 1, 0));
        let merged = collection.replace_or_merge(incoming, DuplicateResolution::Merge).unwrap();

        assert_eq!(merged.id(), existing_id);
        assert_eq!(merged.positive_increase(), 8);
        assert_eq!(merged.death_increase(), 3);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_replace_stores_incoming_record() {
        let mut collection = RecordCollection::new();
        collection.add(record(14, "GA", DailyCounts::new(5, 0, 0, 2, 0)));

        let incoming = record(14, "GA", DailyCounts::new(3, 0, 0, 1, 0));
        let incoming_id = incoming.id();
        let stored = collection.replace_or_merge(incoming, DuplicateResolution::Replace).unwrap();

        assert_eq!(stored.id(), incoming_id);
        assert_eq!(stored.positive_increase(), 3);
        assert_eq!(collection.get(0).map(|r| r.id()), Some(incoming_id));
    }

    #[test]
    fn test_replace_or_merge_matches_region_too() {
        let mut collection = RecordCollection::new();
        collection.add(record(14, "AL", DailyCounts::new(1, 0, 0, 0, 0)));
        collection.add(record(14, "GA", DailyCounts::new(5, 0, 0, 0, 0)));

        collection
            .replace_or_merge(record(14, "GA", DailyCounts::new(1, 0, 0, 0, 0)), DuplicateResolution::Merge)
            .unwrap();

        assert_eq!(collection.get(0).unwrap().positive_increase(), 1);
        assert_eq!(collection.get(1).unwrap().positive_increase(), 6);
    }

    #[test]
    fn test_replace_or_merge_on_empty_collection() {
        let mut collection = RecordCollection::new();
        let err = collection
            .replace_or_merge(record(14, "GA", DailyCounts::default()), DuplicateResolution::Replace)
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidState(_)));
    }

    #[test]
    fn test_replace_or_merge_without_match() {
        let mut collection = RecordCollection::new();
        collection.add(record(14, "GA", DailyCounts::default()));
        let err = collection
            .replace_or_merge(record(15, "GA", DailyCounts::default()), DuplicateResolution::Merge)
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::RecordNotFound { .. }));
    }

    #[test]
    fn test_insert_or_resolve() {
        let mut collection = RecordCollection::new();
        let first = collection
            .insert_or_resolve(record(14, "GA", DailyCounts::new(1, 1, 0, 0, 0)), DuplicateResolution::Merge)
            .unwrap();
        let second = collection
            .insert_or_resolve(record(14, "GA", DailyCounts::new(2, 2, 0, 0, 0)), DuplicateResolution::Merge)
            .unwrap();
        let third = collection
            .insert_or_resolve(record(14, "GA", DailyCounts::new(7, 0, 0, 0, 0)), DuplicateResolution::Replace)
            .unwrap();

        assert_eq!(first, Resolution::Added);
        assert_eq!(second, Resolution::Merged);
        assert_eq!(third, Resolution::Replaced);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(0).unwrap().positive_increase(), 7);
    }

    #[test]
    fn test_for_region_and_regions() {
        let collection: RecordCollection = vec![
            record(14, "GA", DailyCounts::default()),
            record(14, "AL", DailyCounts::default()),
            record(15, "GA", DailyCounts::default()),
        ]
        .into();

        assert_eq!(collection.regions(), vec!["AL", "GA"]);
        assert_eq!(collection.for_region("GA").len(), 2);
        assert!(collection.for_region("TX").is_empty());
    }
}
