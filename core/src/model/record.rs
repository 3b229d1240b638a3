use std::ops::AddAssign;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AnalyticsError, AnalyticsResult};

/// The five per-day counts carried by a record.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyCounts {
    pub positive_increase: u32,
    pub negative_increase: u32,
    pub current_hospitalized: u32,
    pub death_increase: u32,
    pub hospitalized_increase: u32,
}

impl DailyCounts {
    pub fn new(
        positive_increase: u32,
        negative_increase: u32,
        current_hospitalized: u32,
        death_increase: u32,
        hospitalized_increase: u32,
    ) -> Self {
        Self {
            positive_increase,
            negative_increase,
            current_hospitalized,
            death_increase,
            hospitalized_increase,
        }
    }
}

impl AddAssign for DailyCounts {
    fn add_assign(&mut self, other: Self) {
        self.positive_increase = self.positive_increase.saturating_add(other.positive_increase);
        self.negative_increase = self.negative_increase.saturating_add(other.negative_increase);
        self.current_hospitalized = self.current_hospitalized.saturating_add(other.current_hospitalized);
        self.death_increase = self.death_increase.saturating_add(other.death_increase);
        self.hospitalized_increase = self.hospitalized_increase.saturating_add(other.hospitalized_increase);
    }
}

/// One day of statistics for one region.
///
/// Date and region are fixed at construction. The counts only change through
/// [`CovidRecord::absorb`], which the collection calls when merging a duplicate day.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(try_from = "StoredRecord")]
pub struct CovidRecord {
    id: Uuid,
    date: NaiveDate,
    region: String,
    counts: DailyCounts,
}

// Mirror of the serialized shape, validated on the way in.
#[derive(Deserialize)]
struct StoredRecord {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    date: NaiveDate,
    region: String,
    #[serde(default)]
    counts: DailyCounts,
}

impl TryFrom<StoredRecord> for CovidRecord {
    type Error = AnalyticsError;

    fn try_from(stored: StoredRecord) -> AnalyticsResult<Self> {
        let mut record = CovidRecord::new(stored.date, stored.region, stored.counts)?;
        record.id = stored.id;
        Ok(record)
    }
}

impl CovidRecord {
    pub fn new(date: NaiveDate, region: impl Into<String>, counts: DailyCounts) -> AnalyticsResult<Self> {
        let region = region.into();
        let region = region.trim();
        if region.is_empty() {
            return Err(AnalyticsError::InvalidArgument("region must not be empty".to_string()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            date,
            region: region.to_string(),
            counts,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn counts(&self) -> DailyCounts {
        self.counts
    }

    pub fn positive_increase(&self) -> u32 {
        self.counts.positive_increase
    }

    pub fn negative_increase(&self) -> u32 {
        self.counts.negative_increase
    }

    pub fn current_hospitalized(&self) -> u32 {
        self.counts.current_hospitalized
    }

    pub fn death_increase(&self) -> u32 {
        self.counts.death_increase
    }

    pub fn hospitalized_increase(&self) -> u32 {
        self.counts.hospitalized_increase
    }

    pub fn total_tests(&self) -> u64 {
        u64::from(self.counts.positive_increase) + u64::from(self.counts.negative_increase)
    }

    /// Share of tests that came back positive.
    ///
    /// A day without any tests reports its raw positive count instead of a ratio.
    pub fn positive_percentage(&self) -> f64 {
        let total = self.total_tests();
        if total == 0 {
            return f64::from(self.counts.positive_increase);
        }
        f64::from(self.counts.positive_increase) / total as f64
    }

    pub fn is_same_day(&self, other: &CovidRecord) -> bool {
        self.date == other.date && self.region == other.region
    }

    pub(crate) fn absorb(&mut self, other: &CovidRecord) {
        self.counts += other.counts;
    }
}

impl PartialEq for CovidRecord {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date && self.region == other.region && self.counts == other.counts
    }
}
