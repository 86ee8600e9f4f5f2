#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics report types for collisions matched to a road corridor.
//!
//! Every percentage is relative to the number of matched collisions, and
//! every ratio is 0 when there is nothing to divide by.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Count and share of one category within a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    /// Display label (e.g. `"Serious"`, `"Fog or mist"`).
    pub label: String,
    pub count: u64,
    /// Share of matched collisions, 0-100.
    pub percentage: f64,
}

/// Finds a category by label.
#[must_use]
pub fn find_category<'a>(stats: &'a [CategoryStat], label: &str) -> Option<&'a CategoryStat> {
    stats.iter().find(|s| s.label == label)
}

/// Named time-of-day ranges with inclusive hour bounds. Every hour 0-23
/// belongs to exactly one bucket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    #[strum(serialize = "Night (00-06)")]
    Night,
    #[strum(serialize = "Morning Rush (07-09)")]
    MorningRush,
    #[strum(serialize = "Midday (10-15)")]
    Midday,
    #[strum(serialize = "Evening Rush (16-18)")]
    EveningRush,
    #[strum(serialize = "Evening (19-23)")]
    Evening,
}

impl TimeBucket {
    /// Inclusive `(first, last)` hours of the bucket.
    #[must_use]
    pub const fn hours(self) -> (u8, u8) {
        match self {
            Self::Night => (0, 6),
            Self::MorningRush => (7, 9),
            Self::Midday => (10, 15),
            Self::EveningRush => (16, 18),
            Self::Evening => (19, 23),
        }
    }

    /// The bucket containing `hour`, or `None` for hours above 23.
    #[must_use]
    pub const fn for_hour(hour: u8) -> Option<Self> {
        match hour {
            0..=6 => Some(Self::Night),
            7..=9 => Some(Self::MorningRush),
            10..=15 => Some(Self::Midday),
            16..=18 => Some(Self::EveningRush),
            19..=23 => Some(Self::Evening),
            _ => None,
        }
    }

    /// All buckets in chronological order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Night,
            Self::MorningRush,
            Self::Midday,
            Self::EveningRush,
            Self::Evening,
        ]
    }
}

/// Count and share of one time-of-day bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucketStat {
    pub bucket: TimeBucket,
    pub count: u64,
    pub percentage: f64,
}

/// Count and share of one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourStat {
    pub hour: u8,
    pub count: u64,
    pub percentage: f64,
}

/// Hour-of-day breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAnalysis {
    /// The hour with the most collisions; the earliest such hour on ties.
    /// `None` when there are no collisions.
    pub most_common_hour: Option<u8>,
    /// Observed hours only, ascending.
    pub hours: Vec<HourStat>,
    /// Every bucket, in chronological order, including empty ones.
    pub distribution: Vec<TimeBucketStat>,
}

/// Top-level scalars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_collisions: u64,
    pub total_casualties: u64,
    pub avg_casualties_per_collision: f64,
    pub collisions_per_sample_point: f64,
}

/// Descriptive statistics over a matched collision set.
///
/// Category breakdowns list observed categories only, most frequent first
/// (ties by label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsReport {
    pub summary: SummaryStats,
    pub severity: Vec<CategoryStat>,
    pub time: TimeAnalysis,
    pub day_of_week: Vec<CategoryStat>,
    pub weather: Vec<CategoryStat>,
    pub light: Vec<CategoryStat>,
}
