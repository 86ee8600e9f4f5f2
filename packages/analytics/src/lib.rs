#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics aggregation for collisions matched to a road corridor.

use std::collections::BTreeMap;

use corridor_analytics_models::{
    CategoryStat, HourStat, StatisticsReport, SummaryStats, TimeAnalysis, TimeBucket,
    TimeBucketStat,
};
use corridor_collision_models::MatchedCollision;

/// Computes the statistics report for a matched collision set.
///
/// `sample_point_count` is the number of sample points the collisions were
/// matched against. An empty set, or zero sample points, produces zeros
/// rather than NaN.
#[must_use]
pub fn aggregate(matched: &[MatchedCollision], sample_point_count: usize) -> StatisticsReport {
    let total = matched.len() as u64;
    let total_casualties: u64 = matched
        .iter()
        .map(|m| u64::from(m.record.number_of_casualties))
        .sum();

    let summary = SummaryStats {
        total_collisions: total,
        total_casualties,
        avg_casualties_per_collision: ratio(total_casualties, total),
        collisions_per_sample_point: ratio(total, sample_point_count as u64),
    };

    log::debug!(
        "Aggregating {total} collisions ({total_casualties} casualties) over {sample_point_count} sample points"
    );

    StatisticsReport {
        summary,
        severity: breakdown(matched.iter().map(|m| m.severity.label()), total),
        time: time_analysis(matched, total),
        day_of_week: breakdown(matched.iter().map(|m| m.day_of_week.label()), total),
        weather: breakdown(matched.iter().map(|m| m.weather.label()), total),
        light: breakdown(matched.iter().map(|m| m.light.label()), total),
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn percentage(count: u64, total: u64) -> f64 {
    ratio(count, total) * 100.0
}

/// Counts labels, most frequent first, ties broken by label.
fn breakdown<'a>(labels: impl Iterator<Item = &'a str>, total: u64) -> Vec<CategoryStat> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }

    let mut stats: Vec<CategoryStat> = counts
        .into_iter()
        .map(|(label, count)| CategoryStat {
            label: label.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();

    // BTreeMap iteration is label-ordered and the sort is stable.
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

fn time_analysis(matched: &[MatchedCollision], total: u64) -> TimeAnalysis {
    let mut hour_counts: BTreeMap<u8, u64> = BTreeMap::new();
    for m in matched {
        *hour_counts.entry(m.hour).or_default() += 1;
    }

    // Strictly greater keeps the earliest hour on ties.
    let mut most_common: Option<(u8, u64)> = None;
    for (&hour, &count) in &hour_counts {
        if most_common.is_none_or(|(_, best)| count > best) {
            most_common = Some((hour, count));
        }
    }

    let distribution = TimeBucket::all()
        .iter()
        .map(|&bucket| {
            let (first, last) = bucket.hours();
            let count = hour_counts.range(first..=last).map(|(_, c)| c).sum();
            TimeBucketStat {
                bucket,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    TimeAnalysis {
        most_common_hour: most_common.map(|(hour, _)| hour),
        hours: hour_counts
            .into_iter()
            .map(|(hour, count)| HourStat {
                hour,
                count,
                percentage: percentage(count, total),
            })
            .collect(),
        distribution,
    }
}
