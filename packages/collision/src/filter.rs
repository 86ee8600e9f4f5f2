//! Pre-match filters over loaded collision records.

use std::str::FromStr;

use chrono::NaiveDate;
use corridor_collision_models::{CollisionRecord, CollisionSeverity};

use crate::CollisionError;

/// A WGS84 bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Whether the point lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

impl FromStr for Bounds {
    type Err = CollisionError;

    /// Parses `min_lon,min_lat,max_lon,max_lat`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CollisionError::InvalidBounds {
            value: s.to_string(),
        };

        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        let [min_lon, min_lat, max_lon, max_lat] = parts[..] else {
            return Err(invalid());
        };

        if !(min_lon <= max_lon && min_lat <= max_lat) {
            return Err(invalid());
        }

        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }
}

/// An inclusive date range. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Parses a collision date in `DD/MM/YYYY` (as exported) or ISO
/// `YYYY-MM-DD` form.
///
/// # Errors
///
/// Returns [`CollisionError::InvalidDate`] if neither format matches.
pub fn parse_collision_date(value: &str) -> Result<NaiveDate, CollisionError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| CollisionError::InvalidDate {
            value: value.to_string(),
        })
}

/// Optional restrictions applied to collisions before matching.
#[derive(Debug, Clone, Default)]
pub struct CollisionFilter {
    pub bounds: Option<Bounds>,
    pub date_range: DateRange,
    /// When non-empty, only these severities are kept.
    pub severities: Vec<CollisionSeverity>,
}

impl CollisionFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_none() && self.date_range.is_unbounded() && self.severities.is_empty()
    }

    /// Returns the records that pass every active filter, in input order.
    ///
    /// Records whose date cannot be parsed are dropped when a date range is
    /// active and kept otherwise.
    #[must_use]
    pub fn apply(&self, records: &[CollisionRecord]) -> Vec<CollisionRecord> {
        let mut kept: Vec<CollisionRecord> = records.to_vec();

        if let Some(bounds) = &self.bounds {
            kept.retain(|r| bounds.contains(r.longitude, r.latitude));
            log::info!("After bounding box filter: {}", kept.len());
        }

        if !self.date_range.is_unbounded() {
            kept.retain(|r| {
                parse_collision_date(&r.date).is_ok_and(|date| self.date_range.contains(date))
            });
            log::info!("After date filter: {}", kept.len());
        }

        if !self.severities.is_empty() {
            kept.retain(|r| {
                self.severities
                    .contains(&CollisionSeverity::from_code(r.severity))
            });
            log::info!("After severity filter: {}", kept.len());
        }

        kept
    }
}
