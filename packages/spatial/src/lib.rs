#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial matching of collisions against a road corridor.
//!
//! Sample points are projected into a local metric frame (centred on the
//! sample points' bounding box) and loaded into an R-tree. A collision is
//! part of the corridor when it lies within the search radius of at least
//! one sample point. Each matched collision is annotated with its
//! perpendicular distance to the full road line, its nearest sample point,
//! and its decoded categorical fields.

use std::collections::BTreeSet;

use corridor_collision_models::{
    CollisionRecord, CollisionSeverity, DayOfWeek, LightCondition, MatchedCollision,
    WeatherCondition, parse_hour,
};
use corridor_road::Projector;
use corridor_road_models::{RoadGeometry, SamplePointSet};
use geo::{Coord, Distance, Euclidean, LineString, Point};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use thiserror::Error;

/// Slack added to the search radius so that a collision lying exactly on
/// the radius is not lost to floating-point round-off in the projection.
pub const RADIUS_TOLERANCE_M: f64 = 1e-6;

/// Conservative lower bound on the length of one degree of latitude.
const MIN_METERS_PER_DEGREE: f64 = 110_000.0;

/// Errors raised by the matcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    /// The search radius is negative or not a number.
    #[error("Search radius must be a non-negative number of metres, got {radius}")]
    InvalidRadius {
        /// The rejected radius.
        radius: f64,
    },

    /// A collision's time field has no parsable hour. The collision is
    /// skipped; the rest of the batch is unaffected.
    #[error("Collision {id} has malformed time '{time}'")]
    MalformedTimeField {
        /// Collision identifier.
        id: String,
        /// The raw time field.
        time: String,
    },
}

/// The collisions inside a corridor, in input order, each id at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchedCollisionSet {
    pub collisions: Vec<MatchedCollision>,
    /// Collisions that were inside the corridor but could not be decoded.
    pub skipped: Vec<MatchError>,
}

impl MatchedCollisionSet {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.collisions.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.collisions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchedCollision> {
        self.collisions.iter()
    }
}

/// A projected sample point stored in the R-tree.
struct SampleEntry {
    index: usize,
    position: [f64; 2],
}

impl RTreeObject for SampleEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for SampleEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx.mul_add(dx, dy * dy)
    }
}

/// Geographic bounding box used to reject far-away collisions before
/// projecting them.
#[derive(Debug, Clone, Copy)]
struct Envelope {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl Envelope {
    /// The bounding box of the sample points grown by the search radius,
    /// or `None` if there are no sample points.
    fn around(samples: &SamplePointSet, radius_m: f64) -> Option<Self> {
        let first = samples.points.first()?;
        let mut env = Self {
            min_lon: first.longitude,
            min_lat: first.latitude,
            max_lon: first.longitude,
            max_lat: first.latitude,
        };
        for p in samples {
            env.min_lon = env.min_lon.min(p.longitude);
            env.min_lat = env.min_lat.min(p.latitude);
            env.max_lon = env.max_lon.max(p.longitude);
            env.max_lat = env.max_lat.max(p.latitude);
        }

        let lat_margin = radius_m.mul_add(1.1, 1.0) / MIN_METERS_PER_DEGREE;
        let widest_lat = env.min_lat.abs().max(env.max_lat.abs()) + lat_margin;
        let cos_lat = widest_lat.min(89.9).to_radians().cos();
        let lon_margin = lat_margin / cos_lat;

        env.min_lat -= lat_margin;
        env.max_lat += lat_margin;
        env.min_lon -= lon_margin;
        env.max_lon += lon_margin;

        Some(env)
    }

    fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// Sample points and road line in one shared metric frame.
pub struct CorridorIndex {
    projector: Projector,
    samples: RTree<SampleEntry>,
    road: LineString<f64>,
}

impl CorridorIndex {
    /// Builds the index. The frame is centred on the sample points'
    /// bounding box, or on the road's when there are no samples.
    #[must_use]
    pub fn new(samples: &SamplePointSet, road: &RoadGeometry) -> Self {
        let projector = Projector::for_points(samples.iter().map(|p| p.coord()))
            .unwrap_or_else(|| Projector::for_road(road));

        let entries = samples
            .iter()
            .map(|p| {
                let planar = projector.forward(p.coord());
                SampleEntry {
                    index: p.index,
                    position: [planar.x, planar.y],
                }
            })
            .collect();

        Self {
            samples: RTree::bulk_load(entries),
            road: projector.forward_line(&road.line_string()),
            projector,
        }
    }

    #[must_use]
    pub const fn projector(&self) -> &Projector {
        &self.projector
    }

    /// The closest sample point within `radius_m` of a `(lon, lat)`
    /// location, as `(index, distance_m)`. Ties go to the lower index.
    #[must_use]
    pub fn nearest_sample(&self, location: Coord<f64>, radius_m: f64) -> Option<(usize, f64)> {
        let planar = self.projector.forward(location);
        let query = [planar.x, planar.y];
        let max = radius_m + RADIUS_TOLERANCE_M;

        self.samples
            .locate_within_distance(query, max * max)
            .map(|entry| (entry.index, entry.distance_2(&query).sqrt()))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
    }

    /// Perpendicular distance in metres from a `(lon, lat)` location to the
    /// road line.
    #[must_use]
    pub fn distance_to_road(&self, location: Coord<f64>) -> f64 {
        let planar = Point::from(self.projector.forward(location));
        Euclidean.distance(&self.road, &planar)
    }
}

/// Checks that `radius_m` is usable as a search radius.
///
/// # Errors
///
/// Returns [`MatchError::InvalidRadius`] if `radius_m` is negative or not
/// finite.
pub const fn validate_radius(radius_m: f64) -> Result<(), MatchError> {
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(MatchError::InvalidRadius { radius: radius_m });
    }
    Ok(())
}

/// Finds the collisions within `radius_m` of any sample point.
///
/// Collisions are returned in input order; a collision id seen more than
/// once is kept only at its first decodable occurrence. A matched collision
/// whose time field has no valid hour is left out of the result, logged,
/// and reported in [`MatchedCollisionSet::skipped`].
///
/// # Errors
///
/// Returns [`MatchError::InvalidRadius`] if `radius_m` is negative or not
/// finite.
pub fn match_collisions(
    collisions: &[CollisionRecord],
    samples: &SamplePointSet,
    road: &RoadGeometry,
    radius_m: f64,
) -> Result<MatchedCollisionSet, MatchError> {
    validate_radius(radius_m)?;

    let mut result = MatchedCollisionSet::default();
    let Some(envelope) = Envelope::around(samples, radius_m) else {
        log::warn!("No sample points; no collisions can be matched");
        return Ok(result);
    };

    let index = CorridorIndex::new(samples, road);
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut candidates = 0usize;

    for record in collisions {
        if !envelope.contains(record.longitude, record.latitude) {
            continue;
        }
        candidates += 1;

        let location = Coord {
            x: record.longitude,
            y: record.latitude,
        };
        let Some((nearest_index, nearest_distance)) = index.nearest_sample(location, radius_m)
        else {
            continue;
        };

        if seen.contains(record.id.as_str()) {
            log::debug!("Collision {} appears more than once; keeping the first", record.id);
            continue;
        }

        let Ok(hour) = parse_hour(&record.time) else {
            log::warn!(
                "Skipping collision {}: malformed time field '{}'",
                record.id,
                record.time
            );
            result.skipped.push(MatchError::MalformedTimeField {
                id: record.id.clone(),
                time: record.time.clone(),
            });
            continue;
        };
        seen.insert(record.id.as_str());

        result.collisions.push(MatchedCollision {
            record: record.clone(),
            distance_to_road_m: index.distance_to_road(location),
            nearest_sample_index: nearest_index,
            nearest_sample_distance_m: nearest_distance,
            severity: CollisionSeverity::from_code(record.severity),
            day_of_week: DayOfWeek::from_code(record.day_of_week),
            weather: WeatherCondition::from_code(record.weather),
            light: LightCondition::from_code(record.light_conditions),
            hour,
        });
    }

    log::info!(
        "Found {} collisions within {radius_m}m of {} sample points ({candidates} candidates checked)",
        result.len(),
        samples.len()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use corridor_road::{project, sample};

    use super::*;

    fn record(id: &str, location: Coord<f64>, time: &str) -> CollisionRecord {
        CollisionRecord {
            id: id.to_string(),
            latitude: location.y,
            longitude: location.x,
            date: "01/03/2023".to_string(),
            time: time.to_string(),
            severity: 2,
            day_of_week: 3,
            weather: 2,
            light_conditions: 4,
            number_of_vehicles: 2,
            number_of_casualties: 1,
            speed_limit: Some(20),
        }
    }

    /// ~110.57 m due north, sampled every 50 m at 0, 50 and 100 m.
    fn meridian_corridor() -> (RoadGeometry, SamplePointSet) {
        let road = RoadGeometry::from_lon_lat(&[[0.0, 0.0], [0.0, 0.001]]).unwrap();
        let samples = sample(&project(&road), 50.0).unwrap();
        (road, samples)
    }

    /// A `(lon, lat)` location offset in metres from a sample point, in the
    /// matcher's own frame.
    fn offset_from_sample(
        road: &RoadGeometry,
        samples: &SamplePointSet,
        sample_index: usize,
        east_m: f64,
        north_m: f64,
    ) -> Coord<f64> {
        let index = CorridorIndex::new(samples, road);
        let anchor = index
            .projector()
            .forward(samples.points[sample_index].coord());
        index.projector().inverse(Coord {
            x: anchor.x + east_m,
            y: anchor.y + north_m,
        })
    }

    #[test]
    fn includes_collision_exactly_on_the_radius() {
        let (road, samples) = meridian_corridor();
        assert_eq!(samples.len(), 3);

        let on_radius = offset_from_sample(&road, &samples, 0, 50.0, 0.0);
        let result =
            match_collisions(&[record("edge", on_radius, "08:30")], &samples, &road, 50.0).unwrap();

        assert_eq!(result.len(), 1);
        let matched = &result.collisions[0];
        assert_eq!(matched.nearest_sample_index, 0);
        assert!((matched.nearest_sample_distance_m - 50.0).abs() < 1e-4);
        assert!((matched.distance_to_road_m - 50.0).abs() < 1e-4);
    }

    #[test]
    fn collision_on_the_road_line_has_zero_road_distance() {
        let (road, samples) = meridian_corridor();
        let on_road = offset_from_sample(&road, &samples, 0, 0.0, 50.0);
        let result =
            match_collisions(&[record("on", on_road, "08:30")], &samples, &road, 50.0).unwrap();

        let matched = &result.collisions[0];
        assert_eq!(matched.nearest_sample_index, 1);
        assert!(matched.distance_to_road_m < 1e-4);
    }

    #[test]
    fn excludes_collision_beyond_the_radius() {
        let (road, samples) = meridian_corridor();
        let outside = offset_from_sample(&road, &samples, 1, 51.0, 0.0);
        let result =
            match_collisions(&[record("far", outside, "08:30")], &samples, &road, 50.0).unwrap();
        assert!(result.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn rejects_far_away_collisions() {
        let (road, samples) = meridian_corridor();
        let far = Coord { x: 10.0, y: 45.0 };
        let result =
            match_collisions(&[record("far", far, "08:30")], &samples, &road, 50.0).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn collision_near_two_samples_appears_once() {
        let (road, samples) = meridian_corridor();
        // 25 m along and 10 m off the road: within 50 m of samples 0 and 1.
        let between = offset_from_sample(&road, &samples, 0, 10.0, 25.0);
        let records = vec![
            record("shared", between, "17:05"),
            record("shared", between, "17:05"),
        ];
        let result = match_collisions(&records, &samples, &road, 50.0).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.collisions[0].record.id, "shared");
    }

    #[test]
    fn road_distance_never_exceeds_sample_distance() {
        let road = RoadGeometry::from_lon_lat(&[
            [-0.2328, 51.5180],
            [-0.2320, 51.5182],
            [-0.2310, 51.5184],
            [-0.2300, 51.5186],
        ])
        .unwrap();
        let samples = sample(&project(&road), 50.0).unwrap();

        let mut records = Vec::new();
        for i in 0..samples.len() {
            for (j, (east, north)) in [(0.0, 30.0), (20.0, -20.0), (-35.0, 5.0)].iter().enumerate() {
                let location = offset_from_sample(&road, &samples, i, *east, *north);
                records.push(record(&format!("{i}-{j}"), location, "12:00"));
            }
        }

        let result = match_collisions(&records, &samples, &road, 50.0).unwrap();
        assert_eq!(result.len(), records.len());
        for matched in &result.collisions {
            assert!(
                matched.distance_to_road_m <= matched.nearest_sample_distance_m + 1e-3,
                "{}: road {} > sample {}",
                matched.record.id,
                matched.distance_to_road_m,
                matched.nearest_sample_distance_m
            );
        }
    }

    #[test]
    fn matching_is_idempotent_and_keeps_input_order() {
        let (road, samples) = meridian_corridor();
        let records = vec![
            record("c", offset_from_sample(&road, &samples, 2, 5.0, 0.0), "01:00"),
            record("a", offset_from_sample(&road, &samples, 0, -5.0, 0.0), "02:00"),
            record("b", offset_from_sample(&road, &samples, 1, 0.0, 0.0), "03:00"),
        ];

        let first = match_collisions(&records, &samples, &road, 20.0).unwrap();
        let second = match_collisions(&records, &samples, &road, 20.0).unwrap();
        assert_eq!(first, second);

        let ids: Vec<&str> = first.iter().map(|m| m.record.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn decodes_labels_and_hour() {
        let (road, samples) = meridian_corridor();
        let location = offset_from_sample(&road, &samples, 0, 1.0, 0.0);
        let result =
            match_collisions(&[record("x", location, "17:45")], &samples, &road, 50.0).unwrap();

        let matched = &result.collisions[0];
        assert_eq!(matched.hour, 17);
        assert_eq!(matched.severity, CollisionSeverity::Serious);
        assert_eq!(matched.day_of_week, DayOfWeek::Tuesday);
        assert_eq!(matched.weather, WeatherCondition::from_code(2));
        assert_eq!(matched.light, LightCondition::from_code(4));
    }

    #[test]
    fn malformed_time_is_skipped_not_fatal() {
        let (road, samples) = meridian_corridor();
        let location = offset_from_sample(&road, &samples, 0, 1.0, 0.0);
        let records = vec![
            record("bad", location, "NULL"),
            record("late", location, "25:10"),
            record("good", location, "09:15"),
        ];

        let result = match_collisions(&records, &samples, &road, 50.0).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.collisions[0].record.id, "good");
        assert_eq!(
            result.skipped,
            vec![
                MatchError::MalformedTimeField {
                    id: "bad".to_string(),
                    time: "NULL".to_string(),
                },
                MatchError::MalformedTimeField {
                    id: "late".to_string(),
                    time: "25:10".to_string(),
                },
            ]
        );
    }

    #[test]
    fn malformed_duplicate_does_not_hide_a_later_valid_row() {
        let (road, samples) = meridian_corridor();
        let location = offset_from_sample(&road, &samples, 0, 1.0, 0.0);
        let records = vec![
            record("dup", location, "NULL"),
            record("dup", location, "09:15"),
            record("dup", location, "10:30"),
        ];

        let result = match_collisions(&records, &samples, &road, 50.0).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.collisions[0].record.time, "09:15");
        assert_eq!(result.collisions[0].hour, 9);
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn validate_radius_accepts_zero_and_rejects_bad_values() {
        assert_eq!(validate_radius(0.0), Ok(()));
        assert_eq!(validate_radius(50.0), Ok(()));
        for radius in [-0.5, f64::NAN, f64::NEG_INFINITY] {
            assert!(matches!(
                validate_radius(radius),
                Err(MatchError::InvalidRadius { .. })
            ));
        }
    }

    #[test]
    fn rejects_invalid_radius() {
        let (road, samples) = meridian_corridor();
        for radius in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                match_collisions(&[], &samples, &road, radius),
                Err(MatchError::InvalidRadius { .. })
            ));
        }
    }

    #[test]
    fn zero_radius_matches_points_on_samples_only() {
        let (road, samples) = meridian_corridor();
        let on_sample = samples.points[1].coord();
        let off_sample = offset_from_sample(&road, &samples, 1, 0.0, 1.0);
        let records = vec![record("on", on_sample, "10:00"), record("off", off_sample, "10:00")];

        let result = match_collisions(&records, &samples, &road, 0.0).unwrap();
        let ids: Vec<&str> = result.iter().map(|m| m.record.id.as_str()).collect();
        assert_eq!(ids, vec!["on"]);
    }

    #[test]
    fn empty_samples_match_nothing() {
        let (road, _) = meridian_corridor();
        let result = match_collisions(
            &[record("a", Coord { x: 0.0, y: 0.0 }, "10:00")],
            &SamplePointSet::default(),
            &road,
            50.0,
        )
        .unwrap();
        assert!(result.is_empty());
    }
}
