//! `GeoJSON` map layers for a corridor analysis.
//!
//! Every feature carries a `layer` property (`road`, `sample_point` or
//! `collision`) so a renderer can style the three layers separately.
//! Collision features also carry a `color` keyed on severity.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use corridor_collision_models::{CollisionSeverity, MatchedCollision};
use corridor_road_models::{RoadGeometry, SamplePoint, SamplePointSet};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

use crate::ReportError;

/// Marker colour for a collision of the given severity.
#[must_use]
pub const fn severity_color(severity: CollisionSeverity) -> &'static str {
    match severity {
        CollisionSeverity::Fatal => "black",
        CollisionSeverity::Serious => "red",
        CollisionSeverity::Slight => "orange",
        CollisionSeverity::Unknown => "gray",
    }
}

/// Builds the road line, its sample points and the matched collisions as
/// one feature collection, in that order.
#[must_use]
pub fn corridor_layers(
    road: &RoadGeometry,
    samples: &SamplePointSet,
    matched: &[MatchedCollision],
    radius_m: f64,
) -> GeoJson {
    let mut features = Vec::with_capacity(1 + samples.len() + matched.len());
    features.push(road_feature(road, radius_m));
    features.extend(samples.iter().map(|p| sample_feature(p, radius_m)));
    features.extend(matched.iter().map(collision_feature));

    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn road_feature(road: &RoadGeometry, radius_m: f64) -> Feature {
    let coords: Vec<Vec<f64>> = road.vertices().iter().map(|c| vec![c.x, c.y]).collect();

    let mut f = Feature::from(Geometry::new(Value::LineString(coords)));
    f.set_property("layer", "road");
    f.set_property("radius_m", radius_m);
    f
}

fn sample_feature(point: &SamplePoint, radius_m: f64) -> Feature {
    let mut f = Feature::from(Geometry::new(Value::Point(vec![
        point.longitude,
        point.latitude,
    ])));
    f.set_property("layer", "sample_point");
    f.set_property("index", point.index);
    f.set_property("distance_along_m", point.distance_along_m);
    f.set_property("radius_m", radius_m);
    f
}

fn collision_feature(m: &MatchedCollision) -> Feature {
    let record = &m.record;
    let mut f = Feature::from(Geometry::new(Value::Point(vec![
        record.longitude,
        record.latitude,
    ])));
    f.set_property("layer", "collision");
    f.set_property("collision_index", record.id.as_str());
    f.set_property("date", record.date.as_str());
    f.set_property("time", record.time.as_str());
    f.set_property("severity", m.severity.label());
    f.set_property("color", severity_color(m.severity));
    f.set_property("distance_to_road_m", (m.distance_to_road_m * 10.0).round() / 10.0);
    f.set_property("number_of_vehicles", record.number_of_vehicles);
    f.set_property("number_of_casualties", record.number_of_casualties);
    f.set_property("speed_limit", record.speed_limit);
    f.set_property("weather", m.weather.label());
    f.set_property("light", m.light.label());
    f.set_property("day", m.day_of_week.label());
    f
}

/// Writes the layers to `path` as pretty-printed `GeoJSON`.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be created or written.
pub fn write_layers(path: &Path, layers: &GeoJson) -> Result<(), ReportError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, layers)?;
    log::info!("Wrote map layers to {}", path.display());
    Ok(())
}
