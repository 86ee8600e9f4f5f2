#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road geometry and sampling types.
//!
//! A [`RoadGeometry`] is a validated WGS84 polyline. Sampling it yields a
//! [`SamplePointSet`] of evenly spaced anchors that the spatial matcher
//! searches around.

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

/// A road centerline as an ordered list of `(longitude, latitude)`
/// vertices.
///
/// Construction guarantees at least two vertices, all finite, with no two
/// consecutive vertices identical. The geometry cannot be modified after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    vertices: Vec<Coord<f64>>,
}

impl RoadGeometry {
    /// Validates and wraps a vertex list.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidGeometryError`] if there are fewer than two
    /// vertices, a coordinate is not finite or outside the WGS84 range, or
    /// two consecutive vertices are identical.
    pub fn new(vertices: Vec<Coord<f64>>) -> Result<Self, InvalidGeometryError> {
        if vertices.len() < 2 {
            return Err(InvalidGeometryError::new(format!(
                "a road needs at least 2 vertices, got {}",
                vertices.len()
            )));
        }

        for (i, c) in vertices.iter().enumerate() {
            if !c.x.is_finite() || !c.y.is_finite() {
                return Err(InvalidGeometryError::new(format!(
                    "vertex {i} has a non-finite coordinate"
                )));
            }
            if !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y) {
                return Err(InvalidGeometryError::new(format!(
                    "vertex {i} ({}, {}) is outside the WGS84 range",
                    c.x, c.y
                )));
            }
        }

        if let Some(i) = vertices.windows(2).position(|w| w[0] == w[1]) {
            return Err(InvalidGeometryError::new(format!(
                "vertices {i} and {} are identical",
                i + 1
            )));
        }

        Ok(Self { vertices })
    }

    /// Builds a geometry from `[lon, lat]` pairs.
    ///
    /// # Errors
    ///
    /// See [`RoadGeometry::new`].
    pub fn from_lon_lat(pairs: &[[f64; 2]]) -> Result<Self, InvalidGeometryError> {
        Self::new(pairs.iter().map(|&[x, y]| Coord { x, y }).collect())
    }

    #[must_use]
    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.vertices
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The geometry as a [`LineString`] in degrees.
    #[must_use]
    pub fn line_string(&self) -> LineString<f64> {
        LineString::new(self.vertices.clone())
    }
}

/// Error returned when a vertex list does not form a usable road.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidGeometryError {
    /// What was wrong with the geometry.
    pub reason: String,
}

impl InvalidGeometryError {
    fn new(reason: String) -> Self {
        Self { reason }
    }
}

impl std::fmt::Display for InvalidGeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid road geometry: {}", self.reason)
    }
}

impl std::error::Error for InvalidGeometryError {}

/// A point placed along the road at a fixed distance from its start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePoint {
    /// 0-based ordinal along the road.
    pub index: usize,
    pub longitude: f64,
    pub latitude: f64,
    /// Distance from the road start, in meters.
    pub distance_along_m: f64,
}

impl SamplePoint {
    #[must_use]
    pub const fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

/// Sample points in road order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePointSet {
    pub interval_m: f64,
    pub points: Vec<SamplePoint>,
}

impl SamplePointSet {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SamplePoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a SamplePointSet {
    type Item = &'a SamplePoint;
    type IntoIter = std::slice::Iter<'a, SamplePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Where a road geometry came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoadSource {
    /// A literal coordinate list.
    #[strum(serialize = "coordinates")]
    Explicit,
    /// An entry from the predefined road registry.
    #[strum(serialize = "predefined")]
    Predefined { id: String },
    /// Ways fetched from `OpenStreetMap`.
    #[strum(serialize = "openstreetmap")]
    Osm {
        area: String,
        street: String,
        /// Number of OSM ways returned before merging.
        segments: usize,
    },
}

/// Facts about a sampled road, for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadSummary {
    pub name: String,
    pub road_length_m: f64,
    pub num_sample_points: usize,
    pub interval_m: f64,
    /// Number of vertices in the geometry that was sampled.
    pub num_vertices: usize,
    pub source: RoadSource,
}

/// A predefined road, as stored in the embedded registry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoadSpec {
    /// Registry key (e.g. `"askew_road"`).
    pub id: String,
    /// Display name (e.g. `"Askew Road"`).
    pub name: String,
    /// Area the road lies in, usable for an OSM lookup.
    pub area: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `[longitude, latitude]` vertices in road order.
    pub coordinates: Vec<[f64; 2]>,
}

impl RoadSpec {
    /// Validates the stored vertices into a [`RoadGeometry`].
    ///
    /// # Errors
    ///
    /// See [`RoadGeometry::new`].
    pub fn geometry(&self) -> Result<RoadGeometry, InvalidGeometryError> {
        RoadGeometry::from_lon_lat(&self.coordinates)
    }
}
