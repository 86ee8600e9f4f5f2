#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road geometry acquisition, projection and sampling.
//!
//! A road is resolved from a literal vertex list, the predefined registry,
//! or an `OpenStreetMap` street lookup ([`provider`]), projected into a
//! local metric frame ([`projection`]), and sampled at a fixed interval
//! ([`sampler`]).

pub mod merge;
pub mod nominatim;
pub mod overpass;
pub mod projection;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod sampler;

use async_trait::async_trait;
use corridor_road_models::InvalidGeometryError;
use geo::Coord;
use thiserror::Error;

pub use overpass::{OsmEndpoints, OverpassSource};
pub use projection::{ProjectedRoad, Projector, project};
pub use provider::{ResolvedRoad, RoadRequest, resolve_road};
pub use sampler::{SampledRoad, sample, sample_road};

/// Errors that can occur while resolving, projecting or sampling a road.
#[derive(Debug, Error)]
pub enum RoadError {
    /// The road definition is not a usable polyline.
    #[error("Invalid road geometry: {reason}")]
    InvalidGeometry {
        /// What was wrong with it.
        reason: String,
    },

    /// The street has no matching ways in the given area.
    #[error("No road named '{street}' found in '{area}'")]
    RoadNotFound {
        /// Street name that was searched for.
        street: String,
        /// Area the search was scoped to.
        area: String,
    },

    /// The sampling interval is not a positive finite number.
    #[error("Sampling interval must be a positive number of metres, got {interval}")]
    InvalidInterval {
        /// The rejected interval.
        interval: f64,
    },

    /// No predefined road has this name.
    #[error("Unknown predefined road '{name}'")]
    UnknownRoad {
        /// The requested name.
        name: String,
    },

    /// The street merged into several disconnected chains and
    /// fragmentation was configured to be fatal.
    #[error("Road is split into {chains} disconnected chains")]
    FragmentedRoad {
        /// Number of chains after merging.
        chains: usize,
    },

    /// Nominatim could not resolve the area name.
    #[error("Area '{area}' not found")]
    AreaNotFound {
        /// The requested area.
        area: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// An upstream service returned an error or an unexpected response.
    #[error("Upstream error: {message}")]
    Upstream {
        /// Description of what went wrong.
        message: String,
    },

    /// An embedded road definition is malformed.
    #[error("Road configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<InvalidGeometryError> for RoadError {
    fn from(e: InvalidGeometryError) -> Self {
        Self::InvalidGeometry { reason: e.reason }
    }
}

/// A source of street segments for a named street in a named area.
///
/// Each segment is an ordered `(lon, lat)` vertex list. An empty result
/// means the street was not found.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    /// Fetches every segment of `street` within `area`.
    ///
    /// # Errors
    ///
    /// Returns [`RoadError`] if the lookup fails.
    async fn fetch_segments(
        &self,
        area: &str,
        street: &str,
    ) -> Result<Vec<Vec<Coord<f64>>>, RoadError>;
}
