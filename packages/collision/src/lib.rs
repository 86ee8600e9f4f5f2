#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collision data loading and filtering.
//!
//! Reads collision CSV exports (plain or gzip-compressed) into
//! [`CollisionRecord`]s and narrows them down by bounding box, date range
//! and severity before they are matched against a road corridor.

pub mod filter;
pub mod loader;
pub mod progress;

pub use corridor_collision_models::CollisionRecord;
pub use filter::{Bounds, CollisionFilter, DateRange, parse_collision_date};
pub use loader::{LoadOptions, load_collisions, read_collisions};

use thiserror::Error;

/// Errors that can occur while loading or filtering collision data.
#[derive(Debug, Error)]
pub enum CollisionError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A column every collision row needs is absent from the header.
    #[error("Collision data is missing required column '{column}'")]
    MissingColumn {
        /// Canonical name of the missing column.
        column: &'static str,
    },

    /// A date argument could not be parsed.
    #[error("Invalid date '{value}': expected DD/MM/YYYY or YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// A bounding box argument could not be parsed.
    #[error("Invalid bounds '{value}': expected min_lon,min_lat,max_lon,max_lat")]
    InvalidBounds {
        /// The rejected input.
        value: String,
    },
}
