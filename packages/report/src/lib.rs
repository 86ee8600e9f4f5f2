#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Output artifacts for a road collision corridor analysis.
//!
//! * [`summary`]: the plain-text analysis report
//! * [`highlights`]: a short numbered digest for the terminal
//! * [`export`]: CSV export of the matched collisions
//! * [`layers`]: `GeoJSON` map layers (road, sample points, collisions)

pub mod export;
pub mod highlights;
pub mod layers;
pub mod summary;

pub use export::{write_collisions, write_collisions_csv};
pub use highlights::render_highlights;
pub use layers::{corridor_layers, write_layers};
pub use summary::{render_summary_report, render_summary_report_at};

use thiserror::Error;

/// Errors that can occur while writing report files.
#[derive(Debug, Error)]
pub enum ReportError {
    /// I/O error (file create/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
