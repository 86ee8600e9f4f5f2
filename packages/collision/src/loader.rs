//! Collision CSV loader.
//!
//! Parses DfT-style collision exports. The header row is validated up
//! front so a file with a missing column fails as a whole, while rows that
//! fail to decode (e.g. `NULL` coordinates) are skipped individually and
//! counted.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use corridor_collision_models::CollisionRecord;
use serde::Deserialize;

use crate::CollisionError;
use crate::progress::ProgressCallback;

/// Canonical column names and the older header spellings accepted for them.
const COLUMNS: &[(&str, &[&str])] = &[
    ("collision_index", &["accident_index"]),
    ("latitude", &[]),
    ("longitude", &[]),
    ("date", &[]),
    ("time", &[]),
    ("collision_severity", &["accident_severity"]),
    ("day_of_week", &[]),
    ("weather_conditions", &[]),
    ("light_conditions", &[]),
    ("number_of_vehicles", &[]),
    ("number_of_casualties", &[]),
    ("speed_limit", &[]),
];

/// Number of rows between progress updates.
const PROGRESS_BATCH: u64 = 10_000;

/// Options controlling how collision data is loaded.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Drop collisions that involve no vehicles.
    pub filter_zero_vehicles: bool,
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            filter_zero_vehicles: true,
            delimiter: b',',
        }
    }
}

/// One CSV row keyed by canonical column names.
#[derive(Debug, Deserialize)]
struct CollisionRow {
    collision_index: String,
    latitude: f64,
    longitude: f64,
    date: String,
    time: String,
    collision_severity: i32,
    day_of_week: i32,
    weather_conditions: i32,
    light_conditions: i32,
    number_of_vehicles: u32,
    number_of_casualties: u32,
    #[serde(deserialize_with = "csv::invalid_option")]
    speed_limit: Option<i32>,
}

impl CollisionRow {
    fn into_record(self) -> Option<CollisionRecord> {
        if !self.latitude.is_finite()
            || !self.longitude.is_finite()
            || !(-90.0..=90.0).contains(&self.latitude)
            || !(-180.0..=180.0).contains(&self.longitude)
        {
            return None;
        }

        Some(CollisionRecord {
            id: self.collision_index,
            latitude: self.latitude,
            longitude: self.longitude,
            date: self.date,
            time: self.time,
            severity: self.collision_severity,
            day_of_week: self.day_of_week,
            weather: self.weather_conditions,
            light_conditions: self.light_conditions,
            number_of_vehicles: self.number_of_vehicles,
            number_of_casualties: self.number_of_casualties,
            speed_limit: self.speed_limit.filter(|limit| *limit >= 0),
        })
    }
}

/// Loads collisions from a CSV file. Files ending in `.gz` are
/// decompressed on the fly.
///
/// # Errors
///
/// Returns [`CollisionError`] if the file cannot be read, is not valid
/// CSV, or lacks one of the required columns.
pub fn load_collisions(
    path: &Path,
    options: &LoadOptions,
    progress: &dyn ProgressCallback,
) -> Result<Vec<CollisionRecord>, CollisionError> {
    log::info!("Loading collision data from {}...", path.display());

    let file = BufReader::new(File::open(path)?);
    let is_gzipped = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    if is_gzipped {
        read_collisions(flate2::read::GzDecoder::new(file), options, progress)
    } else {
        read_collisions(file, options, progress)
    }
}

/// Reads collisions from any CSV byte stream.
///
/// # Errors
///
/// Returns [`CollisionError`] if the stream is not valid CSV or lacks one
/// of the required columns.
pub fn read_collisions<R: Read>(
    reader: R,
    options: &LoadOptions,
    progress: &dyn ProgressCallback,
) -> Result<Vec<CollisionRecord>, CollisionError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = canonical_headers(reader.headers()?)?;

    progress.set_message("Reading collisions".to_string());

    let mut records = Vec::new();
    let mut skipped = 0u64;
    let mut rows = 0u64;

    for result in reader.records() {
        let row = result?;
        rows += 1;

        match row.deserialize::<CollisionRow>(Some(&headers)) {
            Ok(parsed) => match parsed.into_record() {
                Some(record) => records.push(record),
                None => {
                    log::debug!("Skipping row {rows}: coordinates out of range");
                    skipped += 1;
                }
            },
            Err(e) => {
                log::debug!("Skipping row {rows}: {e}");
                skipped += 1;
            }
        }

        if rows % PROGRESS_BATCH == 0 {
            progress.inc(PROGRESS_BATCH);
        }
    }
    progress.inc(rows % PROGRESS_BATCH);

    log::info!("Total collisions loaded: {}", records.len());
    if skipped > 0 {
        log::warn!("Skipped {skipped} of {rows} rows that could not be parsed");
    }

    if options.filter_zero_vehicles {
        records.retain(|record| record.number_of_vehicles > 0);
        log::info!("After filtering (vehicles > 0): {}", records.len());
    }

    progress.finish(format!("Loaded {} collisions", records.len()));

    Ok(records)
}

/// Rewrites the header row to canonical column names, failing on the
/// first required column that is absent under every accepted spelling.
fn canonical_headers(headers: &csv::StringRecord) -> Result<csv::StringRecord, CollisionError> {
    let mut canonical: Vec<String> = headers
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect();

    for &(column, aliases) in COLUMNS {
        if canonical.iter().any(|h| h == column) {
            continue;
        }
        let Some(position) = canonical
            .iter()
            .position(|h| aliases.iter().any(|alias| alias == h))
        else {
            return Err(CollisionError::MissingColumn { column });
        };
        canonical[position] = column.to_string();
    }

    Ok(csv::StringRecord::from(canonical))
}
