//! Analysis parameters, loaded from an optional TOML file.

use std::path::{Path, PathBuf};

use corridor_road::OsmEndpoints;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Parameters for one analysis run. Missing keys take their defaults.
///
/// ```toml
/// radius_m = 75.0
/// interval_m = 25.0
/// output_dir = "askew"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Corridor search radius around each sample point, in meters.
    pub radius_m: f64,
    /// Spacing between sample points along the road, in meters.
    pub interval_m: f64,
    pub output_dir: PathBuf,
    /// Drop collisions that involve no vehicles.
    pub filter_zero_vehicles: bool,
    /// Fail instead of keeping the longest chain when an OSM street is
    /// disconnected.
    pub fail_on_fragmented: bool,
    pub overpass_url: String,
    pub nominatim_url: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let endpoints = OsmEndpoints::default();
        Self {
            radius_m: 50.0,
            interval_m: 50.0,
            output_dir: PathBuf::from("output"),
            filter_zero_vehicles: true,
            fail_on_fragmented: false,
            overpass_url: endpoints.overpass_url,
            nominatim_url: endpoints.nominatim_url,
        }
    }
}

impl AnalysisConfig {
    /// Reads the config at `path`, or the defaults when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loaded analysis config from {}", path.display());
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    #[must_use]
    pub fn endpoints(&self) -> OsmEndpoints {
        OsmEndpoints {
            overpass_url: self.overpass_url.clone(),
            nominatim_url: self.nominatim_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let config = AnalysisConfig::load(None).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert!((config.radius_m - 50.0).abs() < f64::EPSILON);
        assert!(config.filter_zero_vehicles);
        assert!(!config.fail_on_fragmented);
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AnalysisConfig::parse(
            r#"
            radius_m = 75.0
            output_dir = "askew"
            fail_on_fragmented = true
            "#,
        )
        .unwrap();
        assert!((config.radius_m - 75.0).abs() < f64::EPSILON);
        assert!((config.interval_m - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.output_dir, PathBuf::from("askew"));
        assert!(config.fail_on_fragmented);
        assert_eq!(
            config.endpoints().overpass_url,
            "https://overpass-api.de/api/interpreter"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AnalysisConfig::parse("radius = 10.0").is_err());
    }
}
