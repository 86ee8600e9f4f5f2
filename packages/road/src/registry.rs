//! Predefined road registry, loaded from embedded TOML definitions.
//!
//! Each `.toml` file in `packages/road/roads/` is baked into the binary at
//! compile time via [`include_str!`]. Adding a road means adding a TOML
//! file and listing it below.

use corridor_road_models::RoadSpec;

use crate::RoadError;

/// TOML definitions embedded at compile time.
const ROAD_TOMLS: &[(&str, &str)] = &[("askew_road", include_str!("../roads/askew_road.toml"))];

/// Normalises a user-supplied road name to a registry key
/// (`"Askew Road"` becomes `"askew_road"`).
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn parse(file: &str, contents: &str) -> Result<RoadSpec, RoadError> {
    toml::from_str(contents).map_err(|e| RoadError::Config {
        message: format!("{file}.toml: {e}"),
    })
}

/// Returns every predefined road.
///
/// # Errors
///
/// Returns [`RoadError::Config`] if an embedded definition is malformed.
pub fn all_roads() -> Result<Vec<RoadSpec>, RoadError> {
    ROAD_TOMLS
        .iter()
        .map(|(file, contents)| parse(file, contents))
        .collect()
}

/// Looks up a predefined road by id or display name, case-insensitively.
///
/// # Errors
///
/// Returns [`RoadError::UnknownRoad`] if no road matches, or
/// [`RoadError::Config`] if an embedded definition is malformed.
pub fn find_road(name: &str) -> Result<RoadSpec, RoadError> {
    let key = normalize_name(name);

    all_roads()?
        .into_iter()
        .find(|road| road.id == key || normalize_name(&road.name) == key)
        .ok_or_else(|| RoadError::UnknownRoad {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_roads() {
        let roads = all_roads().unwrap();
        assert_eq!(roads.len(), ROAD_TOMLS.len());
        for road in &roads {
            assert!(!road.name.is_empty());
            assert!(road.geometry().is_ok(), "{} has invalid geometry", road.id);
        }
    }

    #[test]
    fn road_ids_match_file_names() {
        for (file, contents) in ROAD_TOMLS {
            assert_eq!(parse(file, contents).unwrap().id, *file);
        }
    }

    #[test]
    fn askew_road_has_sixteen_vertices() {
        let road = find_road("askew_road").unwrap();
        assert_eq!(road.name, "Askew Road");
        assert_eq!(road.coordinates.len(), 16);
        assert_eq!(road.coordinates[0], [-0.2328, 51.5180]);
        assert_eq!(road.coordinates[15], [-0.2180, 51.5210]);
    }

    #[test]
    fn finds_by_display_name() {
        assert_eq!(find_road("Askew Road").unwrap().id, "askew_road");
        assert_eq!(find_road("  ASKEW   road ").unwrap().id, "askew_road");
    }

    #[test]
    fn unknown_road_is_an_error() {
        assert!(matches!(
            find_road("Abbey Road"),
            Err(RoadError::UnknownRoad { .. })
        ));
    }
}
