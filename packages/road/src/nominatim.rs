//! Nominatim area lookup.
//!
//! Resolves a free-form area name (e.g. `"Hammersmith and Fulham, London,
//! UK"`) to something an Overpass query can be scoped to. Nominatim's
//! public instance allows at most one request per second and requires an
//! identifying `User-Agent`; a single lookup per analysis stays well within
//! that.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::{RoadError, retry};

/// The part of the map an Overpass query is restricted to.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaScope {
    /// An OSM relation (administrative boundary), queried as an Overpass
    /// area.
    Relation { osm_id: u64, display_name: String },
    /// A bounding box, used when the match is not a relation.
    BoundingBox {
        south: f64,
        west: f64,
        north: f64,
        east: f64,
        display_name: String,
    },
}

impl AreaScope {
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Relation { display_name, .. } | Self::BoundingBox { display_name, .. } => {
                display_name
            }
        }
    }
}

/// Looks up an area by name and returns the best match.
///
/// # Errors
///
/// Returns [`RoadError::AreaNotFound`] if Nominatim has no match, or
/// another [`RoadError`] if the request or response parsing fails.
pub async fn resolve_area(
    client: &reqwest::Client,
    base_url: &str,
    area: &str,
) -> Result<AreaScope, RoadError> {
    log::info!("Resolving area '{area}' with Nominatim...");

    let body = retry::send_json(|| {
        client
            .get(base_url)
            .query(&[("q", area), ("format", "jsonv2"), ("limit", "1")])
    })
    .await?;

    let scope = parse_response(&body)?.ok_or_else(|| RoadError::AreaNotFound {
        area: area.to_string(),
    })?;

    log::info!("Area resolved to: {}", scope.display_name());

    Ok(scope)
}

/// Parses a Nominatim `jsonv2` search response.
fn parse_response(body: &serde_json::Value) -> Result<Option<AreaScope>, RoadError> {
    let results = body.as_array().ok_or_else(|| RoadError::Upstream {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let display_name = first["display_name"].as_str().unwrap_or_default().to_string();

    if first["osm_type"].as_str() == Some("relation")
        && let Some(osm_id) = first["osm_id"].as_u64()
    {
        return Ok(Some(AreaScope::Relation {
            osm_id,
            display_name,
        }));
    }

    // [south, north, west, east] as strings
    let bbox: Vec<f64> = first["boundingbox"]
        .as_array()
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().and_then(|s| s.parse().ok()))
                .collect()
        })
        .unwrap_or_default();

    let [south, north, west, east] = bbox[..] else {
        return Err(RoadError::Upstream {
            message: "Missing boundingbox in Nominatim response".to_string(),
        });
    };

    Ok(Some(AreaScope::BoundingBox {
        south,
        west,
        north,
        east,
        display_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_relation_result() {
        let body = serde_json::json!([{
            "osm_type": "relation",
            "osm_id": 51788,
            "display_name": "London Borough of Hammersmith and Fulham, London, England, United Kingdom",
            "boundingbox": ["51.4651", "51.5325", "-0.2543", "-0.1790"]
        }]);
        let scope = parse_response(&body).unwrap().unwrap();
        assert!(matches!(scope, AreaScope::Relation { osm_id: 51_788, .. }));
        assert!(scope.display_name().starts_with("London Borough"));
    }

    #[test]
    fn falls_back_to_bounding_box() {
        let body = serde_json::json!([{
            "osm_type": "node",
            "osm_id": 123,
            "display_name": "Shepherd's Bush",
            "boundingbox": ["51.49", "51.51", "-0.24", "-0.21"]
        }]);
        let AreaScope::BoundingBox {
            south,
            west,
            north,
            east,
            ..
        } = parse_response(&body).unwrap().unwrap()
        else {
            panic!("expected a bounding box");
        };
        assert!((south - 51.49).abs() < 1e-9);
        assert!((north - 51.51).abs() < 1e-9);
        assert!((west + 0.24).abs() < 1e-9);
        assert!((east + 0.21).abs() < 1e-9);
    }

    #[test]
    fn empty_result_is_none() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array() {
        let body = serde_json::json!({"error": "bad request"});
        assert!(matches!(
            parse_response(&body),
            Err(RoadError::Upstream { .. })
        ));
    }
}
