//! Overpass API client for fetching a named street's ways.
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL>

use async_trait::async_trait;
use geo::Coord;

use crate::nominatim::{self, AreaScope};
use crate::{RoadError, SegmentSource, retry};

/// Overpass server-side timeout, in seconds.
const QUERY_TIMEOUT_SECS: u32 = 60;

/// Relation ids are offset by this much to form an Overpass area id.
const RELATION_AREA_OFFSET: u64 = 3_600_000_000;

/// Builds the Overpass QL query for every `highway` way named `street`
/// within `scope`, returned with inline geometry.
#[must_use]
pub fn build_query(street: &str, scope: &AreaScope) -> String {
    let name = escape(street);

    match scope {
        AreaScope::Relation { osm_id, .. } => format!(
            "[out:json][timeout:{QUERY_TIMEOUT_SECS}];\
             area({area_id})->.searchArea;\
             way[\"highway\"][\"name\"=\"{name}\"](area.searchArea);\
             out geom;",
            area_id = RELATION_AREA_OFFSET + osm_id,
        ),
        AreaScope::BoundingBox {
            south,
            west,
            north,
            east,
            ..
        } => format!(
            "[out:json][timeout:{QUERY_TIMEOUT_SECS}];\
             way[\"highway\"][\"name\"=\"{name}\"]({south},{west},{north},{east});\
             out geom;"
        ),
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Extracts each way's vertex list from an `out geom` response.
///
/// Ways without usable geometry are skipped.
///
/// # Errors
///
/// Returns [`RoadError::Upstream`] if the response has no `elements`
/// array.
pub fn parse_ways(body: &serde_json::Value) -> Result<Vec<Vec<Coord<f64>>>, RoadError> {
    let elements = body["elements"]
        .as_array()
        .ok_or_else(|| RoadError::Upstream {
            message: "Overpass response has no elements array".to_string(),
        })?;

    let ways = elements
        .iter()
        .filter(|el| el["type"].as_str() == Some("way"))
        .filter_map(|el| {
            let vertices: Vec<Coord<f64>> = el["geometry"]
                .as_array()?
                .iter()
                .filter_map(|node| {
                    Some(Coord {
                        x: node["lon"].as_f64()?,
                        y: node["lat"].as_f64()?,
                    })
                })
                .collect();
            (vertices.len() >= 2).then_some(vertices)
        })
        .collect();

    Ok(ways)
}

/// Endpoints for the public `OpenStreetMap` services.
#[derive(Debug, Clone)]
pub struct OsmEndpoints {
    pub overpass_url: String,
    pub nominatim_url: String,
}

impl Default for OsmEndpoints {
    fn default() -> Self {
        Self {
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_string(),
        }
    }
}

/// Fetches street segments from Overpass, scoping the query with a
/// Nominatim area lookup.
pub struct OverpassSource {
    client: reqwest::Client,
    endpoints: OsmEndpoints,
}

impl OverpassSource {
    #[must_use]
    pub const fn new(client: reqwest::Client, endpoints: OsmEndpoints) -> Self {
        Self { client, endpoints }
    }
}

#[async_trait]
impl SegmentSource for OverpassSource {
    async fn fetch_segments(
        &self,
        area: &str,
        street: &str,
    ) -> Result<Vec<Vec<Coord<f64>>>, RoadError> {
        let scope =
            nominatim::resolve_area(&self.client, &self.endpoints.nominatim_url, area).await?;
        let query = build_query(street, &scope);

        log::info!("Fetching '{street}' from OpenStreetMap in '{area}'...");
        log::debug!("Overpass query: {query}");

        let body = retry::send_json(|| {
            self.client
                .get(&self.endpoints.overpass_url)
                .query(&[("data", query.as_str())])
        })
        .await?;

        let ways = parse_ways(&body)?;
        log::info!("Found {} segments of {street}", ways.len());

        Ok(ways)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_relation_area_query() {
        let scope = AreaScope::Relation {
            osm_id: 51_788,
            display_name: String::new(),
        };
        let query = build_query("Askew Road", &scope);
        assert!(query.starts_with("[out:json][timeout:60];"));
        assert!(query.contains("area(3600051788)->.searchArea;"));
        assert!(query.contains("way[\"highway\"][\"name\"=\"Askew Road\"](area.searchArea);"));
        assert!(query.ends_with("out geom;"));
    }

    #[test]
    fn builds_bounding_box_query() {
        let scope = AreaScope::BoundingBox {
            south: 51.49,
            west: -0.24,
            north: 51.51,
            east: -0.21,
            display_name: String::new(),
        };
        let query = build_query("Askew Road", &scope);
        assert!(query.contains("(51.49,-0.24,51.51,-0.21);"));
    }

    #[test]
    fn escapes_quotes_in_street_names() {
        let scope = AreaScope::Relation {
            osm_id: 1,
            display_name: String::new(),
        };
        let query = build_query("King's \"Old\" Road", &scope);
        assert!(query.contains("\"name\"=\"King's \\\"Old\\\" Road\""));
    }

    #[test]
    fn parses_way_geometry() {
        let body = serde_json::json!({
            "elements": [
                {
                    "type": "way",
                    "id": 1,
                    "geometry": [
                        {"lat": 51.5180, "lon": -0.2328},
                        {"lat": 51.5182, "lon": -0.2320}
                    ]
                },
                {
                    "type": "way",
                    "id": 2,
                    "geometry": [{"lat": 51.5182, "lon": -0.2320}]
                },
                {"type": "node", "id": 3, "lat": 51.0, "lon": 0.0}
            ]
        });
        let ways = parse_ways(&body).unwrap();
        assert_eq!(ways.len(), 1);
        assert!((ways[0][0].x + 0.2328).abs() < 1e-12);
        assert!((ways[0][1].y - 51.5182).abs() < 1e-12);
    }

    #[test]
    fn rejects_response_without_elements() {
        let body = serde_json::json!({"remark": "runtime error"});
        assert!(parse_ways(&body).is_err());
    }
}
