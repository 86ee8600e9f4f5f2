//! Geometry provider: turns a road request into a single validated
//! [`RoadGeometry`].

use corridor_road_models::{RoadGeometry, RoadSource};
use geo::Coord;

use crate::merge::{merge_segments, select_chain};
use crate::{RoadError, SegmentSource, registry};

/// How the road to analyse is specified.
#[derive(Debug, Clone, PartialEq)]
pub enum RoadRequest {
    /// A literal `[lon, lat]` vertex list.
    Coordinates(Vec<[f64; 2]>),
    /// A road from the predefined registry, by id or name.
    Predefined(String),
    /// A street looked up in `OpenStreetMap`.
    Osm { area: String, street: String },
}

impl RoadRequest {
    /// Parses `"lon,lat;lon,lat;..."`.
    ///
    /// # Errors
    ///
    /// Returns [`RoadError::InvalidGeometry`] if a pair is malformed.
    pub fn parse_coordinates(value: &str) -> Result<Self, RoadError> {
        let pairs = value
            .split(';')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let parts: Vec<f64> = pair
                    .split(',')
                    .map(|n| n.trim().parse::<f64>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| RoadError::InvalidGeometry {
                        reason: format!("bad coordinate pair '{pair}': {e}"),
                    })?;
                match parts[..] {
                    [lon, lat] => Ok([lon, lat]),
                    _ => Err(RoadError::InvalidGeometry {
                        reason: format!("expected 'lon,lat', got '{pair}'"),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::Coordinates(pairs))
    }
}

/// A road ready to be projected and sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoad {
    pub name: String,
    pub geometry: RoadGeometry,
    pub source: RoadSource,
}

/// Resolves a request into one connected road geometry.
///
/// Street segments returned by `segments` are merged into chains; a
/// fragmented street keeps its longest chain (with a warning) unless
/// `fail_on_fragmented` is set.
///
/// # Errors
///
/// * [`RoadError::InvalidGeometry`] for a malformed vertex list
/// * [`RoadError::UnknownRoad`] for a name not in the registry
/// * [`RoadError::RoadNotFound`] if the street has no segments
/// * [`RoadError::FragmentedRoad`] as described above
/// * network errors from `segments`
pub async fn resolve_road(
    request: &RoadRequest,
    segments: &dyn SegmentSource,
    fail_on_fragmented: bool,
) -> Result<ResolvedRoad, RoadError> {
    match request {
        RoadRequest::Coordinates(pairs) => Ok(ResolvedRoad {
            name: "Custom road".to_string(),
            geometry: RoadGeometry::from_lon_lat(pairs)?,
            source: RoadSource::Explicit,
        }),
        RoadRequest::Predefined(name) => {
            let spec = registry::find_road(name)?;
            Ok(ResolvedRoad {
                geometry: spec.geometry()?,
                source: RoadSource::Predefined {
                    id: spec.id.clone(),
                },
                name: spec.name,
            })
        }
        RoadRequest::Osm { area, street } => {
            let ways = segments.fetch_segments(area, street).await?;
            if ways.is_empty() {
                return Err(RoadError::RoadNotFound {
                    street: street.clone(),
                    area: area.clone(),
                });
            }

            let count = ways.len();
            let chain = select_chain(merge_segments(ways), fail_on_fragmented)?;
            let vertices: Vec<Coord<f64>> = chain.into_inner();

            Ok(ResolvedRoad {
                name: street.clone(),
                geometry: RoadGeometry::new(vertices)?,
                source: RoadSource::Osm {
                    area: area.clone(),
                    street: street.clone(),
                    segments: count,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct FixedSegments(Vec<Vec<Coord<f64>>>);

    #[async_trait]
    impl SegmentSource for FixedSegments {
        async fn fetch_segments(
            &self,
            _area: &str,
            _street: &str,
        ) -> Result<Vec<Vec<Coord<f64>>>, RoadError> {
            Ok(self.0.clone())
        }
    }

    fn seg(points: &[(f64, f64)]) -> Vec<Coord<f64>> {
        points.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn osm(area: &str, street: &str) -> RoadRequest {
        RoadRequest::Osm {
            area: area.to_string(),
            street: street.to_string(),
        }
    }

    #[test]
    fn parses_coordinate_lists() {
        let request = RoadRequest::parse_coordinates("-0.23,51.51; -0.22,51.52;").unwrap();
        assert_eq!(
            request,
            RoadRequest::Coordinates(vec![[-0.23, 51.51], [-0.22, 51.52]])
        );
        assert!(RoadRequest::parse_coordinates("-0.23;51.51").is_err());
        assert!(RoadRequest::parse_coordinates("a,b").is_err());
    }

    #[tokio::test]
    async fn resolves_explicit_coordinates() {
        let request = RoadRequest::Coordinates(vec![[0.0, 0.0], [0.0, 0.001]]);
        let road = resolve_road(&request, &FixedSegments(Vec::new()), false)
            .await
            .unwrap();
        assert_eq!(road.source, RoadSource::Explicit);
        assert_eq!(road.geometry.vertex_count(), 2);
    }

    #[tokio::test]
    async fn explicit_geometry_is_validated() {
        let request = RoadRequest::Coordinates(vec![[0.0, 0.0]]);
        let err = resolve_road(&request, &FixedSegments(Vec::new()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, RoadError::InvalidGeometry { .. }));
    }

    #[tokio::test]
    async fn resolves_predefined_road() {
        let request = RoadRequest::Predefined("Askew Road".to_string());
        let road = resolve_road(&request, &FixedSegments(Vec::new()), false)
            .await
            .unwrap();
        assert_eq!(road.name, "Askew Road");
        assert_eq!(road.geometry.vertex_count(), 16);
    }

    #[tokio::test]
    async fn street_without_segments_is_not_found() {
        let err = resolve_road(
            &osm("Hammersmith", "Nowhere Lane"),
            &FixedSegments(Vec::new()),
            false,
        )
        .await
        .unwrap_err();
        let RoadError::RoadNotFound { street, area } = err else {
            panic!("expected RoadNotFound, got {err:?}");
        };
        assert_eq!(street, "Nowhere Lane");
        assert_eq!(area, "Hammersmith");
    }

    #[tokio::test]
    async fn merges_osm_segments_and_keeps_longest_chain() {
        let source = FixedSegments(vec![
            seg(&[(0.0, 0.0), (0.0, 0.001)]),
            seg(&[(0.5, 0.0), (0.5, 0.0001)]),
            seg(&[(0.0, 0.002), (0.0, 0.001)]),
        ]);
        let road = resolve_road(&osm("Area", "Street"), &source, false)
            .await
            .unwrap();

        assert_eq!(
            road.geometry.vertices(),
            &seg(&[(0.0, 0.0), (0.0, 0.001), (0.0, 0.002)])[..]
        );
        assert_eq!(
            road.source,
            RoadSource::Osm {
                area: "Area".to_string(),
                street: "Street".to_string(),
                segments: 3,
            }
        );
    }

    #[tokio::test]
    async fn fragmented_osm_road_can_fail() {
        let source = FixedSegments(vec![
            seg(&[(0.0, 0.0), (0.0, 0.001)]),
            seg(&[(0.5, 0.0), (0.5, 0.0001)]),
        ]);
        let err = resolve_road(&osm("Area", "Street"), &source, true)
            .await
            .unwrap_err();
        assert!(matches!(err, RoadError::FragmentedRoad { chains: 2 }));
    }
}
