//! Fixed-interval sampling along a projected road.

use corridor_road_models::{RoadSummary, SamplePoint, SamplePointSet};

use crate::RoadError;
use crate::projection::{ProjectedRoad, project};
use crate::provider::ResolvedRoad;

/// Places sample points every `interval_m` metres from the road start.
///
/// Distances `0, I, 2I, ...` are generated while they are strictly below
/// the road length truncated to whole metres, so the trailing partial
/// interval is never sampled and a road shorter than one metre yields no
/// points. Each point is interpolated on the projected line and converted
/// back to `(lon, lat)`.
///
/// # Errors
///
/// Returns [`RoadError::InvalidInterval`] if `interval_m` is not a
/// positive finite number.
#[allow(clippy::cast_precision_loss)]
pub fn sample(road: &ProjectedRoad, interval_m: f64) -> Result<SamplePointSet, RoadError> {
    if !interval_m.is_finite() || interval_m <= 0.0 {
        return Err(RoadError::InvalidInterval {
            interval: interval_m,
        });
    }

    let limit = road.length_m().floor();
    let mut points: Vec<SamplePoint> = Vec::new();

    loop {
        let index = points.len();
        let distance = index as f64 * interval_m;
        if distance >= limit {
            break;
        }

        let position = road.unproject(road.point_at(distance));
        points.push(SamplePoint {
            index,
            longitude: position.x,
            latitude: position.y,
            distance_along_m: distance,
        });
    }

    log::debug!(
        "Sampled {} points every {interval_m} m along {:.1} m of road",
        points.len(),
        road.length_m()
    );

    Ok(SamplePointSet { interval_m, points })
}

/// A resolved road together with its projection and sample points.
#[derive(Debug, Clone)]
pub struct SampledRoad {
    pub road: ResolvedRoad,
    pub projected: ProjectedRoad,
    pub samples: SamplePointSet,
}

impl SampledRoad {
    #[must_use]
    pub fn summary(&self) -> RoadSummary {
        RoadSummary {
            name: self.road.name.clone(),
            road_length_m: self.projected.length_m(),
            num_sample_points: self.samples.len(),
            interval_m: self.samples.interval_m,
            num_vertices: self.road.geometry.vertex_count(),
            source: self.road.source.clone(),
        }
    }
}

/// Projects a resolved road and samples it every `interval_m` metres.
///
/// # Errors
///
/// Returns [`RoadError::InvalidInterval`] if `interval_m` is not a
/// positive finite number.
pub fn sample_road(road: ResolvedRoad, interval_m: f64) -> Result<SampledRoad, RoadError> {
    let projected = project(&road.geometry);
    let samples = sample(&projected, interval_m)?;

    log::info!(
        "{}: {:.0} m long, {} sample points every {interval_m} m",
        road.name,
        projected.length_m(),
        samples.len()
    );

    Ok(SampledRoad {
        road,
        projected,
        samples,
    })
}
