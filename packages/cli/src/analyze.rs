//! One end-to-end corridor analysis: resolve and sample the road, load and
//! filter collisions, match, aggregate, and write the report files.

use std::path::{Path, PathBuf};
use std::time::Instant;

use corridor_cli_utils::{IndicatifProgress, MultiProgress};
use corridor_collision::{
    Bounds, CollisionError, CollisionFilter, DateRange, LoadOptions, load_collisions,
    parse_collision_date,
};
use corridor_collision_models::CollisionSeverity;
use corridor_road::{OverpassSource, RoadRequest, resolve_road, sample_road};
use corridor_spatial::{match_collisions, validate_radius};

use crate::config::AnalysisConfig;

const USER_AGENT: &str = concat!("road-collision-corridor/", env!("CARGO_PKG_VERSION"));

const SUMMARY_FILE: &str = "summary.txt";
const COLLISIONS_FILE: &str = "collisions.csv";
const LAYERS_FILE: &str = "corridor.geojson";

/// Everything a run needs besides the analysis parameters.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub road: RoadRequest,
    pub data: PathBuf,
    pub filter: CollisionFilter,
}

/// Builds the pre-match collision filter from user input. Severity codes
/// are the source data's (1 = Fatal, 2 = Serious, 3 = Slight).
///
/// # Errors
///
/// Returns [`CollisionError::InvalidDate`] for an unparseable date.
pub fn collision_filter(
    bounds: Option<Bounds>,
    date_from: Option<&str>,
    date_to: Option<&str>,
    severity_codes: &[i32],
) -> Result<CollisionFilter, CollisionError> {
    Ok(CollisionFilter {
        bounds,
        date_range: DateRange {
            from: date_from.map(parse_collision_date).transpose()?,
            to: date_to.map(parse_collision_date).transpose()?,
        },
        severities: severity_codes
            .iter()
            .map(|&code| CollisionSeverity::from_code(code))
            .collect(),
    })
}

/// Paths of the files a run produced.
#[derive(Debug)]
pub struct AnalysisOutputs {
    pub summary: PathBuf,
    pub collisions: PathBuf,
    pub layers: PathBuf,
}

impl AnalysisOutputs {
    /// Creates `dir` if needed and names the output files inside it.
    fn in_dir(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            summary: dir.join(SUMMARY_FILE),
            collisions: dir.join(COLLISIONS_FILE),
            layers: dir.join(LAYERS_FILE),
        })
    }
}

/// Runs the analysis and prints the highlights.
///
/// # Errors
///
/// Returns an error if the search radius is invalid, the road cannot be
/// resolved, the collision data cannot be loaded, or an output file cannot
/// be written.
pub async fn run(
    request: AnalysisRequest,
    config: &AnalysisConfig,
    multi: &MultiProgress,
) -> Result<AnalysisOutputs, Box<dyn std::error::Error>> {
    validate_radius(config.radius_m)?;

    let start = Instant::now();
    let steps = IndicatifProgress::steps_bar(multi, "Resolving road", 5);

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let source = OverpassSource::new(client, config.endpoints());
    let road = resolve_road(&request.road, &source, config.fail_on_fragmented).await?;
    log::info!(
        "Road '{}' from {} with {} vertices",
        road.name,
        road.source,
        road.geometry.vertex_count()
    );
    steps.inc(1);

    steps.set_message("Sampling road".to_string());
    let sampled = sample_road(road, config.interval_m)?;
    let road_summary = sampled.summary();
    log::info!(
        "Road length: {:.0} m, {} sample points every {} m",
        road_summary.road_length_m,
        road_summary.num_sample_points,
        road_summary.interval_m
    );
    steps.inc(1);

    steps.set_message("Loading collisions".to_string());
    let options = LoadOptions {
        filter_zero_vehicles: config.filter_zero_vehicles,
        ..LoadOptions::default()
    };
    let rows = IndicatifProgress::rows_spinner(multi, "Reading collisions");
    let data = request.data;
    let records = tokio::task::spawn_blocking(move || {
        load_collisions(&data, &options, rows.as_ref())
    })
    .await??;
    let records = if request.filter.is_empty() {
        records
    } else {
        request.filter.apply(&records)
    };
    steps.inc(1);

    steps.set_message("Matching collisions".to_string());
    let matched = match_collisions(
        &records,
        &sampled.samples,
        &sampled.road.geometry,
        config.radius_m,
    )?;
    if !matched.skipped.is_empty() {
        log::warn!(
            "{} matched collisions were skipped for malformed time fields",
            matched.skipped.len()
        );
    }
    steps.inc(1);

    steps.set_message("Writing reports".to_string());
    let report = corridor_analytics::aggregate(&matched.collisions, sampled.samples.len());
    let outputs = AnalysisOutputs::in_dir(&config.output_dir)?;
    std::fs::write(
        &outputs.summary,
        corridor_report::render_summary_report(&report, &road_summary, config.radius_m),
    )?;
    corridor_report::write_collisions_csv(&outputs.collisions, &matched.collisions)?;
    let layers = corridor_report::corridor_layers(
        &sampled.road.geometry,
        &sampled.samples,
        &matched.collisions,
        config.radius_m,
    );
    corridor_report::write_layers(&outputs.layers, &layers)?;
    log::info!("Results saved to {}", config.output_dir.display());
    steps.inc(1);
    steps.finish(format!(
        "Analysis complete in {:.1}s",
        start.elapsed().as_secs_f64()
    ));

    println!("{}", corridor_report::render_highlights(&report));
    println!("Summary report: {}", outputs.summary.display());
    println!("Collision data: {}", outputs.collisions.display());
    println!("Map layers:     {}", outputs.layers.display());

    Ok(outputs)
}
