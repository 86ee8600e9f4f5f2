//! Interactive prompts for `corridor` run without a subcommand.
//!
//! Walks through the same choices as `corridor analyze` using `dialoguer`.

use std::path::PathBuf;

use corridor_cli_utils::MultiProgress;
use corridor_collision::CollisionFilter;
use corridor_collision_models::CollisionSeverity;
use corridor_road::RoadRequest;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::analyze::{self, AnalysisRequest};
use crate::config::AnalysisConfig;

/// Ways to pick the road to analyze.
enum RoadChoice {
    Predefined,
    OpenStreetMap,
    Coordinates,
}

impl RoadChoice {
    const ALL: &[Self] = &[Self::Predefined, Self::OpenStreetMap, Self::Coordinates];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Predefined => "Predefined road",
            Self::OpenStreetMap => "Look up a street in OpenStreetMap",
            Self::Coordinates => "Enter coordinates",
        }
    }
}

const SEVERITIES: &[CollisionSeverity] = &[
    CollisionSeverity::Fatal,
    CollisionSeverity::Serious,
    CollisionSeverity::Slight,
];

/// Prompts for a road, a data file and the analysis parameters, then runs
/// the analysis.
///
/// # Errors
///
/// Returns an error if a prompt fails or the analysis fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Road Collision Corridor Analysis");
    println!();

    let road = prompt_road()?;

    let data: String = Input::new()
        .with_prompt("Collision CSV file")
        .interact_text()?;

    let defaults = AnalysisConfig::default();
    let radius_m: f64 = Input::new()
        .with_prompt("Search radius (meters)")
        .default(defaults.radius_m)
        .interact_text()?;
    let interval_m: f64 = Input::new()
        .with_prompt("Sampling interval (meters)")
        .default(defaults.interval_m)
        .interact_text()?;
    let output_dir: String = Input::new()
        .with_prompt("Output directory")
        .default(defaults.output_dir.display().to_string())
        .interact_text()?;
    let filter_zero_vehicles = Confirm::new()
        .with_prompt("Drop collisions with no vehicles?")
        .default(defaults.filter_zero_vehicles)
        .interact()?;

    let config = AnalysisConfig {
        radius_m,
        interval_m,
        output_dir: PathBuf::from(output_dir),
        filter_zero_vehicles,
        ..defaults
    };

    let request = AnalysisRequest {
        road,
        data: PathBuf::from(data.trim()),
        filter: prompt_filter()?,
    };

    analyze::run(request, &config, multi).await?;
    Ok(())
}

fn prompt_road() -> Result<RoadRequest, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = RoadChoice::ALL.iter().map(RoadChoice::label).collect();

    let idx = Select::new()
        .with_prompt("Which road?")
        .items(&labels)
        .default(0)
        .interact()?;

    match RoadChoice::ALL[idx] {
        RoadChoice::Predefined => {
            let roads = corridor_road::registry::all_roads()?;
            let labels: Vec<String> = roads
                .iter()
                .map(|r| format!("{} ({})", r.name, r.area))
                .collect();
            let idx = Select::new()
                .with_prompt("Select a road")
                .items(&labels)
                .default(0)
                .interact()?;
            Ok(RoadRequest::Predefined(roads[idx].id.clone()))
        }
        RoadChoice::OpenStreetMap => {
            let area: String = Input::new()
                .with_prompt("Area (e.g. Hammersmith and Fulham, London)")
                .interact_text()?;
            let street: String = Input::new().with_prompt("Street name").interact_text()?;
            Ok(RoadRequest::Osm {
                area: area.trim().to_string(),
                street: street.trim().to_string(),
            })
        }
        RoadChoice::Coordinates => {
            let coords: String = Input::new()
                .with_prompt("Vertices as lon,lat;lon,lat;...")
                .interact_text()?;
            Ok(RoadRequest::parse_coordinates(&coords)?)
        }
    }
}

fn prompt_filter() -> Result<CollisionFilter, Box<dyn std::error::Error>> {
    if !Confirm::new()
        .with_prompt("Filter collisions by date or severity?")
        .default(false)
        .interact()?
    {
        return Ok(CollisionFilter::default());
    }

    let date_from = prompt_optional("Earliest date (DD/MM/YYYY, empty for none)")?;
    let date_to = prompt_optional("Latest date (DD/MM/YYYY, empty for none)")?;

    let labels: Vec<&str> = SEVERITIES.iter().map(|s| s.label()).collect();
    let selected = MultiSelect::new()
        .with_prompt("Severities to keep (space=toggle, enter=confirm, none=all)")
        .items(&labels)
        .interact()?;
    let codes: Vec<i32> = selected
        .iter()
        .filter_map(|&i| SEVERITIES[i].code())
        .collect();

    Ok(analyze::collision_filter(
        None,
        date_from.as_deref(),
        date_to.as_deref(),
        &codes,
    )?)
}

fn prompt_optional(prompt: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    let trimmed = input.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
