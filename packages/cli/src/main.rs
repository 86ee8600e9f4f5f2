#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road collision corridor analysis.
//!
//! ```text
//! corridor analyze --road "Askew Road" --data collisions.csv [--radius 50] [--interval 50]
//! corridor analyze --area "Hammersmith, London" --street "Askew Road" --data collisions.csv.gz
//! corridor analyze --coords "-0.2328,51.5180;-0.2180,51.5210" --data collisions.csv
//! corridor roads
//! ```
//!
//! Running `corridor` with no subcommand enters interactive mode.
//!
//! Log output goes through [`corridor_cli_utils::init_logger`], so `log`
//! lines and progress bars share the terminal.

mod analyze;
mod config;
mod interactive;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use corridor_collision::Bounds;
use corridor_road::RoadRequest;

use crate::analyze::AnalysisRequest;
use crate::config::AnalysisConfig;

#[derive(Parser)]
#[command(name = "corridor", about = "Road collision corridor analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find and summarize the collisions along a road
    Analyze(AnalyzeArgs),
    /// List the predefined roads
    Roads,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Predefined road id or name (see `corridor roads`)
    #[arg(long, conflicts_with_all = ["coords", "area", "street"])]
    road: Option<String>,
    /// Road vertices as "lon,lat;lon,lat;..."
    #[arg(long, conflicts_with_all = ["area", "street"], allow_hyphen_values = true)]
    coords: Option<String>,
    /// Area to search in `OpenStreetMap` (e.g. "Hammersmith and Fulham, London")
    #[arg(long, requires = "street")]
    area: Option<String>,
    /// Street name to look up in `OpenStreetMap`
    #[arg(long, requires = "area")]
    street: Option<String>,

    /// Collision CSV file (`.csv` or `.csv.gz`)
    #[arg(long)]
    data: PathBuf,
    /// Search radius around each sample point, in meters
    #[arg(long)]
    radius: Option<f64>,
    /// Sampling interval along the road, in meters
    #[arg(long)]
    interval: Option<f64>,
    /// Directory for summary.txt, collisions.csv and corridor.geojson
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Only keep collisions inside "`min_lon,min_lat,max_lon,max_lat`"
    #[arg(long, allow_hyphen_values = true)]
    bounds: Option<Bounds>,
    /// Earliest collision date (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long)]
    date_from: Option<String>,
    /// Latest collision date (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long)]
    date_to: Option<String>,
    /// Comma-separated severity codes to keep (1=Fatal, 2=Serious, 3=Slight)
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(i32).range(1..=3))]
    severity: Vec<i32>,

    /// Keep collisions that involve no vehicles
    #[arg(long)]
    keep_zero_vehicles: bool,
    /// Fail when an `OpenStreetMap` street is split into disconnected pieces
    #[arg(long)]
    fail_on_fragmented: bool,
    /// TOML file with analysis parameters; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

impl AnalyzeArgs {
    fn road_request(&self) -> Result<RoadRequest, Box<dyn std::error::Error>> {
        if let Some(name) = &self.road {
            return Ok(RoadRequest::Predefined(name.clone()));
        }
        if let Some(coords) = &self.coords {
            return Ok(RoadRequest::parse_coordinates(coords)?);
        }
        match (&self.area, &self.street) {
            (Some(area), Some(street)) => Ok(RoadRequest::Osm {
                area: area.clone(),
                street: street.clone(),
            }),
            _ => Err("Specify a road with --road, --coords, or --area and --street".into()),
        }
    }

    fn into_request(
        self,
    ) -> Result<(AnalysisRequest, AnalysisConfig), Box<dyn std::error::Error>> {
        let road = self.road_request()?;

        let mut config = AnalysisConfig::load(self.config.as_deref())?;
        if let Some(radius) = self.radius {
            config.radius_m = radius;
        }
        if let Some(interval) = self.interval {
            config.interval_m = interval;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.keep_zero_vehicles {
            config.filter_zero_vehicles = false;
        }
        if self.fail_on_fragmented {
            config.fail_on_fragmented = true;
        }

        let filter = analyze::collision_filter(
            self.bounds,
            self.date_from.as_deref(),
            self.date_to.as_deref(),
            &self.severity,
        )?;

        Ok((
            AnalysisRequest {
                road,
                data: self.data,
                filter,
            },
            config,
        ))
    }
}

fn list_roads() -> Result<(), Box<dyn std::error::Error>> {
    let roads = corridor_road::registry::all_roads()?;
    println!("{:<20} {:<20} AREA", "ID", "NAME");
    println!("{}", "-".repeat(70));
    for road in &roads {
        println!("{:<20} {:<20} {}", road.id, road.name, road.area);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = corridor_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Analyze(args) => {
            let (request, config) = args.into_request()?;
            analyze::run(request, &config, &multi).await?;
        }
        Commands::Roads => list_roads()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use corridor_collision_models::CollisionSeverity;

    use super::*;

    fn analyze(args: &[&str]) -> Result<AnalyzeArgs, clap::Error> {
        let argv = ["corridor", "analyze", "--data", "collisions.csv"]
            .into_iter()
            .chain(args.iter().copied());
        match Cli::try_parse_from(argv)?.command {
            Some(Commands::Analyze(args)) => Ok(args),
            _ => panic!("expected the analyze subcommand"),
        }
    }

    #[test]
    fn predefined_road_with_overrides() {
        let (request, config) = analyze(&[
            "--road",
            "Askew Road",
            "--radius",
            "75",
            "--keep-zero-vehicles",
        ])
        .unwrap()
        .into_request()
        .unwrap();
        assert_eq!(request.road, RoadRequest::Predefined("Askew Road".to_string()));
        assert_eq!(request.data, PathBuf::from("collisions.csv"));
        assert!((config.radius_m - 75.0).abs() < f64::EPSILON);
        assert!((config.interval_m - 50.0).abs() < f64::EPSILON);
        assert!(!config.filter_zero_vehicles);
        assert!(request.filter.is_empty());
    }

    #[test]
    fn coordinates_accept_negative_longitudes() {
        let (request, _) = analyze(&["--coords", "-0.2328,51.5180;-0.2180,51.5210"])
            .unwrap()
            .into_request()
            .unwrap();
        assert_eq!(
            request.road,
            RoadRequest::Coordinates(vec![[-0.2328, 51.5180], [-0.2180, 51.5210]])
        );
    }

    #[test]
    fn osm_lookup_needs_area_and_street() {
        let (request, _) = analyze(&["--area", "Hammersmith", "--street", "Askew Road"])
            .unwrap()
            .into_request()
            .unwrap();
        assert_eq!(
            request.road,
            RoadRequest::Osm {
                area: "Hammersmith".to_string(),
                street: "Askew Road".to_string(),
            }
        );
        assert!(analyze(&["--area", "Hammersmith"]).is_err());
    }

    #[test]
    fn road_sources_are_exclusive_and_required() {
        assert!(analyze(&["--road", "askew_road", "--coords", "0,0;0,1"]).is_err());
        assert!(analyze(&[]).unwrap().into_request().is_err());
    }

    #[test]
    fn filters_are_parsed() {
        let (request, _) = analyze(&[
            "--road",
            "askew_road",
            "--bounds",
            "-0.24,51.51,-0.21,51.53",
            "--date-from",
            "01/01/2022",
            "--date-to",
            "2022-12-31",
            "--severity",
            "1,2",
        ])
        .unwrap()
        .into_request()
        .unwrap();
        let filter = request.filter;
        assert!(filter.bounds.is_some());
        assert!(filter.date_range.from.is_some());
        assert!(filter.date_range.to.is_some());
        assert_eq!(
            filter.severities,
            vec![CollisionSeverity::Fatal, CollisionSeverity::Serious]
        );
    }

    #[test]
    fn severity_codes_are_range_checked() {
        assert!(analyze(&["--road", "askew_road", "--severity", "4"]).is_err());
    }

    #[test]
    fn bad_dates_are_rejected() {
        let args = analyze(&["--road", "askew_road", "--date-from", "yesterday"]).unwrap();
        assert!(args.into_request().is_err());
    }
}
