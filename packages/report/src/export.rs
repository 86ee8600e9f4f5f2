//! CSV export of matched collisions.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use corridor_collision::parse_collision_date;
use corridor_collision_models::MatchedCollision;
use serde::Serialize;

use crate::ReportError;

const HEADER: [&str; 14] = [
    "collision_index",
    "date",
    "time",
    "latitude",
    "longitude",
    "distance_to_road_m",
    "severity",
    "number_of_vehicles",
    "number_of_casualties",
    "speed_limit",
    "weather",
    "light",
    "day",
    "hour",
];

#[derive(Serialize)]
struct ExportRow<'a> {
    collision_index: &'a str,
    date: &'a str,
    time: &'a str,
    latitude: f64,
    longitude: f64,
    distance_to_road_m: f64,
    severity: &'static str,
    number_of_vehicles: u32,
    number_of_casualties: u32,
    speed_limit: Option<i32>,
    weather: &'static str,
    light: &'static str,
    day: &'static str,
    hour: u8,
}

impl<'a> From<&'a MatchedCollision> for ExportRow<'a> {
    fn from(m: &'a MatchedCollision) -> Self {
        Self {
            collision_index: &m.record.id,
            date: &m.record.date,
            time: &m.record.time,
            latitude: m.record.latitude,
            longitude: m.record.longitude,
            distance_to_road_m: m.distance_to_road_m,
            severity: m.severity.label(),
            number_of_vehicles: m.record.number_of_vehicles,
            number_of_casualties: m.record.number_of_casualties,
            speed_limit: m.record.speed_limit,
            weather: m.weather.label(),
            light: m.light.label(),
            day: m.day_of_week.label(),
            hour: m.hour,
        }
    }
}

/// Chronological sort key. Unparseable dates sort after every real date,
/// keeping their relative order.
fn date_key(m: &MatchedCollision) -> (bool, Option<NaiveDate>) {
    let date = parse_collision_date(&m.record.date).ok();
    (date.is_none(), date)
}

/// Writes matched collisions as CSV, oldest first. The header row is
/// always written, even for an empty set.
///
/// # Errors
///
/// Returns [`ReportError`] if encoding or writing fails.
pub fn write_collisions<W: Write>(
    writer: W,
    matched: &[MatchedCollision],
) -> Result<(), ReportError> {
    let mut ordered: Vec<&MatchedCollision> = matched.iter().collect();
    ordered.sort_by_cached_key(|m| date_key(m));

    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(HEADER)?;
    for m in ordered {
        csv.serialize(ExportRow::from(m))?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes matched collisions to a CSV file at `path`.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be created or written.
pub fn write_collisions_csv(path: &Path, matched: &[MatchedCollision]) -> Result<(), ReportError> {
    write_collisions(BufWriter::new(File::create(path)?), matched)?;
    log::info!("Wrote {} collisions to {}", matched.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn export(matched: &[MatchedCollision]) -> String {
        let mut buf = Vec::new();
        write_collisions(&mut buf, matched).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_matches_serialized_fields() {
        let text = export(&[fixtures::matched("A1", "01/02/2023", 3, -0.22, 51.52)]);
        assert_eq!(text.lines().next().unwrap(), HEADER.join(","));
    }

    #[test]
    fn empty_set_writes_header_only() {
        let text = export(&[]);
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn rows_carry_decoded_labels() {
        let text = export(&[fixtures::matched("A1", "01/02/2023", 2, -0.22, 51.52)]);
        let row = text.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "A1,01/02/2023,17:30,51.52,-0.22,12.5,Serious,2,1,20,Fine no high winds,Daylight,Friday,17"
        );
    }

    #[test]
    fn sorted_chronologically_not_lexically() {
        let matched = vec![
            fixtures::matched("late", "02/01/2024", 3, -0.22, 51.52),
            fixtures::matched("bad", "not a date", 3, -0.22, 51.52),
            fixtures::matched("early", "31/12/2022", 3, -0.22, 51.52),
            fixtures::matched("iso", "2023-06-15", 3, -0.22, 51.52),
        ];
        let text = export(&matched);
        let ids: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["early", "iso", "late", "bad"]);
    }

    #[test]
    fn missing_speed_limit_is_blank() {
        let mut m = fixtures::matched("A1", "01/02/2023", 3, -0.22, 51.52);
        m.record.speed_limit = None;
        let text = export(&[m]);
        assert!(text.lines().nth(1).unwrap().contains(",1,,Fine"));
    }
}
