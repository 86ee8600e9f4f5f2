//! Plain-text analysis report.

use chrono::NaiveDateTime;
use corridor_analytics_models::{CategoryStat, StatisticsReport};
use corridor_road_models::RoadSummary;

const RULE_WIDTH: usize = 80;

/// Number of weather categories listed in the report.
const TOP_WEATHER: usize = 5;

/// Renders the full text report, stamped with the current local time.
#[must_use]
pub fn render_summary_report(
    report: &StatisticsReport,
    road: &RoadSummary,
    radius_m: f64,
) -> String {
    render_summary_report_at(report, road, radius_m, chrono::Local::now().naive_local())
}

/// Renders the full text report with an explicit analysis timestamp.
#[must_use]
pub fn render_summary_report_at(
    report: &StatisticsReport,
    road: &RoadSummary,
    radius_m: f64,
    generated_at: NaiveDateTime,
) -> String {
    let summary = &report.summary;
    let mut lines = vec![
        "=".repeat(RULE_WIDTH),
        "ROAD COLLISION ANALYSIS SUMMARY".to_string(),
        "=".repeat(RULE_WIDTH),
        String::new(),
        format!("Road: {} ({})", road.name, road.source),
        format!("Analysis Date: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        format!("Search Radius: {radius_m} meters"),
        format!("Sample Points: {}", road.num_sample_points),
        format!("Road Length: {:.0} meters", road.road_length_m),
    ];

    section(&mut lines, "SUMMARY STATISTICS");
    lines.push(format!("Total Collisions: {}", summary.total_collisions));
    lines.push(format!("Total Casualties: {}", summary.total_casualties));
    lines.push(format!(
        "Avg Casualties Per Collision: {:.2}",
        summary.avg_casualties_per_collision
    ));
    lines.push(format!(
        "Collisions Per Sample Point: {:.2}",
        summary.collisions_per_sample_point
    ));

    section(&mut lines, "SEVERITY BREAKDOWN");
    category_lines(&mut lines, &report.severity);

    section(&mut lines, "TIME ANALYSIS");
    if let Some(hour) = report.time.most_common_hour {
        lines.push(format!("Most Common Hour: {hour}:00"));
        lines.push(String::new());
    }
    for bucket in &report.time.distribution {
        lines.push(format!(
            "{}: {} ({:.1}%)",
            bucket.bucket, bucket.count, bucket.percentage
        ));
    }

    section(&mut lines, "DAY OF WEEK BREAKDOWN");
    category_lines(&mut lines, &report.day_of_week);

    section(&mut lines, "WEATHER CONDITIONS");
    let top = report.weather.len().min(TOP_WEATHER);
    category_lines(&mut lines, &report.weather[..top]);

    section(&mut lines, "LIGHT CONDITIONS");
    category_lines(&mut lines, &report.light);

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_string());
    lines.push("-".repeat(RULE_WIDTH));
}

fn category_lines(lines: &mut Vec<String>, stats: &[CategoryStat]) {
    lines.extend(
        stats
            .iter()
            .map(|s| format!("{}: {} ({:.1}%)", s.label, s.count, s.percentage)),
    );
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use corridor_road_models::RoadSource;

    use super::*;
    use crate::fixtures;

    fn road() -> RoadSummary {
        RoadSummary {
            name: "Askew Road".to_string(),
            road_length_m: 1084.6,
            num_sample_points: 16,
            interval_m: 75.0,
            num_vertices: 16,
            source: RoadSource::Predefined {
                id: "askew_road".to_string(),
            },
        }
    }

    fn render() -> String {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 0))
            .unwrap();
        render_summary_report_at(&fixtures::report(), &road(), 50.0, at)
    }

    #[test]
    fn header_lists_parameters() {
        let text = render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(80));
        assert_eq!(lines[1], "ROAD COLLISION ANALYSIS SUMMARY");
        assert!(lines.contains(&"Road: Askew Road (predefined)"));
        assert!(lines.contains(&"Analysis Date: 2024-03-09 14:05:00"));
        assert!(lines.contains(&"Search Radius: 50 meters"));
        assert!(lines.contains(&"Sample Points: 16"));
        assert!(lines.contains(&"Road Length: 1085 meters"));
    }

    #[test]
    fn sections_in_order() {
        let text = render();
        let positions: Vec<usize> = [
            "SUMMARY STATISTICS",
            "SEVERITY BREAKDOWN",
            "TIME ANALYSIS",
            "DAY OF WEEK BREAKDOWN",
            "WEATHER CONDITIONS",
            "LIGHT CONDITIONS",
        ]
        .iter()
        .map(|title| text.find(title).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn statistics_lines() {
        let text = render();
        assert!(text.contains("Total Collisions: 4\n"));
        assert!(text.contains("Avg Casualties Per Collision: 1.50\n"));
        assert!(text.contains("Collisions Per Sample Point: 0.25\n"));
        assert!(text.contains("Slight: 3 (75.0%)\n"));
        assert!(text.contains("Most Common Hour: 17:00\n"));
        assert!(text.contains("Evening Rush (16-18): 4 (100.0%)\n"));
        assert!(text.contains("Night (00-06): 0 (0.0%)\n"));
    }

    #[test]
    fn weather_is_limited_to_top_five() {
        let text = render();
        assert!(text.contains("Other: 0 (0.0%)"));
        assert!(!text.contains("Unknown: 0"));
    }

    #[test]
    fn empty_time_analysis_omits_most_common_hour() {
        let mut report = fixtures::report();
        report.time.most_common_hour = None;
        let text = render_summary_report(&report, &road(), 50.0);
        assert!(!text.contains("Most Common Hour"));
    }
}
