//! Seven-point digest of a statistics report, for printing at the end of a
//! run.

use corridor_analytics_models::{CategoryStat, StatisticsReport, find_category};

const RULE_WIDTH: usize = 60;

/// Formats an hour of day as `"5:00 PM (17:00)"`.
#[must_use]
pub fn format_hour(hour: u8) -> String {
    let hour_12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    let meridiem = if hour < 12 { "AM" } else { "PM" };
    format!("{hour_12}:00 {meridiem} ({hour}:00)")
}

/// Renders the numbered highlights: totals, severity shares, and the most
/// common hour, weekday, weather and light condition.
#[must_use]
pub fn render_highlights(report: &StatisticsReport) -> String {
    let severity_pct = |label: &str| {
        find_category(&report.severity, label).map_or(0.0, |s| s.percentage)
    };
    let hour = report
        .time
        .most_common_hour
        .map_or_else(|| "n/a".to_string(), format_hour);

    let rule = "=".repeat(RULE_WIDTH);
    let lines = [
        rule.clone(),
        "COLLISION DATA SUMMARY".to_string(),
        rule.clone(),
        String::new(),
        format!(
            "1) Total number of collisions: {}",
            report.summary.total_collisions
        ),
        String::new(),
        format!("2) Total casualties: {}", report.summary.total_casualties),
        String::new(),
        "3) Severity breakdown:".to_string(),
        format!("   - Slight: {:.2}%", severity_pct("Slight")),
        format!("   - Serious: {:.2}%", severity_pct("Serious")),
        format!("   - Fatal: {:.2}%", severity_pct("Fatal")),
        String::new(),
        format!("4) Most common hour: {hour}"),
        String::new(),
        format!("5) Most common weekday: {}", leader(&report.day_of_week)),
        String::new(),
        format!("6) Most common weather: {}", leader(&report.weather)),
        String::new(),
        format!("7) Most common light condition: {}", leader(&report.light)),
        String::new(),
        rule,
    ];

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Breakdowns are sorted most frequent first, so the leader is the head.
fn leader(stats: &[CategoryStat]) -> String {
    stats.first().map_or_else(
        || "n/a".to_string(),
        |s| format!("{} ({:.2}% of collisions)", s.label, s.percentage),
    )
}
