//! Human-readable formatting helpers

/// Format a duration in seconds as "1h 5m", "12m 3s" or "42s"
pub fn duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Round to one decimal place, the precision used in reports
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
