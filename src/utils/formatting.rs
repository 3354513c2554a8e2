//! Formatting utilities used for CLI outputs.

use chrono::{Local, TimeZone};

pub fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

/// Seconds as `"Xh Ym"`. Negative values are shown as zero.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    format!("{}h {}m", hours, mins)
}

/// Unix seconds as local `YYYY-MM-DD HH:MM`, or `N/A` when out of range.
pub fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "N/A".to_string(),
    }
}
