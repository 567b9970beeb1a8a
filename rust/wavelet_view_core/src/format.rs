//! Date formatting for blip timestamps.

use chrono::{DateTime, Utc};

/// `H:MM D-MM-YYYY`, or an empty string for out-of-range input.
pub fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|t| t.format("%-H:%M %-d-%m-%Y").to_string())
        .unwrap_or_default()
}
