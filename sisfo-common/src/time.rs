//! Timestamp and wall-clock utilities

use chrono::{DateTime, NaiveTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Normalise a wall-clock string to `HH:MM:SS`
///
/// Accepts `HH:MM` and `HH:MM:SS`. The normalised form sorts
/// lexicographically in time order, which the overlap probe and the
/// schedule triggers rely on.
pub fn normalize_time_of_day(value: &str) -> Option<String> {
    let value = value.trim();
    let parsed = NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()?;
    Some(parsed.format("%H:%M:%S").to_string())
}
