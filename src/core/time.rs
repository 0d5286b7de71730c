//! Time handling shared by the worklog rules.
//!
//! All worklog timestamps are truncated to whole minutes before they are stored
//! or compared, so sub-minute precision never affects ordering, overlap or
//! billing.

use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Formats accepted by [`parse_timestamp`] for timestamps without an offset.
/// Such timestamps are interpreted as UTC.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Drops seconds and sub-second precision.
#[must_use]
pub fn truncate_to_minute(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(timestamp)
}

/// Parses a client-supplied timestamp.
///
/// Accepts RFC 3339 (`2024-01-15T10:00:00Z`, `2024-01-15T11:00:00+01:00`),
/// offset-less date-times (read as UTC) and bare dates (midnight UTC).
///
/// # Errors
/// Returns [`Error::Validation`] naming `field` when nothing matches.
pub fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(Error::validation(format!("Invalid {field} format: '{value}'")))
}

/// Rejects an end time that is not strictly after the start time.
///
/// Both timestamps are compared at minute granularity, so an end time within
/// the same minute as the start is rejected too.
pub fn validate_time_order(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<()> {
    if truncate_to_minute(end_time) <= truncate_to_minute(start_time) {
        return Err(Error::WorklogInvalidTime {
            message: "End time must be after start time".to_string(),
        });
    }
    Ok(())
}

/// Whole minutes between two timestamps after truncation.
#[must_use]
pub fn worked_minutes(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> i64 {
    (truncate_to_minute(end_time) - truncate_to_minute(start_time)).num_minutes()
}

/// Balance minutes charged for a session: worked minutes times the rate.
pub fn calculate_cost(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    cost_per_minute: i64,
) -> Result<i64> {
    worked_minutes(start_time, end_time)
        .checked_mul(cost_per_minute)
        .ok_or_else(|| Error::validation("Work cost is out of range"))
}
