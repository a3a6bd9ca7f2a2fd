//! ISO-8601 timestamp helpers.
//!
//! All timestamps produced by favsync are RFC 3339 strings in UTC with
//! millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.

use crate::error::{ModelError, ModelResult};
use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a UTC instant as an RFC 3339 string.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 string into a UTC instant.
pub fn parse_timestamp(value: &str) -> ModelResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ModelError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
