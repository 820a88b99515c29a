//! Timestamp parsing for CAS responses.
//!
//! Java-based CAS servers serialise `ZonedDateTime` values, which append the
//! zone name in brackets after the offset, e.g.
//! `2024-03-01T10:15:00.123+08:00[Asia/Shanghai]`. RFC 3339 has no room for
//! that suffix so it is removed before parsing.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Removes a trailing bracketed zone-name annotation.
#[must_use]
pub fn strip_zone_suffix(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.find('[') {
        Some(start) if trimmed.ends_with(']') => trimmed[..start].trim_end(),
        _ => trimmed,
    }
}

/// Parses a CAS timestamp.
///
/// Accepts RFC 3339 with or without a bracketed zone suffix, and offset-less
/// ISO local date-times (read as UTC). Returns `None` when nothing matches;
/// the authentication date is informational and never fails a response.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = strip_zone_suffix(raw);
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
