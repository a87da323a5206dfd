//! Lenient parsing of source-record dates and free-text doses.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

static FIRST_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Parse a source date.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) and
/// `YYYY-MM-DD` (UTC midnight). Anything else is `None`.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse an optional source date; empty and malformed values are `None`.
pub fn parse_optional_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_date)
}

/// First integer substring of a free-text dose.
///
/// "Sertraline 50mg" → 50, "0.25mg" → 0. Returns `None` when there are no
/// digits or the run does not fit in a `u32`.
pub fn parse_dose(text: &str) -> Option<u32> {
    FIRST_INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}
