//! Free-form date input to ISO-8601.
//!
//! Report endpoints want `YYYY-MM-DDTHH:MM:SS+00:00`. Callers may pass
//! anything from a bare date to an RFC 3339 timestamp or a relative keyword;
//! all results are expressed in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::MapiError;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%d %B %Y"];

/// Convert `input` to an ISO-8601 timestamp with second precision.
pub fn to_iso8601(input: &str) -> Result<String, MapiError> {
    parse_date(input, Utc::now())
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, false))
        .ok_or_else(|| MapiError::InvalidDate(input.to_string()))
}

/// Parse `input` relative to `now`. Returns `None` when nothing matches.
pub fn parse_date(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let today = now.date_naive();
    match input.to_ascii_lowercase().as_str() {
        "now" => return Some(now),
        "today" => return midnight(today),
        "yesterday" => return today.pred_opt().and_then(midnight),
        "tomorrow" => return today.succ_opt().and_then(midnight),
        _ => {}
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
    {
        return Some(Utc.from_utc_datetime(&naive));
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .and_then(midnight)
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}
