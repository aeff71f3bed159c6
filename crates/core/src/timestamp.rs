//! ISO-8601 timestamps as carried on the wire.
//!
//! Events keep the producer's timestamp string verbatim so documents reach
//! the index unmodified. Parsing only happens for display.

use std::borrow::Cow;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Fixed format used when showing timestamps to operators.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format producers use: local wall-clock time with microseconds, no offset.
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Current local time in [`WIRE_FORMAT`].
#[must_use]
pub fn now() -> String {
    Local::now().naive_local().format(WIRE_FORMAT).to_string()
}

/// Parse an ISO-8601 string, with or without offset or time part.
///
/// Offsets are kept as written: the wall-clock time in the given offset is
/// returned, not a conversion to local time.
#[must_use]
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Reformat for display, falling back to the raw value when it does not parse.
#[must_use]
pub fn display(raw: &str) -> Cow<'_, str> {
    match parse(raw) {
        Some(dt) => Cow::Owned(dt.format(DISPLAY_FORMAT).to_string()),
        None => Cow::Borrowed(raw),
    }
}
