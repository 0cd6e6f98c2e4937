//! Mission duration text
//!
//! The deployment date comes from the fact sheet's `Deployed` attribute as
//! free text. It is parsed once; the elapsed time is then reformatted on
//! every tick.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{Result, ViewerError};

/// Attribute label carrying the deployment date
pub const DEPLOYED_LABEL: &str = "Deployed";

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

const UNITS: [(u64, &str); 5] = [
    (SECONDS_PER_YEAR, "year"),
    (SECONDS_PER_DAY, "day"),
    (SECONDS_PER_HOUR, "hour"),
    (SECONDS_PER_MINUTE, "minute"),
    (1, "second"),
];

const DATETIME_FORMATS: [&str; 8] = [
    "%d %B %Y, %H:%M:%S",
    "%d %B %Y, %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%B %d, %Y, %H:%M:%S",
    "%B %d, %Y, %H:%M",
    "%B %d, %Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%d %B %Y", "%B %d, %Y", "%Y-%m-%d"];

/// Verbose duration text with at most `max_units` non-zero units
///
/// `format_duration(400_000s, 3)` gives `"4 days 15 hours 6 minutes"`.
pub fn format_duration(elapsed: Duration, max_units: usize) -> String {
    let mut remaining = elapsed.as_secs();
    let mut parts = Vec::new();

    for (size, unit) in UNITS {
        let count = remaining / size;
        remaining %= size;
        if count == 0 {
            continue;
        }
        let plural = if count == 1 { "" } else { "s" };
        parts.push(format!("{count} {unit}{plural}"));
    }

    if parts.is_empty() {
        return "0 seconds".to_string();
    }
    parts.truncate(max_units.max(1));
    parts.join(" ")
}

/// Duration text for the time between `deployed` and `now`
///
/// A deployment in the future reads as zero elapsed time.
pub fn mission_duration(deployed: DateTime<Utc>, now: DateTime<Utc>, max_units: usize) -> String {
    let elapsed = (now - deployed).to_std().unwrap_or(Duration::ZERO);
    format_duration(elapsed, max_units)
}

/// Parse a `Deployed` attribute value into a UTC timestamp
///
/// Anything from `UTC` onwards is ignored, as is a trailing parenthetical.
/// Date-only values mean midnight UTC.
pub fn deployed_at(text: &str) -> Result<DateTime<Utc>> {
    let mut value = text.split("UTC").next().unwrap_or_default();
    if let Some(paren) = value.find('(') {
        value = &value[..paren];
    }
    let value = value.trim().trim_end_matches([',', ';', '.']).trim();

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&midnight));
            }
        }
    }

    Err(ViewerError::InvalidDate(text.to_string()))
}
