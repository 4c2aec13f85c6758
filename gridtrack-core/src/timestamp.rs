//! Timestamp normalization.
//!
//! Every instant the engine compares, stores or matches goes through this
//! module first. Accepted inputs:
//!
//! - RFC 3339 (`2024-05-01T10:30:00Z`, `2024-05-01T10:30:00.250+00:00`)
//! - ISO date-time with or without seconds, with or without a trailing `Z`
//!   (`2024-05-01T10:30Z`, `2024-05-01T10:30:45`)
//! - a space instead of the `T` separator
//! - explicit offsets (`+00:00`, `+0000`, `+01:00`); non-zero offsets are
//!   converted to UTC
//!
//! Parsed instants are truncated to the minute, so `10:30:45Z` and `10:30Z`
//! are the same instant everywhere in the engine.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Timelike, Utc};
use gridtrack_types::GridError;

/// Canonical string form: UTC, minute precision, trailing `Z`.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Parse any accepted representation into a canonical instant.
///
/// # Errors
/// Returns [`GridError::MalformedTimestamp`] when no accepted form matches.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, GridError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(GridError::malformed_timestamp(raw, "empty input"));
    }

    if let Some(stripped) = s.strip_suffix(['Z', 'z']) {
        return parse_naive(stripped)
            .map(|naive| canonical(naive.and_utc()))
            .ok_or_else(|| GridError::malformed_timestamp(raw, "unrecognized UTC date-time"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(canonical(dt.with_timezone(&Utc)));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(canonical(dt.with_timezone(&Utc)));
        }
    }

    parse_naive(s)
        .map(|naive| canonical(naive.and_utc()))
        .ok_or_else(|| GridError::malformed_timestamp(raw, "unrecognized date-time"))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Normalize `raw` into the canonical string form (`YYYY-MM-DDTHH:MMZ`).
///
/// # Errors
/// Returns [`GridError::MalformedTimestamp`] when `raw` cannot be parsed.
pub fn normalize(raw: &str) -> Result<String, GridError> {
    parse(raw).map(format)
}

/// Render an instant in the canonical string form.
#[must_use]
pub fn format(instant: DateTime<Utc>) -> String {
    canonical(instant).format(CANONICAL_FORMAT).to_string()
}

/// Truncate an instant to minute precision.
#[must_use]
pub fn canonical(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

/// Whether two raw timestamps denote the same canonical instant.
///
/// Unparseable inputs never match anything.
#[must_use]
pub fn timestamps_match(a: &str, b: &str) -> bool {
    matches!((parse(a), parse(b)), (Ok(x), Ok(y)) if x == y)
}

/// Round an instant down onto the grid defined by `step`, anchored at the Unix epoch.
#[must_use]
pub fn align_down(instant: DateTime<Utc>, step: TimeDelta) -> DateTime<Utc> {
    let instant = canonical(instant);
    let step_secs = step.num_seconds();
    if step_secs <= 0 {
        return instant;
    }
    let secs = instant.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(step_secs), 0).unwrap_or(instant)
}

/// Round an instant up onto the grid defined by `step`.
#[must_use]
pub fn align_up(instant: DateTime<Utc>, step: TimeDelta) -> DateTime<Utc> {
    let instant = canonical(instant);
    let down = align_down(instant, step);
    if down == instant {
        down
    } else {
        down.checked_add_signed(step).unwrap_or(down)
    }
}

/// Whether `instant` already sits on the grid.
#[must_use]
pub fn is_aligned(instant: DateTime<Utc>, step: TimeDelta) -> bool {
    align_down(instant, step) == instant
}
