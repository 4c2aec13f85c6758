use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_core::GridError;
use rand::Rng;

/// `now - span`, saturating at the earliest representable instant.
pub(crate) fn lookback(now: DateTime<Utc>, span: TimeDelta) -> DateTime<Utc> {
    now.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Collapse a set of provider errors into a uniform `GridError` outcome.
///
/// Rules:
/// - If `attempted_any` is false → `Unsupported(capability)`.
/// - If all errors are `ProviderTimeout` → `RequestTimeout(capability)`.
/// - Else → `AllProvidersFailed(errors)`.
#[must_use]
pub fn collapse_errors(capability: &str, attempted_any: bool, errors: Vec<GridError>) -> GridError {
    if !attempted_any {
        return GridError::unsupported(capability);
    }
    if !errors.is_empty()
        && errors
            .iter()
            .all(|e| matches!(e, GridError::ProviderTimeout { .. }))
    {
        return GridError::request_timeout(capability);
    }
    GridError::AllProvidersFailed(errors)
}

/// `base_ms` plus up to `jitter_percent` percent of random extra delay.
pub(crate) fn jitter_wait(base_ms: u64, jitter_percent: u8) -> u64 {
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100)
    };
    let mut rng = rand::rng();
    base_ms + rng.random_range(0..jitter_range)
}
