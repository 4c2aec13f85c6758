use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Europe::London;

/// GB settlement period containing `instant`.
///
/// Periods are numbered from 1 in half-hour steps of elapsed time since local
/// midnight in Europe/London, so clock-change days have 46 or 50 periods.
/// Returns `None` only if local midnight cannot be resolved.
#[must_use]
pub fn settlement_period(instant: DateTime<Utc>) -> Option<u8> {
    let local_date = instant.with_timezone(&London).date_naive();
    let midnight = London
        .from_local_datetime(&local_date.and_hms_opt(0, 0, 0)?)
        .earliest()?
        .with_timezone(&Utc);
    let elapsed = (instant - midnight).num_minutes();
    u8::try_from(elapsed / 30 + 1).ok()
}
