use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_types::FetchWindow;

/// Backfill windows walking backward from `anchor`, newest first.
///
/// Window `k` covers `[anchor - (k+1)*chunk, anchor - k*chunk)`, so the first
/// window ends exactly at `anchor` and never touches it. At most `calls`
/// windows are produced; fewer if the walk would underflow the calendar.
#[must_use]
pub fn backfill_windows(anchor: DateTime<Utc>, chunk: TimeDelta, calls: u32) -> Vec<FetchWindow> {
    if chunk <= TimeDelta::zero() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(calls as usize);
    let mut to = anchor;
    for _ in 0..calls {
        let Some(from) = to.checked_sub_signed(chunk) else {
            break;
        };
        out.push(FetchWindow { from, to });
        to = from;
    }
    out
}

/// Split `window` into consecutive sub-windows no longer than `max_span`, ascending.
#[must_use]
pub fn chunk_window(window: FetchWindow, max_span: TimeDelta) -> Vec<FetchWindow> {
    if max_span <= TimeDelta::zero() || window.from >= window.to {
        return vec![window];
    }
    let mut out = Vec::new();
    let mut from = window.from;
    while from < window.to {
        let to = from
            .checked_add_signed(max_span)
            .map_or(window.to, |t| t.min(window.to));
        out.push(FetchWindow { from, to });
        from = to;
    }
    out
}
