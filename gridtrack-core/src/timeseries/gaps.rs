use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_types::Gap;

use crate::timestamp::canonical;

/// Every grid instant in `start..=end`, stepping by `step`.
///
/// Returns an empty list when `start > end` or `step` is not positive.
#[must_use]
pub fn expected_instants(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: TimeDelta,
) -> Vec<DateTime<Utc>> {
    if step <= TimeDelta::zero() || start > end {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut cursor = Some(start);
    while let Some(t) = cursor.filter(|t| *t <= end) {
        out.push(t);
        cursor = t.checked_add_signed(step);
    }
    out
}

/// Ordered set difference `expected \ present`.
#[must_use]
pub fn missing_instants(
    expected: &[DateTime<Utc>],
    present: &BTreeSet<DateTime<Utc>>,
) -> Vec<DateTime<Utc>> {
    let mut missing: Vec<DateTime<Utc>> = expected
        .iter()
        .copied()
        .filter(|t| !present.contains(t))
        .collect();
    missing.sort_unstable();
    missing
}

/// Walk a sorted list of missing instants and merge each instant that sits
/// exactly one `step` after its predecessor into the same gap.
#[must_use]
pub fn group_missing(missing: &[DateTime<Utc>], step: TimeDelta) -> Vec<Gap> {
    let mut gaps: Vec<Gap> = Vec::new();
    for &t in missing {
        match gaps.last_mut() {
            Some(last) if last.end.checked_add_signed(step) == Some(t) => last.end = t,
            _ => gaps.push(Gap::single(t)),
        }
    }
    gaps
}

/// Gaps of the grid `start..=end` given the stored instants.
///
/// Stored instants are canonicalized before comparison so a seconds-qualified
/// legacy key counts as the grid instant it truncates to.
pub fn find_gaps<I>(start: DateTime<Utc>, end: DateTime<Utc>, step: TimeDelta, stored: I) -> Vec<Gap>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let present: BTreeSet<DateTime<Utc>> = stored.into_iter().map(canonical).collect();
    let expected = expected_instants(start, end, step);
    group_missing(&missing_instants(&expected, &present), step)
}

/// Canonical instants that appear more than once among the stored keys.
///
/// Output is sorted and each duplicated instant is reported once.
pub fn find_duplicates<I>(stored: I) -> Vec<DateTime<Utc>>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut counts: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
    for t in stored {
        *counts.entry(canonical(t)).or_default() += 1;
    }
    counts
        .into_iter()
        .filter_map(|(t, n)| (n > 1).then_some(t))
        .collect()
}
