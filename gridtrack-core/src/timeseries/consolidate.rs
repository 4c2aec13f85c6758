use chrono::TimeDelta;
use gridtrack_types::Gap;

/// Merge gap ranges that overlap or touch on the grid.
///
/// Input need not be sorted or pre-merged. Output is sorted by start and no
/// two ranges are separated by exactly one `step`, so each remaining range is
/// a distinct outage worth one fetch plan.
#[must_use]
pub fn consolidate_gaps<I>(gaps: I, step: TimeDelta) -> Vec<Gap>
where
    I: IntoIterator<Item = Gap>,
{
    let mut sorted: Vec<Gap> = gaps
        .into_iter()
        .map(|g| {
            if g.start <= g.end {
                g
            } else {
                Gap::new(g.end, g.start)
            }
        })
        .collect();
    sorted.sort_unstable();

    let mut out: Vec<Gap> = Vec::with_capacity(sorted.len());
    for gap in sorted {
        match out.last_mut() {
            Some(prev) if prev.end.checked_add_signed(step).is_some_and(|n| gap.start <= n) => {
                prev.end = prev.end.max(gap.end);
            }
            _ => out.push(gap),
        }
    }
    out
}

/// Keep the `n` most recent ranges, preserving ascending order.
#[must_use]
pub fn most_recent(mut gaps: Vec<Gap>, n: usize) -> Vec<Gap> {
    gaps.sort_unstable();
    let skip = gaps.len().saturating_sub(n);
    gaps.split_off(skip)
}
