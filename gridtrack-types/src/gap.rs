//! Derived gap ranges and fetch windows.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// A maximal contiguous run of missing instants, inclusive at both ends.
///
/// `start == end` denotes a single missing sample. Gaps are never persisted;
/// they are recomputed from the stored samples on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gap {
    /// First missing instant.
    pub start: DateTime<Utc>,
    /// Last missing instant.
    pub end: DateTime<Utc>,
}

impl Gap {
    /// Build a gap covering `start..=end`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// A gap of exactly one missing sample.
    #[must_use]
    pub const fn single(instant: DateTime<Utc>) -> Self {
        Self {
            start: instant,
            end: instant,
        }
    }

    /// True when the gap covers one missing sample.
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Number of missing samples on a grid with the given step.
    #[must_use]
    pub fn missing_count(&self, step: TimeDelta) -> usize {
        let step_secs = step.num_seconds().max(1);
        let span = (self.end - self.start).num_seconds().max(0);
        usize::try_from(span / step_secs).unwrap_or(usize::MAX).saturating_add(1)
    }

    /// The half-open window `[start, end + step)` that covers every missing instant.
    #[must_use]
    pub fn to_window(&self, step: TimeDelta) -> FetchWindow {
        FetchWindow {
            from: self.start,
            to: self.end + step,
        }
    }
}

/// A bounded half-open range `[from, to)` submitted to a remote collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchWindow {
    /// Inclusive lower bound.
    pub from: DateTime<Utc>,
    /// Exclusive upper bound.
    pub to: DateTime<Utc>,
}

impl FetchWindow {
    /// Build a window, rejecting `from >= to` with [`GridError::InvalidWindow`].
    ///
    /// # Errors
    /// Returns `InvalidWindow` when the bounds are empty or reversed.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, GridError> {
        if from >= to {
            return Err(GridError::invalid_window(from, to));
        }
        Ok(Self { from, to })
    }

    /// Window of one grid step starting at `instant`.
    #[must_use]
    pub fn at(instant: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            from: instant,
            to: instant + step,
        }
    }

    /// Length of the window.
    #[must_use]
    pub fn span(&self) -> TimeDelta {
        self.to - self.from
    }

    /// Whether `instant` falls inside `[from, to)`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }
}
