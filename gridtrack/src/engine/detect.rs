use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_core::timestamp::align_up;
use gridtrack_core::{Gap, GridError, SeriesId, find_duplicates, find_gaps};

use crate::Collector;

impl Collector {
    /// Gaps of `series` on a grid of `interval`, sorted by start.
    ///
    /// Omitted bounds default to the oldest and newest stored instant. The
    /// start is rounded up onto the grid; the end is inclusive.
    ///
    /// # Errors
    /// - `EmptySeries` when a bound is omitted and the series holds nothing.
    /// - `InvalidWindow` when an explicit bound leaves `start >= end`.
    /// - `Store` when the store cannot be read.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "gridtrack::detect", skip(self), err)
    )]
    pub async fn detect(
        &self,
        series: SeriesId,
        interval: TimeDelta,
        window_start: Option<DateTime<Utc>>,
        window_end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Gap>, GridError> {
        if interval <= TimeDelta::zero() {
            return Err(GridError::InvalidArg(format!(
                "interval must be positive, got {interval}"
            )));
        }
        let explicit = window_start.is_some() || window_end.is_some();
        let (start, end) = match (window_start, window_end) {
            (Some(s), Some(e)) => (s, e),
            (s, e) => {
                let (min, max) = self
                    .store
                    .min_max_instant(series)
                    .await?
                    .ok_or(GridError::EmptySeries { series })?;
                (s.unwrap_or(min), e.unwrap_or(max))
            }
        };
        if explicit && start >= end {
            return Err(GridError::invalid_window(start, end));
        }

        let start = align_up(start, interval);
        if start > end {
            return Ok(Vec::new());
        }
        let stored = self.store.query_instants(series, start, end).await?;
        Ok(find_gaps(start, end, interval, stored))
    }

    /// Normalized instants stored more than once for `series`.
    ///
    /// Only stores holding legacy un-normalized keys can produce these. They
    /// are reported, never repaired here.
    ///
    /// # Errors
    /// Returns `Store` when the store cannot be read.
    pub async fn duplicates(&self, series: SeriesId) -> Result<Vec<DateTime<Utc>>, GridError> {
        let Some((min, max)) = self.store.min_max_instant(series).await? else {
            return Ok(Vec::new());
        };
        let stored = self.store.query_instants(series, min, max).await?;
        Ok(find_duplicates(stored))
    }
}
