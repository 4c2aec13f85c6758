use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_core::timestamp::{align_down, align_up, canonical};
use gridtrack_core::{
    FetchWindow, GapFillOutcome, GridError, LatestOutcome, SeriesConfig, SeriesId, chunk_window,
    consolidate_gaps, most_recent,
};

use super::util::lookback;
use crate::Collector;

impl Collector {
    /// Fetch data newer than the newest stored sample of `series`.
    ///
    /// Skipped while the newest sample is younger than `freshness_threshold`.
    /// An empty series starts `initial_lookback_hours` before `now`.
    ///
    /// # Errors
    /// Fails only when the series is not configured or the store cannot be read.
    pub async fn collect_latest(
        &self,
        series: SeriesId,
        now: DateTime<Utc>,
    ) -> Result<LatestOutcome, GridError> {
        let sc = *self.series_config(series)?;
        let _guard = self.lock_series(series).await;
        self.collect_latest_series(&sc, now).await
    }

    /// Re-fetch the most recent consolidated gap ranges of `series`.
    ///
    /// Gaps are detected between the stored samples inside the last
    /// `scan_days`, consolidated, and only the `max_chunks` most recent ranges
    /// are fetched, each split into calls of at most `max_window_hours`.
    ///
    /// # Errors
    /// Fails only when the series is not configured or the store cannot be read.
    pub async fn fill_recent_gaps(
        &self,
        series: SeriesId,
        now: DateTime<Utc>,
    ) -> Result<GapFillOutcome, GridError> {
        let sc = *self.series_config(series)?;
        let _guard = self.lock_series(series).await;
        self.fill_recent_gaps_series(&sc, now).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "gridtrack::collect_latest", skip(self, sc), fields(series = %sc.series))
    )]
    pub(crate) async fn collect_latest_series(
        &self,
        sc: &SeriesConfig,
        now: DateTime<Utc>,
    ) -> Result<LatestOutcome, GridError> {
        let series = sc.series;
        let freshness = TimeDelta::from_std(self.cfg.freshness_threshold).unwrap_or(TimeDelta::MAX);
        let newest = self
            .store
            .min_max_instant(series)
            .await?
            .map(|(_, max)| canonical(max));

        let from = match newest {
            Some(latest) if now - latest < freshness => {
                return Ok(LatestOutcome {
                    skipped_fresh: true,
                    ..LatestOutcome::default()
                });
            }
            Some(latest) => latest,
            None => lookback(now, TimeDelta::hours(i64::from(self.cfg.initial_lookback_hours))),
        };
        let Ok(window) = FetchWindow::new(from, now) else {
            return Ok(LatestOutcome::default());
        };

        let mut outcome = LatestOutcome {
            window: Some(window),
            ..LatestOutcome::default()
        };
        match self.fetch(series, window).await {
            Ok(records) => {
                let ingested = self.ingest(series, Self::step(sc), window, records).await;
                outcome.inserted = ingested.inserted;
                outcome.warnings = ingested.warnings;
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%series, error = %e, "latest collection failed");
                outcome.warnings.push(e);
            }
        }
        Ok(outcome)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "gridtrack::fill_recent_gaps", skip(self, sc), fields(series = %sc.series))
    )]
    pub(crate) async fn fill_recent_gaps_series(
        &self,
        sc: &SeriesConfig,
        now: DateTime<Utc>,
    ) -> Result<GapFillOutcome, GridError> {
        let series = sc.series;
        let step = Self::step(sc);
        let Some((min, max)) = self.store.min_max_instant(series).await? else {
            return Ok(GapFillOutcome::default());
        };
        let scan_start = lookback(now, TimeDelta::days(i64::from(sc.gap_fill.scan_days)));
        let start = align_up(scan_start.max(canonical(min)), step);
        let end = align_down(canonical(max).min(now), step);
        if start >= end {
            return Ok(GapFillOutcome::default());
        }

        let gaps = self.detect(series, step, Some(start), Some(end)).await?;
        let ranges = consolidate_gaps(gaps, step);
        let mut outcome = GapFillOutcome {
            ranges_found: ranges.len(),
            ..GapFillOutcome::default()
        };
        let ranges = most_recent(ranges, sc.gap_fill.max_chunks);
        outcome.ranges_attempted = ranges.len();

        let max_span = TimeDelta::hours(i64::from(sc.gap_fill.max_window_hours));
        for range in ranges {
            for window in chunk_window(range.to_window(step), max_span) {
                outcome.calls += 1;
                match self.fetch(series, window).await {
                    Ok(records) => {
                        let ingested = self.ingest(series, step, window, records).await;
                        outcome.inserted += ingested.inserted;
                        outcome.warnings.extend(ingested.warnings);
                    }
                    Err(e) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(%series, from = %window.from, to = %window.to, error = %e, "gap fill window failed; skipping");
                        outcome.warnings.push(e);
                    }
                }
            }
        }
        Ok(outcome)
    }
}
