//! Budgeted backward walk toward the retention horizon.
//!
//! Each cycle anchors at the oldest stored instant (or `now` for an empty
//! series) and issues at most `max_calls_per_cycle` windows of
//! `hours_per_call`, newest first. Windows end at the anchor, so they never
//! cover instants already stored. The next cycle re-anchors at whatever the
//! previous one managed to store.

use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_core::{
    BackfillOutcome, BackfillStatus, GridError, SeriesConfig, SeriesId, backfill_windows,
    timestamp::canonical,
};

use super::util::lookback;
use crate::Collector;

/// Calls needed to cover `hours_missing` whole hours in `hours_per_call` chunks.
pub(crate) fn calls_needed(hours_missing: u64, hours_per_call: u32) -> u64 {
    hours_missing.div_ceil(u64::from(hours_per_call.max(1)))
}

impl Collector {
    /// Run one backfill pass for `series`.
    ///
    /// # Errors
    /// Fails only when the series is not configured or the store cannot be
    /// read. Failed fetch windows are skipped and recorded as warnings.
    pub async fn backfill(
        &self,
        series: SeriesId,
        now: DateTime<Utc>,
    ) -> Result<BackfillOutcome, GridError> {
        let sc = *self.series_config(series)?;
        let _guard = self.lock_series(series).await;
        self.backfill_series(&sc, now).await
    }

    /// Run one backfill pass for every configured series, in configuration order.
    ///
    /// Series are independent: a failure setting up one does not stop the others.
    pub async fn backfill_cycle(
        &self,
        now: DateTime<Utc>,
    ) -> Vec<(SeriesId, Result<BackfillOutcome, GridError>)> {
        let mut out = Vec::with_capacity(self.cfg.series.len());
        for sc in &self.cfg.series {
            out.push((sc.series, self.backfill(sc.series, now).await));
        }
        out
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "gridtrack::backfill",
            skip(self, sc),
            fields(series = %sc.series, target_days = sc.backfill.target_oldest_days),
        )
    )]
    pub(crate) async fn backfill_series(
        &self,
        sc: &SeriesConfig,
        now: DateTime<Utc>,
    ) -> Result<BackfillOutcome, GridError> {
        let series = sc.series;
        let budget = sc.backfill;
        let mut outcome = BackfillOutcome {
            series,
            status: BackfillStatus::Satisfied,
            windows: Vec::new(),
            failed_windows: 0,
            inserted: 0,
            warnings: Vec::new(),
        };

        let oldest = self
            .store
            .min_max_instant(series)
            .await?
            .map_or(now, |(min, _)| canonical(min));
        let target_oldest = lookback(now, TimeDelta::days(i64::from(budget.target_oldest_days)));
        if oldest <= target_oldest {
            return Ok(outcome);
        }

        let hours_missing = u64::try_from((oldest - target_oldest).num_hours()).unwrap_or(0);
        if hours_missing == 0 {
            return Ok(outcome);
        }
        let needed = calls_needed(hours_missing, budget.hours_per_call);
        outcome.status = BackfillStatus::InProgress {
            hours_missing,
            calls_needed: needed,
        };
        let calls = u32::try_from(needed)
            .unwrap_or(u32::MAX)
            .min(budget.max_calls_per_cycle);

        let chunk = TimeDelta::hours(i64::from(budget.hours_per_call));
        let step = Self::step(sc);
        for mut window in backfill_windows(oldest, chunk, calls) {
            // Never reach past the horizon.
            if window.from < target_oldest {
                window.from = target_oldest;
            }
            if window.from >= window.to {
                break;
            }
            outcome.windows.push(window);
            match self.fetch(series, window).await {
                Ok(records) => {
                    let ingested = self.ingest(series, step, window, records).await;
                    outcome.inserted += ingested.inserted;
                    outcome.warnings.extend(ingested.warnings);
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%series, from = %window.from, to = %window.to, error = %e, "backfill window failed; skipping");
                    outcome.failed_windows += 1;
                    outcome.warnings.push(e);
                }
            }
        }
        Ok(outcome)
    }
}
