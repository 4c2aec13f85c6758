use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_core::{
    FetchWindow, GridError, Provenance, ReconcileOutcome, Sample, SeriesConfig, SeriesId,
    UpsertOutcome, normalize_raw, timestamp::canonical,
};

use super::util::lookback;
use crate::Collector;

impl Collector {
    /// Promote recent stored forecasts of `series` to actuals.
    ///
    /// Candidates are forecasts with an instant in `[now - lookback, now]`.
    /// Each one costs a re-fetch of exactly its own grid slot, oldest first,
    /// up to `max_calls_per_cycle`. Only an actual record at the very same
    /// instant promotes; neighbours and forecast-only answers leave the
    /// candidate untouched.
    ///
    /// # Errors
    /// Fails only when the series is not configured or the store cannot be read.
    pub async fn reconcile_forecasts(
        &self,
        series: SeriesId,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, GridError> {
        let sc = *self.series_config(series)?;
        let _guard = self.lock_series(series).await;
        self.reconcile_series(&sc, now).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "gridtrack::reconcile", skip(self, sc), fields(series = %sc.series))
    )]
    pub(crate) async fn reconcile_series(
        &self,
        sc: &SeriesConfig,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, GridError> {
        let series = sc.series;
        let fc = self.cfg.forecast;
        let since = lookback(now, TimeDelta::hours(i64::from(fc.lookback_hours)));
        let ceiling = lookback(now, TimeDelta::days(i64::from(fc.staleness_ceiling_days)));
        let step = Self::step(sc);
        let max_calls = usize::try_from(fc.max_calls_per_cycle).unwrap_or(usize::MAX);

        let mut candidates: Vec<Sample> = self
            .store
            .select_provenance(series, Provenance::Forecast, since)
            .await?
            .into_iter()
            .map(|s| Sample {
                instant: canonical(s.instant),
                ..s
            })
            .filter(|s| s.instant <= now)
            .collect();
        candidates.sort_by_key(|s| s.instant);
        candidates.dedup_by_key(|s| s.instant);

        let mut outcome = ReconcileOutcome {
            candidates: candidates.len(),
            ..ReconcileOutcome::default()
        };
        for candidate in candidates {
            if candidate.instant < ceiling {
                #[cfg(feature = "tracing")]
                tracing::debug!(%series, instant = %candidate.instant, "forecast past staleness ceiling; leaving as-is");
                outcome.skipped_stale += 1;
                continue;
            }
            if outcome.calls >= max_calls {
                break;
            }
            outcome.calls += 1;

            let window = FetchWindow::at(candidate.instant, step);
            let records = match self.fetch(series, window).await {
                Ok(r) => r,
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%series, instant = %candidate.instant, error = %e, "forecast re-fetch failed");
                    outcome.warnings.push(e);
                    continue;
                }
            };

            let mut promoted = None;
            for raw in &records {
                match normalize_raw(raw) {
                    Ok(s) if s.instant == candidate.instant
                        && s.provenance == Provenance::Actual
                        && s.series() == series =>
                    {
                        promoted = Some(s);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => outcome.warnings.push(e),
                }
            }
            let Some(actual) = promoted else {
                continue;
            };
            match self.store.upsert(Sample::actual(actual.instant, actual.value)).await {
                Ok(UpsertOutcome::Replaced | UpsertOutcome::Inserted) => outcome.updated += 1,
                Ok(UpsertOutcome::Kept) => {}
                Err(e) => outcome.warnings.push(GridError::store_write(e.to_string())),
            }
        }
        Ok(outcome)
    }
}
