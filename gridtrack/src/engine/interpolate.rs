use chrono::TimeDelta;
use gridtrack_core::{
    GridError, InterpolationOutcome, Provenance, SeriesId, UpsertOutcome, interpolate_sample,
};

use crate::Collector;

impl Collector {
    /// Fill isolated single-sample gaps of `series` by linear interpolation.
    ///
    /// Longer gaps are left to the fetch paths. A gap is skipped when either
    /// neighbour is missing or is itself interpolated. The synthesized sample
    /// is `Interpolated` and carries `forecast_derived` when either neighbour
    /// rests on forecast data. Re-running is a no-op for filled instants.
    ///
    /// # Errors
    /// `EmptySeries` for a series with no samples, `Store` on read failure.
    pub async fn interpolate(
        &self,
        series: SeriesId,
        interval: TimeDelta,
    ) -> Result<InterpolationOutcome, GridError> {
        let _guard = self.lock_series(series).await;
        self.interpolate_series(series, interval).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "gridtrack::interpolate", skip(self))
    )]
    pub(crate) async fn interpolate_series(
        &self,
        series: SeriesId,
        interval: TimeDelta,
    ) -> Result<InterpolationOutcome, GridError> {
        let gaps = self.detect(series, interval, None, None).await?;
        let mut outcome = InterpolationOutcome::default();

        for gap in gaps.iter().filter(|g| g.is_single()) {
            outcome.single_gaps += 1;
            let at = gap.start;
            let neighbours = (
                self.store.get(series, at - interval).await,
                self.store.get(series, at + interval).await,
            );
            let (before, after) = match neighbours {
                (Ok(Some(b)), Ok(Some(a))) => (b, a),
                (Err(e), _) | (_, Err(e)) => {
                    outcome.skipped += 1;
                    outcome.warnings.push(e);
                    continue;
                }
                _ => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%series, %at, "neighbour missing; leaving gap unfilled");
                    outcome.skipped += 1;
                    continue;
                }
            };
            if before.provenance == Provenance::Interpolated
                || after.provenance == Provenance::Interpolated
            {
                #[cfg(feature = "tracing")]
                tracing::debug!(%series, %at, "neighbour is synthesized; leaving gap unfilled");
                outcome.skipped += 1;
                continue;
            }

            let sample = match interpolate_sample(&before, &after, at) {
                Ok(s) => s,
                Err(e) => {
                    outcome.skipped += 1;
                    outcome.warnings.push(e);
                    continue;
                }
            };
            match self.store.upsert(sample).await {
                Ok(UpsertOutcome::Inserted | UpsertOutcome::Replaced) => outcome.filled += 1,
                Ok(UpsertOutcome::Kept) => outcome.skipped += 1,
                Err(e) => {
                    outcome.skipped += 1;
                    outcome.warnings.push(GridError::store_write(e.to_string()));
                }
            }
        }
        Ok(outcome)
    }
}
