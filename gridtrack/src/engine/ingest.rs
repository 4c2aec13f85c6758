use chrono::TimeDelta;
use gridtrack_core::{
    FetchWindow, GridError, Provenance, RawSample, SeriesId, UpsertOutcome, normalize_raw, timestamp,
};

use crate::Collector;

/// What writing one batch of fetched records did.
#[derive(Debug, Default)]
pub(crate) struct Ingested {
    pub inserted: usize,
    pub replaced: usize,
    pub warnings: Vec<GridError>,
}

impl Collector {
    /// Normalize and upsert every record of a fetched batch.
    ///
    /// Each record stands alone: a malformed timestamp, an off-grid instant,
    /// a record claiming to be synthesized or a failed write is recorded as a
    /// warning and the rest of the batch still lands. Records outside `window` are dropped silently.
    pub(crate) async fn ingest(
        &self,
        series: SeriesId,
        step: TimeDelta,
        window: FetchWindow,
        records: Vec<RawSample>,
    ) -> Ingested {
        let mut out = Ingested::default();
        for raw in records {
            if raw.value.series() != series {
                out.warnings.push(GridError::Data(format!(
                    "{} record returned for a {series} fetch",
                    raw.value.series()
                )));
                continue;
            }
            if raw.provenance == Provenance::Interpolated {
                out.warnings.push(GridError::Data(format!(
                    "{series} record at {:?} claims interpolated provenance",
                    raw.timestamp
                )));
                continue;
            }
            let sample = match normalize_raw(&raw) {
                Ok(s) => s,
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%series, error = %e, "rejecting record");
                    out.warnings.push(e);
                    continue;
                }
            };
            if !window.contains(sample.instant) {
                continue;
            }
            if !timestamp::is_aligned(sample.instant, step) {
                out.warnings.push(GridError::Data(format!(
                    "{series} record at {} is off the {}-minute grid",
                    timestamp::format(sample.instant),
                    step.num_minutes()
                )));
                continue;
            }
            match self.store.upsert(sample).await {
                Ok(UpsertOutcome::Inserted) => out.inserted += 1,
                Ok(UpsertOutcome::Replaced) => out.replaced += 1,
                Ok(UpsertOutcome::Kept) => {}
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%series, instant = %sample.instant, error = %e, "store write failed");
                    out.warnings.push(match e {
                        e @ GridError::StoreWrite { .. } => e,
                        other => GridError::store_write(other.to_string()),
                    });
                }
            }
        }
        out
    }
}
