use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridtrack_types::{GridError, Provenance, ProvenanceCounts, Sample, SeriesId};
use tokio::sync::RwLock;

use super::{SampleStore, UpsertOutcome};
use crate::timestamp::canonical;

type Rows = BTreeMap<DateTime<Utc>, Sample>;

/// In-process [`SampleStore`] keyed by `(series, instant)`.
///
/// Upserts always use the canonical instant. [`MemoryStore::insert_raw`]
/// bypasses canonicalization to model rows written before normalization
/// existed, which is what the duplicate diagnostics look for. Reads and
/// upserts resolve such rows to their canonical minute.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<SeriesId, Rows>>,
}

/// Every row whose key normalizes to the canonical `instant`.
fn same_minute(rows: &Rows, instant: DateTime<Utc>) -> impl Iterator<Item = &Sample> {
    rows.range(instant..)
        .take_while(move |(key, _)| canonical(**key) == instant)
        .map(|(_, s)| s)
}

/// The strongest row of the minute, reported at the canonical instant.
fn strongest(rows: &Rows, instant: DateTime<Utc>) -> Option<Sample> {
    same_minute(rows, instant)
        .min_by_key(|s| s.provenance)
        .map(|s| Sample { instant, ..*s })
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `sample` under its instant exactly as given, replacing any row at
    /// that exact key without precedence checks.
    pub async fn insert_raw(&self, sample: Sample) {
        self.rows
            .write()
            .await
            .entry(sample.series())
            .or_default()
            .insert(sample.instant, sample);
    }

    /// Every stored sample of `series`, ascending by stored key.
    pub async fn samples(&self, series: SeriesId) -> Vec<Sample> {
        self.rows
            .read()
            .await
            .get(&series)
            .map(|m| m.values().copied().collect())
            .unwrap_or_default()
    }

    /// Number of stored rows for `series`.
    pub async fn len(&self, series: SeriesId) -> usize {
        self.rows.read().await.get(&series).map_or(0, BTreeMap::len)
    }

    /// Whether `series` has no rows.
    pub async fn is_empty(&self, series: SeriesId) -> bool {
        self.len(series).await == 0
    }
}

#[async_trait]
impl SampleStore for MemoryStore {
    async fn upsert(&self, sample: Sample) -> Result<UpsertOutcome, GridError> {
        let sample = Sample {
            instant: canonical(sample.instant),
            ..sample
        };
        let mut rows = self.rows.write().await;
        let series = rows.entry(sample.series()).or_default();
        let outcome = match strongest(series, sample.instant) {
            None => UpsertOutcome::Inserted,
            Some(existing) if sample.provenance.may_replace(existing.provenance) => {
                UpsertOutcome::Replaced
            }
            Some(_) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    series = %sample.series(),
                    instant = %sample.instant,
                    incoming = %sample.provenance,
                    "upsert kept higher-ranked sample"
                );
                return Ok(UpsertOutcome::Kept);
            }
        };
        let replaced: Vec<_> = same_minute(series, sample.instant)
            .map(|s| s.instant)
            .collect();
        for key in replaced {
            series.remove(&key);
        }
        series.insert(sample.instant, sample);
        Ok(outcome)
    }

    async fn query_instants(
        &self,
        series: SeriesId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, GridError> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .rows
            .read()
            .await
            .get(&series)
            .map(|m| m.range(from..=to).map(|(t, _)| *t).collect())
            .unwrap_or_default())
    }

    async fn min_max_instant(
        &self,
        series: SeriesId,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, GridError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&series).and_then(|m| {
            let first = m.keys().next()?;
            let last = m.keys().next_back()?;
            Some((*first, *last))
        }))
    }

    async fn select_provenance(
        &self,
        series: SeriesId,
        provenance: Provenance,
        since: DateTime<Utc>,
    ) -> Result<Vec<Sample>, GridError> {
        Ok(self
            .rows
            .read()
            .await
            .get(&series)
            .map(|m| {
                m.range(since..)
                    .map(|(_, s)| *s)
                    .filter(|s| s.provenance == provenance)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(
        &self,
        series: SeriesId,
        instant: DateTime<Utc>,
    ) -> Result<Option<Sample>, GridError> {
        Ok(self
            .rows
            .read()
            .await
            .get(&series)
            .and_then(|m| strongest(m, canonical(instant))))
    }

    async fn count_by_provenance(&self, series: SeriesId) -> Result<ProvenanceCounts, GridError> {
        let mut counts = ProvenanceCounts::default();
        if let Some(m) = self.rows.read().await.get(&series) {
            for s in m.values() {
                counts.record(s.provenance);
            }
        }
        Ok(counts)
    }
}
