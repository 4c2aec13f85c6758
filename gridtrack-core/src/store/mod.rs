//! Store contract consumed by the engine.
//!
//! The store is the only shared mutable resource. Implementations must apply
//! each upsert atomically per row and enforce the provenance precedence of
//! [`Provenance::may_replace`].

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridtrack_types::{GridError, Provenance, ProvenanceCounts, Sample, SeriesId};

/// What an upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No sample existed at the instant.
    Inserted,
    /// An existing sample was overwritten.
    Replaced,
    /// The existing sample outranks the incoming one and was kept.
    Kept,
}

impl UpsertOutcome {
    /// Whether the store changed.
    #[must_use]
    pub const fn wrote(self) -> bool {
        !matches!(self, Self::Kept)
    }
}

/// Persistent sample storage.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Write `sample` at its canonical instant, honouring provenance precedence.
    ///
    /// Rows stored under a seconds-qualified key of the same minute count as
    /// the same instant: a winning write replaces them all.
    async fn upsert(&self, sample: Sample) -> Result<UpsertOutcome, GridError>;

    /// Stored instants of `series` in `from..=to`, sorted ascending.
    ///
    /// Instants are returned as stored, so legacy seconds-qualified keys may
    /// appear alongside their canonical twin.
    async fn query_instants(
        &self,
        series: SeriesId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, GridError>;

    /// Oldest and newest stored instant, or `None` for an empty series.
    async fn min_max_instant(
        &self,
        series: SeriesId,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, GridError>;

    /// Samples of `series` with the given provenance and an instant at or after `since`.
    async fn select_provenance(
        &self,
        series: SeriesId,
        provenance: Provenance,
        since: DateTime<Utc>,
    ) -> Result<Vec<Sample>, GridError>;

    /// The sample stored at the canonical `instant`, if any.
    ///
    /// Legacy rows keyed anywhere inside that minute resolve to the same
    /// instant; the strongest provenance wins.
    async fn get(&self, series: SeriesId, instant: DateTime<Utc>)
    -> Result<Option<Sample>, GridError>;

    /// Stored samples of `series` per provenance tier.
    async fn count_by_provenance(&self, series: SeriesId) -> Result<ProvenanceCounts, GridError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), GridError> {
        Ok(())
    }
}
