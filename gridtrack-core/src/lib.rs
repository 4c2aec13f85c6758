//! gridtrack-core
//!
//! Core algorithms, traits and utilities shared across the gridtrack crates.
//!
//! - `timestamp`: the normalizer every comparison goes through.
//! - `timeseries`: grid generation, gap grouping, consolidation, window
//!   planning, interpolation and settlement periods.
//! - `connector`: the `GridConnector` trait and its capability providers.
//! - `store`: the `SampleStore` contract and an in-memory implementation.
//!
//! Async runtime (Tokio)
//! ---------------------
//! `store::MemoryStore` guards its rows with `tokio::sync::RwLock`, so it must
//! be used under a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Connector capability traits and the primary `GridConnector` interface.
pub mod connector;
/// Middleware trait implemented by connector wrappers.
pub mod middleware;
/// Sample store contract and the in-memory store.
pub mod store;
/// Time-series algorithms.
pub mod timeseries;
/// Timestamp parsing, normalization and grid alignment.
pub mod timestamp;

pub use connector::{FetchProvider, GridConnector, HealthProvider};
pub use gridtrack_types::*;
pub use middleware::Middleware;
pub use store::{MemoryStore, SampleStore, UpsertOutcome};
pub use timeseries::consolidate::{consolidate_gaps, most_recent};
pub use timeseries::gaps::{expected_instants, find_duplicates, find_gaps, group_missing};
pub use timeseries::interpolate::{interpolate_sample, interpolate_value, interpolation_factor};
pub use timeseries::settlement::settlement_period;
pub use timeseries::windows::{backfill_windows, chunk_window};

/// Convert a raw upstream record into a sample at its canonical instant.
///
/// # Errors
/// Returns [`GridError::MalformedTimestamp`] when the record's timestamp
/// cannot be parsed.
pub fn normalize_raw(raw: &RawSample) -> Result<Sample, GridError> {
    let instant = timestamp::parse(&raw.timestamp)?;
    Ok(Sample::new(instant, raw.value, raw.provenance))
}
