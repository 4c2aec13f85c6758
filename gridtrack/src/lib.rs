//! Gridtrack keeps two 30-minute grid series complete and authoritative.
//!
//! Overview
//! - Detects gaps in the stored carbon-intensity and generation-by-fuel
//!   series against their expected 30-minute grid.
//! - Fills recent gaps and walks backward toward a retention horizon under a
//!   hard per-cycle call budget.
//! - Promotes stored forecasts to actuals once the upstream publishes them.
//! - Interpolates isolated single-sample gaps from their two neighbours.
//! - Routes every fetch through registered connectors in order, each bounded
//!   by a timeout, and writes through a provenance-aware store.
//!
//! Key behaviors and trade-offs
//! - Budgets: backfill and forecast promotion never exceed their per-cycle
//!   call caps, so an empty store converges over several cycles instead of
//!   bursting the upstream.
//! - Provenance: `actual` beats `forecast` beats `interpolated`. A write never
//!   downgrades a stored sample.
//! - Failures degrade: a failed window, record or series lands in the cycle
//!   report as a warning and is retried by the next cycle.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use gridtrack::{Collector, MemoryStore};
//!
//! let collector = Collector::builder()
//!     .with_connector(Arc::new(CarbonIntensityConnector::new_default()))
//!     .with_connector(Arc::new(ElexonConnector::new_default()))
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//!
//! let report = collector.run_cycle(chrono::Utc::now()).await;
//! println!("filled {}", report.total_filled());
//!
//! let handle = Arc::new(collector).spawn();
//! // ...
//! handle.stop().await;
//! ```
#![warn(missing_docs)]

pub(crate) mod core;
mod engine;

pub use core::{Collector, CollectorBuilder};
pub use engine::scheduler::{CollectorHandle, SchedulerState, TickReport};
pub use engine::util::collapse_errors;

pub use gridtrack_middleware::{ConnectorBuilder, QuotaAwareConnector, QuotaMiddleware};

// Re-export core types for convenience
pub use gridtrack_core::{
    BackfillConfig, BackfillOutcome, BackfillStatus, BackoffConfig, CollectorConfig, CycleReport,
    FetchWindow, ForecastConfig, FuelType, Gap, GapFillConfig, GapFillOutcome, GenerationMix,
    GridConnector, GridError, HealthReport, InterpolationOutcome, LatestOutcome, MemoryStore,
    Provenance, ProvenanceCounts, QuotaConfig, QuotaConsumptionStrategy, QuotaState, RawSample,
    ReconcileOutcome, ReconciliationReport, Sample, SampleStore, SampleValue, SeriesConfig,
    SeriesCycleReport, SeriesId, SeriesReport, UpsertOutcome,
};
