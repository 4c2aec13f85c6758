//! Shared gridtrack data transfer objects: series identifiers, samples and
//! their value shapes, derived gaps, configuration and report envelopes.
#![warn(missing_docs)]

mod config;
mod error;
mod gap;
mod reports;
mod sample;
mod series;

pub use config::{
    BackfillConfig, BackoffConfig, CollectorConfig, ForecastConfig, GapFillConfig, QuotaConfig,
    QuotaConsumptionStrategy, QuotaState, SeriesConfig,
};
pub use error::GridError;
pub use gap::{FetchWindow, Gap};
pub use reports::{
    BackfillOutcome, BackfillStatus, CycleReport, GapFillOutcome, HealthReport,
    InterpolationOutcome, LatestOutcome, ProvenanceCounts, ReconcileOutcome,
    ReconciliationReport, SeriesCycleReport, SeriesReport,
};
pub use sample::{FuelType, GenerationMix, RawSample, Sample, SampleValue};
pub use series::{Provenance, SeriesId};
