//! Report envelopes produced by the engine.
//!
//! Each step of a reconciliation cycle yields an outcome carrying its counts
//! and the non-fatal `warnings` it absorbed. A cycle never fails as a whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::gap::{FetchWindow, Gap};
use crate::series::{Provenance, SeriesId};

/// Whether backfill had anything to do this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackfillStatus {
    /// The oldest sample already reaches the retention horizon.
    Satisfied,
    /// Windows were scheduled toward the horizon.
    InProgress {
        /// Whole hours still missing before this cycle ran.
        hours_missing: u64,
        /// Calls needed to close the deficit, before the per-cycle cap.
        calls_needed: u64,
    },
}

/// Outcome of one backfill pass for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillOutcome {
    /// Series that was backfilled.
    pub series: SeriesId,
    /// Whether work was needed.
    pub status: BackfillStatus,
    /// Windows actually submitted, newest first.
    pub windows: Vec<FetchWindow>,
    /// Windows whose fetch failed and was skipped.
    pub failed_windows: usize,
    /// Samples written.
    pub inserted: usize,
    /// Non-fatal issues encountered during the pass.
    pub warnings: Vec<GridError>,
}

/// Outcome of filling recent consolidated gap ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GapFillOutcome {
    /// Consolidated ranges found in the scan window.
    pub ranges_found: usize,
    /// Ranges attempted this cycle (the most recent ones).
    pub ranges_attempted: usize,
    /// Fetch calls issued.
    pub calls: usize,
    /// Samples written.
    pub inserted: usize,
    /// Non-fatal issues encountered during the pass.
    pub warnings: Vec<GridError>,
}

/// Outcome of fetching data newer than the newest stored sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LatestOutcome {
    /// True when the newest sample was fresh enough to skip the fetch.
    pub skipped_fresh: bool,
    /// Window requested, if any.
    pub window: Option<FetchWindow>,
    /// Samples written.
    pub inserted: usize,
    /// Non-fatal issues encountered during the pass.
    pub warnings: Vec<GridError>,
}

/// Outcome of forecast to actual promotion for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReconcileOutcome {
    /// Stored forecasts inside the lookback window.
    pub candidates: usize,
    /// Candidates left untouched because they exceeded the staleness ceiling.
    pub skipped_stale: usize,
    /// Re-fetch calls issued.
    pub calls: usize,
    /// Forecasts promoted to actual.
    pub updated: usize,
    /// Non-fatal issues encountered during the pass.
    pub warnings: Vec<GridError>,
}

/// Outcome of single-sample gap interpolation for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InterpolationOutcome {
    /// Single-sample gaps found.
    pub single_gaps: usize,
    /// Gaps filled with an interpolated sample.
    pub filled: usize,
    /// Gaps left unfilled (missing or synthesized neighbours).
    pub skipped: usize,
    /// Non-fatal issues encountered during the pass.
    pub warnings: Vec<GridError>,
}

/// Everything one cycle did for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesCycleReport {
    /// Series this report covers.
    pub series: SeriesId,
    /// Latest collection step.
    pub latest: LatestOutcome,
    /// Recent-gap fill step.
    pub gap_fill: GapFillOutcome,
    /// Backfill step.
    pub backfill: Option<BackfillOutcome>,
    /// Forecast promotion step, for forecast-tracking series.
    pub reconcile: Option<ReconcileOutcome>,
    /// Interpolation step, when enabled.
    pub interpolation: Option<InterpolationOutcome>,
    /// Failures that prevented a step from running at all.
    pub errors: Vec<GridError>,
}

impl SeriesCycleReport {
    /// Empty report for `series`.
    #[must_use]
    pub fn new(series: SeriesId) -> Self {
        Self {
            series,
            latest: LatestOutcome::default(),
            gap_fill: GapFillOutcome::default(),
            backfill: None,
            reconcile: None,
            interpolation: None,
            errors: Vec::new(),
        }
    }

    /// Samples this cycle added for the series (fetched or interpolated).
    #[must_use]
    pub fn filled(&self) -> usize {
        self.latest.inserted
            + self.gap_fill.inserted
            + self.backfill.as_ref().map_or(0, |b| b.inserted)
            + self.interpolation.as_ref().map_or(0, |i| i.filled)
    }

    /// Every warning and error recorded by the cycle.
    #[must_use]
    pub fn all_warnings(&self) -> Vec<&GridError> {
        self.errors
            .iter()
            .chain(&self.latest.warnings)
            .chain(&self.gap_fill.warnings)
            .chain(self.backfill.iter().flat_map(|b| &b.warnings))
            .chain(self.reconcile.iter().flat_map(|r| &r.warnings))
            .chain(self.interpolation.iter().flat_map(|i| &i.warnings))
            .collect()
    }
}

/// One reconciliation cycle across every configured series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Instant the cycle treated as "now".
    pub now: DateTime<Utc>,
    /// Per-series results, in configuration order.
    pub series: Vec<SeriesCycleReport>,
}

impl CycleReport {
    /// Samples added across all series.
    #[must_use]
    pub fn total_filled(&self) -> usize {
        self.series.iter().map(SeriesCycleReport::filled).sum()
    }

    /// Report for `series`, if it ran.
    #[must_use]
    pub fn get(&self, series: SeriesId) -> Option<&SeriesCycleReport> {
        self.series.iter().find(|r| r.series == series)
    }
}

/// Count of stored samples per provenance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProvenanceCounts {
    /// Authoritative samples.
    pub actual: usize,
    /// Provisional samples.
    pub forecast: usize,
    /// Synthesized samples.
    pub interpolated: usize,
}

impl ProvenanceCounts {
    /// Count for one tier.
    #[must_use]
    pub const fn get(&self, provenance: Provenance) -> usize {
        match provenance {
            Provenance::Actual => self.actual,
            Provenance::Forecast => self.forecast,
            Provenance::Interpolated => self.interpolated,
        }
    }

    /// Add one sample of the given tier.
    pub fn record(&mut self, provenance: Provenance) {
        match provenance {
            Provenance::Actual => self.actual += 1,
            Provenance::Forecast => self.forecast += 1,
            Provenance::Interpolated => self.interpolated += 1,
        }
    }

    /// Samples across all tiers.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.actual + self.forecast + self.interpolated
    }
}

/// Operator-facing state of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesReport {
    /// Series this report covers.
    pub series: SeriesId,
    /// Oldest stored instant.
    pub earliest: Option<DateTime<Utc>>,
    /// Newest stored instant.
    pub latest: Option<DateTime<Utc>>,
    /// Current gaps between `earliest` and `latest`.
    pub gaps: Vec<Gap>,
    /// Missing samples across all gaps.
    pub missing_samples: usize,
    /// Normalized instants stored more than once.
    pub duplicates: Vec<DateTime<Utc>>,
    /// Stored samples per provenance tier.
    pub provenance: ProvenanceCounts,
    /// Samples added by the most recent cycle.
    pub filled_last_cycle: usize,
    /// Non-fatal issues encountered while building the report.
    pub warnings: Vec<GridError>,
}

/// Read-only reconciliation state across all configured series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
    /// Per-series state, in configuration order.
    pub series: Vec<SeriesReport>,
}

impl ReconciliationReport {
    /// Report for `series`, if configured.
    #[must_use]
    pub fn get(&self, series: SeriesId) -> Option<&SeriesReport> {
        self.series.iter().find(|r| r.series == series)
    }
}

/// Result of probing the store and every health-capable connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Whether the store answered.
    pub store: bool,
    /// `(connector name, healthy)` for each connector exposing health.
    pub connectors: Vec<(String, bool)>,
}

impl HealthReport {
    /// True when the store and every probed connector are healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.store && self.connectors.iter().all(|(_, ok)| *ok)
    }
}
