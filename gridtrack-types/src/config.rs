//! Configuration types shared by the collector, the engine and middleware.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::series::SeriesId;

/// Budgeted backward walk toward a retention horizon.
///
/// The three knobs trade backfill completion latency against upstream load and
/// are tuned independently per series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// How far back (in days from now) the oldest stored sample should reach.
    pub target_oldest_days: u32,
    /// Span of each backfill fetch window, in hours.
    pub hours_per_call: u32,
    /// Hard cap on backfill fetch calls per cycle.
    pub max_calls_per_cycle: u32,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            target_oldest_days: 365,
            hours_per_call: 24,
            max_calls_per_cycle: 4,
        }
    }
}

/// Recent-gap fill performed each cycle before backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapFillConfig {
    /// How many days back from now to scan for gaps.
    pub scan_days: u32,
    /// Maximum consolidated ranges fetched per cycle; the most recent are kept.
    pub max_chunks: usize,
    /// Longest span fetched in one call while filling a range, in hours.
    pub max_window_hours: u32,
}

impl Default for GapFillConfig {
    fn default() -> Self {
        Self {
            scan_days: 7,
            max_chunks: 5,
            max_window_hours: 24,
        }
    }
}

/// Per-series reconciliation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Series these settings apply to.
    pub series: SeriesId,
    /// Sampling interval of the series grid, in minutes.
    pub interval_minutes: u32,
    /// Backfill budget.
    pub backfill: BackfillConfig,
    /// Recent-gap fill budget.
    pub gap_fill: GapFillConfig,
    /// Fill isolated single-sample gaps by interpolation.
    pub interpolate: bool,
    /// Promote stored forecasts to actuals when the upstream publishes them.
    pub reconcile_forecasts: bool,
}

impl SeriesConfig {
    /// Defaults for the carbon-intensity series, which publishes forecasts.
    #[must_use]
    pub fn carbon_intensity() -> Self {
        Self {
            series: SeriesId::CarbonIntensity,
            interval_minutes: 30,
            backfill: BackfillConfig {
                hours_per_call: 24 * 7,
                ..BackfillConfig::default()
            },
            gap_fill: GapFillConfig::default(),
            interpolate: true,
            reconcile_forecasts: true,
        }
    }

    /// Defaults for the generation-by-fuel series.
    #[must_use]
    pub fn generation() -> Self {
        Self {
            series: SeriesId::Generation,
            interval_minutes: 30,
            backfill: BackfillConfig {
                hours_per_call: 24 * 3,
                ..BackfillConfig::default()
            },
            gap_fill: GapFillConfig::default(),
            interpolate: true,
            reconcile_forecasts: false,
        }
    }

    /// Defaults for `series`.
    #[must_use]
    pub fn for_series(series: SeriesId) -> Self {
        match series {
            SeriesId::CarbonIntensity => Self::carbon_intensity(),
            SeriesId::Generation => Self::generation(),
        }
    }
}

/// Forecast to actual promotion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Only forecasts within this many hours of now are candidates.
    pub lookback_hours: u32,
    /// Forecasts older than this are left as-is and never re-fetched.
    pub staleness_ceiling_days: u32,
    /// Hard cap on re-fetch calls per series per cycle.
    pub max_calls_per_cycle: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            staleness_ceiling_days: 365,
            max_calls_per_cycle: 48,
        }
    }
}

/// Strategy for consuming units from a quota when handling requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum QuotaConsumptionStrategy {
    /// Each request deducts exactly one unit from the quota budget.
    #[default]
    Unit,
    /// Spread the budget evenly over 24 slices of the window so a burst
    /// cannot drain it early.
    EvenSpreadHourly,
}

/// Configuration for a request budget over a fixed window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum number of units that may be consumed within a single window.
    pub limit: u64,
    /// Duration of the accounting window.
    pub window: Duration,
    /// Strategy for how requests consume units from the budget.
    pub strategy: QuotaConsumptionStrategy,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            window: Duration::from_secs(60 * 60),
            strategy: QuotaConsumptionStrategy::Unit,
        }
    }
}

/// Snapshot of a quota budget at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaState {
    /// Configured maximum units per window.
    pub limit: u64,
    /// Remaining units available in the current window.
    pub remaining: u64,
    /// Time remaining until the current window resets.
    pub reset_in: Duration,
}

/// Exponential backoff applied by the collector loop after a failing tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Minimum backoff delay in milliseconds.
    pub min_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential factor to increase delay after each failure (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: 5_000,
            max_backoff_ms: 60_000,
            factor: 2,
            jitter_percent: 20,
        }
    }
}

/// Global configuration for the `Collector` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Series to reconcile, each with its own budgets.
    pub series: Vec<SeriesConfig>,
    /// Forecast promotion settings shared by every forecast-tracking series.
    pub forecast: ForecastConfig,
    /// Minimum spacing between two full reconciliation cycles.
    pub collection_interval: Duration,
    /// Period of the scheduling loop.
    pub tick_interval: Duration,
    /// Minimum spacing between two health checks.
    pub health_check_interval: Duration,
    /// Latest collection is skipped while the newest sample is younger than this.
    pub freshness_threshold: Duration,
    /// Hours fetched by latest collection when a series is empty.
    pub initial_lookback_hours: u32,
    /// Timeout for individual provider calls.
    pub fetch_timeout: Duration,
    /// Backoff applied after a failing tick.
    pub backoff: BackoffConfig,
}

impl CollectorConfig {
    /// Settings for `series`, if it is configured.
    #[must_use]
    pub fn series_config(&self, series: SeriesId) -> Option<&SeriesConfig> {
        self.series.iter().find(|c| c.series == series)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            series: SeriesId::ALL.into_iter().map(SeriesConfig::for_series).collect(),
            forecast: ForecastConfig::default(),
            collection_interval: Duration::from_secs(300),
            tick_interval: Duration::from_secs(30),
            health_check_interval: Duration::from_secs(60),
            freshness_threshold: Duration::from_secs(60 * 60),
            initial_lookback_hours: 6,
            fetch_timeout: Duration::from_secs(30),
            backoff: BackoffConfig::default(),
        }
    }
}
