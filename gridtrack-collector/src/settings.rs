//! Command line and environment settings for the collector process.
//!
//! Every knob starts from `CollectorConfig::default()` and is replaced only
//! when its `--flag` or `GRIDTRACK_*` variable is set.

use std::time::Duration;

use clap::Parser;
use gridtrack::{CollectorConfig, QuotaConfig, SeriesConfig, SeriesId};

/// Backfill horizons beyond a century are rejected up front.
const MAX_BACKFILL_DAYS: i64 = 36_500;

/// gridtrack collector
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "gridtrack-collector")]
#[command(author, version, about, long_about = None)]
pub struct Settings {
    /// Series to keep reconciled, comma separated
    #[arg(long, env = "GRIDTRACK_SERIES", value_delimiter = ',')]
    pub series: Vec<SeriesId>,

    /// Seconds between full reconciliation cycles
    #[arg(long, env = "GRIDTRACK_COLLECTION_INTERVAL_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub collection_interval_secs: Option<u64>,

    /// Seconds between scheduler ticks
    #[arg(long, env = "GRIDTRACK_TICK_INTERVAL_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_interval_secs: Option<u64>,

    /// Seconds between health checks
    #[arg(long, env = "GRIDTRACK_HEALTH_INTERVAL_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub health_interval_secs: Option<u64>,

    /// Per-call upstream timeout in seconds
    #[arg(long, env = "GRIDTRACK_FETCH_TIMEOUT_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_timeout_secs: Option<u64>,

    /// Skip latest collection while the newest sample is younger than this
    #[arg(long, env = "GRIDTRACK_FRESHNESS_MINUTES")]
    pub freshness_minutes: Option<u32>,

    /// Hours fetched on the first collection of an empty series
    #[arg(long, env = "GRIDTRACK_INITIAL_LOOKBACK_HOURS")]
    pub initial_lookback_hours: Option<u32>,

    /// Retention horizon every series is backfilled toward, in days
    #[arg(long, env = "GRIDTRACK_BACKFILL_DAYS", value_parser = clap::value_parser!(u32).range(0..=MAX_BACKFILL_DAYS))]
    pub backfill_days: Option<u32>,

    /// Backfill fetch calls allowed per series per cycle
    #[arg(long, env = "GRIDTRACK_BACKFILL_MAX_CALLS")]
    pub backfill_max_calls: Option<u32>,

    /// Most recent gap ranges re-fetched per cycle
    #[arg(long, env = "GRIDTRACK_GAP_FILL_MAX_CHUNKS")]
    pub gap_fill_max_chunks: Option<usize>,

    /// Fill isolated single-sample gaps by interpolation
    #[arg(long, env = "GRIDTRACK_INTERPOLATE")]
    pub interpolate: Option<bool>,

    /// How far back stored forecasts are re-checked, in hours
    #[arg(long, env = "GRIDTRACK_FORECAST_LOOKBACK_HOURS")]
    pub forecast_lookback_hours: Option<u32>,

    /// Forecast re-fetches allowed per series per cycle
    #[arg(long, env = "GRIDTRACK_FORECAST_MAX_CALLS")]
    pub forecast_max_calls: Option<u32>,

    /// Upstream calls allowed per connector per hour; 0 disables the quota
    #[arg(long, env = "GRIDTRACK_QUOTA_PER_HOUR")]
    pub quota_per_hour: Option<u64>,

    /// Override the carbon-intensity API base URL
    #[arg(long, env = "GRIDTRACK_CARBON_BASE_URL")]
    pub carbon_base_url: Option<String>,

    /// Override the Elexon API base URL
    #[arg(long, env = "GRIDTRACK_ELEXON_BASE_URL")]
    pub elexon_base_url: Option<String>,
}

impl Settings {
    /// The collector configuration these settings describe.
    #[must_use]
    pub fn collector_config(&self) -> CollectorConfig {
        let mut cfg = CollectorConfig::default();

        if !self.series.is_empty() {
            let mut series: Vec<SeriesId> = Vec::with_capacity(self.series.len());
            for id in &self.series {
                if !series.contains(id) {
                    series.push(*id);
                }
            }
            cfg.series = series.into_iter().map(SeriesConfig::for_series).collect();
        }

        if let Some(secs) = self.collection_interval_secs {
            cfg.collection_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.tick_interval_secs {
            cfg.tick_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.health_interval_secs {
            cfg.health_check_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.fetch_timeout_secs {
            cfg.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(mins) = self.freshness_minutes {
            cfg.freshness_threshold = Duration::from_secs(u64::from(mins) * 60);
        }
        if let Some(h) = self.initial_lookback_hours {
            cfg.initial_lookback_hours = h;
        }

        for sc in &mut cfg.series {
            if let Some(days) = self.backfill_days {
                sc.backfill.target_oldest_days = days;
            }
            if let Some(calls) = self.backfill_max_calls {
                sc.backfill.max_calls_per_cycle = calls;
            }
            if let Some(chunks) = self.gap_fill_max_chunks {
                sc.gap_fill.max_chunks = chunks;
            }
            if let Some(on) = self.interpolate {
                sc.interpolate = on;
            }
        }

        if let Some(h) = self.forecast_lookback_hours {
            cfg.forecast.lookback_hours = h;
        }
        if let Some(calls) = self.forecast_max_calls {
            cfg.forecast.max_calls_per_cycle = calls;
        }
        cfg
    }

    /// Per-connector request budget, when one is set.
    #[must_use]
    pub fn quota(&self) -> Option<QuotaConfig> {
        self.quota_per_hour
            .filter(|limit| *limit > 0)
            .map(|limit| QuotaConfig {
                limit,
                ..QuotaConfig::default()
            })
    }
}
