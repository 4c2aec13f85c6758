use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::TimeDelta;
use gridtrack_core::{
    CollectorConfig, FetchWindow, ForecastConfig, GridConnector, GridError, MemoryStore, RawSample,
    SampleStore, SeriesConfig, SeriesId,
};
use tokio::sync::{Mutex, MutexGuard};

use crate::engine::scheduler::SchedulerState;
use crate::engine::util::collapse_errors;

/// Orchestrator that runs reconciliation cycles for every configured series.
///
/// Cycles for the same series are serialized by a per-series lock; different
/// series may run interleaved.
pub struct Collector {
    pub(crate) connectors: Vec<Arc<dyn GridConnector>>,
    pub(crate) store: Arc<dyn SampleStore>,
    pub(crate) cfg: CollectorConfig,
    pub(crate) series_locks: HashMap<SeriesId, Mutex<()>>,
    pub(crate) last_filled: StdMutex<HashMap<SeriesId, usize>>,
    pub(crate) scheduler: Mutex<SchedulerState>,
}

/// Builder for constructing a [`Collector`] with custom configuration.
pub struct CollectorBuilder {
    connectors: Vec<Arc<dyn GridConnector>>,
    store: Option<Arc<dyn SampleStore>>,
    cfg: CollectorConfig,
}

impl Default for CollectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorBuilder {
    /// Start with no connectors, no store and [`CollectorConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            connectors: vec![],
            store: None,
            cfg: CollectorConfig::default(),
        }
    }

    /// Register a connector.
    ///
    /// When several connectors serve the same series they are tried in
    /// registration order and the first success wins.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn GridConnector>) -> Self {
        self.connectors.push(c);
        self
    }

    /// Use `store` for all reads and writes. Defaults to a fresh [`MemoryStore`].
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SampleStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: CollectorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Add or replace the settings for one series.
    #[must_use]
    pub fn series(mut self, series_cfg: SeriesConfig) -> Self {
        match self.cfg.series.iter_mut().find(|c| c.series == series_cfg.series) {
            Some(slot) => *slot = series_cfg,
            None => self.cfg.series.push(series_cfg),
        }
        self
    }

    /// Restrict the collector to the listed series, in the given order.
    #[must_use]
    pub fn only_series(mut self, series: &[SeriesId]) -> Self {
        self.cfg.series.retain(|c| series.contains(&c.series));
        self.cfg
            .series
            .sort_by_key(|c| series.iter().position(|s| *s == c.series));
        self
    }

    /// Forecast promotion settings.
    #[must_use]
    pub const fn forecast(mut self, forecast: ForecastConfig) -> Self {
        self.cfg.forecast = forecast;
        self
    }

    /// Bound every provider call by `timeout`.
    #[must_use]
    pub const fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.fetch_timeout = timeout;
        self
    }

    /// Build the collector.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no connectors were registered, a series is
    /// configured twice, or a series has a zero interval or backfill chunk.
    pub fn build(self) -> Result<Collector, GridError> {
        if self.connectors.is_empty() {
            return Err(GridError::InvalidArg(
                "no connectors registered; add at least one via with_connector(...)".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for sc in &self.cfg.series {
            if !seen.insert(sc.series) {
                return Err(GridError::InvalidArg(format!(
                    "series {} configured more than once",
                    sc.series
                )));
            }
            if sc.interval_minutes == 0 {
                return Err(GridError::InvalidArg(format!(
                    "series {}: interval_minutes must be positive",
                    sc.series
                )));
            }
            if sc.backfill.hours_per_call == 0 {
                return Err(GridError::InvalidArg(format!(
                    "series {}: backfill.hours_per_call must be positive",
                    sc.series
                )));
            }
            #[cfg(feature = "tracing")]
            if !self.connectors.iter().any(|c| c.supports_series(sc.series)) {
                tracing::warn!(series = %sc.series, "no registered connector serves this series");
            }
        }

        let series_locks = self.cfg.series.iter().map(|c| (c.series, Mutex::new(()))).collect();
        Ok(Collector {
            connectors: self.connectors,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn SampleStore>),
            cfg: self.cfg,
            series_locks,
            last_filled: StdMutex::new(HashMap::new()),
            scheduler: Mutex::new(SchedulerState::default()),
        })
    }
}

/// Attribute a provider error to `connector` unless it already names one.
pub(crate) fn tag_err(connector: &str, e: GridError) -> GridError {
    match e {
        e @ (GridError::RemoteFetch { .. }
        | GridError::ProviderTimeout { .. }
        | GridError::QuotaExceeded { .. }
        | GridError::Unsupported { .. }
        | GridError::AllProvidersFailed(_)) => e,
        other => GridError::remote_fetch(connector, other.to_string()),
    }
}

impl Collector {
    /// Start building a new collector.
    #[must_use]
    pub fn builder() -> CollectorBuilder {
        CollectorBuilder::new()
    }

    /// The store this collector reads and writes.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SampleStore> {
        &self.store
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CollectorConfig {
        &self.cfg
    }

    pub(crate) fn series_config(&self, series: SeriesId) -> Result<&SeriesConfig, GridError> {
        self.cfg
            .series_config(series)
            .ok_or_else(|| GridError::InvalidArg(format!("series {series} is not configured")))
    }

    pub(crate) async fn lock_series(&self, series: SeriesId) -> Option<MutexGuard<'_, ()>> {
        match self.series_locks.get(&series) {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }

    /// Wrap a provider future with a timeout and standardized timeout error mapping.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "gridtrack::core::provider_call_with_timeout",
            skip(fut),
            fields(
                connector = connector_name,
                capability = capability,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    pub(crate) async fn provider_call_with_timeout<T, Fut>(
        connector_name: &'static str,
        capability: &'static str,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, GridError>
    where
        Fut: core::future::Future<Output = Result<T, GridError>>,
    {
        (tokio::time::timeout(timeout, fut).await)
            .unwrap_or_else(|_| Err(GridError::provider_timeout(connector_name, capability)))
    }

    /// Fetch `window` of `series` from the first connector that succeeds.
    ///
    /// Connectors serving the series are tried in registration order, each
    /// bounded by `fetch_timeout`. An empty answer is a success.
    ///
    /// # Errors
    /// `Unsupported` when no connector serves the series, otherwise
    /// `AllProvidersFailed` (or `RequestTimeout` when every attempt timed out).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "gridtrack::core::fetch",
            skip(self),
            fields(from = %window.from, to = %window.to),
        )
    )]
    pub async fn fetch(
        &self,
        series: SeriesId,
        window: FetchWindow,
    ) -> Result<Vec<RawSample>, GridError> {
        let mut errors = Vec::new();
        let mut attempted_any = false;
        for c in self.connectors.iter().filter(|c| c.supports_series(series)) {
            let Some(provider) = c.as_fetch_provider() else {
                continue;
            };
            attempted_any = true;
            let fut = provider.fetch(series, window);
            match Self::provider_call_with_timeout(c.name(), "fetch", self.cfg.fetch_timeout, fut)
                .await
            {
                Ok(records) => return Ok(records),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(connector = c.name(), error = %e, "provider fetch failed");
                    errors.push(tag_err(c.name(), e));
                }
            }
        }
        Err(collapse_errors(&format!("fetch/{series}"), attempted_any, errors))
    }

    /// Grid step of a configured series.
    pub(crate) fn step(sc: &SeriesConfig) -> TimeDelta {
        TimeDelta::minutes(i64::from(sc.interval_minutes))
    }
}
