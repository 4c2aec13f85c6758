//! Quota-aware connector wrapper.
//!
//! Only fetch calls consume budget. Health probes pass straight through so an
//! exhausted budget never reports the upstream as down.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gridtrack_core::connector::{FetchProvider, GridConnector, HealthProvider};
use gridtrack_core::{FetchWindow, GridError, Middleware, RawSample, SeriesId};
use gridtrack_types::{QuotaConfig, QuotaConsumptionStrategy, QuotaState};

const SLICES_PER_WINDOW: u32 = 24;

/// Wrapper that rejects fetch calls beyond a per-window budget.
pub struct QuotaAwareConnector {
    inner: Arc<dyn GridConnector>,
    config: QuotaConfig,
    runtime: Mutex<QuotaRuntime>,
}

struct QuotaRuntime {
    used_in_window: u64,
    window_start: Instant,
    used_in_slice: u64,
    slice_start: Instant,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// Advance `start` by whole periods so boundaries stay regular across idle stretches.
fn realign(start: &mut Instant, period: Duration, now: Instant) -> bool {
    let elapsed = now.duration_since(*start);
    if period.is_zero() || elapsed < period {
        return false;
    }
    let periods = elapsed.as_nanos() / period.as_nanos();
    let offset = u64::try_from(periods * period.as_nanos()).unwrap_or(u64::MAX);
    *start += Duration::from_nanos(offset);
    true
}

impl QuotaAwareConnector {
    /// Wrap `inner` with the given budget.
    pub fn new(inner: Arc<dyn GridConnector>, config: QuotaConfig) -> Self {
        let now = Instant::now();
        Self {
            inner,
            config,
            runtime: Mutex::new(QuotaRuntime {
                used_in_window: 0,
                window_start: now,
                used_in_slice: 0,
                slice_start: now,
            }),
        }
    }

    /// Access the inner connector.
    pub fn inner(&self) -> &Arc<dyn GridConnector> {
        &self.inner
    }

    fn slice_budget(&self) -> (u64, Duration) {
        let per_slice = (self.config.limit / u64::from(SLICES_PER_WINDOW)).max(1);
        let slice = (self.config.window / SLICES_PER_WINDOW).max(Duration::from_millis(1));
        (per_slice, slice)
    }

    /// Consume one unit, or explain why the call must wait.
    ///
    /// # Errors
    /// Returns [`GridError::QuotaExceeded`] when the window budget (or, for
    /// `EvenSpreadHourly`, the current slice's share) is exhausted. A slice
    /// block reports the remaining window units and the time to the next
    /// slice boundary.
    pub fn should_allow_call(&self) -> Result<(), GridError> {
        let now = Instant::now();
        let spread = matches!(
            self.config.strategy,
            QuotaConsumptionStrategy::EvenSpreadHourly
        );
        let (per_slice, slice) = self.slice_budget();
        let mut rt = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);

        if realign(&mut rt.window_start, self.config.window, now) {
            rt.used_in_window = 0;
        }
        if spread && realign(&mut rt.slice_start, slice, now) {
            rt.used_in_slice = 0;
        }

        let remaining = self.config.limit.saturating_sub(rt.used_in_window);
        if remaining == 0 {
            let reset_in = self
                .config
                .window
                .saturating_sub(now.duration_since(rt.window_start));
            return Err(GridError::QuotaExceeded {
                remaining: 0,
                reset_in_ms: millis(reset_in),
            });
        }
        if spread && rt.used_in_slice >= per_slice {
            let reset_in = slice.saturating_sub(now.duration_since(rt.slice_start));
            return Err(GridError::QuotaExceeded {
                remaining,
                reset_in_ms: millis(reset_in),
            });
        }

        rt.used_in_window += 1;
        if spread {
            rt.used_in_slice += 1;
        }
        Ok(())
    }

    /// Snapshot of the window budget.
    pub fn state(&self) -> QuotaState {
        let now = Instant::now();
        let rt = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        let elapsed = now.duration_since(rt.window_start);
        if elapsed >= self.config.window {
            return QuotaState {
                limit: self.config.limit,
                remaining: self.config.limit,
                reset_in: self.config.window,
            };
        }
        QuotaState {
            limit: self.config.limit,
            remaining: self.config.limit.saturating_sub(rt.used_in_window),
            reset_in: self.config.window.saturating_sub(elapsed),
        }
    }
}

impl GridConnector for QuotaAwareConnector {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    fn supports_series(&self, series: SeriesId) -> bool {
        self.inner.supports_series(series)
    }

    fn as_fetch_provider(&self) -> Option<&dyn FetchProvider> {
        self.inner.as_fetch_provider().map(|_| self as &dyn FetchProvider)
    }

    fn as_health_provider(&self) -> Option<&dyn HealthProvider> {
        self.inner.as_health_provider()
    }
}

#[async_trait]
impl FetchProvider for QuotaAwareConnector {
    async fn fetch(
        &self,
        series: SeriesId,
        window: FetchWindow,
    ) -> Result<Vec<RawSample>, GridError> {
        let inner = self
            .inner
            .as_fetch_provider()
            .ok_or_else(|| GridError::unsupported(format!("fetch/{series}")))?;
        if let Err(e) = self.should_allow_call() {
            #[cfg(feature = "tracing")]
            tracing::debug!(connector = self.inner.name(), %series, error = %e, "quota blocked fetch");
            return Err(e);
        }
        inner.fetch(series, window).await
    }
}

/// Middleware config for constructing a [`QuotaAwareConnector`].
pub struct QuotaMiddleware {
    /// Budget applied to the wrapped connector.
    pub config: QuotaConfig,
}

impl QuotaMiddleware {
    /// Middleware applying `config`.
    #[must_use]
    pub const fn new(config: QuotaConfig) -> Self {
        Self { config }
    }
}

impl Middleware for QuotaMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn GridConnector>) -> Arc<dyn GridConnector> {
        Arc::new(QuotaAwareConnector::new(inner, self.config))
    }

    fn name(&self) -> &'static str {
        "QuotaAwareConnector"
    }

    fn config_json(&self) -> serde_json::Value {
        let strategy = match self.config.strategy {
            QuotaConsumptionStrategy::EvenSpreadHourly => "EvenSpreadHourly",
            _ => "Unit",
        };
        serde_json::json!({
            "limit": self.config.limit,
            "window_ms": millis(self.config.window),
            "strategy": strategy,
        })
    }
}
