use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use gridtrack_core::connector::{FetchProvider, GridConnector, HealthProvider};
use gridtrack_core::{FetchWindow, GridError, RawSample, Sample, SeriesId, timestamp};

/// Instruction for how a fetch call should behave.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(GridError),
    /// Hang indefinitely (simulate a stalled upstream).
    Hang,
}

#[derive(Default)]
struct InternalState {
    // Upstream data served when no behavior overrides the call.
    upstream: HashMap<SeriesId, BTreeMap<DateTime<Utc>, RawSample>>,
    // Records whose timestamp does not parse; returned with every fetch.
    malformed: HashMap<SeriesId, Vec<RawSample>>,
    scripted: HashMap<SeriesId, VecDeque<MockBehavior<Vec<RawSample>>>>,
    fallback: HashMap<SeriesId, MockBehavior<Vec<RawSample>>>,
    calls: Vec<(SeriesId, FetchWindow)>,
    unhealthy: bool,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Publish samples upstream, rendered with the canonical timestamp form.
    pub async fn seed(&self, samples: impl IntoIterator<Item = Sample>) {
        self.seed_raw(samples.into_iter().map(|s| {
            RawSample::new(timestamp::format(s.instant), s.value, s.provenance)
        }))
        .await;
    }

    /// Publish raw records upstream exactly as given.
    ///
    /// Records whose timestamp cannot be parsed are returned by every fetch of
    /// their series, so tests can check they are rejected individually.
    pub async fn seed_raw(&self, records: impl IntoIterator<Item = RawSample>) {
        let mut guard = self.state.lock().await;
        for raw in records {
            let series = raw.value.series();
            match timestamp::parse(&raw.timestamp) {
                Ok(instant) => {
                    guard.upstream.entry(series).or_default().insert(instant, raw);
                }
                Err(_) => guard.malformed.entry(series).or_default().push(raw),
            }
        }
    }

    /// Queue a one-shot behavior for the next fetch of `series`.
    ///
    /// Queued behaviors are consumed in order before the fallback applies.
    pub async fn push_behavior(&self, series: SeriesId, behavior: MockBehavior<Vec<RawSample>>) {
        self.state
            .lock()
            .await
            .scripted
            .entry(series)
            .or_default()
            .push_back(behavior);
    }

    /// Override every unscripted fetch of `series`.
    pub async fn set_behavior(&self, series: SeriesId, behavior: MockBehavior<Vec<RawSample>>) {
        self.state.lock().await.fallback.insert(series, behavior);
    }

    /// Set the result of the health probe.
    pub async fn set_healthy(&self, healthy: bool) {
        self.state.lock().await.unhealthy = !healthy;
    }

    /// Windows requested for `series`, in call order.
    pub async fn calls(&self, series: SeriesId) -> Vec<FetchWindow> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|(s, _)| *s == series)
            .map(|(_, w)| *w)
            .collect()
    }

    /// Total fetch calls for `series`.
    pub async fn call_count(&self, series: SeriesId) -> usize {
        self.calls(series).await.len()
    }

    /// Clear the call log, keeping data and behaviors.
    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Clear all data, behaviors and logs.
    pub async fn clear_all(&self) {
        let mut guard = self.state.lock().await;
        *guard = InternalState::default();
    }
}

/// A connector that defers all behavior to an external controller.
pub struct DynamicMockConnector {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockConnector {
    /// Create a new dynamic mock connector and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn GridConnector>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn GridConnector>, controller)
    }
}

impl GridConnector for DynamicMockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    fn supports_series(&self, _series: SeriesId) -> bool {
        true
    }

    fn as_fetch_provider(&self) -> Option<&dyn FetchProvider> {
        Some(self as &dyn FetchProvider)
    }

    fn as_health_provider(&self) -> Option<&dyn HealthProvider> {
        Some(self as &dyn HealthProvider)
    }
}

#[async_trait]
impl FetchProvider for DynamicMockConnector {
    async fn fetch(
        &self,
        series: SeriesId,
        window: FetchWindow,
    ) -> Result<Vec<RawSample>, GridError> {
        // Resolve the behavior without holding the lock across the hang.
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.calls.push((series, window));
            let scripted = guard.scripted.get_mut(&series).and_then(VecDeque::pop_front);
            match scripted.or_else(|| guard.fallback.get(&series).cloned()) {
                Some(b) => b,
                None => {
                    let mut served: Vec<RawSample> = guard
                        .upstream
                        .get(&series)
                        .filter(|_| window.from < window.to)
                        .map(|m| m.range(window.from..window.to).map(|(_, r)| r.clone()).collect())
                        .unwrap_or_default();
                    served.extend(guard.malformed.get(&series).into_iter().flatten().cloned());
                    MockBehavior::Return(served)
                }
            }
        };

        match behavior {
            MockBehavior::Return(records) => Ok(records),
            MockBehavior::Fail(e) => Err(e),
            MockBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[async_trait]
impl HealthProvider for DynamicMockConnector {
    async fn health(&self) -> bool {
        !self.state.lock().await.unhealthy
    }
}
