use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_core::{CycleReport, HealthReport};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::util::jitter_wait;
use crate::Collector;

/// Last-run bookkeeping owned by the collector loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerState {
    /// When the last full cycle started.
    pub last_collection: Option<DateTime<Utc>>,
    /// When the last health check ran.
    pub last_health_check: Option<DateTime<Utc>>,
    /// Failing ticks in a row; reset by the first healthy tick.
    pub consecutive_failures: u32,
}

fn due(last: Option<DateTime<Utc>>, now: DateTime<Utc>, every: Duration) -> bool {
    let every = TimeDelta::from_std(every).unwrap_or(TimeDelta::MAX);
    last.is_none_or(|t| now - t >= every)
}

impl SchedulerState {
    /// True when no cycle ran yet or the last one is at least `every` old.
    #[must_use]
    pub fn collection_due(&self, now: DateTime<Utc>, every: Duration) -> bool {
        due(self.last_collection, now, every)
    }

    /// True when no health check ran yet or the last one is at least `every` old.
    #[must_use]
    pub fn health_due(&self, now: DateTime<Utc>, every: Duration) -> bool {
        due(self.last_health_check, now, every)
    }
}

/// What one scheduler tick ran.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Full cycle, when one was due.
    pub cycle: Option<CycleReport>,
    /// Health check, when one was due.
    pub health: Option<HealthReport>,
}

impl TickReport {
    /// A tick fails when a cycle step could not run or a health check came back unhealthy.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        let cycle_failed = self
            .cycle
            .as_ref()
            .is_some_and(|c| c.series.iter().any(|s| !s.errors.is_empty()));
        let unhealthy = self.health.as_ref().is_some_and(|h| !h.is_healthy());
        cycle_failed || unhealthy
    }
}

impl Collector {
    /// Run whatever is due at `now`: a full cycle every `collection_interval`
    /// and a health check every `health_check_interval`.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let (run_cycle, run_health) = {
            let state = self.scheduler.lock().await;
            (
                state.collection_due(now, self.cfg.collection_interval),
                state.health_due(now, self.cfg.health_check_interval),
            )
        };

        let cycle = if run_cycle {
            Some(self.run_cycle(now).await)
        } else {
            None
        };
        let health = if run_health {
            let h = self.health().await;
            #[cfg(feature = "tracing")]
            if !h.is_healthy() {
                tracing::warn!(store = h.store, "health check failed");
            }
            Some(h)
        } else {
            None
        };
        let report = TickReport { cycle, health };

        let mut state = self.scheduler.lock().await;
        if run_cycle {
            state.last_collection = Some(now);
        }
        if run_health {
            state.last_health_check = Some(now);
        }
        if report.is_failure() {
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        } else {
            state.consecutive_failures = 0;
        }
        report
    }

    /// Snapshot of the loop's bookkeeping.
    pub async fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.lock().await.clone()
    }

    /// Run the collector loop in the background.
    ///
    /// Ticks every `tick_interval` against the wall clock. After a failing
    /// tick the loop sleeps with jittered exponential backoff before the next
    /// one. Must be called within a Tokio runtime.
    #[must_use = "dropping the handle stops the collector"]
    pub fn spawn(self: Arc<Self>) -> CollectorHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = self.cfg.tick_interval.max(Duration::from_millis(1));
        let backoff = self.cfg.backoff;
        let factor = u64::from(backoff.factor.max(1));
        let max_backoff_ms = backoff.max_backoff_ms.max(backoff.min_backoff_ms);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut backoff_ms = backoff.min_backoff_ms;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }
                let report = self.tick(Utc::now()).await;
                if !report.is_failure() {
                    backoff_ms = backoff.min_backoff_ms;
                    continue;
                }

                let wait = jitter_wait(backoff_ms, backoff.jitter_percent.min(100));
                #[cfg(feature = "tracing")]
                tracing::warn!(wait_ms = wait, "tick failed; backing off");
                backoff_ms = backoff_ms.saturating_mul(factor).min(max_backoff_ms);
                tokio::select! {
                    _ = &mut stop_rx => break,
                    () = tokio::time::sleep(Duration::from_millis(wait)) => {}
                }
            }
            #[cfg(feature = "tracing")]
            tracing::info!("collector loop stopped");
        });

        CollectorHandle {
            inner: Some(join),
            stop_tx: Some(stop_tx),
        }
    }
}

/// Handle to a collector loop started with [`Collector::spawn`].
///
/// Dropping the handle signals the loop and aborts it if still running.
#[derive(Debug)]
pub struct CollectorHandle {
    inner: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl CollectorHandle {
    /// Ask the loop to stop and wait for it. A cycle already in flight finishes first.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.inner.take() {
            let _ = join.await;
        }
    }

    /// True once the loop task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for CollectorHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.inner.take()
            && !join.is_finished()
        {
            join.abort();
        }
    }
}
