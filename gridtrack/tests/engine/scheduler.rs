use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use gridtrack::{BackoffConfig, CollectorConfig, MemoryStore};
use gridtrack_mock::MockConnector;

use crate::helpers::*;

#[tokio::test]
async fn tick_runs_only_what_is_due() {
    let (c, _store, ctrl) = dynamic_collector(CollectorConfig {
        collection_interval: Duration::from_secs(300),
        health_check_interval: Duration::from_secs(60),
        ..config(vec![quiet(CI)])
    });

    let first = c.tick(now()).await;
    assert!(first.cycle.is_some());
    assert!(first.health.is_some());

    let soon = c.tick(now() + TimeDelta::seconds(90)).await;
    assert!(soon.cycle.is_none());
    assert!(soon.health.is_some());

    let later = c.tick(now() + TimeDelta::seconds(300)).await;
    assert!(later.cycle.is_some());

    let state = c.scheduler_state().await;
    assert_eq!(state.last_collection, Some(now() + TimeDelta::seconds(300)));
    assert_eq!(state.consecutive_failures, 0);
    assert!(ctrl.call_count(CI).await >= 1);
}

#[tokio::test]
async fn failing_ticks_are_counted_until_one_succeeds() {
    let (c, _store, ctrl) = dynamic_collector(CollectorConfig {
        health_check_interval: Duration::from_secs(0),
        ..config(vec![quiet(CI)])
    });
    ctrl.set_healthy(false).await;
    assert!(c.tick(now()).await.is_failure());
    assert!(c.tick(now()).await.is_failure());
    assert_eq!(c.scheduler_state().await.consecutive_failures, 2);

    ctrl.set_healthy(true).await;
    assert!(!c.tick(now()).await.is_failure());
    assert_eq!(c.scheduler_state().await.consecutive_failures, 0);
}

#[tokio::test]
async fn spawned_loop_collects_and_stops() {
    let store = Arc::new(MemoryStore::new());
    let c = Arc::new(collector_with(
        vec![Arc::new(MockConnector::new())],
        store.clone(),
        CollectorConfig {
            tick_interval: Duration::from_millis(10),
            backoff: BackoffConfig {
                min_backoff_ms: 10,
                max_backoff_ms: 20,
                factor: 2,
                jitter_percent: 0,
            },
            ..config(vec![quiet(CI)])
        },
    ));

    let handle = Arc::clone(&c).spawn();
    let mut waited = 0;
    while store.is_empty(CI).await && waited < 200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += 1;
    }
    assert!(!store.is_empty(CI).await);
    assert!(c.scheduler_state().await.last_collection.is_some());

    handle.stop().await;
}

#[tokio::test]
async fn dropping_the_handle_ends_the_loop() {
    let c = Arc::new(collector_with(
        vec![Arc::new(MockConnector::new())],
        Arc::new(MemoryStore::new()),
        CollectorConfig {
            tick_interval: Duration::from_millis(10),
            ..config(vec![quiet(CI)])
        },
    ));
    let handle = Arc::clone(&c).spawn();
    assert!(!handle.is_finished());
    drop(handle);

    // The loop held the other reference; once aborted only ours remains.
    let mut waited = 0;
    while Arc::strong_count(&c) > 1 && waited < 200 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        waited += 1;
    }
    assert_eq!(Arc::strong_count(&c), 1);
}
