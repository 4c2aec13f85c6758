use std::sync::Arc;

use gridtrack::{Gap, GridError, MemoryStore};
use gridtrack_mock::MockConnector;

use crate::helpers::*;

fn collector(store: Arc<MemoryStore>) -> gridtrack::Collector {
    collector_with(vec![Arc::new(MockConnector::new())], store, config(vec![quiet(CI)]))
}

#[tokio::test]
async fn single_missing_sample_is_one_gap() {
    let t = now();
    let store = Arc::new(MemoryStore::new());
    seed_store(
        &store,
        [ci_actual(t, 100.0), ci_actual(t + slots(1), 110.0), ci_actual(t + slots(3), 130.0)],
    )
    .await;

    let gaps = collector(store).detect(CI, step(), None, None).await.unwrap();
    assert_eq!(gaps, vec![Gap::single(t + slots(2))]);
}

#[tokio::test]
async fn consecutive_missing_instants_group_into_one_gap() {
    let t = now();
    let store = Arc::new(MemoryStore::new());
    seed_store(&store, [ci_actual(t, 1.0), ci_actual(t + slots(4), 2.0)]).await;

    let gaps = collector(store).detect(CI, step(), None, None).await.unwrap();
    assert_eq!(gaps, vec![Gap::new(t + slots(1), t + slots(3))]);
}

#[tokio::test]
async fn explicit_window_reaches_past_stored_data() {
    let t = now();
    let store = Arc::new(MemoryStore::new());
    seed_store(&store, [ci_actual(t, 1.0), ci_actual(t + slots(1), 2.0)]).await;

    let gaps = collector(store)
        .detect(CI, step(), Some(t - slots(2)), Some(t + slots(2)))
        .await
        .unwrap();
    assert_eq!(
        gaps,
        vec![Gap::new(t - slots(2), t - slots(1)), Gap::single(t + slots(2))]
    );
}

#[tokio::test]
async fn off_grid_start_is_rounded_up() {
    let t = now();
    let store = Arc::new(MemoryStore::new());
    seed_store(&store, [ci_actual(t + slots(1), 1.0)]).await;

    let gaps = collector(store)
        .detect(CI, step(), Some(t + chrono::TimeDelta::minutes(10)), Some(t + slots(2)))
        .await
        .unwrap();
    assert_eq!(gaps, vec![Gap::single(t + slots(2))]);
}

#[tokio::test]
async fn empty_series_without_window_is_reported() {
    let err = collector(Arc::new(MemoryStore::new()))
        .detect(CI, step(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GridError::EmptySeries { series } if series == CI));
    assert!(!err.is_actionable());
}

#[tokio::test]
async fn empty_series_with_window_is_all_gap() {
    let t = now();
    let gaps = collector(Arc::new(MemoryStore::new()))
        .detect(CI, step(), Some(t), Some(t + slots(2)))
        .await
        .unwrap();
    assert_eq!(gaps, vec![Gap::new(t, t + slots(2))]);
}

#[tokio::test]
async fn reversed_window_is_rejected() {
    let t = now();
    let c = collector(Arc::new(MemoryStore::new()));
    for (start, end) in [(t, t), (t + slots(1), t)] {
        let err = c.detect(CI, step(), Some(start), Some(end)).await.unwrap_err();
        assert!(matches!(err, GridError::InvalidWindow { .. }), "{err:?}");
    }
}

#[tokio::test]
async fn complete_series_has_no_gaps() {
    let t = now();
    let store = Arc::new(MemoryStore::new());
    seed_store(&store, (0..10).map(|i| ci_actual(t + slots(i), 1.0))).await;
    let gaps = collector(store).detect(CI, step(), None, None).await.unwrap();
    assert!(gaps.is_empty());
}

#[tokio::test]
async fn legacy_keys_are_reported_as_duplicates() {
    let t = now();
    let store = Arc::new(MemoryStore::new());
    seed_store(&store, [ci_actual(t, 1.0), ci_actual(t + slots(1), 2.0)]).await;
    store
        .insert_raw(ci_actual(t + chrono::TimeDelta::seconds(30), 1.0))
        .await;

    let c = collector(store);
    assert_eq!(c.duplicates(CI).await.unwrap(), vec![t]);
    assert!(c.duplicates(GEN).await.unwrap().is_empty());
}
