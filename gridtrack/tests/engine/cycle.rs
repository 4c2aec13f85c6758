use std::sync::Arc;

use gridtrack::{
    BackfillConfig, GridError, MemoryStore, Provenance, RawSample, SampleStore, SampleValue,
    SeriesConfig,
};
use gridtrack_mock::{MockBehavior, MockConnector};

use crate::helpers::*;

fn day_of_backfill(series: gridtrack::SeriesId) -> SeriesConfig {
    SeriesConfig {
        backfill: BackfillConfig {
            target_oldest_days: 1,
            hours_per_call: 12,
            max_calls_per_cycle: 2,
        },
        interpolate: true,
        ..quiet(series)
    }
}

#[tokio::test]
async fn cycle_fills_an_empty_store() {
    let store = Arc::new(MemoryStore::new());
    let c = collector_with(
        vec![Arc::new(MockConnector::new())],
        store.clone(),
        config(vec![day_of_backfill(CI), day_of_backfill(GEN)]),
    );

    let report = c.run_cycle(now()).await;
    assert_eq!(report.series.len(), 2);
    for series in [CI, GEN] {
        let r = report.get(series).unwrap();
        assert!(r.all_warnings().is_empty(), "{series}: {:?}", r.all_warnings());
        // Six hours of latest data, then eighteen hours of backfill.
        assert_eq!(r.latest.inserted, 12);
        assert_eq!(r.backfill.as_ref().unwrap().inserted, 36);
        assert_eq!(r.filled(), 48);
        assert_eq!(store.len(series).await, 48);
        assert!(c.detect(series, step(), None, None).await.unwrap().is_empty());
    }
    assert_eq!(report.total_filled(), 96);
}

#[tokio::test]
async fn second_cycle_converges_without_new_calls() {
    let (c, _store, ctrl) = dynamic_collector(config(vec![day_of_backfill(CI)]));
    ctrl.seed((1..=48).map(|i| ci_actual(now() - slots(i), 100.0))).await;

    let first = c.run_cycle(now()).await;
    assert_eq!(first.total_filled(), 48);

    ctrl.clear_calls().await;
    let second = c.run_cycle(now()).await;
    assert_eq!(second.total_filled(), 0);
    assert_eq!(ctrl.call_count(CI).await, 0);
}

#[tokio::test]
async fn malformed_record_is_rejected_alone() {
    let (c, store, ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    ctrl.seed((1..=12).map(|i| ci_actual(now() - slots(i), 100.0))).await;
    ctrl.seed_raw([RawSample::new(
        "yesterday-ish",
        SampleValue::intensity(1.0),
        Provenance::Actual,
    )])
    .await;

    let report = c.run_cycle(now()).await;
    let r = report.get(CI).unwrap();
    assert_eq!(r.latest.inserted, 12);
    assert!(matches!(
        r.latest.warnings.as_slice(),
        [GridError::MalformedTimestamp { .. }]
    ));
    assert!(r.errors.is_empty());
    assert_eq!(store.len(CI).await, 12);
}

#[tokio::test]
async fn off_grid_and_foreign_records_are_rejected() {
    let (c, store, ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    let t = now() - slots(2);
    ctrl.push_behavior(
        CI,
        MockBehavior::Return(vec![
            RawSample::new(
                gridtrack_core::timestamp::format(t),
                SampleValue::intensity(1.0),
                Provenance::Actual,
            ),
            RawSample::new(
                gridtrack_core::timestamp::format(t + chrono::TimeDelta::minutes(10)),
                SampleValue::intensity(2.0),
                Provenance::Actual,
            ),
            RawSample::new(
                gridtrack_core::timestamp::format(t),
                SampleValue::Generation(gridtrack::GenerationMix::default()),
                Provenance::Actual,
            ),
        ]),
    )
    .await;

    let out = c.collect_latest(CI, now()).await.unwrap();
    assert_eq!(out.inserted, 1);
    assert_eq!(out.warnings.len(), 2);
    assert!(out.warnings.iter().all(|w| matches!(w, GridError::Data(_))));
    assert_eq!(store.len(CI).await, 1);
    assert!(store.is_empty(GEN).await);
}

#[tokio::test]
async fn store_write_failure_does_not_block_siblings() {
    let hole = now() - slots(4);
    let store = Arc::new(FailingStore::failing_at([hole]));
    let c = collector_with(
        vec![Arc::new(MockConnector::new())],
        store.clone(),
        config(vec![quiet(CI)]),
    );

    let report = c.run_cycle(now()).await;
    let r = report.get(CI).unwrap();
    assert_eq!(r.latest.inserted, 11);
    assert!(matches!(
        r.latest.warnings.as_slice(),
        [GridError::StoreWrite { .. }]
    ));
    assert_eq!(
        c.detect(CI, step(), None, None).await.unwrap(),
        vec![gridtrack::Gap::single(hole)]
    );
    assert_eq!(store.inner.len(CI).await, 11);
}

#[tokio::test]
async fn failing_upstream_degrades_to_warnings() {
    let (c, store, ctrl) = dynamic_collector(config(vec![day_of_backfill(CI)]));
    ctrl.set_behavior(CI, MockBehavior::Fail(GridError::Other("down".into())))
        .await;

    let report = c.run_cycle(now()).await;
    let r = report.get(CI).unwrap();
    assert!(r.errors.is_empty());
    assert_eq!(r.latest.warnings.len(), 1);
    let backfill = r.backfill.as_ref().unwrap();
    assert_eq!(backfill.failed_windows, 2);
    // Interpolation on an empty series is a no-op, not an error.
    assert_eq!(r.interpolation, Some(gridtrack::InterpolationOutcome::default()));
    assert!(store.is_empty(CI).await);
}

#[tokio::test]
async fn unreachable_store_is_reported_per_step() {
    let c = collector_with(
        vec![Arc::new(MockConnector::new())],
        Arc::new(FailingStore::down()),
        config(vec![day_of_backfill(CI)]),
    );

    let report = c.run_cycle(now()).await;
    let r = report.get(CI).unwrap();
    // Latest, gap fill, backfill and interpolation each fail to read the store.
    assert_eq!(r.errors.len(), 4);
    assert!(r.errors.iter().all(|e| matches!(e, GridError::Store(_))));
    assert_eq!(report.total_filled(), 0);
}

#[tokio::test]
async fn cycle_promotes_and_interpolates() {
    let cfg = SeriesConfig {
        reconcile_forecasts: true,
        interpolate: true,
        ..quiet(CI)
    };
    let (c, store, ctrl) = dynamic_collector(config(vec![cfg]));
    let t = now() - slots(4);
    seed_store(
        &store,
        [
            ci_actual(t, 100.0),
            ci_forecast(t + slots(1), 120.0),
            ci_actual(t + slots(3), 160.0),
        ],
    )
    .await;
    ctrl.seed([ci_actual(t + slots(1), 140.0)]).await;

    let report = c.run_cycle(now()).await;
    let r = report.get(CI).unwrap();
    assert_eq!(r.reconcile.as_ref().unwrap().updated, 1);
    assert_eq!(r.interpolation.as_ref().unwrap().filled, 1);

    let filled = store.get(CI, t + slots(2)).await.unwrap().unwrap();
    // Interpolated from the promoted actual, so not forecast-derived.
    assert_eq!(filled.value.as_intensity(), Some(150.0));
    assert!(!filled.forecast_derived);
}
