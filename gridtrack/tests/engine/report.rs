use std::sync::Arc;

use gridtrack::{Gap, Sample, SampleValue};
use gridtrack_mock::MockConnector;

use crate::helpers::*;

#[tokio::test]
async fn report_summarizes_stored_state() {
    let (c, store, _ctrl) = dynamic_collector(config(vec![quiet(CI), quiet(GEN)]));
    let t = now() - slots(10);
    seed_store(
        &store,
        [
            ci_actual(t, 1.0),
            ci_forecast(t + slots(1), 2.0),
            Sample::interpolated(t + slots(2), SampleValue::intensity(3.0), true),
            ci_actual(t + slots(5), 4.0),
        ],
    )
    .await;
    store
        .insert_raw(ci_actual(t + chrono::TimeDelta::seconds(30), 1.0))
        .await;

    let report = c.report().await;
    assert_eq!(report.series.len(), 2);

    let ci = report.get(CI).unwrap();
    assert_eq!(ci.earliest, Some(t));
    assert_eq!(ci.latest, Some(t + slots(5)));
    assert_eq!(ci.gaps, vec![Gap::new(t + slots(3), t + slots(4))]);
    assert_eq!(ci.missing_samples, 2);
    assert_eq!(ci.duplicates, vec![t]);
    assert_eq!(
        (ci.provenance.actual, ci.provenance.forecast, ci.provenance.interpolated),
        (3, 1, 1)
    );
    assert_eq!(ci.filled_last_cycle, 0);
    assert!(ci.warnings.is_empty());

    let generation = report.get(GEN).unwrap();
    assert_eq!(generation.earliest, None);
    assert!(generation.gaps.is_empty());
    assert_eq!(generation.provenance.total(), 0);
}

#[tokio::test]
async fn report_remembers_what_the_last_cycle_filled() {
    let (c, _store, ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    ctrl.seed((1..=12).map(|i| ci_actual(now() - slots(i), 1.0))).await;

    c.run_cycle(now()).await;
    assert_eq!(c.report().await.get(CI).unwrap().filled_last_cycle, 12);

    c.run_cycle(now()).await;
    assert_eq!(c.report().await.get(CI).unwrap().filled_last_cycle, 0);
}

#[tokio::test]
async fn unreachable_store_surfaces_as_report_warning() {
    let c = collector_with(
        vec![Arc::new(MockConnector::new())],
        Arc::new(FailingStore::down()),
        config(vec![quiet(CI)]),
    );
    let report = c.report().await;
    let ci = report.get(CI).unwrap();
    assert_eq!(ci.warnings.len(), 1);
    assert_eq!(ci.earliest, None);
}

#[tokio::test]
async fn health_covers_store_and_connectors() {
    let (c, _store, ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    let h = c.health().await;
    assert!(h.store);
    assert_eq!(h.connectors, vec![("dyn".to_string(), true)]);
    assert!(h.is_healthy());

    ctrl.set_healthy(false).await;
    assert!(!c.health().await.is_healthy());

    let down = collector_with(
        vec![Arc::new(MockConnector::new())],
        Arc::new(FailingStore::down()),
        config(vec![quiet(CI)]),
    );
    let h = down.health().await;
    assert!(!h.store);
    assert_eq!(h.connectors, vec![("gridtrack-mock".to_string(), true)]);
}
