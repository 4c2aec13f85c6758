use std::sync::Arc;
use std::time::Duration;

use gridtrack::{
    Collector, ConnectorBuilder, FetchWindow, GridConnector, GridError, MemoryStore, SeriesId,
};
use gridtrack_mock::{DynamicMockConnector, MockBehavior};

use crate::helpers::*;

fn window() -> FetchWindow {
    FetchWindow::new(now() - slots(2), now()).unwrap()
}

fn two_providers() -> (
    Collector,
    gridtrack_mock::DynamicMockController,
    gridtrack_mock::DynamicMockController,
) {
    let (a, ctrl_a) = DynamicMockConnector::new_with_controller("a");
    let (b, ctrl_b) = DynamicMockConnector::new_with_controller("b");
    let c = collector_with(
        vec![a, b],
        Arc::new(MemoryStore::new()),
        config(vec![quiet(CI)]),
    );
    (c, ctrl_a, ctrl_b)
}

#[tokio::test]
async fn first_success_wins_in_registration_order() {
    let (c, ctrl_a, ctrl_b) = two_providers();
    ctrl_a.seed([ci_actual(now() - slots(1), 1.0)]).await;
    ctrl_b.seed([ci_actual(now() - slots(1), 2.0)]).await;

    let records = c.fetch(CI, window()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value.as_intensity(), Some(1.0));
    assert_eq!(ctrl_b.call_count(CI).await, 0);
}

#[tokio::test]
async fn empty_answer_is_a_success() {
    let (c, ctrl_a, ctrl_b) = two_providers();
    ctrl_b.seed([ci_actual(now() - slots(1), 2.0)]).await;

    assert!(c.fetch(CI, window()).await.unwrap().is_empty());
    assert_eq!(ctrl_a.call_count(CI).await, 1);
    assert_eq!(ctrl_b.call_count(CI).await, 0);
}

#[tokio::test]
async fn failing_provider_falls_back_to_the_next() {
    let (c, ctrl_a, ctrl_b) = two_providers();
    ctrl_a
        .set_behavior(CI, MockBehavior::Fail(GridError::Other("500".into())))
        .await;
    ctrl_b.seed([ci_actual(now() - slots(1), 2.0)]).await;

    let records = c.fetch(CI, window()).await.unwrap();
    assert_eq!(records[0].value.as_intensity(), Some(2.0));
}

#[tokio::test]
async fn all_failures_are_collected_and_attributed() {
    let (c, ctrl_a, ctrl_b) = two_providers();
    ctrl_a
        .set_behavior(CI, MockBehavior::Fail(GridError::Other("500".into())))
        .await;
    ctrl_b
        .set_behavior(CI, MockBehavior::Fail(GridError::remote_fetch("upstream-b", "503")))
        .await;

    let err = c.fetch(CI, window()).await.unwrap_err();
    let GridError::AllProvidersFailed(errors) = err else {
        panic!("unexpected: {err:?}");
    };
    let names: Vec<_> = errors
        .iter()
        .map(|e| match e {
            GridError::RemoteFetch { connector, .. } => connector.as_str(),
            other => panic!("unexpected: {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["a", "upstream-b"]);
}

#[tokio::test(start_paused = true)]
async fn hung_provider_times_out_and_falls_back() {
    let (c, ctrl_a, ctrl_b) = two_providers();
    ctrl_a.set_behavior(CI, MockBehavior::Hang).await;
    ctrl_b.seed([ci_actual(now() - slots(1), 2.0)]).await;

    let records = c.fetch(CI, window()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(ctrl_a.call_count(CI).await, 1);
}

#[tokio::test(start_paused = true)]
async fn every_provider_hanging_is_a_request_timeout() {
    let (c, ctrl_a, ctrl_b) = two_providers();
    ctrl_a.set_behavior(CI, MockBehavior::Hang).await;
    ctrl_b.set_behavior(CI, MockBehavior::Hang).await;

    let err = c.fetch(CI, window()).await.unwrap_err();
    assert!(matches!(err, GridError::RequestTimeout { .. }), "{err:?}");
}

struct CarbonOnly;

impl GridConnector for CarbonOnly {
    fn name(&self) -> &'static str {
        "carbon-only"
    }

    fn supports_series(&self, series: SeriesId) -> bool {
        series == SeriesId::CarbonIntensity
    }
}

#[tokio::test]
async fn series_without_a_connector_is_unsupported() {
    let c = collector_with(
        vec![Arc::new(CarbonOnly)],
        Arc::new(MemoryStore::new()),
        config(vec![quiet(GEN)]),
    );
    let err = c.fetch(GEN, window()).await.unwrap_err();
    assert!(matches!(err, GridError::Unsupported { .. }), "{err:?}");
    // Supported but without a fetch capability counts as not attempted too.
    let err = c.fetch(CI, window()).await.unwrap_err();
    assert!(matches!(err, GridError::Unsupported { .. }), "{err:?}");
}

#[tokio::test]
async fn quota_exhausted_provider_falls_back() {
    let (a, ctrl_a) = DynamicMockConnector::new_with_controller("a");
    let (b, ctrl_b) = DynamicMockConnector::new_with_controller("b");
    let a = ConnectorBuilder::new(a)
        .quota_limit(1)
        .quota_window(Duration::from_secs(3600))
        .build();
    let c = collector_with(vec![a, b], Arc::new(MemoryStore::new()), config(vec![quiet(CI)]));
    ctrl_a.seed([ci_actual(now() - slots(1), 1.0)]).await;
    ctrl_b.seed([ci_actual(now() - slots(1), 2.0)]).await;

    let first = c.fetch(CI, window()).await.unwrap();
    let second = c.fetch(CI, window()).await.unwrap();
    assert_eq!(first[0].value.as_intensity(), Some(1.0));
    assert_eq!(second[0].value.as_intensity(), Some(2.0));
    assert_eq!(ctrl_a.call_count(CI).await, 1);
}
