use std::time::Duration;

use chrono::TimeDelta;
use gridtrack::{
    CollectorConfig, FetchWindow, GapFillConfig, GridError, Provenance, RawSample, SampleStore,
    SampleValue, SeriesConfig,
};
use gridtrack_core::timestamp;
use gridtrack_mock::MockBehavior;

use crate::helpers::*;

fn fresh_within(minutes: u64, series: Vec<SeriesConfig>) -> CollectorConfig {
    CollectorConfig {
        freshness_threshold: Duration::from_secs(minutes * 60),
        ..config(series)
    }
}

#[tokio::test]
async fn empty_series_starts_from_the_initial_lookback() {
    let (c, store, ctrl) = dynamic_collector(fresh_within(60, vec![quiet(CI)]));
    ctrl.seed((1..=24).map(|i| ci_actual(now() - slots(i), 100.0))).await;

    let out = c.collect_latest(CI, now()).await.unwrap();
    let expected = FetchWindow::new(now() - TimeDelta::hours(6), now()).unwrap();
    assert_eq!(out.window, Some(expected));
    assert_eq!(ctrl.calls(CI).await, vec![expected]);
    assert_eq!(out.inserted, 12);
    assert_eq!(store.len(CI).await, 12);
}

#[tokio::test]
async fn fresh_series_is_skipped() {
    let (c, store, ctrl) = dynamic_collector(fresh_within(60, vec![quiet(CI)]));
    seed_store(&store, [ci_actual(now() - slots(1), 100.0)]).await;

    let out = c.collect_latest(CI, now()).await.unwrap();
    assert!(out.skipped_fresh);
    assert_eq!(out.window, None);
    assert_eq!(ctrl.call_count(CI).await, 0);
}

#[tokio::test]
async fn stale_series_fetches_from_its_newest_sample() {
    let (c, store, ctrl) = dynamic_collector(fresh_within(60, vec![quiet(CI)]));
    let newest = now() - TimeDelta::hours(3);
    seed_store(&store, [ci_actual(newest, 100.0)]).await;
    ctrl.seed((0..6).map(|i| ci_actual(newest + slots(i), 120.0))).await;

    let out = c.collect_latest(CI, now()).await.unwrap();
    assert!(!out.skipped_fresh);
    assert_eq!(ctrl.calls(CI).await, vec![FetchWindow::new(newest, now()).unwrap()]);
    assert_eq!(out.inserted, 5);
    assert_eq!(store.len(CI).await, 6);
}

#[tokio::test]
async fn upstream_failure_is_recorded_not_raised() {
    let (c, _store, ctrl) = dynamic_collector(fresh_within(60, vec![quiet(CI)]));
    ctrl.set_behavior(CI, MockBehavior::Fail(GridError::Other("502".into())))
    .await;

    let out = c.collect_latest(CI, now()).await.unwrap();
    assert_eq!(out.inserted, 0);
    assert_eq!(out.warnings.len(), 1);
}

#[tokio::test]
async fn upstream_record_claiming_interpolation_is_rejected() {
    let (c, store, ctrl) = dynamic_collector(fresh_within(60, vec![quiet(CI)]));
    let t = now() - slots(2);
    ctrl.push_behavior(
        CI,
        MockBehavior::Return(vec![
            RawSample::new(timestamp::format(t), SampleValue::intensity(1.0), Provenance::Interpolated),
            RawSample::new(timestamp::format(t + slots(1)), SampleValue::intensity(2.0), Provenance::Actual),
        ]),
    )
    .await;

    let out = c.collect_latest(CI, now()).await.unwrap();
    assert_eq!(out.inserted, 1);
    assert!(matches!(out.warnings.as_slice(), [GridError::Data(_)]));
    assert!(store.get(CI, t).await.unwrap().is_none());
    assert_eq!(
        store.get(CI, t + slots(1)).await.unwrap().map(|s| s.provenance),
        Some(Provenance::Actual)
    );
}

fn gap_filling(max_chunks: usize, max_window_hours: u32) -> SeriesConfig {
    SeriesConfig {
        gap_fill: GapFillConfig {
            scan_days: 7,
            max_chunks,
            max_window_hours,
        },
        ..quiet(CI)
    }
}

#[tokio::test]
async fn only_the_most_recent_ranges_are_filled() {
    let (c, store, ctrl) = dynamic_collector(config(vec![gap_filling(2, 1)]));
    let start = now() - TimeDelta::hours(24);
    let old_hole = start + slots(4);
    let mid_hole: Vec<_> = (10..14).map(|i| start + slots(i)).collect();
    let new_hole = start + slots(30);
    let all: Vec<_> = (0..=40).map(|i| start + slots(i)).collect();
    seed_store(
        &store,
        all.iter()
            .filter(|t| **t != old_hole && **t != new_hole && !mid_hole.contains(t))
            .map(|t| ci_actual(*t, 1.0)),
    )
    .await;
    ctrl.seed(all.iter().map(|t| ci_actual(*t, 2.0))).await;

    let out = c.fill_recent_gaps(CI, now()).await.unwrap();
    assert_eq!(out.ranges_found, 3);
    assert_eq!(out.ranges_attempted, 2);
    assert_eq!(
        ctrl.calls(CI).await,
        vec![
            FetchWindow::new(mid_hole[0], mid_hole[2]).unwrap(),
            FetchWindow::new(mid_hole[2], mid_hole[3] + step()).unwrap(),
            FetchWindow::at(new_hole, step()),
        ]
    );
    assert_eq!((out.calls, out.inserted), (3, 5));

    let remaining = c.detect(CI, step(), None, None).await.unwrap();
    assert_eq!(remaining, vec![gridtrack::Gap::single(old_hole)]);
}

#[tokio::test]
async fn gaps_older_than_the_scan_window_are_ignored() {
    let cfg = SeriesConfig {
        gap_fill: GapFillConfig {
            scan_days: 1,
            max_chunks: 5,
            max_window_hours: 24,
        },
        ..quiet(CI)
    };
    let (c, store, ctrl) = dynamic_collector(config(vec![cfg]));
    let old = now() - TimeDelta::hours(30);
    seed_store(
        &store,
        [
            ci_actual(old - slots(1), 1.0),
            ci_actual(old + slots(1), 1.0),
            ci_actual(now() - slots(3), 1.0),
            ci_actual(now() - slots(1), 1.0),
        ],
    )
    .await;

    let out = c.fill_recent_gaps(CI, now()).await.unwrap();
    // Only the hole at now-60m lies inside the last day; the long outage
    // between now-29h and now-90m starts before it and is clipped.
    let calls = ctrl.calls(CI).await;
    assert!(calls.iter().all(|w| w.from >= now() - TimeDelta::days(1)), "{calls:?}");
    assert!(calls.contains(&FetchWindow::at(now() - slots(2), step())));
    assert!(!calls.iter().any(|w| w.contains(old)));
    assert_eq!(out.ranges_found, 2);
}

#[tokio::test]
async fn empty_series_has_nothing_to_fill() {
    let (c, _store, ctrl) = dynamic_collector(config(vec![gap_filling(5, 24)]));
    let out = c.fill_recent_gaps(CI, now()).await.unwrap();
    assert_eq!(out.ranges_found, 0);
    assert_eq!(ctrl.call_count(CI).await, 0);
}
