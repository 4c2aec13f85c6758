use chrono::TimeDelta;
use gridtrack::{FuelType, GenerationMix, GridError, Provenance, Sample, SampleStore, SampleValue};

use crate::helpers::*;

#[tokio::test]
async fn midpoint_of_ten_and_twenty_is_fifteen() {
    let (c, store, _ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    let t = now();
    seed_store(&store, [ci_actual(t, 10.0), ci_actual(t + slots(2), 20.0)]).await;

    let out = c.interpolate(CI, step()).await.unwrap();
    assert_eq!((out.single_gaps, out.filled, out.skipped), (1, 1, 0));

    let mid = store.get(CI, t + slots(1)).await.unwrap().unwrap();
    assert_eq!(mid.value.as_intensity(), Some(15.0));
    assert_eq!(mid.provenance, Provenance::Interpolated);
    assert!(!mid.forecast_derived);
}

#[tokio::test]
async fn rerun_is_a_no_op() {
    let (c, store, _ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    let t = now();
    seed_store(&store, [ci_actual(t, 10.0), ci_actual(t + slots(2), 20.0)]).await;

    c.interpolate(CI, step()).await.unwrap();
    let again = c.interpolate(CI, step()).await.unwrap();
    assert_eq!((again.single_gaps, again.filled), (0, 0));
    assert_eq!(store.len(CI).await, 3);
}

#[tokio::test]
async fn multi_sample_gaps_are_left_for_fetching() {
    let (c, store, _ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    let t = now();
    seed_store(&store, [ci_actual(t, 10.0), ci_actual(t + slots(3), 40.0)]).await;

    let out = c.interpolate(CI, step()).await.unwrap();
    assert_eq!((out.single_gaps, out.filled), (0, 0));
    assert_eq!(store.len(CI).await, 2);
}

#[tokio::test]
async fn forecast_neighbour_marks_result_forecast_derived() {
    let (c, store, _ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    let t = now();
    seed_store(&store, [ci_forecast(t, 100.0), ci_actual(t + slots(2), 200.0)]).await;

    c.interpolate(CI, step()).await.unwrap();
    let mid = store.get(CI, t + slots(1)).await.unwrap().unwrap();
    assert_eq!(mid.provenance, Provenance::Interpolated);
    assert!(mid.forecast_derived);
    assert_eq!(mid.value.as_intensity(), Some(150.0));
}

#[tokio::test]
async fn synthesized_neighbour_blocks_interpolation() {
    let (c, store, _ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    let t = now();
    seed_store(
        &store,
        [
            ci_actual(t, 10.0),
            Sample::interpolated(t + slots(1), SampleValue::intensity(15.0), false),
            ci_actual(t + slots(3), 30.0),
        ],
    )
    .await;

    let out = c.interpolate(CI, step()).await.unwrap();
    assert_eq!((out.single_gaps, out.filled, out.skipped), (1, 0, 1));
    assert!(store.get(CI, t + slots(2)).await.unwrap().is_none());
}

#[tokio::test]
async fn neighbour_stored_under_legacy_key_counts_as_present() {
    let (c, store, _ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    let t = now();
    seed_store(&store, [ci_actual(t, 10.0), ci_actual(t + slots(3), 40.0)]).await;
    store
        .insert_raw(ci_actual(t + slots(1) + TimeDelta::seconds(30), 20.0))
        .await;

    let out = c.interpolate(CI, step()).await.unwrap();
    assert_eq!((out.single_gaps, out.filled, out.skipped), (1, 1, 0));
    assert!(out.warnings.is_empty());
    let mid = store.get(CI, t + slots(2)).await.unwrap().unwrap();
    assert_eq!(mid.value.as_intensity(), Some(30.0));
}

#[tokio::test]
async fn generation_fuels_interpolate_independently() {
    let (c, store, _ctrl) = dynamic_collector(config(vec![quiet(GEN)]));
    let t = dt(2024, 5, 1, 12, 0);
    let before = GenerationMix::default()
        .with(FuelType::Nuclear, 4_000.0)
        .with(FuelType::Solar, 1_000.0);
    let after = GenerationMix::default()
        .with(FuelType::Nuclear, 5_000.0)
        .with(FuelType::WindOnshore, 300.0);
    seed_store(
        &store,
        [
            Sample::actual(t, SampleValue::Generation(before)),
            Sample::actual(t + slots(2), SampleValue::Generation(after)),
        ],
    )
    .await;

    let out = c.interpolate(GEN, step()).await.unwrap();
    assert_eq!(out.filled, 1);
    let mid = store.get(GEN, t + slots(1)).await.unwrap().unwrap();
    let mix = mid.value.as_generation().unwrap();
    assert_eq!(mix.get(FuelType::Nuclear), Some(4_500.0));
    assert_eq!(mix.get(FuelType::Solar), Some(1_000.0));
    assert_eq!(mix.get(FuelType::WindOnshore), Some(300.0));
    assert_eq!(mix.get(FuelType::Biomass), None);
    // 12:30Z is 13:30 in London during BST.
    assert_eq!(mix.settlement_period, Some(28));
}

#[tokio::test]
async fn empty_series_is_reported() {
    let (c, _store, _ctrl) = dynamic_collector(config(vec![quiet(CI)]));
    let err = c.interpolate(CI, step()).await.unwrap_err();
    assert!(matches!(err, GridError::EmptySeries { .. }));
}
