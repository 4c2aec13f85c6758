//! Deterministic synthetic values keyed by instant.

use chrono::{DateTime, Timelike, Utc};
use gridtrack_core::{FuelType, GenerationMix, SampleValue, SeriesId, settlement_period};

fn half_hour_of_day(instant: DateTime<Utc>) -> u32 {
    instant.hour() * 2 + instant.minute() / 30
}

/// Carbon intensity with a daily shape: lowest overnight, peaking early evening.
#[must_use]
pub fn intensity_at(instant: DateTime<Utc>) -> f64 {
    let slot = f64::from(half_hour_of_day(instant));
    let shape = if slot <= 36.0 { slot } else { 72.0 - slot };
    120.0 + shape * 2.5
}

/// Generation mix with a fixed baseload and a solar bump around midday.
#[must_use]
pub fn generation_at(instant: DateTime<Utc>) -> GenerationMix {
    let slot = f64::from(half_hour_of_day(instant));
    let solar = (12.0 - (slot - 24.0).abs()).max(0.0) * 350.0;
    let mut mix = GenerationMix {
        settlement_period: settlement_period(instant),
        ..GenerationMix::default()
    };
    for (fuel, mw) in [
        (FuelType::Biomass, 1_800.0),
        (FuelType::FossilGas, 9_000.0 - solar / 2.0),
        (FuelType::FossilHardCoal, 0.0),
        (FuelType::Nuclear, 4_200.0),
        (FuelType::Solar, solar),
        (FuelType::WindOffshore, 6_500.0 + slot * 10.0),
        (FuelType::WindOnshore, 2_100.0),
    ] {
        mix.set(fuel, Some(mw));
    }
    mix
}

/// Fixture payload for `series` at `instant`.
#[must_use]
pub fn value_at(series: SeriesId, instant: DateTime<Utc>) -> SampleValue {
    match series {
        SeriesId::CarbonIntensity => SampleValue::intensity(intensity_at(instant)),
        SeriesId::Generation => SampleValue::Generation(generation_at(instant)),
    }
}
