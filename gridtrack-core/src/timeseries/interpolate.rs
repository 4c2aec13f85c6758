use chrono::{DateTime, Utc};
use gridtrack_types::{GenerationMix, GridError, Sample, SampleValue};

use super::settlement::settlement_period;

/// Decimal places kept on interpolated carbon-intensity values.
pub const INTENSITY_DECIMALS: i32 = 1;
/// Decimal places kept on interpolated generation values.
pub const GENERATION_DECIMALS: i32 = 3;

/// Position of `at` between `before` and `after`, in `[0, 1]` for interior points.
///
/// Falls back to the midpoint when the neighbours share an instant.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn interpolation_factor(before: DateTime<Utc>, at: DateTime<Utc>, after: DateTime<Utc>) -> f64 {
    let span = (after - before).num_seconds();
    if span == 0 {
        return 0.5;
    }
    (at - before).num_seconds() as f64 / span as f64
}

/// Linear interpolation between `a` and `b`.
#[must_use]
pub fn lerp(a: f64, b: f64, factor: f64) -> f64 {
    (b - a).mul_add(factor, a)
}

/// Round `value` to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn blend(a: Option<f64>, b: Option<f64>, factor: f64, decimals: i32) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(round_to(lerp(a, b, factor), decimals)),
        (present, None) | (None, present) => present,
    }
}

/// Interpolate every numeric field of two same-series payloads.
///
/// Fields present on only one side propagate from that side; fields absent on
/// both stay absent. The settlement period is taken from `before`.
///
/// # Errors
/// Returns [`GridError::Data`] when the payloads belong to different series.
pub fn interpolate_value(
    before: &SampleValue,
    after: &SampleValue,
    factor: f64,
) -> Result<SampleValue, GridError> {
    match (before, after) {
        (SampleValue::CarbonIntensity { intensity: a }, SampleValue::CarbonIntensity { intensity: b }) => {
            Ok(SampleValue::intensity(round_to(lerp(*a, *b, factor), INTENSITY_DECIMALS)))
        }
        (SampleValue::Generation(a), SampleValue::Generation(b)) => {
            let mut mix = GenerationMix {
                settlement_period: a.settlement_period,
                ..GenerationMix::default()
            };
            for (fuel, va) in a.iter() {
                mix.set(fuel, blend(va, b.get(fuel), factor, GENERATION_DECIMALS));
            }
            Ok(SampleValue::Generation(mix))
        }
        _ => Err(GridError::Data(format!(
            "cannot interpolate between {} and {} values",
            before.series(),
            after.series()
        ))),
    }
}

/// Synthesize the sample at `at` from its two neighbours.
///
/// The result is always `Interpolated`; it is flagged `forecast_derived` when
/// either neighbour rests on forecast data. Generation samples get the
/// settlement period of `at` itself.
///
/// # Errors
/// Returns [`GridError::Data`] when the neighbours belong to different series.
pub fn interpolate_sample(
    before: &Sample,
    after: &Sample,
    at: DateTime<Utc>,
) -> Result<Sample, GridError> {
    let factor = interpolation_factor(before.instant, at, after.instant);
    let mut value = interpolate_value(&before.value, &after.value, factor)?;
    if let SampleValue::Generation(mix) = &mut value {
        mix.settlement_period = settlement_period(at).or(mix.settlement_period);
    }
    let forecast_derived = before.is_forecast_tainted() || after.is_forecast_tainted();
    Ok(Sample::interpolated(at, value, forecast_derived))
}
