//! Sample records and their per-series value shapes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::series::{Provenance, SeriesId};

/// Fuel categories reported by the generation series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    /// Biomass.
    Biomass,
    /// Combined-cycle and open-cycle gas.
    FossilGas,
    /// Coal.
    FossilHardCoal,
    /// Oil.
    FossilOil,
    /// Pumped storage hydro.
    HydroPumpedStorage,
    /// Run-of-river hydro and poundage.
    HydroRunOfRiver,
    /// Nuclear.
    Nuclear,
    /// Anything the upstream files under "Other".
    Other,
    /// Solar.
    Solar,
    /// Offshore wind.
    WindOffshore,
    /// Onshore wind.
    WindOnshore,
}

impl FuelType {
    /// Every fuel, in field order.
    pub const ALL: [Self; 11] = [
        Self::Biomass,
        Self::FossilGas,
        Self::FossilHardCoal,
        Self::FossilOil,
        Self::HydroPumpedStorage,
        Self::HydroRunOfRiver,
        Self::Nuclear,
        Self::Other,
        Self::Solar,
        Self::WindOffshore,
        Self::WindOnshore,
    ];

    /// Stable snake_case column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Biomass => "biomass",
            Self::FossilGas => "fossil_gas",
            Self::FossilHardCoal => "fossil_hard_coal",
            Self::FossilOil => "fossil_oil",
            Self::HydroPumpedStorage => "hydro_pumped_storage",
            Self::HydroRunOfRiver => "hydro_run_of_river",
            Self::Nuclear => "nuclear",
            Self::Other => "other",
            Self::Solar => "solar",
            Self::WindOffshore => "wind_offshore",
            Self::WindOnshore => "wind_onshore",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation output per fuel in MW for one settlement period.
///
/// Every fuel is optional: an absent value means the upstream did not report
/// it, which is distinct from a reported zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationMix {
    /// GB settlement period (1-based half hour of the local day).
    pub settlement_period: Option<u8>,
    /// Biomass output.
    pub biomass: Option<f64>,
    /// Gas output.
    pub fossil_gas: Option<f64>,
    /// Coal output.
    pub fossil_hard_coal: Option<f64>,
    /// Oil output.
    pub fossil_oil: Option<f64>,
    /// Pumped storage output.
    pub hydro_pumped_storage: Option<f64>,
    /// Run-of-river hydro output.
    pub hydro_run_of_river: Option<f64>,
    /// Nuclear output.
    pub nuclear: Option<f64>,
    /// Other output.
    pub other: Option<f64>,
    /// Solar output.
    pub solar: Option<f64>,
    /// Offshore wind output.
    pub wind_offshore: Option<f64>,
    /// Onshore wind output.
    pub wind_onshore: Option<f64>,
}

impl GenerationMix {
    /// Value reported for `fuel`, if any.
    #[must_use]
    pub const fn get(&self, fuel: FuelType) -> Option<f64> {
        match fuel {
            FuelType::Biomass => self.biomass,
            FuelType::FossilGas => self.fossil_gas,
            FuelType::FossilHardCoal => self.fossil_hard_coal,
            FuelType::FossilOil => self.fossil_oil,
            FuelType::HydroPumpedStorage => self.hydro_pumped_storage,
            FuelType::HydroRunOfRiver => self.hydro_run_of_river,
            FuelType::Nuclear => self.nuclear,
            FuelType::Other => self.other,
            FuelType::Solar => self.solar,
            FuelType::WindOffshore => self.wind_offshore,
            FuelType::WindOnshore => self.wind_onshore,
        }
    }

    /// Overwrite the value for `fuel`.
    pub fn set(&mut self, fuel: FuelType, value: Option<f64>) {
        let slot = match fuel {
            FuelType::Biomass => &mut self.biomass,
            FuelType::FossilGas => &mut self.fossil_gas,
            FuelType::FossilHardCoal => &mut self.fossil_hard_coal,
            FuelType::FossilOil => &mut self.fossil_oil,
            FuelType::HydroPumpedStorage => &mut self.hydro_pumped_storage,
            FuelType::HydroRunOfRiver => &mut self.hydro_run_of_river,
            FuelType::Nuclear => &mut self.nuclear,
            FuelType::Other => &mut self.other,
            FuelType::Solar => &mut self.solar,
            FuelType::WindOffshore => &mut self.wind_offshore,
            FuelType::WindOnshore => &mut self.wind_onshore,
        };
        *slot = value;
    }

    /// Builder-style variant of [`GenerationMix::set`].
    #[must_use]
    pub fn with(mut self, fuel: FuelType, value: f64) -> Self {
        self.set(fuel, Some(value));
        self
    }

    /// Iterate over `(fuel, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (FuelType, Option<f64>)> + '_ {
        FuelType::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    /// Sum of every reported fuel, or `None` when nothing was reported.
    #[must_use]
    pub fn total(&self) -> Option<f64> {
        self.iter()
            .filter_map(|(_, v)| v)
            .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
    }
}

/// Value payload of a sample; each arm declares its series' shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "series", rename_all = "kebab-case")]
pub enum SampleValue {
    /// Carbon intensity in gCO2/kWh.
    CarbonIntensity {
        /// Intensity value.
        intensity: f64,
    },
    /// Generation mix.
    Generation(GenerationMix),
}

impl SampleValue {
    /// Convenience constructor for a carbon-intensity value.
    #[must_use]
    pub const fn intensity(intensity: f64) -> Self {
        Self::CarbonIntensity { intensity }
    }

    /// Series this payload belongs to.
    #[must_use]
    pub const fn series(&self) -> SeriesId {
        match self {
            Self::CarbonIntensity { .. } => SeriesId::CarbonIntensity,
            Self::Generation(_) => SeriesId::Generation,
        }
    }

    /// The carbon-intensity scalar, when this is a carbon-intensity payload.
    #[must_use]
    pub const fn as_intensity(&self) -> Option<f64> {
        match self {
            Self::CarbonIntensity { intensity } => Some(*intensity),
            Self::Generation(_) => None,
        }
    }

    /// The generation mix, when this is a generation payload.
    #[must_use]
    pub const fn as_generation(&self) -> Option<&GenerationMix> {
        match self {
            Self::Generation(mix) => Some(mix),
            Self::CarbonIntensity { .. } => None,
        }
    }
}

/// One stored record: at most one per `(series, instant)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Canonical instant (UTC, minute precision, on the series grid).
    pub instant: DateTime<Utc>,
    /// Value payload; its variant determines the series.
    pub value: SampleValue,
    /// Trust tier.
    pub provenance: Provenance,
    /// Set on interpolated samples synthesized from at least one forecast
    /// (or forecast-derived) neighbour.
    pub forecast_derived: bool,
}

impl Sample {
    /// Build a sample with the given provenance.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>, value: SampleValue, provenance: Provenance) -> Self {
        Self {
            instant,
            value,
            provenance,
            forecast_derived: false,
        }
    }

    /// Build an `Actual` sample.
    #[must_use]
    pub const fn actual(instant: DateTime<Utc>, value: SampleValue) -> Self {
        Self::new(instant, value, Provenance::Actual)
    }

    /// Build a `Forecast` sample.
    #[must_use]
    pub const fn forecast(instant: DateTime<Utc>, value: SampleValue) -> Self {
        Self::new(instant, value, Provenance::Forecast)
    }

    /// Build an `Interpolated` sample.
    #[must_use]
    pub const fn interpolated(
        instant: DateTime<Utc>,
        value: SampleValue,
        forecast_derived: bool,
    ) -> Self {
        Self {
            instant,
            value,
            provenance: Provenance::Interpolated,
            forecast_derived,
        }
    }

    /// Series this sample belongs to.
    #[must_use]
    pub const fn series(&self) -> SeriesId {
        self.value.series()
    }

    /// True when the value rests on forecast data, directly or via interpolation.
    #[must_use]
    pub const fn is_forecast_tainted(&self) -> bool {
        matches!(self.provenance, Provenance::Forecast) || self.forecast_derived
    }
}

/// A record as returned by a remote collaborator, before timestamp normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Timestamp exactly as the upstream reported it.
    pub timestamp: String,
    /// Value payload.
    pub value: SampleValue,
    /// Provenance the upstream assigned (actual or forecast).
    pub provenance: Provenance,
}

impl RawSample {
    /// Build a raw record.
    pub fn new(timestamp: impl Into<String>, value: SampleValue, provenance: Provenance) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
            provenance,
        }
    }
}
