//! Series identifiers and provenance tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// The fixed set of time series tracked by gridtrack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesId {
    /// Grid carbon intensity in gCO2/kWh, one scalar per half hour.
    CarbonIntensity,
    /// Generation output broken down by fuel type.
    Generation,
}

impl SeriesId {
    /// Every series, in a stable order.
    pub const ALL: [Self; 2] = [Self::CarbonIntensity, Self::Generation];

    /// Stable kebab-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CarbonIntensity => "carbon-intensity",
            Self::Generation => "generation",
        }
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesId {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "carbon-intensity" | "carbon" => Ok(Self::CarbonIntensity),
            "generation" | "generation-by-fuel" => Ok(Self::Generation),
            other => Err(GridError::InvalidArg(format!("unknown series '{other}'"))),
        }
    }
}

/// Trust tier of a stored sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Authoritative measured value.
    Actual,
    /// Provisional value published ahead of the actual.
    Forecast,
    /// Synthesized locally; never fetched.
    Interpolated,
}

impl Provenance {
    /// Every provenance tier, strongest first.
    pub const ALL: [Self; 3] = [Self::Actual, Self::Forecast, Self::Interpolated];

    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Actual => "actual",
            Self::Forecast => "forecast",
            Self::Interpolated => "interpolated",
        }
    }

    /// Whether an incoming write with this provenance may replace a stored
    /// sample carrying `existing`.
    ///
    /// A forecast never overwrites an actual, and synthesized data never
    /// overwrites fetched data. Fetched data always replaces synthesized data.
    #[must_use]
    pub const fn may_replace(self, existing: Self) -> bool {
        !matches!(
            (self, existing),
            (Self::Forecast, Self::Actual)
                | (Self::Interpolated, Self::Actual | Self::Forecast)
        )
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
