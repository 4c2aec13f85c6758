//! Mock gridtrack connectors for tests and demos.
//!
//! - [`MockConnector`] serves deterministic fixture data for any window.
//! - [`DynamicMockConnector`] defers to a [`DynamicMockController`] so tests
//!   can seed upstream data, script failures and hangs, and inspect every
//!   window that was requested.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_core::connector::{FetchProvider, GridConnector, HealthProvider};
use gridtrack_core::timestamp::align_up;
use gridtrack_core::{FetchWindow, GridError, Provenance, RawSample, SeriesId, expected_instants};

mod dynamic;
pub mod fixtures;

pub use dynamic::{DynamicMockConnector, DynamicMockController, MockBehavior};

/// Mock connector serving deterministic fixture data from [`fixtures`].
///
/// Carbon timestamps are rendered as `YYYY-MM-DDTHH:MMZ`, generation
/// timestamps with a seconds field, so both exercise normalization.
pub struct MockConnector {
    step: TimeDelta,
    forecast_from: Option<DateTime<Utc>>,
    holes: BTreeSet<DateTime<Utc>>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Fixture connector on a 30 minute grid with every instant available as actual.
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: TimeDelta::minutes(30),
            forecast_from: None,
            holes: BTreeSet::new(),
        }
    }

    /// Serve carbon-intensity instants at or after `instant` as forecasts.
    #[must_use]
    pub fn with_forecast_from(mut self, instant: DateTime<Utc>) -> Self {
        self.forecast_from = Some(instant);
        self
    }

    /// Never return a record at `instant`, for any series.
    #[must_use]
    pub fn with_hole(mut self, instant: DateTime<Utc>) -> Self {
        self.holes.insert(instant);
        self
    }

    fn provenance(&self, series: SeriesId, instant: DateTime<Utc>) -> Provenance {
        match (series, self.forecast_from) {
            (SeriesId::CarbonIntensity, Some(from)) if instant >= from => Provenance::Forecast,
            _ => Provenance::Actual,
        }
    }

    fn render(series: SeriesId, instant: DateTime<Utc>) -> String {
        match series {
            SeriesId::CarbonIntensity => instant.format("%Y-%m-%dT%H:%MZ").to_string(),
            SeriesId::Generation => instant.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

impl GridConnector for MockConnector {
    fn name(&self) -> &'static str {
        "gridtrack-mock"
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn supports_series(&self, _series: SeriesId) -> bool {
        true
    }

    fn as_fetch_provider(&self) -> Option<&dyn FetchProvider> {
        Some(self as &dyn FetchProvider)
    }

    fn as_health_provider(&self) -> Option<&dyn HealthProvider> {
        Some(self as &dyn HealthProvider)
    }
}

#[async_trait]
impl FetchProvider for MockConnector {
    async fn fetch(
        &self,
        series: SeriesId,
        window: FetchWindow,
    ) -> Result<Vec<RawSample>, GridError> {
        let Some(last) = window.to.checked_sub_signed(TimeDelta::seconds(1)) else {
            return Ok(Vec::new());
        };
        Ok(expected_instants(align_up(window.from, self.step), last, self.step)
            .into_iter()
            .filter(|t| !self.holes.contains(t))
            .map(|t| {
                RawSample::new(
                    Self::render(series, t),
                    fixtures::value_at(series, t),
                    self.provenance(series, t),
                )
            })
            .collect())
    }
}

#[async_trait]
impl HealthProvider for MockConnector {
    async fn health(&self) -> bool {
        true
    }
}
