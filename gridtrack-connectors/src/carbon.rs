use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use gridtrack_core::connector::{FetchProvider, GridConnector, HealthProvider};
use gridtrack_core::{
    FetchWindow, GridError, Provenance, RawSample, SampleValue, SeriesId, chunk_window, timestamp,
};
use serde_json::Value;

use crate::transport::JsonTransport;
use crate::{TransportArc, default_transport, endpoint, retain_in_window, tag_err};

/// Public API root of the National Grid ESO carbon-intensity service.
pub const DEFAULT_BASE_URL: &str = "https://api.carbonintensity.org.uk";

const MAX_SPAN_DAYS: i64 = 14;

/// Connector for the carbon-intensity series.
///
/// Each record's `from` bound is the sample instant. A published `actual`
/// wins; otherwise the `forecast` is returned with forecast provenance.
pub struct CarbonIntensityConnector {
    base: String,
    transport: TransportArc,
}

impl CarbonIntensityConnector {
    /// Stable connector name used in logs and errors.
    pub const NAME: &'static str = "gridtrack-carbon-intensity";

    /// Connector against the public API.
    #[must_use]
    pub fn new_default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Connector against another deployment of the same API.
    ///
    /// The URL is validated on first use.
    #[must_use]
    pub fn with_base_url(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            transport: default_transport(),
        }
    }

    /// For tests/injection (requires the `test-adapters` feature).
    #[cfg(feature = "test-adapters")]
    #[must_use]
    pub fn from_transport(
        base: impl Into<String>,
        transport: std::sync::Arc<dyn JsonTransport>,
    ) -> Self {
        Self {
            base: base.into(),
            transport,
        }
    }

    async fn fetch_chunk(&self, window: FetchWindow) -> Result<Vec<RawSample>, GridError> {
        let from = timestamp::format(window.from);
        let to = timestamp::format(window.to);
        let url = endpoint(&self.base, &["intensity", &from, &to])?;
        let payload = self
            .transport
            .get_json(url)
            .await
            .map_err(|e| tag_err(Self::NAME, e))?;
        parse_payload(&payload).map_err(|e| tag_err(Self::NAME, e))
    }
}

/// Decode `{"data": [{"from", "to", "intensity": {"forecast", "actual"}}]}`.
///
/// Rows lacking a `from` bound or both values are skipped.
fn parse_payload(payload: &Value) -> Result<Vec<RawSample>, GridError> {
    let rows = payload
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| GridError::Data("carbon-intensity payload has no data array".into()))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(from) = row.get("from").and_then(Value::as_str) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(?row, "carbon-intensity row without a from bound");
            continue;
        };
        let intensity = row.get("intensity");
        let actual = intensity.and_then(|i| i.get("actual")).and_then(Value::as_f64);
        let forecast = intensity.and_then(|i| i.get("forecast")).and_then(Value::as_f64);
        let (value, provenance) = match (actual, forecast) {
            (Some(a), _) => (a, Provenance::Actual),
            (None, Some(f)) => (f, Provenance::Forecast),
            (None, None) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(from, "carbon-intensity row without a value");
                continue;
            }
        };
        out.push(RawSample::new(from, SampleValue::intensity(value), provenance));
    }
    Ok(out)
}

impl GridConnector for CarbonIntensityConnector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn vendor(&self) -> &'static str {
        "National Grid ESO"
    }

    fn supports_series(&self, series: SeriesId) -> bool {
        series == SeriesId::CarbonIntensity
    }

    fn as_fetch_provider(&self) -> Option<&dyn FetchProvider> {
        Some(self as &dyn FetchProvider)
    }

    fn as_health_provider(&self) -> Option<&dyn HealthProvider> {
        Some(self as &dyn HealthProvider)
    }
}

#[async_trait]
impl FetchProvider for CarbonIntensityConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "gridtrack_connectors::carbon::fetch",
            skip(self),
            fields(from = %window.from, to = %window.to),
        )
    )]
    async fn fetch(
        &self,
        series: SeriesId,
        window: FetchWindow,
    ) -> Result<Vec<RawSample>, GridError> {
        if !self.supports_series(series) {
            return Err(GridError::unsupported(format!("fetch/{series}")));
        }
        let mut out = Vec::new();
        for chunk in chunk_window(window, TimeDelta::days(MAX_SPAN_DAYS)) {
            out.extend(self.fetch_chunk(chunk).await?);
        }
        retain_in_window(&mut out, window);
        Ok(out)
    }
}

#[async_trait]
impl HealthProvider for CarbonIntensityConnector {
    async fn health(&self) -> bool {
        let now = Utc::now();
        let Ok(window) = FetchWindow::new(now - TimeDelta::minutes(30), now) else {
            return false;
        };
        match self.fetch_chunk(window).await {
            Ok(records) => !records.is_empty(),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "carbon-intensity health check failed");
                false
            }
        }
    }
}
