use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use gridtrack_core::connector::{FetchProvider, GridConnector, HealthProvider};
use gridtrack_core::{
    FetchWindow, FuelType, GenerationMix, GridError, Provenance, RawSample, SampleValue, SeriesId,
    chunk_window, settlement_period, timestamp,
};
use serde_json::Value;

use crate::transport::JsonTransport;
use crate::{TransportArc, default_transport, endpoint, retain_in_window, tag_err};

/// Public API root of the Elexon BMRS service.
pub const DEFAULT_BASE_URL: &str = "https://data.elexon.co.uk/bmrs/api/v1";

const MAX_SPAN_DAYS: i64 = 7;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Connector for the generation-by-fuel series.
///
/// The upstream filters by settlement date only, so each call over-fetches
/// whole days and the connector trims the result to the requested window.
/// Generation outturn is always reported with actual provenance.
pub struct ElexonConnector {
    base: String,
    transport: TransportArc,
}

impl ElexonConnector {
    /// Stable connector name used in logs and errors.
    pub const NAME: &'static str = "gridtrack-elexon";

    /// Connector against the public API.
    #[must_use]
    pub fn new_default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Connector against another deployment of the same API.
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

    async fn get_per_type(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Value, GridError> {
        let mut url = endpoint(&self.base, &["generation", "actual", "per-type"])?;
        url.query_pairs_mut()
            .append_pair("from", &from.format(DATE_FORMAT).to_string())
            .append_pair("to", &to.format(DATE_FORMAT).to_string())
            .append_pair("format", "json");
        self.transport
            .get_json(url)
            .await
            .map_err(|e| tag_err(Self::NAME, e))
    }
}

/// Map a BMRS `psrType` label onto a fuel field.
fn fuel_for_psr(psr: &str) -> Option<FuelType> {
    Some(match psr {
        "Biomass" => FuelType::Biomass,
        "Fossil Gas" => FuelType::FossilGas,
        "Fossil Hard coal" => FuelType::FossilHardCoal,
        "Fossil Oil" => FuelType::FossilOil,
        "Hydro Pumped Storage" => FuelType::HydroPumpedStorage,
        "Hydro Run-of-river and poundage" => FuelType::HydroRunOfRiver,
        "Nuclear" => FuelType::Nuclear,
        "Other" => FuelType::Other,
        "Solar" => FuelType::Solar,
        "Wind Offshore" => FuelType::WindOffshore,
        "Wind Onshore" => FuelType::WindOnshore,
        _ => return None,
    })
}

/// Decode `{"data": [{"startTime", "settlementPeriod", "data": [{"psrType", "quantity"}]}]}`.
fn parse_payload(payload: &Value) -> Result<Vec<RawSample>, GridError> {
    let entries = payload
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| GridError::Data("generation payload has no data array".into()))?;

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(start) = entry.get("startTime").and_then(Value::as_str) else {
            continue;
        };
        let Some(per_type) = entry.get("data").and_then(Value::as_array).filter(|d| !d.is_empty())
        else {
            #[cfg(feature = "tracing")]
            tracing::debug!(start, "generation entry without per-type rows");
            continue;
        };

        let mut mix = GenerationMix {
            settlement_period: entry
                .get("settlementPeriod")
                .and_then(Value::as_u64)
                .and_then(|p| u8::try_from(p).ok()),
            ..GenerationMix::default()
        };
        if mix.settlement_period.is_none() {
            mix.settlement_period = timestamp::parse(start).ok().and_then(settlement_period);
        }
        for row in per_type {
            let psr = row.get("psrType").and_then(Value::as_str).unwrap_or_default();
            match fuel_for_psr(psr) {
                Some(fuel) => mix.set(fuel, row.get("quantity").and_then(Value::as_f64)),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(psr, "ignoring unknown psrType");
                }
            }
        }
        out.push(RawSample::new(
            start,
            SampleValue::Generation(mix),
            Provenance::Actual,
        ));
    }
    Ok(out)
}

impl GridConnector for ElexonConnector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn vendor(&self) -> &'static str {
        "Elexon"
    }

    fn supports_series(&self, series: SeriesId) -> bool {
        series == SeriesId::Generation
    }

    fn as_fetch_provider(&self) -> Option<&dyn FetchProvider> {
        Some(self as &dyn FetchProvider)
    }

    fn as_health_provider(&self) -> Option<&dyn HealthProvider> {
        Some(self as &dyn HealthProvider)
    }
}

#[async_trait]
impl FetchProvider for ElexonConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "gridtrack_connectors::elexon::fetch",
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
            let payload = self.get_per_type(chunk.from, chunk.to).await?;
            out.extend(parse_payload(&payload).map_err(|e| tag_err(Self::NAME, e))?);
        }
        retain_in_window(&mut out, window);
        Ok(out)
    }
}

#[async_trait]
impl HealthProvider for ElexonConnector {
    async fn health(&self) -> bool {
        let now = Utc::now();
        match self.get_per_type(now - TimeDelta::days(1), now).await {
            Ok(payload) => payload.get("data").is_some() && payload.get("metadata").is_some(),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "elexon health check failed");
                false
            }
        }
    }
}
