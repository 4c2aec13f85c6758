//! Connector capability traits.
//!
//! A connector advertises which series it serves and exposes each capability
//! through an `as_*_provider` accessor, so the engine can route per series
//! without knowing concrete connector types.

use async_trait::async_trait;
use gridtrack_types::{FetchWindow, GridError, RawSample, SeriesId};

/// Remote fetch capability.
#[async_trait]
pub trait FetchProvider: Send + Sync {
    /// Fetch every record of `series` inside the half-open `window`.
    ///
    /// An empty vector is a valid answer ("no data in that window") and is
    /// not an error. Timestamps are returned as the upstream reported them.
    async fn fetch(
        &self,
        series: SeriesId,
        window: FetchWindow,
    ) -> Result<Vec<RawSample>, GridError>;
}

/// Upstream liveness probe.
#[async_trait]
pub trait HealthProvider: Send + Sync {
    /// Whether the upstream currently answers with well-formed data.
    async fn health(&self) -> bool;
}

/// Primary connector interface implemented by every upstream adapter.
pub trait GridConnector: Send + Sync {
    /// A stable identifier used in logs, errors and health reports.
    fn name(&self) -> &'static str;

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Whether this connector claims to serve `series`.
    ///
    /// Default: `false`. Connectors must opt in explicitly.
    fn supports_series(&self, series: SeriesId) -> bool {
        let _ = series;
        false
    }

    /// Advertise fetch capability.
    fn as_fetch_provider(&self) -> Option<&dyn FetchProvider> {
        None
    }

    /// Advertise health capability.
    fn as_health_provider(&self) -> Option<&dyn HealthProvider> {
        None
    }
}
