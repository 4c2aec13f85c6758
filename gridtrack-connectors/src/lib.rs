//! gridtrack-connectors
//!
//! HTTP connectors implementing `GridConnector` for the two GB grid feeds:
//!
//! - [`CarbonIntensityConnector`]: National Grid ESO carbon-intensity API
//!   (`/intensity/{from}/{to}`), actual values with forecast fallback.
//! - [`ElexonConnector`]: Elexon BMRS generation outturn per fuel type
//!   (`/generation/actual/per-type`).
//!
//! Both talk to the network through [`transport::JsonTransport`]. With the
//! `test-adapters` feature the transport is a trait object that tests replace
//! with a closure returning canned JSON.
#![warn(missing_docs)]

/// JSON transport seam and its reqwest-backed implementation.
pub mod transport;

mod carbon;
mod elexon;

use std::sync::Arc;

use gridtrack_core::{FetchWindow, GridError, RawSample, timestamp};
use url::Url;

pub use carbon::CarbonIntensityConnector;
pub use elexon::ElexonConnector;
use transport::RealTransport;
#[cfg(feature = "test-adapters")]
use transport::JsonTransport;

#[cfg(feature = "test-adapters")]
type TransportArc = Arc<dyn JsonTransport>;
#[cfg(not(feature = "test-adapters"))]
type TransportArc = Arc<RealTransport>;

fn default_transport() -> TransportArc {
    Arc::new(RealTransport::new_default())
}

/// Parse `base` and append path `segments` to it.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, GridError> {
    let mut url =
        Url::parse(base).map_err(|e| GridError::InvalidArg(format!("base url {base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| GridError::InvalidArg(format!("base url {base:?} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Attribute a transport error to `connector`.
fn tag_err(connector: &str, e: GridError) -> GridError {
    match e {
        e @ GridError::RemoteFetch { .. } => e,
        other => GridError::remote_fetch(connector, other.to_string()),
    }
}

/// Drop records that parse to an instant outside `window`.
///
/// Unparseable records are kept so the engine can reject them individually.
fn retain_in_window(records: &mut Vec<RawSample>, window: FetchWindow) {
    records.retain(|r| timestamp::parse(&r.timestamp).map_or(true, |t| window.contains(t)));
}
