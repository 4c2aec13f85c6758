#[cfg(feature = "test-adapters")]
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gridtrack_core::GridError;
use url::Url;

/// JSON-over-HTTP abstraction (so we can inject canned payloads in tests).
#[async_trait]
pub trait JsonTransport: Send + Sync {
    /// Issue a GET against `url` and decode the body as JSON.
    ///
    /// Transport failures come back as `Other`, a 404 as `NotFound`, and an
    /// undecodable body as `Data`. Connectors re-tag them with their own name.
    async fn get_json(&self, url: Url) -> Result<serde_json::Value, GridError>;
}

const USER_AGENT: &str = concat!("gridtrack/", env!("CARGO_PKG_VERSION"));

/// Production transport backed by a shared `reqwest::Client`.
///
/// `reqwest::Client` is `Clone + Send + Sync`, so no external locking is needed.
#[derive(Clone)]
pub struct RealTransport {
    client: reqwest::Client,
}

impl RealTransport {
    /// Build a client with a 30 second request timeout.
    ///
    /// Falls back to reqwest's defaults if the configured client cannot be built.
    #[must_use]
    pub fn new_default() -> Self {
        Self::try_new(Duration::from_secs(30)).unwrap_or_else(|_| Self {
            client: reqwest::Client::new(),
        })
    }

    /// Build a client with the given per-request timeout.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the TLS backend or client configuration fails.
    pub fn try_new(timeout: Duration) -> Result<Self, GridError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GridError::InvalidArg(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonTransport for RealTransport {
    async fn get_json(&self, url: Url) -> Result<serde_json::Value, GridError> {
        let resp = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| GridError::Other(format!("request {url}: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GridError::not_found(url.to_string()));
        }
        if !status.is_success() {
            return Err(GridError::Other(format!("status {status}: {url}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| GridError::Other(format!("reading body of {url}: {e}")))?;
        serde_json::from_str(&body).map_err(|e| GridError::Data(format!("invalid JSON from {url}: {e}")))
    }
}

/* -------- Test-only lightweight transport constructor ------- */

#[cfg(feature = "test-adapters")]
impl dyn JsonTransport {
    /// Build a `JsonTransport` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn JsonTransport>
    where
        F: Send + Sync + 'static + Fn(Url) -> Result<serde_json::Value, GridError>,
    {
        struct FnTransport<F>(F);
        #[async_trait]
        impl<F> JsonTransport for FnTransport<F>
        where
            F: Send + Sync + 'static + Fn(Url) -> Result<serde_json::Value, GridError>,
        {
            async fn get_json(&self, url: Url) -> Result<serde_json::Value, GridError> {
                (self.0)(url)
            }
        }
        Arc::new(FnTransport(f))
    }
}
