use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::series::SeriesId;

/// Unified error type for the gridtrack workspace.
///
/// Covers timestamp and window validation, upstream fetch failures, store
/// failures, capability mismatches and an aggregate for multi-provider attempts.
/// None of these are fatal to a reconciliation cycle; the engine collects them
/// as warnings and the next tick retries.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GridError {
    /// A timestamp string could not be parsed into an instant.
    #[error("malformed timestamp {raw:?}: {reason}")]
    MalformedTimestamp {
        /// The rejected input.
        raw: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// A window whose start is not strictly before its end.
    #[error("invalid window: start {start} is not before end {end}")]
    InvalidWindow {
        /// Canonical form of the window start.
        start: String,
        /// Canonical form of the window end.
        end: String,
    },

    /// The series holds no samples and no explicit window was supplied.
    #[error("series {series} has no stored samples")]
    EmptySeries {
        /// Series that was queried.
        series: SeriesId,
    },

    /// The remote collaborator failed to serve a fetch window.
    #[error("{connector} fetch failed: {msg}")]
    RemoteFetch {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A single sample could not be written to the store.
    #[error("store write failed: {msg}")]
    StoreWrite {
        /// Human-readable error message.
        msg: String,
    },

    /// The store could not be read.
    #[error("store read failed: {0}")]
    Store(String),

    /// The requested capability is not implemented by the target connector.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// A capability string describing what was requested (e.g. "fetch/generation").
        capability: String,
    },

    /// Issues with the returned or expected data (missing fields, mismatched shapes).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// A resource could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource.
        what: String,
    },

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),

    /// All selected providers failed; contains the individual failures.
    #[error("all providers failed: {0:?}")]
    AllProvidersFailed(Vec<GridError>),

    /// An individual provider call exceeded the configured timeout.
    #[error("provider timed out: {capability} via {connector}")]
    ProviderTimeout {
        /// Connector name that timed out.
        connector: String,
        /// Capability label (e.g. "fetch", "health").
        capability: String,
    },

    /// The overall request exceeded the configured deadline.
    #[error("request timed out: {capability}")]
    RequestTimeout {
        /// Capability label for which the request timed out.
        capability: String,
    },

    /// The request exceeds the configured quota budget for the current window.
    #[error("quota exceeded: remaining={remaining} reset_in_ms={reset_in_ms}")]
    QuotaExceeded {
        /// Remaining units at the time of rejection.
        remaining: u64,
        /// Milliseconds until the quota window resets.
        reset_in_ms: u64,
    },
}

impl GridError {
    /// Helper: build a `MalformedTimestamp` error.
    pub fn malformed_timestamp(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Helper: build an `InvalidWindow` error from displayable bounds.
    pub fn invalid_window(start: impl ToString, end: impl ToString) -> Self {
        Self::InvalidWindow {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Helper: build a `RemoteFetch` error with the connector name and message.
    pub fn remote_fetch(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::RemoteFetch {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `StoreWrite` error.
    pub fn store_write(msg: impl Into<String>) -> Self {
        Self::StoreWrite { msg: msg.into() }
    }

    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(connector: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            connector: connector.into(),
            capability: capability.into(),
        }
    }

    /// Helper: build a `RequestTimeout` error.
    #[must_use]
    pub fn request_timeout(capability: impl Into<String>) -> Self {
        Self::RequestTimeout {
            capability: capability.into(),
        }
    }

    /// Returns true if this error should be surfaced to operators as actionable.
    ///
    /// Empty series, capability absence and benign not-found conditions are
    /// expected during normal operation. Aggregates are classified based on
    /// their contents.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::EmptySeries { .. } | Self::Unsupported { .. } | Self::NotFound { .. } => false,
            Self::AllProvidersFailed(inner) => inner.iter().any(Self::is_actionable),
            _ => true,
        }
    }

    /// Flatten nested `AllProvidersFailed` structures into a plain vector.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllProvidersFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}
