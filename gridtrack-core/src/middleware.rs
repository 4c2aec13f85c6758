//! Middleware trait for wrapping `GridConnector` implementations.

use std::sync::Arc;

use crate::connector::GridConnector;

/// Trait implemented by connector middleware layers.
///
/// A middleware consumes an inner `GridConnector` and returns a wrapped
/// connector that restricts or augments its calls (e.g., request quotas).
pub trait Middleware: Send + Sync {
    /// Wrap `inner` and return the wrapped connector.
    fn apply(self: Box<Self>, inner: Arc<dyn GridConnector>) -> Arc<dyn GridConnector>;

    /// Middleware name for introspection and logging.
    fn name(&self) -> &'static str;

    /// Configuration snapshot for inspection.
    fn config_json(&self) -> serde_json::Value;
}
