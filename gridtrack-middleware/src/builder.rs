//! Builder for composing connectors with middleware layers.
//!
//! Layers are stored outermost-first and applied in reverse during
//! [`ConnectorBuilder::build`], so the last layer inserted at the front ends
//! up wrapping everything else:
//!
//! ```text
//! layers: [Quota, Other]    applied: Raw -> Other -> Quota
//! result: Quota(Other(Raw))
//! ```

use std::sync::Arc;
use std::time::Duration;

use gridtrack_core::Middleware;
use gridtrack_core::connector::GridConnector;
use gridtrack_types::{QuotaConfig, QuotaConsumptionStrategy};

use crate::quota::QuotaMiddleware;

const QUOTA_LAYER: &str = "QuotaAwareConnector";

/// Middleware builder for wrapping a raw connector.
pub struct ConnectorBuilder {
    raw: Arc<dyn GridConnector>,
    layers: Vec<Box<dyn Middleware>>,
}

impl ConnectorBuilder {
    /// Start from a raw, unwrapped connector.
    #[must_use]
    pub fn new(raw: Arc<dyn GridConnector>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    fn existing_quota_config(&self) -> Option<QuotaConfig> {
        let layer = self.layers.iter().find(|l| l.name() == QUOTA_LAYER)?;
        let cfg = layer.config_json();
        let defaults = QuotaConfig::default();
        let limit = cfg
            .get("limit")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(defaults.limit);
        let window = cfg
            .get("window_ms")
            .and_then(serde_json::Value::as_u64)
            .map_or(defaults.window, Duration::from_millis);
        let strategy = match cfg.get("strategy").and_then(serde_json::Value::as_str) {
            Some("EvenSpreadHourly") => QuotaConsumptionStrategy::EvenSpreadHourly,
            Some("Unit") => QuotaConsumptionStrategy::Unit,
            _ => defaults.strategy,
        };
        Some(QuotaConfig {
            limit,
            window,
            strategy,
        })
    }

    /// Add or replace the quota layer as the outermost layer.
    #[must_use]
    pub fn with_quota(mut self, cfg: &QuotaConfig) -> Self {
        self.layers.retain(|m| m.name() != QUOTA_LAYER);
        self.layers
            .insert(0, Box::new(QuotaMiddleware::new(cfg.clone())));
        self
    }

    /// Remove the quota layer if present.
    #[must_use]
    pub fn without_quota(mut self) -> Self {
        self.layers.retain(|m| m.name() != QUOTA_LAYER);
        self
    }

    /// Set the quota limit, keeping any existing window and strategy.
    #[must_use]
    pub fn quota_limit(self, limit: u64) -> Self {
        let mut cfg = self.existing_quota_config().unwrap_or_default();
        cfg.limit = limit;
        self.with_quota(&cfg)
    }

    /// Set the quota window, keeping any existing limit and strategy.
    #[must_use]
    pub fn quota_window(self, window: Duration) -> Self {
        let mut cfg = self.existing_quota_config().unwrap_or_default();
        cfg.window = window;
        self.with_quota(&cfg)
    }

    /// Set the quota strategy, keeping any existing limit and window.
    #[must_use]
    pub fn quota_strategy(self, strategy: QuotaConsumptionStrategy) -> Self {
        let mut cfg = self.existing_quota_config().unwrap_or_default();
        cfg.strategy = strategy;
        self.with_quota(&cfg)
    }

    /// Push an arbitrary middleware as the outermost layer.
    #[must_use]
    pub fn layer(mut self, middleware: Box<dyn Middleware>) -> Self {
        self.layers.insert(0, middleware);
        self
    }

    /// Names of the configured layers, outermost first.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    /// Apply every layer and return the wrapped connector.
    #[must_use]
    pub fn build(self) -> Arc<dyn GridConnector> {
        self.layers
            .into_iter()
            .rev()
            .fold(self.raw, |inner, layer| layer.apply(inner))
    }
}
