//! gridtrack-middleware
//!
//! Connector wrappers layered between the engine and upstream connectors.

mod builder;
mod quota;

pub use crate::builder::ConnectorBuilder;
pub use crate::quota::{QuotaAwareConnector, QuotaMiddleware};
