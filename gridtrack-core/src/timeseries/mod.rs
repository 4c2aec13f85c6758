//! Time-series algorithms shared by the engine and connectors.
//!
//! - `gaps`: expected grid generation, set difference and run grouping
//! - `consolidate`: merge adjacent or overlapping gap ranges
//! - `windows`: backfill windows and per-call chunking
//! - `interpolate`: linear interpolation between neighbour samples
//! - `settlement`: GB settlement period numbering
/// Gap ranges consolidation.
pub mod consolidate;
/// Expected-versus-actual grid comparison.
pub mod gaps;
/// Linear interpolation of sample values.
pub mod interpolate;
/// Settlement period numbering in the Europe/London day.
pub mod settlement;
/// Fetch window planning.
pub mod windows;
