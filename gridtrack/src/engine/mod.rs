mod backfill;
mod collect;
mod cycle;
mod detect;
mod ingest;
mod interpolate;
mod reconcile;
pub(crate) mod scheduler;
pub(crate) mod util;
