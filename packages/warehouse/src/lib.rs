#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road-fatality star-schema construction.
//!
//! Stages, in the order the [`pipeline`] runs them:
//!
//! 1. [`dimensions`]: seven projections of the loaded records into
//!    de-duplicated dimension tables ([`driver_age`] repairs missing ages).
//! 2. [`enrich`]: resolves free-text remoteness and LGA names against the
//!    population references.
//! 3. [`keys`] and [`fact`]: key synthesis and the fact-table join.
//! 4. [`audit`]: read-only integrity checks over the finished tables.
//! 5. [`writer`]: atomic per-table persistence.
//!
//! Every stage before [`writer`] is a pure function of its inputs, so a
//! rerun over unchanged inputs reproduces the same bytes.

pub mod audit;
pub mod dimensions;
pub mod driver_age;
pub mod enrich;
pub mod fact;
pub mod keys;
pub mod pipeline;
pub mod writer;

pub use pipeline::{Warehouse, build_warehouse, run};

/// Errors from building or persisting the warehouse.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// Loading the inputs failed.
    #[error("Source error: {0}")]
    Source(#[from] road_toll_source::SourceError),

    /// I/O error while writing outputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
