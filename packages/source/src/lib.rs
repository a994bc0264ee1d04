#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Raw input loading for the road-fatality warehouse.
//!
//! Reads the two BITRE fatality tables, the optional count-by-date tables,
//! and the two ABS population reference files, and turns them into typed
//! records from [`road_toll_crash_models`]. Nothing in here joins tables;
//! that is the warehouse crate's job.

pub mod config;
pub mod loader;
pub mod parsing;
pub mod progress;
pub mod reference;
pub mod table;

pub use config::{PipelineConfig, YearWindow};
pub use loader::{LoadStats, LoadedSources, load_all, load_references};

/// Errors that can occur while loading source data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// An input file could not be read.
    #[error("Failed to read {path}: {source}")]
    SourceLoad {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An input file was read but its content is unusable.
    #[error("Malformed source {source_name}: {message}")]
    MalformedSource {
        /// Configured name of the input.
        source_name: String,
        /// Description of what went wrong.
        message: String,
    },

    /// CSV record could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Pipeline configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}
