//! Pipeline configuration.
//!
//! A [`PipelineConfig`] names the input files, the output directory, the
//! year window, and a handful of tuning knobs. The default configuration is
//! baked into the binary at compile time; callers may load a TOML file of
//! the same shape instead.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::SourceError;

/// Embedded default configuration.
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Everything the pipeline needs to know about its inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory that input file names are resolved against.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory the tables and the integrity report are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// 1-based line number of the header row in the delimited tables.
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    /// Maximum number of orphan keys listed per dimension in the report.
    #[serde(default = "default_audit_sample_size")]
    pub audit_sample_size: usize,
    /// Input file names.
    pub inputs: InputFiles,
    /// Inclusive year range kept by the loader.
    #[serde(default)]
    pub window: YearWindow,
    /// Column names in the count-by-date tables.
    #[serde(default)]
    pub counts: CountColumns,
}

/// Input file names, relative to [`PipelineConfig::data_dir`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFiles {
    /// One row per fatal crash.
    pub fatal_crash: String,
    /// One row per person killed.
    pub fatalities: String,
    /// Daily fatal-crash counts. Only used for reconciliation.
    #[serde(default)]
    pub fatal_crash_count: Option<String>,
    /// Daily fatality counts. Only used for reconciliation.
    #[serde(default)]
    pub fatalities_count: Option<String>,
    /// Local government area population reference.
    pub lga_reference: String,
    /// Remoteness area population reference.
    pub remoteness_reference: String,
}

/// Inclusive range of crash years kept by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    /// First year kept.
    pub first_year: i32,
    /// Last year kept.
    pub last_year: i32,
}

impl Default for YearWindow {
    fn default() -> Self {
        Self {
            first_year: 2001,
            last_year: 2023,
        }
    }
}

impl YearWindow {
    /// Whether `year` falls inside the window.
    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        year >= self.first_year && year <= self.last_year
    }
}

/// Names of the count columns in the count-by-date tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountColumns {
    /// Column holding the number of fatal crashes on a day.
    pub crash_count_column: String,
    /// Column holding the number of fatalities on a day.
    pub fatality_count_column: String,
}

impl Default for CountColumns {
    fn default() -> Self {
        Self {
            crash_count_column: "number fatal crashes".to_owned(),
            fatality_count_column: "number fatalities".to_owned(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

const fn default_header_row() -> usize {
    5
}

const fn default_audit_sample_size() -> usize {
    5
}

impl PipelineConfig {
    /// Returns the embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the embedded TOML is invalid.
    pub fn embedded() -> Result<Self, SourceError> {
        parse_pipeline_toml(DEFAULT_CONFIG_TOML)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::SourceLoad`] if the file cannot be read and
    /// [`SourceError::Config`] if it is invalid.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|e| SourceError::SourceLoad {
            path: path.display().to_string(),
            source: e,
        })?;
        parse_pipeline_toml(&text)
    }

    /// Resolves an input file name against [`Self::data_dir`].
    #[must_use]
    pub fn input_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Checks invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] on an empty year window or a zero
    /// header row.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.window.first_year > self.window.last_year {
            return Err(SourceError::Config {
                message: format!(
                    "year window is empty: first_year {} > last_year {}",
                    self.window.first_year, self.window.last_year
                ),
            });
        }
        if self.header_row == 0 {
            return Err(SourceError::Config {
                message: "header_row is 1-based and must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Parses and validates a TOML pipeline configuration.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the TOML is malformed or fails
/// validation.
pub fn parse_pipeline_toml(toml_str: &str) -> Result<PipelineConfig, SourceError> {
    let config: PipelineConfig =
        toml::de::from_str(toml_str).map_err(|e| SourceError::Config {
            message: e.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}
