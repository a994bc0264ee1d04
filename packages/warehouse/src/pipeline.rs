//! Pipeline orchestration.
//!
//! [`build_warehouse`] runs every in-memory stage over already-loaded
//! sources. [`run`] adds loading and persistence around it: nothing is
//! written until every table and the integrity report exist in memory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use road_toll_source::progress::ProgressCallback;
use road_toll_source::{LoadedSources, PipelineConfig, load_all};
use road_toll_warehouse_models::{LgaRow, PopulationRow};

use crate::WarehouseError;
use crate::audit::{AuditInput, IntegrityReport, audit};
use crate::dimensions::Dimensions;
use crate::enrich::{build_lga_dimension, build_population_dimension};
use crate::fact::{FactAssembly, assemble_facts};
use crate::writer::{write_json, write_table};

/// File name of the persisted integrity report.
pub const REPORT_FILE_NAME: &str = "integrity_report.json";

/// Number of progress steps reported by [`run`].
pub const STAGE_COUNT: u64 = 6;

/// Every table of the star schema plus the audit over them.
#[derive(Debug, Clone)]
pub struct Warehouse {
    pub dimensions: Dimensions,
    pub population: Vec<PopulationRow>,
    pub lga: Vec<LgaRow>,
    pub facts: FactAssembly,
    pub report: IntegrityReport,
}

/// Builds every table from loaded sources.
///
/// Pure: the same sources always produce the same warehouse.
#[must_use]
pub fn build_warehouse(
    sources: &LoadedSources,
    audit_sample_size: usize,
    progress: &dyn ProgressCallback,
) -> Warehouse {
    progress.set_message("Extracting dimensions".to_string());
    let dimensions = Dimensions::extract(&sources.crashes, &sources.fatalities);
    progress.inc(1);

    progress.set_message("Enriching population".to_string());
    let population = build_population_dimension(&dimensions.location, &sources.remoteness_reference);
    let lga = build_lga_dimension(&dimensions.location, &sources.lga_reference);
    progress.inc(1);

    progress.set_message("Assembling facts".to_string());
    let facts = assemble_facts(&sources.crashes, &dimensions, &population, &lga);
    progress.inc(1);

    progress.set_message("Auditing".to_string());
    let report = audit(&AuditInput {
        dimensions: &dimensions,
        population: &population,
        lga: &lga,
        facts: &facts,
        crash_counts: sources.crash_counts.as_deref(),
        fatality_counts: sources.fatality_counts.as_deref(),
        load: sources.stats,
        sample_size: audit_sample_size,
    });
    progress.inc(1);

    Warehouse {
        dimensions,
        population,
        lga,
        facts,
        report,
    }
}

impl Warehouse {
    /// Writes every table and the integrity report to `dir`, creating it
    /// if needed. Returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if any file cannot be written.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>, WarehouseError> {
        std::fs::create_dir_all(dir)?;

        let d = &self.dimensions;
        Ok(vec![
            write_table(dir, &d.location)?,
            write_table(dir, &d.vehicle)?,
            write_table(dir, &d.road_condition)?,
            write_table(dir, &d.driver)?,
            write_table(dir, &d.time)?,
            write_table(dir, &d.crash_type)?,
            write_table(dir, &d.season)?,
            write_table(dir, &self.population)?,
            write_table(dir, &self.lga)?,
            write_table(dir, &self.facts.rows)?,
            write_json(dir, REPORT_FILE_NAME, &self.report)?,
        ])
    }
}

/// Loads, builds, audits, and persists the warehouse.
///
/// # Errors
///
/// Returns [`WarehouseError::Source`] if loading fails, in which case no
/// output is written, or another [`WarehouseError`] if writing fails.
pub fn run(
    config: &PipelineConfig,
    progress: Arc<dyn ProgressCallback>,
) -> Result<Warehouse, WarehouseError> {
    progress.set_total(STAGE_COUNT);

    progress.set_message("Loading sources".to_string());
    log::info!("Loading sources from {}", config.data_dir.display());
    let sources = load_all(config)?;
    progress.inc(1);

    let warehouse = build_warehouse(&sources, config.audit_sample_size, progress.as_ref());

    progress.set_message("Writing tables".to_string());
    let written = warehouse.write(&config.output_dir)?;
    progress.inc(1);

    progress.finish(format!(
        "Wrote {} files to {}",
        written.len(),
        config.output_dir.display()
    ));
    log::info!(
        "Warehouse complete: {} fact rows, {} files in {}",
        warehouse.facts.rows.len(),
        written.len(),
        config.output_dir.display()
    );

    Ok(warehouse)
}
