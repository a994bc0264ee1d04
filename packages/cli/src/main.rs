#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the road toll warehouse pipeline.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use road_toll_cli_utils::{IndicatifProgress, init_logger};
use road_toll_source::{PipelineConfig, load_references};

/// Environment variable naming a configuration file.
const CONFIG_ENV: &str = "ROAD_TOLL_CONFIG";

#[derive(Parser)]
#[command(name = "road_toll", about = "Road fatality star-schema warehouse builder")]
struct Cli {
    /// Pipeline configuration file (overrides `ROAD_TOLL_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory input file names are resolved against
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Directory the tables and integrity report are written to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every source, build all tables, audit them, and write the output
    Build,
    /// Parse and print both population reference sources
    References,
    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Resolves the configuration: `--config`, then `ROAD_TOLL_CONFIG`, then
    /// the embedded default, with the directory flags applied on top.
    fn pipeline_config(&self) -> Result<PipelineConfig, road_toll_source::SourceError> {
        let path = self
            .config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                log::info!("Using configuration {}", path.display());
                PipelineConfig::from_path(&path)?
            }
            None => PipelineConfig::embedded()?,
        };

        if let Some(dir) = &self.data_dir {
            config.data_dir.clone_from(dir);
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();
    let config = cli.pipeline_config()?;

    match cli.command {
        Commands::Build => {
            let start = Instant::now();
            let progress = IndicatifProgress::steps_bar(
                &multi,
                "Building warehouse",
                road_toll_warehouse::pipeline::STAGE_COUNT,
            );
            let warehouse = road_toll_warehouse::run(&config, progress)?;
            let report = &warehouse.report;

            println!("{:<28} ROWS", "TABLE");
            println!("{}", "-".repeat(40));
            for (table, rows) in &report.table_rows {
                println!("{table:<28} {rows}");
            }
            println!();
            println!("Key decode errors:      {}", report.key_decode_errors.len());
            println!("Unmatched remoteness:   {}", report.unmatched_remoteness_areas);
            println!("Unmatched LGAs:         {}", report.unmatched_lgas);
            if report.has_violations() {
                log::warn!(
                    "Integrity violations found, see {}",
                    config
                        .output_dir
                        .join(road_toll_warehouse::pipeline::REPORT_FILE_NAME)
                        .display()
                );
            }
            log::info!("Build finished in {:.1}s", start.elapsed().as_secs_f64());
        }
        Commands::References => {
            let (lga, remoteness) = load_references(&config)?;

            println!("{:<10} {:<40} POPULATION", "CODE", "LGA");
            println!("{}", "-".repeat(62));
            for row in &lga {
                println!("{:<10} {:<40} {}", row.code, row.name, row.population);
            }
            println!();
            println!("{:<6} {:<45} POPULATION", "STATE", "REMOTENESS AREA");
            println!("{}", "-".repeat(64));
            for row in &remoteness {
                println!(
                    "{:<6} {:<45} {}",
                    row.state.abbr(),
                    row.area_name,
                    row.population
                );
            }
            println!();
            println!(
                "{} LGA rows, {} remoteness rows",
                lga.len(),
                remoteness.len()
            );
        }
        Commands::Config => {
            print!("{}", toml::to_string(&config)?);
        }
    }

    Ok(())
}
