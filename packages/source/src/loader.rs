//! Raw record loader.
//!
//! Turns the normalized [`RawTable`]s into typed records: coerces `year`,
//! keeps only rows inside the [`YearWindow`], builds the first-of-month
//! date, standardizes crash times, and restricts fatality records to the
//! crashes that survived filtering.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use road_toll_crash_models::{CrashId, DailyCountRecord, RawCrashRecord, RawFatalityRecord};
use serde::Serialize;

use crate::SourceError;
use crate::config::{PipelineConfig, YearWindow};
use crate::parsing::{parse_count, parse_flag, parse_integer, parse_year, standardize_time};
use crate::reference::{
    LgaReferenceRow, RemotenessReferenceRow, parse_lga_reference, parse_remoteness_reference,
};
use crate::table::{RawTable, cell};

/// Row-level bookkeeping from one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Data rows read from the crash table.
    pub crash_rows_read: usize,
    /// Crash rows whose identifier is not a non-negative integer.
    pub crash_rows_bad_id: usize,
    /// Crash rows whose year could not be coerced to a number.
    pub crash_rows_bad_year: usize,
    /// Crash rows outside the year window.
    pub crash_rows_out_of_window: usize,
    /// Crash rows kept.
    pub crash_rows_kept: usize,
    /// Data rows read from the fatality table.
    pub fatality_rows_read: usize,
    /// Fatality rows dropped for an unusable identifier or year, or a year
    /// outside the window.
    pub fatality_rows_filtered: usize,
    /// Fatality rows whose crash is not in the filtered crash set.
    pub fatality_rows_orphaned: usize,
    /// Fatality rows kept.
    pub fatality_rows_kept: usize,
}

/// Everything the pipeline reads from disk.
#[derive(Debug, Clone)]
pub struct LoadedSources {
    /// Filtered crash records, in file order.
    pub crashes: Vec<RawCrashRecord>,
    /// Fatality records whose crash survived filtering, in file order.
    pub fatalities: Vec<RawFatalityRecord>,
    /// Daily crash counts, if configured.
    pub crash_counts: Option<Vec<DailyCountRecord>>,
    /// Daily fatality counts, if configured.
    pub fatality_counts: Option<Vec<DailyCountRecord>>,
    /// LGA population reference rows.
    pub lga_reference: Vec<LgaReferenceRow>,
    /// Remoteness population reference rows.
    pub remoteness_reference: Vec<RemotenessReferenceRow>,
    /// Row-level bookkeeping.
    pub stats: LoadStats,
}

/// Crash-table column names after header normalization.
mod crash_columns {
    pub const CRASH_ID: &str = "crash id";
    pub const STATE: &str = "state";
    pub const MONTH: &str = "month";
    pub const YEAR: &str = "year";
    pub const DAYWEEK: &str = "dayweek";
    pub const TIME: &str = "time";
    pub const CRASH_TYPE: &str = "crash type";
    pub const NUMBER_FATALITIES: &str = "number fatalities";
    pub const BUS: &str = "bus involvement";
    pub const HEAVY_RIGID_TRUCK: &str = "heavy rigid truck involvement";
    pub const ARTICULATED_TRUCK: &str = "articulated truck involvement";
    pub const SPEED_LIMIT: &str = "speed limit";
    pub const ROAD_TYPE: &str = "national road type";
    pub const REMOTENESS: &str = "national remoteness areas";
    pub const SA4_NAME: &str = "sa4 name 2021";
    pub const LGA_NAME: &str = "national lga name 2021";
    pub const CHRISTMAS: &str = "christmas period";
    pub const EASTER: &str = "easter period";
    pub const DAY_OF_WEEK: &str = "day of week";
    pub const TIME_OF_DAY: &str = "time of day";
}

/// Fatality-table column names after header normalization.
mod fatality_columns {
    pub const CRASH_ID: &str = "crash id";
    pub const YEAR: &str = "year";
    pub const ROAD_USER: &str = "road user";
    pub const GENDER: &str = "gender";
    pub const AGE: &str = "age";
    pub const AGE_GROUP: &str = "age group";
}

/// Loads every configured input.
///
/// Nothing is returned unless every required source loads; reference files
/// without a recognizable layout load as empty lists.
///
/// # Errors
///
/// Returns [`SourceError::SourceLoad`] if any configured file cannot be read
/// and [`SourceError::MalformedSource`] if a required column is missing or
/// date construction fails.
pub fn load_all(config: &PipelineConfig) -> Result<LoadedSources, SourceError> {
    let inputs = &config.inputs;
    let window = config.window;

    let crash_table = RawTable::read_path(
        &config.input_path(&inputs.fatal_crash),
        &inputs.fatal_crash,
        config.header_row,
    )?;
    let fatality_table = RawTable::read_path(
        &config.input_path(&inputs.fatalities),
        &inputs.fatalities,
        config.header_row,
    )?;
    let (lga_reference, remoteness_reference) = load_references(config)?;

    let crash_counts = inputs
        .fatal_crash_count
        .as_deref()
        .map(|file| {
            let table = RawTable::read_path(&config.input_path(file), file, config.header_row)?;
            load_counts(&table, window, &config.counts.crash_count_column)
        })
        .transpose()?;
    let fatality_counts = inputs
        .fatalities_count
        .as_deref()
        .map(|file| {
            let table = RawTable::read_path(&config.input_path(file), file, config.header_row)?;
            load_counts(&table, window, &config.counts.fatality_count_column)
        })
        .transpose()?;

    let mut stats = LoadStats::default();
    let crashes = load_crashes(&crash_table, window, &mut stats)?;
    let valid_ids: BTreeSet<CrashId> = crashes.iter().map(|c| c.crash_id).collect();
    let fatalities = load_fatalities(&fatality_table, window, &valid_ids, &mut stats)?;

    Ok(LoadedSources {
        crashes,
        fatalities,
        crash_counts,
        fatality_counts,
        lga_reference,
        remoteness_reference,
        stats,
    })
}

/// Reads and parses both population reference files.
///
/// # Errors
///
/// Returns [`SourceError::SourceLoad`] if either file cannot be read.
pub fn load_references(
    config: &PipelineConfig,
) -> Result<(Vec<LgaReferenceRow>, Vec<RemotenessReferenceRow>), SourceError> {
    let lga_text = read_text(config, &config.inputs.lga_reference)?;
    let remoteness_text = read_text(config, &config.inputs.remoteness_reference)?;
    Ok((
        parse_lga_reference(&lga_text),
        parse_remoteness_reference(&remoteness_text),
    ))
}

fn read_text(config: &PipelineConfig, file: &str) -> Result<String, SourceError> {
    let path = config.input_path(file);
    let bytes = std::fs::read(&path).map_err(|e| SourceError::SourceLoad {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Builds typed crash records from the crash table.
///
/// Rows with an unusable identifier or year, or a year outside `window`,
/// are skipped and counted in `stats`.
///
/// # Errors
///
/// Returns [`SourceError::MalformedSource`] if a required column is
/// missing or any kept row has no valid month, since no first-of-month date
/// can be built for it.
pub fn load_crashes(
    table: &RawTable,
    window: YearWindow,
    stats: &mut LoadStats,
) -> Result<Vec<RawCrashRecord>, SourceError> {
    use crash_columns as c;

    let crash_id = table.column(c::CRASH_ID)?;
    let year = table.column(c::YEAR)?;
    let month = table.column(c::MONTH)?;
    let state = table.column(c::STATE)?;
    let fatalities = table.column(c::NUMBER_FATALITIES)?;

    let optional = |name: &str| {
        let index = table.optional_column(name);
        if index.is_none() {
            log::warn!("{}: optional column '{name}' is missing", table.name());
        }
        index
    };
    let dayweek = optional(c::DAYWEEK);
    let time = optional(c::TIME);
    let crash_type = optional(c::CRASH_TYPE);
    let bus = optional(c::BUS);
    let heavy_rigid = optional(c::HEAVY_RIGID_TRUCK);
    let articulated = optional(c::ARTICULATED_TRUCK);
    let speed_limit = optional(c::SPEED_LIMIT);
    let road_type = optional(c::ROAD_TYPE);
    let remoteness = optional(c::REMOTENESS);
    let sa4 = optional(c::SA4_NAME);
    let lga = optional(c::LGA_NAME);
    let christmas = optional(c::CHRISTMAS);
    let easter = optional(c::EASTER);
    let day_of_week = optional(c::DAY_OF_WEEK);
    let time_of_day = optional(c::TIME_OF_DAY);

    let text = |row: &[Option<String>], column: Option<usize>| cell(row, column).map(str::to_owned);

    let mut records = Vec::new();

    for row in table.rows() {
        stats.crash_rows_read += 1;

        let Some(id) = cell(row, Some(crash_id)).and_then(parse_crash_id) else {
            stats.crash_rows_bad_id += 1;
            continue;
        };
        let Some(record_year) = cell(row, Some(year)).and_then(parse_year) else {
            stats.crash_rows_bad_year += 1;
            continue;
        };
        if !window.contains(record_year) {
            stats.crash_rows_out_of_window += 1;
            continue;
        }

        let raw_month = cell(row, Some(month));
        let Some((record_month, date)) = raw_month.and_then(|m| first_of_month(record_year, m))
        else {
            return Err(SourceError::MalformedSource {
                source_name: table.name().to_owned(),
                message: format!(
                    "cannot build a date for crash {id}: year {record_year}, month {}",
                    raw_month.unwrap_or("<missing>")
                ),
            });
        };

        records.push(RawCrashRecord {
            crash_id: id,
            state: text(row, Some(state)),
            month: record_month,
            year: record_year,
            date,
            dayweek: text(row, dayweek),
            time: cell(row, time).map(standardize_time),
            crash_type: text(row, crash_type),
            number_fatalities: cell(row, Some(fatalities)).and_then(parse_count),
            bus_involvement: cell(row, bus).and_then(parse_flag),
            heavy_rigid_truck_involvement: cell(row, heavy_rigid).and_then(parse_flag),
            articulated_truck_involvement: cell(row, articulated).and_then(parse_flag),
            speed_limit: text(row, speed_limit),
            national_road_type: text(row, road_type),
            national_remoteness_areas: text(row, remoteness),
            sa4_name: text(row, sa4),
            national_lga_name: text(row, lga),
            christmas_period: text(row, christmas),
            easter_period: text(row, easter),
            day_of_week: text(row, day_of_week),
            time_of_day: text(row, time_of_day),
        });
    }

    stats.crash_rows_kept = records.len();

    if stats.crash_rows_bad_id > 0 {
        log::warn!(
            "{}: dropped {} rows with an unusable crash id",
            table.name(),
            stats.crash_rows_bad_id
        );
    }
    log::info!(
        "{}: kept {} of {} crash rows ({} outside {}-{}, {} without a numeric year)",
        table.name(),
        stats.crash_rows_kept,
        stats.crash_rows_read,
        stats.crash_rows_out_of_window,
        window.first_year,
        window.last_year,
        stats.crash_rows_bad_year,
    );

    Ok(records)
}

/// Builds typed fatality records, keeping only those whose crash is in
/// `valid_ids`.
///
/// # Errors
///
/// Returns [`SourceError::MalformedSource`] if a required column is missing.
pub fn load_fatalities(
    table: &RawTable,
    window: YearWindow,
    valid_ids: &BTreeSet<CrashId>,
    stats: &mut LoadStats,
) -> Result<Vec<RawFatalityRecord>, SourceError> {
    use fatality_columns as f;

    let crash_id = table.column(f::CRASH_ID)?;
    let year = table.column(f::YEAR)?;
    let road_user = table.optional_column(f::ROAD_USER);
    let gender = table.optional_column(f::GENDER);
    let age = table.optional_column(f::AGE);
    let age_group = table.optional_column(f::AGE_GROUP);

    let mut records = Vec::new();

    for row in table.rows() {
        stats.fatality_rows_read += 1;

        let id = cell(row, Some(crash_id)).and_then(parse_crash_id);
        let record_year = cell(row, Some(year)).and_then(parse_year);
        let (Some(id), Some(record_year)) = (id, record_year) else {
            stats.fatality_rows_filtered += 1;
            continue;
        };
        if !window.contains(record_year) {
            stats.fatality_rows_filtered += 1;
            continue;
        }
        if !valid_ids.contains(&id) {
            stats.fatality_rows_orphaned += 1;
            continue;
        }

        records.push(RawFatalityRecord {
            crash_id: id,
            year: record_year,
            road_user: cell(row, road_user).map(str::to_owned),
            gender: cell(row, gender).map(str::to_owned),
            age: cell(row, age).and_then(parse_count),
            age_group: cell(row, age_group).map(str::to_owned),
        });
    }

    stats.fatality_rows_kept = records.len();
    log::info!(
        "{}: kept {} of {} fatality rows ({} without a matching crash)",
        table.name(),
        stats.fatality_rows_kept,
        stats.fatality_rows_read,
        stats.fatality_rows_orphaned,
    );

    Ok(records)
}

/// Reads a count-by-date table into `(year, month, count)` rows.
///
/// Rows outside `window`, or without a usable year, month, or count, are
/// skipped.
///
/// # Errors
///
/// Returns [`SourceError::MalformedSource`] if the year, month, or count
/// column is missing.
pub fn load_counts(
    table: &RawTable,
    window: YearWindow,
    count_column: &str,
) -> Result<Vec<DailyCountRecord>, SourceError> {
    let year = table.column("year")?;
    let month = table.column("month")?;
    let count = table.column(count_column)?;

    let records: Vec<DailyCountRecord> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let year = cell(row, Some(year)).and_then(parse_year)?;
            let month = cell(row, Some(month)).and_then(parse_month)?;
            let count = cell(row, Some(count)).and_then(parse_integer)?;
            Some(DailyCountRecord {
                year,
                month,
                count: u64::try_from(count).ok()?,
            })
        })
        .filter(|r| window.contains(r.year))
        .collect();

    log::info!("{}: loaded {} count rows", table.name(), records.len());
    Ok(records)
}

fn parse_crash_id(s: &str) -> Option<CrashId> {
    parse_integer(s)
        .and_then(|v| u64::try_from(v).ok())
        .map(CrashId)
}

fn parse_month(s: &str) -> Option<u32> {
    parse_integer(s)
        .and_then(|v| u32::try_from(v).ok())
        .filter(|m| (1..=12).contains(m))
}

/// Parses a month cell and builds the `year-month-01` date.
fn first_of_month(year: i32, raw_month: &str) -> Option<(u32, NaiveDate)> {
    let month = parse_month(raw_month)?;
    NaiveDate::from_ymd_opt(year, month, 1).map(|date| (month, date))
}
