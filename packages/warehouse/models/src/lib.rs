#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Output row types of the road-fatality star schema.
//!
//! Each dimension and the fact table is a flat list of one of the row
//! structs below. Field order is the persisted column order, and
//! [`Table::COLUMNS`] must list the same names in the same order.

use chrono::NaiveDate;
use road_toll_crash_models::{
    CrashId, Jurisdiction, VehicleCategory,
    calendar::{Season, TourismSeason},
};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A persisted output table.
pub trait Table: Serialize {
    /// File stem of the persisted table.
    const NAME: &'static str;
    /// Header row, in serialization order.
    const COLUMNS: &'static [&'static str];
}

/// Where a population figure came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DataSource {
    /// Resolved from an ABS reference table
    #[strum(serialize = "Reference Data")]
    #[serde(rename = "Reference Data")]
    ReferenceData,
    /// No reference match; population left empty
    Derived,
}

/// Placeholder for missing free-text location fields.
pub const UNKNOWN: &str = "Unknown";

/// Where a crash happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationRow {
    pub crash_id: CrashId,
    pub state: Option<String>,
    pub national_remoteness_areas: Option<String>,
    /// [`UNKNOWN`] when missing upstream.
    pub sa4_name: String,
    /// [`UNKNOWN`] when missing upstream.
    pub national_lga_name: String,
}

impl Table for LocationRow {
    const NAME: &'static str = "location_dimension";
    const COLUMNS: &'static [&'static str] = &[
        "crash_id",
        "state",
        "national_remoteness_areas",
        "sa4_name",
        "national_lga_name",
    ];
}

/// Heavy-vehicle involvement of a crash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleRow {
    pub crash_id: CrashId,
    pub bus_involvement: Option<bool>,
    pub heavy_rigid_truck_involvement: Option<bool>,
    pub articulated_truck_involvement: Option<bool>,
    pub vehicle_type: VehicleCategory,
}

impl Table for VehicleRow {
    const NAME: &'static str = "vehicle_dimension";
    const COLUMNS: &'static [&'static str] = &[
        "crash_id",
        "bus_involvement",
        "heavy_rigid_truck_involvement",
        "articulated_truck_involvement",
        "vehicle_type",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoadConditionRow {
    pub crash_id: CrashId,
    pub speed_limit: Option<String>,
    pub national_road_type: Option<String>,
}

impl Table for RoadConditionRow {
    const NAME: &'static str = "road_condition_dimension";
    const COLUMNS: &'static [&'static str] = &["crash_id", "speed_limit", "national_road_type"];
}

/// One person killed. Several rows may share a crash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverRow {
    /// Dense 1..N key assigned after de-duplication.
    pub driver_id: u64,
    pub crash_id: CrashId,
    pub road_user: Option<String>,
    pub gender: Option<String>,
    /// Recorded age, or the repaired median when it was missing.
    pub age: Option<f64>,
    pub age_group: Option<String>,
}

impl Table for DriverRow {
    const NAME: &'static str = "driver_dimension";
    const COLUMNS: &'static [&'static str] = &[
        "driver_id",
        "crash_id",
        "road_user",
        "gender",
        "age",
        "age_group",
    ];
}

/// When a crash happened, at crash granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRow {
    pub crash_id: CrashId,
    pub year: i32,
    pub month: u32,
    pub dayweek: Option<String>,
    /// `HH:MM`.
    pub time: Option<String>,
    pub day_of_week: Option<String>,
    pub time_of_day: Option<String>,
    pub christmas_period: Option<String>,
    pub easter_period: Option<String>,
    /// First day of the crash month.
    pub date: NaiveDate,
    /// `year * 100 + month`.
    pub time_id: u32,
}

impl Table for TimeRow {
    const NAME: &'static str = "time_dimension";
    const COLUMNS: &'static [&'static str] = &[
        "crash_id",
        "year",
        "month",
        "dayweek",
        "time",
        "day_of_week",
        "time_of_day",
        "christmas_period",
        "easter_period",
        "date",
        "time_id",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashTypeRow {
    pub crash_id: CrashId,
    pub crash_type: Option<String>,
    pub number_fatalities: Option<u32>,
}

impl Table for CrashTypeRow {
    const NAME: &'static str = "crash_type_dimension";
    const COLUMNS: &'static [&'static str] = &["crash_id", "crash_type", "number_fatalities"];
}

/// Calendar attributes of one (year, month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonRow {
    pub year: i32,
    pub month: u32,
    pub season: Season,
    pub quarter: u32,
    /// 1 for November through January, else 0.
    pub is_holiday_season: u8,
    /// 1 for months that usually contain school holidays, else 0.
    pub is_school_holiday: u8,
    pub tourism_season: TourismSeason,
    pub date: NaiveDate,
    /// `year * 100 + month`.
    pub season_id: u32,
}

impl Table for SeasonRow {
    const NAME: &'static str = "season_dimension";
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "month",
        "season",
        "quarter",
        "is_holiday_season",
        "is_school_holiday",
        "tourism_season",
        "date",
        "season_id",
    ];
}

/// Population of one remoteness area as named in the crash data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationRow {
    /// Area name exactly as it appears in the crash data.
    pub remoteness_area: String,
    /// Jurisdiction named inside the area text, if any.
    pub state: Option<Jurisdiction>,
    pub population: Option<f64>,
    pub data_source: DataSource,
}

impl Table for PopulationRow {
    const NAME: &'static str = "population_dimension";
    const COLUMNS: &'static [&'static str] =
        &["remoteness_area", "state", "population", "data_source"];
}

/// Population of one local government area as named in the crash data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LgaRow {
    pub lga_name: String,
    pub population: Option<f64>,
    pub data_source: DataSource,
}

impl Table for LgaRow {
    const NAME: &'static str = "lga_dimension";
    const COLUMNS: &'static [&'static str] = &["lga_name", "population", "data_source"];
}

/// One crash with its dimension keys and measures.
///
/// Keys that could not be resolved are left empty rather than dropping the
/// row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactRow {
    /// Dense 1..N in fact order.
    pub fact_id: u64,
    pub crash_id: CrashId,
    pub time_id: Option<u32>,
    /// Jurisdiction code (1-8) of a Location row in the fact's state.
    pub location_id: Option<u8>,
    pub road_condition_id: Option<CrashId>,
    pub season_id: Option<u32>,
    pub vehicle_id: Option<CrashId>,
    /// Number of Driver rows sharing the crash.
    pub driver_count: u64,
    pub population_id: Option<CrashId>,
    pub lga_id: Option<CrashId>,
    /// Persons killed; empty when missing upstream, never negative.
    pub fatalities: Option<u32>,
    pub yearly_crash_count: Option<u64>,
    pub yearly_fatality_count: Option<u64>,
    pub monthly_crash_count: Option<u64>,
    pub monthly_fatality_count: Option<u64>,
    /// `year-01-01`.
    pub crash_date: Option<NaiveDate>,
}

impl Table for FactRow {
    const NAME: &'static str = "fact_table";
    const COLUMNS: &'static [&'static str] = &[
        "fact_id",
        "crash_id",
        "time_id",
        "location_id",
        "road_condition_id",
        "season_id",
        "vehicle_id",
        "driver_count",
        "population_id",
        "lga_id",
        "fatalities",
        "yearly_crash_count",
        "yearly_fatality_count",
        "monthly_crash_count",
        "monthly_fatality_count",
        "crash_date",
    ];
}

/// `year * 100 + month`, the synthesized key shared by the Time and Season
/// dimensions. `None` for years that cannot be represented.
#[must_use]
pub fn period_id(year: i32, month: u32) -> Option<u32> {
    u32::try_from(year)
        .ok()
        .and_then(|y| y.checked_mul(100))
        .and_then(|y| y.checked_add(month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_id_concatenates_year_and_padded_month() {
        assert_eq!(period_id(2010, 1), Some(201_001));
        assert_eq!(period_id(2023, 12), Some(202_312));
        assert_eq!(period_id(-1, 1), None);
    }

    #[test]
    fn data_source_labels() {
        assert_eq!(DataSource::ReferenceData.to_string(), "Reference Data");
        assert_eq!(DataSource::Derived.as_ref(), "Derived");
    }

    #[test]
    fn fact_columns_are_fixed() {
        assert_eq!(FactRow::COLUMNS.len(), 16);
        assert_eq!(FactRow::COLUMNS.first(), Some(&"fact_id"));
        assert_eq!(FactRow::COLUMNS.last(), Some(&"crash_date"));
    }
}
