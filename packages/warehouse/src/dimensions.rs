//! Dimension extractors.
//!
//! Each extractor projects a fixed set of columns out of the loaded
//! records, applies its null-filling policy, and drops exact duplicate
//! rows keeping the first occurrence.

use std::collections::BTreeSet;

use road_toll_crash_models::{
    RawCrashRecord, RawFatalityRecord, VehicleCategory,
    calendar::{self, Season, TourismSeason},
};
use road_toll_warehouse_models::{
    CrashTypeRow, DriverRow, LocationRow, RoadConditionRow, SeasonRow, TimeRow, UNKNOWN,
    VehicleRow, period_id,
};
use serde::Serialize;

use crate::driver_age::repair_ages;

/// The seven crash-derived dimensions.
#[derive(Debug, Clone, Default)]
pub struct Dimensions {
    pub location: Vec<LocationRow>,
    pub vehicle: Vec<VehicleRow>,
    pub road_condition: Vec<RoadConditionRow>,
    pub driver: Vec<DriverRow>,
    pub time: Vec<TimeRow>,
    pub crash_type: Vec<CrashTypeRow>,
    pub season: Vec<SeasonRow>,
}

impl Dimensions {
    /// Runs every extractor.
    #[must_use]
    pub fn extract(crashes: &[RawCrashRecord], fatalities: &[RawFatalityRecord]) -> Self {
        let dimensions = Self {
            location: extract_location(crashes),
            vehicle: extract_vehicle(crashes),
            road_condition: extract_road_condition(crashes),
            driver: extract_drivers(fatalities),
            time: extract_time(crashes),
            crash_type: extract_crash_type(crashes),
            season: extract_season(crashes),
        };

        log::info!(
            "Extracted dimensions: location={} vehicle={} road_condition={} driver={} time={} crash_type={} season={}",
            dimensions.location.len(),
            dimensions.vehicle.len(),
            dimensions.road_condition.len(),
            dimensions.driver.len(),
            dimensions.time.len(),
            dimensions.crash_type.len(),
            dimensions.season.len(),
        );

        dimensions
    }
}

/// Drops rows whose full content repeats an earlier row.
///
/// Rows are compared by their serialized form, which also covers rows
/// carrying floats.
#[must_use]
pub fn dedup_rows<T: Serialize>(rows: Vec<T>) -> Vec<T> {
    let mut seen = BTreeSet::new();
    let before = rows.len();

    let kept: Vec<T> = rows
        .into_iter()
        .filter(|row| serde_json::to_string(row).map_or(true, |key| seen.insert(key)))
        .collect();

    if kept.len() < before {
        log::debug!("Dropped {} duplicate rows", before - kept.len());
    }
    kept
}

fn or_unknown(value: Option<&String>) -> String {
    value.map_or_else(|| UNKNOWN.to_owned(), Clone::clone)
}

#[must_use]
pub fn extract_location(crashes: &[RawCrashRecord]) -> Vec<LocationRow> {
    dedup_rows(
        crashes
            .iter()
            .map(|c| LocationRow {
                crash_id: c.crash_id,
                state: c.state.clone(),
                national_remoteness_areas: c.national_remoteness_areas.clone(),
                sa4_name: or_unknown(c.sa4_name.as_ref()),
                national_lga_name: or_unknown(c.national_lga_name.as_ref()),
            })
            .collect(),
    )
}

/// Projects the involvement flags and classifies each crash with
/// [`VehicleCategory::classify`].
#[must_use]
pub fn extract_vehicle(crashes: &[RawCrashRecord]) -> Vec<VehicleRow> {
    dedup_rows(
        crashes
            .iter()
            .map(|c| VehicleRow {
                crash_id: c.crash_id,
                bus_involvement: c.bus_involvement,
                heavy_rigid_truck_involvement: c.heavy_rigid_truck_involvement,
                articulated_truck_involvement: c.articulated_truck_involvement,
                vehicle_type: VehicleCategory::classify(
                    c.articulated_truck_involvement,
                    c.heavy_rigid_truck_involvement,
                    c.bus_involvement,
                ),
            })
            .collect(),
    )
}

#[must_use]
pub fn extract_road_condition(crashes: &[RawCrashRecord]) -> Vec<RoadConditionRow> {
    dedup_rows(
        crashes
            .iter()
            .map(|c| RoadConditionRow {
                crash_id: c.crash_id,
                speed_limit: c.speed_limit.clone(),
                national_road_type: c.national_road_type.clone(),
            })
            .collect(),
    )
}

/// Projects fatality records into driver rows.
///
/// Missing ages are repaired before de-duplication, and `driver_id` is
/// assigned 1..N afterwards.
#[must_use]
pub fn extract_drivers(fatalities: &[RawFatalityRecord]) -> Vec<DriverRow> {
    let mut rows: Vec<DriverRow> = fatalities
        .iter()
        .map(|f| DriverRow {
            driver_id: 0,
            crash_id: f.crash_id,
            road_user: f.road_user.clone(),
            gender: f.gender.clone(),
            age: f.age.map(f64::from),
            age_group: f.age_group.clone(),
        })
        .collect();

    repair_ages(&mut rows);

    let mut rows = dedup_rows(rows);
    for (id, row) in (1_u64..).zip(rows.iter_mut()) {
        row.driver_id = id;
    }
    rows
}

#[must_use]
pub fn extract_time(crashes: &[RawCrashRecord]) -> Vec<TimeRow> {
    dedup_rows(
        crashes
            .iter()
            .filter_map(|c| {
                let Some(time_id) = period_id(c.year, c.month) else {
                    log::warn!("No time key for crash {} ({}-{})", c.crash_id, c.year, c.month);
                    return None;
                };
                Some(TimeRow {
                    crash_id: c.crash_id,
                    year: c.year,
                    month: c.month,
                    dayweek: c.dayweek.clone(),
                    time: c.time.clone(),
                    day_of_week: c.day_of_week.clone(),
                    time_of_day: c.time_of_day.clone(),
                    christmas_period: c.christmas_period.clone(),
                    easter_period: c.easter_period.clone(),
                    date: c.date,
                    time_id,
                })
            })
            .collect(),
    )
}

#[must_use]
pub fn extract_crash_type(crashes: &[RawCrashRecord]) -> Vec<CrashTypeRow> {
    dedup_rows(
        crashes
            .iter()
            .map(|c| CrashTypeRow {
                crash_id: c.crash_id,
                crash_type: c.crash_type.clone(),
                number_fatalities: c.number_fatalities,
            })
            .collect(),
    )
}

/// One row per distinct (year, month), in first-seen order.
#[must_use]
pub fn extract_season(crashes: &[RawCrashRecord]) -> Vec<SeasonRow> {
    let mut seen = BTreeSet::new();

    crashes
        .iter()
        .filter(|c| seen.insert((c.year, c.month)))
        .filter_map(|c| {
            let season_id = period_id(c.year, c.month)?;
            Some(SeasonRow {
                year: c.year,
                month: c.month,
                season: Season::from_month(c.month),
                quarter: calendar::quarter(c.month),
                is_holiday_season: u8::from(calendar::is_holiday_season(c.month)),
                is_school_holiday: u8::from(calendar::is_school_holiday(c.month)),
                tourism_season: TourismSeason::from_month(c.month),
                date: c.date,
                season_id,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;
    use road_toll_crash_models::CrashId;

    use super::*;

    pub(crate) fn crash(id: u64, year: i32, month: u32) -> RawCrashRecord {
        RawCrashRecord {
            crash_id: CrashId(id),
            state: Some("NSW".to_owned()),
            month,
            year,
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            dayweek: Some("Friday".to_owned()),
            time: Some("09:30".to_owned()),
            crash_type: Some("Single".to_owned()),
            number_fatalities: Some(1),
            bus_involvement: Some(false),
            heavy_rigid_truck_involvement: Some(false),
            articulated_truck_involvement: Some(false),
            speed_limit: Some("100".to_owned()),
            national_road_type: Some("Arterial Road".to_owned()),
            national_remoteness_areas: Some("Major Cities of Australia".to_owned()),
            sa4_name: Some("Sydney - City and Inner South".to_owned()),
            national_lga_name: Some("Sydney".to_owned()),
            christmas_period: Some("No".to_owned()),
            easter_period: Some("No".to_owned()),
            day_of_week: Some("Weekday".to_owned()),
            time_of_day: Some("Day".to_owned()),
        }
    }

    pub(crate) fn fatality(id: u64, year: i32, age: Option<u32>) -> RawFatalityRecord {
        RawFatalityRecord {
            crash_id: CrashId(id),
            year,
            road_user: Some("Driver".to_owned()),
            gender: Some("Male".to_owned()),
            age,
            age_group: Some("26_to_39".to_owned()),
        }
    }

    #[test]
    fn location_fills_unknown_text() {
        let mut c = crash(20_101_001, 2010, 1);
        c.sa4_name = None;
        c.national_lga_name = None;
        c.national_remoteness_areas = None;
        let rows = extract_location(&[c]);
        assert_eq!(rows[0].sa4_name, UNKNOWN);
        assert_eq!(rows[0].national_lga_name, UNKNOWN);
        assert_eq!(rows[0].national_remoteness_areas, None);
    }

    #[test]
    fn articulated_truck_takes_priority_over_bus() {
        let mut c = crash(20_101_001, 2010, 1);
        c.articulated_truck_involvement = Some(true);
        c.bus_involvement = Some(true);
        let rows = extract_vehicle(&[c]);
        assert_eq!(rows[0].vehicle_type, VehicleCategory::ArticulatedTruck);
        assert_eq!(rows[0].vehicle_type.to_string(), "Articulated Truck");
    }

    #[test]
    fn exact_duplicates_are_dropped() {
        let c = crash(20_101_001, 2010, 1);
        let rows = extract_road_condition(&[c.clone(), c.clone(), c]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn drivers_keep_multiple_rows_per_crash() {
        let mut second = fatality(20_101_001, 2010, Some(40));
        second.road_user = Some("Passenger".to_owned());
        let rows = extract_drivers(&[
            fatality(20_101_001, 2010, Some(30)),
            second,
            fatality(20_101_001, 2010, Some(30)),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.iter().map(|r| r.driver_id).collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn repaired_duplicates_collapse() {
        let rows = extract_drivers(&[
            fatality(20_101_001, 2010, Some(30)),
            fatality(20_101_002, 2010, Some(30)),
            fatality(20_101_002, 2010, None),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].age, Some(30.0));
    }

    #[test]
    fn season_has_one_row_per_year_month() {
        let rows = extract_season(&[
            crash(20_101_001, 2010, 1),
            crash(20_101_002, 2010, 1),
            crash(20_101_003, 2010, 7),
            crash(20_111_004, 2011, 1),
        ]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].season_id, 201_001);
        assert_eq!(rows[1].season, Season::Winter);
        assert_eq!(rows[1].tourism_season, TourismSeason::SecondaryPeak);
        assert_eq!(rows[1].is_school_holiday, 1);
        assert_eq!(rows[2].year, 2011);
    }

    #[test]
    fn time_rows_carry_period_key() {
        let rows = extract_time(&[crash(20_101_001, 2010, 3)]);
        assert_eq!(rows[0].time_id, 201_003);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2010, 3, 1).unwrap());
    }
}
