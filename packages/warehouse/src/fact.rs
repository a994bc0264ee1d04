//! Fact assembly.
//!
//! Builds one fact row per crash identifier and attaches every dimension
//! key with left-join semantics: a missing dimension match leaves the key
//! empty and never drops the row.

use std::collections::{BTreeMap, BTreeSet};

use road_toll_crash_models::{CrashId, KeyDecodeError, RawCrashRecord};
use road_toll_warehouse_models::{
    DataSource, FactRow, LgaRow, LocationRow, PopulationRow, UNKNOWN,
};

use crate::dimensions::Dimensions;
use crate::keys::{CrashKeys, LocationKeys, StandInKeys, rows_per_crash};

/// Crash and fatality totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub crashes: u64,
    pub fatalities: u64,
}

impl Totals {
    fn add(&mut self, fatalities: Option<u32>) {
        self.crashes += 1;
        self.fatalities += u64::from(fatalities.unwrap_or(0));
    }
}

/// Crash and fatality totals per year and per (year, month).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodTotals {
    pub yearly: BTreeMap<i32, Totals>,
    pub monthly: BTreeMap<(i32, u32), Totals>,
}

impl PeriodTotals {
    /// Sums `(year, month, fatalities)` triples. Entries without a year are
    /// not counted anywhere.
    pub fn collect(entries: impl IntoIterator<Item = (Option<i32>, u32, Option<u32>)>) -> Self {
        let mut totals = Self::default();
        for (year, month, fatalities) in entries {
            let Some(year) = year else {
                continue;
            };
            totals.yearly.entry(year).or_default().add(fatalities);
            totals.monthly.entry((year, month)).or_default().add(fatalities);
        }
        totals
    }
}

/// Result of fact assembly.
#[derive(Debug, Clone, Default)]
pub struct FactAssembly {
    /// Fact rows in `fact_id` order.
    pub rows: Vec<FactRow>,
    /// Crash identifiers whose year/state could not be read.
    pub key_errors: Vec<KeyDecodeError>,
    /// Totals the aggregate columns were filled from.
    pub totals: PeriodTotals,
}

/// One crash before aggregates are attached.
struct Draft<'a> {
    crash: &'a RawCrashRecord,
    keys: CrashKeys,
}

/// Assembles the fact table.
///
/// The base projection keeps the first record of each crash identifier in
/// crash-table order; `fact_id` is assigned 1..N in that order.
#[must_use]
pub fn assemble_facts(
    crashes: &[RawCrashRecord],
    dimensions: &Dimensions,
    population: &[PopulationRow],
    lga: &[LgaRow],
) -> FactAssembly {
    let mut seen = BTreeSet::new();
    let mut key_errors = Vec::new();

    let drafts: Vec<Draft<'_>> = crashes
        .iter()
        .filter(|c| seen.insert(c.crash_id))
        .map(|crash| {
            let (keys, error) = CrashKeys::decode(crash);
            key_errors.extend(error);
            Draft { crash, keys }
        })
        .collect();

    if drafts.len() < crashes.len() {
        log::warn!(
            "{} crash rows repeat an earlier crash id; the first occurrence forms the fact row",
            crashes.len() - drafts.len()
        );
    }

    let seasons: BTreeSet<(i32, u32)> = dimensions
        .season
        .iter()
        .map(|s| (s.year, s.month))
        .collect();
    let times = StandInKeys::collect(&dimensions.time, |t| t.crash_id);
    let vehicles = StandInKeys::collect(&dimensions.vehicle, |v| v.crash_id);
    let road_conditions = StandInKeys::collect(&dimensions.road_condition, |r| r.crash_id);
    let drivers = rows_per_crash(&dimensions.driver, |d| d.crash_id);
    let locations = LocationKeys::collect(&dimensions.location);

    let mut location_of: BTreeMap<CrashId, &LocationRow> = BTreeMap::new();
    for row in &dimensions.location {
        location_of.entry(row.crash_id).or_insert(row);
    }
    let population_by_area: BTreeMap<&str, &PopulationRow> = population
        .iter()
        .map(|p| (p.remoteness_area.as_str(), p))
        .collect();
    let lga_names: BTreeSet<&str> = lga.iter().map(|l| l.lga_name.as_str()).collect();

    let totals = PeriodTotals::collect(
        drafts
            .iter()
            .map(|d| (d.keys.year, d.keys.month, d.crash.number_fatalities)),
    );

    let rows: Vec<FactRow> = (1_u64..)
        .zip(drafts.iter())
        .map(|(fact_id, draft)| {
            let crash_id = draft.crash.crash_id;
            let keys = draft.keys;
            let location = location_of.get(&crash_id);

            let population_id = location
                .and_then(|l| l.national_remoteness_areas.as_deref())
                .and_then(|area| population_by_area.get(area))
                .filter(|p| p.state.is_none() || p.state == keys.state)
                .map(|_| crash_id);
            let lga_id = location
                .map(|l| l.national_lga_name.as_str())
                .filter(|name| *name != UNKNOWN && lga_names.contains(name))
                .map(|_| crash_id);

            let season_id = keys
                .year
                .filter(|year| seasons.contains(&(*year, keys.month)))
                .and_then(|_| keys.period_id());
            let time_id = times.key(crash_id).and_then(|_| keys.period_id());

            let yearly = keys.year.and_then(|y| totals.yearly.get(&y));
            let monthly = keys.year.and_then(|y| totals.monthly.get(&(y, keys.month)));

            FactRow {
                fact_id,
                crash_id,
                time_id,
                location_id: locations.key(keys.state),
                road_condition_id: road_conditions.key(crash_id),
                season_id,
                vehicle_id: vehicles.key(crash_id),
                driver_count: drivers.get(&crash_id).copied().unwrap_or(0),
                population_id,
                lga_id,
                fatalities: draft.crash.number_fatalities,
                yearly_crash_count: yearly.map(|t| t.crashes),
                yearly_fatality_count: yearly.map(|t| t.fatalities),
                monthly_crash_count: monthly.map(|t| t.crashes),
                monthly_fatality_count: monthly.map(|t| t.fatalities),
                crash_date: keys.crash_date(),
            }
        })
        .collect();

    let rows = crate::dimensions::dedup_rows(rows);

    let referenced_population = population
        .iter()
        .filter(|p| p.data_source == DataSource::ReferenceData)
        .count();
    log::info!(
        "Assembled {} fact rows ({} key decode errors, {referenced_population} populated remoteness areas)",
        rows.len(),
        key_errors.len(),
    );

    FactAssembly {
        rows,
        key_errors,
        totals,
    }
}
