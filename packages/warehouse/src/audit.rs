//! Integrity audit.
//!
//! Read-only checks over the finished tables. Nothing in here mutates a
//! table or stops the pipeline; every finding is reported and logged.

use std::collections::{BTreeMap, BTreeSet};

use road_toll_crash_models::{CrashId, DailyCountRecord, KeyDecodeError};
use road_toll_source::LoadStats;
use road_toll_warehouse_models::{
    CrashTypeRow, DataSource, DriverRow, FactRow, LgaRow, LocationRow, PopulationRow,
    RoadConditionRow, SeasonRow, Table, TimeRow, VehicleRow,
};
use serde::Serialize;

use crate::dimensions::Dimensions;
use crate::fact::{FactAssembly, PeriodTotals, Totals};
use crate::keys::rows_per_crash;

/// Fact keys with no matching row in one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    pub dimension: &'static str,
    pub orphan_count: usize,
    /// Smallest orphan identifiers, at most the configured sample size.
    pub sample: Vec<CrashId>,
}

/// A dimension whose crash-identifier stand-in key is not 1:1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardinalityViolation {
    pub dimension: &'static str,
    /// Crash identifiers with more than one row.
    pub crash_count: usize,
    pub sample: Vec<CrashId>,
}

/// A fact row whose `driver_count` disagrees with the Driver dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverCountMismatch {
    pub crash_id: CrashId,
    pub driver_count: u64,
    pub driver_rows: u64,
}

/// A month whose derived total disagrees with a count-by-date table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodMismatch {
    pub year: i32,
    pub month: u32,
    /// Sum of the count-by-date table.
    pub reported: u64,
    /// Total derived from the fact table.
    pub derived: u64,
}

/// Comparison of derived monthly totals with one count-by-date table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountReconciliation {
    /// `"crashes"` or `"fatalities"`.
    pub measure: &'static str,
    pub periods_checked: usize,
    pub mismatches: Vec<PeriodMismatch>,
}

/// Everything the audit found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub load: LoadStats,
    /// Row count per output table.
    pub table_rows: BTreeMap<&'static str, usize>,
    pub orphans: Vec<OrphanReport>,
    pub key_decode_errors: Vec<KeyDecodeError>,
    pub cardinality_violations: Vec<CardinalityViolation>,
    pub driver_count_mismatches: Vec<DriverCountMismatch>,
    /// Remoteness areas without a reference population.
    pub unmatched_remoteness_areas: usize,
    /// LGAs without a reference population.
    pub unmatched_lgas: usize,
    pub count_reconciliation: Vec<CountReconciliation>,
}

impl IntegrityReport {
    /// Whether any referential problem was found.
    #[must_use]
    pub fn has_violations(&self) -> bool {
        self.orphans.iter().any(|o| o.orphan_count > 0)
            || !self.cardinality_violations.is_empty()
            || !self.driver_count_mismatches.is_empty()
    }
}

/// Inputs of the audit.
#[derive(Debug, Clone, Copy)]
pub struct AuditInput<'a> {
    pub dimensions: &'a Dimensions,
    pub population: &'a [PopulationRow],
    pub lga: &'a [LgaRow],
    pub facts: &'a FactAssembly,
    pub crash_counts: Option<&'a [DailyCountRecord]>,
    pub fatality_counts: Option<&'a [DailyCountRecord]>,
    pub load: LoadStats,
    pub sample_size: usize,
}

fn sample(ids: impl IntoIterator<Item = CrashId>, size: usize) -> Vec<CrashId> {
    let sorted: BTreeSet<CrashId> = ids.into_iter().collect();
    sorted.into_iter().take(size).collect()
}

/// Fact crash identifiers missing from a dimension.
#[must_use]
pub fn find_orphans<T>(
    dimension: &'static str,
    facts: &[FactRow],
    rows: &[T],
    crash_id: impl Fn(&T) -> CrashId,
    sample_size: usize,
) -> OrphanReport {
    let present: BTreeSet<CrashId> = rows.iter().map(crash_id).collect();
    let orphans: BTreeSet<CrashId> = facts
        .iter()
        .map(|f| f.crash_id)
        .filter(|id| !present.contains(id))
        .collect();

    OrphanReport {
        dimension,
        orphan_count: orphans.len(),
        sample: sample(orphans, sample_size),
    }
}

/// Crash identifiers with more than one row in a dimension that the fact
/// table joins 1:1.
#[must_use]
pub fn check_cardinality<T>(
    dimension: &'static str,
    rows: &[T],
    crash_id: impl Fn(&T) -> CrashId,
    sample_size: usize,
) -> Option<CardinalityViolation> {
    let repeated: Vec<CrashId> = rows_per_crash(rows, crash_id)
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, _)| id)
        .collect();

    if repeated.is_empty() {
        return None;
    }

    Some(CardinalityViolation {
        dimension,
        crash_count: repeated.len(),
        sample: sample(repeated, sample_size),
    })
}

/// Fact rows whose `driver_count` differs from the Driver dimension.
#[must_use]
pub fn check_driver_counts(dimensions: &Dimensions, facts: &[FactRow]) -> Vec<DriverCountMismatch> {
    let drivers = rows_per_crash(&dimensions.driver, |d| d.crash_id);
    facts
        .iter()
        .filter_map(|f| {
            let driver_rows = drivers.get(&f.crash_id).copied().unwrap_or(0);
            (driver_rows != f.driver_count).then_some(DriverCountMismatch {
                crash_id: f.crash_id,
                driver_count: f.driver_count,
                driver_rows,
            })
        })
        .collect()
}

/// Compares derived monthly totals with a count-by-date table.
///
/// Only months that appear in the count table are checked.
#[must_use]
pub fn reconcile_counts(
    measure: &'static str,
    counts: &[DailyCountRecord],
    totals: &PeriodTotals,
    measure_of: impl Fn(&Totals) -> u64,
) -> CountReconciliation {
    let mut reported: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    for record in counts {
        *reported.entry((record.year, record.month)).or_insert(0) += record.count;
    }

    let mismatches: Vec<PeriodMismatch> = reported
        .iter()
        .filter_map(|(&(year, month), &reported)| {
            let derived = totals.monthly.get(&(year, month)).map_or(0, &measure_of);
            (derived != reported).then_some(PeriodMismatch {
                year,
                month,
                reported,
                derived,
            })
        })
        .collect();

    CountReconciliation {
        measure,
        periods_checked: reported.len(),
        mismatches,
    }
}

/// Runs every check.
#[must_use]
pub fn audit(input: &AuditInput<'_>) -> IntegrityReport {
    let dims = input.dimensions;
    let facts = &input.facts.rows;
    let n = input.sample_size;

    let orphans = vec![
        find_orphans(LocationRow::NAME, facts, &dims.location, |r| r.crash_id, n),
        find_orphans(VehicleRow::NAME, facts, &dims.vehicle, |r| r.crash_id, n),
        find_orphans(RoadConditionRow::NAME, facts, &dims.road_condition, |r| r.crash_id, n),
        find_orphans(TimeRow::NAME, facts, &dims.time, |r| r.crash_id, n),
        find_orphans(CrashTypeRow::NAME, facts, &dims.crash_type, |r| r.crash_id, n),
    ];

    let cardinality_violations: Vec<CardinalityViolation> = [
        check_cardinality(LocationRow::NAME, &dims.location, |r| r.crash_id, n),
        check_cardinality(VehicleRow::NAME, &dims.vehicle, |r| r.crash_id, n),
        check_cardinality(RoadConditionRow::NAME, &dims.road_condition, |r| r.crash_id, n),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut count_reconciliation = Vec::new();
    if let Some(counts) = input.crash_counts {
        count_reconciliation.push(reconcile_counts(
            "crashes",
            counts,
            &input.facts.totals,
            |t| t.crashes,
        ));
    }
    if let Some(counts) = input.fatality_counts {
        count_reconciliation.push(reconcile_counts(
            "fatalities",
            counts,
            &input.facts.totals,
            |t| t.fatalities,
        ));
    }

    let table_rows = BTreeMap::from([
        (LocationRow::NAME, dims.location.len()),
        (VehicleRow::NAME, dims.vehicle.len()),
        (RoadConditionRow::NAME, dims.road_condition.len()),
        (DriverRow::NAME, dims.driver.len()),
        (TimeRow::NAME, dims.time.len()),
        (CrashTypeRow::NAME, dims.crash_type.len()),
        (SeasonRow::NAME, dims.season.len()),
        (PopulationRow::NAME, input.population.len()),
        (LgaRow::NAME, input.lga.len()),
        (FactRow::NAME, facts.len()),
    ]);

    let report = IntegrityReport {
        load: input.load,
        table_rows,
        orphans,
        key_decode_errors: input.facts.key_errors.clone(),
        cardinality_violations,
        driver_count_mismatches: check_driver_counts(dims, facts),
        unmatched_remoteness_areas: input
            .population
            .iter()
            .filter(|p| p.data_source == DataSource::Derived)
            .count(),
        unmatched_lgas: input
            .lga
            .iter()
            .filter(|l| l.data_source == DataSource::Derived)
            .count(),
        count_reconciliation,
    };

    log_report(&report);
    report
}

fn log_report(report: &IntegrityReport) {
    for orphan in report.orphans.iter().filter(|o| o.orphan_count > 0) {
        log::warn!(
            "{} fact rows have no {} row (e.g. {:?})",
            orphan.orphan_count,
            orphan.dimension,
            orphan.sample
        );
    }
    for violation in &report.cardinality_violations {
        log::warn!(
            "{}: {} crash ids have more than one row; the crash-id stand-in key is not 1:1 (e.g. {:?})",
            violation.dimension,
            violation.crash_count,
            violation.sample
        );
    }
    if !report.driver_count_mismatches.is_empty() {
        log::warn!(
            "{} fact rows disagree with the driver dimension on driver_count",
            report.driver_count_mismatches.len()
        );
    }
    if !report.key_decode_errors.is_empty() {
        log::warn!(
            "{} crash ids did not decode to a year and state",
            report.key_decode_errors.len()
        );
    }
    for reconciliation in &report.count_reconciliation {
        log::info!(
            "Reconciled {} against count table: {} of {} months differ",
            reconciliation.measure,
            reconciliation.mismatches.len(),
            reconciliation.periods_checked
        );
    }
    if !report.has_violations() {
        log::info!("Integrity audit found no referential violations");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::tests::crash;
    use crate::fact::assemble_facts;

    fn build(crashes: &[road_toll_crash_models::RawCrashRecord]) -> (Dimensions, FactAssembly) {
        let dimensions = Dimensions::extract(crashes, &[]);
        let facts = assemble_facts(crashes, &dimensions, &[], &[]);
        (dimensions, facts)
    }

    fn input<'a>(dimensions: &'a Dimensions, facts: &'a FactAssembly) -> AuditInput<'a> {
        AuditInput {
            dimensions,
            population: &[],
            lga: &[],
            facts,
            crash_counts: None,
            fatality_counts: None,
            load: LoadStats::default(),
            sample_size: 5,
        }
    }

    #[test]
    fn clean_tables_have_no_violations() {
        let (dimensions, facts) = build(&[crash(20_101_001, 2010, 1), crash(20_101_002, 2010, 2)]);
        let report = audit(&input(&dimensions, &facts));
        assert!(!report.has_violations());
        assert!(report.orphans.iter().all(|o| o.orphan_count == 0));
        assert_eq!(report.table_rows[FactRow::NAME], 2);
    }

    #[test]
    fn reports_exactly_one_location_orphan() {
        let (mut dimensions, facts) =
            build(&[crash(20_101_001, 2010, 1), crash(20_101_002, 2010, 2)]);
        dimensions
            .location
            .retain(|l| l.crash_id != CrashId(20_101_002));

        let report = audit(&input(&dimensions, &facts));
        let location = report
            .orphans
            .iter()
            .find(|o| o.dimension == LocationRow::NAME)
            .unwrap();
        assert_eq!(location.orphan_count, 1);
        assert_eq!(location.sample, vec![CrashId(20_101_002)]);
        assert!(report
            .orphans
            .iter()
            .filter(|o| o.dimension != LocationRow::NAME)
            .all(|o| o.orphan_count == 0));
    }

    #[test]
    fn detects_multi_valued_stand_in_keys() {
        let first = crash(20_101_001, 2010, 1);
        let mut second = first.clone();
        second.speed_limit = Some("60".to_owned());
        let (dimensions, facts) = build(&[first, second]);

        let report = audit(&input(&dimensions, &facts));
        assert_eq!(report.cardinality_violations.len(), 1);
        assert_eq!(
            report.cardinality_violations[0].dimension,
            RoadConditionRow::NAME
        );
    }

    #[test]
    fn detects_driver_count_mismatch() {
        let (dimensions, mut facts) = build(&[crash(20_101_001, 2010, 1)]);
        facts.rows[0].driver_count = 3;
        let mismatches = check_driver_counts(&dimensions, &facts.rows);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].driver_rows, 0);
    }

    #[test]
    fn reconciles_monthly_counts() {
        let (_, facts) = build(&[
            crash(20_101_001, 2010, 1),
            crash(20_101_002, 2010, 1),
            crash(20_101_003, 2010, 2),
        ]);
        let counts = vec![
            DailyCountRecord { year: 2010, month: 1, count: 1 },
            DailyCountRecord { year: 2010, month: 1, count: 1 },
            DailyCountRecord { year: 2010, month: 2, count: 4 },
        ];
        let result = reconcile_counts("crashes", &counts, &facts.totals, |t| t.crashes);
        assert_eq!(result.periods_checked, 2);
        assert_eq!(
            result.mismatches,
            vec![PeriodMismatch {
                year: 2010,
                month: 2,
                reported: 4,
                derived: 1,
            }]
        );
    }
}
