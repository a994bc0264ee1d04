//! Missing-age repair for the Driver dimension.
//!
//! A missing age is replaced by the median of the known ages in the same
//! age group. Rows without a usable group, or whose group has no known
//! ages, fall back to the median of every known age in the table. Medians
//! are computed from the table as given, before any row is filled.

use std::collections::BTreeMap;

use road_toll_warehouse_models::DriverRow;

/// Median of a list of values, averaging the middle pair for even lengths.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Whether an age-group label names an actual group.
fn usable_group(label: Option<&str>) -> Option<&str> {
    label.filter(|l| !l.eq_ignore_ascii_case("unknown"))
}

/// Counts of what [`repair_ages`] filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgeRepair {
    /// Ages filled from the row's own age group.
    pub from_group: usize,
    /// Ages filled from the table-wide median.
    pub from_global: usize,
    /// Ages left missing because the table has no known ages at all.
    pub unresolved: usize,
}

/// Fills missing driver ages in place.
pub fn repair_ages(rows: &mut [DriverRow]) -> AgeRepair {
    let mut by_group: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    let mut all_known = Vec::new();

    for row in rows.iter() {
        if let Some(age) = row.age {
            all_known.push(age);
            if let Some(group) = usable_group(row.age_group.as_deref()) {
                by_group.entry(group).or_default().push(age);
            }
        }
    }

    let group_medians: BTreeMap<String, f64> = by_group
        .into_iter()
        .filter_map(|(group, ages)| median(&ages).map(|m| (group.to_owned(), m)))
        .collect();
    let global_median = median(&all_known);

    let mut repair = AgeRepair::default();

    for row in rows.iter_mut().filter(|r| r.age.is_none()) {
        let group_median = usable_group(row.age_group.as_deref())
            .and_then(|group| group_medians.get(group).copied());

        if let Some(age) = group_median {
            row.age = Some(age);
            repair.from_group += 1;
        } else if let Some(age) = global_median {
            row.age = Some(age);
            repair.from_global += 1;
        } else {
            repair.unresolved += 1;
        }
    }

    if repair.from_group + repair.from_global + repair.unresolved > 0 {
        log::info!(
            "Repaired driver ages: {} from age group, {} from overall median, {} unresolved",
            repair.from_group,
            repair.from_global,
            repair.unresolved
        );
    }

    repair
}

#[cfg(test)]
mod tests {
    use road_toll_crash_models::CrashId;

    use super::*;

    fn driver(age: Option<f64>, group: Option<&str>) -> DriverRow {
        DriverRow {
            driver_id: 0,
            crash_id: CrashId(20_101_001),
            road_user: Some("Driver".to_owned()),
            gender: Some("Male".to_owned()),
            age,
            age_group: group.map(str::to_owned),
        }
    }

    #[test]
    fn fills_from_group_median() {
        let mut rows = vec![
            driver(Some(20.0), Some("17_to_25")),
            driver(Some(22.0), Some("17_to_25")),
            driver(Some(24.0), Some("17_to_25")),
            driver(None, Some("17_to_25")),
            driver(Some(70.0), Some("65_to_74")),
        ];
        let repair = repair_ages(&mut rows);
        assert_eq!(rows[3].age, Some(22.0));
        assert_eq!(repair.from_group, 1);
    }

    #[test]
    fn falls_back_to_global_median() {
        let mut rows = vec![
            driver(Some(30.0), Some("26_to_39")),
            driver(Some(50.0), Some("40_to_64")),
            driver(None, None),
            driver(None, Some("75_or_older")),
            driver(None, Some("Unknown")),
        ];
        let repair = repair_ages(&mut rows);
        assert_eq!(rows[2].age, Some(40.0));
        assert_eq!(rows[3].age, Some(40.0));
        assert_eq!(rows[4].age, Some(40.0));
        assert_eq!(repair.from_global, 3);
    }

    #[test]
    fn no_known_ages_leaves_rows_missing() {
        let mut rows = vec![driver(None, Some("17_to_25"))];
        let repair = repair_ages(&mut rows);
        assert_eq!(rows[0].age, None);
        assert_eq!(repair.unresolved, 1);
    }

    #[test]
    fn medians() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }
}
