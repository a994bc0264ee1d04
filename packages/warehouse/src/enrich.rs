//! Reference enrichment.
//!
//! Resolves the free-text remoteness and LGA names found in the crash data
//! against the parsed population references. An unmatched name is never an
//! error: it becomes a [`DataSource::Derived`] entry with no population so
//! joins downstream still find a row.

use std::collections::BTreeSet;

use road_toll_crash_models::Jurisdiction;
use road_toll_source::reference::{LgaReferenceRow, RemotenessReferenceRow};
use road_toll_warehouse_models::{DataSource, LgaRow, LocationRow, PopulationRow, UNKNOWN};

/// Which matching rule resolved an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRule {
    /// Area name equals the reference name.
    Exact,
    /// Reference name occurs inside the area name.
    Contains,
    /// Both the reference class label and jurisdiction label occur inside
    /// the area name.
    CategoryAndState,
}

/// Resolves a crash-data remoteness area against the reference.
///
/// Rules are tried in [`MatchRule`] order across the whole reference before
/// moving to the next rule. Exact and contains matches take the first
/// reference row in reference order. The category-and-state fallback can
/// hit several rows; the longest class label wins (so `"Very Remote"` beats
/// `"Remote"`), then reference order.
#[must_use]
pub fn match_remoteness<'a>(
    area: &str,
    reference: &'a [RemotenessReferenceRow],
) -> Option<(&'a RemotenessReferenceRow, MatchRule)> {
    if let Some(row) = reference.iter().find(|r| r.area_name == area) {
        return Some((row, MatchRule::Exact));
    }
    if let Some(row) = reference.iter().find(|r| area.contains(r.area_name.as_str())) {
        return Some((row, MatchRule::Contains));
    }

    reference
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            area.contains(r.category.label()) && area.contains(r.state.reference_label())
        })
        .min_by_key(|(i, r)| (std::cmp::Reverse(r.category.label().len()), *i))
        .map(|(_, r)| (r, MatchRule::CategoryAndState))
}

/// Resolves a crash-data LGA name against the reference.
///
/// An exact name match wins; otherwise the first reference row whose name
/// contains the crash-data name.
#[must_use]
pub fn match_lga<'a>(name: &str, reference: &'a [LgaReferenceRow]) -> Option<&'a LgaReferenceRow> {
    reference
        .iter()
        .find(|r| r.name == name)
        .or_else(|| reference.iter().find(|r| r.name.contains(name)))
}

/// Distinct values in first-seen order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

/// Builds the Population dimension: one row per distinct remoteness area
/// in the Location dimension.
#[must_use]
pub fn build_population_dimension(
    locations: &[LocationRow],
    reference: &[RemotenessReferenceRow],
) -> Vec<PopulationRow> {
    let areas = distinct(
        locations
            .iter()
            .filter_map(|l| l.national_remoteness_areas.as_deref()),
    );

    let rows: Vec<PopulationRow> = areas
        .into_iter()
        .map(|area| {
            let matched = match_remoteness(area, reference);
            if let Some((row, rule)) = matched {
                log::debug!("Remoteness area '{area}' matched '{}' ({rule:?})", row.area_name);
            } else {
                log::debug!("Remoteness area '{area}' has no reference population");
            }

            PopulationRow {
                remoteness_area: area.to_owned(),
                state: Jurisdiction::find_in(area),
                population: matched.map(|(row, _)| row.population),
                data_source: if matched.is_some() {
                    DataSource::ReferenceData
                } else {
                    DataSource::Derived
                },
            }
        })
        .collect();

    let derived = rows
        .iter()
        .filter(|r| r.data_source == DataSource::Derived)
        .count();
    if derived > 0 {
        log::warn!("{derived} of {} remoteness areas have no reference population", rows.len());
    }

    rows
}

/// Builds the LGA dimension: one row per distinct LGA name in the Location
/// dimension. The [`UNKNOWN`] placeholder is skipped.
#[must_use]
pub fn build_lga_dimension(locations: &[LocationRow], reference: &[LgaReferenceRow]) -> Vec<LgaRow> {
    let names = distinct(
        locations
            .iter()
            .map(|l| l.national_lga_name.as_str())
            .filter(|name| *name != UNKNOWN),
    );

    let rows: Vec<LgaRow> = names
        .into_iter()
        .map(|name| {
            let matched = match_lga(name, reference);
            LgaRow {
                lga_name: name.to_owned(),
                population: matched.map(|r| r.population),
                data_source: if matched.is_some() {
                    DataSource::ReferenceData
                } else {
                    DataSource::Derived
                },
            }
        })
        .collect();

    let derived = rows
        .iter()
        .filter(|r| r.data_source == DataSource::Derived)
        .count();
    if derived > 0 {
        log::warn!("{derived} of {} LGAs have no reference population", rows.len());
    }

    rows
}

#[cfg(test)]
mod tests {
    use road_toll_crash_models::{CrashId, RemotenessCategory};
    use road_toll_source::reference::remoteness::area_name;

    use super::*;

    fn reference_row(
        state: Jurisdiction,
        category: RemotenessCategory,
        population: f64,
    ) -> RemotenessReferenceRow {
        RemotenessReferenceRow {
            state,
            category,
            area_name: area_name(category, state),
            population,
        }
    }

    fn custom_row(area_name: &str, population: f64) -> RemotenessReferenceRow {
        RemotenessReferenceRow {
            state: Jurisdiction::Nsw,
            category: RemotenessCategory::MajorCities,
            area_name: area_name.to_owned(),
            population,
        }
    }

    fn location(id: u64, area: Option<&str>, lga: &str) -> LocationRow {
        LocationRow {
            crash_id: CrashId(id),
            state: Some("NSW".to_owned()),
            national_remoteness_areas: area.map(str::to_owned),
            sa4_name: UNKNOWN.to_owned(),
            national_lga_name: lga.to_owned(),
        }
    }

    #[test]
    fn exact_match_beats_earlier_substring_match() {
        let reference = vec![
            custom_row("Major Cities", 1.0),
            custom_row("Major Cities of Australia", 2.0),
        ];
        let (row, rule) = match_remoteness("Major Cities of Australia", &reference).unwrap();
        assert_eq!(rule, MatchRule::Exact);
        assert!((row.population - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn substring_match_when_no_exact() {
        let reference = vec![custom_row("Inner Regional", 7.0)];
        let (_, rule) = match_remoteness("Inner Regional Australia", &reference).unwrap();
        assert_eq!(rule, MatchRule::Contains);
    }

    #[test]
    fn category_and_state_fallback_prefers_longest_category() {
        let reference = vec![
            reference_row(Jurisdiction::Wa, RemotenessCategory::Remote, 10.0),
            reference_row(Jurisdiction::Wa, RemotenessCategory::VeryRemote, 20.0),
        ];
        let (row, rule) = match_remoteness("Very Remote WA", &reference).unwrap();
        assert_eq!(rule, MatchRule::CategoryAndState);
        assert_eq!(row.category, RemotenessCategory::VeryRemote);
    }

    #[test]
    fn unmatched_area_is_derived() {
        let reference = vec![reference_row(Jurisdiction::Nsw, RemotenessCategory::MajorCities, 5.0)];
        let locations = vec![
            location(1, Some("Outer Regional Australia"), "Sydney"),
            location(2, Some("Major Cities Australia (NSW)"), "Sydney"),
            location(3, Some("Outer Regional Australia"), "Sydney"),
            location(4, None, "Sydney"),
        ];
        let rows = build_population_dimension(&locations, &reference);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].data_source, DataSource::Derived);
        assert_eq!(rows[0].population, None);
        assert_eq!(rows[1].data_source, DataSource::ReferenceData);
        assert_eq!(rows[1].state, Some(Jurisdiction::Nsw));
    }

    #[test]
    fn lga_matching_skips_unknown_and_uses_containment() {
        let reference = vec![
            LgaReferenceRow {
                code: "10050".to_owned(),
                name: "Albury (C)".to_owned(),
                population: 56_093.0,
            },
            LgaReferenceRow {
                code: "17200".to_owned(),
                name: "Sydney (C)".to_owned(),
                population: 200_000.0,
            },
        ];
        let locations = vec![
            location(1, None, "Sydney"),
            location(2, None, UNKNOWN),
            location(3, None, "Nowhere"),
        ];
        let rows = build_lga_dimension(&locations, &reference);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].lga_name, "Sydney");
        assert_eq!(rows[0].population, Some(200_000.0));
        assert_eq!(rows[1].data_source, DataSource::Derived);
    }

    #[test]
    fn lga_exact_match_wins() {
        let reference = vec![
            LgaReferenceRow {
                code: "1".to_owned(),
                name: "Sydney (C) North".to_owned(),
                population: 1.0,
            },
            LgaReferenceRow {
                code: "2".to_owned(),
                name: "Sydney (C)".to_owned(),
                population: 2.0,
            },
        ];
        assert_eq!(match_lga("Sydney (C)", &reference).unwrap().code, "2");
    }
}
