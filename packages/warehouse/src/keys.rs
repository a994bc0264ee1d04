//! Key synthesis.
//!
//! The crash identifier is the only natural key. Year and jurisdiction are
//! read from it through [`CrashId::decode_checked`]; the period keys are
//! built from the decoded year and the record month; the sub-dimension keys
//! reuse the crash identifier itself.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr as _;

use chrono::NaiveDate;
use road_toll_crash_models::{CrashId, Jurisdiction, KeyDecodeError, RawCrashRecord};
use road_toll_warehouse_models::{LocationRow, period_id};

/// Keys derived from one crash record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrashKeys {
    /// Year read from the identifier. `None` when decoding failed or the
    /// identifier disagrees with the record's year.
    pub year: Option<i32>,
    /// Jurisdiction read from the identifier.
    pub state: Option<Jurisdiction>,
    /// Calendar month from the record.
    pub month: u32,
}

impl CrashKeys {
    /// Decodes the keys of a crash record.
    ///
    /// A failed decode degrades `year` and `state` to `None` and hands the
    /// error back for the integrity report.
    #[must_use]
    pub fn decode(crash: &RawCrashRecord) -> (Self, Option<KeyDecodeError>) {
        match crash.crash_id.decode_checked(crash.year) {
            Ok(decoded) => (
                Self {
                    year: Some(decoded.year),
                    state: decoded.state,
                    month: crash.month,
                },
                None,
            ),
            Err(e) => {
                log::warn!("{e}");
                (
                    Self {
                        year: None,
                        state: None,
                        month: crash.month,
                    },
                    Some(e),
                )
            }
        }
    }

    /// `year * 100 + month`, shared by `time_id` and `season_id`.
    #[must_use]
    pub fn period_id(&self) -> Option<u32> {
        self.year.and_then(|year| period_id(year, self.month))
    }

    /// Coarse `year-01-01` anchor.
    #[must_use]
    pub fn crash_date(&self) -> Option<NaiveDate> {
        self.year.and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
    }
}

/// Crash identifiers present in a dimension keyed by crash identifier.
///
/// Used for the stand-in keys: a fact row's `vehicle_id` (and friends) is
/// its own crash identifier when the dimension has a row for it.
#[derive(Debug, Clone, Default)]
pub struct StandInKeys(BTreeSet<CrashId>);

impl StandInKeys {
    pub fn collect<T>(rows: &[T], crash_id: impl Fn(&T) -> CrashId) -> Self {
        Self(rows.iter().map(crash_id).collect())
    }

    #[must_use]
    pub fn key(&self, crash_id: CrashId) -> Option<CrashId> {
        self.0.contains(&crash_id).then_some(crash_id)
    }
}

/// Jurisdictions present in the Location dimension.
///
/// `location_id` is the jurisdiction code of the fact's state when the
/// Location dimension has at least one row in that state.
#[derive(Debug, Clone, Default)]
pub struct LocationKeys(BTreeSet<Jurisdiction>);

impl LocationKeys {
    #[must_use]
    pub fn collect(locations: &[LocationRow]) -> Self {
        Self(
            locations
                .iter()
                .filter_map(|l| l.state.as_deref())
                .filter_map(|s| Jurisdiction::from_str(s.trim()).ok())
                .collect(),
        )
    }

    #[must_use]
    pub fn key(&self, state: Option<Jurisdiction>) -> Option<u8> {
        state.filter(|s| self.0.contains(s)).map(Jurisdiction::code)
    }
}

/// Number of rows per crash identifier in a dimension.
#[must_use]
pub fn rows_per_crash<T>(rows: &[T], crash_id: impl Fn(&T) -> CrashId) -> BTreeMap<CrashId, u64> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(crash_id(row)).or_insert(0) += 1;
    }
    counts
}
