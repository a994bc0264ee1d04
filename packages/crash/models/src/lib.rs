#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crash identifier, jurisdiction table, and raw road-fatality record types.
//!
//! Every crash in the fatality database is identified by a [`CrashId`]. The
//! leading digits of the identifier pack the crash year and jurisdiction;
//! [`CrashId::decode`] is the only place that knowledge lives.

pub mod calendar;
pub mod jurisdiction;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use jurisdiction::Jurisdiction;

/// Natural key of one fatal crash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CrashId(pub u64);

impl std::fmt::Display for CrashId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CrashId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// Year and jurisdiction packed into a [`CrashId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedCrashId {
    /// First four digits of the identifier.
    pub year: i32,
    /// Fifth digit mapped through the jurisdiction table. `None` when the
    /// digit is not one of the eight jurisdiction codes.
    pub state: Option<Jurisdiction>,
}

impl CrashId {
    /// Decodes the year and jurisdiction packed into the identifier.
    ///
    /// An unmapped jurisdiction digit is not an error; it decodes to a
    /// `None` state.
    ///
    /// # Errors
    ///
    /// Returns [`KeyDecodeError::TooShort`] if the identifier has fewer
    /// than five digits.
    pub fn decode(self) -> Result<DecodedCrashId, KeyDecodeError> {
        let digits = self.0.to_string();
        let state_digit = digits.get(4..).and_then(|rest| rest.chars().next());
        let (Some(year_digits), Some(state_digit)) = (digits.get(..4), state_digit) else {
            return Err(KeyDecodeError::TooShort { crash_id: self });
        };

        let year = year_digits
            .parse::<i32>()
            .map_err(|_| KeyDecodeError::TooShort { crash_id: self })?;

        Ok(DecodedCrashId {
            year,
            state: Jurisdiction::from_code_digit(state_digit),
        })
    }

    /// Decodes the identifier and checks the encoded year against the year
    /// recorded on the source row.
    ///
    /// # Errors
    ///
    /// Returns [`KeyDecodeError`] if decoding fails or the years disagree.
    pub fn decode_checked(self, recorded_year: i32) -> Result<DecodedCrashId, KeyDecodeError> {
        let decoded = self.decode()?;
        if decoded.year != recorded_year {
            return Err(KeyDecodeError::YearMismatch {
                crash_id: self,
                encoded: decoded.year,
                recorded: recorded_year,
            });
        }
        Ok(decoded)
    }
}

/// A crash identifier that could not be decoded into a valid year/state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyDecodeError {
    /// Fewer than five digits; no year/jurisdiction can be read.
    TooShort {
        /// Offending identifier.
        crash_id: CrashId,
    },
    /// The encoded year differs from the record's `year` column.
    YearMismatch {
        /// Offending identifier.
        crash_id: CrashId,
        /// Year read from the identifier.
        encoded: i32,
        /// Year on the source row.
        recorded: i32,
    },
}

impl KeyDecodeError {
    /// Returns the identifier that failed to decode.
    #[must_use]
    pub const fn crash_id(&self) -> CrashId {
        match self {
            Self::TooShort { crash_id } | Self::YearMismatch { crash_id, .. } => *crash_id,
        }
    }
}

impl std::fmt::Display for KeyDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { crash_id } => {
                write!(f, "crash id {crash_id} is too short to carry a year and state")
            }
            Self::YearMismatch {
                crash_id,
                encoded,
                recorded,
            } => write!(
                f,
                "crash id {crash_id} encodes year {encoded} but the record says {recorded}"
            ),
        }
    }
}

impl std::error::Error for KeyDecodeError {}

/// ABS remoteness classes, as named in the reference tables.
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
pub enum RemotenessCategory {
    /// Major Cities of Australia
    #[strum(serialize = "Major Cities")]
    #[serde(rename = "Major Cities")]
    MajorCities,
    /// Inner Regional Australia
    #[strum(serialize = "Inner Regional")]
    #[serde(rename = "Inner Regional")]
    InnerRegional,
    /// Outer Regional Australia
    #[strum(serialize = "Outer Regional")]
    #[serde(rename = "Outer Regional")]
    OuterRegional,
    /// Remote Australia
    Remote,
    /// Very Remote Australia
    #[strum(serialize = "Very Remote")]
    #[serde(rename = "Very Remote")]
    VeryRemote,
}

impl RemotenessCategory {
    /// Returns all categories in reference-table order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::MajorCities,
            Self::InnerRegional,
            Self::OuterRegional,
            Self::Remote,
            Self::VeryRemote,
        ]
    }

    /// Returns the category token as written in the reference tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MajorCities => "Major Cities",
            Self::InnerRegional => "Inner Regional",
            Self::OuterRegional => "Outer Regional",
            Self::Remote => "Remote",
            Self::VeryRemote => "Very Remote",
        }
    }

    /// Returns the most specific category whose label occurs in `text`.
    ///
    /// `"Very Remote"` wins over `"Remote"` on a line containing both.
    #[must_use]
    pub fn find_in(text: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|c| text.contains(c.label()))
            .max_by_key(|c| c.label().len())
    }
}

/// Heavy-vehicle classification of a crash.
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
pub enum VehicleCategory {
    /// An articulated truck was involved
    #[strum(serialize = "Articulated Truck")]
    #[serde(rename = "Articulated Truck")]
    ArticulatedTruck,
    /// A heavy rigid truck was involved
    #[strum(serialize = "Heavy Rigid Truck")]
    #[serde(rename = "Heavy Rigid Truck")]
    HeavyRigidTruck,
    /// A bus was involved
    Bus,
    /// No heavy vehicle flagged
    Other,
}

impl VehicleCategory {
    /// Classifies a crash from its involvement flags.
    ///
    /// A crash can carry several flags at once; the first true flag in the
    /// order articulated truck, heavy rigid truck, bus wins.
    #[must_use]
    pub const fn classify(
        articulated_truck: Option<bool>,
        heavy_rigid_truck: Option<bool>,
        bus: Option<bool>,
    ) -> Self {
        if matches!(articulated_truck, Some(true)) {
            Self::ArticulatedTruck
        } else if matches!(heavy_rigid_truck, Some(true)) {
            Self::HeavyRigidTruck
        } else if matches!(bus, Some(true)) {
            Self::Bus
        } else {
            Self::Other
        }
    }
}

/// One row of the fatal-crash table after normalization and filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCrashRecord {
    /// Natural key.
    pub crash_id: CrashId,
    /// Jurisdiction as written in the source (e.g. `"Vic"`).
    pub state: Option<String>,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Calendar year, inside the configured window.
    pub year: i32,
    /// First day of the crash month.
    pub date: NaiveDate,
    /// Day of week name (e.g. `"Friday"`).
    pub dayweek: Option<String>,
    /// Time of crash, standardized to `HH:MM`.
    pub time: Option<String>,
    /// Single or multiple vehicle.
    pub crash_type: Option<String>,
    /// Persons killed; `None` when missing upstream.
    pub number_fatalities: Option<u32>,
    /// Bus involvement flag.
    pub bus_involvement: Option<bool>,
    /// Heavy rigid truck involvement flag.
    pub heavy_rigid_truck_involvement: Option<bool>,
    /// Articulated truck involvement flag.
    pub articulated_truck_involvement: Option<bool>,
    /// Posted speed limit (free text; may be e.g. `"<40"`).
    pub speed_limit: Option<String>,
    /// National road type classification.
    pub national_road_type: Option<String>,
    /// Remoteness area text (e.g. `"Inner Regional Australia"`).
    pub national_remoteness_areas: Option<String>,
    /// SA4 region name.
    pub sa4_name: Option<String>,
    /// Local government area name.
    pub national_lga_name: Option<String>,
    /// `"Yes"`/`"No"`.
    pub christmas_period: Option<String>,
    /// `"Yes"`/`"No"`.
    pub easter_period: Option<String>,
    /// `"Weekday"`/`"Weekend"`.
    pub day_of_week: Option<String>,
    /// `"Day"`/`"Night"`.
    pub time_of_day: Option<String>,
}

/// One person killed in a crash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFatalityRecord {
    /// Crash the person died in.
    pub crash_id: CrashId,
    /// Calendar year of the crash.
    pub year: i32,
    /// Driver, passenger, pedestrian, ...
    pub road_user: Option<String>,
    /// Gender as recorded.
    pub gender: Option<String>,
    /// Age in years.
    pub age: Option<u32>,
    /// Age band label (e.g. `"17_to_25"`).
    pub age_group: Option<String>,
}

/// One row of a count-by-date table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCountRecord {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Count for the day.
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_year_and_state() {
        let decoded = CrashId(20_102_045).decode().unwrap();
        assert_eq!(decoded.year, 2010);
        assert_eq!(decoded.state, Some(Jurisdiction::Vic));
    }

    #[test]
    fn unmapped_state_digit_is_not_an_error() {
        let decoded = CrashId(20_109_001).decode().unwrap();
        assert_eq!(decoded.year, 2010);
        assert_eq!(decoded.state, None);
    }

    #[test]
    fn short_id_fails_to_decode() {
        let err = CrashId(2010).decode().unwrap_err();
        assert_eq!(err, KeyDecodeError::TooShort { crash_id: CrashId(2010) });
        assert_eq!(err.crash_id(), CrashId(2010));
    }

    #[test]
    fn decode_checked_rejects_year_mismatch() {
        let err = CrashId(20_111_001).decode_checked(2010).unwrap_err();
        assert!(matches!(
            err,
            KeyDecodeError::YearMismatch {
                encoded: 2011,
                recorded: 2010,
                ..
            }
        ));
        assert!(CrashId(20_111_001).decode_checked(2011).is_ok());
    }

    #[test]
    fn parses_crash_id_with_whitespace() {
        let id: CrashId = " 20231001 ".parse().unwrap();
        assert_eq!(id, CrashId(20_231_001));
        assert!("2023A001".parse::<CrashId>().is_err());
    }

    #[test]
    fn articulated_truck_beats_bus() {
        assert_eq!(
            VehicleCategory::classify(Some(true), None, Some(true)),
            VehicleCategory::ArticulatedTruck
        );
        assert_eq!(
            VehicleCategory::classify(Some(false), Some(true), Some(true)),
            VehicleCategory::HeavyRigidTruck
        );
        assert_eq!(
            VehicleCategory::classify(None, Some(false), Some(true)),
            VehicleCategory::Bus
        );
        assert_eq!(
            VehicleCategory::classify(None, None, None),
            VehicleCategory::Other
        );
        assert_eq!(VehicleCategory::ArticulatedTruck.to_string(), "Articulated Truck");
    }

    #[test]
    fn very_remote_wins_over_remote() {
        assert_eq!(
            RemotenessCategory::find_in("Very Remote Australia,1234"),
            Some(RemotenessCategory::VeryRemote)
        );
        assert_eq!(
            RemotenessCategory::find_in("Remote Australia,99"),
            Some(RemotenessCategory::Remote)
        );
        assert_eq!(RemotenessCategory::find_in("Total"), None);
    }
}
