//! Australian jurisdiction table.
//!
//! The fifth digit of a crash identifier is a jurisdiction code in `1..=8`.
//! This module owns the mapping between that digit, the upper-case
//! abbreviation used in derived tables, and the mixed-case label used by
//! the ABS remoteness reference tables.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the eight Australian states and territories.
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
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Jurisdiction {
    /// New South Wales (code 1)
    Nsw,
    /// Victoria (code 2)
    Vic,
    /// Queensland (code 3)
    Qld,
    /// South Australia (code 4)
    Sa,
    /// Western Australia (code 5)
    Wa,
    /// Tasmania (code 6)
    Tas,
    /// Northern Territory (code 7)
    Nt,
    /// Australian Capital Territory (code 8)
    Act,
}

impl Jurisdiction {
    /// Returns all jurisdictions in code order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Nsw,
            Self::Vic,
            Self::Qld,
            Self::Sa,
            Self::Wa,
            Self::Tas,
            Self::Nt,
            Self::Act,
        ]
    }

    /// Maps a crash-identifier jurisdiction digit to a jurisdiction.
    ///
    /// Returns `None` for digits outside `1..=8`.
    #[must_use]
    pub const fn from_code_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(Self::Nsw),
            '2' => Some(Self::Vic),
            '3' => Some(Self::Qld),
            '4' => Some(Self::Sa),
            '5' => Some(Self::Wa),
            '6' => Some(Self::Tas),
            '7' => Some(Self::Nt),
            '8' => Some(Self::Act),
            _ => None,
        }
    }

    /// Returns the numeric jurisdiction code (`1..=8`).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Nsw => 1,
            Self::Vic => 2,
            Self::Qld => 3,
            Self::Sa => 4,
            Self::Wa => 5,
            Self::Tas => 6,
            Self::Nt => 7,
            Self::Act => 8,
        }
    }

    /// Returns the upper-case abbreviation (e.g. `"VIC"`).
    #[must_use]
    pub const fn abbr(self) -> &'static str {
        match self {
            Self::Nsw => "NSW",
            Self::Vic => "VIC",
            Self::Qld => "QLD",
            Self::Sa => "SA",
            Self::Wa => "WA",
            Self::Tas => "TAS",
            Self::Nt => "NT",
            Self::Act => "ACT",
        }
    }

    /// Returns the label as written in the ABS reference tables and the
    /// raw crash `State` column (e.g. `"Vic"`).
    #[must_use]
    pub const fn reference_label(self) -> &'static str {
        match self {
            Self::Nsw => "NSW",
            Self::Vic => "Vic",
            Self::Qld => "Qld",
            Self::Sa => "SA",
            Self::Wa => "WA",
            Self::Tas => "Tas",
            Self::Nt => "NT",
            Self::Act => "ACT",
        }
    }

    /// Returns the first jurisdiction (in code order) whose reference
    /// label occurs in `text`.
    ///
    /// Matching is case-sensitive, the same way the labels are written in
    /// the reference tables.
    #[must_use]
    pub fn find_in(text: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|j| text.contains(j.reference_label()))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn code_digit_roundtrip() {
        for j in Jurisdiction::all() {
            let digit = char::from(b'0' + j.code());
            assert_eq!(Jurisdiction::from_code_digit(digit), Some(*j));
        }
    }

    #[test]
    fn unmapped_digits_yield_none() {
        assert_eq!(Jurisdiction::from_code_digit('0'), None);
        assert_eq!(Jurisdiction::from_code_digit('9'), None);
        assert_eq!(Jurisdiction::from_code_digit('x'), None);
    }

    #[test]
    fn parses_mixed_case_state_column() {
        assert_eq!(Jurisdiction::from_str("Vic").unwrap(), Jurisdiction::Vic);
        assert_eq!(Jurisdiction::from_str("QLD").unwrap(), Jurisdiction::Qld);
        assert_eq!(Jurisdiction::from_str("act").unwrap(), Jurisdiction::Act);
        assert!(Jurisdiction::from_str("Victoria").is_err());
    }

    #[test]
    fn finds_reference_label_in_area_name() {
        assert_eq!(
            Jurisdiction::find_in("Major Cities Australia (Vic)"),
            Some(Jurisdiction::Vic)
        );
        assert_eq!(Jurisdiction::find_in("Remote Australia"), None);
    }
}
