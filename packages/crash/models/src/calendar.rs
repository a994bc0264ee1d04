//! Calendar classifications for the Season dimension.
//!
//! All classifications follow the Southern Hemisphere calendar.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Meteorological season of a month.
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
pub enum Season {
    /// December to February
    Summer,
    /// March to May
    Autumn,
    /// June to August
    Winter,
    /// September to November
    Spring,
}

impl Season {
    /// Returns the season a month (1-12) falls in.
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Summer,
            3..=5 => Self::Autumn,
            6..=8 => Self::Winter,
            _ => Self::Spring,
        }
    }
}

/// Domestic tourism demand band of a month.
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
pub enum TourismSeason {
    /// Summer holidays
    Peak,
    /// Winter school holidays
    #[strum(serialize = "Secondary Peak")]
    #[serde(rename = "Secondary Peak")]
    SecondaryPeak,
    /// Everything else
    #[strum(serialize = "Off Peak")]
    #[serde(rename = "Off Peak")]
    OffPeak,
}

impl TourismSeason {
    /// Returns the tourism band a month (1-12) falls in.
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Peak,
            6 | 7 => Self::SecondaryPeak,
            _ => Self::OffPeak,
        }
    }
}

/// Calendar quarter (1-4) of a month (1-12).
#[must_use]
pub const fn quarter(month: u32) -> u32 {
    (month.saturating_sub(1)) / 3 + 1
}

/// November through January.
#[must_use]
pub const fn is_holiday_season(month: u32) -> bool {
    matches!(month, 11 | 12 | 1)
}

/// Months that usually contain state school holidays.
#[must_use]
pub const fn is_school_holiday(month: u32) -> bool {
    matches!(month, 1 | 4 | 7 | 9 | 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_cover_every_month() {
        let summer: Vec<u32> = (1..=12)
            .filter(|m| Season::from_month(*m) == Season::Summer)
            .collect();
        assert_eq!(summer, vec![1, 2, 12]);
        assert_eq!(Season::from_month(4), Season::Autumn);
        assert_eq!(Season::from_month(7), Season::Winter);
        assert_eq!(Season::from_month(10), Season::Spring);
    }

    #[test]
    fn quarters() {
        assert_eq!(quarter(1), 1);
        assert_eq!(quarter(3), 1);
        assert_eq!(quarter(4), 2);
        assert_eq!(quarter(12), 4);
    }

    #[test]
    fn tourism_labels() {
        assert_eq!(TourismSeason::from_month(6).to_string(), "Secondary Peak");
        assert_eq!(TourismSeason::from_month(3).to_string(), "Off Peak");
        assert_eq!(TourismSeason::from_month(1).to_string(), "Peak");
    }
}
