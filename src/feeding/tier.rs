//! Feeding frequency tiers with their fixed times and ration splits.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::GrowoutError;

/// How many times a day a cage is fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedingFrequency {
    Daily,
    TwiceDaily,
    ThriceDaily,
    FourTimesDaily,
}

impl FeedingFrequency {
    pub const ALL: [FeedingFrequency; 4] = [
        Self::Daily,
        Self::TwiceDaily,
        Self::ThriceDaily,
        Self::FourTimesDaily,
    ];

    /// Younger fish are fed more often.
    pub fn from_age(age_days: i64) -> Self {
        match age_days {
            ..=14 => Self::FourTimesDaily,
            15..=30 => Self::ThriceDaily,
            31..=60 => Self::TwiceDaily,
            _ => Self::Daily,
        }
    }

    /// Feeding slots as `(hour, minute)`.
    fn clock(self) -> &'static [(u32, u32)] {
        match self {
            Self::FourTimesDaily => &[(6, 0), (10, 0), (14, 0), (18, 0)],
            Self::ThriceDaily => &[(7, 0), (12, 0), (17, 0)],
            Self::TwiceDaily => &[(8, 0), (16, 0)],
            Self::Daily => &[(9, 0)],
        }
    }

    /// Fixed feeding times of the tier, earliest first.
    pub fn times(self) -> Vec<NaiveTime> {
        self.clock()
            .iter()
            .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
            .collect()
    }

    /// Share of the daily ration given at each feeding time. Sums to 1.
    pub fn splits(self) -> &'static [f64] {
        match self {
            Self::FourTimesDaily => &[0.25, 0.25, 0.25, 0.25],
            Self::ThriceDaily => &[0.35, 0.30, 0.35],
            Self::TwiceDaily => &[0.45, 0.55],
            Self::Daily => &[1.0],
        }
    }

    pub fn slot_count(self) -> usize {
        self.clock().len()
    }

    /// Title-case label used in generated schedule names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::TwiceDaily => "Twice Daily",
            Self::ThriceDaily => "Thrice Daily",
            Self::FourTimesDaily => "Four Times Daily",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::TwiceDaily => "twice_daily",
            Self::ThriceDaily => "thrice_daily",
            Self::FourTimesDaily => "four_times_daily",
        }
    }
}

impl fmt::Display for FeedingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedingFrequency {
    type Err = GrowoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                GrowoutError::validation(
                    "frequency",
                    "must be one of daily, twice_daily, thrice_daily, four_times_daily",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, FeedingFrequency::FourTimesDaily)]
    #[case(14, FeedingFrequency::FourTimesDaily)]
    #[case(15, FeedingFrequency::ThriceDaily)]
    #[case(30, FeedingFrequency::ThriceDaily)]
    #[case(31, FeedingFrequency::TwiceDaily)]
    #[case(60, FeedingFrequency::TwiceDaily)]
    #[case(61, FeedingFrequency::Daily)]
    #[case(400, FeedingFrequency::Daily)]
    fn tier_boundaries(#[case] age: i64, #[case] expected: FeedingFrequency) {
        assert_eq!(FeedingFrequency::from_age(age), expected);
    }

    #[test]
    fn times_and_splits_line_up() {
        for f in FeedingFrequency::ALL {
            assert_eq!(f.times().len(), f.slot_count());
            assert_eq!(f.splits().len(), f.slot_count());
            let total: f64 = f.splits().iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "{f} splits sum to {total}");
        }
    }

    #[test]
    fn thrice_daily_times() {
        let times: Vec<String> = FeedingFrequency::ThriceDaily
            .times()
            .iter()
            .map(|t| t.format("%H:%M").to_string())
            .collect();
        assert_eq!(times, ["07:00", "12:00", "17:00"]);
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!(
            "four_times_daily".parse::<FeedingFrequency>().expect("parse"),
            FeedingFrequency::FourTimesDaily
        );
        assert!("hourly".parse::<FeedingFrequency>().is_err());
    }
}
