//! Auto-generation of a cage feeding schedule from its latest sampling.

use std::fmt::Write as _;

use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::analytics::biomass::SamplingPoint;
use crate::config::FeedingSettings;
use crate::feeding::ration::{age_based_ration_kg, split_ration, weight_based_ration_kg};
use crate::feeding::tier::FeedingFrequency;
use crate::model::{Cage, days_between_datetimes, round2};

/// How the daily ration was sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculationMethod {
    /// From the latest sampling's average body weight.
    WeightBased,
    /// From the per-fish age curve.
    AgeBased,
}

impl CalculationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WeightBased => "weight-based",
            Self::AgeBased => "age-based",
        }
    }
}

/// A generated schedule, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSpec {
    pub name: String,
    pub frequency: FeedingFrequency,
    pub times: Vec<NaiveTime>,
    /// Feed per time slot (kg), aligned with `times`.
    pub amounts: Vec<f64>,
    pub total_daily_amount: f64,
    pub method: CalculationMethod,
    pub fish_age_days: i64,
    /// ABW behind a weight-based ration (g), 2 decimals.
    pub avg_weight_g: Option<f64>,
    pub notes: String,
}

/// Builds a schedule for `cage` from its most recent sampling, if any.
///
/// Fish age is the whole-day distance between `now` and the latest sampling
/// date, or the configured default for a cage never sampled. A sampling with
/// samples sizes the ration by body weight; otherwise the age curve is used.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use growout::config::FeedingSettings;
/// use growout::feeding::{FeedingFrequency, generate_feeding_schedule};
/// use growout::model::Cage;
///
/// let cage = Cage {
///     id: 1,
///     fingerlings: 10_000,
///     investor_id: 1,
///     farmer_id: None,
///     feed_type: None,
/// };
/// let now = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let spec = generate_feeding_schedule(&cage, None, &FeedingSettings::default(), now);
/// assert_eq!(spec.frequency, FeedingFrequency::ThriceDaily);
/// assert_eq!(spec.total_daily_amount, 2.0);
/// assert_eq!(spec.amounts, [0.7, 0.6, 0.7]);
/// ```
pub fn generate_feeding_schedule(
    cage: &Cage,
    latest: Option<&SamplingPoint>,
    settings: &FeedingSettings,
    now: NaiveDateTime,
) -> ScheduleSpec {
    let fish_age_days = match latest {
        Some(p) => days_between_datetimes(p.date.and_time(NaiveTime::MIN), now).abs(),
        None => settings.default_fish_age_days,
    };

    let weighed = latest.filter(|p| p.summary.has_samples());
    let (total_daily_amount, method, avg_weight_g) = match weighed {
        Some(p) => (
            weight_based_ration_kg(
                cage.fingerlings,
                p.summary.avg_weight_g,
                settings.feeding_rate_percent,
            ),
            CalculationMethod::WeightBased,
            Some(round2(p.summary.avg_weight_g)),
        ),
        None => (
            age_based_ration_kg(cage.fingerlings, fish_age_days),
            CalculationMethod::AgeBased,
            None,
        ),
    };

    let frequency = FeedingFrequency::from_age(fish_age_days);
    let notes = schedule_notes(
        cage,
        method,
        fish_age_days,
        avg_weight_g,
        settings.feeding_rate_percent,
        total_daily_amount,
        now,
    );

    ScheduleSpec {
        name: format!("Auto-Generated {} Schedule", frequency.label()),
        frequency,
        times: frequency.times(),
        amounts: split_ration(total_daily_amount, frequency),
        total_daily_amount,
        method,
        fish_age_days,
        avg_weight_g,
        notes,
    }
}

fn schedule_notes(
    cage: &Cage,
    method: CalculationMethod,
    fish_age_days: i64,
    avg_weight_g: Option<f64>,
    feeding_rate_pct: f64,
    total_daily_amount: f64,
    now: NaiveDateTime,
) -> String {
    let mut notes = format!(
        "Auto-generated schedule for Cage {}\nCalculation Method: {}\nFish Age: {} days\n",
        cage.id,
        method.as_str(),
        fish_age_days
    );
    if let Some(abw) = avg_weight_g {
        let _ = write!(
            notes,
            "Average Body Weight: {abw} g\nFeeding Rate: {feeding_rate_pct}% of body weight\n"
        );
    }
    let _ = write!(
        notes,
        "Fingerlings: {}\nDaily Amount: {} kg\nFeed Type: {}\nGenerated on: {}",
        cage.fingerlings,
        total_daily_amount,
        cage.feed_type.as_deref().unwrap_or("N/A"),
        now.format("%Y-%m-%d %H:%M:%S")
    );
    notes
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::Sample;
    use crate::sampling::aggregate_samples;

    fn cage(fingerlings: u32) -> Cage {
        Cage {
            id: 4,
            fingerlings,
            investor_id: 1,
            farmer_id: None,
            feed_type: Some("Starter Feed".into()),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .expect("valid timestamp")
    }

    fn point(days_ago: u64, weights: &[f64]) -> SamplingPoint {
        let samples: Vec<Sample> = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| Sample::weighed(1, i as u32 + 1, w))
            .collect();
        SamplingPoint {
            date: now().date() - chrono::Days::new(days_ago),
            summary: aggregate_samples(&samples),
            mortality: 0,
        }
    }

    #[test]
    fn weight_based_when_sampled() {
        let latest = point(45, &[20.0, 30.0]);
        let spec = generate_feeding_schedule(
            &cage(4000),
            Some(&latest),
            &FeedingSettings::default(),
            now(),
        );
        assert_eq!(spec.method, CalculationMethod::WeightBased);
        assert_eq!(spec.fish_age_days, 45);
        assert_eq!(spec.frequency, FeedingFrequency::TwiceDaily);
        assert_eq!(spec.total_daily_amount, 3.0);
        assert_eq!(spec.amounts, [1.35, 1.65]);
        assert_eq!(spec.avg_weight_g, Some(25.0));
        assert_eq!(spec.name, "Auto-Generated Twice Daily Schedule");
    }

    #[test]
    fn empty_sampling_falls_back_to_age_curve() {
        let latest = point(10, &[]);
        let spec = generate_feeding_schedule(
            &cage(2000),
            Some(&latest),
            &FeedingSettings::default(),
            now(),
        );
        assert_eq!(spec.method, CalculationMethod::AgeBased);
        assert_eq!(spec.fish_age_days, 10);
        assert_eq!(spec.frequency, FeedingFrequency::FourTimesDaily);
        assert_eq!(spec.total_daily_amount, 0.2);
        assert_eq!(spec.amounts, [0.05, 0.05, 0.05, 0.05]);
        assert_eq!(spec.avg_weight_g, None);
    }

    #[test]
    fn notes_record_inputs() {
        let latest = point(45, &[20.0, 30.0]);
        let spec = generate_feeding_schedule(
            &cage(4000),
            Some(&latest),
            &FeedingSettings::default(),
            now(),
        );
        let expected = "Auto-generated schedule for Cage 4\n\
            Calculation Method: weight-based\n\
            Fish Age: 45 days\n\
            Average Body Weight: 25 g\n\
            Feeding Rate: 3% of body weight\n\
            Fingerlings: 4000\n\
            Daily Amount: 3 kg\n\
            Feed Type: Starter Feed\n\
            Generated on: 2025-06-01 10:30:00";
        assert_eq!(spec.notes, expected);
    }

    #[test]
    fn unsampled_notes_omit_weight_lines() {
        let mut c = cage(10_000);
        c.feed_type = None;
        let spec = generate_feeding_schedule(&c, None, &FeedingSettings::default(), now());
        assert!(!spec.notes.contains("Average Body Weight"));
        assert!(spec.notes.contains("Feed Type: N/A"));
        assert!(spec.notes.contains("Fish Age: 30 days"));
    }
}
