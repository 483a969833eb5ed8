//! Daily ration sizing and its split across feeding times.

use crate::analytics::biomass::daily_feed_ration_kg;
use crate::feeding::tier::FeedingFrequency;
use crate::model::round2;

/// Daily feed per fish (g) for fish without a weight measurement.
pub fn grams_per_fish_for_age(age_days: i64) -> f64 {
    match age_days {
        ..=7 => 0.05,
        8..=14 => 0.1,
        15..=30 => 0.2,
        31..=60 => 0.5,
        61..=90 => 1.0,
        _ => 1.5,
    }
}

/// Age-curve ration for the whole cage (kg), rounded to 2 decimals.
pub fn age_based_ration_kg(fingerlings: u32, age_days: i64) -> f64 {
    round2(f64::from(fingerlings) * grams_per_fish_for_age(age_days) / 1000.0)
}

/// Body-weight ration for the whole cage (kg), rounded to 2 decimals.
pub fn weight_based_ration_kg(fingerlings: u32, abw_g: f64, feeding_rate_pct: f64) -> f64 {
    round2(daily_feed_ration_kg(fingerlings, abw_g, feeding_rate_pct))
}

/// Splits a daily ration over the tier's feeding times, each slot rounded to
/// 2 decimals independently.
pub fn split_ration(total_kg: f64, frequency: FeedingFrequency) -> Vec<f64> {
    frequency
        .splits()
        .iter()
        .map(|share| round2(total_kg * share))
        .collect()
}
