//! Core farm entities: cages, samplings, samples, and feed records.
//!
//! These are plain data carriers. Storage and visibility rules live outside
//! the analytics code; see [`crate::dataset`] for the in-memory store.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type InvestorId = u64;
pub type CageId = u64;
pub type SamplingId = u64;
pub type ScheduleId = u64;
pub type UserId = u64;

/// An investor owning one or more cages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub id: InvestorId,
    pub name: String,
    /// Soft-deleted investors are hidden from scoped views.
    #[serde(default)]
    pub deleted: bool,
}

/// A stocked enclosure.
///
/// `fingerlings` is the initial stock and never changes; mortality recorded on
/// each [`Sampling`] reduces the present stock instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cage {
    pub id: CageId,
    /// Initial stock count.
    pub fingerlings: u32,
    pub investor_id: InvestorId,
    /// Farmer managing the cage, if assigned.
    #[serde(default)]
    pub farmer_id: Option<UserId>,
    /// Feed type name (e.g. "Grower Feed").
    #[serde(default)]
    pub feed_type: Option<String>,
}

/// One biometric sampling event for a cage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    pub id: SamplingId,
    pub cage_id: CageId,
    pub investor_id: InvestorId,
    pub date: NaiveDate,
    /// Cumulative mortality at the time of sampling.
    #[serde(default)]
    pub mortality: u32,
    /// Day-of-culture code, informational only.
    #[serde(default)]
    pub doc: String,
    /// Feed type recorded on the sampling; takes precedence over the cage's.
    #[serde(default)]
    pub feed_type: Option<String>,
}

/// One fish's measurement within a sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub sampling_id: SamplingId,
    /// Position within the sampling, starting at 1.
    pub sample_no: u32,
    /// Weight in grams.
    pub weight_g: f64,
    /// Length in cm.
    #[serde(default)]
    pub length_cm: Option<f64>,
    /// Width in cm.
    #[serde(default)]
    pub width_cm: Option<f64>,
}

impl Sample {
    /// Convenience constructor for a weight-only measurement.
    pub fn weighed(sampling_id: SamplingId, sample_no: u32, weight_g: f64) -> Self {
        Self {
            sampling_id,
            sample_no,
            weight_g,
            length_cm: None,
            width_cm: None,
        }
    }
}

/// Feed given to a cage on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConsumption {
    pub cage_id: CageId,
    pub date: NaiveDate,
    /// Amount in kilograms.
    pub amount_kg: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Signed day count from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Signed day count between two timestamps, truncated toward zero.
pub fn days_between_datetimes(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_days()
}

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds half away from zero to one decimal.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
