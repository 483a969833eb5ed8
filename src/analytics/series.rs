//! Chronological biomass/FCR series for a cage.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::biomass::{SamplingPoint, compute_biomass};
use crate::dataset::FarmData;
use crate::error::{GrowoutError, Result};
use crate::model::{CageId, Sampling, SamplingId};
use crate::sampling::aggregate_samples;

/// One row of a cage's growth history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub sampling_id: SamplingId,
    pub date: NaiveDate,
    pub doc: String,
    /// Initial stock of the cage.
    pub stocks: u32,
    pub mortality: u32,
    pub present_stock: i64,
    pub sample_count: usize,
    pub abw_g: f64,
    /// Biomass gain since the previous row per day (g/day).
    pub weight_increment_g_per_day: f64,
    pub biomass_kg: f64,
    pub feeding_rate_pct: f64,
    pub daily_feed_ration_kg: f64,
    pub feed_consumed_kg: f64,
    pub total_gained_kg: f64,
    pub fcr: f64,
}

impl fmt::Display for HistoryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:>4}) | stock={:>6} dead={:>4} | n={:>2} abw={:>7.2} g  \
             inc={:>6.1} g/d | biomass={:>8.2} kg  dfr={:>6.2} kg | \
             feed={:>7.2} kg  gain={:>7.2} kg  fcr={:.2}",
            self.date,
            self.doc,
            self.present_stock,
            self.mortality,
            self.sample_count,
            self.abw_g,
            self.weight_increment_g_per_day,
            self.biomass_kg,
            self.daily_feed_ration_kg,
            self.feed_consumed_kg,
            self.total_gained_kg,
            self.fcr,
        )
    }
}

/// Aggregates a stored sampling into the point the calculators work on.
pub fn sampling_point(data: &FarmData, sampling: &Sampling) -> SamplingPoint {
    SamplingPoint {
        date: sampling.date,
        summary: aggregate_samples(data.samples_for(sampling.id)),
        mortality: sampling.mortality,
    }
}

/// Walks a cage's samplings oldest first, each row measured against the one
/// before it. The first row sums all feed up to its date.
///
/// # Errors
///
/// Returns [`GrowoutError::CageNotFound`] for an unknown cage id.
pub fn cage_history(
    data: &FarmData,
    cage_id: CageId,
    feeding_rate_pct: f64,
) -> Result<Vec<HistoryRow>> {
    let cage = data
        .cage(cage_id)
        .ok_or(GrowoutError::CageNotFound(cage_id))?;
    let feed = data.feed_for_cage(cage_id);

    let mut rows = Vec::new();
    let mut previous: Option<SamplingPoint> = None;
    for sampling in data.samplings_for_cage(cage_id) {
        let point = sampling_point(data, sampling);
        let r = compute_biomass(
            &point,
            previous.as_ref(),
            cage.fingerlings,
            feed.iter().copied(),
            feeding_rate_pct,
        );
        rows.push(HistoryRow {
            sampling_id: sampling.id,
            date: sampling.date,
            doc: sampling.doc.clone(),
            stocks: cage.fingerlings,
            mortality: sampling.mortality,
            present_stock: r.present_stock,
            sample_count: point.summary.count,
            abw_g: r.abw_g,
            weight_increment_g_per_day: r.daily_weight_gained_g,
            biomass_kg: r.biomass_kg,
            feeding_rate_pct: r.feeding_rate_pct,
            daily_feed_ration_kg: r.daily_feed_ration_kg,
            feed_consumed_kg: r.feed_consumed_kg,
            total_gained_kg: r.total_weight_gained_kg,
            fcr: r.fcr,
        });
        previous = Some(point);
    }
    Ok(rows)
}
