//! Harvest date projection for single cages and whole farms.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::analytics::growth::{GrowthPoint, estimate_growth_rate};
use crate::config::HarvestSettings;
use crate::dataset::FarmData;
use crate::error::{GrowoutError, Result};
use crate::model::{CageId, InvestorId, round2};
use crate::sampling::aggregate_samples;

/// Projected harvest for one cage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestEstimate {
    /// `None` when the cage has no sampled history.
    pub estimated_date: Option<NaiveDate>,
    pub days_until_harvest: Option<i64>,
    pub is_ready: bool,
    pub current_avg_weight_g: f64,
    pub target_weight_g: f64,
    pub growth_rate_used: f64,
    pub latest_sampling_date: Option<NaiveDate>,
}

impl HarvestEstimate {
    /// Result for a cage with nothing to project from.
    pub fn undetermined(target_weight_g: f64, growth_rate_used: f64) -> Self {
        Self {
            estimated_date: None,
            days_until_harvest: None,
            is_ready: false,
            current_avg_weight_g: 0.0,
            target_weight_g,
            growth_rate_used,
            latest_sampling_date: None,
        }
    }

    pub fn is_determined(&self) -> bool {
        self.days_until_harvest.is_some()
    }
}

/// Projects when `current_abw_g` reaches `target_weight_g` at `growth_rate`.
///
/// A cage already at or above target is ready on its latest sampling date.
/// A non-positive or non-finite rate cannot move the fish toward the target,
/// so the projection is left undetermined.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use growout::analytics::harvest::project_harvest;
///
/// let latest = NaiveDate::from_ymd_opt(2025, 2, 22).unwrap();
/// let est = project_harvest(161.0, 500.0, 2.17, latest);
/// assert_eq!(est.days_until_harvest, Some(157));
/// assert!(!est.is_ready);
/// ```
pub fn project_harvest(
    current_abw_g: f64,
    target_weight_g: f64,
    growth_rate: f64,
    latest_sampling_date: NaiveDate,
) -> HarvestEstimate {
    let mut est = HarvestEstimate {
        estimated_date: None,
        days_until_harvest: None,
        is_ready: false,
        current_avg_weight_g: round2(current_abw_g),
        target_weight_g,
        growth_rate_used: growth_rate,
        latest_sampling_date: Some(latest_sampling_date),
    };

    if current_abw_g >= target_weight_g {
        est.is_ready = true;
        est.days_until_harvest = Some(0);
        est.estimated_date = Some(latest_sampling_date);
        return est;
    }
    if !growth_rate.is_finite() || growth_rate <= 0.0 {
        return est;
    }

    let days = ((target_weight_g - current_abw_g) / growth_rate).ceil().max(0.0) as i64;
    est.days_until_harvest = Some(days);
    est.estimated_date = u64::try_from(days)
        .ok()
        .and_then(|d| latest_sampling_date.checked_add_days(Days::new(d)));
    est
}

/// Growth points for every sampling of a cage, oldest first.
pub fn growth_points(data: &FarmData, cage_id: CageId) -> Vec<GrowthPoint> {
    data.samplings_for_cage(cage_id)
        .into_iter()
        .map(|s| {
            let summary = aggregate_samples(data.samples_for(s.id));
            GrowthPoint {
                date: s.date,
                abw_g: summary.avg_weight_g,
                sample_count: summary.count,
            }
        })
        .collect()
}

/// Harvest estimate for one cage using `settings` read at call time.
///
/// # Errors
///
/// Returns [`GrowoutError::CageNotFound`] for an unknown cage id.
pub fn estimate_for_cage(
    data: &FarmData,
    cage_id: CageId,
    settings: &HarvestSettings,
) -> Result<HarvestEstimate> {
    if data.cage(cage_id).is_none() {
        return Err(GrowoutError::CageNotFound(cage_id));
    }

    let points = growth_points(data, cage_id);
    let rate = estimate_growth_rate(&points, settings.default_growth_rate_g_per_day);
    let Some(latest) = points.iter().rev().find(|p| p.sample_count > 0) else {
        return Ok(HarvestEstimate::undetermined(
            settings.target_weight_grams,
            rate,
        ));
    };
    Ok(project_harvest(
        latest.abw_g,
        settings.target_weight_grams,
        rate,
        latest.date,
    ))
}

/// Harvest estimate tagged with the cage it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CageHarvest {
    pub cage_id: CageId,
    pub investor_id: InvestorId,
    pub investor_name: Option<String>,
    #[serde(flatten)]
    pub estimate: HarvestEstimate,
}

impl fmt::Display for CageHarvest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.estimate;
        write!(
            f,
            "cage {:>3} ({}) | abw={:>7.2} g  target={:.0} g  rate={:.2} g/d | ",
            self.cage_id,
            self.investor_name.as_deref().unwrap_or("-"),
            e.current_avg_weight_g,
            e.target_weight_g,
            e.growth_rate_used,
        )?;
        match (e.is_ready, e.days_until_harvest, e.estimated_date) {
            (true, _, _) => write!(f, "ready"),
            (false, Some(days), Some(date)) => write!(f, "{days} days -> {date}"),
            _ => write!(f, "undetermined"),
        }
    }
}

/// Harvest outlook for every cage in `data`, soonest first.
///
/// Cages without sampled history are left out. Estimates without a day count
/// sort after all others; ties keep cage order.
pub fn anticipate_harvests(data: &FarmData, settings: &HarvestSettings) -> Vec<CageHarvest> {
    let mut out: Vec<CageHarvest> = data
        .cages
        .iter()
        .filter_map(|cage| match estimate_for_cage(data, cage.id, settings) {
            Ok(estimate) if estimate.latest_sampling_date.is_some() => Some(CageHarvest {
                cage_id: cage.id,
                investor_id: cage.investor_id,
                investor_name: data.investor(cage.investor_id).map(|i| i.name.clone()),
                estimate,
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(cage_id = cage.id, error = %e, "harvest estimate skipped");
                None
            }
        })
        .collect();

    out.sort_by(|a, b| {
        match (a.estimate.days_until_harvest, b.estimate.days_until_harvest) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).expect("valid date")
    }

    #[test]
    fn ready_when_at_target() {
        let est = project_harvest(500.0, 500.0, 3.0, d(6, 1));
        assert!(est.is_ready);
        assert_eq!(est.days_until_harvest, Some(0));
        assert_eq!(est.estimated_date, Some(d(6, 1)));
    }

    #[test]
    fn days_are_rounded_up() {
        let est = project_harvest(161.0, 500.0, 2.17, d(2, 22));
        assert_eq!(est.days_until_harvest, Some(157));
        assert_eq!(est.estimated_date, Some(d(7, 29)));
        assert_eq!(est.growth_rate_used, 2.17);
    }

    #[test]
    fn exact_division_needs_no_extra_day() {
        let est = project_harvest(400.0, 500.0, 4.0, d(1, 1));
        assert_eq!(est.days_until_harvest, Some(25));
        assert_eq!(est.estimated_date, Some(d(1, 26)));
    }

    #[test]
    fn zero_rate_is_undetermined() {
        let est = project_harvest(100.0, 500.0, 0.0, d(1, 1));
        assert!(!est.is_ready);
        assert_eq!(est.days_until_harvest, None);
        assert_eq!(est.latest_sampling_date, Some(d(1, 1)));
    }

    #[test]
    fn undetermined_shape() {
        let est = HarvestEstimate::undetermined(500.0, 3.0);
        assert!(!est.is_determined());
        assert!(!est.is_ready);
        assert_eq!(est.estimated_date, None);
    }
}
