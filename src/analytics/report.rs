//! Per-sampling report and the overall summary across samplings.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::biomass::{BiomassResult, compute_biomass};
use crate::analytics::series::{HistoryRow, cage_history, sampling_point};
use crate::dataset::FarmData;
use crate::error::{GrowoutError, Result};
use crate::model::{CageId, InvestorId, Sample, SamplingId, round1};
use crate::sampling::{SampleSummary, aggregate_samples};

/// Size and feed entry for the sampled cage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CageEntry {
    pub cage_id: CageId,
    /// Average fish weight in kg, 1 decimal.
    pub weight_kg: f64,
    pub length_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub feed_type: Option<String>,
}

/// Everything shown for one sampling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingReport {
    pub sampling_id: SamplingId,
    pub date: NaiveDate,
    pub doc: String,
    pub investor_id: InvestorId,
    pub investor_name: Option<String>,
    pub cage_id: CageId,
    pub summary: SampleSummary,
    pub totals: BiomassResult,
    pub cage_entry: CageEntry,
    pub samples: Vec<Sample>,
    pub history: Vec<HistoryRow>,
}

/// Builds the report for one sampling, measured against the sampling that
/// precedes it in the cage's history.
///
/// # Errors
///
/// Returns [`GrowoutError::SamplingNotFound`] or [`GrowoutError::CageNotFound`]
/// when the sampling or its cage is missing.
pub fn sampling_report(
    data: &FarmData,
    sampling_id: SamplingId,
    feeding_rate_pct: f64,
) -> Result<SamplingReport> {
    let sampling = data
        .sampling(sampling_id)
        .ok_or(GrowoutError::SamplingNotFound(sampling_id))?;
    let cage = data
        .cage(sampling.cage_id)
        .ok_or(GrowoutError::CageNotFound(sampling.cage_id))?;

    let ordered = data.samplings_for_cage(cage.id);
    let previous = ordered
        .iter()
        .position(|s| s.id == sampling_id)
        .and_then(|idx| idx.checked_sub(1))
        .map(|idx| sampling_point(data, ordered[idx]));

    let point = sampling_point(data, sampling);
    let totals = compute_biomass(
        &point,
        previous.as_ref(),
        cage.fingerlings,
        data.feed_for_cage(cage.id),
        feeding_rate_pct,
    );

    let feed_type = sampling
        .feed_type
        .clone()
        .or_else(|| cage.feed_type.clone());
    let summary = point.summary;

    Ok(SamplingReport {
        sampling_id,
        date: sampling.date,
        doc: sampling.doc.clone(),
        investor_id: sampling.investor_id,
        investor_name: data.investor(sampling.investor_id).map(|i| i.name.clone()),
        cage_id: cage.id,
        summary,
        totals,
        cage_entry: CageEntry {
            cage_id: cage.id,
            weight_kg: round1(summary.avg_weight_g / 1000.0),
            length_cm: summary.avg_length_cm.map(round1),
            width_cm: summary.avg_width_cm.map(round1),
            feed_type,
        },
        samples: data.samples_for(sampling_id).into_iter().cloned().collect(),
        history: cage_history(data, cage.id, feeding_rate_pct)?,
    })
}

/// Totals across every sampling in a (usually scoped) dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_samplings: usize,
    pub total_samples: usize,
    pub avg_weight_g: f64,
    pub total_weight_kg: f64,
    pub min_weight_g: f64,
    pub max_weight_g: f64,
    pub total_investors: usize,
    pub total_cages: usize,
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Sampling Summary ---")?;
        writeln!(f, "Samplings:      {}", self.total_samplings)?;
        writeln!(f, "Samples:        {}", self.total_samples)?;
        writeln!(f, "Cages:          {}", self.total_cages)?;
        writeln!(f, "Investors:      {}", self.total_investors)?;
        writeln!(f, "Avg weight:     {:.2} g", self.avg_weight_g)?;
        writeln!(
            f,
            "Weight range:   {:.2} - {:.2} g",
            self.min_weight_g, self.max_weight_g
        )?;
        write!(f, "Total weight:   {:.2} kg", self.total_weight_kg)
    }
}

pub fn overall_summary(data: &FarmData) -> ReportSummary {
    let sampling_ids: HashSet<SamplingId> = data.samplings.iter().map(|s| s.id).collect();
    let all = aggregate_samples(
        data.samples
            .iter()
            .filter(|s| sampling_ids.contains(&s.sampling_id)),
    );

    ReportSummary {
        total_samplings: data.samplings.len(),
        total_samples: all.count,
        avg_weight_g: all.avg_weight_g,
        total_weight_kg: all.total_weight_g / 1000.0,
        min_weight_g: all.min_weight_g,
        max_weight_g: all.max_weight_g,
        total_investors: data
            .samplings
            .iter()
            .map(|s| s.investor_id)
            .collect::<HashSet<_>>()
            .len(),
        total_cages: data
            .samplings
            .iter()
            .map(|s| s.cage_id)
            .collect::<HashSet<_>>()
            .len(),
    }
}
