//! Device-driven sample ingestion: fixed numbered slots filled one at a time.
//!
//! A measuring device posts one fish at a time. Each post claims the lowest
//! unfilled slot of the sampling and recomputes its running statistics. The
//! claim and the recompute happen under one lock, and nothing is committed
//! unless both succeed.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::error::{GrowoutError, Result};
use crate::model::{Sample, SamplingId};

const CM_TO_IN: f64 = 0.3937;
const LB_TO_G: f64 = 453.592;
/// Height stretch factor applied by the device's length-weight formula.
const HEIGHT_FACTOR: f64 = 1.9;
const FORMULA_DIVISOR: f64 = 690.0;

/// Estimates fish weight (g) from body height and width measured in cm.
///
/// `weight_lb = width_in * (1.9 * height_in)^2 / 690`, converted to grams.
pub fn weight_from_dimensions(height_cm: f64, width_cm: f64) -> f64 {
    let height_in = height_cm * CM_TO_IN * HEIGHT_FACTOR;
    let width_in = width_cm * CM_TO_IN;
    width_in * height_in * height_in / FORMULA_DIVISOR * LB_TO_G
}

/// Fixed-size slot sheet for one sampling. `None` marks an unfilled slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSheet {
    slots: Vec<Option<f64>>,
}

impl SlotSheet {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// Number of slots, filled or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// First unfilled slot number (1-based).
    pub fn next_open(&self) -> Option<u32> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(|idx| idx as u32 + 1)
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn total_weight_g(&self) -> f64 {
        self.slots.iter().flatten().sum()
    }

    /// Average of filled slots, 0 when nothing is filled.
    pub fn abw_g(&self) -> f64 {
        let filled = self.filled();
        if filled == 0 {
            0.0
        } else {
            self.total_weight_g() / filled as f64
        }
    }

    /// Running average and total, failing when the total overflows.
    fn totals(&self) -> Result<(f64, f64)> {
        let total = self.total_weight_g();
        if total.is_finite() {
            Ok((self.abw_g(), total))
        } else {
            Err(GrowoutError::ProcessingFailed)
        }
    }

    fn fill(&mut self, slot_no: u32, weight_g: f64) -> Result<()> {
        let idx = (slot_no as usize)
            .checked_sub(1)
            .ok_or(GrowoutError::ProcessingFailed)?;
        match self.slots.get_mut(idx) {
            Some(slot @ None) => {
                *slot = Some(weight_g);
                Ok(())
            }
            _ => Err(GrowoutError::ProcessingFailed),
        }
    }

    /// Filled slots as samples belonging to `sampling_id`.
    pub fn to_samples(&self, sampling_id: SamplingId) -> Vec<Sample> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, w)| w.map(|w| Sample::weighed(sampling_id, idx as u32 + 1, w)))
            .collect()
    }
}

/// Result of one successful slot fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillOutcome {
    pub sampling_id: SamplingId,
    /// Slot that received the measurement (1-based).
    pub sample_no: u32,
    /// Stored weight (g), rounded to 3 decimals.
    pub weight_g: f64,
    /// Running average of filled slots (g), rounded to 3 decimals.
    pub abw_g: f64,
    /// Running total of filled slots (g), rounded to 3 decimals.
    pub total_weight_g: f64,
    pub remaining: usize,
}

/// Fill progress of one sampling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotProgress {
    pub next_sample_no: Option<u32>,
    pub filled: usize,
    pub remaining: usize,
    pub total: usize,
    /// Filled share in percent, rounded to 2 decimals.
    pub percentage: f64,
}

/// Slot sheets for every sampling under ingestion.
#[derive(Debug)]
pub struct SlotBoard {
    slots_per_sampling: usize,
    sheets: Mutex<HashMap<SamplingId, SlotSheet>>,
}

impl SlotBoard {
    pub fn new(slots_per_sampling: usize) -> Self {
        Self {
            slots_per_sampling,
            sheets: Mutex::new(HashMap::new()),
        }
    }

    /// Claims the next open slot of `sampling_id` and stores `weight_g` in it.
    ///
    /// The sheet is created on first use. The update is applied to a working
    /// copy that replaces the stored sheet only when every step succeeded.
    ///
    /// # Errors
    ///
    /// - [`GrowoutError::SlotsFull`] when every slot already holds a weight.
    /// - [`GrowoutError::Validation`] for a non-finite or non-positive weight.
    /// - [`GrowoutError::ProcessingFailed`] if the update could not be applied,
    ///   e.g. the running total overflows.
    pub fn fill_next(&self, sampling_id: SamplingId, weight_g: f64) -> Result<FillOutcome> {
        if !weight_g.is_finite() || weight_g <= 0.0 {
            return Err(GrowoutError::validation("weight", "must be a positive number"));
        }

        let mut sheets = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        let current = sheets
            .entry(sampling_id)
            .or_insert_with(|| SlotSheet::new(self.slots_per_sampling));

        let Some(sample_no) = current.next_open() else {
            return Err(GrowoutError::SlotsFull(sampling_id));
        };

        let weight_g = round3(weight_g);
        let mut working = current.clone();
        let totals = working
            .fill(sample_no, weight_g)
            .and_then(|()| working.totals());
        let (abw_g, total_weight_g) = match totals {
            Ok(totals) => totals,
            Err(e) => {
                tracing::warn!(sampling_id, sample_no, error = %e, "slot fill rolled back");
                return Err(GrowoutError::ProcessingFailed);
            }
        };

        let outcome = FillOutcome {
            sampling_id,
            sample_no,
            weight_g,
            abw_g: round3(abw_g),
            total_weight_g: round3(total_weight_g),
            remaining: working.len() - working.filled(),
        };
        *current = working;
        tracing::debug!(sampling_id, sample_no, weight_g, "sample slot filled");
        Ok(outcome)
    }

    /// Converts a device measurement to a weight and fills the next slot.
    ///
    /// # Errors
    ///
    /// See [`SlotBoard::fill_next`]; negative dimensions are rejected.
    pub fn fill_from_dimensions(
        &self,
        sampling_id: SamplingId,
        height_cm: f64,
        width_cm: f64,
    ) -> Result<FillOutcome> {
        if height_cm.is_nan() || height_cm < 0.0 {
            return Err(GrowoutError::validation("height", "must be >= 0"));
        }
        if width_cm.is_nan() || width_cm < 0.0 {
            return Err(GrowoutError::validation("width", "must be >= 0"));
        }
        self.fill_next(sampling_id, weight_from_dimensions(height_cm, width_cm))
    }

    pub fn progress(&self, sampling_id: SamplingId) -> SlotProgress {
        let sheets = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        let (next, filled, total) = match sheets.get(&sampling_id) {
            Some(sheet) => (sheet.next_open(), sheet.filled(), sheet.len()),
            None => (
                (self.slots_per_sampling > 0).then_some(1),
                0,
                self.slots_per_sampling,
            ),
        };
        let percentage = if total > 0 {
            (filled as f64 / total as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        SlotProgress {
            next_sample_no: next,
            filled,
            remaining: total - filled,
            total,
            percentage,
        }
    }

    /// Filled samples of a sampling, ready to hand to the aggregator.
    pub fn samples(&self, sampling_id: SamplingId) -> Vec<Sample> {
        let sheets = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        sheets
            .get(&sampling_id)
            .map(|sheet| sheet.to_samples(sampling_id))
            .unwrap_or_default()
    }
}

fn round3(value: f64) -> f64 {
    let scaled = value * 1000.0;
    if scaled.is_finite() {
        scaled.round() / 1000.0
    } else {
        value
    }
}
