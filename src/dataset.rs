//! In-memory farm dataset and the visibility scope applied before analytics.
//!
//! A dataset is loaded from a TOML file with one array of tables per entity.
//! Dates are written as quoted ISO strings (`date = "2025-03-01"`).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{GrowoutError, Result};
use crate::model::{
    Cage, CageId, FeedConsumption, Investor, InvestorId, Sample, Sampling, SamplingId, UserId,
};

/// Every entity the analytics engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FarmData {
    #[serde(default)]
    pub investors: Vec<Investor>,
    #[serde(default)]
    pub cages: Vec<Cage>,
    #[serde(default)]
    pub samplings: Vec<Sampling>,
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub feed_consumptions: Vec<FeedConsumption>,
}

impl FarmData {
    /// Reads and checks a dataset file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// records reference missing parents, or samples are duplicated or carry
    /// a non-positive weight.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and checks a dataset from TOML text.
    ///
    /// # Errors
    ///
    /// See [`FarmData::from_toml_file`].
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let data: Self = toml::from_str(s).map_err(|e| GrowoutError::Dataset(e.to_string()))?;
        data.check_references()?;
        Ok(data)
    }

    fn check_references(&self) -> Result<()> {
        let mut cage_ids = HashSet::new();
        for cage in &self.cages {
            if !cage_ids.insert(cage.id) {
                return Err(GrowoutError::Dataset(format!("duplicate cage id {}", cage.id)));
            }
        }
        let mut sampling_ids = HashSet::new();
        for s in &self.samplings {
            if !sampling_ids.insert(s.id) {
                return Err(GrowoutError::Dataset(format!("duplicate sampling id {}", s.id)));
            }
            if !cage_ids.contains(&s.cage_id) {
                return Err(GrowoutError::Dataset(format!(
                    "sampling {} references unknown cage {}",
                    s.id, s.cage_id
                )));
            }
        }
        let mut sample_keys = HashSet::new();
        for sample in &self.samples {
            if !sampling_ids.contains(&sample.sampling_id) {
                return Err(GrowoutError::Dataset(format!(
                    "sample {} references unknown sampling {}",
                    sample.sample_no, sample.sampling_id
                )));
            }
            if !sample_keys.insert((sample.sampling_id, sample.sample_no)) {
                return Err(GrowoutError::Dataset(format!(
                    "duplicate sample {} in sampling {}",
                    sample.sample_no, sample.sampling_id
                )));
            }
            if !sample.weight_g.is_finite() || sample.weight_g <= 0.0 {
                return Err(GrowoutError::Dataset(format!(
                    "sample {} in sampling {} has invalid weight {}",
                    sample.sample_no, sample.sampling_id, sample.weight_g
                )));
            }
        }
        for record in &self.feed_consumptions {
            if !cage_ids.contains(&record.cage_id) {
                return Err(GrowoutError::Dataset(format!(
                    "feed record on {} references unknown cage {}",
                    record.date, record.cage_id
                )));
            }
        }
        Ok(())
    }

    pub fn cage(&self, id: CageId) -> Option<&Cage> {
        self.cages.iter().find(|c| c.id == id)
    }

    pub fn sampling(&self, id: SamplingId) -> Option<&Sampling> {
        self.samplings.iter().find(|s| s.id == id)
    }

    pub fn investor(&self, id: InvestorId) -> Option<&Investor> {
        self.investors.iter().find(|i| i.id == id)
    }

    /// Samplings of a cage ordered by date, ties kept in insertion order.
    pub fn samplings_for_cage(&self, cage_id: CageId) -> Vec<&Sampling> {
        let mut out: Vec<&Sampling> = self
            .samplings
            .iter()
            .filter(|s| s.cage_id == cage_id)
            .collect();
        out.sort_by_key(|s| s.date);
        out
    }

    /// Most recent sampling of a cage by date; the later-inserted one wins ties.
    pub fn latest_sampling(&self, cage_id: CageId) -> Option<&Sampling> {
        self.samplings_for_cage(cage_id).last().copied()
    }

    /// Samples of a sampling ordered by sample number.
    pub fn samples_for(&self, sampling_id: SamplingId) -> Vec<&Sample> {
        let mut out: Vec<&Sample> = self
            .samples
            .iter()
            .filter(|s| s.sampling_id == sampling_id)
            .collect();
        out.sort_by_key(|s| s.sample_no);
        out
    }

    pub fn feed_for_cage(&self, cage_id: CageId) -> Vec<&FeedConsumption> {
        self.feed_consumptions
            .iter()
            .filter(|f| f.cage_id == cage_id)
            .collect()
    }

    /// Returns a copy holding only what `scope` allows.
    pub fn scoped(&self, scope: &Scope) -> Self {
        let visible_investor = |id: InvestorId| {
            if scope.investor_id.is_some_and(|want| want != id) {
                return false;
            }
            scope.include_deleted_investors || self.investor(id).is_none_or(|inv| !inv.deleted)
        };

        let cages: Vec<Cage> = self
            .cages
            .iter()
            .filter(|c| visible_investor(c.investor_id))
            .filter(|c| scope.farmer_id.is_none() || c.farmer_id == scope.farmer_id)
            .filter(|c| scope.cage_id.is_none_or(|want| want == c.id))
            .cloned()
            .collect();
        let cage_ids: HashSet<CageId> = cages.iter().map(|c| c.id).collect();

        let samplings: Vec<Sampling> = self
            .samplings
            .iter()
            .filter(|s| cage_ids.contains(&s.cage_id) && visible_investor(s.investor_id))
            .filter(|s| scope.contains_date(s.date))
            .cloned()
            .collect();
        let sampling_ids: HashSet<SamplingId> = samplings.iter().map(|s| s.id).collect();

        Self {
            investors: self.investors.clone(),
            cages,
            samples: self
                .samples
                .iter()
                .filter(|s| sampling_ids.contains(&s.sampling_id))
                .cloned()
                .collect(),
            samplings,
            feed_consumptions: self
                .feed_consumptions
                .iter()
                .filter(|f| cage_ids.contains(&f.cage_id))
                .cloned()
                .collect(),
        }
    }
}

/// Visibility predicate applied to a dataset before any analytics run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    /// Restrict to one investor's cages and samplings.
    pub investor_id: Option<InvestorId>,
    /// Restrict to cages managed by one farmer.
    pub farmer_id: Option<UserId>,
    /// Restrict to a single cage.
    pub cage_id: Option<CageId>,
    /// Inclusive lower bound on sampling date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on sampling date.
    pub date_to: Option<NaiveDate>,
    /// Keep records of soft-deleted investors.
    pub include_deleted_investors: bool,
}

impl Scope {
    /// Unrestricted scope that still hides soft-deleted investors.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn investor(id: InvestorId) -> Self {
        Self {
            investor_id: Some(id),
            ..Self::default()
        }
    }

    pub fn farmer(id: UserId) -> Self {
        Self {
            farmer_id: Some(id),
            ..Self::default()
        }
    }

    fn contains_date(&self, date: NaiveDate) -> bool {
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }
}
