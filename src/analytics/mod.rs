//! Growth analytics: biomass and FCR, growth rate, harvest projection, and the
//! per-cage series, reports and period dashboard built from them.
//!
//! Everything here is a pure function over data fetched up front. Missing
//! history and zero divisors degrade to documented defaults instead of errors;
//! only lookups of unknown ids fail.

pub mod biomass;
pub mod dashboard;
pub mod growth;
pub mod harvest;
pub mod report;
pub mod series;

pub use biomass::{BiomassResult, SamplingPoint, compute_biomass};
pub use dashboard::{Dashboard, DashboardPeriod, DateRange, dashboard};
pub use growth::{GrowthPoint, estimate_growth_rate};
pub use harvest::{
    CageHarvest, HarvestEstimate, anticipate_harvests, estimate_for_cage, project_harvest,
};
pub use report::{ReportSummary, SamplingReport, overall_summary, sampling_report};
pub use series::{HistoryRow, cage_history};
