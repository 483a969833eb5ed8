//! Growth and feeding analytics for cage aquaculture.
//!
//! Sample statistics, biomass and FCR, growth-rate estimation, harvest
//! projection, and feeding schedule generation over an in-memory farm dataset.

/// Biomass, growth, harvest projection, and reports.
pub mod analytics;
pub mod config;
pub mod dataset;
pub mod error;
/// Rations, schedule generation, the schedule store, and adherence.
pub mod feeding;
pub mod io;
pub mod logging;
pub mod model;
pub mod sampling;

#[cfg(feature = "api")]
pub mod api;

pub use error::{GrowoutError, Result};
