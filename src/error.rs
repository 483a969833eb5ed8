//! Error types for the fallible edges of the crate.
//!
//! The growth and feeding computations themselves never fail; they fall back
//! to safe defaults. Errors only come from loading data, validating user
//! input, and the stateful schedule and sample-slot stores.

use thiserror::Error;

use crate::config::ConfigError;
use crate::model::{CageId, SamplingId, ScheduleId};

#[derive(Debug, Error)]
pub enum GrowoutError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid dataset: {0}")]
    Dataset(String),

    #[error("validation failed on `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("cage {0} not found")]
    CageNotFound(CageId),

    #[error("sampling {0} not found")]
    SamplingNotFound(SamplingId),

    #[error("feeding schedule {0} not found")]
    ScheduleNotFound(ScheduleId),

    #[error("Cage {0} already has an active schedule")]
    ActiveScheduleExists(CageId),

    #[error("All data is filled in this sampling.")]
    SlotsFull(SamplingId),

    #[error("Something went wrong while processing.")]
    ProcessingFailed,

    #[error("could not find a free DOC code for {date} after {attempts} attempts")]
    DocCodeExhausted { date: String, attempts: u32 },
}

impl GrowoutError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GrowoutError>;
