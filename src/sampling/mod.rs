//! Sample aggregation and the ingestion helpers that produce samples.

/// Summary statistics over one sampling's samples.
pub mod aggregate;
/// Day-of-culture code generation.
pub mod doc_code;
pub mod slots;

pub use aggregate::{SampleSummary, aggregate_samples};
pub use doc_code::DocCodeGenerator;
pub use slots::{FillOutcome, SlotBoard, SlotProgress, weight_from_dimensions};
