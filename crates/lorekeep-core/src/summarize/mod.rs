//! Human-readable summary generation over persisted data.

pub mod generator;

pub use generator::SummaryGenerator;
