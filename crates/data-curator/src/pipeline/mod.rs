//! Pipeline module.
//!
//! This module provides the curation pipeline and its two stages: the
//! check stage and the remediation stage.

mod builder;
mod checker;
mod processor;

pub use builder::{CurationResult, Pipeline, PipelineBuilder};
pub use checker::DataChecker;
pub use processor::{DataProcessor, ProcessedData};
