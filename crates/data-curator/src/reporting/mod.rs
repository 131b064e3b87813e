//! Report generation module.
//!
//! Serializes the metadata, check results and processing ledger of a run
//! to JSON, and saves the remediated datasets as CSV.
//!
//! # Example
//!
//! ```rust,ignore
//! use data_curator::reporting::ReportGenerator;
//! use std::path::PathBuf;
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"), true);
//! generator.write_check_outputs(&metadata, &checks)?;
//! ```

mod generator;

pub use generator::{
    CHECKER_OUTPUT_FILE, META_FILE, PROCESSOR_OUTPUT_FILE, ReportGenerator, checker_output,
};
