//! Data Curator Library
//!
//! A pre-modeling data-quality gate built with Rust and Polars.
//!
//! # Overview
//!
//! Given one dataset ("total") or a train/test pair, the curator:
//!
//! - **Infers feature dtypes**: base type (float, int, string) plus a
//!   `_discreet` tag for columns at or below the unique-value threshold
//! - **Dispatches a learning type**: unsupervised, classification or regression
//! - **Runs column checks**: missing values, critical and low cardinality,
//!   duplicate columns with base-column resolution, train/test dtypes
//! - **Runs dataset checks**: validation recommendation, class balance,
//!   target sanity
//! - **Remediates**: removes critical and duplicate columns from both datasets,
//!   imputes missing values with statistics fitted on the main dataset only,
//!   and drops rows with a missing target
//! - **Keeps a ledger** of every remediation applied
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use data_curator::{CuratorConfig, DataFiles, Pipeline};
//!
//! let files = DataFiles::from_filenames(&["train.csv", "test.csv"])?;
//! let config = CuratorConfig::builder()
//!     .target_column("label")
//!     .output_dir("output")
//!     .build()?;
//!
//! let result = Pipeline::builder().config(config).build()?.run_files(&files)?;
//!
//! println!("Learning type: {:?}", result.metadata.learning_type);
//! println!("Row status: {:?}", result.ledger.row_processing);
//! ```
//!
//! In-memory frames go through [`Pipeline::curate_frames`]; nothing is
//! written to disk in that case.
//!
//! # Configuration
//!
//! Use [`CuratorConfig`] to customize the run:
//!
//! ```rust,ignore
//! use data_curator::config::*;
//!
//! let params = Params::from_json_str(r#"{"numeric_imputation_method": "median"}"#)?;
//! let config = CuratorConfig::builder()
//!     .cat_to_num_threshold(50)
//!     .params(params)
//!     .no_target(true)
//!     .build()?;
//! ```

pub mod config;
pub mod decisions;
pub mod error;
pub mod imputers;
pub mod ledger;
pub mod pipeline;
pub mod profiler;
pub mod quality;
pub mod reader;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    CategoricalImputation, ConfigValidationError, CuratorConfig, CuratorConfigBuilder,
    NumericImputation, Params,
};
pub use decisions::RuleBasedDispatcher;
pub use error::{CuratorError, Result as CuratorResult, ResultExt};
pub use imputers::{FillValue, FittedImputer, ImputationStrategy, StatisticalImputer};
pub use ledger::{ColumnStatus, ProcessingLedger, RowStatus};
pub use pipeline::{
    CurationResult, DataChecker, DataProcessor, Pipeline, PipelineBuilder, ProcessedData,
};
pub use profiler::DataProfiler;
pub use quality::{CheckMatrix, CheckName, ClassBalance, DataChecks, ValidationReco};
pub use reader::{DataFiles, DataReader};
pub use reporting::ReportGenerator;
pub use types::{
    BaseType, DataKey, DatasetCollection, FeatureDtype, LearningType, Metadata, SplitType,
    Verdict,
};
