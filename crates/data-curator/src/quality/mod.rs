//! Data quality checks.
//!
//! Column checks produce one verdict per column; dataset checks produce
//! whole-dataset diagnostics. Results are collected in [`DataChecks`].

mod column_checks;
mod dataset_checks;
mod duplicates;
mod results;

pub use column_checks::{
    critical_cardinality_check, dtype_check, low_cardinality_check, missing_value_check,
};
pub use dataset_checks::{
    CLASS_BALANCE_MIN_RATIO, ClassBalance, ValidationReco, class_balance_check,
    target_sanity_check, validation_recommendation,
};
pub use duplicates::{DuplicateReport, duplicate_check};
pub use results::{CheckMatrix, CheckName, DataChecks};
