//! Imputation module for handling missing values.
//!
//! Statistical imputation (mean, median, most frequent) with a separate fit
//! and transform so train statistics can be applied to test data.

mod statistical;

pub use statistical::{FillValue, FittedImputer, ImputationStrategy, StatisticalImputer};
