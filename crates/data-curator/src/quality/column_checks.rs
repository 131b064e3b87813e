//! Independent per-column checks.
//!
//! Each check maps every column of a dataset to a verdict. None of them
//! raise for data-quality problems; an empty dataset simply fails the
//! cardinality check for every column.

use crate::profiler::ColumnStats;
use crate::types::{FeatureDtype, Verdict};
use std::collections::BTreeMap;

/// FAIL iff the column has at least one missing value but is not entirely missing.
pub fn missing_value_check(stats: &[ColumnStats]) -> BTreeMap<String, Verdict> {
    stats
        .iter()
        .map(|s| {
            let fail = s.any_missing() && !s.all_missing();
            (s.name.clone(), Verdict::from_fail(fail))
        })
        .collect()
}

/// FAIL iff every value is unique and spread over at least as many values
/// as there are rows, or the column holds a single value, or it is
/// entirely missing.
pub fn critical_cardinality_check(stats: &[ColumnStats]) -> BTreeMap<String, Verdict> {
    stats
        .iter()
        .map(|s| {
            let rows = s.rows;
            let fully_unique = s.distinct == rows && s.spread() >= rows as f64;
            let constant = s.distinct == 1;
            let fail = fully_unique || constant || s.all_missing();
            (s.name.clone(), Verdict::from_fail(fail))
        })
        .collect()
}

/// Numeric storage only: FAIL iff the distinct count is at or below the threshold.
pub fn low_cardinality_check(
    stats: &[ColumnStats],
    cat_to_num_threshold: usize,
) -> BTreeMap<String, Verdict> {
    stats
        .iter()
        .map(|s| {
            let verdict = if s.numeric {
                Verdict::from_fail(s.distinct <= cat_to_num_threshold)
            } else {
                Verdict::NotApplicable
            };
            (s.name.clone(), verdict)
        })
        .collect()
}

/// Train/test dtype consistency.
///
/// Returns `(train verdicts, test verdicts)`. Train columns are all
/// `Not_Applicable`; a test column is compared against the train tag when
/// train has it, and is `Not_Applicable` otherwise.
pub fn dtype_check(
    train_dtypes: &BTreeMap<String, FeatureDtype>,
    test_dtypes: &BTreeMap<String, FeatureDtype>,
) -> (BTreeMap<String, Verdict>, BTreeMap<String, Verdict>) {
    let train = train_dtypes
        .keys()
        .map(|column| (column.clone(), Verdict::NotApplicable))
        .collect();

    let test = test_dtypes
        .iter()
        .map(|(column, test_dtype)| {
            let verdict = match train_dtypes.get(column) {
                Some(train_dtype) => Verdict::from_fail(train_dtype != test_dtype),
                None => Verdict::NotApplicable,
            };
            (column.clone(), verdict)
        })
        .collect();

    (train, test)
}
