//! Per-column statistics shared by type inference and the checks.

use crate::utils::{distinct_count, is_numeric_dtype, missing_count, numeric_range};
use polars::prelude::*;
use serde::Serialize;

/// Summary of one column, computed once per dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub name: String,
    /// Position of the column in its dataset.
    pub position: usize,
    pub rows: usize,
    pub missing: usize,
    /// Distinct non-missing values.
    pub distinct: usize,
    pub numeric: bool,
    /// `max - min` for numeric storage with at least one value.
    pub range: Option<f64>,
}

impl ColumnStats {
    pub(crate) fn compute(series: &Series, position: usize) -> PolarsResult<Self> {
        Ok(Self {
            name: series.name().to_string(),
            position,
            rows: series.len(),
            missing: missing_count(series)?,
            distinct: distinct_count(series)?,
            numeric: is_numeric_dtype(series.dtype()),
            range: numeric_range(series)?,
        })
    }

    /// True for an empty column as well as a column of only missing cells.
    pub fn all_missing(&self) -> bool {
        self.missing == self.rows
    }

    pub fn any_missing(&self) -> bool {
        self.missing > 0
    }

    /// Spread used by the critical cardinality check: the numeric range,
    /// or the distinct count for non-numeric storage.
    pub fn spread(&self) -> f64 {
        match (self.numeric, self.range) {
            (true, Some(range)) => range,
            _ => self.distinct as f64,
        }
    }
}

/// Statistics for every column of a dataset, in column order.
pub(crate) fn dataset_stats(df: &DataFrame) -> PolarsResult<Vec<ColumnStats>> {
    df.get_columns()
        .iter()
        .enumerate()
        .map(|(position, column)| ColumnStats::compute(column.as_materialized_series(), position))
        .collect()
}
