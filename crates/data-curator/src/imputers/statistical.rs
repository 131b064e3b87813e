//! Statistical imputation methods.
//!
//! Imputers are fitted on one dataset and applied to any number of others,
//! so the fill value never depends on the datasets being transformed.

use crate::config::{CategoricalImputation, NumericImputation};
use crate::error::{CuratorError, Result, ResultExt};
use crate::utils::{
    Cell, column_cells, fill_numeric_missing, fill_string_missing, is_numeric_dtype,
    missing_count,
};
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Statistic used to compute the fill value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    Mean,
    Median,
    MostFrequent,
}

impl From<NumericImputation> for ImputationStrategy {
    fn from(method: NumericImputation) -> Self {
        match method {
            NumericImputation::Mean => Self::Mean,
            NumericImputation::Median => Self::Median,
            NumericImputation::MostFrequent => Self::MostFrequent,
        }
    }
}

impl From<CategoricalImputation> for ImputationStrategy {
    fn from(method: CategoricalImputation) -> Self {
        match method {
            CategoricalImputation::MostFrequent => Self::MostFrequent,
        }
    }
}

/// Value written into missing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillValue::Number(x) => write!(f, "{}", x),
            FillValue::Text(s) => f.write_str(s),
        }
    }
}

/// Fill value of one column, learned from the fit dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedImputer {
    pub column: String,
    pub strategy: ImputationStrategy,
    pub fill: FillValue,
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Learn the fill value of `column` from `df`.
    pub fn fit(df: &DataFrame, column: &str, strategy: ImputationStrategy) -> Result<FittedImputer> {
        let series = df
            .column(column)
            .map_err(|_| CuratorError::ColumnNotFound(column.to_string()))?
            .as_materialized_series();

        let cells: Vec<Cell> = column_cells(series)
            .context(format!("Failed to read '{}' for imputation", column))?
            .into_iter()
            .flatten()
            .collect();

        if cells.is_empty() {
            return Err(CuratorError::ImputationFailed {
                column: column.to_string(),
                reason: "no non-missing values to fit on".to_string(),
            });
        }

        let fill = match strategy {
            ImputationStrategy::Mean => FillValue::Number(Self::mean(column, &cells)?),
            ImputationStrategy::Median => FillValue::Number(Self::median(column, &cells)?),
            ImputationStrategy::MostFrequent => Self::most_frequent(cells),
        };

        Ok(FittedImputer {
            column: column.to_string(),
            strategy,
            fill,
        })
    }

    /// Replace the missing cells of the fitted column in `df`.
    ///
    /// Returns the number of cells filled. A dataset without the column is
    /// left untouched.
    pub fn transform(df: &mut DataFrame, fitted: &FittedImputer) -> Result<usize> {
        let Ok(column) = df.column(&fitted.column) else {
            return Ok(0);
        };
        let series = column.as_materialized_series();
        let filled_count = missing_count(series)?;
        if filled_count == 0 {
            return Ok(0);
        }

        let filled = match (&fitted.fill, is_numeric_dtype(series.dtype())) {
            (FillValue::Number(value), true) => fill_numeric_missing(series, *value)?,
            (fill, _) => fill_string_missing(series, &fill.to_string())?,
        };
        df.replace(&fitted.column, filled)
            .context(format!("Failed to write imputed column '{}'", fitted.column))?;

        Ok(filled_count)
    }

    fn numbers(column: &str, cells: &[Cell]) -> Result<Vec<f64>> {
        cells
            .iter()
            .map(|cell| match cell {
                Cell::Number(x) => Ok(*x),
                Cell::Text(_) => Err(CuratorError::ImputationFailed {
                    column: column.to_string(),
                    reason: "numeric strategy on non-numeric values".to_string(),
                }),
            })
            .collect()
    }

    fn mean(column: &str, cells: &[Cell]) -> Result<f64> {
        let values = Self::numbers(column, cells)?;
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    fn median(column: &str, cells: &[Cell]) -> Result<f64> {
        let mut values = Self::numbers(column, cells)?;
        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            Ok((values[mid - 1] + values[mid]) / 2.0)
        } else {
            Ok(values[mid])
        }
    }

    /// Most frequent value; the smallest value wins ties.
    fn most_frequent(mut cells: Vec<Cell>) -> FillValue {
        cells.sort_by(compare_cells);

        let mut best: Option<(&Cell, usize)> = None;
        let mut start = 0;
        while start < cells.len() {
            let mut end = start + 1;
            while end < cells.len() && cells[end] == cells[start] {
                end += 1;
            }
            let run = end - start;
            if best.is_none_or(|(_, count)| run > count) {
                best = Some((&cells[start], run));
            }
            start = end;
        }

        match best.map(|(cell, _)| cell) {
            Some(Cell::Number(x)) => FillValue::Number(*x),
            Some(Cell::Text(s)) => FillValue::Text(s.clone()),
            None => FillValue::Text(String::new()),
        }
    }
}

fn compare_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.total_cmp(y),
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        (Cell::Number(_), Cell::Text(_)) => Ordering::Less,
        (Cell::Text(_), Cell::Number(_)) => Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(df: &DataFrame, strategy: ImputationStrategy) -> FittedImputer {
        StatisticalImputer::fit(df, "x", strategy).unwrap()
    }

    #[test]
    fn test_fit_mean_and_median() {
        let df = df!["x" => [Some(1.0), None, Some(2.0), Some(9.0)]].unwrap();
        assert_eq!(fit(&df, ImputationStrategy::Mean).fill, FillValue::Number(4.0));
        assert_eq!(fit(&df, ImputationStrategy::Median).fill, FillValue::Number(2.0));

        let even = df!["x" => [1.0, 2.0, 3.0, 10.0]].unwrap();
        assert_eq!(fit(&even, ImputationStrategy::Median).fill, FillValue::Number(2.5));
    }

    #[test]
    fn test_fit_most_frequent_ties_pick_smallest() {
        let df = df!["x" => [Some(3), Some(1), Some(3), Some(1), None]].unwrap();
        assert_eq!(
            fit(&df, ImputationStrategy::MostFrequent).fill,
            FillValue::Number(1.0)
        );

        let text = df!["x" => ["b", "a", "b", "c"]].unwrap();
        assert_eq!(
            fit(&text, ImputationStrategy::MostFrequent).fill,
            FillValue::Text("b".to_string())
        );
    }

    #[test]
    fn test_mean_on_text_fails() {
        let df = df!["x" => ["a", "b"]].unwrap();
        let err = StatisticalImputer::fit(&df, "x", ImputationStrategy::Mean).unwrap_err();
        assert_eq!(err.error_code(), "IMPUTATION_FAILED");
    }

    #[test]
    fn test_fit_all_missing_fails() {
        let df = df!["x" => [None::<f64>, None]].unwrap();
        assert!(StatisticalImputer::fit(&df, "x", ImputationStrategy::Mean).is_err());
    }

    #[test]
    fn test_transform_other_dataset() {
        let train = df!["x" => [Some(2.0), Some(4.0), None]].unwrap();
        let mut test = df!["x" => [None, Some(100.0)]].unwrap();

        let fitted = fit(&train, ImputationStrategy::Mean);
        let filled = StatisticalImputer::transform(&mut test, &fitted).unwrap();

        assert_eq!(filled, 1);
        let values: Vec<_> = test.column("x").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(3.0), Some(100.0)]);
    }

    #[test]
    fn test_transform_blank_strings() {
        let mut df = df!["x" => [Some("a"), Some(" "), None, Some("a")]].unwrap();
        let fitted = fit(&df, ImputationStrategy::MostFrequent);
        assert_eq!(StatisticalImputer::transform(&mut df, &fitted).unwrap(), 2);
        assert_eq!(missing_count(df.column("x").unwrap().as_materialized_series()).unwrap(), 0);
    }

    #[test]
    fn test_transform_missing_column_is_noop() {
        let train = df!["x" => [1.0, 2.0]].unwrap();
        let mut other = df!["y" => [None::<f64>]].unwrap();
        let fitted = fit(&train, ImputationStrategy::Mean);
        assert_eq!(StatisticalImputer::transform(&mut other, &fitted).unwrap(), 0);
    }
}
