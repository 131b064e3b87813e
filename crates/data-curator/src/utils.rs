//! Shared utilities for the curation pipeline.
//!
//! Missing-value semantics live here so every check and every remediation
//! agrees on them: a cell is missing if it is null, a non-finite float
//! (NaN or ±infinity), or a whitespace-only string.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::fmt;

static BLANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*$").expect("Invalid regex: blank"));

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is an integer type (signed or unsigned).
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is a float type.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || is_float_dtype(dtype)
}

/// Check if a DataType holds text.
#[inline]
pub fn is_string_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

/// Check if a string is empty or whitespace only.
#[inline]
pub fn is_blank(s: &str) -> bool {
    BLANK_RE.is_match(s)
}

// =============================================================================
// Missing Values
// =============================================================================

/// Per-row missing flags for a Series.
pub fn missing_flags(series: &Series) -> PolarsResult<Vec<bool>> {
    let dtype = series.dtype();
    if is_float_dtype(dtype) {
        let cast = series.cast(&DataType::Float64)?;
        Ok(cast
            .f64()?
            .into_iter()
            .map(|v| v.is_none_or(|x| !x.is_finite()))
            .collect())
    } else if is_string_dtype(dtype) {
        let cast = series.cast(&DataType::String)?;
        Ok(cast
            .str()?
            .into_iter()
            .map(|v| v.is_none_or(is_blank))
            .collect())
    } else {
        Ok(series
            .is_null()
            .into_iter()
            .map(|v| v.unwrap_or(true))
            .collect())
    }
}

/// Number of missing cells.
pub fn missing_count(series: &Series) -> PolarsResult<usize> {
    Ok(missing_flags(series)?.into_iter().filter(|m| *m).count())
}

/// Keep only the non-missing cells of a Series.
pub fn non_missing(series: &Series) -> PolarsResult<Series> {
    let keep: Vec<bool> = missing_flags(series)?.into_iter().map(|m| !m).collect();
    let mask = BooleanChunked::from_slice(series.name().clone(), &keep);
    series.filter(&mask)
}

/// Count of distinct non-missing values.
pub fn distinct_count(series: &Series) -> PolarsResult<usize> {
    let values = non_missing(series)?;
    if values.is_empty() {
        return Ok(0);
    }
    values.n_unique()
}

/// `max - min` over non-missing values of a numeric Series.
///
/// Returns None for non-numeric storage or when every value is missing.
pub fn numeric_range(series: &Series) -> PolarsResult<Option<f64>> {
    if !is_numeric_dtype(series.dtype()) {
        return Ok(None);
    }
    let values = finite_values(series)?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() {
        Ok(None)
    } else {
        Ok(Some(max - min))
    }
}

/// Non-missing values of a numeric Series as f64.
pub fn finite_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .flatten()
        .filter(|x| x.is_finite())
        .collect())
}

// =============================================================================
// Cell Materialization
// =============================================================================

/// A single non-missing value, comparable across int and float storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(x) => write!(f, "{}", x),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Materialize a column as cells, `None` where the value is missing.
pub fn column_cells(series: &Series) -> PolarsResult<Vec<Option<Cell>>> {
    if is_numeric_dtype(series.dtype()) {
        let cast = series.cast(&DataType::Float64)?;
        Ok(cast
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()).map(Cell::Number))
            .collect())
    } else {
        let cast = series.cast(&DataType::String)?;
        Ok(cast
            .str()?
            .into_iter()
            .map(|v| {
                v.filter(|s| !is_blank(s))
                    .map(|s| Cell::Text(s.to_string()))
            })
            .collect())
    }
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Replace missing cells of a numeric Series with `fill_value`.
///
/// Integer columns stay integer when the fill value is integral; otherwise
/// the result is Float64.
pub fn fill_numeric_missing(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let flags = missing_flags(series)?;
    let cast = series.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = cast
        .f64()?
        .into_iter()
        .zip(flags)
        .map(|(v, missing)| if missing { Some(fill_value) } else { v })
        .collect();

    let filled = Series::new(series.name().clone(), values);
    if is_integer_dtype(series.dtype()) && fill_value.fract() == 0.0 {
        filled.cast(&DataType::Int64)
    } else {
        Ok(filled)
    }
}

/// Replace missing cells of a Series with a string value.
pub fn fill_string_missing(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let flags = missing_flags(series)?;
    let cast = series.cast(&DataType::String)?;
    let values: Vec<Option<String>> = cast
        .str()?
        .into_iter()
        .zip(flags)
        .map(|(v, missing)| {
            if missing {
                Some(fill_value.to_string())
            } else {
                v.map(str::to_string)
            }
        })
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

/// Percentage of rows lost going from `before` to `after` rows.
pub fn drop_percentage(before: usize, after: usize) -> f64 {
    if before == 0 {
        0.0
    } else {
        (before.saturating_sub(after) as f64 / before as f64) * 100.0
    }
}

// =============================================================================
// Tests
// =============================================================================
