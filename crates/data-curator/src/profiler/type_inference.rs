//! Semantic type inference for columns.

use crate::error::{CuratorError, Result};
use crate::types::{BaseType, FeatureDtype};
use crate::utils::{is_float_dtype, is_integer_dtype, is_string_dtype};
use polars::prelude::*;

use super::statistics::ColumnStats;

/// Map a storage type to its base type.
///
/// Anything outside float, integer and string storage is an error rather
/// than a silent coercion.
pub(crate) fn base_type(column: &str, dtype: &DataType) -> Result<BaseType> {
    if is_float_dtype(dtype) {
        Ok(BaseType::Float)
    } else if is_integer_dtype(dtype) {
        Ok(BaseType::Int)
    } else if is_string_dtype(dtype) {
        Ok(BaseType::String)
    } else {
        Err(CuratorError::UndefinedDtype {
            column: column.to_string(),
            dtype: dtype.to_string(),
        })
    }
}

/// Base type plus `_discreet` when the distinct count is at or below the threshold.
pub(crate) fn infer_feature_dtype(
    series: &Series,
    stats: &ColumnStats,
    cat_to_num_threshold: usize,
) -> Result<FeatureDtype> {
    let base = base_type(&stats.name, series.dtype())?;
    Ok(FeatureDtype::new(base, stats.distinct <= cat_to_num_threshold))
}
