//! Rule-based learning type selection.

use crate::error::{CuratorError, Result, ResultExt};
use crate::types::{LearningType, Metadata};
use crate::utils::{distinct_count, is_numeric_dtype};
use polars::prelude::*;
use tracing::debug;

/// Chooses the learning type from target presence and cardinality.
///
/// Decision order, first match wins:
/// 1. no target column: unsupervised
/// 2. non-numeric target, or distinct count at or below the threshold: classification
/// 3. otherwise: regression
pub struct RuleBasedDispatcher {
    cat_to_num_threshold: usize,
}

impl RuleBasedDispatcher {
    pub fn new(cat_to_num_threshold: usize) -> Self {
        Self {
            cat_to_num_threshold,
        }
    }

    pub fn determine_learning_type(
        &self,
        df: &DataFrame,
        target: Option<&str>,
    ) -> Result<LearningType> {
        let Some(target) = target else {
            debug!("data is of unsupervised learning format");
            return Ok(LearningType::Unsupervised);
        };

        let series = df
            .column(target)
            .map_err(|_| CuratorError::ColumnNotFound(target.to_string()))?
            .as_materialized_series();

        let distinct = distinct_count(series).context("Failed to count target classes")?;
        let learning_type =
            if !is_numeric_dtype(series.dtype()) || distinct <= self.cat_to_num_threshold {
                LearningType::Classification
            } else {
                LearningType::Regression
            };

        debug!("data is of {} learning format", learning_type);
        Ok(learning_type)
    }

    /// Record the learning type of the main dataset in metadata.
    pub fn dispatch(&self, df: &DataFrame, mut metadata: Metadata) -> Result<Metadata> {
        let learning_type =
            self.determine_learning_type(df, metadata.main_target_col.as_deref())?;
        metadata.learning_type = Some(learning_type);
        Ok(metadata)
    }
}
