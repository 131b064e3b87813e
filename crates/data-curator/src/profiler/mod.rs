//! Data profiling module.
//!
//! This module provides:
//! - Per-column statistics (missing, distinct, numeric range)
//! - Semantic type inference (`float`, `int`, `string` and their `_discreet` forms)

mod statistics;
mod type_inference;

pub use statistics::ColumnStats;

use crate::error::{Result, ResultExt};
use crate::types::{DatasetCollection, FeatureDtype, Metadata};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use type_inference::infer_feature_dtype;

/// Data profiler for column statistics and type inference.
pub struct DataProfiler;

impl DataProfiler {
    /// Statistics for every column of a dataset, in column order.
    pub fn profile_dataset(df: &DataFrame) -> Result<Vec<ColumnStats>> {
        statistics::dataset_stats(df).context("Failed to compute column statistics")
    }

    /// Infer the semantic tag of every column of a dataset.
    pub fn infer_dtypes(
        df: &DataFrame,
        cat_to_num_threshold: usize,
    ) -> Result<BTreeMap<String, FeatureDtype>> {
        let stats = Self::profile_dataset(df)?;
        let mut dtypes = BTreeMap::new();

        for (column, column_stats) in df.get_columns().iter().zip(&stats) {
            let dtype = infer_feature_dtype(
                column.as_materialized_series(),
                column_stats,
                cat_to_num_threshold,
            )?;
            dtypes.insert(column_stats.name.clone(), dtype);
        }

        Ok(dtypes)
    }

    /// Annotate metadata with the semantic tags of the main and, when
    /// present, the secondary dataset.
    pub fn annotate(data: &DatasetCollection, mut metadata: Metadata) -> Result<Metadata> {
        for key in metadata.data_keys() {
            let df = data.require(key)?;
            let dtypes = Self::infer_dtypes(df, metadata.cat_to_num_threshold)
                .context(format!("Type inference failed for {} data", key))?;
            debug!("{} feature dtypes: {:?}", key, dtypes);
            metadata.feature_dtypes.insert(key, dtypes);
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataKey, SplitType};

    #[test]
    fn test_infer_dtypes() {
        let df = df![
            "price" => [1.5, 2.5, 3.5, 4.5],
            "count" => [1, 2, 3, 4],
            "city" => ["a", "b", "a", "b"],
        ]
        .unwrap();

        let dtypes = DataProfiler::infer_dtypes(&df, 3).unwrap();
        assert_eq!(dtypes["price"], FeatureDtype::Float);
        assert_eq!(dtypes["count"], FeatureDtype::Int);
        assert_eq!(dtypes["city"], FeatureDtype::StringDiscreet);
    }

    #[test]
    fn test_annotate_both_keys() {
        let train = df!["x" => [1.0, 2.0]].unwrap();
        let test = df!["x" => ["a", "b"]].unwrap();
        let data = DatasetCollection::TrainTest { train, test };
        let metadata = Metadata::new(SplitType::TrainTest, 100);

        let metadata = DataProfiler::annotate(&data, metadata).unwrap();
        assert_eq!(
            metadata.dtype_of(DataKey::Train, "x"),
            Some(FeatureDtype::FloatDiscreet)
        );
        assert_eq!(
            metadata.dtype_of(DataKey::Test, "x"),
            Some(FeatureDtype::StringDiscreet)
        );
    }

    #[test]
    fn test_annotate_rejects_unclassifiable_storage() {
        let df = df!["flag" => [true, false]].unwrap();
        let data = DatasetCollection::Total(df);
        let metadata = Metadata::new(SplitType::Total, 100);

        let err = DataProfiler::annotate(&data, metadata).unwrap_err();
        assert_eq!(err.error_code(), "UNDEFINED_DTYPE");
    }
}
