//! Check stage: runs the ordered check steps of a learning type.

use crate::decisions::{CheckStep, check_steps};
use crate::error::{CuratorError, Result, ResultExt};
use crate::profiler::{ColumnStats, DataProfiler};
use crate::quality::{
    CheckMatrix, CheckName, DataChecks, class_balance_check, critical_cardinality_check,
    dtype_check, duplicate_check, low_cardinality_check, missing_value_check,
    target_sanity_check, validation_recommendation,
};
use crate::types::{DataKey, DatasetCollection, Metadata, SplitType, Verdict};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Runs the column and dataset checks over every present dataset.
pub struct DataChecker<'a> {
    data: &'a DatasetCollection,
    stats: BTreeMap<DataKey, Vec<ColumnStats>>,
}

impl<'a> DataChecker<'a> {
    pub fn new(data: &'a DatasetCollection) -> Result<Self> {
        let stats = data
            .iter()
            .map(|(key, df)| Ok((key, DataProfiler::profile_dataset(df)?)))
            .collect::<Result<_>>()?;
        Ok(Self { data, stats })
    }

    /// Run the check steps for `metadata.learning_type`.
    ///
    /// Metadata must already carry feature dtypes and a learning type; class
    /// balance results are added to it.
    pub fn run(&self, mut metadata: Metadata) -> Result<(Metadata, DataChecks)> {
        let learning_type = metadata.learning_type.ok_or_else(|| {
            CuratorError::InternalConsistency("learning type not set before checks".to_string())
        })?;

        let mut checks = DataChecks::default();
        for (key, df) in self.data.iter() {
            let columns = df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect();
            checks.column_checks.insert(key, CheckMatrix::new(columns));
        }

        for step in check_steps(learning_type) {
            debug!("running check step {:?}", step);
            match step {
                CheckStep::MissingValues => {
                    self.per_dataset(&mut checks, CheckName::MissingValue, missing_value_check)
                }
                CheckStep::CriticalCardinality => self.per_dataset(
                    &mut checks,
                    CheckName::CriticalCardinality,
                    critical_cardinality_check,
                ),
                CheckStep::LowCardinality => {
                    let threshold = metadata.cat_to_num_threshold;
                    self.per_dataset(&mut checks, CheckName::LowCardinality, |stats| {
                        low_cardinality_check(stats, threshold)
                    })
                }
                CheckStep::Duplicates => self.check_duplicates(&mut checks)?,
                CheckStep::ValidationSplit => {
                    let rows = self.data.require(metadata.main_data_key)?.height();
                    let reco = validation_recommendation(rows);
                    debug!("validation recommendation for {} rows: {:?}", rows, reco);
                    checks.validation_reco = Some(reco);
                }
                CheckStep::ClassBalance => self.check_class_balance(&mut checks, &mut metadata)?,
                CheckStep::Memory => debug!("memory check not enforced"),
                CheckStep::Frequency => debug!("frequency check not implemented"),
                CheckStep::TrainTestDtypes => self.check_train_test_dtypes(&mut checks, &metadata),
                CheckStep::TargetSanity => {
                    let target = main_target(&metadata)?;
                    let matrix = checks.matrix(metadata.main_data_key).ok_or_else(|| {
                        CuratorError::InternalConsistency(format!(
                            "no check results for {} data",
                            metadata.main_data_key
                        ))
                    })?;
                    target_sanity_check(matrix, target)?;
                    debug!("PASSED: target column '{}' has every verdict", target);
                }
            }
        }

        info!(
            "{} checks complete: {} FAIL verdicts",
            learning_type,
            checks.fail_count()
        );
        Ok((metadata, checks))
    }

    fn per_dataset<F>(&self, checks: &mut DataChecks, check: CheckName, compute: F)
    where
        F: Fn(&[ColumnStats]) -> BTreeMap<String, Verdict>,
    {
        for (key, stats) in &self.stats {
            if let Some(matrix) = checks.column_checks.get_mut(key) {
                matrix.insert(check, compute(stats));
            }
        }
    }

    fn check_duplicates(&self, checks: &mut DataChecks) -> Result<()> {
        for (key, df) in self.data.iter() {
            let stats = self.stats.get(&key).map(Vec::as_slice).unwrap_or_default();
            let report = duplicate_check(df, stats)
                .context(format!("Duplicate check failed for {} data", key))?;
            if let Some(matrix) = checks.column_checks.get_mut(&key) {
                matrix.insert(CheckName::Duplicate, report.verdicts);
                matrix.duplicate_bases = report.bases;
            }
        }
        Ok(())
    }

    fn check_class_balance(&self, checks: &mut DataChecks, metadata: &mut Metadata) -> Result<()> {
        let target = main_target(metadata)?;
        let df = self.data.require(metadata.main_data_key)?;
        let series = df
            .column(target)
            .map_err(|_| CuratorError::ColumnNotFound(target.to_string()))?
            .as_materialized_series();

        let balance = class_balance_check(series)?;
        info!(
            "class balance {}: minority {:?} ({:?}%), majority {:?} ({:?}%)",
            balance.verdict,
            balance.minority_class,
            balance.minority_class_percentage,
            balance.majority_class,
            balance.majority_class_percentage
        );

        metadata.minority_class = balance.minority_class.clone();
        metadata.majority_class = balance.majority_class.clone();
        metadata.minority_class_percentage = balance.minority_class_percentage;
        metadata.majority_class_percentage = balance.majority_class_percentage;
        checks.class_balance = Some(balance);
        Ok(())
    }

    fn check_train_test_dtypes(&self, checks: &mut DataChecks, metadata: &Metadata) {
        if metadata.split_type == SplitType::Total {
            debug!("dtype check skipped for total data");
            return;
        }

        let empty = BTreeMap::new();
        let train_dtypes = metadata.feature_dtypes.get(&DataKey::Train).unwrap_or(&empty);
        let test_dtypes = metadata.feature_dtypes.get(&DataKey::Test).unwrap_or(&empty);
        let (train, test) = dtype_check(train_dtypes, test_dtypes);

        if let Some(matrix) = checks.column_checks.get_mut(&DataKey::Train) {
            matrix.insert(CheckName::Dtype, train);
        }
        if let Some(matrix) = checks.column_checks.get_mut(&DataKey::Test) {
            matrix.insert(CheckName::Dtype, test);
        }
    }
}

fn main_target(metadata: &Metadata) -> Result<&str> {
    metadata.main_target_col.as_deref().ok_or_else(|| {
        CuratorError::InternalConsistency(format!(
            "{} learning without a target column",
            metadata
                .learning_type
                .map(|lt| lt.to_string())
                .unwrap_or_default()
        ))
    })
}
