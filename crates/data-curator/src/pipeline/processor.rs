//! Remediation stage: applies the fixes the check stage calls for.
//!
//! Column removals decided on the main dataset are mirrored on the
//! secondary dataset. Imputers are fitted on the main dataset only and
//! applied to every present dataset. The target column is never removed
//! or imputed.

use crate::config::Params;
use crate::decisions::{ProcessStep, process_steps};
use crate::error::{CuratorError, Result, ResultExt};
use crate::imputers::{FittedImputer, ImputationStrategy, StatisticalImputer};
use crate::ledger::{ColumnStatus, ProcessingLedger, RowStatus};
use crate::quality::{CheckName, DataChecks};
use crate::types::{DataKey, DatasetCollection, Metadata, SplitType, Verdict};
use crate::utils::{drop_percentage, missing_flags};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Output of the remediation stage.
#[derive(Debug, Clone)]
pub struct ProcessedData {
    pub data: DatasetCollection,
    pub ledger: ProcessingLedger,
    /// Fill values learned on the main dataset, in application order.
    pub imputers: Vec<FittedImputer>,
}

/// Applies column removals, imputation and target-row filtering.
pub struct DataProcessor {
    params: Params,
}

impl DataProcessor {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn run(
        &self,
        data: DatasetCollection,
        metadata: &Metadata,
        checks: &DataChecks,
    ) -> Result<ProcessedData> {
        let learning_type = metadata.learning_type.ok_or_else(|| {
            CuratorError::InternalConsistency(
                "learning type not set before processing".to_string(),
            )
        })?;

        let ledger = ProcessingLedger::new(&data);
        let mut run = ProcessingRun {
            params: self.params,
            metadata,
            checks,
            data,
            ledger,
            removed: BTreeSet::new(),
            imputers: Vec::new(),
        };

        for step in process_steps(learning_type) {
            debug!("running process step {:?}", step);
            match step {
                ProcessStep::RemoveCriticalCardinality => run.remove_issue_columns(
                    CheckName::CriticalCardinality,
                    ColumnStatus::RemovedCriticalCardinality,
                )?,
                ProcessStep::RemoveDuplicates => run.remove_issue_columns(
                    CheckName::Duplicate,
                    ColumnStatus::RemovedDuplicate,
                )?,
                ProcessStep::MissingValues => {
                    run.impute_missing_values()?;
                    run.drop_missing_target_rows()?;
                }
                ProcessStep::EncodeCategoricals => debug!("categorical encoding not performed"),
                ProcessStep::Memory => debug!("memory processing not enforced"),
            }
        }

        Ok(ProcessedData {
            data: run.data,
            ledger: run.ledger,
            imputers: run.imputers,
        })
    }
}

/// State of one remediation run.
struct ProcessingRun<'a> {
    params: Params,
    metadata: &'a Metadata,
    checks: &'a DataChecks,
    data: DatasetCollection,
    ledger: ProcessingLedger,
    removed: BTreeSet<String>,
    imputers: Vec<FittedImputer>,
}

impl ProcessingRun<'_> {
    fn main_key(&self) -> DataKey {
        self.metadata.main_data_key
    }

    fn is_target(&self, column: &str) -> bool {
        self.metadata.main_target_col.as_deref() == Some(column)
    }

    /// FAIL columns of `check` in `key`, minus the target and removed columns.
    fn issue_columns(&self, key: DataKey, check: CheckName) -> Vec<String> {
        self.checks
            .matrix(key)
            .map(|matrix| matrix.failing(check))
            .unwrap_or_default()
            .into_iter()
            .filter(|column| !self.is_target(column) && !self.removed.contains(column))
            .collect()
    }

    fn remove_issue_columns(&mut self, check: CheckName, status: ColumnStatus) -> Result<()> {
        let columns = self.issue_columns(self.main_key(), check);
        if columns.is_empty() {
            debug!("no columns to remove for {}", check);
            return Ok(());
        }

        for key in self.metadata.data_keys() {
            let df = self.data.require_mut(key)?;
            let present: Vec<String> = columns
                .iter()
                .filter(|column| df.get_column_index(column).is_some())
                .cloned()
                .collect();
            *df = df.drop_many(present.iter().map(|c| PlSmallStr::from(c.as_str())));

            for column in &present {
                self.ledger.record(key, column, status)?;
            }
            info!("{} columns {:?} from {} data", status, present, key);
        }

        self.removed.extend(columns);
        Ok(())
    }

    fn impute_missing_values(&mut self) -> Result<()> {
        if self.metadata.split_type == SplitType::Total {
            warn!("imputation occurs before train-test split. beware of a possible data leak");
        }

        let mut columns = self.issue_columns(self.main_key(), CheckName::MissingValue);
        if let Some(second_key) = self.metadata.second_data_key {
            for column in self.issue_columns(second_key, CheckName::MissingValue) {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }

        let fit_key = self.main_key();
        for column in columns {
            let Some(dtype) = self.metadata.dtype_of(fit_key, &column) else {
                warn!("no inferred dtype for '{}' in {} data, not imputed", column, fit_key);
                continue;
            };
            let strategy: ImputationStrategy = if dtype.is_categorical() {
                self.params.categorical_imputation_method.into()
            } else {
                self.params.numeric_imputation_method.into()
            };

            let fitted = StatisticalImputer::fit(self.data.require(fit_key)?, &column, strategy)
                .context(format!("Imputation fit failed on {} data", fit_key))?;
            debug!(
                "imputer for '{}' ({}) fitted on {} data: {:?} = {}",
                column, dtype, fit_key, strategy, fitted.fill
            );

            for key in self.metadata.data_keys() {
                let filled = StatisticalImputer::transform(self.data.require_mut(key)?, &fitted)?;
                if filled > 0 {
                    self.ledger.record(key, &column, ColumnStatus::Imputed)?;
                }
                debug!("{} data: {} cells of '{}' imputed", key, filled, column);
            }
            self.imputers.push(fitted);
        }

        if !self.imputers.is_empty() {
            info!(
                "imputed missing values in {:?}",
                self.imputers.iter().map(|f| &f.column).collect::<Vec<_>>()
            );
        }
        Ok(())
    }

    /// Drop main-dataset rows whose target is missing.
    fn drop_missing_target_rows(&mut self) -> Result<()> {
        let Some(target) = self.metadata.main_target_col.as_deref() else {
            return Ok(());
        };
        let main_key = self.main_key();
        if self.checks.verdict(main_key, CheckName::MissingValue, target) != Some(Verdict::Fail) {
            return Ok(());
        }
        debug!("target col has missing values, removing corresponding rows");

        let df = self.data.require_mut(main_key)?;
        let keep: Vec<bool> = {
            let series = df
                .column(target)
                .map_err(|_| CuratorError::ColumnNotFound(target.to_string()))?
                .as_materialized_series();
            missing_flags(series)?.into_iter().map(|m| !m).collect()
        };

        let before = df.height();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        *df = df.filter(&mask)?;
        let after = df.height();

        self.ledger.row_processing = RowStatus::DroppedNullTargetRows;
        self.ledger.dropped_target_rows = before - after;
        info!(
            "dropped null target rows. resulted in {:.2}% drop in {} size",
            drop_percentage(before, after),
            main_key
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NumericImputation;
    use crate::decisions::RuleBasedDispatcher;
    use crate::imputers::FillValue;
    use crate::pipeline::DataChecker;
    use crate::profiler::DataProfiler;
    use crate::reader::DataReader;
    use crate::types::LearningType;

    fn process(
        data: DatasetCollection,
        target: Option<&str>,
        params: Params,
    ) -> (Metadata, DataChecks, ProcessedData) {
        process_with_threshold(data, target, params, 100)
    }

    fn process_with_threshold(
        data: DatasetCollection,
        target: Option<&str>,
        params: Params,
        threshold: usize,
    ) -> (Metadata, DataChecks, ProcessedData) {
        let reader = DataReader::new(target.is_none(), target.map(str::to_string), threshold);
        let (data, metadata) = reader.load_frames(data).unwrap();
        let metadata = DataProfiler::annotate(&data, metadata).unwrap();
        let main = data.require(metadata.main_data_key).unwrap().clone();
        let metadata = RuleBasedDispatcher::new(threshold)
            .dispatch(&main, metadata)
            .unwrap();
        let (metadata, checks) = DataChecker::new(&data).unwrap().run(metadata).unwrap();
        let processed = DataProcessor::new(params)
            .run(data, &metadata, &checks)
            .unwrap();
        (metadata, checks, processed)
    }

    #[test]
    fn test_removes_critical_columns_from_both_datasets() {
        let train = df![
            "const" => [1, 1, 1, 1],
            "x" => [1.0, 2.0, 2.0, 3.0],
            "y" => [0, 1, 0, 1],
        ]
        .unwrap();
        let test = df![
            "const" => [5, 6],
            "x" => [1.0, 2.0],
            "y" => [1, 0],
        ]
        .unwrap();

        let (_, _, processed) = process(
            DatasetCollection::TrainTest { train, test },
            Some("y"),
            Params::default(),
        );

        for key in [DataKey::Train, DataKey::Test] {
            let df = processed.data.get(key).unwrap();
            assert!(df.column("const").is_err());
            assert_eq!(
                processed.ledger.status(key, "const"),
                Some(ColumnStatus::RemovedCriticalCardinality)
            );
        }
    }

    #[test]
    fn test_duplicate_removal_keeps_base() {
        let df = df![
            "price" => [Some(1.0), None, Some(3.0), Some(1.0)],
            "price_copy" => [1.0, 2.0, 3.0, 1.0],
            "y" => ["a", "b", "a", "b"],
        ]
        .unwrap();

        let (_, _, processed) =
            process(DatasetCollection::Total(df), Some("y"), Params::default());
        let df = processed.data.get(DataKey::Total).unwrap();

        assert!(df.column("price").is_err());
        assert!(df.column("price_copy").is_ok());
        assert_eq!(
            processed.ledger.status(DataKey::Total, "price"),
            Some(ColumnStatus::RemovedDuplicate)
        );
        // removed columns are never imputed
        assert!(processed.imputers.iter().all(|f| f.column != "price"));
    }

    #[test]
    fn test_imputation_fitted_on_train_only() {
        let train = df![
            "x" => [Some(1.0), Some(2.0), None, Some(3.0), Some(4.5)],
            "y" => [0, 1, 0, 1, 0],
        ]
        .unwrap();
        let test = df![
            "x" => [None, Some(1000.0)],
            "y" => [1, 0],
        ]
        .unwrap();

        // x has 4 distinct values, above the threshold, so it is continuous
        let (_, _, processed) = process_with_threshold(
            DatasetCollection::TrainTest { train, test },
            Some("y"),
            Params::default(),
            3,
        );

        assert_eq!(processed.imputers.len(), 1);
        assert_eq!(processed.imputers[0].strategy, ImputationStrategy::Mean);
        assert_eq!(processed.imputers[0].fill, FillValue::Number(2.625));
        let test_x: Vec<_> = processed
            .data
            .get(DataKey::Test)
            .unwrap()
            .column("x")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(test_x, vec![Some(2.625), Some(1000.0)]);
        assert_eq!(
            processed.ledger.status(DataKey::Test, "x"),
            Some(ColumnStatus::Imputed)
        );
    }

    #[test]
    fn test_categorical_tags_use_most_frequent() {
        let df = df![
            "level" => [Some(1), Some(2), Some(2), None, Some(3)],
            "y" => [0.5, 1.5, 2.5, 3.5, 4.5],
        ]
        .unwrap();
        let params = Params {
            numeric_imputation_method: NumericImputation::Mean,
            ..Params::default()
        };

        let (_, _, processed) = process(DatasetCollection::Total(df), Some("y"), params);
        assert_eq!(processed.imputers[0].strategy, ImputationStrategy::MostFrequent);
        assert_eq!(processed.imputers[0].fill, FillValue::Number(2.0));
    }

    #[test]
    fn test_secondary_only_missing_values_are_imputed() {
        let train = df![
            "x" => ["a", "a", "b", "c"],
            "y" => [0, 1, 0, 1],
        ]
        .unwrap();
        let test = df![
            "x" => [Some("b"), None, Some("c")],
            "y" => [0, 1, 1],
        ]
        .unwrap();

        let (_, _, processed) = process(
            DatasetCollection::TrainTest { train, test },
            Some("y"),
            Params::default(),
        );
        let test = processed.data.get(DataKey::Test).unwrap();
        assert_eq!(test.column("x").unwrap().null_count(), 0);
        assert_eq!(processed.imputers[0].fill, FillValue::Text("a".to_string()));
        assert_eq!(
            processed.ledger.status(DataKey::Train, "x"),
            Some(ColumnStatus::Pass)
        );
        assert_eq!(
            processed.ledger.status(DataKey::Test, "x"),
            Some(ColumnStatus::Imputed)
        );
    }

    #[test]
    fn test_null_target_rows_dropped_from_main_only() {
        let train = df![
            "x" => [1.0, 2.0, 3.0, 4.0],
            "y" => [Some(0), None, Some(1), Some(0)],
        ]
        .unwrap();
        let test = df![
            "x" => [1.0, 2.0],
            "y" => [None, Some(1)],
        ]
        .unwrap();

        let (metadata, _, processed) = process(
            DatasetCollection::TrainTest { train, test },
            Some("y"),
            Params::default(),
        );

        assert_eq!(metadata.learning_type, Some(LearningType::Classification));
        assert_eq!(processed.data.get(DataKey::Train).unwrap().height(), 3);
        assert_eq!(processed.data.get(DataKey::Test).unwrap().height(), 2);
        assert_eq!(
            processed.ledger.row_processing,
            RowStatus::DroppedNullTargetRows
        );
        assert_eq!(processed.ledger.dropped_target_rows, 1);
        assert_eq!(
            processed.ledger.status(DataKey::Train, "y"),
            Some(ColumnStatus::Pass)
        );
    }

    #[test]
    fn test_unsupervised_skips_target_rows() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0), Some(2.0)],
            "b" => [4.0, 5.0, 6.0, 4.0],
        ]
        .unwrap();

        let (_, _, processed) = process(DatasetCollection::Total(df), None, Params::default());
        assert_eq!(processed.ledger.row_processing, RowStatus::Pass);
        assert_eq!(processed.data.get(DataKey::Total).unwrap().height(), 4);
        assert_eq!(
            processed.ledger.status(DataKey::Total, "a"),
            Some(ColumnStatus::Imputed)
        );
    }
}
