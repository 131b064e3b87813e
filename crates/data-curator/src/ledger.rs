//! Audit trail of the remediation stage.
//!
//! Every column starts at `PASS`. A remediation overwrites that status once;
//! a second overwrite means two remediations touched the same column, which
//! is an internal consistency failure.

use crate::error::{CuratorError, Result};
use crate::types::{DataKey, DatasetCollection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Remediation applied to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "REMOVED DUE TO CRITICAL CARDINALITY ISSUE")]
    RemovedCriticalCardinality,
    #[serde(rename = "REMOVED DUE TO DUPLICATION ISSUE")]
    RemovedDuplicate,
    #[serde(rename = "MISSING VALUES IMPUTED")]
    Imputed,
}

impl ColumnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::RemovedCriticalCardinality => "REMOVED DUE TO CRITICAL CARDINALITY ISSUE",
            Self::RemovedDuplicate => "REMOVED DUE TO DUPLICATION ISSUE",
            Self::Imputed => "MISSING VALUES IMPUTED",
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, Self::RemovedCriticalCardinality | Self::RemovedDuplicate)
    }
}

impl fmt::Display for ColumnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row-level remediation of the primary dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "DROPPED NULL TARGET ROWS")]
    DroppedNullTargetRows,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::DroppedNullTargetRows => "DROPPED NULL TARGET ROWS",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dataset column statuses plus the row status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingLedger {
    pub column_processing: BTreeMap<DataKey, BTreeMap<String, ColumnStatus>>,
    pub row_processing: RowStatus,
    /// Rows of the primary dataset removed for a missing target.
    pub dropped_target_rows: usize,
}

impl ProcessingLedger {
    /// Every column of every dataset at `PASS`.
    pub fn new(data: &DatasetCollection) -> Self {
        let column_processing = data
            .iter()
            .map(|(key, df)| {
                let columns = df
                    .get_column_names()
                    .into_iter()
                    .map(|name| (name.to_string(), ColumnStatus::Pass))
                    .collect();
                (key, columns)
            })
            .collect();

        Self {
            column_processing,
            row_processing: RowStatus::Pass,
            dropped_target_rows: 0,
        }
    }

    /// Overwrite the `PASS` status of a column.
    pub fn record(&mut self, key: DataKey, column: &str, status: ColumnStatus) -> Result<()> {
        let current = self
            .column_processing
            .get_mut(&key)
            .and_then(|columns| columns.get_mut(column))
            .ok_or_else(|| {
                CuratorError::InternalConsistency(format!(
                    "ledger has no column '{}' in {} data",
                    column, key
                ))
            })?;

        if *current != ColumnStatus::Pass {
            return Err(CuratorError::InternalConsistency(format!(
                "column '{}' in {} data already marked '{}', cannot mark '{}'",
                column, key, current, status
            )));
        }
        *current = status;
        Ok(())
    }

    pub fn status(&self, key: DataKey, column: &str) -> Option<ColumnStatus> {
        self.column_processing
            .get(&key)
            .and_then(|columns| columns.get(column))
            .copied()
    }

    /// Columns of a dataset carrying `status`.
    pub fn columns_with(&self, key: DataKey, status: ColumnStatus) -> Vec<&str> {
        self.column_processing
            .get(&key)
            .map(|columns| {
                columns
                    .iter()
                    .filter(|(_, s)| **s == status)
                    .map(|(name, _)| name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn ledger() -> ProcessingLedger {
        let df = df!["a" => [1], "b" => [2]].unwrap();
        ProcessingLedger::new(&DatasetCollection::Total(df))
    }

    #[test]
    fn test_initial_state() {
        let ledger = ledger();
        assert_eq!(ledger.status(DataKey::Total, "a"), Some(ColumnStatus::Pass));
        assert_eq!(ledger.row_processing, RowStatus::Pass);
        assert_eq!(ledger.dropped_target_rows, 0);
    }

    #[test]
    fn test_record_once() {
        let mut ledger = ledger();
        ledger
            .record(DataKey::Total, "a", ColumnStatus::Imputed)
            .unwrap();
        assert_eq!(ledger.columns_with(DataKey::Total, ColumnStatus::Imputed), vec!["a"]);
    }

    #[test]
    fn test_double_overwrite_is_error() {
        let mut ledger = ledger();
        ledger
            .record(DataKey::Total, "a", ColumnStatus::RemovedDuplicate)
            .unwrap();
        let err = ledger
            .record(DataKey::Total, "a", ColumnStatus::Imputed)
            .unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_CONSISTENCY");
    }

    #[test]
    fn test_unknown_column_is_error() {
        let mut ledger = ledger();
        assert!(ledger.record(DataKey::Test, "a", ColumnStatus::Imputed).is_err());
    }

    #[test]
    fn test_serialization() {
        let mut ledger = ledger();
        ledger.row_processing = RowStatus::DroppedNullTargetRows;
        ledger.dropped_target_rows = 3;
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json["column_processing"]["total"]["a"], "PASS");
        assert_eq!(json["row_processing"], "DROPPED NULL TARGET ROWS");
        assert_eq!(json["dropped_target_rows"], 3);
    }
}
