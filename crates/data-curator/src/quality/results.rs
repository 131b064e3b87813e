//! Check result structures.

use crate::types::{DataKey, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dataset_checks::{ClassBalance, ValidationReco};

/// Name of a per-column check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheckName {
    #[serde(rename = "MISSING_VALUE_CHECK")]
    MissingValue,
    #[serde(rename = "CRITICAL_CARDINALITY_CHECK")]
    CriticalCardinality,
    #[serde(rename = "LOW_CARDINALITY_CHECK")]
    LowCardinality,
    #[serde(rename = "DUPLICATE_CHECK")]
    Duplicate,
    #[serde(rename = "DTYPE_CHECK")]
    Dtype,
}

impl CheckName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingValue => "MISSING_VALUE_CHECK",
            Self::CriticalCardinality => "CRITICAL_CARDINALITY_CHECK",
            Self::LowCardinality => "LOW_CARDINALITY_CHECK",
            Self::Duplicate => "DUPLICATE_CHECK",
            Self::Dtype => "DTYPE_CHECK",
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdicts of one dataset: check name -> column name -> verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckMatrix {
    /// Dataset columns in their original order.
    pub columns: Vec<String>,
    pub verdicts: BTreeMap<CheckName, BTreeMap<String, Verdict>>,
    /// Duplicate FAIL column -> base column it duplicates.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub duplicate_bases: BTreeMap<String, String>,
}

impl CheckMatrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn insert(&mut self, check: CheckName, verdicts: BTreeMap<String, Verdict>) {
        self.verdicts.insert(check, verdicts);
    }

    pub fn verdict(&self, check: CheckName, column: &str) -> Option<Verdict> {
        self.verdicts
            .get(&check)
            .and_then(|column_verdicts| column_verdicts.get(column))
            .copied()
    }

    pub fn has_check(&self, check: CheckName) -> bool {
        self.verdicts.contains_key(&check)
    }

    /// FAIL columns of a check, in dataset column order.
    pub fn failing(&self, check: CheckName) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| self.verdict(check, column) == Some(Verdict::Fail))
            .cloned()
            .collect()
    }

    pub fn base_of(&self, column: &str) -> Option<&str> {
        self.duplicate_bases.get(column).map(String::as_str)
    }

    /// `(checks, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.verdicts.len(), self.columns.len())
    }
}

/// Complete check output of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataChecks {
    pub column_checks: BTreeMap<DataKey, CheckMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_reco: Option<ValidationReco>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_balance: Option<ClassBalance>,
}

impl DataChecks {
    pub fn matrix(&self, key: DataKey) -> Option<&CheckMatrix> {
        self.column_checks.get(&key)
    }

    pub fn verdict(&self, key: DataKey, check: CheckName, column: &str) -> Option<Verdict> {
        self.matrix(key).and_then(|m| m.verdict(check, column))
    }

    /// Count of FAIL verdicts across every dataset and check.
    pub fn fail_count(&self) -> usize {
        self.column_checks
            .values()
            .flat_map(|m| m.verdicts.values())
            .flat_map(|column_verdicts| column_verdicts.values())
            .filter(|v| v.is_fail())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> CheckMatrix {
        let mut m = CheckMatrix::new(vec!["b".to_string(), "a".to_string(), "c".to_string()]);
        m.insert(
            CheckName::MissingValue,
            BTreeMap::from([
                ("a".to_string(), Verdict::Fail),
                ("b".to_string(), Verdict::Fail),
                ("c".to_string(), Verdict::Pass),
            ]),
        );
        m
    }

    #[test]
    fn test_failing_keeps_column_order() {
        assert_eq!(matrix().failing(CheckName::MissingValue), vec!["b", "a"]);
        assert!(matrix().failing(CheckName::Duplicate).is_empty());
    }

    #[test]
    fn test_verdict_lookup_and_shape() {
        let m = matrix();
        assert_eq!(m.verdict(CheckName::MissingValue, "c"), Some(Verdict::Pass));
        assert_eq!(m.verdict(CheckName::Dtype, "c"), None);
        assert_eq!(m.shape(), (1, 3));
    }

    #[test]
    fn test_check_name_serialization() {
        assert_eq!(
            serde_json::to_string(&CheckName::CriticalCardinality).unwrap(),
            "\"CRITICAL_CARDINALITY_CHECK\""
        );
    }

    #[test]
    fn test_fail_count() {
        let mut checks = DataChecks::default();
        checks.column_checks.insert(DataKey::Total, matrix());
        assert_eq!(checks.fail_count(), 2);
    }
}
