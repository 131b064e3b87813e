//! Whole-dataset diagnostics.

use crate::error::{CuratorError, Result, ResultExt};
use crate::types::Verdict;
use crate::utils::{Cell, column_cells};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::results::CheckMatrix;

/// Rows above which a single hold-out split is recommended.
pub const SPLIT_ROWS_THRESHOLD: usize = 20_000;
/// Rows below which 10-fold cross validation is recommended.
pub const SMALL_DATA_ROWS: usize = 1_000;
/// Minority-to-majority percentage ratio below which classes are imbalanced.
pub const CLASS_BALANCE_MIN_RATIO: f64 = 0.2;

/// Advisory validation strategy for the primary dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "val_type", rename_all = "snake_case")]
pub enum ValidationReco {
    /// Hold out `val_size` (a fraction) of the rows.
    TrainTestSplit { val_size: f64 },
    /// Cross validation with `val_size` folds.
    CrossVal { val_size: u32 },
}

pub fn validation_recommendation(rows: usize) -> ValidationReco {
    if rows > SPLIT_ROWS_THRESHOLD {
        ValidationReco::TrainTestSplit { val_size: 0.1 }
    } else if rows < SMALL_DATA_ROWS {
        ValidationReco::CrossVal { val_size: 10 }
    } else {
        ValidationReco::CrossVal { val_size: 3 }
    }
}

/// Class-balance diagnostic of a classification target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassBalance {
    pub verdict: Verdict,
    pub minority_class: Option<String>,
    pub majority_class: Option<String>,
    pub minority_class_percentage: Option<u32>,
    pub majority_class_percentage: Option<u32>,
    pub ratio: Option<f64>,
}

impl ClassBalance {
    fn not_applicable() -> Self {
        Self {
            verdict: Verdict::NotApplicable,
            minority_class: None,
            majority_class: None,
            minority_class_percentage: None,
            majority_class_percentage: None,
            ratio: None,
        }
    }
}

/// Partition the non-missing target values into classes and compare the
/// smallest class against the largest.
///
/// Percentages are of the non-missing total, truncated. Ties go to the
/// smaller class label (numeric labels compare numerically).
pub fn class_balance_check(target: &Series) -> Result<ClassBalance> {
    let cells = column_cells(target).context("Failed to read target for class balance")?;

    let mut label_counts: HashMap<String, (Cell, usize)> = HashMap::new();
    for cell in cells.into_iter().flatten() {
        label_counts
            .entry(label_key(&cell))
            .or_insert_with(|| (cell, 0))
            .1 += 1;
    }
    let mut counts: Vec<(Cell, usize)> = label_counts.into_values().collect();
    counts.sort_by(|(a, _), (b, _)| compare_labels(a, b));

    let total: usize = counts.iter().map(|(_, count)| count).sum();
    if total == 0 {
        return Ok(ClassBalance::not_applicable());
    }

    let mut minority = &counts[0];
    let mut majority = &counts[0];
    for entry in &counts[1..] {
        if entry.1 < minority.1 {
            minority = entry;
        }
        if entry.1 > majority.1 {
            majority = entry;
        }
    }

    let percentage = |count: usize| (count * 100 / total) as u32;
    let minority_pct = percentage(minority.1);
    let majority_pct = percentage(majority.1);
    let ratio = if majority_pct > 0 {
        minority_pct as f64 / majority_pct as f64
    } else {
        minority.1 as f64 / majority.1 as f64
    };

    Ok(ClassBalance {
        verdict: Verdict::from_fail(ratio < CLASS_BALANCE_MIN_RATIO),
        minority_class: Some(minority.0.to_string()),
        majority_class: Some(majority.0.to_string()),
        minority_class_percentage: Some(minority_pct),
        majority_class_percentage: Some(majority_pct),
        ratio: Some(ratio),
    })
}

/// Hash key of a label. Both float zeros map to the same class.
fn label_key(cell: &Cell) -> String {
    match cell {
        Cell::Number(x) if *x == 0.0 => "0".to_string(),
        _ => cell.to_string(),
    }
}

fn compare_labels(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.total_cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Every check computed over the primary dataset must carry a verdict for
/// the target column.
pub fn target_sanity_check(matrix: &CheckMatrix, target: &str) -> Result<()> {
    for (check, column_verdicts) in &matrix.verdicts {
        if !column_verdicts.contains_key(target) {
            return Err(CuratorError::InternalConsistency(format!(
                "{} has no verdict for target column '{}'",
                check, target
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::CheckName;
    use std::collections::BTreeMap;

    // =========================================================================
    // Validation recommendation
    // =========================================================================

    #[test]
    fn test_validation_recommendation_boundaries() {
        assert_eq!(
            validation_recommendation(999),
            ValidationReco::CrossVal { val_size: 10 }
        );
        assert_eq!(
            validation_recommendation(1000),
            ValidationReco::CrossVal { val_size: 3 }
        );
        assert_eq!(
            validation_recommendation(20_000),
            ValidationReco::CrossVal { val_size: 3 }
        );
        assert_eq!(
            validation_recommendation(20_001),
            ValidationReco::TrainTestSplit { val_size: 0.1 }
        );
    }

    #[test]
    fn test_validation_reco_serialization() {
        let json = serde_json::to_string(&ValidationReco::CrossVal { val_size: 10 }).unwrap();
        assert_eq!(json, r#"{"val_type":"cross_val","val_size":10}"#);
    }

    // =========================================================================
    // Class balance
    // =========================================================================

    #[test]
    fn test_class_balance_imbalanced() {
        let mut labels = vec!["A"; 90];
        labels.extend(vec!["B"; 10]);
        let series = Series::new("y".into(), labels);

        let balance = class_balance_check(&series).unwrap();
        assert_eq!(balance.verdict, Verdict::Fail);
        assert_eq!(balance.minority_class.as_deref(), Some("B"));
        assert_eq!(balance.majority_class.as_deref(), Some("A"));
        assert_eq!(balance.minority_class_percentage, Some(10));
        assert_eq!(balance.majority_class_percentage, Some(90));
    }

    #[test]
    fn test_class_balance_percentages_truncate() {
        // 1/3 and 2/3 of 3 rows
        let series = Series::new("y".into(), &[0, 1, 1]);
        let balance = class_balance_check(&series).unwrap();
        assert_eq!(balance.minority_class_percentage, Some(33));
        assert_eq!(balance.majority_class_percentage, Some(66));
        assert_eq!(balance.verdict, Verdict::Pass);
    }

    #[test]
    fn test_class_balance_ties_use_smallest_label() {
        let series = Series::new("y".into(), &[10, 9, 10, 9]);
        let balance = class_balance_check(&series).unwrap();
        assert_eq!(balance.minority_class.as_deref(), Some("9"));
        assert_eq!(balance.majority_class.as_deref(), Some("9"));
    }

    #[test]
    fn test_class_balance_ignores_missing() {
        let series = Series::new("y".into(), &[Some("a"), None, Some("b"), Some(" ")]);
        let balance = class_balance_check(&series).unwrap();
        assert_eq!(balance.minority_class_percentage, Some(50));
    }

    #[test]
    fn test_class_balance_many_distinct_labels() {
        let mut labels: Vec<String> = (0..50_000).map(|i| format!("label_{:05}", i)).collect();
        labels.push("label_00000".to_string());
        let series = Series::new("y".into(), labels);

        let balance = class_balance_check(&series).unwrap();
        assert_eq!(balance.majority_class.as_deref(), Some("label_00000"));
        assert_eq!(balance.minority_class.as_deref(), Some("label_00001"));
        assert_eq!(balance.majority_class_percentage, Some(0));
        assert_eq!(balance.ratio, Some(0.5));
    }

    #[test]
    fn test_class_balance_float_zeros_share_a_class() {
        let series = Series::new("y".into(), &[0.0, -0.0, 1.0]);
        let balance = class_balance_check(&series).unwrap();
        assert_eq!(balance.majority_class_percentage, Some(66));
        assert_eq!(balance.minority_class.as_deref(), Some("1"));
    }

    #[test]
    fn test_class_balance_all_missing() {
        let series = Series::new("y".into(), &[None::<&str>, None]);
        let balance = class_balance_check(&series).unwrap();
        assert_eq!(balance.verdict, Verdict::NotApplicable);
        assert!(balance.minority_class.is_none());
    }

    // =========================================================================
    // Target sanity
    // =========================================================================

    #[test]
    fn test_target_sanity() {
        let mut matrix = CheckMatrix::new(vec!["x".to_string(), "y".to_string()]);
        matrix.insert(
            CheckName::MissingValue,
            BTreeMap::from([
                ("x".to_string(), Verdict::Pass),
                ("y".to_string(), Verdict::Pass),
            ]),
        );
        assert!(target_sanity_check(&matrix, "y").is_ok());

        matrix.insert(
            CheckName::Duplicate,
            BTreeMap::from([("x".to_string(), Verdict::Pass)]),
        );
        let err = target_sanity_check(&matrix, "y").unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_CONSISTENCY");
    }
}
