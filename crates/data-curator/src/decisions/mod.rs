//! Strategy selection for the check and remediation stages.
//!
//! The learning type is picked by [`RuleBasedDispatcher`]; the ordered step
//! tables below then drive the checker and the processor.

mod rule_engine;

pub use rule_engine::RuleBasedDispatcher;

use crate::types::LearningType;
use serde::Serialize;

/// One step of the check stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStep {
    MissingValues,
    CriticalCardinality,
    LowCardinality,
    Duplicates,
    ValidationSplit,
    ClassBalance,
    /// Placeholder: no memory budget is enforced.
    Memory,
    /// Placeholder: no time-series frequency inference.
    Frequency,
    TrainTestDtypes,
    TargetSanity,
}

/// One step of the remediation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStep {
    RemoveCriticalCardinality,
    RemoveDuplicates,
    /// Imputation, then rows with a missing target.
    MissingValues,
    /// Placeholder: categorical encoding is not performed.
    EncodeCategoricals,
    /// Placeholder: no memory budget is enforced.
    Memory,
}

/// Ordered check steps for a learning type.
pub fn check_steps(learning_type: LearningType) -> &'static [CheckStep] {
    use CheckStep::*;
    match learning_type {
        LearningType::Unsupervised => &[
            MissingValues,
            CriticalCardinality,
            LowCardinality,
            Duplicates,
            ValidationSplit,
            Memory,
            TrainTestDtypes,
        ],
        LearningType::Classification => &[
            MissingValues,
            CriticalCardinality,
            LowCardinality,
            Duplicates,
            ValidationSplit,
            ClassBalance,
            Memory,
            TrainTestDtypes,
            TargetSanity,
        ],
        LearningType::Regression => &[
            MissingValues,
            CriticalCardinality,
            LowCardinality,
            Duplicates,
            ValidationSplit,
            Memory,
            Frequency,
            TrainTestDtypes,
            TargetSanity,
        ],
    }
}

/// Ordered remediation steps; identical for every learning type.
pub fn process_steps(_learning_type: LearningType) -> &'static [ProcessStep] {
    &[
        ProcessStep::RemoveCriticalCardinality,
        ProcessStep::RemoveDuplicates,
        ProcessStep::MissingValues,
        ProcessStep::EncodeCategoricals,
        ProcessStep::Memory,
    ]
}
