use crate::error::{CuratorError, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Keys and Tags
// ============================================================================

/// Identifies one dataset of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKey {
    Train,
    Test,
    Total,
}

impl DataKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
            Self::Total => "total",
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the input data was provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    /// Two files: train (main) and test (secondary)
    TrainTest,
    /// A single file
    Total,
}

impl SplitType {
    /// Main and secondary dataset keys for this split.
    pub fn data_keys(&self) -> (DataKey, Option<DataKey>) {
        match self {
            Self::TrainTest => (DataKey::Train, Some(DataKey::Test)),
            Self::Total => (DataKey::Total, None),
        }
    }
}

impl fmt::Display for SplitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrainTest => f.write_str("train_test"),
            Self::Total => f.write_str("total"),
        }
    }
}

/// Learning task derived from the target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningType {
    Unsupervised,
    Classification,
    Regression,
}

impl fmt::Display for LearningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupervised => f.write_str("unsupervised"),
            Self::Classification => f.write_str("classification"),
            Self::Regression => f.write_str("regression"),
        }
    }
}

/// Storage-level type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    Float,
    Int,
    String,
}

/// Semantic type tag: base type plus discreteness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureDtype {
    Float,
    Int,
    String,
    FloatDiscreet,
    IntDiscreet,
    StringDiscreet,
}

impl FeatureDtype {
    pub fn new(base: BaseType, discrete: bool) -> Self {
        match (base, discrete) {
            (BaseType::Float, false) => Self::Float,
            (BaseType::Int, false) => Self::Int,
            (BaseType::String, false) => Self::String,
            (BaseType::Float, true) => Self::FloatDiscreet,
            (BaseType::Int, true) => Self::IntDiscreet,
            (BaseType::String, true) => Self::StringDiscreet,
        }
    }

    /// `float` and `int`: imputed with the numeric strategy.
    pub fn is_continuous_numeric(&self) -> bool {
        matches!(self, Self::Float | Self::Int)
    }

    /// Any string tag or any discrete numeric tag.
    pub fn is_categorical(&self) -> bool {
        !self.is_continuous_numeric()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::String => "string",
            Self::FloatDiscreet => "float_discreet",
            Self::IntDiscreet => "int_discreet",
            Self::StringDiscreet => "string_discreet",
        }
    }
}

impl fmt::Display for FeatureDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one check for one column (or one dataset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "Not_Applicable")]
    NotApplicable,
}

impl Verdict {
    pub fn from_fail(fail: bool) -> Self {
        if fail { Self::Fail } else { Self::Pass }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::NotApplicable => "Not_Applicable",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Run-wide record, created by the reader and enriched by each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub datafiles: BTreeMap<DataKey, PathBuf>,
    pub no_target: bool,
    pub split_type: SplitType,
    pub main_data_key: DataKey,
    pub second_data_key: Option<DataKey>,
    /// None implies unsupervised.
    pub main_target_col: Option<String>,
    pub target_col: BTreeMap<DataKey, Option<String>>,
    pub features: BTreeMap<DataKey, Vec<String>>,
    pub feature_dtypes: BTreeMap<DataKey, BTreeMap<String, FeatureDtype>>,
    pub cat_to_num_threshold: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_type: Option<LearningType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minority_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub majority_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minority_class_percentage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub majority_class_percentage: Option<u32>,
}

impl Metadata {
    /// Empty metadata for a split type; the reader fills in columns.
    pub fn new(split_type: SplitType, cat_to_num_threshold: usize) -> Self {
        let (main_data_key, second_data_key) = split_type.data_keys();
        Self {
            datafiles: BTreeMap::new(),
            no_target: false,
            split_type,
            main_data_key,
            second_data_key,
            main_target_col: None,
            target_col: BTreeMap::new(),
            features: BTreeMap::new(),
            feature_dtypes: BTreeMap::new(),
            cat_to_num_threshold,
            learning_type: None,
            minority_class: None,
            majority_class: None,
            minority_class_percentage: None,
            majority_class_percentage: None,
        }
    }

    /// Present dataset keys, main first.
    pub fn data_keys(&self) -> Vec<DataKey> {
        std::iter::once(self.main_data_key)
            .chain(self.second_data_key)
            .collect()
    }

    /// Semantic tag of a column in a dataset, if inferred.
    pub fn dtype_of(&self, key: DataKey, column: &str) -> Option<FeatureDtype> {
        self.feature_dtypes
            .get(&key)
            .and_then(|dtypes| dtypes.get(column))
            .copied()
    }
}

// ============================================================================
// Dataset Collection
// ============================================================================

/// The datasets of one run: either a train/test pair or a single total set.
#[derive(Debug, Clone)]
pub enum DatasetCollection {
    TrainTest { train: DataFrame, test: DataFrame },
    Total(DataFrame),
}

impl DatasetCollection {
    pub fn split_type(&self) -> SplitType {
        match self {
            Self::TrainTest { .. } => SplitType::TrainTest,
            Self::Total(_) => SplitType::Total,
        }
    }

    pub fn keys(&self) -> Vec<DataKey> {
        match self {
            Self::TrainTest { .. } => vec![DataKey::Train, DataKey::Test],
            Self::Total(_) => vec![DataKey::Total],
        }
    }

    pub fn get(&self, key: DataKey) -> Option<&DataFrame> {
        match (self, key) {
            (Self::TrainTest { train, .. }, DataKey::Train) => Some(train),
            (Self::TrainTest { test, .. }, DataKey::Test) => Some(test),
            (Self::Total(df), DataKey::Total) => Some(df),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: DataKey) -> Option<&mut DataFrame> {
        match (self, key) {
            (Self::TrainTest { train, .. }, DataKey::Train) => Some(train),
            (Self::TrainTest { test, .. }, DataKey::Test) => Some(test),
            (Self::Total(df), DataKey::Total) => Some(df),
            _ => None,
        }
    }

    /// Like [`get`](Self::get) but a missing key is an internal error.
    pub fn require(&self, key: DataKey) -> Result<&DataFrame> {
        self.get(key).ok_or_else(|| {
            CuratorError::InternalConsistency(format!("no {} dataset in this run", key))
        })
    }

    pub fn require_mut(&mut self, key: DataKey) -> Result<&mut DataFrame> {
        self.get_mut(key).ok_or_else(|| {
            CuratorError::InternalConsistency(format!("no {} dataset in this run", key))
        })
    }

    /// Iterate `(key, frame)` pairs, main dataset first.
    pub fn iter(&self) -> impl Iterator<Item = (DataKey, &DataFrame)> {
        self.keys()
            .into_iter()
            .filter_map(move |key| self.get(key).map(|df| (key, df)))
    }
}
