//! Configuration types for the curation pipeline.
//!
//! [`CuratorConfig`] is built with a fluent builder and validated on
//! `build()`. [`Params`] is the lenient user-parameter store: unknown or
//! invalid values never fail the run, they fall back to a documented default
//! and are logged.

use crate::error::CuratorError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Default unique-value count at or below which a column is treated as discrete.
pub const DEFAULT_CAT_TO_NUM_THRESHOLD: usize = 100;

/// Strategy for imputing missing values in continuous numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericImputation {
    /// Use the mean of non-missing values
    #[default]
    Mean,
    /// Use the median of non-missing values
    Median,
    /// Use the most frequent value (smallest value wins ties)
    MostFrequent,
}

impl NumericImputation {
    pub const OPTIONS: [&'static str; 3] = ["mean", "median", "most_frequent"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::MostFrequent => "most_frequent",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "mean" => Some(Self::Mean),
            "median" => Some(Self::Median),
            "most_frequent" => Some(Self::MostFrequent),
            _ => None,
        }
    }
}

/// Strategy for imputing missing values in categorical or discrete columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalImputation {
    /// Use the most frequent value (smallest value wins ties)
    #[default]
    MostFrequent,
}

impl CategoricalImputation {
    pub const OPTIONS: [&'static str; 1] = ["most_frequent"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MostFrequent => "most_frequent",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "most_frequent" => Some(Self::MostFrequent),
            _ => None,
        }
    }
}

/// User-supplied processing parameters.
///
/// Built from a flat key/value object. Every key is optional; a missing key
/// is logged at debug level, an invalid value is logged as a warning, and in
/// both cases the default is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Params {
    pub numeric_imputation_method: NumericImputation,
    pub categorical_imputation_method: CategoricalImputation,
}

impl Params {
    /// Resolve parameters from a user-supplied key/value map.
    pub fn from_user_params(user_params: &HashMap<String, serde_json::Value>) -> Self {
        let numeric_imputation_method = resolve_param(
            user_params,
            "numeric_imputation_method",
            &NumericImputation::OPTIONS,
            NumericImputation::parse,
        );
        let categorical_imputation_method = resolve_param(
            user_params,
            "categorical_imputation_method",
            &CategoricalImputation::OPTIONS,
            CategoricalImputation::parse,
        );

        Self {
            numeric_imputation_method,
            categorical_imputation_method,
        }
    }

    /// Parse a JSON object string (as given on the command line).
    ///
    /// Malformed JSON is a configuration error; bad values inside a
    /// well-formed object are recovered by [`Params::from_user_params`].
    pub fn from_json_str(raw: &str) -> Result<Self, CuratorError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::from_user_params(&HashMap::new()));
        }
        let user_params: HashMap<String, serde_json::Value> = serde_json::from_str(trimmed)
            .map_err(|e| CuratorError::InvalidConfig(format!("params must be a JSON object: {}", e)))?;
        Ok(Self::from_user_params(&user_params))
    }
}

fn resolve_param<T: Default + Copy>(
    user_params: &HashMap<String, serde_json::Value>,
    name: &str,
    options: &[&str],
    parse: fn(&str) -> Option<T>,
) -> T {
    let default = T::default();
    let Some(value) = user_params.get(name) else {
        debug!("{} not present in user params", name);
        return default;
    };

    match value.as_str().and_then(parse) {
        Some(parsed) => {
            debug!("{} read successfully: {}", name, value);
            parsed
        }
        None => {
            warn!(
                "{} not a valid value ({}). it should be one of {:?}",
                name, value, options
            );
            info!("using default {}", name);
            default
        }
    }
}

/// Configuration for the curation pipeline.
///
/// Use [`CuratorConfig::builder()`] to create a new configuration.
///
/// # Example
///
/// ```rust,ignore
/// use data_curator::config::{CuratorConfig, NumericImputation};
///
/// let config = CuratorConfig::builder()
///     .cat_to_num_threshold(50)
///     .numeric_imputation(NumericImputation::Median)
///     .target_column("label")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorConfig {
    /// Unique-value count at or below which a column is discrete.
    /// Default: 100
    pub cat_to_num_threshold: usize,

    /// Strategy for continuous numeric columns.
    /// Default: Mean
    pub numeric_imputation: NumericImputation,

    /// Strategy for categorical and discrete columns.
    /// Default: MostFrequent
    pub categorical_imputation: CategoricalImputation,

    /// Explicit target column. If None, the last column of the main dataset
    /// is the target (unless `no_target` is set).
    /// Default: None
    pub target_column: Option<String>,

    /// Treat the data as unsupervised (no target column).
    /// Default: false
    pub no_target: bool,

    /// Directory for JSON outputs and processed CSVs.
    /// If None, the folder of the first data file is used.
    /// Default: None
    pub output_dir: Option<PathBuf>,

    /// Flatten per-dataset check matrices into nested row/column objects
    /// when serializing the check output.
    /// Default: true
    pub flatten_check_matrices: bool,

    /// Whether to write outputs to disk.
    /// Default: true
    pub write_outputs: bool,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            cat_to_num_threshold: DEFAULT_CAT_TO_NUM_THRESHOLD,
            numeric_imputation: NumericImputation::default(),
            categorical_imputation: CategoricalImputation::default(),
            target_column: None,
            no_target: false,
            output_dir: None,
            flatten_check_matrices: true,
            write_outputs: true,
        }
    }
}

impl CuratorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CuratorConfigBuilder {
        CuratorConfigBuilder::default()
    }

    /// Imputation parameters as a [`Params`] record.
    pub fn params(&self) -> Params {
        Params {
            numeric_imputation_method: self.numeric_imputation,
            categorical_imputation_method: self.categorical_imputation,
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.cat_to_num_threshold == 0 {
            return Err(ConfigValidationError::InvalidThreshold(
                self.cat_to_num_threshold,
            ));
        }

        if self.no_target && self.target_column.is_some() {
            return Err(ConfigValidationError::ConflictingTarget);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid cat_to_num_threshold: {0} (must be at least 1)")]
    InvalidThreshold(usize),

    #[error("A target column was given together with no_target")]
    ConflictingTarget,
}

impl From<ConfigValidationError> for CuratorError {
    fn from(err: ConfigValidationError) -> Self {
        CuratorError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`CuratorConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CuratorConfigBuilder {
    cat_to_num_threshold: Option<usize>,
    numeric_imputation: Option<NumericImputation>,
    categorical_imputation: Option<CategoricalImputation>,
    target_column: Option<String>,
    no_target: Option<bool>,
    output_dir: Option<PathBuf>,
    flatten_check_matrices: Option<bool>,
    write_outputs: Option<bool>,
}

impl CuratorConfigBuilder {
    /// Set the discreteness threshold (unique-value count).
    pub fn cat_to_num_threshold(mut self, threshold: usize) -> Self {
        self.cat_to_num_threshold = Some(threshold);
        self
    }

    /// Set the numeric imputation strategy.
    pub fn numeric_imputation(mut self, strategy: NumericImputation) -> Self {
        self.numeric_imputation = Some(strategy);
        self
    }

    /// Set the categorical imputation strategy.
    pub fn categorical_imputation(mut self, strategy: CategoricalImputation) -> Self {
        self.categorical_imputation = Some(strategy);
        self
    }

    /// Apply both imputation strategies from resolved [`Params`].
    pub fn params(self, params: Params) -> Self {
        self.numeric_imputation(params.numeric_imputation_method)
            .categorical_imputation(params.categorical_imputation_method)
    }

    /// Set an explicit target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Declare that the data has no target column.
    pub fn no_target(mut self, no_target: bool) -> Self {
        self.no_target = Some(no_target);
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Enable or disable flattening of check matrices in the JSON output.
    pub fn flatten_check_matrices(mut self, flatten: bool) -> Self {
        self.flatten_check_matrices = Some(flatten);
        self
    }

    /// Enable or disable writing outputs to disk.
    pub fn write_outputs(mut self, write: bool) -> Self {
        self.write_outputs = Some(write);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<CuratorConfig, ConfigValidationError> {
        let config = CuratorConfig {
            cat_to_num_threshold: self
                .cat_to_num_threshold
                .unwrap_or(DEFAULT_CAT_TO_NUM_THRESHOLD),
            numeric_imputation: self.numeric_imputation.unwrap_or_default(),
            categorical_imputation: self.categorical_imputation.unwrap_or_default(),
            target_column: self.target_column,
            no_target: self.no_target.unwrap_or(false),
            output_dir: self.output_dir,
            flatten_check_matrices: self.flatten_check_matrices.unwrap_or(true),
            write_outputs: self.write_outputs.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
