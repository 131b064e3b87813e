//! Error types for the data curation pipeline.
//!
//! Data-quality problems are never errors: a bad column is reported as a
//! `FAIL` verdict. Errors are reserved for structural problems the pipeline
//! cannot reason about (bad configuration, train/test schema mismatch,
//! internal inconsistencies in the check suite).
//!
//! Errors are serializable so they can be written next to the JSON outputs.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the curation pipeline.
#[derive(Error, Debug)]
pub enum CuratorError {
    /// Invalid configuration provided (filename count, split type, thresholds).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Structural precondition violated between the provided datasets.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Declared target column is absent from its dataset.
    #[error("Target column '{column}' not present in {data_key} data")]
    TargetNotFound { column: String, data_key: String },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Storage type that type inference cannot classify.
    #[error("Column '{column}' has undefined storage type {dtype}")]
    UndefinedDtype { column: String, dtype: String },

    /// The check suite or the ledger produced an impossible state.
    #[error("Internal consistency failure: {0}")]
    InternalConsistency(String),

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CuratorError>,
    },
}

impl CuratorError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CuratorError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            Self::TargetNotFound { .. } => "TARGET_NOT_FOUND",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::UndefinedDtype { .. } => "UNDEFINED_DTYPE",
            Self::InternalConsistency(_) => "INTERNAL_CONSISTENCY",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True for structural problems detected before any check runs.
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::SchemaMismatch(_) | Self::TargetNotFound { .. } => true,
            Self::WithContext { source, .. } => source.is_schema_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CuratorError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CuratorError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for curation operations.
pub type Result<T> = std::result::Result<T, CuratorError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CuratorError::Polars(e).with_context(context))
    }
}
