//! Custom error types for the cleaning pipeline.
//!
//! Every cleaner fails fast: the first bad value that slips past the row
//! filters aborts the pass for that dataset. Errors carry enough context
//! (column, offending value) to find the record in the raw source.
//!
//! Errors are serializable so the CLI can emit them alongside a JSON summary.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A text operation was applied to a non-text column.
    #[error("Column '{column}' is not textual (dtype: {dtype})")]
    NotTextual { column: String, dtype: String },

    /// A value could not be parsed as a calendar date.
    #[error("Failed to parse '{value}' in column '{column}' as a date")]
    DateParse { column: String, value: String },

    /// Type conversion failed.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// A weight had a recognised unit but no usable number.
    #[error("Invalid weight value: '{0}'")]
    InvalidWeight(String),

    /// A multiplication weight was not a plain product of positive numbers.
    #[error("Rejected weight expression: '{0}'")]
    UnsafeWeightExpression(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raw dataset file does not exist.
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Raw dataset file exists but cannot be read as a table.
    #[error("Malformed source {}: {reason}", .path.display())]
    MalformedSource { path: PathBuf, reason: String },

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
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NotTextual { .. } => "NOT_TEXTUAL",
            Self::DateParse { .. } => "DATE_PARSE_FAILED",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::InvalidWeight(_) => "INVALID_WEIGHT",
            Self::UnsafeWeightExpression(_) => "UNSAFE_WEIGHT_EXPRESSION",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            Self::MalformedSource { .. } => "MALFORMED_SOURCE",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the shape or content of the data
    /// rather than by the environment (files, config).
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_)
            | Self::NotTextual { .. }
            | Self::DateParse { .. }
            | Self::TypeConversionFailed { .. }
            | Self::InvalidWeight(_)
            | Self::UnsafeWeightExpression(_) => true,
            Self::WithContext { source, .. } => source.is_data_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

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
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}
