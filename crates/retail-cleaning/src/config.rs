//! Configuration types for the cleaning pipeline.
//!
//! The defaults reproduce the rules for the retail source data exactly; the
//! knobs exist for sources that use a different sentinel or dial-code table.

use crate::error::{CleaningError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Date layouts found in the raw retail tables, tried in order.
pub const DEFAULT_DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y %B %d",
    "%B %Y %d",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y",
];

/// File format written by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    #[default]
    Csv,
    /// Apache Parquet (keeps dates and categoricals typed)
    Parquet,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

fn default_dial_prefixes() -> BTreeMap<String, String> {
    [("GB", "0044"), ("US", "001"), ("DE", "0049")]
        .into_iter()
        .map(|(code, prefix)| (code.to_string(), prefix.to_string()))
        .collect()
}

/// Configuration for the cleaning pipeline.
///
/// Use [`CleaningConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use retail_cleaning::config::{CleaningConfig, OutputFormat};
///
/// let config = CleaningConfig::builder()
///     .null_sentinel("N/A")
///     .output_format(OutputFormat::Parquet)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Literal string the upstream systems use for an absent value.
    /// Default: "NULL"
    pub null_sentinel: String,

    /// International dial prefix per country code, prepended to phone numbers.
    /// Default: GB -> 0044, US -> 001, DE -> 0049
    pub dial_prefixes: BTreeMap<String, String>,

    /// Longest EAN (in characters) a product row may carry.
    /// Default: 13
    pub max_ean_length: usize,

    /// chrono format strings tried in order when parsing calendar dates.
    pub date_formats: Vec<String>,

    /// Directory holding the raw dataset files.
    /// Default: "data"
    pub input_dir: PathBuf,

    /// Directory the cleaned tables are written to.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Format of the cleaned table files.
    /// Default: Csv
    pub output_format: OutputFormat,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            null_sentinel: "NULL".to_string(),
            dial_prefixes: default_dial_prefixes(),
            max_ean_length: 13,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("outputs"),
            output_format: OutputFormat::default(),
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CleaningError::SourceNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: CleaningConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| CleaningError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.null_sentinel.is_empty() {
            return Err(ConfigValidationError::EmptySentinel);
        }

        if self.max_ean_length == 0 {
            return Err(ConfigValidationError::InvalidEanLength(self.max_ean_length));
        }

        if self.date_formats.is_empty() {
            return Err(ConfigValidationError::NoDateFormats);
        }

        for (code, prefix) in &self.dial_prefixes {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigValidationError::InvalidDialPrefix {
                    country_code: code.clone(),
                    prefix: prefix.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Null sentinel must not be empty")]
    EmptySentinel,

    #[error("Invalid maximum EAN length: {0} (must be at least 1)")]
    InvalidEanLength(usize),

    #[error("At least one date format is required")]
    NoDateFormats,

    #[error("Invalid dial prefix for '{country_code}': '{prefix}' (digits only)")]
    InvalidDialPrefix {
        country_code: String,
        prefix: String,
    },
}

impl From<ConfigValidationError> for CleaningError {
    fn from(err: ConfigValidationError) -> Self {
        CleaningError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    null_sentinel: Option<String>,
    dial_prefixes: Option<BTreeMap<String, String>>,
    max_ean_length: Option<usize>,
    date_formats: Option<Vec<String>>,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    output_format: Option<OutputFormat>,
}

impl CleaningConfigBuilder {
    /// Set the string treated as a missing value.
    pub fn null_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.null_sentinel = Some(sentinel.into());
        self
    }

    /// Replace the whole dial prefix table.
    pub fn dial_prefixes(mut self, prefixes: BTreeMap<String, String>) -> Self {
        self.dial_prefixes = Some(prefixes);
        self
    }

    /// Add or override a single dial prefix.
    pub fn dial_prefix(mut self, country_code: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.dial_prefixes
            .get_or_insert_with(default_dial_prefixes)
            .insert(country_code.into(), prefix.into());
        self
    }

    /// Set the longest accepted EAN.
    pub fn max_ean_length(mut self, length: usize) -> Self {
        self.max_ean_length = Some(length);
        self
    }

    /// Set the date formats tried when parsing dates.
    pub fn date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    /// Set the directory holding the raw dataset files.
    pub fn input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(path.into());
        self
    }

    /// Set the output directory for cleaned tables.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the output file format.
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<CleaningConfig, ConfigValidationError> {
        let defaults = CleaningConfig::default();
        let config = CleaningConfig {
            null_sentinel: self.null_sentinel.unwrap_or(defaults.null_sentinel),
            dial_prefixes: self.dial_prefixes.unwrap_or(defaults.dial_prefixes),
            max_ean_length: self.max_ean_length.unwrap_or(defaults.max_ean_length),
            date_formats: self.date_formats.unwrap_or(defaults.date_formats),
            input_dir: self.input_dir.unwrap_or(defaults.input_dir),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_format: self.output_format.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
