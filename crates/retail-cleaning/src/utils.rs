//! Shared utilities for the cleaning pipeline.
//!
//! Column lookup lives here so every cleaner reports a missing or mistyped
//! column the same way.

use crate::error::{CleaningError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a categorical type.
#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Categorical(_, _) | DataType::Enum(_, _))
}

// =============================================================================
// Column Access
// =============================================================================

/// Owned list of column names, in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Fetch a column as a series, failing with [`CleaningError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    if df.get_column_index(name).is_none() {
        return Err(CleaningError::ColumnNotFound(name.to_string()));
    }
    Ok(df.column(name)?.as_materialized_series())
}

/// Fetch a string column, failing with [`CleaningError::NotTextual`] when the
/// column holds anything other than text.
pub fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    let series = require_column(df, name)?;
    if series.dtype() != &DataType::String {
        return Err(CleaningError::NotTextual {
            column: name.to_string(),
            dtype: series.dtype().to_string(),
        });
    }
    Ok(series.str()?)
}

/// Drop several columns, failing on the first one that is absent.
pub fn drop_required_columns(df: DataFrame, names: &[&str]) -> Result<DataFrame> {
    let mut df = df;
    for name in names {
        require_column(&df, name)?;
        df = df.drop(name)?;
    }
    Ok(df)
}
