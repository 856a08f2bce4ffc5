//! Row-level sanitization: sentinel nulls, pattern filters and text rewrites.

use crate::error::Result;
use crate::utils::{column_names, is_categorical_dtype, require_column, text_column};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::debug;

/// One or more ASCII digits anywhere in the value.
pub static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("Invalid regex: digits"));

/// Any ASCII letter anywhere in the value.
pub static LETTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]").expect("Invalid regex: letters"));

/// Text view of a column. Categorical columns are read through their labels.
fn text_values(df: &DataFrame, column: &str) -> Result<StringChunked> {
    let series = require_column(df, column)?;
    if is_categorical_dtype(series.dtype()) {
        return Ok(series.cast(&DataType::String)?.str()?.clone());
    }
    Ok(text_column(df, column)?.clone())
}

/// Replace every cell equal to `sentinel` with null, then drop every row that
/// has a null in any column.
pub fn normalize_nulls(df: DataFrame, sentinel: &str) -> Result<DataFrame> {
    let mut df = df;
    let mut total_replacements = 0;

    for col_name in column_names(&df) {
        let cleaned = {
            let series = df.column(&col_name)?.as_materialized_series();
            if series.dtype() != &DataType::String {
                continue;
            }
            let str_series = series.str()?;

            let mut replacements = 0;
            let values: Vec<Option<&str>> = str_series
                .into_iter()
                .map(|opt_val| match opt_val {
                    Some(val) if val == sentinel => {
                        replacements += 1;
                        None
                    }
                    other => other,
                })
                .collect();

            if replacements == 0 {
                continue;
            }
            total_replacements += replacements;
            Series::new(col_name.as_str().into(), values)
        };
        df.replace(&col_name, cleaned)?;
    }

    let mut complete = BooleanChunked::full("complete".into(), true, df.height());
    for col in df.get_columns() {
        complete = &complete & &col.as_materialized_series().is_not_null();
    }

    let before = df.height();
    let df = df.filter(&complete)?;

    debug!(
        "Replaced {} '{}' sentinels; dropped {} incomplete rows",
        total_replacements,
        sentinel,
        before - df.height()
    );
    Ok(df)
}

/// Drop every row whose `column` value contains a match for `pattern`.
///
/// Missing cells never match and are kept.
pub fn drop_rows_matching(df: DataFrame, column: &str, pattern: &Regex) -> Result<DataFrame> {
    let mask: BooleanChunked = text_values(&df, column)?
        .into_iter()
        .map(|opt_val| !opt_val.is_some_and(|val| pattern.is_match(val)))
        .collect();

    let before = df.height();
    let df = df.filter(&mask)?;
    debug!(
        "Dropped {} rows where '{}' matches /{}/",
        before - df.height(),
        column,
        pattern.as_str()
    );
    Ok(df)
}

/// Keep only rows whose `column` value satisfies `predicate`.
///
/// Missing cells are dropped.
pub fn keep_rows_where<F>(df: DataFrame, column: &str, predicate: F) -> Result<DataFrame>
where
    F: Fn(&str) -> bool,
{
    let mask: BooleanChunked = text_values(&df, column)?
        .into_iter()
        .map(|opt_val| opt_val.is_some_and(&predicate))
        .collect();

    let before = df.height();
    let df = df.filter(&mask)?;
    debug!(
        "Dropped {} rows failing the check on '{}'",
        before - df.height(),
        column
    );
    Ok(df)
}

/// Rewrite every non-null value of a text column.
///
/// A categorical column comes back as plain text.
pub fn map_text_column<F>(df: DataFrame, column: &str, f: F) -> Result<DataFrame>
where
    F: Fn(&str) -> String,
{
    let mut df = df;
    let rewritten = {
        let str_series = text_values(&df, column)?;
        let values: Vec<Option<String>> = str_series.into_iter().map(|v| v.map(&f)).collect();
        Series::new(column.into(), values)
    };
    df.replace(column, rewritten)?;
    Ok(df)
}

/// Replace every literal occurrence of `from` with `to` in a text column.
pub fn replace_literal(df: DataFrame, column: &str, from: &str, to: &str) -> Result<DataFrame> {
    map_text_column(df, column, |val| val.replace(from, to))
}

/// Replace every match of `pattern` with `replacement` in a text column.
pub fn replace_pattern(
    df: DataFrame,
    column: &str,
    pattern: &Regex,
    replacement: &str,
) -> Result<DataFrame> {
    map_text_column(df, column, |val| {
        pattern.replace_all(val, replacement).into_owned()
    })
}
