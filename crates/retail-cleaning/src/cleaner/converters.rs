//! Type conversion functions for data cleaning.
//!
//! Conversions are strict: a value that cannot be converted aborts the pass
//! with an error naming the column and the value. Row filters upstream are
//! expected to have removed the known-bad records already.

use crate::error::{CleaningError, Result};
use crate::utils::{is_categorical_dtype, is_numeric_dtype, require_column};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;

fn unix_epoch() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

/// Parse a single value against `formats`, first match wins.
///
/// Formats containing a time component keep only the date part.
pub fn parse_date_value<S: AsRef<str>>(value: &str, formats: &[S]) -> Option<NaiveDate> {
    let trimmed = value.trim();
    formats.iter().find_map(|fmt| {
        let fmt = fmt.as_ref();
        if fmt.contains("%H") {
            NaiveDateTime::parse_from_str(trimmed, fmt)
                .ok()
                .map(|dt| dt.date())
        } else {
            NaiveDate::parse_from_str(trimmed, fmt).ok()
        }
    })
}

/// Convert a text column to `Date`.
///
/// `Date` columns pass through and `Datetime` columns are truncated to their
/// date. Nulls stay null.
pub fn parse_dates<S: AsRef<str>>(df: DataFrame, column: &str, formats: &[S]) -> Result<DataFrame> {
    let mut df = df;
    let converted = {
        let series = require_column(&df, column)?;
        match series.dtype() {
            DataType::Date => return Ok(df),
            DataType::Datetime(_, _) => series.cast(&DataType::Date)?,
            DataType::String => {
                let epoch = unix_epoch();
                let mut days: Vec<Option<i32>> = Vec::with_capacity(series.len());

                for opt_val in series.str()?.into_iter() {
                    match opt_val {
                        Some(val) => {
                            let date = parse_date_value(val, formats).ok_or_else(|| {
                                CleaningError::DateParse {
                                    column: column.to_string(),
                                    value: val.to_string(),
                                }
                            })?;
                            days.push(Some(date.signed_duration_since(epoch).num_days() as i32));
                        }
                        None => days.push(None),
                    }
                }

                Series::new(column.into(), days).cast(&DataType::Date)?
            }
            other => {
                return Err(CleaningError::TypeConversionFailed {
                    column: column.to_string(),
                    target_type: "date".to_string(),
                    reason: format!("unsupported source dtype {}", other),
                });
            }
        }
    };
    df.replace(column, converted)?;
    Ok(df)
}

fn conversion_error(column: &str, target_type: &str, value: &str) -> CleaningError {
    CleaningError::TypeConversionFailed {
        column: column.to_string(),
        target_type: target_type.to_string(),
        reason: format!("'{}' is not a valid {}", value, target_type),
    }
}

/// Strictly parse every value of a text series with `parse`.
fn parse_strings<T, F>(series: &Series, column: &str, target_type: &str, parse: F) -> Result<Vec<Option<T>>>
where
    F: Fn(&str) -> Option<T>,
{
    series
        .str()?
        .into_iter()
        .map(|opt_val| match opt_val {
            Some(val) => parse(val.trim())
                .map(Some)
                .ok_or_else(|| conversion_error(column, target_type, val)),
            None => Ok(None),
        })
        .collect()
}

/// Coerce a column to `Float64`.
pub fn coerce_to_float(df: DataFrame, column: &str) -> Result<DataFrame> {
    let mut df = df;
    let converted = {
        let series = require_column(&df, column)?;
        match series.dtype() {
            DataType::Float64 => return Ok(df),
            dtype if is_numeric_dtype(dtype) => series.cast(&DataType::Float64)?,
            DataType::String => {
                let values = parse_strings(series, column, "float", |v| v.parse::<f64>().ok())?;
                Series::new(column.into(), values)
            }
            other => {
                return Err(CleaningError::TypeConversionFailed {
                    column: column.to_string(),
                    target_type: "float".to_string(),
                    reason: format!("unsupported source dtype {}", other),
                });
            }
        }
    };
    df.replace(column, converted)?;
    Ok(df)
}

/// Coerce a column to `Int64`.
pub fn coerce_to_int(df: DataFrame, column: &str) -> Result<DataFrame> {
    let mut df = df;
    let converted = {
        let series = require_column(&df, column)?;
        match series.dtype() {
            DataType::Int64 => return Ok(df),
            dtype if is_numeric_dtype(dtype) => series.strict_cast(&DataType::Int64)?,
            DataType::String => {
                let values = parse_strings(series, column, "integer", |v| v.parse::<i64>().ok())?;
                Series::new(column.into(), values)
            }
            other => {
                return Err(CleaningError::TypeConversionFailed {
                    column: column.to_string(),
                    target_type: "integer".to_string(),
                    reason: format!("unsupported source dtype {}", other),
                });
            }
        }
    };
    df.replace(column, converted)?;
    Ok(df)
}

/// Render a column as text, leaving text columns untouched.
pub fn ensure_text(df: DataFrame, column: &str) -> Result<DataFrame> {
    let mut df = df;
    let series = require_column(&df, column)?;
    if series.dtype() == &DataType::String {
        return Ok(df);
    }
    let converted = series.cast(&DataType::String)?;
    df.replace(column, converted)?;
    Ok(df)
}

/// Mark a column categorical.
///
/// The category set is whatever values are present; nothing is enumerated
/// up front, so no legitimate value can be rejected.
pub fn to_categorical(df: DataFrame, column: &str) -> Result<DataFrame> {
    if is_categorical_dtype(require_column(&df, column)?.dtype()) {
        return Ok(df);
    }
    let mut df = ensure_text(df, column)?;
    let converted = require_column(&df, column)?
        .cast(&DataType::from_categories(Categories::global()))?;
    df.replace(column, converted)?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DATE_FORMATS;

    fn date_at(df: &DataFrame, column: &str, idx: usize) -> NaiveDate {
        let days = match df.column(column).unwrap().get(idx).unwrap() {
            AnyValue::Date(days) => days,
            other => panic!("Expected date, got {:?}", other),
        };
        unix_epoch() + chrono::Duration::days(days as i64)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ========================================================================
    // parse_dates() tests
    // ========================================================================

    #[test]
    fn test_parse_date_value_mixed_layouts() {
        let formats = &DEFAULT_DATE_FORMATS;
        assert_eq!(parse_date_value("1968-10-16", formats), Some(ymd(1968, 10, 16)));
        assert_eq!(parse_date_value("1971/10/23", formats), Some(ymd(1971, 10, 23)));
        assert_eq!(parse_date_value("2005 January 27", formats), Some(ymd(2005, 1, 27)));
        assert_eq!(parse_date_value("January 1951 27", formats), Some(ymd(1951, 1, 27)));
        assert_eq!(
            parse_date_value("2015-09-11 00:00:00", formats),
            Some(ymd(2015, 9, 11))
        );
        assert_eq!(parse_date_value(" 2001-02-03 ", formats), Some(ymd(2001, 2, 3)));
        assert_eq!(parse_date_value("not a date", formats), None);
    }

    #[test]
    fn test_parse_dates_column() {
        let df = df! { "join_date" => &["2019-05-01", "2020 March 02"] }.unwrap();
        let out = parse_dates(df, "join_date", &DEFAULT_DATE_FORMATS).unwrap();

        assert_eq!(out.column("join_date").unwrap().dtype(), &DataType::Date);
        assert_eq!(date_at(&out, "join_date", 0), ymd(2019, 5, 1));
        assert_eq!(date_at(&out, "join_date", 1), ymd(2020, 3, 2));
    }

    #[test]
    fn test_parse_dates_fails_on_garbage() {
        let df = df! { "opening_date" => &["2019-05-01", "ABCDEFGHIJ"] }.unwrap();
        let err = parse_dates(df, "opening_date", &DEFAULT_DATE_FORMATS).unwrap_err();
        match err {
            CleaningError::DateParse { column, value } => {
                assert_eq!(column, "opening_date");
                assert_eq!(value, "ABCDEFGHIJ");
            }
            other => panic!("Expected DateParse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_dates_keeps_nulls() {
        let df = df! { "d" => &[Some("2019-05-01"), None] }.unwrap();
        let out = parse_dates(df, "d", &DEFAULT_DATE_FORMATS).unwrap();
        assert_eq!(out.column("d").unwrap().null_count(), 1);
    }

    // ========================================================================
    // numeric coercion tests
    // ========================================================================

    #[test]
    fn test_coerce_to_float_strings() {
        let df = df! { "longitude" => &["-0.12", " 51.5 ", "3"] }.unwrap();
        let out = coerce_to_float(df, "longitude").unwrap();
        let values: Vec<Option<f64>> = out
            .column("longitude")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(-0.12), Some(51.5), Some(3.0)]);
    }

    #[test]
    fn test_coerce_to_float_rejects_text() {
        let df = df! { "weight" => &["1.5", "sample"] }.unwrap();
        let err = coerce_to_float(df, "weight").unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
        assert!(err.to_string().contains("sample"));
    }

    #[test]
    fn test_coerce_to_int() {
        let df = df! { "staff_numbers" => &["12", "7"] }.unwrap();
        let out = coerce_to_int(df, "staff_numbers").unwrap();
        assert_eq!(out.column("staff_numbers").unwrap().dtype(), &DataType::Int64);

        let df = df! { "staff_numbers" => &["1.5"] }.unwrap();
        assert!(coerce_to_int(df, "staff_numbers").is_err());
    }

    #[test]
    fn test_coerce_numeric_passthrough() {
        let df = df! { "n" => &[1i32, 2] }.unwrap();
        let out = coerce_to_float(df, "n").unwrap();
        assert_eq!(out.column("n").unwrap().dtype(), &DataType::Float64);
    }

    // ========================================================================
    // text / categorical tests
    // ========================================================================

    #[test]
    fn test_ensure_text_renders_numbers() {
        let df = df! { "card_number" => &[4111111111111111i64] }.unwrap();
        let out = ensure_text(df, "card_number").unwrap();
        assert_eq!(
            out.column("card_number").unwrap().get(0).unwrap(),
            AnyValue::String("4111111111111111")
        );
    }

    #[test]
    fn test_to_categorical() {
        let df = df! { "store_type" => &["Local", "Super Store", "Local"] }.unwrap();
        let out = to_categorical(df, "store_type").unwrap();
        let series = out.column("store_type").unwrap().as_materialized_series();

        assert!(is_categorical_dtype(series.dtype()));
        assert_eq!(series.n_unique().unwrap(), 2);
    }
}
