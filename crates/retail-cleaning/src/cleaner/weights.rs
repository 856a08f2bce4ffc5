//! Free-text product weights to kilograms.
//!
//! Weights arrive as strings such as `"1.6kg"`, `"400g"`, `"12 x 100g"`,
//! `"250ml"` or `"16oz"`. Millilitres are treated as grams (density of water).

use super::converters::ensure_text;
use crate::error::{CleaningError, Result};
use crate::utils::text_column;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

/// Kilograms per avoirdupois ounce.
pub const OZ_TO_KG: f64 = 0.0283495;

static KILOGRAMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"kg\b").expect("Invalid regex: kg"));
static MILLILITRES: Lazy<Regex> = Lazy::new(|| Regex::new(r"ml\b").expect("Invalid regex: ml"));
static GRAMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"g\b").expect("Invalid regex: g"));
static OUNCES: Lazy<Regex> = Lazy::new(|| Regex::new(r"oz\b").expect("Invalid regex: oz"));

/// Result of parsing one weight string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedWeight {
    Kilograms(f64),
    /// No unit recognised; the original text, untouched.
    Unparsed(String),
}

/// Remove whitespace, commas, quotes and the given unit letters.
fn strip_unit(value: &str, unit_chars: &[char]) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '\'' && !unit_chars.contains(c))
        .collect()
}

fn parse_quantity(stripped: &str, raw: &str) -> Result<f64> {
    stripped
        .parse::<f64>()
        .map_err(|_| CleaningError::InvalidWeight(raw.to_string()))
}

/// Evaluate `N*M[*...]` where every factor is a plain positive decimal.
///
/// Anything else (operators other than `*`, signs, exponents, names, a single
/// factor) is rejected.
pub fn evaluate_product(expr: &str) -> Result<f64> {
    let reject = || CleaningError::UnsafeWeightExpression(expr.to_string());

    let factors: Vec<&str> = expr.split('*').collect();
    if factors.len() < 2 {
        return Err(reject());
    }

    factors.iter().try_fold(1.0, |product, factor| {
        let well_formed = !factor.is_empty()
            && factor.chars().all(|c| c.is_ascii_digit() || c == '.')
            && factor.chars().any(|c| c.is_ascii_digit());
        if !well_formed {
            return Err(reject());
        }
        match factor.parse::<f64>() {
            Ok(value) if value > 0.0 && value.is_finite() => Ok(product * value),
            _ => Err(reject()),
        }
    })
}

/// Convert one weight string to kilograms.
///
/// Units are checked in order `kg`, multipack (`x`), `ml`, `g`, `oz`; the
/// first that matches wins. A unit only counts when followed by a word
/// boundary, so `"77g ."` is grams but `"gram"` is not.
pub fn parse_weight(raw: &str) -> Result<ParsedWeight> {
    if KILOGRAMS.is_match(raw) {
        let kg = parse_quantity(&strip_unit(raw, &['k', 'g']), raw)?;
        return Ok(ParsedWeight::Kilograms(kg));
    }

    if raw.contains('x') {
        let expr = strip_unit(&raw.replace('x', "*"), &['g']);
        let grams = evaluate_product(&expr)?;
        return Ok(ParsedWeight::Kilograms(grams / 1000.0));
    }

    if MILLILITRES.is_match(raw) {
        let ml = parse_quantity(&strip_unit(raw, &['m', 'l']), raw)?;
        return Ok(ParsedWeight::Kilograms(ml / 1000.0));
    }

    if GRAMS.is_match(raw) {
        let grams = parse_quantity(&strip_unit(raw, &['g']), raw)?;
        return Ok(ParsedWeight::Kilograms(grams / 1000.0));
    }

    if OUNCES.is_match(raw) {
        let oz = parse_quantity(&strip_unit(raw, &['o', 'z']), raw)?;
        return Ok(ParsedWeight::Kilograms(oz * OZ_TO_KG));
    }

    Ok(ParsedWeight::Unparsed(raw.to_string()))
}

/// Replace a weight column with its `Float64` value in kilograms.
///
/// Unrecognised values must already be plain numbers (taken as kilograms);
/// anything else fails the conversion.
pub fn weights_to_kilograms(df: DataFrame, column: &str) -> Result<DataFrame> {
    let mut df = ensure_text(df, column)?;
    let converted = {
        let mut values: Vec<Option<f64>> = Vec::with_capacity(df.height());
        for opt_val in text_column(&df, column)?.into_iter() {
            let value = match opt_val {
                Some(raw) => match parse_weight(raw)? {
                    ParsedWeight::Kilograms(kg) => Some(kg),
                    ParsedWeight::Unparsed(text) => Some(text.trim().parse::<f64>().map_err(|_| {
                        CleaningError::TypeConversionFailed {
                            column: column.to_string(),
                            target_type: "float".to_string(),
                            reason: format!("'{}' has no recognised weight unit", text),
                        }
                    })?),
                },
                None => None,
            };
            values.push(value);
        }
        Series::new(column.into(), values)
    };
    df.replace(column, converted)?;
    Ok(df)
}
