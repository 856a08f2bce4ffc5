//! Per-dataset cleaning rules.
//!
//! Each cleaner takes one raw table and returns the cleaned table. Rows
//! removed by the pattern filters are dropped silently (logged at debug);
//! anything that fails a conversion afterwards aborts the pass.
//!
//! Several rules target corruption specific to the retail extracts rather
//! than general data quality:
//! - `first_name` values containing digits and `phone_number`/`staff_numbers`/
//!   `product_price`/`month` values containing letters are shifted or garbled
//!   records from the legacy exports;
//! - `@@` in e-mails, `GGB` country codes and the `ee` prefix on continents
//!   (`eeEurope`) are typos introduced by the store API and user database.
//!
//! A polars `DataFrame` has no index, so the frames returned here are already
//! densely positioned from zero after rows are filtered out.

pub mod converters;
pub mod sanitizers;
pub mod weights;

pub use converters::{coerce_to_float, coerce_to_int, parse_dates, to_categorical};
pub use sanitizers::{drop_rows_matching, keep_rows_where, normalize_nulls};
pub use weights::{ParsedWeight, parse_weight};

use crate::config::CleaningConfig;
use crate::error::Result;
use crate::types::Dataset;
use crate::utils::{drop_required_columns, require_column, text_column};
use converters::ensure_text;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use sanitizers::{DIGITS, LETTERS, map_text_column, replace_literal, replace_pattern};
use tracing::{debug, info};
use weights::weights_to_kilograms;

static ZERO_IN_PARENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(0\)").expect("Invalid regex: (0)"));
static PHONE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\)\(\.\- ]").expect("Invalid regex: phone punctuation"));
static LEADING_PLUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+").expect("Invalid regex: +"));
static LEADING_DIAL_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^00\d{2}").expect("Invalid regex: dial code"));

/// Strip `(0)`, brackets, dots, hyphens and spaces; turn a leading `+` into `00`.
pub fn normalize_phone_number(raw: &str) -> String {
    let no_trunk = ZERO_IN_PARENS.replace_all(raw, "");
    let compact = PHONE_PUNCTUATION.replace_all(&no_trunk, "");
    LEADING_PLUS.replace(&compact, "00").into_owned()
}

/// Applies the cleaning rules for each retail dataset.
#[derive(Debug, Clone, Default)]
pub struct DataCleaner {
    config: CleaningConfig,
}

static_assertions::assert_impl_all!(DataCleaner: Send, Sync);

impl DataCleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Route a raw table to the cleaner for `dataset`.
    pub fn clean(&self, dataset: Dataset, df: DataFrame) -> Result<DataFrame> {
        match dataset {
            Dataset::Users => self.clean_user_data(df),
            Dataset::Cards => self.clean_card_data(df),
            Dataset::Stores => self.clean_store_data(df),
            Dataset::Products => self.clean_products_data(df),
            Dataset::Orders => self.clean_orders_data(df),
            Dataset::DateTimes => self.clean_date_times_data(df),
        }
    }

    /// Clean the legacy users table.
    pub fn clean_user_data(&self, df: DataFrame) -> Result<DataFrame> {
        info!("Cleaning user data ({} rows)...", df.height());

        let df = normalize_nulls(df, &self.config.null_sentinel)?;
        let df = drop_rows_matching(df, "first_name", &DIGITS)?;
        let df = parse_dates(df, "date_of_birth", &self.config.date_formats)?;
        let df = replace_literal(df, "email_address", "@@", "@")?;
        let df = replace_literal(df, "country_code", "GG", "G")?;

        let df = map_text_column(df, "phone_number", normalize_phone_number)?;
        let df = drop_rows_matching(df, "phone_number", &LETTERS)?;
        let df = parse_dates(df, "join_date", &self.config.date_formats)?;
        let df = replace_pattern(df, "phone_number", &LEADING_DIAL_CODE, "")?;
        let df = self.prefix_dial_codes(df)?;

        let df = to_categorical(df, "country_code")?;

        info!("User data cleaned: {} rows", df.height());
        Ok(df)
    }

    /// Prepend each row's international dial prefix, chosen by that row's
    /// own `country_code`. Unknown countries get no prefix.
    fn prefix_dial_codes(&self, df: DataFrame) -> Result<DataFrame> {
        let mut df = df;
        let prefixed = {
            let phones = text_column(&df, "phone_number")?;
            let countries = text_column(&df, "country_code")?;

            let values: Vec<Option<String>> = phones
                .into_iter()
                .zip(countries.into_iter())
                .map(|(phone, country)| {
                    phone.map(|number| {
                        let prefix = country
                            .and_then(|code| self.config.dial_prefixes.get(code))
                            .map(String::as_str)
                            .unwrap_or("");
                        format!("{}{}", prefix, number)
                    })
                })
                .collect();
            Series::new("phone_number".into(), values)
        };
        df.replace("phone_number", prefixed)?;
        Ok(df)
    }

    /// Clean the card details extracted from the PDF.
    pub fn clean_card_data(&self, df: DataFrame) -> Result<DataFrame> {
        info!("Cleaning card data ({} rows)...", df.height());

        let df = normalize_nulls(df, &self.config.null_sentinel)?;
        let df = ensure_text(df, "card_number")?;
        let df = map_text_column(df, "card_number", |val| {
            val.trim_start_matches('?').to_string()
        })?;
        let df = keep_rows_where(df, "card_number", |val| {
            !val.is_empty() && val.chars().all(|c| c.is_ascii_digit())
        })?;
        let df = parse_dates(df, "date_payment_confirmed", &self.config.date_formats)?;
        let df = coerce_to_int(df, "card_number")?;
        let df = to_categorical(df, "card_provider")?;

        info!("Card data cleaned: {} rows", df.height());
        Ok(df)
    }

    /// Clean the store details returned by the stores API.
    pub fn clean_store_data(&self, df: DataFrame) -> Result<DataFrame> {
        info!("Cleaning store data ({} rows)...", df.height());

        // `lat` is an always-empty duplicate of `latitude` in the API payload.
        let df = drop_required_columns(df, &["lat"])?;
        let df = normalize_nulls(df, &self.config.null_sentinel)?;
        let df = drop_rows_matching(df, "staff_numbers", &LETTERS)?;
        let df = replace_literal(df, "continent", "ee", "")?;
        let df = parse_dates(df, "opening_date", &self.config.date_formats)?;

        let mut df = df;
        require_column(&df, "latitude")?;
        let latitude = df.drop_in_place("latitude")?;
        df.insert_column(2, latitude)?;
        debug!("Moved 'latitude' to position 2");

        let df = coerce_to_float(df, "longitude")?;
        let df = coerce_to_float(df, "latitude")?;
        let df = coerce_to_int(df, "staff_numbers")?;
        let df = to_categorical(df, "store_type")?;
        let df = to_categorical(df, "country_code")?;

        info!("Store data cleaned: {} rows", df.height());
        Ok(df)
    }

    /// Clean the products CSV.
    pub fn clean_products_data(&self, df: DataFrame) -> Result<DataFrame> {
        info!("Cleaning product data ({} rows)...", df.height());

        let max_ean = self.config.max_ean_length;
        let df = normalize_nulls(df, &self.config.null_sentinel)?;
        let df = drop_rows_matching(df, "product_price", &LETTERS)?;
        let df = keep_rows_where(df, "EAN", |val| val.chars().count() <= max_ean)?;
        let df = parse_dates(df, "date_added", &self.config.date_formats)?;
        let df = weights_to_kilograms(df, "weight")?;
        let df = replace_literal(df, "product_price", "£", "")?;
        let df = coerce_to_float(df, "product_price")?;
        let df = to_categorical(df, "category")?;
        let df = to_categorical(df, "removed")?;

        let mut df = df;
        df.rename("weight", "weight_kg".into())?;
        df.rename("product_price", "price_£".into())?;
        let df = drop_required_columns(df, &["Unnamed: 0"])?;

        info!("Product data cleaned: {} rows", df.height());
        Ok(df)
    }

    /// Clean the orders table: only drops redundant columns.
    pub fn clean_orders_data(&self, df: DataFrame) -> Result<DataFrame> {
        info!("Cleaning orders data ({} rows)...", df.height());
        drop_required_columns(df, &["first_name", "last_name", "1"])
    }

    /// Clean the sale date-times feed.
    pub fn clean_date_times_data(&self, df: DataFrame) -> Result<DataFrame> {
        info!("Cleaning date-times data ({} rows)...", df.height());

        let df = normalize_nulls(df, &self.config.null_sentinel)?;
        let df = drop_rows_matching(df, "month", &LETTERS)?;

        info!("Date-times data cleaned: {} rows", df.height());
        Ok(df)
    }
}
