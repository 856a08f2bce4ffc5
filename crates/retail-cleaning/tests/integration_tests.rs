//! Integration tests for the retail cleaning pipeline.
//!
//! These tests run the cleaners end to end over the raw extracts in
//! `tests/fixtures`, which reproduce the corruption found in the real sources.

use polars::prelude::*;
use pretty_assertions::assert_eq;
use retail_cleaning::cleaner::sanitizers::{drop_rows_matching, normalize_nulls};
use retail_cleaning::utils::is_categorical_dtype;
use retail_cleaning::{
    CleaningConfig, Dataset, DatasetSource, EtlPipeline, FileSink, LocalFileSource, MemorySink,
    OutputFormat,
};
use regex::Regex;
use std::fs::File;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn extract(dataset: Dataset) -> DataFrame {
    LocalFileSource::new(fixtures_path())
        .extract(dataset)
        .expect("Failed to read fixture")
}

fn clean(dataset: Dataset) -> DataFrame {
    EtlPipeline::default()
        .clean_one(dataset, extract(dataset))
        .expect("Cleaning should succeed")
}

fn strings(df: &DataFrame, column: &str) -> Vec<String> {
    df.column(column)
        .expect("Column should exist")
        .as_materialized_series()
        .cast(&DataType::String)
        .expect("Cast to string should succeed")
        .str()
        .expect("Should be a string column")
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect()
}

fn floats(df: &DataFrame, column: &str) -> Vec<f64> {
    df.column(column)
        .expect("Column should exist")
        .as_materialized_series()
        .f64()
        .expect("Should be a float column")
        .into_no_null_iter()
        .collect()
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

fn total_nulls(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}

fn contains_sentinel(df: &DataFrame, sentinel: &str) -> bool {
    df.get_columns().iter().any(|c| {
        c.as_materialized_series()
            .str()
            .map(|ca| ca.into_iter().any(|v| v == Some(sentinel)))
            .unwrap_or(false)
    })
}

// ============================================================================
// Full Run Tests
// ============================================================================

#[test]
fn test_full_run_writes_every_table() {
    let out_dir = tempfile::tempdir().unwrap();
    let source = LocalFileSource::new(fixtures_path());
    let sink = FileSink::new(out_dir.path(), OutputFormat::Csv);

    let summary = EtlPipeline::default()
        .run(&source, &sink, &Dataset::ALL)
        .expect("Run should succeed");

    let rows: Vec<(String, usize, usize)> = summary
        .datasets
        .iter()
        .map(|d| (d.destination_table.clone(), d.rows_before, d.rows_after))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("dim_users".to_string(), 8, 5),
            ("dim_card_details".to_string(), 6, 4),
            ("dim_store_details".to_string(), 6, 4),
            ("dim_products".to_string(), 8, 5),
            ("orders_table".to_string(), 3, 3),
            ("dim_date_times".to_string(), 6, 4),
        ]
    );
    assert_eq!(summary.total_rows_removed(), 12);

    for table in [
        "dim_users",
        "dim_card_details",
        "dim_store_details",
        "dim_products",
        "orders_table",
        "dim_date_times",
    ] {
        assert!(
            out_dir.path().join(format!("{}.csv", table)).exists(),
            "{} should have been written",
            table
        );
    }
}

#[test]
fn test_run_summary_serializes() {
    let sink = MemorySink::new();
    let summary = EtlPipeline::default()
        .run(
            &LocalFileSource::new(fixtures_path()),
            &sink,
            &[Dataset::Cards],
        )
        .unwrap();

    let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["datasets"][0]["dataset"], "cards");
    assert_eq!(json["datasets"][0]["destination_table"], "dim_card_details");
    assert_eq!(json["datasets"][0]["rows_after"], 4);
    assert_eq!(json["datasets"][0]["output_path"], "memory://dim_card_details");
}

#[test]
fn test_parquet_output_keeps_types() {
    let out_dir = tempfile::tempdir().unwrap();
    let sink = FileSink::new(out_dir.path(), OutputFormat::Parquet);

    EtlPipeline::default()
        .run(
            &LocalFileSource::new(fixtures_path()),
            &sink,
            &[Dataset::Stores],
        )
        .unwrap();

    let file = File::open(out_dir.path().join("dim_store_details.parquet")).unwrap();
    let df = ParquetReader::new(file).finish().unwrap();
    assert_eq!(df.height(), 4);
    assert_eq!(df.column("opening_date").unwrap().dtype(), &DataType::Date);
    assert_eq!(df.column("latitude").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("staff_numbers").unwrap().dtype(), &DataType::Int64);
}

#[test]
fn test_missing_source_aborts_run() {
    let empty_dir = tempfile::tempdir().unwrap();
    let sink = MemorySink::new();

    let err = EtlPipeline::default()
        .run(&LocalFileSource::new(empty_dir.path()), &sink, &Dataset::ALL)
        .unwrap_err();

    assert_eq!(err.error_code(), "SOURCE_NOT_FOUND");
    assert!(sink.table_names().is_empty());
}

// ============================================================================
// Per-Dataset Tests
// ============================================================================

#[test]
fn test_users_end_to_end() {
    let df = clean(Dataset::Users);

    assert_eq!(
        strings(&df, "first_name"),
        vec!["Sigfried", "Guy", "Harry", "Andrew", "Dora"]
    );
    assert_eq!(
        strings(&df, "phone_number"),
        vec![
            "0049047905356",
            "004401614960674",
            "00441214960340",
            "0013854456447",
            "00499133071123",
        ]
    );
    assert_eq!(strings(&df, "country_code"), vec!["DE", "GB", "GB", "US", "DE"]);
    assert_eq!(strings(&df, "email_address")[3], "stewartandrew@example.org");
    assert!(is_categorical_dtype(df.column("country_code").unwrap().dtype()));
    assert_eq!(df.column("date_of_birth").unwrap().dtype(), &DataType::Date);
    assert_eq!(df.column("join_date").unwrap().dtype(), &DataType::Date);
    assert_eq!(strings(&df, "date_of_birth")[4], "1951-01-27");
    assert_eq!(strings(&df, "join_date")[2], "2016-12-05");
}

#[test]
fn test_cards_end_to_end() {
    let df = clean(Dataset::Cards);

    let numbers: Vec<i64> = df
        .column("card_number")
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(
        numbers,
        vec![30060773296197, 349624180933183, 4971858637664481, 3505784545024180]
    );
    assert!(is_categorical_dtype(df.column("card_provider").unwrap().dtype()));
    assert_eq!(
        strings(&df, "date_payment_confirmed"),
        vec!["2015-11-25", "2001-06-18", "2005-01-27", "2009-05-09"]
    );
}

#[test]
fn test_stores_end_to_end() {
    let df = clean(Dataset::Stores);

    assert_eq!(
        names(&df),
        vec![
            "index",
            "address",
            "latitude",
            "longitude",
            "locality",
            "store_code",
            "staff_numbers",
            "opening_date",
            "store_type",
            "country_code",
            "continent",
        ]
    );
    assert_eq!(
        strings(&df, "continent"),
        vec!["Europe", "Europe", "America", "Europe"]
    );
    assert_eq!(floats(&df, "latitude"), vec![51.62907, 48.52961, 36.16, 47.99]);
    assert_eq!(floats(&df, "longitude"), vec![0.71, 12.16, -86.78, 7.84]);
    assert!(is_categorical_dtype(df.column("store_type").unwrap().dtype()));
    assert!(is_categorical_dtype(df.column("country_code").unwrap().dtype()));
    assert_eq!(strings(&df, "opening_date")[3], "2009-03-19");
}

#[test]
fn test_products_end_to_end() {
    let df = clean(Dataset::Products);

    assert_eq!(
        names(&df),
        vec![
            "product_name",
            "price_£",
            "weight_kg",
            "category",
            "EAN",
            "date_added",
            "uuid",
            "removed",
            "product_code",
        ]
    );
    assert_eq!(floats(&df, "price_£"), vec![39.99, 9.99, 12.5, 15.0, 4.5]);

    let weights = floats(&df, "weight_kg");
    assert_eq!(weights[..3], [1.6, 1.2, 0.5]);
    assert!((weights[3] - 0.453592).abs() < 1e-9);
    assert_eq!(weights[4], 0.5);

    assert!(!strings(&df, "EAN").iter().any(|ean| ean.chars().count() > 13));
    assert!(is_categorical_dtype(df.column("category").unwrap().dtype()));
    assert!(is_categorical_dtype(df.column("removed").unwrap().dtype()));
}

#[test]
fn test_orders_end_to_end() {
    let df = clean(Dataset::Orders);

    assert_eq!(df.height(), 3);
    assert_eq!(
        names(&df),
        vec![
            "level_0",
            "index",
            "date_uuid",
            "user_uuid",
            "card_number",
            "store_code",
            "product_code",
            "product_quantity",
        ]
    );
}

#[test]
fn test_date_times_end_to_end() {
    let df = clean(Dataset::DateTimes);

    assert_eq!(
        strings(&df, "timestamp"),
        vec!["22:00:06", "22:44:06", "10:45:12", "18:16:15"]
    );
    assert_eq!(strings(&df, "month"), vec!["9", "2", "7", "11"]);
}

// ============================================================================
// Invariant Tests
// ============================================================================

#[test]
fn test_no_sentinel_or_missing_values_survive() {
    for dataset in [
        Dataset::Users,
        Dataset::Cards,
        Dataset::Stores,
        Dataset::Products,
        Dataset::DateTimes,
    ] {
        let df = clean(dataset);
        assert!(!contains_sentinel(&df, "NULL"), "{} still has NULL", dataset);
        assert_eq!(total_nulls(&df), 0, "{} still has missing values", dataset);
    }
}

#[test]
fn test_row_filter_leaves_no_matches() {
    let letters = Regex::new(r"[a-zA-Z]").unwrap();
    let raw = normalize_nulls(extract(Dataset::DateTimes), "NULL").unwrap();
    let rows_before = raw.height();

    let filtered = drop_rows_matching(raw, "month", &letters).unwrap();

    assert!(filtered.height() <= rows_before);
    assert!(!strings(&filtered, "month").iter().any(|m| letters.is_match(m)));
}

#[test]
fn test_null_and_row_filters_are_idempotent() {
    let digits = Regex::new(r"\d+").unwrap();
    let once = drop_rows_matching(
        normalize_nulls(extract(Dataset::Users), "NULL").unwrap(),
        "first_name",
        &digits,
    )
    .unwrap();
    let twice = drop_rows_matching(
        normalize_nulls(once.clone(), "NULL").unwrap(),
        "first_name",
        &digits,
    )
    .unwrap();

    assert_eq!(once.height(), 6);
    assert_eq!(once, twice);
}

#[test]
fn test_cleaning_cleaned_cards_is_stable() {
    let pipeline = EtlPipeline::default();
    let once = clean(Dataset::Cards);
    let twice = pipeline.clean_one(Dataset::Cards, once.clone()).unwrap();

    assert_eq!(once.shape(), twice.shape());
    assert_eq!(strings(&once, "card_number"), strings(&twice, "card_number"));
}

#[test]
fn test_cleaning_cleaned_users_keeps_rows_and_labels() {
    let pipeline = EtlPipeline::default();
    let once = clean(Dataset::Users);
    let twice = pipeline.clean_one(Dataset::Users, once.clone()).unwrap();

    assert_eq!(once.shape(), twice.shape());
    assert_eq!(strings(&once, "first_name"), strings(&twice, "first_name"));
    assert_eq!(strings(&once, "country_code"), strings(&twice, "country_code"));
    assert!(is_categorical_dtype(twice.column("country_code").unwrap().dtype()));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_config_file_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, r#"{"null_sentinel": "N/A"}"#).unwrap();

    let config = CleaningConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.null_sentinel, "N/A");
    assert_eq!(config.max_ean_length, 13);

    let raw = df! {
        "card_number" => &["4111111111111111", "N/A", "NULL"],
        "card_provider" => &["VISA 16 digit", "N/A", "NULL"],
        "date_payment_confirmed" => &["2015-11-25", "N/A", "NULL"],
    }
    .unwrap();

    let cleaned = EtlPipeline::new(config)
        .clean_one(Dataset::Cards, raw)
        .unwrap();
    assert_eq!(cleaned.height(), 1);
}

#[test]
fn test_config_file_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, r#"{"max_ean_length": 0}"#).unwrap();

    let err = CleaningConfig::from_json_file(&config_path).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
}
