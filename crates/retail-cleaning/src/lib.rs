//! Retail Data Cleaning Library
//!
//! Cleaning rules for the raw tables of a retail sales star schema, built
//! with Rust and Polars.
//!
//! # Overview
//!
//! Six raw datasets are extracted, cleaned and loaded under their destination
//! table names:
//!
//! | Dataset      | Raw file            | Destination table    |
//! |--------------|---------------------|----------------------|
//! | `users`      | `legacy_users.csv`  | `dim_users`          |
//! | `cards`      | `card_details.csv`  | `dim_card_details`   |
//! | `stores`     | `store_details.csv` | `dim_store_details`  |
//! | `products`   | `products.csv`      | `dim_products`       |
//! | `orders`     | `orders_table.csv`  | `orders_table`       |
//! | `date_times` | `date_details.json` | `dim_date_times`     |
//!
//! The building blocks:
//!
//! - **Null normalisation**: the `"NULL"` sentinel becomes a real missing
//!   value and incomplete rows are dropped
//! - **Row filters**: records with digits in names or letters in numeric
//!   fields are removed
//! - **Conversions**: strict date, float, integer and categorical coercion
//! - **Weights**: free-text weights (`"12 x 100g"`, `"16oz"`) to kilograms
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use retail_cleaning::{CleaningConfig, Dataset, EtlPipeline, FileSink, LocalFileSource};
//!
//! let config = CleaningConfig::builder()
//!     .null_sentinel("NULL")
//!     .build()?;
//!
//! let pipeline = EtlPipeline::new(config);
//! let summary = pipeline.run(
//!     &LocalFileSource::new("data"),
//!     &FileSink::new("outputs", Default::default()),
//!     &Dataset::ALL,
//! )?;
//!
//! println!("{} rows removed", summary.total_rows_removed());
//! ```
//!
//! Cleaning a frame that is already in memory:
//!
//! ```rust,ignore
//! use retail_cleaning::DataCleaner;
//!
//! let cleaned = DataCleaner::default().clean_products_data(raw_products)?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{DataCleaner, ParsedWeight, normalize_phone_number, parse_weight};
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, DEFAULT_DATE_FORMATS,
    OutputFormat,
};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use io::{DatasetSink, DatasetSource, FileSink, LocalFileSource, MemorySink};
pub use pipeline::EtlPipeline;
pub use types::{Dataset, DatasetSummary, RunSummary, SourceFormat};
