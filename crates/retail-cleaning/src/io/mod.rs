//! Extraction and loading seams.
//!
//! The cleaners never touch files or connections. A [`DatasetSource`] hands
//! them raw tables and a [`DatasetSink`] takes the cleaned ones away, keyed by
//! destination table name. The implementations here work on local files; a
//! database or HTTP collaborator only needs to implement the same traits.

mod sink;
mod source;

pub use sink::{FileSink, MemorySink};
pub use source::{LocalFileSource, read_column_json, read_csv_as_text};

use crate::error::Result;
use crate::types::Dataset;
use polars::prelude::DataFrame;

/// Produces raw datasets.
pub trait DatasetSource: Send + Sync {
    /// Fetch the raw table for `dataset`.
    fn extract(&self, dataset: Dataset) -> Result<DataFrame>;
}

/// Receives cleaned datasets.
pub trait DatasetSink: Send + Sync {
    /// Store `df` under `table`, returning a human-readable location.
    fn load(&self, df: &mut DataFrame, table: &str) -> Result<String>;
}
