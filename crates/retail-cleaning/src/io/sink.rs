//! Destinations for cleaned tables.

use super::DatasetSink;
use crate::config::OutputFormat;
use crate::error::Result;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Writes each table to `<output_dir>/<table>.<ext>`, replacing any
/// previous file of the same name.
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, table: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", table, self.format.extension()))
    }
}

impl DatasetSink for FileSink {
    fn load(&self, df: &mut DataFrame, table: &str) -> Result<String> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(table);
        let mut file = File::create(&path)?;

        match self.format {
            OutputFormat::Csv => {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .with_separator(b',')
                    .with_quote_char(b'"')
                    .finish(df)?;
            }
            OutputFormat::Parquet => {
                ParquetWriter::new(&mut file).finish(df)?;
            }
        }

        info!("Wrote {} rows to {}", df.height(), path.display());
        Ok(path.display().to_string())
    }
}

/// Keeps loaded tables in memory, keyed by table name.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<BTreeMap<String, DataFrame>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a loaded table.
    pub fn table(&self, name: &str) -> Option<DataFrame> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Names of all loaded tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl DatasetSink for MemorySink {
    fn load(&self, df: &mut DataFrame, table: &str) -> Result<String> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.to_string(), df.clone());
        Ok(format!("memory://{}", table))
    }
}
