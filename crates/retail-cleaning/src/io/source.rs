//! Local file extraction.

use super::DatasetSource;
use crate::error::{CleaningError, Result};
use crate::types::{Dataset, SourceFormat};
use crate::utils::column_names;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads raw extracts from a directory: `<stem>.csv`, or `<stem>.json` for
/// the column-oriented JSON feed.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    root: PathBuf,
}

impl LocalFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path the raw file for `dataset` is expected at.
    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        let extension = match dataset.source_format() {
            SourceFormat::Csv => "csv",
            SourceFormat::ColumnJson => "json",
        };
        self.root
            .join(format!("{}.{}", dataset.source_stem(), extension))
    }
}

impl DatasetSource for LocalFileSource {
    fn extract(&self, dataset: Dataset) -> Result<DataFrame> {
        let path = self.path_for(dataset);
        if !path.exists() {
            return Err(CleaningError::SourceNotFound(path));
        }

        info!("Loading {} from: {}", dataset, path.display());
        let df = match dataset.source_format() {
            SourceFormat::Csv => read_csv_as_text(&path)?,
            SourceFormat::ColumnJson => read_column_json(&path)?,
        };
        info!("Loaded {}: {:?}", dataset, df.shape());
        Ok(df)
    }
}

fn csv_options(quote_char: Option<u8>) -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        // Every column as text: the cleaners decide what is numeric.
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_quote_char(quote_char))
}

fn read_with_quote(path: &Path, quote_char: Option<u8>) -> PolarsResult<DataFrame> {
    csv_options(quote_char)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Read a CSV file with every column as text.
///
/// Falls back to reading without quote handling when the standard parse
/// fails. Columns whose header cell is blank are named `Unnamed: <position>`.
pub fn read_csv_as_text(path: &Path) -> Result<DataFrame> {
    let (df, quote_char) = match read_with_quote(path, Some(b'"')) {
        Ok(df) => (df, Some(b'"')),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
            (read_with_quote(path, None)?, None)
        }
    };
    let blanks = blank_header_positions(path, quote_char)?;
    name_blank_headers(df, &blanks)
}

/// Positions of blank cells in the raw header row.
///
/// The header is read as a data row so the cells are seen before polars
/// substitutes its own names for blank ones.
fn blank_header_positions(path: &Path, quote_char: Option<u8>) -> Result<Vec<usize>> {
    let header = CsvReadOptions::default()
        .with_has_header(false)
        .with_n_rows(Some(1))
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_quote_char(quote_char))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let mut blanks = Vec::new();
    for (idx, col) in header.get_columns().iter().enumerate() {
        let cell = col.as_materialized_series().str()?.get(0).unwrap_or("");
        if cell.trim().is_empty() {
            blanks.push(idx);
        }
    }
    Ok(blanks)
}

fn name_blank_headers(df: DataFrame, blanks: &[usize]) -> Result<DataFrame> {
    let mut df = df;
    let names = column_names(&df);
    for &idx in blanks {
        if let Some(name) = names.get(idx) {
            df.rename(name, format!("Unnamed: {}", idx).into())?;
        }
    }
    Ok(df)
}

fn malformed(path: &Path, reason: impl Into<String>) -> CleaningError {
    CleaningError::MalformedSource {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn scalar_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Read a column-oriented JSON table: `{"col": {"0": v0, "1": v1}, ...}`.
///
/// Rows are ordered by their numeric key and every column must carry the
/// same keys. Scalars become text; JSON `null` becomes a missing value.
pub fn read_column_json(path: &Path) -> Result<DataFrame> {
    let content = fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&content)?;
    let Value::Object(columns) = root else {
        return Err(malformed(path, "expected an object of columns"));
    };

    let mut expected_keys: Option<Vec<usize>> = None;
    let mut series: Vec<Column> = Vec::with_capacity(columns.len());

    for (name, cells) in &columns {
        let Value::Object(cells) = cells else {
            return Err(malformed(path, format!("column '{}' is not an object", name)));
        };

        let mut rows = cells
            .iter()
            .map(|(key, value)| {
                key.parse::<usize>()
                    .map(|idx| (idx, scalar_to_text(value)))
                    .map_err(|_| malformed(path, format!("row key '{}' is not an index", key)))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.sort_by_key(|(idx, _)| *idx);

        let keys: Vec<usize> = rows.iter().map(|(idx, _)| *idx).collect();
        match &expected_keys {
            Some(expected) if *expected != keys => {
                return Err(malformed(
                    path,
                    format!("column '{}' has a different row index", name),
                ));
            }
            Some(_) => {}
            None => expected_keys = Some(keys),
        }

        let values: Vec<Option<String>> = rows.into_iter().map(|(_, value)| value).collect();
        series.push(Series::new(name.as_str().into(), values).into());
    }

    Ok(DataFrame::new(series)?)
}
