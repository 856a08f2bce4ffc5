//! Extract, clean and load driver.
//!
//! Datasets are processed one at a time in the order requested. The first
//! failure aborts the run; tables already loaded stay loaded.

use crate::cleaner::DataCleaner;
use crate::config::CleaningConfig;
use crate::error::{Result, ResultExt};
use crate::io::{DatasetSink, DatasetSource};
use crate::types::{Dataset, DatasetSummary, RunSummary};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, error, info};

/// Runs the cleaning rules between a source and a sink.
///
/// # Example
///
/// ```rust,ignore
/// use retail_cleaning::{CleaningConfig, Dataset, EtlPipeline, FileSink, LocalFileSource};
///
/// let pipeline = EtlPipeline::new(CleaningConfig::default());
/// let source = LocalFileSource::new("data");
/// let sink = FileSink::new("outputs", Default::default());
/// let summary = pipeline.run(&source, &sink, &Dataset::ALL)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct EtlPipeline {
    cleaner: DataCleaner,
}

static_assertions::assert_impl_all!(EtlPipeline: Send, Sync);

impl EtlPipeline {
    pub fn new(config: CleaningConfig) -> Self {
        Self {
            cleaner: DataCleaner::new(config),
        }
    }

    pub fn cleaner(&self) -> &DataCleaner {
        &self.cleaner
    }

    /// Clean one already-extracted dataset.
    pub fn clean_one(&self, dataset: Dataset, df: DataFrame) -> Result<DataFrame> {
        self.cleaner
            .clean(dataset, df)
            .context(format!("Cleaning {}", dataset))
    }

    /// Extract, clean and load each of `datasets` in order.
    pub fn run(
        &self,
        source: &dyn DatasetSource,
        sink: &dyn DatasetSink,
        datasets: &[Dataset],
    ) -> Result<RunSummary> {
        let start_time = Instant::now();
        info!("Starting run over {} dataset(s)", datasets.len());

        let mut summary = RunSummary::default();
        for &dataset in datasets {
            match self.run_dataset(source, sink, dataset) {
                Ok(dataset_summary) => summary.datasets.push(dataset_summary),
                Err(e) => {
                    error!("Run aborted at {}: {}", dataset, e);
                    return Err(e);
                }
            }
        }

        summary.total_duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Run finished in {} ms ({} rows removed)",
            summary.total_duration_ms,
            summary.total_rows_removed()
        );
        Ok(summary)
    }

    fn run_dataset(
        &self,
        source: &dyn DatasetSource,
        sink: &dyn DatasetSink,
        dataset: Dataset,
    ) -> Result<DatasetSummary> {
        let start_time = Instant::now();
        let table = dataset.destination_table();

        info!("Step 1: Extracting {}...", dataset);
        let raw = source
            .extract(dataset)
            .context(format!("Extracting {}", dataset))?;
        let (rows_before, columns_before) = raw.shape();

        info!("Step 2: Cleaning {}...", dataset);
        let mut cleaned = self.clean_one(dataset, raw)?;
        let (rows_after, columns_after) = cleaned.shape();
        debug!(
            "{}: {} -> {} rows, {} -> {} columns",
            dataset, rows_before, rows_after, columns_before, columns_after
        );

        info!("Step 3: Loading {} into {}...", dataset, table);
        let location = sink
            .load(&mut cleaned, table)
            .context(format!("Loading {} into {}", dataset, table))?;

        Ok(DatasetSummary {
            dataset,
            destination_table: table.to_string(),
            rows_before,
            rows_after,
            columns_before,
            columns_after,
            duration_ms: start_time.elapsed().as_millis() as u64,
            output_path: Some(location),
        })
    }
}
