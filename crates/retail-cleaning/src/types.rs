use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The raw tables the pipeline knows how to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Users,
    Cards,
    Stores,
    Products,
    Orders,
    DateTimes,
}

/// On-disk layout of a raw dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// Column-oriented JSON: `{"column": {"0": value, ...}}`
    ColumnJson,
}

impl Dataset {
    /// Every dataset, in load order.
    pub const ALL: [Dataset; 6] = [
        Dataset::Users,
        Dataset::Cards,
        Dataset::Stores,
        Dataset::Products,
        Dataset::Orders,
        Dataset::DateTimes,
    ];

    /// Short name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Users => "users",
            Dataset::Cards => "cards",
            Dataset::Stores => "stores",
            Dataset::Products => "products",
            Dataset::Orders => "orders",
            Dataset::DateTimes => "date_times",
        }
    }

    /// File stem of the raw extract.
    pub fn source_stem(&self) -> &'static str {
        match self {
            Dataset::Users => "legacy_users",
            Dataset::Cards => "card_details",
            Dataset::Stores => "store_details",
            Dataset::Products => "products",
            Dataset::Orders => "orders_table",
            Dataset::DateTimes => "date_details",
        }
    }

    pub fn source_format(&self) -> SourceFormat {
        match self {
            Dataset::DateTimes => SourceFormat::ColumnJson,
            _ => SourceFormat::Csv,
        }
    }

    /// Table the cleaned dataset is loaded into.
    pub fn destination_table(&self) -> &'static str {
        match self {
            Dataset::Users => "dim_users",
            Dataset::Cards => "dim_card_details",
            Dataset::Stores => "dim_store_details",
            Dataset::Products => "dim_products",
            Dataset::Orders => "orders_table",
            Dataset::DateTimes => "dim_date_times",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Dataset::ALL
            .into_iter()
            .find(|d| d.name() == wanted || d.source_stem() == wanted || d.destination_table() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Dataset::ALL.iter().map(|d| d.name()).collect();
                format!("unknown dataset '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Shape change produced by cleaning one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub dataset: Dataset,
    pub destination_table: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub duration_ms: u64,
    /// Where the loader put the table, when it wrote one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

impl DatasetSummary {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub datasets: Vec<DatasetSummary>,
    pub total_duration_ms: u64,
}

impl RunSummary {
    pub fn total_rows_removed(&self) -> usize {
        self.datasets.iter().map(DatasetSummary::rows_removed).sum()
    }
}
