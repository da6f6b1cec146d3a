//! In-memory tabular datasets
//!
//! A [`Dataset`] is a polars `DataFrame` whose columns have been normalized at
//! ingestion time: every column is integer, float or text, and no cell is
//! missing. Everything downstream relies on both properties.

mod excel;
mod stats;
mod store;
mod target;

pub use stats::{ColumnStats, ValueCount};
pub use store::{DatasetStore, SessionId};
pub use target::{LabelOrder, Target};

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Logical column type after ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    /// Classify a polars dtype
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
                ColumnKind::Integer
            }
            DataType::Float32 | DataType::Float64 => ColumnKind::Float,
            _ => ColumnKind::Text,
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, ColumnKind::Text)
    }
}

/// Shape and per-column summary returned after an upload
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    pub column_types: BTreeMap<String, String>,
    pub columns_unique_counts: BTreeMap<String, usize>,
}

/// A gap-free, read-only table
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Normalize a raw frame into a dataset, filling missing values with zero
    pub fn new(raw: DataFrame) -> Result<Self> {
        let columns = raw
            .get_columns()
            .iter()
            .map(|column| fill_missing(column.as_materialized_series()).map(Column::from))
            .collect::<Result<Vec<_>>>()?;

        let frame = DataFrame::new(columns)?;
        Ok(Self { frame })
    }

    /// Parse an uploaded file, choosing the reader from its extension
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> Result<Self> {
        let lower = file_name.to_lowercase();
        let parsed = if lower.ends_with(".csv") {
            CsvReadOptions::default()
                .with_infer_schema_length(Some(1000))
                .with_has_header(true)
                .into_reader_with_file_handle(Cursor::new(bytes))
                .finish()
        } else if lower.ends_with(".json") {
            JsonReader::new(Cursor::new(bytes)).finish()
        } else if lower.ends_with(".parquet") {
            ParquetReader::new(Cursor::new(bytes)).finish()
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            let raw = excel::read_workbook(bytes)?;
            debug!(file = %file_name, rows = raw.height(), columns = raw.width(), "Parsed workbook");
            return Self::new(raw);
        } else {
            return Err(PipelineError::UnsupportedFileType(file_name.to_string()));
        };
        let raw = parsed.map_err(|e| PipelineError::Ingest(e.to_string()))?;

        debug!(file = %file_name, rows = raw.height(), columns = raw.width(), "Parsed upload");
        Self::new(raw)
    }

    /// Load a dataset from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| PipelineError::Ingest(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::from_bytes(&name, &bytes)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn n_columns(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.frame.column(name).ok().map(|c| ColumnKind::of(c.dtype()))
    }

    /// Polars dtype name, as shown to clients
    pub fn dtype_name(&self, name: &str) -> Result<String> {
        Ok(format!("{:?}", self.series(name)?.dtype()))
    }

    pub fn unique_count(&self, name: &str) -> Result<usize> {
        Ok(self.series(name)?.n_unique()?)
    }

    /// Column values rendered as text (`1`, `2.5`, `red`)
    pub fn column_as_text(&self, name: &str) -> Result<Vec<String>> {
        let text = self.series(name)?.cast(&DataType::String)?;
        let values = text
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or("0").to_string())
            .collect();
        Ok(values)
    }

    /// Numeric column values as `f64`
    pub fn column_as_f64(&self, name: &str) -> Result<Vec<f64>> {
        let values = self
            .series(name)?
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();
        Ok(values)
    }

    pub fn summary(&self) -> Result<DatasetSummary> {
        let columns = self.column_names();
        let mut column_types = BTreeMap::new();
        let mut columns_unique_counts = BTreeMap::new();
        for name in &columns {
            column_types.insert(name.clone(), self.dtype_name(name)?);
            columns_unique_counts.insert(name.clone(), self.unique_count(name)?);
        }

        Ok(DatasetSummary {
            rows: self.n_rows(),
            columns,
            column_types,
            columns_unique_counts,
        })
    }

    fn series(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))
    }
}

/// Replace nulls (and float NaNs) with a zero of the column's type.
///
/// Integer columns with gaps are promoted to float, booleans become 0/1
/// integers and anything that is neither numeric nor text is rendered as text.
fn fill_missing(series: &Series) -> Result<Series> {
    let name = series.name().clone();

    let filled = match series.dtype() {
        DataType::Boolean => {
            let values: Vec<i32> = series
                .cast(&DataType::Int32)?
                .i32()?
                .into_iter()
                .map(|v| v.unwrap_or(0))
                .collect();
            Series::new(name, values)
        }
        dtype if ColumnKind::of(dtype) == ColumnKind::Integer && series.null_count() == 0 => {
            series.clone()
        }
        dtype if ColumnKind::of(dtype).is_numeric() => {
            let values: Vec<f64> = series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()).unwrap_or(0.0))
                .collect();
            Series::new(name, values)
        }
        _ => {
            let text = series
                .cast(&DataType::String)
                .map_err(|e| PipelineError::Ingest(format!("column '{}': {}", name, e)))?;
            let values: Vec<String> = text
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or("0").to_string())
                .collect();
            Series::new(name, values)
        }
    };

    Ok(filled)
}
