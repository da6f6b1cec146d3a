//! Per-column value statistics

use super::Dataset;
use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Most frequent values reported per column
pub const TOP_VALUES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Distribution summary of a single column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub dtype: String,
    pub n_unique: usize,
    pub top: Vec<ValueCount>,
}

impl ColumnStats {
    pub fn compute(dataset: &Dataset, column: &str) -> Result<Self> {
        if !dataset.has_column(column) {
            return Err(PipelineError::ColumnNotFound(column.to_string()));
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in dataset.column_as_text(column)? {
            *counts.entry(value).or_insert(0) += 1;
        }
        let n_unique = counts.len();

        let mut top: Vec<ValueCount> = counts
            .into_iter()
            .map(|(value, count)| ValueCount { value, count })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        top.truncate(TOP_VALUES);

        Ok(Self {
            column: column.to_string(),
            dtype: dataset.dtype_name(column)?,
            n_unique,
            top,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_counts_sorted_by_frequency_then_value() {
        let ds = Dataset::new(df!("c" => &["b", "a", "b", "c", "a", "b"]).unwrap()).unwrap();
        let stats = ColumnStats::compute(&ds, "c").unwrap();

        assert_eq!(stats.n_unique, 3);
        assert_eq!(
            stats.top,
            vec![
                ValueCount { value: "b".into(), count: 3 },
                ValueCount { value: "a".into(), count: 2 },
                ValueCount { value: "c".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_top_is_truncated() {
        let values: Vec<i64> = (0..120).collect();
        let ds = Dataset::new(df!("id" => values).unwrap()).unwrap();
        let stats = ColumnStats::compute(&ds, "id").unwrap();

        assert_eq!(stats.n_unique, 120);
        assert_eq!(stats.top.len(), TOP_VALUES);
        assert_eq!(stats.dtype, "Int64");
    }

    #[test]
    fn test_unknown_column() {
        let ds = Dataset::new(df!("c" => &[1i64]).unwrap()).unwrap();
        let err = ColumnStats::compute(&ds, "missing").unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound(c) if c == "missing"));
    }
}
