//! Target column extraction and row filtering

use super::{ColumnKind, Dataset};
use crate::error::Result;
use std::cmp::Ordering;
use std::collections::HashSet;

/// How class labels are ordered in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOrder {
    /// Labels parse as numbers and sort by value
    Numeric,
    /// Labels sort as strings
    Lexical,
}

impl LabelOrder {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            LabelOrder::Numeric => {
                let x = a.parse::<f64>().unwrap_or(f64::NAN);
                let y = b.parse::<f64>().unwrap_or(f64::NAN);
                x.total_cmp(&y).then_with(|| a.cmp(b))
            }
            LabelOrder::Lexical => a.cmp(b),
        }
    }

    /// Sort and deduplicate labels in place
    pub fn sort(self, labels: &mut Vec<String>) {
        labels.sort_by(|a, b| self.compare(a, b));
        labels.dedup();
    }
}

/// The column a model learns to predict
#[derive(Debug, Clone)]
pub struct Target {
    name: String,
    kind: ColumnKind,
    labels: Vec<String>,
    values: Option<Vec<f64>>,
}

impl Target {
    pub fn from_dataset(dataset: &Dataset, name: &str) -> Result<Self> {
        let labels = dataset.column_as_text(name)?;
        let kind = dataset
            .column_kind(name)
            .unwrap_or(ColumnKind::Text);
        let values = if kind.is_numeric() {
            Some(dataset.column_as_f64(name)?)
        } else {
            None
        };

        Ok(Self {
            name: name.to_string(),
            kind,
            labels,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind.is_numeric()
    }

    pub fn is_float(&self) -> bool {
        self.kind == ColumnKind::Float
    }

    /// Values rendered as text, one per row
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Numeric values, present only for numeric targets
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }

    pub fn label_order(&self) -> LabelOrder {
        if self.is_numeric() {
            LabelOrder::Numeric
        } else {
            LabelOrder::Lexical
        }
    }

    pub fn distinct_count(&self) -> usize {
        self.labels.iter().collect::<HashSet<_>>().len()
    }

    /// Keep only rows whose label is in `allowed`.
    ///
    /// Returns the retained row indices alongside the filtered target, which
    /// is textual from here on.
    pub fn filter_allowed(&self, allowed: &[String]) -> (Target, Vec<usize>) {
        let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
        let rows: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .filter(|(_, label)| allowed.contains(label.as_str()))
            .map(|(i, _)| i)
            .collect();

        let labels = rows.iter().map(|&i| self.labels[i].clone()).collect();
        let filtered = Target {
            name: self.name.clone(),
            kind: ColumnKind::Text,
            labels,
            values: None,
        };
        (filtered, rows)
    }

    /// Target restricted to the given rows, in the given order
    pub fn subset(&self, rows: &[usize]) -> Target {
        Target {
            name: self.name.clone(),
            kind: self.kind,
            labels: rows.iter().map(|&i| self.labels[i].clone()).collect(),
            values: self
                .values
                .as_ref()
                .map(|v| rows.iter().map(|&i| v[i]).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn dataset() -> Dataset {
        Dataset::new(
            df!(
                "grade" => &[3i64, 1, 2, 10, 1],
                "color" => &["red", "blue", "red", "green", "blue"]
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_target() {
        let target = Target::from_dataset(&dataset(), "grade").unwrap();
        assert!(target.is_numeric());
        assert!(!target.is_float());
        assert_eq!(target.values().unwrap(), &[3.0, 1.0, 2.0, 10.0, 1.0]);
        assert_eq!(target.distinct_count(), 4);
        assert_eq!(target.label_order(), LabelOrder::Numeric);
    }

    #[test]
    fn test_numeric_labels_sort_by_value() {
        let mut labels: Vec<String> = vec!["10", "2", "1", "2"].into_iter().map(String::from).collect();
        LabelOrder::Numeric.sort(&mut labels);
        assert_eq!(labels, vec!["1", "2", "10"]);

        let mut labels: Vec<String> = vec!["10", "2", "1"].into_iter().map(String::from).collect();
        LabelOrder::Lexical.sort(&mut labels);
        assert_eq!(labels, vec!["1", "10", "2"]);
    }

    #[test]
    fn test_filter_allowed_makes_target_textual() {
        let target = Target::from_dataset(&dataset(), "grade").unwrap();
        let (filtered, rows) = target.filter_allowed(&["1".to_string(), "10".to_string()]);

        assert_eq!(rows, vec![1, 3, 4]);
        assert_eq!(filtered.labels(), &["1", "10", "1"]);
        assert!(!filtered.is_numeric());
        assert!(filtered.values().is_none());
    }

    #[test]
    fn test_subset() {
        let target = Target::from_dataset(&dataset(), "color").unwrap();
        let subset = target.subset(&[4, 0]);
        assert_eq!(subset.labels(), &["blue", "red"]);
        assert_eq!(subset.kind(), ColumnKind::Text);
    }
}
