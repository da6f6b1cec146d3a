//! One-hot encoding and train/test feature alignment

use crate::dataset::ColumnKind;
use crate::error::{PipelineError, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};

/// Feature matrices with identical columns for both partitions
#[derive(Debug, Clone)]
pub struct EncodedMatrices {
    pub columns: Vec<String>,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
}

/// Replace every text column with one indicator column per observed category.
///
/// Numeric columns keep their relative order and come first; indicators
/// follow, named `<column>_<category>` with categories sorted. An indicator
/// name that repeats another output column is an input error.
pub fn one_hot(df: &DataFrame) -> Result<DataFrame> {
    let mut numeric: Vec<Column> = Vec::new();
    let mut indicators: Vec<Column> = Vec::new();
    let mut seen: HashSet<String> = df
        .get_columns()
        .iter()
        .filter(|c| ColumnKind::of(c.dtype()).is_numeric())
        .map(|c| c.name().to_string())
        .collect();
    let mut collisions: BTreeSet<String> = BTreeSet::new();

    for column in df.get_columns() {
        if ColumnKind::of(column.dtype()).is_numeric() {
            numeric.push(column.clone());
            continue;
        }

        let values: Vec<String> = column
            .as_materialized_series()
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();
        let categories: BTreeSet<&str> = values.iter().map(String::as_str).collect();

        for category in categories {
            let indicator: Vec<f64> = values
                .iter()
                .map(|v| if v == category { 1.0 } else { 0.0 })
                .collect();
            let name = format!("{}_{}", column.name(), category);
            if !seen.insert(name.clone()) {
                collisions.insert(name);
                continue;
            }
            indicators.push(Series::new(name.into(), indicator).into());
        }
    }

    if !collisions.is_empty() {
        return Err(PipelineError::EncodedColumnCollision(collisions.into_iter().collect()));
    }

    numeric.extend(indicators);
    Ok(DataFrame::new(numeric)?)
}

/// Give `train` and `test` the same columns in train's order.
///
/// Columns only in train are added to test as zeros; columns only in test are
/// appended to train as zeros, sorted by name.
pub fn align(mut train: DataFrame, mut test: DataFrame) -> Result<(DataFrame, DataFrame)> {
    let train_cols = column_names(&train);
    let test_cols = column_names(&test);
    let train_set: HashSet<&str> = train_cols.iter().map(String::as_str).collect();
    let test_set: HashSet<&str> = test_cols.iter().map(String::as_str).collect();

    for name in train_cols.iter().filter(|c| !test_set.contains(c.as_str())) {
        test.with_column(zeros(name, test.height()))?;
    }

    let mut only_in_test: Vec<&String> = test_cols
        .iter()
        .filter(|c| !train_set.contains(c.as_str()))
        .collect();
    only_in_test.sort();
    for name in only_in_test {
        train.with_column(zeros(name, train.height()))?;
    }

    let order = column_names(&train);
    let test = test.select(order)?;
    Ok((train, test))
}

/// One-hot both partitions independently, align them and build matrices
pub fn encode_partitions(train: &DataFrame, test: &DataFrame) -> Result<EncodedMatrices> {
    let (train, test) = align(one_hot(train)?, one_hot(test)?)?;
    let columns = column_names(&train);
    if columns.is_empty() {
        return Err(PipelineError::Data("no feature columns after encoding".to_string()));
    }

    Ok(EncodedMatrices {
        x_train: columns_to_array2(&train, &columns)?,
        x_test: columns_to_array2(&test, &columns)?,
        columns,
    })
}

/// Build a row-major `f64` matrix from the named columns
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::ColumnNotFound(col_name.clone()))?;
            let values: Vec<f64> = column
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

fn zeros(name: &str, height: usize) -> Series {
    Series::new(name.into(), vec![0.0f64; height])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_one_hot_puts_numeric_first() {
        let df = df!(
            "city" => &["oslo", "paris", "oslo"],
            "age" => &[20i64, 30, 40]
        )
        .unwrap();

        let encoded = one_hot(&df).unwrap();
        assert_eq!(column_names(&encoded), vec!["age", "city_oslo", "city_paris"]);

        let m = columns_to_array2(&encoded, &column_names(&encoded)).unwrap();
        assert_eq!(m, array![[20.0, 1.0, 0.0], [30.0, 0.0, 1.0], [40.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_one_hot_name_collisions() {
        let df = df!("c" => &["a", "b"], "c_a" => &[1.0, 2.0]).unwrap();
        match one_hot(&df).unwrap_err() {
            PipelineError::EncodedColumnCollision(cols) => assert_eq!(cols, vec!["c_a"]),
            other => panic!("unexpected error: {:?}", other),
        }

        let df = df!("c" => &["a_b", "x"], "c_a" => &["b", "y"]).unwrap();
        let err = one_hot(&df).unwrap_err();
        assert!(matches!(err, PipelineError::EncodedColumnCollision(ref cols) if cols == &vec!["c_a_b"]));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_align_adds_missing_columns_both_ways() {
        let train = df!("age" => &[1.0, 2.0], "c_a" => &[1.0, 0.0], "c_b" => &[0.0, 1.0]).unwrap();
        let test = df!("c_z" => &[1.0], "age" => &[3.0], "c_a" => &[0.0]).unwrap();

        let (train, test) = align(train, test).unwrap();

        assert_eq!(column_names(&train), vec!["age", "c_a", "c_b", "c_z"]);
        assert_eq!(column_names(&train), column_names(&test));

        let test_m = columns_to_array2(&test, &column_names(&test)).unwrap();
        assert_eq!(test_m, array![[3.0, 0.0, 0.0, 1.0]]);
        let train_m = columns_to_array2(&train, &column_names(&train)).unwrap();
        assert_eq!(train_m.column(3).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_encoded_partitions_share_columns() {
        let train = df!("color" => &["red", "blue", "red"], "x" => &[1.0, 2.0, 3.0]).unwrap();
        let test = df!("color" => &["green"], "x" => &[4.0]).unwrap();

        let encoded = encode_partitions(&train, &test).unwrap();
        assert_eq!(encoded.columns, vec!["x", "color_blue", "color_red", "color_green"]);
        assert_eq!(encoded.x_train.ncols(), encoded.x_test.ncols());
        assert_eq!(encoded.x_test, array![[4.0, 0.0, 0.0, 1.0]]);
    }
}
