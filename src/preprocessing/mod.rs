//! Data preprocessing module
//!
//! Provides the stages between a validated request and a model fit:
//! - Seeded train/test splitting with stratification
//! - Per-column scaling (StandardScaler, MinMaxScaler) fitted on train only
//! - One-hot encoding and train/test column alignment

mod encoder;
mod scaler;
mod split;

pub use encoder::{align, columns_to_array2, encode_partitions, one_hot, EncodedMatrices};
pub use scaler::{Scaler, ScalerParams, ScalerType};
pub use split::{
    random_split, stratified_split, take_rows, train_test_split, SplitStrategy, StratifyError,
    TrainTestSplit,
};

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Which feature columns get which scaler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessingPlan {
    pub standardize: Vec<String>,
    pub normalize: Vec<String>,
}

impl PreprocessingPlan {
    /// Fit the planned scalers on `train` and apply them to both partitions
    pub fn apply(&self, train: &DataFrame, test: &DataFrame) -> Result<(DataFrame, DataFrame)> {
        let mut train = train.clone();
        let mut test = test.clone();

        for (scaler_type, columns) in [
            (ScalerType::Standard, &self.standardize),
            (ScalerType::MinMax, &self.normalize),
        ] {
            if columns.is_empty() {
                continue;
            }
            let mut scaler = Scaler::new(scaler_type);
            scaler.fit(&train, columns)?;
            train = scaler.transform(&train)?;
            test = scaler.transform(&test)?;
        }

        Ok((train, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_statistics_ignore_test_content() {
        let plan = PreprocessingPlan {
            standardize: vec!["a".to_string()],
            normalize: vec!["b".to_string()],
        };
        let train = df!("a" => &[1.0, 3.0], "b" => &[0.0, 4.0]).unwrap();
        let test_one = df!("a" => &[100.0], "b" => &[2.0]).unwrap();
        let test_two = df!("a" => &[-5.0], "b" => &[-40.0]).unwrap();

        let (train_one, _) = plan.apply(&train, &test_one).unwrap();
        let (train_two, scaled_two) = plan.apply(&train, &test_two).unwrap();

        assert!(train_one.equals(&train_two));
        let a: Vec<f64> = train_one.column("a").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(a, vec![-1.0, 1.0]);
        let b: Vec<f64> = scaled_two.column("b").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(b, vec![-10.0]);
    }
}
