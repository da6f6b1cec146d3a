//! Training engine implementation

use super::config::ModelSpec;
use super::decision_tree::DecisionTree;
use super::linear_models::{LinearRegression, LogisticRegression};
use super::random_forest::RandomForest;
use crate::dataset::{LabelOrder, Target};
use crate::error::{PipelineError, Result};
use crate::task::TaskType;
use ndarray::{Array1, Array2};
use std::time::Instant;
use tracing::{debug, info};

/// Enum to hold trained model variants
#[derive(Debug, Clone)]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    DecisionTreeClassifier(DecisionTree),
    RandomForestClassifier(RandomForest),
    LinearRegression(LinearRegression),
    DecisionTreeRegressor(DecisionTree),
    RandomForestRegressor(RandomForest),
}

impl TrainedModel {
    /// Unfitted estimator for `spec`
    pub fn from_spec(spec: &ModelSpec) -> Self {
        match *spec {
            ModelSpec::LogisticClassifier { max_iter } => {
                TrainedModel::LogisticRegression(LogisticRegression::new().with_max_iter(max_iter))
            }
            ModelSpec::TreeClassifier { max_depth, seed } => TrainedModel::DecisionTreeClassifier(
                DecisionTree::new_classifier()
                    .with_max_depth(max_depth)
                    .with_random_state(seed),
            ),
            ModelSpec::ForestClassifier { n_estimators, max_depth, seed } => {
                TrainedModel::RandomForestClassifier(
                    RandomForest::new_classifier(n_estimators)
                        .with_max_depth(max_depth)
                        .with_random_state(seed),
                )
            }
            ModelSpec::LinearRegressor => TrainedModel::LinearRegression(LinearRegression::new()),
            ModelSpec::TreeRegressor { max_depth, seed } => TrainedModel::DecisionTreeRegressor(
                DecisionTree::new_regressor()
                    .with_max_depth(max_depth)
                    .with_random_state(seed),
            ),
            ModelSpec::ForestRegressor { n_estimators, max_depth, seed } => {
                TrainedModel::RandomForestRegressor(
                    RandomForest::new_regressor(n_estimators)
                        .with_max_depth(max_depth)
                        .with_random_state(seed),
                )
            }
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            TrainedModel::LogisticRegression(m) => { m.fit(x, y)?; }
            TrainedModel::DecisionTreeClassifier(m) | TrainedModel::DecisionTreeRegressor(m) => {
                m.fit(x, y)?;
            }
            TrainedModel::RandomForestClassifier(m) | TrainedModel::RandomForestRegressor(m) => {
                m.fit(x, y)?;
            }
            TrainedModel::LinearRegression(m) => { m.fit(x, y)?; }
        }
        Ok(())
    }

    /// Predict class indices or values; non-finite output is an error
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let predictions = match self {
            TrainedModel::LogisticRegression(m) => m.predict(x)?,
            TrainedModel::DecisionTreeClassifier(m) | TrainedModel::DecisionTreeRegressor(m) => {
                m.predict(x)?
            }
            TrainedModel::RandomForestClassifier(m) | TrainedModel::RandomForestRegressor(m) => {
                m.predict(x)?
            }
            TrainedModel::LinearRegression(m) => m.predict(x)?,
        };

        if let Some(pos) = predictions.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::training(format!(
                "model produced a non-finite prediction for test row {}",
                pos
            )));
        }
        Ok(predictions)
    }
}

/// Mapping between class labels and the indices models are trained on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEncoder {
    classes: Vec<String>,
}

impl ClassEncoder {
    /// Sorted distinct classes of the training labels
    pub fn fit(labels: &[String], order: LabelOrder) -> Self {
        let mut classes = labels.to_vec();
        order.sort(&mut classes);
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, labels: &[String]) -> Result<Array1<f64>> {
        labels
            .iter()
            .map(|label| {
                self.classes
                    .iter()
                    .position(|c| c == label)
                    .map(|i| i as f64)
                    .ok_or_else(|| PipelineError::training(format!("unknown class '{}'", label)))
            })
            .collect()
    }

    pub fn decode(&self, indices: &Array1<f64>) -> Result<Vec<String>> {
        indices
            .iter()
            .map(|&i| {
                self.classes
                    .get(i as usize)
                    .cloned()
                    .ok_or_else(|| PipelineError::training(format!("class index {} out of range", i)))
            })
            .collect()
    }
}

/// Test-partition predictions in the target's own terms
#[derive(Debug, Clone, PartialEq)]
pub enum Predictions {
    Labels(Vec<String>),
    Values(Vec<f64>),
}

/// Fits one estimator and predicts the test partition
#[derive(Debug, Clone)]
pub struct TrainEngine {
    spec: ModelSpec,
}

impl TrainEngine {
    pub fn new(spec: ModelSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn fit_predict(
        &self,
        x_train: &Array2<f64>,
        y_train: &Target,
        x_test: &Array2<f64>,
    ) -> Result<Predictions> {
        let start = Instant::now();
        let mut model = TrainedModel::from_spec(&self.spec);

        let predictions = match self.spec.task() {
            TaskType::Classification => {
                let encoder = ClassEncoder::fit(y_train.labels(), y_train.label_order());
                let y = encoder.encode(y_train.labels())?;
                debug!(classes = encoder.classes().len(), "Encoded class labels");

                model.fit(x_train, &y)?;
                Predictions::Labels(encoder.decode(&model.predict(x_test)?)?)
            }
            TaskType::Regression => {
                let values = y_train
                    .values()
                    .ok_or_else(|| PipelineError::NonNumericTarget(y_train.name().to_string()))?;
                let y = Array1::from_vec(values.to_vec());

                model.fit(x_train, &y)?;
                Predictions::Values(model.predict(x_test)?.to_vec())
            }
        };

        info!(
            model = self.spec.name(),
            train_rows = x_train.nrows(),
            test_rows = x_test.nrows(),
            n_features = x_train.ncols(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model trained"
        );
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use ndarray::array;
    use polars::prelude::*;

    fn target(frame: DataFrame) -> Target {
        Target::from_dataset(&Dataset::new(frame).unwrap(), "y").unwrap()
    }

    #[test]
    fn test_class_encoder_numeric_order() {
        let labels: Vec<String> = ["10", "2", "10", "1"].iter().map(|s| s.to_string()).collect();
        let encoder = ClassEncoder::fit(&labels, LabelOrder::Numeric);

        assert_eq!(encoder.classes(), &["1", "2", "10"]);
        assert_eq!(encoder.encode(&labels).unwrap(), array![2.0, 1.0, 2.0, 0.0]);
        assert_eq!(encoder.decode(&array![0.0, 2.0]).unwrap(), vec!["1", "10"]);
        assert!(encoder.decode(&array![3.0]).is_err());
    }

    #[test]
    fn test_classifier_predicts_labels() {
        let y = target(df!("y" => &["no", "no", "yes", "yes"]).unwrap());
        let x = array![[0.0], [1.0], [5.0], [6.0]];

        let engine = TrainEngine::new(ModelSpec::TreeClassifier { max_depth: None, seed: 42 });
        let predictions = engine.fit_predict(&x, &y, &array![[0.5], [5.5]]).unwrap();
        assert_eq!(
            predictions,
            Predictions::Labels(vec!["no".to_string(), "yes".to_string()])
        );
    }

    #[test]
    fn test_regressor_predicts_values() {
        let y = target(df!("y" => &[1.0, 2.0, 3.0]).unwrap());
        let x = array![[1.0], [2.0], [3.0]];

        let engine = TrainEngine::new(ModelSpec::LinearRegressor);
        match engine.fit_predict(&x, &y, &array![[4.0]]).unwrap() {
            Predictions::Values(v) => assert!((v[0] - 4.0).abs() < 1e-9),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_every_spec_fits() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0], [5.0, 0.0]];
        let classes = target(df!("y" => &[0i64, 0, 0, 1, 1, 1]).unwrap());
        let values = target(df!("y" => &[0.5, 1.0, 2.5, 3.0, 4.5, 5.0]).unwrap());

        let specs = [
            ModelSpec::LogisticClassifier { max_iter: 200 },
            ModelSpec::TreeClassifier { max_depth: Some(2), seed: 42 },
            ModelSpec::ForestClassifier { n_estimators: 10, max_depth: None, seed: 42 },
            ModelSpec::LinearRegressor,
            ModelSpec::TreeRegressor { max_depth: None, seed: 42 },
            ModelSpec::ForestRegressor { n_estimators: 10, max_depth: None, seed: 42 },
        ];
        for spec in specs {
            let y = match spec.task() {
                TaskType::Classification => &classes,
                TaskType::Regression => &values,
            };
            let predictions = TrainEngine::new(spec.clone()).fit_predict(&x, y, &x).unwrap();
            match predictions {
                Predictions::Labels(l) => assert_eq!(l.len(), 6),
                Predictions::Values(v) => assert_eq!(v.len(), 6),
            }
        }
    }

    #[test]
    fn test_regression_requires_numeric_values() {
        let y = target(df!("y" => &["a", "b"]).unwrap());
        let engine = TrainEngine::new(ModelSpec::LinearRegressor);
        let err = engine.fit_predict(&array![[1.0], [2.0]], &y, &array![[1.0]]).unwrap_err();
        assert!(matches!(err, PipelineError::NonNumericTarget(_)));
    }
}
