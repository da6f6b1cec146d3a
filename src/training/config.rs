//! Model family selection and estimator hyperparameters

use crate::error::PipelineError;
use crate::pipeline::PipelineConfig;
use crate::task::TaskType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Family of model requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Logistic regression for classification, least squares for regression
    Linear,
    DecisionTree,
    RandomForest,
}

impl FromStr for ModelFamily {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "logistic" | "logistic_regression" | "linear" | "linear_regression" => {
                Ok(ModelFamily::Linear)
            }
            "decision_tree" | "tree" => Ok(ModelFamily::DecisionTree),
            "random_forest" | "randomforest" | "forest" => Ok(ModelFamily::RandomForest),
            _ => Err(PipelineError::UnknownModelType(s.to_string())),
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFamily::Linear => write!(f, "linear"),
            ModelFamily::DecisionTree => write!(f, "decision_tree"),
            ModelFamily::RandomForest => write!(f, "random_forest"),
        }
    }
}

/// A fully parameterized estimator, one per (task, family) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelSpec {
    LogisticClassifier { max_iter: usize },
    TreeClassifier { max_depth: Option<usize>, seed: u64 },
    ForestClassifier { n_estimators: usize, max_depth: Option<usize>, seed: u64 },
    LinearRegressor,
    TreeRegressor { max_depth: Option<usize>, seed: u64 },
    ForestRegressor { n_estimators: usize, max_depth: Option<usize>, seed: u64 },
}

impl ModelSpec {
    /// Map a task and family to concrete hyperparameters.
    ///
    /// Forests ignore `max_depth` and grow full trees.
    pub fn select(
        task: TaskType,
        family: ModelFamily,
        max_depth: Option<usize>,
        epochs: i64,
        config: &PipelineConfig,
    ) -> Self {
        let epochs = usize::try_from(epochs).unwrap_or(0);
        let seed = config.random_seed;
        let n_estimators = epochs.max(config.min_forest_estimators);

        match (task, family) {
            (TaskType::Classification, ModelFamily::Linear) => ModelSpec::LogisticClassifier {
                max_iter: epochs.max(config.min_logistic_iterations),
            },
            (TaskType::Classification, ModelFamily::DecisionTree) => {
                ModelSpec::TreeClassifier { max_depth, seed }
            }
            (TaskType::Classification, ModelFamily::RandomForest) => ModelSpec::ForestClassifier {
                n_estimators,
                max_depth: None,
                seed,
            },
            (TaskType::Regression, ModelFamily::Linear) => ModelSpec::LinearRegressor,
            (TaskType::Regression, ModelFamily::DecisionTree) => {
                ModelSpec::TreeRegressor { max_depth, seed }
            }
            (TaskType::Regression, ModelFamily::RandomForest) => ModelSpec::ForestRegressor {
                n_estimators,
                max_depth: None,
                seed,
            },
        }
    }

    pub fn task(&self) -> TaskType {
        match self {
            ModelSpec::LogisticClassifier { .. }
            | ModelSpec::TreeClassifier { .. }
            | ModelSpec::ForestClassifier { .. } => TaskType::Classification,
            ModelSpec::LinearRegressor
            | ModelSpec::TreeRegressor { .. }
            | ModelSpec::ForestRegressor { .. } => TaskType::Regression,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelSpec::LogisticClassifier { .. } => "LogisticRegression",
            ModelSpec::TreeClassifier { .. } => "DecisionTreeClassifier",
            ModelSpec::ForestClassifier { .. } => "RandomForestClassifier",
            ModelSpec::LinearRegressor => "LinearRegression",
            ModelSpec::TreeRegressor { .. } => "DecisionTreeRegressor",
            ModelSpec::ForestRegressor { .. } => "RandomForestRegressor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(task: TaskType, family: ModelFamily, epochs: i64) -> ModelSpec {
        ModelSpec::select(task, family, Some(4), epochs, &PipelineConfig::default())
    }

    #[test]
    fn test_family_aliases() {
        assert_eq!("Tree".parse::<ModelFamily>().unwrap(), ModelFamily::DecisionTree);
        assert_eq!("randomforest".parse::<ModelFamily>().unwrap(), ModelFamily::RandomForest);
        assert_eq!("forest".parse::<ModelFamily>().unwrap(), ModelFamily::RandomForest);
        assert_eq!("logistic".parse::<ModelFamily>().unwrap(), ModelFamily::Linear);
        assert!(matches!(
            "svm".parse::<ModelFamily>(),
            Err(PipelineError::UnknownModelType(m)) if m == "svm"
        ));
    }

    #[test]
    fn test_iteration_and_tree_floors() {
        assert_eq!(
            select(TaskType::Classification, ModelFamily::Linear, 50),
            ModelSpec::LogisticClassifier { max_iter: 200 }
        );
        assert_eq!(
            select(TaskType::Classification, ModelFamily::Linear, 500),
            ModelSpec::LogisticClassifier { max_iter: 500 }
        );
        assert_eq!(
            select(TaskType::Regression, ModelFamily::RandomForest, 3),
            ModelSpec::ForestRegressor { n_estimators: 10, max_depth: None, seed: 42 }
        );
        assert_eq!(
            select(TaskType::Classification, ModelFamily::RandomForest, -5),
            ModelSpec::ForestClassifier { n_estimators: 10, max_depth: None, seed: 42 }
        );
    }

    #[test]
    fn test_linear_regression_has_no_hyperparameters() {
        let spec = select(TaskType::Regression, ModelFamily::Linear, 100);
        assert_eq!(spec, ModelSpec::LinearRegressor);
        assert_eq!(spec.task(), TaskType::Regression);
    }

    #[test]
    fn test_tree_keeps_depth() {
        assert_eq!(
            select(TaskType::Regression, ModelFamily::DecisionTree, 100),
            ModelSpec::TreeRegressor { max_depth: Some(4), seed: 42 }
        );
    }
}
