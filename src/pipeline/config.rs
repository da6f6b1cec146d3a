//! Pipeline configuration

use serde::{Deserialize, Serialize};

/// Tunables shared by every training request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seed for the split shuffle and every seeded estimator
    pub random_seed: u64,

    /// Numeric integer targets with more distinct values than this are
    /// treated as regression under `auto`
    pub regression_cardinality_threshold: usize,

    /// Exclusive upper bound on the test fraction
    pub max_split_ratio: f64,

    /// Floor on logistic regression iterations
    pub min_logistic_iterations: usize,

    /// Floor on the number of trees in a forest
    pub min_forest_estimators: usize,

    /// Reports with more labels than this are flagged `too_many_classes`
    pub too_many_classes_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            random_seed: 42,
            regression_cardinality_threshold: 20,
            max_split_ratio: 0.9,
            min_logistic_iterations: 200,
            min_forest_estimators: 10,
            too_many_classes_threshold: 40,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the random seed
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Builder method to set the auto-regression cardinality threshold
    pub fn with_regression_cardinality_threshold(mut self, threshold: usize) -> Self {
        self.regression_cardinality_threshold = threshold;
        self
    }

    /// Builder method to set the split ratio bound
    pub fn with_max_split_ratio(mut self, ratio: f64) -> Self {
        self.max_split_ratio = ratio;
        self
    }

    /// Builder method to set the minimum logistic iterations
    pub fn with_min_logistic_iterations(mut self, iterations: usize) -> Self {
        self.min_logistic_iterations = iterations;
        self
    }

    /// Builder method to set the minimum forest size
    pub fn with_min_forest_estimators(mut self, n: usize) -> Self {
        self.min_forest_estimators = n;
        self
    }

    /// Builder method to set the label count flagged in reports
    pub fn with_too_many_classes_threshold(mut self, threshold: usize) -> Self {
        self.too_many_classes_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.regression_cardinality_threshold, 20);
        assert_eq!(config.max_split_ratio, 0.9);
        assert_eq!(config.min_logistic_iterations, 200);
        assert_eq!(config.min_forest_estimators, 10);
        assert_eq!(config.too_many_classes_threshold, 40);
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::new()
            .with_random_seed(7)
            .with_min_forest_estimators(3);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.min_forest_estimators, 3);
        assert_eq!(config.max_split_ratio, 0.9);
    }
}
