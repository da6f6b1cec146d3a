//! Random Forest implementation

use super::decision_tree::{argmax, Criterion, DecisionTree};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for features considered per split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// All features
    All,
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub criterion: Criterion,
    pub random_state: u64,
    n_classes: usize,
}

impl RandomForest {
    /// Create a new classifier forest
    pub fn new_classifier(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            criterion: Criterion::Gini,
            random_state: 42,
            n_classes: 0,
        }
    }

    /// Create a new regressor forest
    pub fn new_regressor(n_estimators: usize) -> Self {
        Self {
            max_features: MaxFeatures::All,
            criterion: Criterion::MSE,
            ..Self::new_classifier(n_estimators)
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn is_classification(&self) -> bool {
        self.criterion == Criterion::Gini
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest, growing trees in parallel
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(PipelineError::training(format!(
                "x has {} rows but y has {} values",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 || self.n_estimators == 0 {
            return Err(PipelineError::training("forest needs samples and at least one tree"));
        }

        let max_features = self.compute_max_features(x.ncols());
        if self.is_classification() {
            self.n_classes = y.iter().fold(0.0f64, |a, &b| a.max(b)) as usize + 1;
        }

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTree> {
                let seed = self.random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> = sample_indices.iter().map(|&i| y[i]).collect();

                let tree = if self.is_classification() {
                    DecisionTree::new_classifier().with_n_classes(self.n_classes)
                } else {
                    DecisionTree::new_regressor()
                };
                let mut tree = tree
                    .with_max_depth(self.max_depth)
                    .with_max_features(Some(max_features))
                    .with_random_state(rng.next_u64());
                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        Ok(self)
    }

    /// Mean prediction for regression, most probable class for classification
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.is_classification() {
            let proba = self.predict_proba(x)?;
            return Ok(proba
                .outer_iter()
                .map(|row| argmax(row.iter().copied()) as f64)
                .collect());
        }

        let all_predictions = self
            .fitted_trees()?
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut sum = Array1::zeros(x.nrows());
        for preds in &all_predictions {
            sum += preds;
        }
        Ok(sum / all_predictions.len() as f64)
    }

    /// Class probabilities averaged over trees
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_classification() {
            return Err(PipelineError::training("predict_proba requires a classifier"));
        }

        let all_proba = self
            .fitted_trees()?
            .par_iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<Result<Vec<_>>>()?;

        let mut sum = Array2::zeros((x.nrows(), self.n_classes));
        for proba in &all_proba {
            sum += proba;
        }
        Ok(sum / all_proba.len() as f64)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn fitted_trees(&self) -> Result<&[DecisionTree]> {
        if self.trees.is_empty() {
            return Err(PipelineError::training("random forest is not fitted"));
        }
        Ok(&self.trees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0, 1.0], [1.2, 0.8], [0.8, 1.1], [1.1, 1.2],
            [5.0, 5.0], [5.2, 4.8], [4.8, 5.1], [5.1, 5.2],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_classifier_separates_blobs() {
        let (x, y) = blobs();
        let mut rf = RandomForest::new_classifier(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        assert_eq!(rf.n_trees(), 10);
        assert_eq!(rf.predict(&array![[1.0, 0.9], [5.0, 5.1]]).unwrap(), array![0.0, 1.0]);

        let proba = rf.predict_proba(&x).unwrap();
        for row in proba.outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_regressor() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0];

        let mut rf = RandomForest::new_regressor(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert!((p - a).abs() < 4.0, "prediction {} too far from {}", p, a);
        }
    }

    #[test]
    fn test_fit_is_reproducible() {
        let (x, y) = blobs();
        let predict = || {
            let mut rf = RandomForest::new_classifier(12).with_random_state(42);
            rf.fit(&x, &y).unwrap();
            rf.predict_proba(&x).unwrap()
        };
        assert_eq!(predict(), predict());
    }

    #[test]
    fn test_max_features() {
        assert_eq!(RandomForest::new_classifier(1).compute_max_features(10), 3);
        assert_eq!(RandomForest::new_classifier(1).compute_max_features(1), 1);
        assert_eq!(RandomForest::new_regressor(1).compute_max_features(10), 10);
    }

    #[test]
    fn test_unfitted_forest() {
        let rf = RandomForest::new_regressor(3);
        assert!(rf.predict(&array![[1.0]]).is_err());
    }
}
