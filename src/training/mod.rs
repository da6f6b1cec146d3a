//! Model training module
//!
//! Provides the estimators a training request can select:
//! - Logistic regression (multinomial) and ordinary least squares
//! - CART decision trees for classification and regression
//! - Random forests of bootstrapped trees

mod config;
mod engine;
pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;

pub use config::{ModelFamily, ModelSpec};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use engine::{ClassEncoder, Predictions, TrainEngine, TrainedModel};
pub use linear_models::{LinearRegression, LogisticRegression};
pub use random_forest::{MaxFeatures, RandomForest};
