//! pipeline-builder - no-code training for tabular data
//!
//! Upload a table, pick a target and some feature columns, and get back
//! held-out metrics for a logistic/linear model, a decision tree or a
//! random forest.
//!
//! # Modules
//!
//! - [`dataset`] - Ingestion, gap filling, per-session storage, column stats
//! - [`request`] - Raw training requests and their validation
//! - [`task`] - Classification vs. regression resolution
//! - [`preprocessing`] - Train/test split, scaling, one-hot encoding
//! - [`training`] - Estimators and the training engine
//! - [`metrics`] - Evaluation metrics and the training report
//! - [`pipeline`] - The end-to-end training pipeline
//! - [`server`] - HTTP API
//! - [`cli`] - Command-line interface

pub mod error;

pub mod dataset;
pub mod request;
pub mod task;

pub mod preprocessing;
pub mod training;
pub mod metrics;
pub mod pipeline;

pub mod server;
pub mod cli;

pub use error::{ErrorKind, PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ErrorKind, PipelineError, Result};

    pub use crate::dataset::{ColumnStats, Dataset, DatasetStore, SessionId, Target};
    pub use crate::request::{TrainingRequest, ValidatedRequest};
    pub use crate::task::{TaskSelection, TaskType};

    pub use crate::preprocessing::{PreprocessingPlan, Scaler, ScalerType, SplitStrategy};
    pub use crate::training::{ModelFamily, ModelSpec, TrainEngine};

    pub use crate::metrics::{ClassificationMetrics, MetricsReport, RegressionMetrics, TaskMetrics};
    pub use crate::pipeline::{PipelineConfig, TrainingPipeline};
}
