//! Error types for the training pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Coarse classification of a pipeline failure.
///
/// Input and split errors are the caller's to fix; training errors are ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Input,
    Split,
    Training,
}

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No dataset uploaded. Please POST /api/upload first.")]
    NoDataset,

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Could not parse uploaded file: {0}")]
    Ingest(String),

    #[error("Invalid {field} payload; must be a JSON list of column names. Error: {reason}")]
    MalformedList { field: String, reason: String },

    #[error("Feature list is empty")]
    EmptyFeatureList,

    #[error("Duplicate feature columns: {0:?}")]
    DuplicateFeatures(Vec<String>),

    #[error("Target column '{0}' not found in dataset")]
    TargetNotFound(String),

    #[error("Feature columns not found: {0:?}")]
    FeaturesNotFound(Vec<String>),

    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    #[error("Invalid split_ratio value: {0}. Provide a decimal greater than 0 and below {1}.")]
    InvalidSplitRatio(String, f64),

    #[error("Invalid {field} value: {value}. {reason}")]
    InvalidNumber {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown model_type '{0}'. Choose 'logistic', 'decision_tree', or 'random_forest'.")]
    UnknownModelType(String),

    #[error("Unknown task_type '{0}'. Choose 'auto', 'classification', or 'regression'.")]
    UnknownTaskType(String),

    #[error("Preprocessing column '{0}' is not in selected features")]
    PreprocessColumnNotInFeatures(String),

    #[error("Columns selected for both standardization and normalization: {0:?}. Choose one per column.")]
    OverlappingPreprocessing(Vec<String>),

    #[error("One-hot encoding produces column names that already exist: {0:?}. Rename the conflicting columns.")]
    EncodedColumnCollision(Vec<String>),

    #[error("Classification: target must have at least 2 distinct classes, found {0}.")]
    InsufficientClasses(usize),

    #[error("Regression: target column '{0}' must be numeric.")]
    NonNumericTarget(String),

    #[error("{operation} failed for column '{column}': {reason}")]
    Scaling {
        operation: String,
        column: String,
        reason: String,
    },

    #[error("Not enough data after train/test split (train={train}, test={test}). Provide more rows or adjust split ratio.")]
    EmptyPartition { train: usize, test: usize },

    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Data error: {0}")]
    Data(String),
}

impl PipelineError {
    /// Which side of the boundary this failure belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::EmptyPartition { .. } => ErrorKind::Split,
            PipelineError::TrainingFailed(_) | PipelineError::Data(_) => ErrorKind::Training,
            _ => ErrorKind::Input,
        }
    }

    /// True for failures the caller can correct by changing the request
    pub fn is_client_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Training)
    }

    pub(crate) fn training(err: impl std::fmt::Display) -> Self {
        PipelineError::TrainingFailed(err.to_string())
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Data(format!("serialization error: {}", err))
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::Data(format!("invalid matrix shape: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::FeaturesNotFound(vec!["age".to_string(), "zip".to_string()]);
        assert_eq!(err.to_string(), "Feature columns not found: [\"age\", \"zip\"]");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(PipelineError::NoDataset.kind(), ErrorKind::Input);
        assert_eq!(
            PipelineError::EmptyPartition { train: 0, test: 1 }.kind(),
            ErrorKind::Split
        );
        assert_eq!(
            PipelineError::TrainingFailed("singular".into()).kind(),
            ErrorKind::Training
        );
        assert!(PipelineError::EmptyPartition { train: 0, test: 1 }.is_client_error());
        assert!(!PipelineError::Data("boom".into()).is_client_error());
    }

    #[test]
    fn test_training_error_keeps_cause() {
        let err = PipelineError::training("matrix is singular");
        assert_eq!(err.to_string(), "Training failed: matrix is singular");
    }
}
