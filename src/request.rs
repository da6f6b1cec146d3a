//! Training request parsing and validation
//!
//! A [`TrainingRequest`] carries the form fields exactly as the client sent
//! them. [`TrainingRequest::validate`] checks them against a dataset and
//! produces a typed [`ValidatedRequest`]; it has no side effects.

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::pipeline::PipelineConfig;
use crate::preprocessing::PreprocessingPlan;
use crate::task::TaskSelection;
use crate::training::ModelFamily;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

fn default_split_ratio() -> String {
    "0.2".to_string()
}

fn default_list() -> String {
    "[]".to_string()
}

fn default_epochs() -> String {
    "100".to_string()
}

fn default_task_type() -> String {
    "auto".to_string()
}

/// Raw, string-typed training request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub target: String,
    /// JSON list of feature column names
    pub features: String,
    pub model_type: String,
    #[serde(default = "default_split_ratio")]
    pub split_ratio: String,
    #[serde(default = "default_list")]
    pub preprocess_standardize: String,
    #[serde(default = "default_list")]
    pub preprocess_normalize: String,
    #[serde(default)]
    pub max_depth: Option<String>,
    #[serde(default = "default_epochs")]
    pub epochs: String,
    #[serde(default = "default_task_type")]
    pub task_type: String,
    #[serde(default = "default_list")]
    pub allowed_target_values: String,
}

impl TrainingRequest {
    pub fn new(
        target: impl Into<String>,
        features: impl Into<String>,
        model_type: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            features: features.into(),
            model_type: model_type.into(),
            split_ratio: default_split_ratio(),
            preprocess_standardize: default_list(),
            preprocess_normalize: default_list(),
            max_depth: None,
            epochs: default_epochs(),
            task_type: default_task_type(),
            allowed_target_values: default_list(),
        }
    }

    /// Build a request from submitted form fields, applying defaults
    pub fn from_fields(mut fields: HashMap<String, String>) -> Result<Self> {
        let mut take = |name: &str| fields.remove(name);
        let required = |name: &str, value: Option<String>| {
            value.ok_or_else(|| PipelineError::MissingField(name.to_string()))
        };

        let target = required("target", take("target"))?;
        let features = required("features", take("features"))?;
        let model_type = required("model_type", take("model_type"))?;

        Ok(Self {
            target,
            features,
            model_type,
            split_ratio: take("split_ratio").unwrap_or_else(default_split_ratio),
            preprocess_standardize: take("preprocess_standardize").unwrap_or_else(default_list),
            preprocess_normalize: take("preprocess_normalize").unwrap_or_else(default_list),
            max_depth: take("max_depth"),
            epochs: take("epochs").unwrap_or_else(default_epochs),
            task_type: take("task_type").unwrap_or_else(default_task_type),
            allowed_target_values: take("allowed_target_values").unwrap_or_else(default_list),
        })
    }

    /// Builder method to set features from a list of names
    pub fn with_features<S: AsRef<str>>(mut self, features: &[S]) -> Self {
        self.features = json_list(features);
        self
    }

    pub fn with_split_ratio(mut self, ratio: impl ToString) -> Self {
        self.split_ratio = ratio.to_string();
        self
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    pub fn with_standardize<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.preprocess_standardize = json_list(columns);
        self
    }

    pub fn with_normalize<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.preprocess_normalize = json_list(columns);
        self
    }

    pub fn with_max_depth(mut self, depth: impl ToString) -> Self {
        self.max_depth = Some(depth.to_string());
        self
    }

    pub fn with_epochs(mut self, epochs: impl ToString) -> Self {
        self.epochs = epochs.to_string();
        self
    }

    /// Builder method to set the allow-list from a raw JSON payload
    pub fn with_allowed_target_values(mut self, payload: impl Into<String>) -> Self {
        self.allowed_target_values = payload.into();
        self
    }

    /// Check every field against `dataset`.
    ///
    /// Failures are reported in a fixed order: features, target, missing
    /// features, split ratio, model type, task type, epochs, max depth, then
    /// the preprocessing lists.
    pub fn validate(&self, dataset: &Dataset, config: &PipelineConfig) -> Result<ValidatedRequest> {
        let features = parse_column_list("features", &self.features)?;
        if features.is_empty() {
            return Err(PipelineError::EmptyFeatureList);
        }
        let mut seen = HashSet::new();
        let duplicates: Vec<String> = features
            .iter()
            .filter(|f| !seen.insert(f.as_str()))
            .cloned()
            .collect();
        if !duplicates.is_empty() {
            return Err(PipelineError::DuplicateFeatures(duplicates));
        }

        if !dataset.has_column(&self.target) {
            return Err(PipelineError::TargetNotFound(self.target.clone()));
        }

        let missing: Vec<String> = features
            .iter()
            .filter(|f| !dataset.has_column(f))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::FeaturesNotFound(missing));
        }

        let split_ratio = parse_split_ratio(&self.split_ratio, config.max_split_ratio)?;
        let model_family: ModelFamily = self.model_type.parse()?;
        let task: TaskSelection = self.task_type.parse()?;

        let epochs = self
            .epochs
            .trim()
            .parse::<i64>()
            .map_err(|e| PipelineError::InvalidNumber {
                field: "epochs".to_string(),
                value: self.epochs.clone(),
                reason: format!("Provide an integer ({}).", e),
            })?;
        let max_depth = parse_max_depth(self.max_depth.as_deref())?;

        let standardize = parse_column_list("preprocess_standardize", &self.preprocess_standardize)?;
        let normalize = parse_column_list("preprocess_normalize", &self.preprocess_normalize)?;
        if let Some(foreign) = standardize
            .iter()
            .chain(normalize.iter())
            .find(|c| !features.contains(c))
        {
            return Err(PipelineError::PreprocessColumnNotInFeatures(foreign.clone()));
        }
        let overlap: Vec<String> = standardize
            .iter()
            .filter(|c| normalize.contains(c))
            .cloned()
            .collect();
        if !overlap.is_empty() {
            return Err(PipelineError::OverlappingPreprocessing(overlap));
        }

        Ok(ValidatedRequest {
            target: self.target.clone(),
            features,
            model_family,
            model_type: self.model_type.clone(),
            task,
            split_ratio,
            max_depth,
            epochs,
            preprocessing: PreprocessingPlan { standardize, normalize },
            allowed_target_values: parse_allowed_values(&self.allowed_target_values),
        })
    }
}

/// A request whose every field has been checked against the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub target: String,
    pub features: Vec<String>,
    pub model_family: ModelFamily,
    /// Model type as the client spelled it
    pub model_type: String,
    pub task: TaskSelection,
    pub split_ratio: f64,
    pub max_depth: Option<usize>,
    pub epochs: i64,
    pub preprocessing: PreprocessingPlan,
    /// Target values to keep; `None` keeps every row
    pub allowed_target_values: Option<Vec<String>>,
}

fn json_list<S: AsRef<str>>(items: &[S]) -> String {
    let items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    serde_json::Value::from(items).to_string()
}

fn parse_column_list(field: &str, raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| PipelineError::MalformedList {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

fn parse_split_ratio(raw: &str, max: f64) -> Result<f64> {
    let invalid = || PipelineError::InvalidSplitRatio(raw.to_string(), max);
    let ratio = raw.trim().parse::<f64>().map_err(|_| invalid())?;
    if ratio.is_nan() || ratio <= 0.0 || ratio >= max {
        return Err(invalid());
    }
    Ok(ratio)
}

fn parse_max_depth(raw: Option<&str>) -> Result<Option<usize>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    let invalid = |reason: String| PipelineError::InvalidNumber {
        field: "max_depth".to_string(),
        value: raw.to_string(),
        reason,
    };

    let depth = raw
        .parse::<i64>()
        .map_err(|e| invalid(format!("Provide a positive integer ({}).", e)))?;
    if depth < 1 {
        return Err(invalid("Provide a positive integer.".to_string()));
    }
    usize::try_from(depth)
        .map(Some)
        .map_err(|e| invalid(e.to_string()))
}

/// Parse the target allow-list.
///
/// Any malformed payload disables filtering rather than failing the request.
fn parse_allowed_values(raw: &str) -> Option<Vec<String>> {
    if raw.trim().is_empty() {
        return None;
    }
    let values = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(values)) => values,
        Ok(other) => {
            warn!(payload = %raw, kind = %json_kind(&other), "Ignoring allowed_target_values: not a list");
            return None;
        }
        Err(e) => {
            warn!(payload = %raw, error = %e, "Ignoring unparseable allowed_target_values");
            return None;
        }
    };

    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(label_text).collect())
}

/// Render a JSON scalar the way target labels are rendered
fn label_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(true) => "True".to_string(),
        serde_json::Value::Bool(false) => "False".to_string(),
        serde_json::Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
