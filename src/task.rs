//! Classification vs. regression

use crate::dataset::Target;
use crate::error::{PipelineError, Result};
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Task requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSelection {
    #[default]
    Auto,
    Classification,
    Regression,
}

impl FromStr for TaskSelection {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(TaskSelection::Auto),
            "classification" => Ok(TaskSelection::Classification),
            "regression" => Ok(TaskSelection::Regression),
            _ => Err(PipelineError::UnknownTaskType(s.to_string())),
        }
    }
}

/// Task actually trained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Classification,
    Regression,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Classification => write!(f, "classification"),
            TaskType::Regression => write!(f, "regression"),
        }
    }
}

/// Settle the task for `target` and check the target can support it.
///
/// Under `auto`, a numeric target is regression when it is floating point or
/// has more distinct values than the configured threshold.
pub fn resolve_task(
    selection: TaskSelection,
    target: &Target,
    config: &PipelineConfig,
) -> Result<TaskType> {
    let distinct = target.distinct_count();

    let task = match selection {
        TaskSelection::Classification => TaskType::Classification,
        TaskSelection::Regression => TaskType::Regression,
        TaskSelection::Auto => {
            let continuous = target.is_float()
                || distinct > config.regression_cardinality_threshold;
            let task = if target.is_numeric() && continuous {
                TaskType::Regression
            } else {
                TaskType::Classification
            };
            info!(target = %target.name(), distinct, task = %task, "Auto-detected task type");
            task
        }
    };

    match task {
        TaskType::Classification if distinct < 2 => Err(PipelineError::InsufficientClasses(distinct)),
        TaskType::Regression if !target.is_numeric() => {
            Err(PipelineError::NonNumericTarget(target.name().to_string()))
        }
        _ => Ok(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use polars::prelude::*;

    fn target(frame: DataFrame, name: &str) -> Target {
        Target::from_dataset(&Dataset::new(frame).unwrap(), name).unwrap()
    }

    fn auto(t: &Target) -> Result<TaskType> {
        resolve_task(TaskSelection::Auto, t, &PipelineConfig::default())
    }

    #[test]
    fn test_auto_many_integers_is_regression() {
        let values: Vec<i64> = (0..21).collect();
        let t = target(df!("y" => values).unwrap(), "y");
        assert_eq!(auto(&t).unwrap(), TaskType::Regression);
    }

    #[test]
    fn test_auto_twenty_integers_is_classification() {
        let values: Vec<i64> = (0..20).collect();
        let t = target(df!("y" => values).unwrap(), "y");
        assert_eq!(auto(&t).unwrap(), TaskType::Classification);
    }

    #[test]
    fn test_auto_few_integers_is_classification() {
        let t = target(df!("y" => &[0i64, 1, 2, 1, 0]).unwrap(), "y");
        assert_eq!(auto(&t).unwrap(), TaskType::Classification);
    }

    #[test]
    fn test_auto_float_is_regression() {
        let t = target(df!("y" => &[0.0, 1.0, 0.0]).unwrap(), "y");
        assert_eq!(auto(&t).unwrap(), TaskType::Regression);
    }

    #[test]
    fn test_auto_text_is_classification() {
        let labels: Vec<String> = (0..30).map(|i| format!("c{}", i)).collect();
        let t = target(df!("y" => labels).unwrap(), "y");
        assert_eq!(auto(&t).unwrap(), TaskType::Classification);
    }

    #[test]
    fn test_classification_needs_two_classes() {
        let t = target(df!("y" => &["a", "a", "a"]).unwrap(), "y");
        let err = resolve_task(TaskSelection::Classification, &t, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientClasses(1)));
    }

    #[test]
    fn test_regression_needs_numeric_target() {
        let t = target(df!("y" => &["a", "b"]).unwrap(), "y");
        let err = resolve_task(TaskSelection::Regression, &t, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::NonNumericTarget(_)));
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(" Regression ".parse::<TaskSelection>().unwrap(), TaskSelection::Regression);
        assert!("clustering".parse::<TaskSelection>().is_err());
    }
}
