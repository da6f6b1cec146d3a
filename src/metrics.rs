//! Evaluation metrics and the training report

use crate::dataset::LabelOrder;
use crate::error::{PipelineError, Result};
use crate::preprocessing::PreprocessingPlan;
use serde::Serialize;
use std::collections::HashMap;

/// Metrics for a classification run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    /// Support-weighted, zero when a class is never predicted
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Rows are true labels, columns predicted labels, both in `labels` order
    pub confusion_matrix: Vec<Vec<u64>>,
    pub labels: Vec<String>,
    pub too_many_classes: bool,
}

impl ClassificationMetrics {
    pub fn compute(
        y_true: &[String],
        y_pred: &[String],
        order: LabelOrder,
        too_many_classes_threshold: usize,
    ) -> Result<Self> {
        check_lengths(y_true.len(), y_pred.len())?;

        let mut labels: Vec<String> = y_true.iter().chain(y_pred).cloned().collect();
        order.sort(&mut labels);
        let index: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let k = labels.len();
        let mut confusion_matrix = vec![vec![0u64; k]; k];
        for (t, p) in y_true.iter().zip(y_pred) {
            confusion_matrix[index[t.as_str()]][index[p.as_str()]] += 1;
        }

        let n = y_true.len() as f64;
        let correct: u64 = (0..k).map(|i| confusion_matrix[i][i]).sum();

        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut f1 = 0.0;
        for i in 0..k {
            let tp = confusion_matrix[i][i] as f64;
            let support: u64 = confusion_matrix[i].iter().sum();
            let predicted: u64 = confusion_matrix.iter().map(|row| row[i]).sum();

            let p = ratio(tp, predicted as f64);
            let r = ratio(tp, support as f64);
            let f = ratio(2.0 * p * r, p + r);

            let weight = support as f64 / n;
            precision += weight * p;
            recall += weight * r;
            f1 += weight * f;
        }

        Ok(Self {
            accuracy: correct as f64 / n,
            precision,
            recall,
            f1,
            too_many_classes: k > too_many_classes_threshold,
            confusion_matrix,
            labels,
        })
    }
}

/// Metrics for a regression run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        check_lengths(y_true.len(), y_pred.len())?;

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true.iter().zip(y_pred).map(|(t, p)| t - p).collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            mse,
            mae,
            rmse: mse.sqrt(),
            r2,
        })
    }
}

/// Task-specific metrics, tagged with the task type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task_type", rename_all = "lowercase")]
pub enum TaskMetrics {
    Classification(ClassificationMetrics),
    Regression(RegressionMetrics),
}

/// Everything returned for a training request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    pub metrics: TaskMetrics,
    pub train_size: usize,
    pub test_size: usize,
    pub split_ratio: f64,
    pub preprocessing: PreprocessingPlan,
    pub details: String,
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

fn check_lengths(truth: usize, predicted: usize) -> Result<()> {
    if truth != predicted || truth == 0 {
        return Err(PipelineError::training(format!(
            "cannot score {} predictions against {} true values",
            predicted, truth
        )));
    }
    Ok(())
}
