//! End-to-end training request pipeline
//!
//! validate → resolve task → split → scale → encode → fit → score.
//! Every stage works on the dataset snapshot it was handed and nothing is
//! kept once the report is built.

mod config;

pub use config::PipelineConfig;

use crate::dataset::{Dataset, Target};
use crate::error::{PipelineError, Result};
use crate::metrics::{ClassificationMetrics, MetricsReport, RegressionMetrics, TaskMetrics};
use crate::preprocessing::{encode_partitions, take_rows, train_test_split};
use crate::request::TrainingRequest;
use crate::task::resolve_task;
use crate::training::{ModelSpec, Predictions, TrainEngine};
use tracing::{debug, info};

/// Runs training requests against uploaded datasets
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Train one model as described by `request` and score it on held-out rows
    pub fn run(&self, dataset: &Dataset, request: &TrainingRequest) -> Result<MetricsReport> {
        let config = &self.config;
        let validated = request.validate(dataset, config)?;

        let mut target = Target::from_dataset(dataset, &validated.target)?;
        let mut features = dataset.frame().select(validated.features.iter().map(String::as_str))?;

        if let Some(allowed) = &validated.allowed_target_values {
            let (filtered, rows) = target.filter_allowed(allowed);
            info!(
                target = %validated.target,
                allowed = allowed.len(),
                rows_before = target.len(),
                rows_after = rows.len(),
                "Filtered rows by allowed target values"
            );
            features = take_rows(&features, &rows)?;
            target = filtered;
        }

        let task = resolve_task(validated.task, &target, config)?;

        let split = train_test_split(target.labels(), validated.split_ratio, config.random_seed)?;
        debug!(
            strategy = ?split.strategy,
            train = split.train.len(),
            test = split.test.len(),
            "Split rows"
        );

        let y_train = target.subset(&split.train);
        let y_test = target.subset(&split.test);
        let (train, test) = validated.preprocessing.apply(
            &take_rows(&features, &split.train)?,
            &take_rows(&features, &split.test)?,
        )?;
        let encoded = encode_partitions(&train, &test)?;
        debug!(columns = encoded.columns.len(), "Encoded features");

        let spec = ModelSpec::select(
            task,
            validated.model_family,
            validated.max_depth,
            validated.epochs,
            config,
        );
        let predictions = TrainEngine::new(spec).fit_predict(&encoded.x_train, &y_train, &encoded.x_test)?;

        let metrics = match predictions {
            Predictions::Labels(predicted) => TaskMetrics::Classification(ClassificationMetrics::compute(
                y_test.labels(),
                &predicted,
                y_test.label_order(),
                config.too_many_classes_threshold,
            )?),
            Predictions::Values(predicted) => {
                let truth = y_test
                    .values()
                    .ok_or_else(|| PipelineError::NonNumericTarget(y_test.name().to_string()))?;
                TaskMetrics::Regression(RegressionMetrics::compute(truth, &predicted)?)
            }
        };

        Ok(MetricsReport {
            metrics,
            train_size: split.train.len(),
            test_size: split.test.len(),
            split_ratio: validated.split_ratio,
            preprocessing: validated.preprocessing,
            details: format!("Trained {}", validated.model_type),
        })
    }
}
