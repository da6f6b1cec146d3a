//! Application state shared across handlers

use crate::dataset::DatasetStore;
use crate::pipeline::{PipelineConfig, TrainingPipeline};

use super::urls::UrlChecker;
use super::ServerConfig;

pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: TrainingPipeline,
    pub store: DatasetStore,
    pub urls: UrlChecker,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_pipeline(config, PipelineConfig::default())
    }

    pub fn with_pipeline(config: ServerConfig, pipeline: PipelineConfig) -> Self {
        Self {
            config,
            pipeline: TrainingPipeline::new(pipeline),
            store: DatasetStore::new(),
            urls: UrlChecker::new(),
        }
    }
}
