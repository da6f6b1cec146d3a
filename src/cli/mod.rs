//! Command-line interface
//!
//! `serve` runs the HTTP API (the default), `train` runs a single training
//! request against a local file and prints the report as JSON.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::dataset::Dataset;
use crate::pipeline::TrainingPipeline;
use crate::request::TrainingRequest;
use crate::server::{run_server, ServerConfig};

#[derive(Parser)]
#[command(name = "pipeline-builder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and score tabular models without writing code")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        /// Bind address
        #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "API_PORT", default_value = "8000")]
        port: u16,
    },

    /// Train one model on a local file and print its metrics
    Train(TrainArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct TrainArgs {
    /// Input data file (CSV, JSON, or Parquet)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Target column name
    #[arg(short, long)]
    pub target: String,

    /// Feature columns, comma separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub features: Vec<String>,

    /// Model family (logistic, linear, decision_tree, random_forest)
    #[arg(short, long, default_value = "random_forest")]
    pub model: String,

    /// Task type (auto, classification, regression)
    #[arg(long, default_value = "auto")]
    pub task: String,

    /// Fraction of rows held out for testing
    #[arg(long, default_value = "0.2")]
    pub split_ratio: String,

    /// Columns to standardize, comma separated
    #[arg(long, value_delimiter = ',')]
    pub standardize: Vec<String>,

    /// Columns to min-max normalize, comma separated
    #[arg(long, value_delimiter = ',')]
    pub normalize: Vec<String>,

    /// Maximum tree depth
    #[arg(long)]
    pub max_depth: Option<String>,

    /// Iteration budget for logistic regression, tree count for forests
    #[arg(long, default_value = "100")]
    pub epochs: String,

    /// Keep only rows whose target is one of these values, comma separated
    #[arg(long, value_delimiter = ',')]
    pub allow: Vec<String>,
}

impl TrainArgs {
    pub fn to_request(&self) -> TrainingRequest {
        let mut request = TrainingRequest::new(self.target.clone(), "[]", self.model.clone())
            .with_features(&self.features)
            .with_task_type(self.task.clone())
            .with_split_ratio(&self.split_ratio)
            .with_standardize(&self.standardize)
            .with_normalize(&self.normalize)
            .with_epochs(&self.epochs);
        if let Some(depth) = &self.max_depth {
            request = request.with_max_depth(depth);
        }
        if !self.allow.is_empty() {
            let allowed = serde_json::Value::from(self.allow.clone());
            request = request.with_allowed_target_values(allowed.to_string());
        }
        request
    }
}

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    let start = Instant::now();
    let dataset = load_data(&args.data)?;
    info!(
        path = %args.data.display(),
        rows = dataset.n_rows(),
        columns = dataset.n_columns(),
        "Loaded dataset"
    );

    let report = TrainingPipeline::default().run(&dataset, &args.to_request())?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Training finished");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn cmd_serve(host: &str, port: u16) -> anyhow::Result<()> {
    let config = ServerConfig::default().with_host(host).with_port(port);
    run_server(config).await
}

fn load_data(path: &Path) -> anyhow::Result<Dataset> {
    Ok(Dataset::from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_args_build_request() {
        let cli = Cli::parse_from([
            "pipeline-builder",
            "train",
            "--data",
            "data.csv",
            "--target",
            "bought",
            "--features",
            "age,income",
            "--model",
            "logistic",
            "--standardize",
            "income",
            "--max-depth",
            "4",
            "--allow",
            "0,1",
        ]);

        let Some(Commands::Train(args)) = cli.command else {
            panic!("expected train subcommand");
        };
        let request = args.to_request();
        assert_eq!(request.target, "bought");
        assert_eq!(request.features, r#"["age","income"]"#);
        assert_eq!(request.preprocess_standardize, r#"["income"]"#);
        assert_eq!(request.preprocess_normalize, "[]");
        assert_eq!(request.max_depth.as_deref(), Some("4"));
        assert_eq!(request.allowed_target_values, r#"["0","1"]"#);
        assert_eq!(request.task_type, "auto");
    }

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::parse_from(["pipeline-builder"]);
        assert!(cli.command.is_none());
    }
}
