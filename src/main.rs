//! pipeline-builder entry point

use clap::Parser;
use pipeline_builder::cli::{cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipeline_builder=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Train(args)) => {
            tokio::task::spawn_blocking(move || cmd_train(&args)).await??;
        }
        Some(Commands::Serve { host, port }) => {
            cmd_serve(&host, port).await?;
        }
        None => {
            let config = pipeline_builder::server::ServerConfig::default();
            cmd_serve(&config.host, config.port).await?;
        }
    }

    Ok(())
}
