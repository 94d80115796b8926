//! Sprout worker entry point.

use sprout_worker::{http, WorkerConfig, WorkerService};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("sprout_worker=info".parse()?)
                .add_directive("sprout_machines=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Sprout worker");

    let config = WorkerConfig::from_env();
    tracing::info!(?config, "Configuration loaded");

    config.validate()?;

    let service = WorkerService::new(&config)?;

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Received shutdown signal");
    };

    http::serve(service, config.http_addr, shutdown).await?;

    tracing::info!("Worker shutdown complete");
    Ok(())
}
