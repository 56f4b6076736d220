//! HTTP entry point for gitlink.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gitlink::{router, AppState, Config, GitHubSource};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse before tracing so --help works without logs
    let config = Config::parse();

    // RUST_LOG wins over -v/-q
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?config, "Configuration parsed");

    if config.github_token.is_none() {
        warn!("No GitHub token configured, anonymous rate limits apply");
    }

    let source = GitHubSource::new(config.github_config())
        .context("Failed to create GitHub client")?;
    let state = AppState::new(Arc::new(source), config.max_concurrency);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!(address = %config.bind, "gitlink listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("gitlink stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
