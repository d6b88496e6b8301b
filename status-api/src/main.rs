mod auth;
mod config;
mod db;
mod errors;
mod metrics;
mod model;
mod rest;
mod validate;

use anyhow::Context;
use config::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging before config so .env problems are visible
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    info!("Starting device status API");
    info!("HTTP server: {}", config.http_addr);
    info!("Database: {}", config.redacted_database_url());
    if config.api_key.is_none() {
        warn!("API_KEY is not set, requests are not authenticated");
    }

    metrics::init_metrics().context("failed to register metrics")?;

    let pool = db::make_pool(&config.database_url, config.max_connections)
        .await
        .context("failed to connect to database")?;

    let app = rest::create_router(pool.clone(), config.api_key.clone());

    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.http_addr))?;

    info!("HTTP server listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    pool.close().await;
    info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
