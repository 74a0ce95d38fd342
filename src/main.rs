//! repostats - GitHub repository popularity dashboard
//!
//! Samples star, fork and release histories through the paginated REST API
//! under a request budget and serves them as interactive charts.

mod config;
mod db;
mod github;
mod history;
mod report;
mod web;

use config::ServerConfig;
use db::Store;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("repostats=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting repostats on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);
    tracing::info!(
        "GitHub API at {} (budget {} pages, releases {} pages, timeout {:?})",
        cfg.api_root,
        cfg.request_budget,
        cfg.release_budget,
        cfg.fetch_timeout
    );

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    if store.get_token()?.is_none() && cfg.fallback_token.is_none() {
        tracing::info!("No GitHub token configured, requests are anonymous and heavily rate limited");
    }

    // Start web server
    let server = Server::new(cfg, store);
    server.start().await?;

    Ok(())
}
