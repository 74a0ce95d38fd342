//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::github::{GitHubClient, GitHubError};

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<Store>,
}

impl AppState {
    /// Token to authenticate with: the persisted one, else the configured fallback.
    pub fn token(&self) -> Option<String> {
        match self.store.get_token() {
            Ok(Some(token)) => Some(token),
            Ok(None) => self.config.fallback_token.clone(),
            Err(e) => {
                tracing::error!("Failed to read persisted token: {}", e);
                self.config.fallback_token.clone()
            }
        }
    }

    /// A GitHub client carrying the current token.
    pub fn github(&self) -> Result<GitHubClient, GitHubError> {
        GitHubClient::new(&self.config.api_root, self.token(), self.config.fetch_timeout)
    }
}

/// Web server for the dashboard.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, store: Arc<Store>) -> Self {
        Self {
            state: AppState { config, store },
        }
    }

    /// Build the router with all routes.
    pub fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

        Router::new()
            // Dashboard
            .route("/", get(handlers::handle_dashboard))
            // API endpoints
            .route("/api/stats", get(handlers::handle_stats))
            .route("/api/users/{user}/repos", get(handlers::handle_user_repos))
            .route(
                "/api/token",
                get(handlers::handle_get_token)
                    .post(handlers::handle_set_token)
                    .delete(handlers::handle_delete_token),
            )
            // Static assets
            .route("/assets/{*path}", get(handlers::handle_asset))
            .route("/favicon.ico", get(handlers::handle_favicon))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(64 * 1024)) // 64KB
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
