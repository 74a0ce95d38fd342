//! Configuration module for repostats.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite database file holding the persisted token (default: "repostats.db")
    pub db_path: String,
    /// Root of the GitHub REST API (default: "https://api.github.com")
    pub api_root: String,
    /// Upper bound on the time spent sampling a single resource (default: 60s)
    pub fetch_timeout: Duration,
    /// Page budget for stars and forks (default: 15)
    pub request_budget: u32,
    /// Page budget for releases (default: 10)
    pub release_budget: u32,
    /// Token used when none has been persisted through the dashboard
    pub fallback_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "repostats.db".to_string(),
            api_root: "https://api.github.com".to_string(),
            fetch_timeout: Duration::from_secs(60),
            request_budget: 15,
            release_budget: 10,
            fallback_token: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REPOSTATS_HTTP_PORT`: HTTP port (default: 8080)
    /// - `REPOSTATS_DB_PATH`: Database file path (default: "repostats.db")
    /// - `REPOSTATS_API_ROOT`: GitHub API root (default: "https://api.github.com")
    /// - `REPOSTATS_FETCH_TIMEOUT_SECS`: per-resource timeout (default: 60)
    /// - `REPOSTATS_REQUEST_BUDGET`: pages per star/fork history (default: 15)
    /// - `REPOSTATS_RELEASE_BUDGET`: pages per release listing (default: 10)
    /// - `GITHUB_TOKEN`: token used when none is persisted
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Some(port) = parse_var("REPOSTATS_HTTP_PORT") {
            cfg.http_port = port;
        }

        if let Ok(db_path) = env::var("REPOSTATS_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Ok(api_root) = env::var("REPOSTATS_API_ROOT") {
            cfg.api_root = api_root.trim_end_matches('/').to_string();
        }

        if let Some(secs) = parse_var::<u64>("REPOSTATS_FETCH_TIMEOUT_SECS").filter(|s| *s > 0) {
            cfg.fetch_timeout = Duration::from_secs(secs);
        }

        if let Some(budget) = parse_var::<u32>("REPOSTATS_REQUEST_BUDGET").filter(|b| *b > 0) {
            cfg.request_budget = budget;
        }

        if let Some(budget) = parse_var::<u32>("REPOSTATS_RELEASE_BUDGET").filter(|b| *b > 0) {
            cfg.release_budget = budget;
        }

        cfg.fallback_token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty());

        cfg
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
