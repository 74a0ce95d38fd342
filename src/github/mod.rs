//! GitHub REST API access.
//!
//! Repository metadata, paginated listings and user repositories.

mod client;
mod models;

pub use client::*;
pub use models::*;

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// GitHub API error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GitHubError {
    #[error("not found")]
    NotFound,
    #[error("rate limited")]
    RateLimited,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl GitHubError {
    /// Short machine-readable name used in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            GitHubError::NotFound => "not_found",
            GitHubError::RateLimited => "rate_limited",
            GitHubError::Status(_) => "status",
            GitHubError::Timeout(_) => "timeout",
            GitHubError::Transport(_) => "transport",
            GitHubError::Decode(_) => "decode",
            GitHubError::Invalid(_) => "invalid",
        }
    }

    /// Message shown to the dashboard user.
    pub fn user_message(&self) -> String {
        match self {
            GitHubError::NotFound => "The project does not exist!".to_string(),
            GitHubError::RateLimited => {
                "You've exceeded GitHub's rate limiting. Please try again in about an hour.".to_string()
            }
            GitHubError::Timeout(d) => format!("GitHub did not answer within {}s.", d.as_secs()),
            other => format!("Could not reach GitHub: {}", other),
        }
    }
}

/// Map a response status onto the error taxonomy. `None` means success.
pub fn classify_status(status: StatusCode) -> Option<GitHubError> {
    match status {
        s if s.is_success() => None,
        StatusCode::NOT_FOUND => Some(GitHubError::NotFound),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Some(GitHubError::RateLimited),
        s => Some(GitHubError::Status(s.as_u16())),
    }
}
