//! HTTP request handlers.

use super::AppState;
use crate::github::GitHubError;
use crate::report::{build_report, html_escape, ReportOptions};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};

// ============================================================================
// Templates (simple string replacement)
// ============================================================================

const DASHBOARD_TEMPLATE: &str = include_str!("templates/dashboard.html");
const LAYOUT_TEMPLATE: &str = include_str!("templates/layout.html");

/// Scripts and styles served under `/assets/`.
#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

// ============================================================================
// Dashboard
// ============================================================================

/// `?user=&repo=` as typed into the form or passed in a shared link.
#[derive(Debug, Default, Deserialize)]
pub struct RepoQuery {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub repo: String,
}

pub async fn handle_dashboard(State(state): State<AppState>, Query(query): Query<RepoQuery>) -> impl IntoResponse {
    let token_state = if state.token().is_some() { "set" } else { "unset" };

    let content = DASHBOARD_TEMPLATE
        .replace("{{user}}", &html_escape(query.user.trim()))
        .replace("{{repo}}", &html_escape(query.repo.trim()))
        .replace("{{token_state}}", token_state);

    let page = LAYOUT_TEMPLATE
        .replace("{{title}}", "Repository Stats")
        .replace("{{content}}", &content);

    Html(page)
}

// ============================================================================
// API: Stats
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub kind: String,
    pub message: String,
}

fn error_response(e: &GitHubError) -> Response {
    let status = match e {
        GitHubError::NotFound => StatusCode::NOT_FOUND,
        GitHubError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        GitHubError::Invalid(_) => StatusCode::BAD_REQUEST,
        GitHubError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    };

    let message = match e {
        GitHubError::Invalid(detail) => format!("Invalid repository: {}", detail),
        other => other.user_message(),
    };

    (
        status,
        Json(ApiError {
            kind: e.kind().to_string(),
            message,
        }),
    )
        .into_response()
}

pub async fn handle_stats(State(state): State<AppState>, Query(query): Query<RepoQuery>) -> Response {
    let user = query.user.trim();
    let repo = query.repo.trim();

    if user.is_empty() || repo.is_empty() {
        return error_response(&GitHubError::Invalid("user and repository are required".to_string()));
    }

    let client = match state.github() {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    tracing::debug!(
        "Report for {}/{} ({})",
        user,
        repo,
        if client.is_authenticated() { "authenticated" } else { "anonymous" }
    );

    let opts = ReportOptions::from(&state.config);
    match build_report(&client, user, repo, &opts).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            tracing::warn!("Report for {}/{} failed: {}", user, repo, e);
            error_response(&e)
        }
    }
}

pub async fn handle_user_repos(State(state): State<AppState>, Path(user): Path<String>) -> Response {
    let client = match state.github() {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    match client.user_repos(&user).await {
        Ok(names) => Json(names).into_response(),
        Err(e) => error_response(&e),
    }
}

// ============================================================================
// API: Token
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TokenStatus {
    pub present: bool,
    /// "stored", "environment" or "none"
    pub source: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

pub async fn handle_get_token(State(state): State<AppState>) -> impl IntoResponse {
    let source = match state.store.get_token() {
        Ok(Some(_)) => "stored",
        _ if state.config.fallback_token.is_some() => "environment",
        _ => "none",
    };

    Json(TokenStatus {
        present: source != "none",
        source,
    })
}

pub async fn handle_set_token(State(state): State<AppState>, Json(req): Json<TokenRequest>) -> impl IntoResponse {
    match state.store.set_token(&req.token) {
        Ok(()) => {
            tracing::info!("GitHub token updated");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub async fn handle_delete_token(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.clear_token() {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_asset(Path(path): Path<String>) -> impl IntoResponse {
    match Assets::get(&path) {
        Some(file) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                file.data.into_owned(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn handle_favicon() -> impl IntoResponse {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <circle cx="50" cy="50" r="45" fill="#24292f"/>
        <path d="M50 18 L59 40 L82 41 L64 56 L70 79 L50 66 L30 79 L36 56 L18 41 L41 40 Z" fill="#f1c40f"/>
    </svg>"##;

    (
        [(header::CONTENT_TYPE, "image/svg+xml")],
        svg
    )
}
