//! HTTP client for the GitHub REST API.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{classify_status, GitHubError, RepoMetadata, UserRepo};
use crate::history::{PageFetcher, ResourceKind};

const USER_AGENT: &str = concat!("repostats/", env!("CARGO_PKG_VERSION"));

/// Owner and repository names GitHub accepts.
fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]{1,100}$").expect("valid name pattern"))
}

/// Reject names that would escape their URL path segment.
pub fn validate_name(name: &str) -> Result<(), GitHubError> {
    if name_pattern().is_match(name) && name != "." && name != ".." {
        Ok(())
    } else {
        Err(GitHubError::Invalid(format!("bad name: {:?}", name)))
    }
}

/// GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_root: String,
    token: Option<String>,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a client against `api_root`, authenticating with `token` when given.
    pub fn new(api_root: &str, token: Option<String>, timeout: Duration) -> Result<Self, GitHubError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GitHubError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_root: api_root.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Fetch repository metadata, which carries the declared star and fork totals.
    pub async fn repo(&self, owner: &str, repo: &str) -> Result<RepoMetadata, GitHubError> {
        validate_name(owner)?;
        validate_name(repo)?;
        let url = format!("{}/repos/{}/{}", self.api_root, owner, repo);
        self.get_json(&url, None).await
    }

    /// Names of a user's public repositories (first page only).
    pub async fn user_repos(&self, user: &str) -> Result<Vec<String>, GitHubError> {
        validate_name(user)?;
        let url = format!("{}/users/{}/repos?per_page=100", self.api_root, user);
        let repos: Vec<UserRepo> = self.get_json(&url, None).await?;
        Ok(repos.into_iter().map(|r| r.name).collect())
    }

    /// Fetch one page of a resource listing as raw items.
    pub async fn list_page(
        &self,
        owner: &str,
        repo: &str,
        kind: ResourceKind,
        page: u64,
        per_page: u64,
    ) -> Result<Vec<Value>, GitHubError> {
        validate_name(owner)?;
        validate_name(repo)?;
        let mut url = format!(
            "{}/repos/{}/{}/{}?page={}&per_page={}",
            self.api_root,
            owner,
            repo,
            kind.path(),
            page,
            per_page
        );
        if let Some(order) = kind.order_query() {
            url.push('&');
            url.push_str(order);
        }
        self.get_json(&url, kind.accept()).await
    }

    /// Bind this client to one repository as a page source.
    pub fn pages<'a>(&'a self, owner: &'a str, repo: &'a str) -> RepoPages<'a> {
        RepoPages {
            client: self,
            owner,
            repo,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, accept: Option<&str>) -> Result<T, GitHubError> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        let response = request.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status();
        if let Some(err) = classify_status(status) {
            tracing::debug!("GET {} -> {}", url, status);
            return Err(err);
        }

        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        serde_json::from_slice(&body).map_err(|e| GitHubError::Decode(e.to_string()))
    }

    fn map_error(&self, e: reqwest::Error) -> GitHubError {
        if e.is_timeout() {
            GitHubError::Timeout(self.timeout)
        } else {
            GitHubError::Transport(e.to_string())
        }
    }
}

/// A [`GitHubClient`] bound to one repository.
pub struct RepoPages<'a> {
    client: &'a GitHubClient,
    owner: &'a str,
    repo: &'a str,
}

#[async_trait]
impl PageFetcher for RepoPages<'_> {
    async fn fetch_page(&self, kind: ResourceKind, page: u64, per_page: u64) -> Result<Vec<Value>, GitHubError> {
        self.client.list_page(self.owner, self.repo, kind, page, per_page).await
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
#[cfg(test)]
pub(crate) async fn spawn_fake_api(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn client(base: &str, token: Option<&str>) -> GitHubClient {
        GitHubClient::new(base, token.map(String::from), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("rust-lang").is_ok());
        assert!(validate_name("my.repo_2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a?b=1").is_err());
    }

    #[tokio::test]
    async fn test_repo_metadata() {
        let router = Router::new().route(
            "/repos/{owner}/{repo}",
            get(|Path((owner, repo)): Path<(String, String)>| async move {
                Json(json!({
                    "full_name": format!("{}/{}", owner, repo),
                    "html_url": "https://github.com/o/r",
                    "stargazers_count": 250,
                    "forks_count": 12
                }))
            }),
        );
        let base = spawn_fake_api(router).await;

        let repo = client(&base, None).repo("o", "r").await.unwrap();
        assert_eq!(repo.full_name, "o/r");
        assert_eq!(repo.stargazers_count, 250);
        assert_eq!(repo.forks_count, 12);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let router = Router::new()
            .route("/repos/missing/repo", get(|| async { StatusCode::NOT_FOUND }))
            .route("/repos/limited/repo", get(|| async { StatusCode::FORBIDDEN }))
            .route("/repos/broken/repo", get(|| async { "not json" }));
        let base = spawn_fake_api(router).await;
        let gh = client(&base, None);

        assert_eq!(gh.repo("missing", "repo").await.unwrap_err(), GitHubError::NotFound);
        assert_eq!(gh.repo("limited", "repo").await.unwrap_err(), GitHubError::RateLimited);
        assert!(matches!(gh.repo("broken", "repo").await, Err(GitHubError::Decode(_))));
    }

    #[tokio::test]
    async fn test_list_page_sends_headers_and_query() {
        let router = Router::new().route(
            "/repos/{owner}/{repo}/stargazers",
            get(|headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                let accept = headers.get("accept").and_then(|v| v.to_str().ok()).unwrap_or("").to_string();
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!([{
                    "starred_at": "2020-01-01T00:00:00Z",
                    "accept": accept,
                    "auth": auth,
                    "page": q.get("page"),
                    "per_page": q.get("per_page"),
                }]))
            }),
        );
        let base = spawn_fake_api(router).await;
        let gh = client(&base, Some("secret"));
        assert!(gh.is_authenticated());

        let items = gh.pages("o", "r").fetch_page(ResourceKind::Stars, 3, 100).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["accept"], "application/vnd.github.v3.star+json");
        assert_eq!(items[0]["auth"], "token secret");
        assert_eq!(items[0]["page"], "3");
        assert_eq!(items[0]["per_page"], "100");
    }

    #[tokio::test]
    async fn test_forks_are_requested_oldest_first() {
        let router = Router::new().route(
            "/repos/{owner}/{repo}/forks",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(json!([{"created_at": "2020-01-01T00:00:00Z", "sort": q.get("sort")}]))
            }),
        );
        let base = spawn_fake_api(router).await;
        let gh = client(&base, None);

        let items = gh.list_page("o", "r", ResourceKind::Forks, 1, 100).await.unwrap();
        assert_eq!(items[0]["sort"], "oldest");
    }

    #[tokio::test]
    async fn test_anonymous_requests_omit_authorization() {
        let router = Router::new().route(
            "/users/{user}/repos",
            get(|headers: HeaderMap| async move {
                assert!(headers.get("authorization").is_none());
                Json(json!([{"name": "alpha"}, {"name": "beta"}]))
            }),
        );
        let base = spawn_fake_api(router).await;

        let names = client(&base, Some("")).user_repos("octocat").await.unwrap();
        assert_eq!(names, vec!["alpha".to_string(), "beta".to_string()]);
    }
}
