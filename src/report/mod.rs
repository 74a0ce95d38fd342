//! Repository report: the full refresh pipeline.
//!
//! Metadata first (it carries the totals), then stars, forks and releases
//! sampled concurrently. Each resource has its own timeout and its own
//! failure; only a metadata failure aborts the report.

mod releases;
mod render;

pub use releases::*;
pub use render::*;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::config::ServerConfig;
use crate::github::{GitHubClient, GitHubError, Release, RepoMetadata};
use crate::history::{
    fetch_listing, to_axis_series, AxisPoint, History, MemoryPages, PageFetcher, ResourceKind, ResourceSpec,
    SampledHistory, Sampler,
};

/// Budgets and limits applied to one refresh.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub request_budget: u32,
    pub release_budget: u32,
    pub fetch_timeout: Duration,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            request_budget: ResourceKind::Stars.default_budget(),
            release_budget: ResourceKind::Releases.default_budget(),
            fetch_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&ServerConfig> for ReportOptions {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            request_budget: cfg.request_budget,
            release_budget: cfg.release_budget,
            fetch_timeout: cfg.fetch_timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoSummary {
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
}

impl From<&RepoMetadata> for RepoSummary {
    fn from(meta: &RepoMetadata) -> Self {
        Self {
            full_name: meta.full_name.clone(),
            html_url: meta.html_url.clone(),
            description: meta.description.clone(),
            stars: meta.stargazers_count,
            forks: meta.forks_count,
        }
    }
}

/// Outcome of one resource as the dashboard draws it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResourceView {
    Ok {
        total: u64,
        pages_fetched: u32,
        history: History,
        series: Vec<AxisPoint>,
    },
    Empty {
        message: String,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl ResourceView {
    fn from_result(kind: ResourceKind, result: &Result<SampledHistory, GitHubError>) -> Self {
        match result {
            Ok(sampled) if sampled.total == 0 => ResourceView::Empty {
                message: no_data_message(kind),
            },
            Ok(sampled) if sampled.history.is_empty() => {
                tracing::warn!("{:?}: {} declared but no dated item was read", kind, sampled.total);
                ResourceView::Error {
                    kind: "no_dated_items".to_string(),
                    message: format!(
                        "GitHub reports {} {} for this project, but none could be read",
                        format_number(sampled.total),
                        noun(kind)
                    ),
                }
            }
            Ok(sampled) => ResourceView::Ok {
                total: sampled.total,
                pages_fetched: sampled.pages_fetched,
                history: sampled.history.clone(),
                series: to_axis_series(&sampled.history),
            },
            Err(e) => {
                let (kind, message) = failure(kind, e);
                ResourceView::Error { kind, message }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReleasesView {
    Ok(ReleasePanel),
    Empty { message: String },
    Error { kind: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub repo: RepoSummary,
    pub stars: ResourceView,
    pub forks: ResourceView,
    pub releases: ReleasesView,
}

/// Log a resource failure and describe it for the dashboard.
fn failure(kind: ResourceKind, e: &GitHubError) -> (String, String) {
    tracing::error!("Fetching {:?} failed: {}", kind, e);
    (e.kind().to_string(), e.user_message())
}

fn noun(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Stars => "stars",
        ResourceKind::Forks => "forks",
        ResourceKind::Releases => "releases",
    }
}

fn no_data_message(kind: ResourceKind) -> String {
    format!("There are no {} for this project", noun(kind))
}

/// Run the whole pipeline for `owner/repo`.
pub async fn build_report(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    opts: &ReportOptions,
) -> Result<Report, GitHubError> {
    let meta = client.repo(owner, repo).await?;
    tracing::info!(
        "Building report for {} ({} stars, {} forks)",
        meta.full_name,
        meta.stargazers_count,
        meta.forks_count
    );

    let pages = client.pages(owner, repo);
    Ok(assemble(&meta, &pages, opts).await)
}

/// Sample every resource of a repository whose metadata is known.
pub async fn assemble(meta: &RepoMetadata, fetcher: &dyn PageFetcher, opts: &ReportOptions) -> Report {
    let (stars, forks, releases) = tokio::join!(
        sample_resource(fetcher, ResourceKind::Stars, meta, opts),
        sample_resource(fetcher, ResourceKind::Forks, meta, opts),
        sample_releases(fetcher, opts),
    );

    let star_history = stars.as_ref().ok().map(|s| &s.history).filter(|h| !h.is_empty());

    let releases = match releases {
        Ok((list, _)) if list.is_empty() => ReleasesView::Empty {
            message: no_data_message(ResourceKind::Releases),
        },
        Ok((list, sampled)) => ReleasesView::Ok(ReleasePanel::build(&list, sampled, star_history)),
        Err(e) => {
            let (kind, message) = failure(ResourceKind::Releases, &e);
            ReleasesView::Error { kind, message }
        }
    };

    Report {
        repo: RepoSummary::from(meta),
        stars: ResourceView::from_result(ResourceKind::Stars, &stars),
        forks: ResourceView::from_result(ResourceKind::Forks, &forks),
        releases,
    }
}

async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, GitHubError>
where
    F: Future<Output = Result<T, GitHubError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| GitHubError::Timeout(limit))?
}

async fn sample_resource(
    fetcher: &dyn PageFetcher,
    kind: ResourceKind,
    meta: &RepoMetadata,
    opts: &ReportOptions,
) -> Result<SampledHistory, GitHubError> {
    let spec = ResourceSpec::from_metadata(kind, meta, opts.request_budget)
        .unwrap_or_else(|| ResourceSpec::new(kind, 0, opts.request_budget));
    with_timeout(opts.fetch_timeout, Sampler::new(spec, fetcher).sample()).await
}

/// List releases, then sample the listing into a tag history.
async fn sample_releases(
    fetcher: &dyn PageFetcher,
    opts: &ReportOptions,
) -> Result<(Vec<Release>, SampledHistory), GitHubError> {
    with_timeout(opts.fetch_timeout, async {
        let raw = fetch_listing(fetcher, ResourceKind::Releases, opts.release_budget).await?;

        let releases: Vec<Release> = raw
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(release) => Some(release),
                Err(e) => {
                    tracing::warn!("Skipping undecodable release: {}", e);
                    None
                }
            })
            .collect();

        let total = raw.len() as u64;
        let listing = MemoryPages::new().with_items(ResourceKind::Releases, raw);
        let spec = ResourceSpec::new(ResourceKind::Releases, total, opts.release_budget);
        let sampled = Sampler::new(spec, &listing).sample().await?;

        Ok((releases, sampled))
    })
    .await
}
