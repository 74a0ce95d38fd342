//! Resource kinds and their fixed field mappings.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::plan::FetchPlan;
use crate::github::{Fork, Release, RepoMetadata, Stargazer};

/// Maximum page size the listing API allows.
pub const PAGE_LENGTH: u64 = 100;

/// Default page budget for a resource traversal.
pub const DEFAULT_REQUEST_BUDGET: u32 = 15;

/// Page budget for the release listing.
pub const RELEASE_REQUEST_BUDGET: u32 = 10;

/// A countable, paginated event stream of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Stars,
    Forks,
    Releases,
}

/// What a sampled point records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// The 1-based absolute position of the item in the listing.
    Ordinal,
    /// A label carried by the item (e.g. a release tag).
    Label,
}

impl ResourceKind {
    /// Listing path segment under `/repos/{owner}/{repo}/`.
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Stars => "stargazers",
            ResourceKind::Forks => "forks",
            ResourceKind::Releases => "releases",
        }
    }

    /// Media type required for the listing to carry timestamps.
    pub fn accept(self) -> Option<&'static str> {
        match self {
            ResourceKind::Stars => Some("application/vnd.github.v3.star+json"),
            ResourceKind::Forks | ResourceKind::Releases => None,
        }
    }

    /// Extra query parameters fixing the listing order to oldest first.
    /// Forks are listed newest first unless asked otherwise.
    pub fn order_query(self) -> Option<&'static str> {
        match self {
            ResourceKind::Forks => Some("sort=oldest"),
            ResourceKind::Stars | ResourceKind::Releases => None,
        }
    }

    pub fn value_mode(self) -> ValueMode {
        match self {
            ResourceKind::Stars | ResourceKind::Forks => ValueMode::Ordinal,
            ResourceKind::Releases => ValueMode::Label,
        }
    }

    pub fn default_budget(self) -> u32 {
        match self {
            ResourceKind::Stars | ResourceKind::Forks => DEFAULT_REQUEST_BUDGET,
            ResourceKind::Releases => RELEASE_REQUEST_BUDGET,
        }
    }

    /// Total declared by repository metadata. Releases have none; their
    /// total is the length of the release listing.
    pub fn declared_total(self, repo: &RepoMetadata) -> Option<u64> {
        match self {
            ResourceKind::Stars => Some(repo.stargazers_count),
            ResourceKind::Forks => Some(repo.forks_count),
            ResourceKind::Releases => None,
        }
    }
}

/// Typed view of a listing item.
pub trait ResourceItem: DeserializeOwned {
    /// Timeline key: an ISO-8601 timestamp.
    fn key(&self) -> Option<&str>;

    /// Label recorded in [`ValueMode::Label`] histories.
    fn label(&self) -> Option<&str> {
        None
    }
}

impl ResourceItem for Stargazer {
    fn key(&self) -> Option<&str> {
        self.starred_at.as_deref()
    }
}

impl ResourceItem for Fork {
    fn key(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

impl ResourceItem for Release {
    fn key(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn label(&self) -> Option<&str> {
        Some(&self.tag_name)
    }
}

/// How one resource is sampled during a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    /// Declared item count. An estimate; the short page ends a traversal.
    pub total: u64,
    pub request_budget: u32,
    /// Always record the last item observed by the traversal.
    pub keep_last_item: bool,
}

impl ResourceSpec {
    pub fn new(kind: ResourceKind, total: u64, request_budget: u32) -> Self {
        Self {
            kind,
            total,
            request_budget: request_budget.max(1),
            keep_last_item: true,
        }
    }

    /// Spec for a resource whose total comes from repository metadata.
    pub fn from_metadata(kind: ResourceKind, repo: &RepoMetadata, request_budget: u32) -> Option<Self> {
        kind.declared_total(repo)
            .map(|total| Self::new(kind, total, request_budget))
    }

    #[cfg(test)]
    pub fn without_last_item(mut self) -> Self {
        self.keep_last_item = false;
        self
    }

    pub fn plan(&self) -> FetchPlan {
        FetchPlan::new(self.total, PAGE_LENGTH, self.request_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(stars: u64, forks: u64) -> RepoMetadata {
        RepoMetadata {
            full_name: "o/r".to_string(),
            html_url: String::new(),
            description: None,
            stargazers_count: stars,
            forks_count: forks,
        }
    }

    #[test]
    fn test_field_mappings() {
        assert_eq!(ResourceKind::Stars.path(), "stargazers");
        assert_eq!(ResourceKind::Forks.path(), "forks");
        assert_eq!(ResourceKind::Releases.path(), "releases");
        assert!(ResourceKind::Stars.accept().is_some());
        assert!(ResourceKind::Forks.accept().is_none());
        assert_eq!(ResourceKind::Forks.order_query(), Some("sort=oldest"));
        assert_eq!(ResourceKind::Stars.order_query(), None);
        assert_eq!(ResourceKind::Releases.value_mode(), ValueMode::Label);
        assert_eq!(ResourceKind::Releases.default_budget(), 10);
        assert_eq!(ResourceKind::Stars.default_budget(), 15);
    }

    #[test]
    fn test_spec_from_metadata() {
        let meta = repo(250, 7);
        let stars = ResourceSpec::from_metadata(ResourceKind::Stars, &meta, 15).unwrap();
        assert_eq!(stars.total, 250);
        assert!(stars.keep_last_item);
        let forks = ResourceSpec::from_metadata(ResourceKind::Forks, &meta, 15).unwrap();
        assert_eq!(forks.total, 7);
        assert!(ResourceSpec::from_metadata(ResourceKind::Releases, &meta, 10).is_none());
    }

    #[test]
    fn test_zero_budget_is_clamped() {
        let spec = ResourceSpec::new(ResourceKind::Stars, 10, 0);
        assert_eq!(spec.request_budget, 1);
    }

    #[test]
    fn test_items_expose_keys() {
        let star: Stargazer = serde_json::from_str(r#"{"starred_at":"2021-05-01T00:00:00Z","user":{}}"#).unwrap();
        assert_eq!(star.key(), Some("2021-05-01T00:00:00Z"));
        assert_eq!(star.label(), None);

        let release: Release =
            serde_json::from_str(r#"{"tag_name":"v1","created_at":"2021-06-01T00:00:00Z"}"#).unwrap();
        assert_eq!(release.key(), Some("2021-06-01T00:00:00Z"));
        assert_eq!(release.label(), Some("v1"));
    }
}
