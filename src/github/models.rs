//! GitHub REST v3 response types.
//!
//! Only the fields the dashboard reads are declared; serde ignores the rest.

use serde::{Deserialize, Serialize};

/// Repository metadata from `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepoMetadata {
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Missing counts are treated as zero: no history is sampled.
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
}

/// One entry of `GET /users/{user}/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRepo {
    pub name: String,
}

/// A stargazer, as returned with the `star+json` media type.
#[derive(Debug, Clone, Deserialize)]
pub struct Stargazer {
    pub starred_at: Option<String>,
}

/// A fork. Only its creation time matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct Fork {
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Author {
    pub login: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Asset {
    pub name: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Absent for draft releases
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Downloads summed over every asset of the release.
    pub fn download_count(&self) -> u64 {
        self.assets.iter().map(|a| a.download_count).sum()
    }
}
