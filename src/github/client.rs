//! GitHub REST client: one read-only metadata lookup per fetch.

use super::traits::RepoHost;
use super::{FetchError, RepoMetadata, RepoRef};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("readmegen/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GithubClient {
    api_base: String,
    token: Option<String>,
    client: reqwest::Client,
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: Option<String>,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    topics: Vec<String>,
    default_branch: Option<String>,
    owner: Option<OwnerResponse>,
    homepage: Option<String>,
    license: Option<LicenseResponse>,
    created_at: Option<String>,
    updated_at: Option<String>,
    clone_url: Option<String>,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    name: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_api_base(API_BASE.to_string(), token)
    }

    /// Point the client at a different API root (tests use a local server).
    pub fn with_api_base(api_base: String, token: Option<String>) -> Self {
        Self {
            api_base,
            token,
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn repo_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.name)
    }

    fn project(repo: &RepoRef, body: RepoResponse) -> RepoMetadata {
        RepoMetadata {
            name: body
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| repo.name.clone()),
            owner: body
                .owner
                .and_then(|o| o.login)
                .filter(|o| !o.is_empty())
                .unwrap_or_else(|| repo.owner.clone()),
            description: body.description,
            language: body.language,
            stars: body.stargazers_count,
            forks: body.forks_count,
            topics: body.topics,
            default_branch: body.default_branch.unwrap_or_else(|| "main".to_string()),
            homepage: body.homepage.filter(|h| !h.is_empty()),
            license: body.license.and_then(|l| l.name),
            created_at: body.created_at,
            updated_at: body.updated_at,
            clone_url: body.clone_url,
            size: body.size,
        }
    }
}

#[async_trait]
impl RepoHost for GithubClient {
    async fn fetch(&self, reference: &str) -> Result<RepoMetadata, FetchError> {
        let repo = RepoRef::parse(reference)?;
        let url = self.repo_url(&repo);

        tracing::info!(repo = %repo, "fetching repository metadata");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("token {token}"));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else if e.is_connect() {
                FetchError::NetworkUnavailable
            } else {
                tracing::warn!(repo = %repo, error = %e, "GitHub request failed");
                FetchError::NetworkUnavailable
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::RepositoryNotFound);
        }
        if status == StatusCode::FORBIDDEN {
            return Err(FetchError::AccessDenied);
        }
        if !status.is_success() {
            return Err(FetchError::UpstreamError {
                status: status.as_u16(),
            });
        }

        let body: RepoResponse = response.json().await.map_err(|e| {
            tracing::warn!(repo = %repo, error = %e, "GitHub response decode failed");
            FetchError::UpstreamError {
                status: status.as_u16(),
            }
        })?;

        tracing::info!(repo = %repo, "repository metadata extracted");
        Ok(Self::project(&repo, body))
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(&self.api_base)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map(|r| r.status().is_success() || r.status().is_client_error())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_url_includes_owner_and_name() {
        let client = GithubClient::new(None);
        let repo = RepoRef::parse("https://github.com/acme/widget.git").unwrap();
        assert_eq!(
            client.repo_url(&repo),
            "https://api.github.com/repos/acme/widget"
        );
    }

    #[test]
    fn projection_applies_defaults() {
        let repo = RepoRef::parse("acme/widget").unwrap();
        let body: RepoResponse = serde_json::from_str("{}").unwrap();
        let meta = GithubClient::project(&repo, body);

        assert_eq!(meta.name, "widget");
        assert_eq!(meta.owner, "acme");
        assert_eq!(meta.description, None);
        assert_eq!(meta.stars, 0);
        assert_eq!(meta.forks, 0);
        assert!(meta.topics.is_empty());
        assert_eq!(meta.default_branch, "main");
        assert_eq!(meta.license, None);
        assert_eq!(meta.size, 0);
    }

    #[test]
    fn projection_reads_nested_fields() {
        let repo = RepoRef::parse("acme/widget").unwrap();
        let body: RepoResponse = serde_json::from_str(
            r#"{
                "name": "widget",
                "owner": {"login": "acme"},
                "description": "A widget",
                "language": "Rust",
                "stargazers_count": 42,
                "forks_count": 7,
                "topics": ["cli", "tools"],
                "default_branch": "trunk",
                "homepage": "https://widget.dev",
                "license": {"name": "MIT License"},
                "size": 1234
            }"#,
        )
        .unwrap();
        let meta = GithubClient::project(&repo, body);

        assert_eq!(meta.owner, "acme");
        assert_eq!(meta.stars, 42);
        assert_eq!(meta.topics, vec!["cli", "tools"]);
        assert_eq!(meta.default_branch, "trunk");
        assert_eq!(meta.license.as_deref(), Some("MIT License"));
    }

    #[test]
    fn empty_homepage_treated_as_absent() {
        let repo = RepoRef::parse("acme/widget").unwrap();
        let body: RepoResponse = serde_json::from_str(r#"{"homepage": ""}"#).unwrap();
        let meta = GithubClient::project(&repo, body);
        assert_eq!(meta.homepage, None);
    }

    #[tokio::test]
    async fn invalid_reference_fails_before_any_request() {
        // Unroutable base: a network attempt would error differently
        let client = GithubClient::with_api_base("http://127.0.0.1:1".into(), None);
        let err = client.fetch("https://github.com/onlyowner").await.unwrap_err();
        assert_eq!(err, FetchError::InvalidReferenceFormat);
    }
}
