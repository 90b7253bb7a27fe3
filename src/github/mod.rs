pub mod client;
pub mod reference;
pub mod traits;

pub use client::GithubClient;
pub use reference::RepoRef;
pub use traits::RepoHost;

use thiserror::Error;

/// Why a repository lookup failed. Surfaced to the session layer, which
/// turns each kind into one user-facing explanation. No retries anywhere:
/// the user resubmitting the link is the retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("reference is not a valid owner/repository pair")]
    InvalidReferenceFormat,
    #[error("repository not found")]
    RepositoryNotFound,
    /// GitHub answers 403 for both rate limiting and private repositories;
    /// the API does not let us tell them apart, so neither do we.
    #[error("access denied (rate limit or private repository)")]
    AccessDenied,
    #[error("GitHub API returned status {status}")]
    UpstreamError { status: u16 },
    #[error("request timed out")]
    Timeout,
    #[error("could not reach GitHub")]
    NetworkUnavailable,
}

/// Structured projection of a `GET /repos/{owner}/{name}` response.
///
/// `name` and `owner` are always non-empty; every other field carries a
/// defined default when the API omits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMetadata {
    pub name: String,
    pub owner: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub topics: Vec<String>,
    pub default_branch: String,
    pub homepage: Option<String>,
    pub license: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub clone_url: Option<String>,
    pub size: u64,
}
