use super::{FetchError, RepoMetadata};
use async_trait::async_trait;

/// Seam for the repository-hosting API so the session engine can be
/// exercised without a network.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Resolve a raw user-supplied reference into structured metadata.
    async fn fetch(&self, reference: &str) -> Result<RepoMetadata, FetchError>;

    /// Check if the host is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}
