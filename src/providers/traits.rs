use async_trait::async_trait;

/// Seam for the AI-completion collaborator. One operation: text in, text out.
/// Sampling configuration lives on the implementation, not the call.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;

    /// Check whether the provider is usable (credentials present).
    fn is_configured(&self) -> bool {
        true
    }
}
