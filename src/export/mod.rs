//! Transient README artifacts. A file exists only long enough to be handed
//! to the channel; cleanup failures are logged and swallowed because the
//! delivery has already happened.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const DEFAULT_SCRATCH_DIR: &str = "generated";
const FALLBACK_NAME: &str = "project";

pub struct Exporter {
    scratch_dir: PathBuf,
}

impl Exporter {
    pub fn new() -> Self {
        Self::with_scratch_dir(PathBuf::from(DEFAULT_SCRATCH_DIR))
    }

    pub fn with_scratch_dir(scratch_dir: PathBuf) -> Self {
        Self { scratch_dir }
    }

    /// Filename the artifact will be delivered under.
    pub fn artifact_name(name_hint: &str) -> String {
        format!("{}_README.md", sanitize_name(name_hint))
    }

    /// Write the document to a scratch file and return its path. The
    /// scratch directory is created on demand.
    pub async fn export(&self, document: &str, name_hint: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .with_context(|| format!("creating scratch dir {}", self.scratch_dir.display()))?;

        let path = self.scratch_dir.join(Self::artifact_name(name_hint));
        tokio::fs::write(&path, document.as_bytes())
            .await
            .with_context(|| format!("writing export artifact {}", path.display()))?;

        tracing::debug!(path = %path.display(), "export artifact written");
        Ok(path)
    }

    /// Delete a delivered artifact. Never fails the caller.
    pub async fn cleanup(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove export artifact");
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce a name hint to a filesystem-safe token.
fn sanitize_name(hint: &str) -> String {
    let cleaned: String = hint
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_name("widget"), "widget");
        assert_eq!(sanitize_name("my-repo_v2.0"), "my-repo_v2.0");
    }

    #[test]
    fn sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize_name("a b/c"), "a_b_c");
        assert_eq!(sanitize_name("répo"), "r_po");
    }

    #[test]
    fn sanitize_falls_back_on_degenerate_hints() {
        assert_eq!(sanitize_name(""), "project");
        assert_eq!(sanitize_name("///"), "project");
        assert_eq!(sanitize_name(".."), "project");
    }

    #[test]
    fn artifact_name_has_readme_suffix() {
        assert_eq!(Exporter::artifact_name("widget"), "widget_README.md");
    }

    #[tokio::test]
    async fn export_writes_verbatim_and_cleanup_removes() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::with_scratch_dir(dir.path().join("scratch"));

        let path = exporter.export("# Widget\n\nBody", "widget").await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "# Widget\n\nBody");

        exporter.cleanup(&path).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn cleanup_of_missing_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::with_scratch_dir(dir.path().to_path_buf());
        exporter.cleanup(&dir.path().join("nothing.md")).await;
    }

    #[tokio::test]
    async fn repeat_export_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::with_scratch_dir(dir.path().to_path_buf());

        let first = exporter.export("same content", "widget").await.unwrap();
        let a = tokio::fs::read(&first).await.unwrap();
        exporter.cleanup(&first).await;

        let second = exporter.export("same content", "widget").await.unwrap();
        let b = tokio::fs::read(&second).await.unwrap();
        assert_eq!(a, b);
    }
}
