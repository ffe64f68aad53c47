//! Document rendering
//!
//! Turns one page of an artifact into an image inside a caller-owned directory.

use crate::process::{run_bounded, RunError};
use async_trait::async_trait;
use scriptorium_core::{ArtifactRef, ExtractionError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Renders a document page to an image
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `page` (1-based) of `artifact` into `out_dir`, returning the image path
    async fn render(
        &self,
        artifact: &ArtifactRef,
        page: u32,
        out_dir: &Path,
    ) -> Result<PathBuf, ExtractionError>;
}

/// Renderer backed by poppler's `pdftoppm`
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    binary: PathBuf,
    scale_to: u32,
    timeout: Duration,
}

impl PdftoppmRenderer {
    /// Create a renderer using `binary`
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    /// With the long-edge size of the rendered image in pixels
    #[must_use]
    pub fn with_scale(mut self, scale_to: u32) -> Self {
        self.scale_to = scale_to;
        self
    }

    /// With the time bound for one render
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            scale_to: 3000,
            timeout: Duration::from_secs(60),
        }
    }
}

#[async_trait]
impl Renderer for PdftoppmRenderer {
    async fn render(
        &self,
        artifact: &ArtifactRef,
        page: u32,
        out_dir: &Path,
    ) -> Result<PathBuf, ExtractionError> {
        let prefix = out_dir.join("page");
        let page = page.to_string();

        let mut command = Command::new(&self.binary);
        command
            .args(["-png", "-singlefile", "-f", page.as_str(), "-l", page.as_str()])
            .arg("-scale-to")
            .arg(self.scale_to.to_string())
            .arg(artifact.path())
            .arg(&prefix);

        match run_bounded(command, self.timeout).await {
            Ok(_) => Ok(prefix.with_extension("png")),
            Err(RunError::TimedOut) => Err(ExtractionError::RenderTimeout(self.timeout)),
            Err(e) => Err(ExtractionError::Render(format!("{}: {e}", artifact))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_render_error() {
        let renderer = PdftoppmRenderer::new("/nonexistent/pdftoppm");
        let dir = tempfile::tempdir().unwrap();

        let err = renderer
            .render(&ArtifactRef::new("/nonexistent/codex.pdf"), 1, dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::Render(_)));
    }
}
