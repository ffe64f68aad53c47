//! Key extractor
//!
//! Glues renderer, recognizer and pattern together and implements
//! [`KeySource`] for the chain resolver.

use crate::pattern::KeyPattern;
use crate::recognize::{RecognitionOptions, Recognizer};
use crate::render::Renderer;
use async_trait::async_trait;
use scriptorium_core::{ArtifactRef, ExtractionError, KeySource};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Page the key is printed on
const KEY_PAGE: u32 = 1;

/// Extracts access keys from artifacts
pub struct KeyExtractor {
    renderer: Arc<dyn Renderer>,
    recognizer: Arc<dyn Recognizer>,
    pattern: KeyPattern,
    options: RecognitionOptions,
    scratch_root: Option<PathBuf>,
}

impl KeyExtractor {
    /// Create an extractor with the default pattern and recognition options
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>, recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            renderer,
            recognizer,
            pattern: KeyPattern::default(),
            options: RecognitionOptions::default(),
            scratch_root: None,
        }
    }

    /// With key pattern
    #[must_use]
    pub fn with_pattern(mut self, pattern: KeyPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// With recognition options
    #[must_use]
    pub fn with_options(mut self, options: RecognitionOptions) -> Self {
        self.options = options;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir
    #[must_use]
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    fn scratch_dir(&self) -> Result<TempDir, ExtractionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("scriptorium-ocr-");
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Extract the key from `artifact`
    ///
    /// # Errors
    /// - `Render` / `RenderTimeout` if the page cannot be rendered
    /// - `MissingImage` if the renderer reported success but wrote nothing
    /// - `Recognition` if the recognizer fails
    /// - `PatternNotFound` if the text holds no key
    pub async fn extract(&self, artifact: &ArtifactRef) -> Result<String, ExtractionError> {
        // Dropped on every return below, which removes the directory and its contents.
        let scratch = self.scratch_dir()?;

        let image = self
            .renderer
            .render(artifact, KEY_PAGE, scratch.path())
            .await?;
        if !tokio::fs::try_exists(&image).await.unwrap_or(false) {
            return Err(ExtractionError::MissingImage(image));
        }

        let text = self.recognizer.recognize(&image, &self.options).await?;

        match self.pattern.find(&text) {
            Some(key) => {
                tracing::debug!(artifact = %artifact, key, "Key pattern matched");
                Ok(key.to_string())
            }
            None => {
                tracing::debug!(artifact = %artifact, text = %text, "Key pattern not found");
                Err(ExtractionError::PatternNotFound { text })
            }
        }
    }
}

#[async_trait]
impl KeySource for KeyExtractor {
    async fn extract(&self, artifact: &ArtifactRef) -> Result<String, ExtractionError> {
        KeyExtractor::extract(self, artifact).await
    }
}

impl std::fmt::Debug for KeyExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyExtractor")
            .field("pattern", &self.pattern)
            .field("options", &self.options)
            .field("scratch_root", &self.scratch_root)
            .finish_non_exhaustive()
    }
}
