//! Text recognition

use crate::process::run_bounded;
use async_trait::async_trait;
use scriptorium_core::ExtractionError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Characters the recognizer may emit; the key pattern relies on it
pub const DEFAULT_ALLOWLIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789:óÓ* ";

/// Options passed to the recognizer on every call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    /// Recognition language (tesseract code)
    pub language: String,
    /// Allowed output characters
    pub allowlist: String,
    /// Keep runs of spaces between words
    pub preserve_interword_spaces: bool,
}

impl RecognitionOptions {
    /// With recognition language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            language: "spa".to_string(),
            allowlist: DEFAULT_ALLOWLIST.to_string(),
            preserve_interword_spaces: true,
        }
    }
}

/// Recognizes text in an image
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize the text in `image`
    async fn recognize(
        &self,
        image: &Path,
        options: &RecognitionOptions,
    ) -> Result<String, ExtractionError>;
}

/// Recognizer backed by the `tesseract` CLI
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: PathBuf,
    timeout: Duration,
}

impl TesseractRecognizer {
    /// Create a recognizer using `binary`
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    /// With the time bound for one recognition
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            timeout: Duration::from_secs(120),
        }
    }
}

#[async_trait]
impl Recognizer for TesseractRecognizer {
    async fn recognize(
        &self,
        image: &Path,
        options: &RecognitionOptions,
    ) -> Result<String, ExtractionError> {
        let mut command = Command::new(&self.binary);
        command
            .arg(image)
            .arg("stdout")
            .args(["-l", options.language.as_str()])
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", options.allowlist))
            .arg("-c")
            .arg(format!(
                "preserve_interword_spaces={}",
                u8::from(options.preserve_interword_spaces)
            ));

        let output = run_bounded(command, self.timeout)
            .await
            .map_err(|e| ExtractionError::Recognition(e.to_string()))?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
