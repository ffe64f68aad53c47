//! Settings
//!
//! Loaded from an optional TOML file, then overridden by `SCRIPTORIUM_*`
//! environment variables (a `.env` file is read first by `main`).

use scriptorium_challenge::{ChallengeConfig, ChallengeResolver};
use scriptorium_core::{ChainConfig, ChallengeError};
use scriptorium_extract::{
    KeyExtractor, KeyPattern, PdftoppmRenderer, RecognitionOptions, TesseractRecognizer,
    DEFAULT_LABEL,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const ENV_CHALLENGE_ENDPOINT: &str = "SCRIPTORIUM_CHALLENGE_ENDPOINT";
pub(crate) const ENV_RETRY_ATTEMPTS: &str = "SCRIPTORIUM_RETRY_ATTEMPTS";
pub(crate) const ENV_RETRY_DELAY_MS: &str = "SCRIPTORIUM_RETRY_DELAY_MS";
pub(crate) const ENV_DOWNLOADS_DIR: &str = "SCRIPTORIUM_DOWNLOADS_DIR";
pub(crate) const ENV_KEY_LABEL: &str = "SCRIPTORIUM_KEY_LABEL";

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value `{value}` for {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid key label `{label}`: {reason}")]
    KeyLabel { label: String, reason: String },

    #[error(transparent)]
    Challenge(#[from] ChallengeError),
}

/// Rendering and recognition settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct OcrSettings {
    pub(crate) pdftoppm: PathBuf,
    pub(crate) tesseract: PathBuf,
    pub(crate) language: String,
    pub(crate) key_label: String,
    pub(crate) render_timeout_ms: u64,
    pub(crate) recognize_timeout_ms: u64,
    /// Parent of per-extraction scratch directories; system temp dir if unset
    pub(crate) scratch_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            pdftoppm: PathBuf::from("pdftoppm"),
            tesseract: PathBuf::from("tesseract"),
            language: RecognitionOptions::default().language,
            key_label: DEFAULT_LABEL.to_string(),
            render_timeout_ms: 60_000,
            recognize_timeout_ms: 120_000,
            scratch_dir: None,
        }
    }
}

/// Everything a run needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) chain: ChainConfig,
    pub(crate) challenge: ChallengeConfig,
    pub(crate) ocr: OcrSettings,
    pub(crate) downloads_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            challenge: ChallengeConfig::default(),
            ocr: OcrSettings::default(),
            downloads_dir: PathBuf::from("downloads"),
        }
    }
}

impl Settings {
    /// Load from `path` (if any) and the process environment
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides; `lookup` returns the value of a variable if set
    pub(crate) fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(endpoint) = lookup(ENV_CHALLENGE_ENDPOINT) {
            self.challenge.endpoint = Some(endpoint);
        }
        if let Some(value) = lookup(ENV_RETRY_ATTEMPTS) {
            self.chain.retry.max_attempts = parse_env(ENV_RETRY_ATTEMPTS, value)?;
        }
        if let Some(value) = lookup(ENV_RETRY_DELAY_MS) {
            self.chain.retry.delay_ms = parse_env(ENV_RETRY_DELAY_MS, value)?;
        }
        if let Some(dir) = lookup(ENV_DOWNLOADS_DIR) {
            self.downloads_dir = PathBuf::from(dir);
        }
        if let Some(label) = lookup(ENV_KEY_LABEL) {
            self.ocr.key_label = label;
        }
        Ok(())
    }

    /// Extractor backed by `pdftoppm` and `tesseract`
    pub(crate) fn key_extractor(&self) -> Result<KeyExtractor, ConfigError> {
        let ocr = &self.ocr;
        let pattern = KeyPattern::new(&ocr.key_label).map_err(|e| ConfigError::KeyLabel {
            label: ocr.key_label.clone(),
            reason: e.to_string(),
        })?;
        let renderer = PdftoppmRenderer::new(&ocr.pdftoppm)
            .with_timeout(Duration::from_millis(ocr.render_timeout_ms));
        let recognizer = TesseractRecognizer::new(&ocr.tesseract)
            .with_timeout(Duration::from_millis(ocr.recognize_timeout_ms));

        let mut extractor = KeyExtractor::new(Arc::new(renderer), Arc::new(recognizer))
            .with_pattern(pattern)
            .with_options(RecognitionOptions::default().with_language(&ocr.language));
        if let Some(dir) = &ocr.scratch_dir {
            extractor = extractor.with_scratch_root(dir);
        }
        Ok(extractor)
    }

    /// Challenge client for the configured endpoint
    pub(crate) fn challenge_resolver(&self) -> Result<ChallengeResolver, ConfigError> {
        Ok(ChallengeResolver::new(&self.challenge)?)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}
