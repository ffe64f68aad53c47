//! Key extraction for Scriptorium
//!
//! Recovers the access key printed inside a manuscript:
//! 1. **Render** page 1 of the artifact to an image
//! 2. **Recognize** the image with a restricted character allowlist
//! 3. **Match** `<label>: <KEY>` in the recognized text
//!
//! Every call works in its own scratch directory, removed on every exit path.
//!
//! # Example
//!
//! ```rust,ignore
//! use scriptorium_extract::{KeyExtractor, PdftoppmRenderer, TesseractRecognizer};
//! use std::sync::Arc;
//!
//! let extractor = KeyExtractor::new(
//!     Arc::new(PdftoppmRenderer::default()),
//!     Arc::new(TesseractRecognizer::default()),
//! );
//! let key = extractor.extract(&artifact).await?;
//! ```

#![warn(unreachable_pub)]

pub mod extractor;
pub mod pattern;
mod process;
pub mod recognize;
pub mod render;

pub use extractor::KeyExtractor;
pub use pattern::{KeyPattern, DEFAULT_LABEL};
pub use recognize::{RecognitionOptions, Recognizer, TesseractRecognizer, DEFAULT_ALLOWLIST};
pub use render::{PdftoppmRenderer, Renderer};
