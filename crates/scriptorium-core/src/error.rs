//! Error types for Scriptorium Core
//!
//! Provides error handling for:
//! - Setup failures that abort a run before any item is processed
//! - Ordering label parsing
//! - Collaborator failures (session, rendering, recognition, challenge)
//! - Single acquisition attempts

use crate::types::Group;
use std::path::PathBuf;
use std::time::Duration;

/// Fatal chain errors, raised before the first item is processed
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Missing or inconsistent configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An item sits on a listing page with no acquisition strategy
    #[error("no acquisition strategy for `{title}` on {group}")]
    UnmappedGroup {
        /// Offending item
        title: String,
        /// Its group
        group: Group,
    },

    /// Two listing entries share a title
    #[error("duplicate title: {0}")]
    DuplicateTitle(String),

    /// Ordering label could not be parsed
    #[error("ordering error: {0}")]
    Ordering(#[from] OrderingError),

    /// Listing or positioning failed during discovery
    #[error("discovery failed: {0}")]
    Discovery(#[from] CollaboratorError),

    /// Challenge collaborator unusable
    #[error("challenge unavailable: {0}")]
    Challenge(#[from] ChallengeError),
}

impl ChainError {
    /// Check if error is a configuration problem
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::UnmappedGroup { .. }
                | Self::Challenge(ChallengeError::EndpointNotConfigured)
                | Self::Challenge(ChallengeError::InvalidEndpoint(_))
        )
    }
}

/// Ordering label errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    /// Label has no numeral
    #[error("empty ordering label")]
    EmptyLabel,

    /// Label contains a character that is not a roman numeral
    #[error("invalid numeral `{label}`: unexpected `{symbol}`")]
    InvalidNumeral {
        /// Full label
        label: String,
        /// First bad character
        symbol: char,
    },
}

/// Errors reported by session collaborators (listing, navigation, acquisition)
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// Element or entry not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Collaborator did not answer in time
    #[error("operation timed out after {duration_ms}ms")]
    Timeout {
        /// Configured bound
        duration_ms: u64,
    },

    /// Session already released
    #[error("session closed")]
    SessionClosed,

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Key extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// Renderer reported a failure
    #[error("render failed: {0}")]
    Render(String),

    /// Renderer exceeded its time bound
    #[error("render timed out after {0:?}")]
    RenderTimeout(Duration),

    /// Renderer succeeded but left no image behind
    #[error("rendered image missing at {}", .0.display())]
    MissingImage(PathBuf),

    /// Recognition engine failed
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// Recognized text has no access-key pattern
    #[error("no access key pattern in recognized text")]
    PatternNotFound {
        /// Recognized text, kept for diagnostics
        text: String,
    },

    /// Scratch directory handling failed
    #[error("scratch I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Challenge service errors
#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    /// No endpoint configured
    #[error("challenge endpoint is not configured")]
    EndpointNotConfigured,

    /// Endpoint is not a valid URL
    #[error("invalid challenge endpoint `{0}`")]
    InvalidEndpoint(String),

    /// Response points outside the vault
    #[error("challenge target {index} is out of range for a vault of {len}")]
    TargetOutOfRange {
        /// Offending index
        index: usize,
        /// Vault length
        len: usize,
    },
}

/// Failure of a single acquisition attempt
///
/// Never escapes [`RetryPolicy`](crate::retry::RetryPolicy); it is only logged.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Acquisition collaborator failed
    #[error("acquisition failed: {0}")]
    Acquire(#[from] CollaboratorError),

    /// Key could not be extracted from the artifact
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractionError),

    /// Challenge could not be resolved
    #[error("challenge failed: {0}")]
    Challenge(#[from] ChallengeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_error_display() {
        let err = ChainError::UnmappedGroup {
            title: "Liber Linteus".to_string(),
            group: Group(7),
        };
        assert_eq!(
            err.to_string(),
            "no acquisition strategy for `Liber Linteus` on page 7"
        );
    }

    #[test]
    fn chain_error_is_configuration() {
        assert!(ChainError::Configuration("x".to_string()).is_configuration());
        assert!(ChainError::from(ChallengeError::EndpointNotConfigured).is_configuration());
        assert!(!ChainError::DuplicateTitle("x".to_string()).is_configuration());
    }

    #[test]
    fn step_error_wraps_sources() {
        let err = StepError::from(ExtractionError::PatternNotFound {
            text: "nada".to_string(),
        });
        assert!(err.to_string().starts_with("extraction failed"));
    }
}
