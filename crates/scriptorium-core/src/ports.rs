//! Collaborator interfaces
//!
//! The chain resolver never touches a browser, a renderer or the network
//! directly. Everything it needs is injected through these traits, so a run
//! can be driven by a live session, a local catalog, or test fakes.

use crate::error::{ChallengeError, CollaboratorError, ExtractionError};
use crate::types::{ArtifactRef, DiscoveredItem, Group};
use async_trait::async_trait;

/// Reads the entries of one listing page
#[async_trait]
pub trait Lister: Send + Sync {
    /// List the cards of `group`; the session is already positioned there
    async fn discover(&self, group: Group) -> Result<Vec<DiscoveredItem>, CollaboratorError>;
}

/// Positions the session on a listing page
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Make `group` the page subsequent operations act on
    async fn goto_context(&self, group: Group) -> Result<(), CollaboratorError>;
}

/// Obtains artifacts, optionally unlocking them first
///
/// Every method returns `Ok(None)` when the artifact could not be obtained
/// this time (card missing, code rejected, download never started).
#[async_trait]
pub trait Acquirer: Send + Sync {
    /// Download an item that needs no code
    async fn acquire_initial(&self, title: &str) -> Result<Option<ArtifactRef>, CollaboratorError>;

    /// Type `code` into the item's unlock form, then download
    async fn acquire_with_code(
        &self,
        title: &str,
        code: &str,
    ) -> Result<Option<ArtifactRef>, CollaboratorError>;

    /// Unlock with a challenge-derived code, then download
    async fn acquire_with_challenge_code(
        &self,
        title: &str,
        derived_code: &str,
    ) -> Result<Option<ArtifactRef>, CollaboratorError>;
}

/// Recovers the key hidden in an artifact
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Extract the key from `artifact`
    async fn extract(&self, artifact: &ArtifactRef) -> Result<String, ExtractionError>;
}

/// Derives a code through the remote challenge
#[async_trait]
pub trait ChallengeSource: Send + Sync {
    /// Fail fast if the service cannot be used at all
    fn ensure_configured(&self) -> Result<(), ChallengeError>;

    /// Derive the code for `title` from `previous_key`
    ///
    /// `Ok(None)` is a soft miss that the caller may retry.
    async fn resolve(&self, title: &str, previous_key: &str)
        -> Result<Option<String>, ChallengeError>;
}

/// A session that must be released when a run ends
#[async_trait]
pub trait Session: Send + Sync {
    /// Release the session; called once on every exit path
    async fn close(&self) -> Result<(), CollaboratorError>;
}
