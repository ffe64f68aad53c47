//! Scriptorium Core - chain resolution for locked manuscripts
//!
//! Each manuscript in a collection is locked with a code that is hidden inside
//! the previous manuscript. This crate owns the part that decides:
//! - In which order the manuscripts are visited
//! - Which acquisition strategy opens each one
//! - How transient acquisition failures are retried
//! - Where the recovered key is stored for the next step
//!
//! Browsing, rendering, recognition and the remote challenge service are
//! collaborators injected through the traits in [`ports`].
//!
//! # Example
//!
//! ```rust,ignore
//! use scriptorium_core::prelude::*;
//!
//! # async fn example(
//! #     session: std::sync::Arc<MySession>,
//! #     keys: std::sync::Arc<dyn KeySource>,
//! #     challenge: std::sync::Arc<dyn ChallengeSource>,
//! # ) -> Result<(), ChainError> {
//! let items = discover_chain(session.as_ref(), session.as_ref(), &[Group(1), Group(2)]).await?;
//!
//! let resolver = ChainResolver::new(session.clone(), session, keys, challenge)
//!     .with_config(ChainConfig::new());
//! let report = resolver.resolve(items).await?;
//!
//! println!("resolved {} of {}", report.resolved_count(), report.items.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod chain;
pub mod discovery;
pub mod error;
pub mod ordering;
pub mod ports;
pub mod retry;
pub mod strategy;
pub mod types;

// Re-exports for convenience
pub use chain::ChainResolver;
pub use discovery::discover_chain;
pub use error::{
    ChainError, ChallengeError, CollaboratorError, ExtractionError, OrderingError, StepError,
};
pub use ordering::{ordering_key, roman_to_int, sort_chain};
pub use ports::{Acquirer, ChallengeSource, KeySource, Lister, Navigator, Session};
pub use retry::RetryPolicy;
pub use strategy::{Acquisition, StrategyKind};
pub use types::{
    ArtifactRef, ChainConfig, ChainReport, DiscoveredItem, FailureReason, Group, GroupLayout,
    Item, ItemOutcome, ItemStatus, RunId,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Scriptorium Core
    pub use crate::{
        discover_chain, Acquirer, ArtifactRef, ChainConfig, ChainError, ChainReport,
        ChainResolver, ChallengeSource, Group, Item, KeySource, Lister, Navigator, RetryPolicy,
        Session,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
