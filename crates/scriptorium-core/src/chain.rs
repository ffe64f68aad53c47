//! Chain resolver
//!
//! Walks the ordered items once, strictly sequentially:
//! - Positions the session on the item's listing page
//! - Binds the item's strategy to the key recovered from the previous item
//! - Runs challenge, acquisition and extraction as one retried step
//! - Stores the recovered key on the item for its successor
//!
//! A failed item never aborts the run. Its successor has no code and fails
//! in turn, so the report shows exactly where the chain broke.

use crate::error::{ChainError, StepError};
use crate::ports::{Acquirer, ChallengeSource, KeySource, Navigator};
use crate::strategy::{self, Acquisition, StrategyKind};
use crate::types::{
    ArtifactRef, ChainConfig, ChainReport, FailureReason, Item, ItemOutcome, ItemStatus, RunId,
};
use chrono::Utc;
use std::sync::Arc;

/// What one successful attempt produced
#[derive(Debug)]
struct StepOutput {
    artifact: ArtifactRef,
    key: Option<String>,
}

/// Resolves a chain of locked items
///
/// Owns its collaborators through shared handles so the same session can
/// also serve discovery and be closed by the harness afterwards.
pub struct ChainResolver {
    navigator: Arc<dyn Navigator>,
    acquirer: Arc<dyn Acquirer>,
    keys: Arc<dyn KeySource>,
    challenge: Arc<dyn ChallengeSource>,
    config: ChainConfig,
}

impl ChainResolver {
    /// Create a resolver with default configuration
    #[must_use]
    pub fn new(
        navigator: Arc<dyn Navigator>,
        acquirer: Arc<dyn Acquirer>,
        keys: Arc<dyn KeySource>,
        challenge: Arc<dyn ChallengeSource>,
    ) -> Self {
        Self {
            navigator,
            acquirer,
            keys,
            challenge,
            config: ChainConfig::default(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Resolve an ordered chain
    ///
    /// # Arguments
    /// * `items` - Items already sorted into chain order
    ///
    /// # Returns
    /// Report with every item, annotated with the keys that were recovered
    ///
    /// # Errors
    /// Only setup problems detected before the first item:
    /// - `ChainError::UnmappedGroup` if an item has no strategy
    /// - `ChainError::Challenge` if the chain needs the challenge service and
    ///   it is not configured
    pub async fn resolve(&self, mut items: Vec<Item>) -> Result<ChainReport, ChainError> {
        let started_at = Utc::now();
        let run_id = RunId::new();

        let kinds = strategy::plan(&items, &self.config.layout)?;
        if kinds.contains(&StrategyKind::ChallengeUnlock) {
            self.challenge.ensure_configured()?;
        }

        tracing::info!(run = %run_id, items = items.len(), "Resolving chain");

        let mut outcomes = Vec::with_capacity(items.len());
        for (index, kind) in kinds.into_iter().enumerate() {
            let status = self.resolve_item(&mut items, index, kind).await;
            if let ItemStatus::Failed { reason } = &status {
                tracing::warn!(
                    run = %run_id,
                    title = %items[index].title,
                    %reason,
                    "Item not resolved"
                );
            }
            outcomes.push(ItemOutcome {
                title: items[index].title.clone(),
                strategy: kind,
                status,
            });
        }

        let report = ChainReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            items,
            outcomes,
        };
        tracing::info!(
            run = %run_id,
            resolved = report.resolved_count(),
            total = report.items.len(),
            "Chain finished"
        );
        Ok(report)
    }

    /// Process `items[index]`, writing only to that slot
    async fn resolve_item(&self, items: &mut [Item], index: usize, kind: StrategyKind) -> ItemStatus {
        let needs_key = index + 1 < items.len();
        let (done, rest) = items.split_at_mut(index);
        let previous_key = done.last().and_then(|prev| prev.unlock_key.as_deref());
        let item = &mut rest[0];

        tracing::info!(title = %item.title, label = %item.ordering_label, strategy = %kind, "Processing item");

        if let Err(e) = self.navigator.goto_context(item.group).await {
            return ItemStatus::Failed {
                reason: FailureReason::Navigation {
                    message: e.to_string(),
                },
            };
        }

        let Some(acquisition) = Acquisition::bind(kind, previous_key) else {
            return ItemStatus::Failed {
                reason: FailureReason::MissingUnlockCode,
            };
        };

        let title = item.title.as_str();
        let retry = self.config.retry;
        let step = retry
            .run(title, move || self.attempt(title, acquisition, needs_key))
            .await;

        match step {
            Some(StepOutput { artifact, key }) => {
                tracing::info!(title = %item.title, artifact = %artifact, "Artifact acquired");
                if let Some(key) = &key {
                    tracing::info!(title = %item.title, key = %key, "Key recovered");
                }
                item.artifact_ref = Some(artifact);
                item.unlock_key = key;
                ItemStatus::Resolved
            }
            None => ItemStatus::Failed {
                reason: FailureReason::AttemptsExhausted {
                    attempts: retry.attempts(),
                },
            },
        }
    }

    /// One attempt: acquire, then extract the key when a successor needs it
    async fn attempt(
        &self,
        title: &str,
        acquisition: Acquisition<'_>,
        needs_key: bool,
    ) -> Result<Option<StepOutput>, StepError> {
        let Some(artifact) = acquisition
            .execute(title, self.acquirer.as_ref(), self.challenge.as_ref())
            .await?
        else {
            return Ok(None);
        };

        let key = if needs_key {
            Some(self.keys.extract(&artifact).await?)
        } else {
            None
        };

        Ok(Some(StepOutput { artifact, key }))
    }
}

impl std::fmt::Debug for ChainResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
