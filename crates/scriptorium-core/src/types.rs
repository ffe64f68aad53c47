//! Core types for Scriptorium
//!
//! Defines the fundamental types for chain resolution:
//! - Items and the listing group they were found on
//! - Artifact references handed back by acquisition
//! - Chain configuration
//! - The per-run report

use crate::error::OrderingError;
use crate::ordering::ordering_key;
use crate::retry::RetryPolicy;
use crate::strategy::StrategyKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listing context an item was discovered on (the page number of the listing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(pub u32);

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {}", self.0)
    }
}

/// Opaque reference to an acquired artifact (a downloaded file)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(PathBuf);

impl ArtifactRef {
    /// Wrap a path
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Location of the artifact
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Raw listing entry as reported by a [`Lister`](crate::ports::Lister)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredItem {
    /// Title shown on the card
    pub title: String,
    /// Ordinal label, e.g. `Siglo XIV`
    pub ordering_label: String,
    /// Listing page the card was found on
    pub group: Group,
}

/// One manuscript in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique title within a run
    pub title: String,
    /// Listing page, decides the acquisition strategy
    pub group: Group,
    /// Label the ordering key was derived from
    pub ordering_label: String,
    /// Sort key; only used for ordering
    pub ordering_key: u32,
    /// Key recovered from this item's artifact; opens the next item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_key: Option<String>,
    /// Downloaded artifact, transient
    #[serde(skip)]
    pub artifact_ref: Option<ArtifactRef>,
}

impl Item {
    /// Create an item with an already computed ordering key
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        group: Group,
        ordering_label: impl Into<String>,
        ordering_key: u32,
    ) -> Self {
        Self {
            title: title.into(),
            group,
            ordering_label: ordering_label.into(),
            ordering_key,
            unlock_key: None,
            artifact_ref: None,
        }
    }

    /// Build an item from a listing entry, deriving the ordering key from its label
    ///
    /// # Errors
    /// Returns [`OrderingError`] when the label carries no valid numeral.
    pub fn from_discovered(discovered: DiscoveredItem) -> Result<Self, OrderingError> {
        let key = ordering_key(&discovered.ordering_label)?;
        Ok(Self::new(
            discovered.title,
            discovered.group,
            discovered.ordering_label,
            key,
        ))
    }
}

/// Which listing pages map to which unlock mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLayout {
    /// Items unlocked by typing the previous key
    pub direct: Group,
    /// Items unlocked through the remote challenge
    pub challenge: Group,
}

impl GroupLayout {
    /// Whether the group has a strategy at all
    #[inline]
    #[must_use]
    pub fn contains(&self, group: Group) -> bool {
        group == self.direct || group == self.challenge
    }

    /// Groups in listing order
    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        let mut groups = vec![self.direct, self.challenge];
        groups.sort();
        groups.dedup();
        groups
    }
}

impl Default for GroupLayout {
    fn default() -> Self {
        Self {
            direct: Group(1),
            challenge: Group(2),
        }
    }
}

/// Chain resolver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Group to strategy mapping
    pub layout: GroupLayout,
    /// Retry applied around every acquisition step
    pub retry: RetryPolicy,
}

impl ChainConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With group layout
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: GroupLayout) -> Self {
        self.layout = layout;
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Why an item could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The session could not be positioned on the item's listing page
    Navigation {
        /// Collaborator message
        message: String,
    },
    /// The previous item yielded no key, so there was nothing to submit
    MissingUnlockCode,
    /// Every attempt missed
    AttemptsExhausted {
        /// Attempts performed
        attempts: u32,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigation { message } => write!(f, "navigation failed: {message}"),
            Self::MissingUnlockCode => write!(f, "no unlock code from previous item"),
            Self::AttemptsExhausted { attempts } => {
                write!(f, "gave up after {attempts} attempts")
            }
        }
    }
}

/// Final status of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// Artifact acquired (and key recovered when a successor exists)
    Resolved,
    /// Item could not be resolved
    Failed {
        /// Failure detail
        reason: FailureReason,
    },
}

impl ItemStatus {
    /// Check if the item was resolved
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

/// Per-item record kept alongside the annotated item list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Item title
    pub title: String,
    /// Strategy selected for the item
    pub strategy: StrategyKind,
    /// What happened
    pub status: ItemStatus,
}

/// Result of one chain run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainReport {
    /// Run identifier
    pub run_id: RunId,
    /// When resolution started
    pub started_at: DateTime<Utc>,
    /// When resolution finished
    pub finished_at: DateTime<Utc>,
    /// Items in chain order, annotated with recovered keys
    pub items: Vec<Item>,
    /// One outcome per item, same order as `items`
    pub outcomes: Vec<ItemOutcome>,
}

impl ChainReport {
    /// First item that failed, i.e. where the chain broke
    #[must_use]
    pub fn first_failure(&self) -> Option<&ItemOutcome> {
        self.outcomes.iter().find(|o| !o.status.is_resolved())
    }

    /// Whether every item was resolved
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.first_failure().is_none()
    }

    /// Number of resolved items
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_resolved())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_from_discovered_derives_key() {
        let item = Item::from_discovered(DiscoveredItem {
            title: "Codex Seraphinianus".to_string(),
            ordering_label: "Siglo XIV".to_string(),
            group: Group(1),
        })
        .unwrap();

        assert_eq!(item.ordering_key, 14);
        assert!(item.unlock_key.is_none());
    }

    #[test]
    fn artifact_ref_not_serialized() {
        let mut item = Item::new("Necronomicon", Group(2), "Siglo XVIII", 18);
        item.artifact_ref = Some(ArtifactRef::new("/tmp/Necronomicon.pdf"));
        item.unlock_key = Some("K3Y".to_string());

        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("artifact_ref").is_none());
        assert_eq!(json["unlock_key"], "K3Y");
    }

    #[test]
    fn layout_groups_sorted_and_deduped() {
        let layout = GroupLayout {
            direct: Group(3),
            challenge: Group(1),
        };
        assert_eq!(layout.groups(), vec![Group(1), Group(3)]);
        assert!(layout.contains(Group(3)));
        assert!(!layout.contains(Group(2)));
    }

    #[test]
    fn config_from_partial_json() {
        let config: ChainConfig =
            serde_json::from_str(r#"{"retry": {"max_attempts": 2}}"#).unwrap();
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.delay_ms, 10_000);
        assert_eq!(config.layout, GroupLayout::default());
    }

    #[test]
    fn report_first_failure() {
        let report = ChainReport {
            run_id: RunId::new(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            items: vec![],
            outcomes: vec![
                ItemOutcome {
                    title: "a".to_string(),
                    strategy: StrategyKind::Initial,
                    status: ItemStatus::Resolved,
                },
                ItemOutcome {
                    title: "b".to_string(),
                    strategy: StrategyKind::DirectUnlock,
                    status: ItemStatus::Failed {
                        reason: FailureReason::AttemptsExhausted { attempts: 5 },
                    },
                },
            ],
        };

        assert!(!report.is_complete());
        assert_eq!(report.resolved_count(), 1);
        assert_eq!(report.first_failure().map(|o| o.title.as_str()), Some("b"));
    }
}
