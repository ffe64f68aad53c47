//! Acquisition strategy selection
//!
//! The path used to obtain an item's artifact is a pure function of the
//! item's position in the chain and of its listing group:
//!
//! | Position | Group | Strategy |
//! |----------|-------|----------|
//! | first | any known | `Initial` |
//! | later | `layout.direct` | `DirectUnlock` |
//! | later | `layout.challenge` | `ChallengeUnlock` |
//! | any | unknown | configuration error |

use crate::error::{ChainError, StepError};
use crate::ports::{Acquirer, ChallengeSource};
use crate::types::{ArtifactRef, GroupLayout, Item};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy selected for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Download directly, no code
    Initial,
    /// Submit the previous key as the unlock code
    DirectUnlock,
    /// Turn the previous key into a code through the challenge service
    ChallengeUnlock,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "initial",
            Self::DirectUnlock => "direct-unlock",
            Self::ChallengeUnlock => "challenge-unlock",
        };
        f.pad(name)
    }
}

/// Select the strategy for the item at `index`
///
/// # Errors
/// `ChainError::UnmappedGroup` if the item's group is not part of `layout`.
pub fn select(index: usize, item: &Item, layout: &GroupLayout) -> Result<StrategyKind, ChainError> {
    if !layout.contains(item.group) {
        return Err(ChainError::UnmappedGroup {
            title: item.title.clone(),
            group: item.group,
        });
    }

    if index == 0 {
        Ok(StrategyKind::Initial)
    } else if item.group == layout.direct {
        Ok(StrategyKind::DirectUnlock)
    } else {
        Ok(StrategyKind::ChallengeUnlock)
    }
}

/// Select strategies for a whole chain, failing on the first unmapped item
///
/// # Errors
/// See [`select`].
pub fn plan(items: &[Item], layout: &GroupLayout) -> Result<Vec<StrategyKind>, ChainError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| select(index, item, layout))
        .collect()
}

/// A strategy bound to the code it needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition<'a> {
    /// Download directly
    Initial,
    /// Submit `code` in place, then download
    DirectUnlock {
        /// Key recovered from the previous item
        code: &'a str,
    },
    /// Derive a code from `previous_key`, submit it, then download
    ChallengeUnlock {
        /// Key recovered from the previous item
        previous_key: &'a str,
    },
}

impl<'a> Acquisition<'a> {
    /// Bind a strategy to the previous item's key
    ///
    /// Returns `None` when the strategy needs a key and there is none.
    #[must_use]
    pub fn bind(kind: StrategyKind, previous_key: Option<&'a str>) -> Option<Self> {
        match kind {
            StrategyKind::Initial => Some(Self::Initial),
            StrategyKind::DirectUnlock => previous_key.map(|code| Self::DirectUnlock { code }),
            StrategyKind::ChallengeUnlock => {
                previous_key.map(|previous_key| Self::ChallengeUnlock { previous_key })
            }
        }
    }

    /// Strategy this acquisition was bound from
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Initial => StrategyKind::Initial,
            Self::DirectUnlock { .. } => StrategyKind::DirectUnlock,
            Self::ChallengeUnlock { .. } => StrategyKind::ChallengeUnlock,
        }
    }

    /// Perform one acquisition attempt
    ///
    /// # Returns
    /// `Ok(None)` for a soft miss (no artifact, or the challenge gave no code)
    ///
    /// # Errors
    /// Collaborator failures, wrapped in [`StepError`]
    pub async fn execute(
        &self,
        title: &str,
        acquirer: &dyn Acquirer,
        challenge: &dyn ChallengeSource,
    ) -> Result<Option<ArtifactRef>, StepError> {
        match *self {
            Self::Initial => Ok(acquirer.acquire_initial(title).await?),
            Self::DirectUnlock { code } => Ok(acquirer.acquire_with_code(title, code).await?),
            Self::ChallengeUnlock { previous_key } => {
                let Some(derived) = challenge.resolve(title, previous_key).await? else {
                    tracing::warn!(title, "Challenge produced no code");
                    return Ok(None);
                };
                tracing::debug!(title, "Challenge code derived");
                Ok(acquirer
                    .acquire_with_challenge_code(title, &derived)
                    .await?)
            }
        }
    }
}
