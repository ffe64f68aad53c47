//! Chain discovery
//!
//! Visits every listing page, turns the cards into [`Item`]s and returns them
//! in chain order.

use crate::error::ChainError;
use crate::ordering::sort_chain;
use crate::ports::{Lister, Navigator};
use crate::types::{Group, Item};
use std::collections::HashSet;

/// Discover all items on `groups` and sort them into chain order
///
/// Pages are visited in the order given; cards keep their on-page order, which
/// is what ties in the ordering key fall back to.
///
/// # Errors
/// - `ChainError::Discovery` if positioning or listing fails
/// - `ChainError::Ordering` if a card carries an unreadable label
/// - `ChainError::DuplicateTitle` if two cards share a title
pub async fn discover_chain(
    navigator: &dyn Navigator,
    lister: &dyn Lister,
    groups: &[Group],
) -> Result<Vec<Item>, ChainError> {
    let mut items = Vec::new();
    let mut seen = HashSet::new();

    for &group in groups {
        navigator.goto_context(group).await?;
        let found = lister.discover(group).await?;
        tracing::info!(%group, cards = found.len(), "Listing read");

        for discovered in found {
            if !seen.insert(discovered.title.clone()) {
                return Err(ChainError::DuplicateTitle(discovered.title));
            }
            items.push(Item::from_discovered(discovered)?);
        }
    }

    sort_chain(&mut items);
    tracing::debug!(
        order = ?items.iter().map(|i| i.title.as_str()).collect::<Vec<_>>(),
        "Chain order"
    );
    Ok(items)
}
