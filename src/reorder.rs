//! Apply a preset's order and visibility to the live status bar
//!
//! Items are never moved inside the host's container. Each one gets a rank
//! written as an ordering hint instead, so other plugins holding references
//! to their items never see them detached or re-inserted.

use tracing::debug;

use crate::bar::BarItem;
use crate::config::BarStatus;
use crate::identity::{resolve_identities, ResolvedItem};

/// Rank every live item by `status` and show/hide it. Returns the item keys
/// in rank order.
///
/// Known items are ranked by position (ties keep live order); items the
/// status has no record of follow in live order and are always shown.
pub fn apply_order<I: BarItem>(items: &mut [I], status: &BarStatus) -> Vec<String> {
    let resolved = resolve_identities(items);

    let mut known: Vec<(i64, &ResolvedItem)> = Vec::new();
    let mut unknown: Vec<&ResolvedItem> = Vec::new();

    for item in &resolved {
        match status.get(&item.key) {
            Some(record) => {
                items[item.slot].set_hidden(!record.visible);
                known.push((record.position, item));
            }
            None => {
                items[item.slot].set_hidden(false);
                unknown.push(item);
            }
        }
    }

    known.sort_by_key(|(position, _)| *position);

    let ranked: Vec<&ResolvedItem> = known
        .into_iter()
        .map(|(_, item)| item)
        .chain(unknown)
        .collect();

    for (rank, item) in ranked.iter().enumerate() {
        items[item.slot].set_order(rank as u32 + 1);
    }

    debug!(items = ranked.len(), "Applied status bar order");
    ranked.into_iter().map(|item| item.key.clone()).collect()
}
