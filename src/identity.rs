//! Stable identities for anonymous status bar items
//!
//! Items carry no id of their own, so one is derived from their class list
//! (`name`) plus a first-seen counter (`index`) and stamped onto the item.
//! Later scans read the stamp back instead of recomputing it.

use anyhow::{anyhow, Context, Result};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::bar::BarItem;
use crate::constants::{attributes, classes};

/// Composite key `(name, index)`, serialized as `name;index`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    pub name: String,
    pub index: u32,
}

impl ElementId {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.name, self.index)
    }
}

impl FromStr for ElementId {
    type Err = anyhow::Error;

    /// Names may themselves contain `;`, so only the last segment is the index
    fn from_str(s: &str) -> Result<Self> {
        let (name, index) = s
            .rsplit_once(';')
            .ok_or_else(|| anyhow!("Element id '{s}' has no index segment"))?;
        let index = index
            .trim()
            .parse::<u32>()
            .with_context(|| format!("Element id '{s}' has a non-numeric index"))?;
        Ok(Self::new(name, index))
    }
}

/// A live item together with the identity resolved for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub id: ElementId,
    /// Serialized id, as used for status map keys
    pub key: String,
    /// Position of the item in the live collection
    pub slot: usize,
}

/// Join the item's classes, minus host utility classes and our hidden marker
pub fn derive_name(item_classes: &[String]) -> String {
    item_classes
        .iter()
        .filter(|c| !classes::IGNORED.contains(&c.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(classes::NAME_SEPARATOR)
}

/// Resolve (and stamp where missing) the identity of every live item.
///
/// Stamped items keep their id. Unstamped items get `name` from their classes
/// and the next index above every index already present for that name, so two
/// live items never end up sharing an id.
pub fn resolve_identities<I: BarItem>(items: &mut [I]) -> Vec<ResolvedItem> {
    let mut stamped: Vec<Option<ElementId>> = Vec::with_capacity(items.len());
    let mut taken: HashSet<ElementId> = HashSet::new();
    let mut highest: HashMap<String, u32> = HashMap::new();

    for item in items.iter() {
        let id = item
            .attribute(attributes::ELEMENT_ID)
            .and_then(|raw| match raw.parse::<ElementId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(stamp = %raw, error = %e, "Ignoring malformed identity stamp");
                    None
                }
            })
            // A second item carrying the same stamp gets a fresh identity
            .filter(|id| !taken.contains(id));

        if let Some(id) = &id {
            let max = highest.entry(id.name.clone()).or_insert(0);
            *max = (*max).max(id.index);
            taken.insert(id.clone());
        }
        stamped.push(id);
    }

    let mut resolved = Vec::with_capacity(items.len());
    for (slot, (item, id)) in items.iter_mut().zip(stamped).enumerate() {
        let id = match id {
            Some(id) => id,
            None => {
                let name = derive_name(&item.classes());
                let max = highest.entry(name.clone()).or_insert(0);
                *max += 1;
                let id = ElementId::new(name, *max);
                item.set_attribute(attributes::ELEMENT_ID, &id.to_string());
                debug!(id = %id, slot = slot, "Stamped identity onto status bar item");
                taken.insert(id.clone());
                id
            }
        };

        resolved.push(ResolvedItem {
            key: id.to_string(),
            id,
            slot,
        });
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::MemoryItem;

    #[test]
    fn test_element_id_round_trip_with_semicolons_in_name() {
        let id: ElementId = "plugin-a;b;3".parse().unwrap();
        assert_eq!(id, ElementId::new("plugin-a;b", 3));
        assert_eq!(id.to_string(), "plugin-a;b;3");
    }

    #[test]
    fn test_element_id_rejects_malformed() {
        assert!("plugin-clock".parse::<ElementId>().is_err());
        assert!("plugin-clock;x".parse::<ElementId>().is_err());
    }

    #[test]
    fn test_derive_name_skips_ignored_classes() {
        let classes = vec![
            "status-bar-item".to_string(),
            "plugin-word-count".to_string(),
            "mod-clickable".to_string(),
            "extra".to_string(),
        ];
        assert_eq!(derive_name(&classes), "plugin-word-count-extra");
    }

    #[test]
    fn test_hidden_marker_does_not_change_identity() {
        let mut plain = vec![MemoryItem::new(&["plugin-sync"])];
        let mut hidden = vec![MemoryItem::new(&["plugin-sync", classes::HIDDEN])];

        let a = resolve_identities(&mut plain);
        let b = resolve_identities(&mut hidden);
        assert_eq!(a[0].id, b[0].id);
    }

    #[test]
    fn test_same_name_items_get_distinct_indices() {
        let mut items = vec![
            MemoryItem::new(&["plugin-x"]),
            MemoryItem::new(&["plugin-y"]),
            MemoryItem::new(&["plugin-x"]),
            MemoryItem::new(&["plugin-x"]),
        ];

        let resolved = resolve_identities(&mut items);
        let keys: Vec<&str> = resolved.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["plugin-x;1", "plugin-y;1", "plugin-x;2", "plugin-x;3"]);
        assert_eq!(items[2].stamped_id(), Some("plugin-x;2"));
    }

    #[test]
    fn test_resolution_is_stable_across_scans() {
        let mut items = vec![MemoryItem::new(&["plugin-x"]), MemoryItem::new(&["plugin-x"])];
        let first = resolve_identities(&mut items);

        // Class list changes transiently; the stamp wins
        items[0].classes.push("is-loading".to_string());
        let second = resolve_identities(&mut items);

        assert_eq!(first, second);
    }

    #[test]
    fn test_new_item_before_stamped_one_does_not_collide() {
        let mut items = vec![MemoryItem::new(&["plugin-x"])];
        resolve_identities(&mut items);

        // Another plugin inserts a same-named item in front of the stamped one
        items.insert(0, MemoryItem::new(&["plugin-x"]));
        let resolved = resolve_identities(&mut items);

        assert_eq!(resolved[0].key, "plugin-x;2");
        assert_eq!(resolved[1].key, "plugin-x;1");
    }

    #[test]
    fn test_duplicate_stamp_is_reassigned() {
        let mut items = vec![MemoryItem::new(&["plugin-x"])];
        resolve_identities(&mut items);
        let clone = items[0].clone();
        items.push(clone);

        let resolved = resolve_identities(&mut items);
        assert_eq!(resolved[0].key, "plugin-x;1");
        assert_eq!(resolved[1].key, "plugin-x;2");
    }
}
