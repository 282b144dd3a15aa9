//! Merge of saved preset status with the live status bar
//!
//! Produces the ordered rows shown in the settings screen and the canonical
//! status map that gets written back into the active preset. Items the preset
//! has never seen are appended after everything it knows; ids it knows but
//! the bar no longer has become orphan rows.

use std::collections::HashSet;
use tracing::debug;

use crate::bar::BarItem;
use crate::config::{BarStatus, ElementStatus};
use crate::identity::{resolve_identities, ElementId};

/// One entry of the ordered view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: ElementId,
    /// Serialized id, the key into the status map
    pub key: String,
    /// False for orphans: known to the preset, absent from the bar
    pub exists: bool,
    /// Rendered content of the live item
    pub preview: Option<String>,
}

/// Result of a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Live rows and orphan rows, ascending by position
    pub rows: Vec<Row>,
    /// Canonical status for the active preset
    pub status: BarStatus,
}

/// Reconcile the live items against a preset's saved status.
///
/// Rows sharing a position keep live order, the same order the reorder pass
/// gives their items on the bar. Orphans sort after every live item of their
/// position.
pub fn reconcile<I: BarItem>(items: &mut [I], saved: &BarStatus) -> Reconciliation {
    let live = resolve_identities(items);
    let live_keys: HashSet<&str> = live.iter().map(|r| r.key.as_str()).collect();

    let mut status = saved.clone();
    // (position, tiebreak) per row
    let mut rows: Vec<((i64, usize), Row)> = Vec::with_capacity(live.len() + saved.len());

    let mut next = saved.values().map(|s| s.position).max().map_or(0, |max| max + 1);
    for resolved in &live {
        let position = match saved.get(&resolved.key) {
            Some(record) => record.position,
            None => {
                debug!(id = %resolved.key, position = next, "Appending newly seen item");
                status.insert(resolved.key.clone(), ElementStatus::new(next, true));
                next += 1;
                next - 1
            }
        };
        rows.push((
            (position, resolved.slot),
            Row {
                id: resolved.id.clone(),
                key: resolved.key.clone(),
                exists: true,
                preview: items[resolved.slot].text(),
            },
        ));
    }

    let orphans = saved
        .iter()
        .filter(|(key, _)| !live_keys.contains(key.as_str()));
    for (seq, (key, record)) in orphans.enumerate() {
        rows.push((
            (record.position, live.len() + seq),
            Row {
                id: placeholder_id(key),
                key: key.clone(),
                exists: false,
                preview: None,
            },
        ));
    }

    rows.sort_by_key(|(rank, _)| *rank);

    Reconciliation {
        rows: rows.into_iter().map(|(_, row)| row).collect(),
        status,
    }
}

/// Orphans have no live item to read from, so their identity comes from the key
fn placeholder_id(key: &str) -> ElementId {
    key.parse().unwrap_or_else(|_| ElementId::new(key, 0))
}

impl Reconciliation {
    pub fn row_index(&self, key: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.key == key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.rows.iter().any(|row| row.key == key && row.exists)
    }

    pub fn orphans(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| !row.exists)
    }

    /// Flip visibility of a live row. Returns the new visibility.
    pub fn toggle_visibility(&mut self, key: &str) -> Option<bool> {
        if !self.exists(key) {
            return None;
        }
        let record = self.status.get_mut(key)?;
        record.visible = !record.visible;
        Some(record.visible)
    }

    /// Forget an orphan and close the gap it leaves. Live rows are refused.
    pub fn remove_orphan(&mut self, key: &str) -> bool {
        let Some(index) = self.row_index(key) else {
            return false;
        };
        if self.rows[index].exists {
            return false;
        }

        self.rows.remove(index);
        self.status.remove(key);
        self.renumber();
        true
    }

    /// Move the row at `from` one step towards `to`. Returns the index of
    /// the row it passed, or `None` if nothing moved.
    pub fn step_row(&mut self, from: usize, to: usize) -> Option<usize> {
        if from >= self.rows.len() || from == to {
            return None;
        }
        let passed = if to > from { from + 1 } else { from - 1 };
        if passed >= self.rows.len() {
            return None;
        }

        self.rows.swap(from, passed);
        self.renumber();
        Some(passed)
    }

    /// Positions become display indices
    pub fn renumber(&mut self) {
        for (index, row) in self.rows.iter().enumerate() {
            if let Some(record) = self.status.get_mut(&row.key) {
                record.position = index as i64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::MemoryItem;

    fn stamped(name: &str) -> MemoryItem {
        let mut item = MemoryItem::new(&[name]);
        item.attributes.insert(
            crate::constants::attributes::ELEMENT_ID.to_string(),
            format!("{name};1"),
        );
        item
    }

    fn keys(recon: &Reconciliation) -> Vec<&str> {
        recon.rows.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn test_saved_order_wins_and_new_items_append() {
        let saved = BarStatus::from([
            ("A;1".to_string(), ElementStatus::new(0, true)),
            ("B;1".to_string(), ElementStatus::new(1, false)),
        ]);
        let mut items = vec![stamped("B"), stamped("A"), stamped("C")];

        let recon = reconcile(&mut items, &saved);

        assert_eq!(keys(&recon), vec!["A;1", "B;1", "C;1"]);
        assert!(recon.status["A;1"].visible);
        assert!(!recon.status["B;1"].visible);
        assert_eq!(recon.status["C;1"], ElementStatus::new(2, true));
    }

    #[test]
    fn test_missing_saved_id_becomes_orphan() {
        let saved = BarStatus::from([
            ("A;1".to_string(), ElementStatus::new(0, true)),
            ("X;1".to_string(), ElementStatus::new(1, true)),
        ]);
        let mut items = vec![stamped("A")];

        let recon = reconcile(&mut items, &saved);

        assert_eq!(keys(&recon), vec!["A;1", "X;1"]);
        assert!(recon.exists("A;1"));
        assert!(!recon.exists("X;1"));
        assert_eq!(recon.rows[1].id, ElementId::new("X", 1));
        assert_eq!(recon.orphans().count(), 1);
    }

    #[test]
    fn test_every_live_item_and_orphan_appears_once() {
        let saved = BarStatus::from([
            ("gone;1".to_string(), ElementStatus::new(5, true)),
            ("plugin-a;1".to_string(), ElementStatus::new(5, true)),
        ]);
        let mut items = vec![
            MemoryItem::new(&["plugin-a"]),
            MemoryItem::new(&["plugin-a"]),
            MemoryItem::new(&["plugin-b"]),
        ];

        let recon = reconcile(&mut items, &saved);

        let mut seen = keys(&recon);
        seen.sort();
        assert_eq!(seen, vec!["gone;1", "plugin-a;1", "plugin-a;2", "plugin-b;1"]);
        assert_eq!(recon.status.len(), 4);
        // New items start above the highest saved position
        assert_eq!(recon.status["plugin-a;2"].position, 6);
        assert_eq!(recon.status["plugin-b;1"].position, 7);
    }

    #[test]
    fn test_no_live_items_is_all_orphans() {
        let saved = BarStatus::from([("A;1".to_string(), ElementStatus::new(0, true))]);
        let mut items: Vec<MemoryItem> = Vec::new();

        let recon = reconcile(&mut items, &saved);
        assert_eq!(recon.rows.len(), 1);
        assert!(!recon.rows[0].exists);
    }

    #[test]
    fn test_empty_everything_is_empty() {
        let mut items: Vec<MemoryItem> = Vec::new();
        assert_eq!(reconcile(&mut items, &BarStatus::new()), Reconciliation::default());
    }

    #[test]
    fn test_fresh_preset_uses_scan_order() {
        let mut items = vec![
            MemoryItem::new(&["plugin-c"]),
            MemoryItem::new(&["plugin-a"]),
        ];
        let recon = reconcile(&mut items, &BarStatus::new());
        assert_eq!(keys(&recon), vec!["plugin-c;1", "plugin-a;1"]);
        assert_eq!(recon.status["plugin-c;1"].position, 0);
        assert_eq!(recon.status["plugin-a;1"].position, 1);
    }

    #[test]
    fn test_malformed_saved_key_is_orphan() {
        let saved = BarStatus::from([("no-index".to_string(), ElementStatus::new(0, true))]);
        let mut items: Vec<MemoryItem> = Vec::new();
        let recon = reconcile(&mut items, &saved);
        assert_eq!(recon.rows[0].id, ElementId::new("no-index", 0));
    }

    #[test]
    fn test_toggle_visibility_only_for_live_rows() {
        let saved = BarStatus::from([("X;1".to_string(), ElementStatus::new(0, true))]);
        let mut items = vec![stamped("A")];
        let mut recon = reconcile(&mut items, &saved);

        assert_eq!(recon.toggle_visibility("A;1"), Some(false));
        assert_eq!(recon.toggle_visibility("A;1"), Some(true));
        assert_eq!(recon.toggle_visibility("X;1"), None);
    }

    #[test]
    fn test_remove_orphan_renumbers() {
        let saved = BarStatus::from([
            ("A;1".to_string(), ElementStatus::new(0, true)),
            ("X;1".to_string(), ElementStatus::new(3, true)),
            ("B;1".to_string(), ElementStatus::new(7, true)),
        ]);
        let mut items = vec![stamped("A"), stamped("B")];
        let mut recon = reconcile(&mut items, &saved);

        assert!(!recon.remove_orphan("A;1"));
        assert!(recon.remove_orphan("X;1"));
        assert_eq!(keys(&recon), vec!["A;1", "B;1"]);
        assert_eq!(recon.status["B;1"].position, 1);
        assert!(!recon.status.contains_key("X;1"));
    }

    #[test]
    fn test_step_row_swaps_neighbours() {
        let mut items = vec![stamped("A"), stamped("B"), stamped("C")];
        let mut recon = reconcile(&mut items, &BarStatus::new());

        assert_eq!(recon.step_row(0, 2), Some(1));
        assert_eq!(keys(&recon), vec!["B;1", "A;1", "C;1"]);
        assert_eq!(recon.status["A;1"].position, 1);

        assert_eq!(recon.step_row(0, 0), None);
        assert_eq!(recon.step_row(2, 5), None);
    }

    #[test]
    fn test_tied_positions_follow_live_order() {
        let saved = BarStatus::from([
            ("zeta;1".to_string(), ElementStatus::new(0, true)),
            ("alpha;1".to_string(), ElementStatus::new(0, true)),
        ]);
        let mut items = vec![stamped("zeta"), stamped("alpha")];

        let recon = reconcile(&mut items, &saved);
        let bar_order = crate::reorder::apply_order(&mut items, &recon.status);

        assert_eq!(keys(&recon), vec!["zeta;1", "alpha;1"]);
        assert_eq!(keys(&recon), bar_order);
    }

    #[test]
    fn test_tied_orphans_follow_live_rows() {
        let saved = BarStatus::from([
            ("a-gone;1".to_string(), ElementStatus::new(0, true)),
            ("zeta;1".to_string(), ElementStatus::new(0, true)),
            ("b-gone;1".to_string(), ElementStatus::new(0, false)),
            ("alpha;1".to_string(), ElementStatus::new(1, true)),
        ]);
        let mut items = vec![stamped("alpha"), stamped("zeta")];

        let recon = reconcile(&mut items, &saved);

        assert_eq!(keys(&recon), vec!["zeta;1", "a-gone;1", "b-gone;1", "alpha;1"]);
    }

    #[test]
    fn test_preview_comes_from_live_items() {
        let saved = BarStatus::from([("X;1".to_string(), ElementStatus::new(0, true))]);
        let mut clock = stamped("plugin-clock");
        clock.text = "12:00".to_string();
        let mut items = vec![clock];

        let recon = reconcile(&mut items, &saved);

        assert_eq!(recon.rows[0].preview, None);
        assert_eq!(recon.rows[1].preview.as_deref(), Some("12:00"));
    }
}
