//! Host status bar seam
//!
//! The host owns the live items and mutates them whenever other plugins feel
//! like it. We only read their class lists and write three things onto them:
//! an identity stamp attribute, an ordering hint, and the hidden marker class.

mod memory;

pub use memory::{MemoryBar, MemoryItem};

/// A single live item rendered in the host's status bar
pub trait BarItem {
    /// Current class markers, in the host's order
    fn classes(&self) -> Vec<String>;

    fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    fn add_class(&mut self, class: &str);

    fn remove_class(&mut self, class: &str);

    fn attribute(&self, name: &str) -> Option<String>;

    fn set_attribute(&mut self, name: &str, value: &str);

    /// Ordering hint consumed by the host's layout (flex `order`)
    fn order(&self) -> Option<u32>;

    fn set_order(&mut self, order: u32);

    /// Rendered content, used as a preview in the settings rows
    fn text(&self) -> Option<String> {
        None
    }

    /// Show or hide the item by toggling the hidden marker class
    fn set_hidden(&mut self, hidden: bool) {
        let class = crate::constants::classes::HIDDEN;
        match (hidden, self.has_class(class)) {
            (true, false) => self.add_class(class),
            (false, true) => self.remove_class(class),
            _ => {}
        }
    }
}

/// The host's status bar container
pub trait StatusBar {
    type Item: BarItem;

    /// Run `f` over the live children in container order
    fn with_items<R>(&mut self, f: impl FnOnce(&mut [Self::Item]) -> R) -> R;

    /// Connect or disconnect structural-mutation observation.
    /// While disconnected the host must not deliver [`Mutation`]s.
    fn set_observing(&mut self, observing: bool);
}

/// Change notification delivered by the host's mutation observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Children were added to or removed from the container
    ChildList { added: usize, removed: usize },
    /// Attributes or classes changed on existing children
    Attributes { count: usize },
}

impl Mutation {
    /// Only new children can invalidate the current order
    pub fn adds_items(&self) -> bool {
        matches!(self, Mutation::ChildList { added, .. } if *added > 0)
    }
}
