//! In-memory status bar
//!
//! Stands in for the host container in the CLI and in tests. The handle is
//! cheap to clone so "other plugins" can keep adding items while the
//! organizer holds its own copy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::{BarItem, Mutation, StatusBar};
use crate::constants::attributes;

type Observer = Arc<dyn Fn(Mutation) + Send + Sync>;

/// A status bar item as the CLI reads it from a JSON snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    /// Rendered text, shown as a preview next to the row
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Number of writes made through [`BarItem`], reported as attribute mutations
    #[serde(skip)]
    writes: usize,
}

impl MemoryItem {
    pub fn new(classes: &[&str]) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Identity stamp, if the item has been scanned before
    pub fn stamped_id(&self) -> Option<&str> {
        self.attributes.get(attributes::ELEMENT_ID).map(String::as_str)
    }

    pub fn is_hidden(&self) -> bool {
        self.has_class(crate::constants::classes::HIDDEN)
    }
}

impl BarItem for MemoryItem {
    fn classes(&self) -> Vec<String> {
        self.classes.clone()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
            self.writes += 1;
        }
    }

    fn remove_class(&mut self, class: &str) {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        if self.classes.len() != before {
            self.writes += 1;
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
        self.writes += 1;
    }

    fn order(&self) -> Option<u32> {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        if self.order != Some(order) {
            self.order = Some(order);
            self.writes += 1;
        }
    }

    fn text(&self) -> Option<String> {
        (!self.text.is_empty()).then(|| self.text.clone())
    }
}

#[derive(Default)]
struct BarInner {
    items: Vec<MemoryItem>,
    observing: bool,
    observer: Option<Observer>,
}

impl BarInner {
    /// Observer to notify, if observation is connected. It must be called
    /// after the lock is released so it can read the bar itself.
    fn listener(&self) -> Option<Observer> {
        if self.observing { self.observer.clone() } else { None }
    }

    fn total_writes(&self) -> usize {
        self.items.iter().map(|item| item.writes).sum()
    }
}

/// Shared handle to an in-memory status bar container
#[derive(Clone, Default)]
pub struct MemoryBar {
    inner: Arc<Mutex<BarInner>>,
}

impl MemoryBar {
    pub fn new(items: Vec<MemoryItem>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BarInner {
                items,
                ..BarInner::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install the callback that receives mutations while observation is connected
    pub fn set_observer(&self, observer: impl Fn(Mutation) + Send + Sync + 'static) {
        self.lock().observer = Some(Arc::new(observer));
    }

    fn emit(listener: Option<Observer>, mutation: Mutation) {
        if let Some(observer) = listener {
            observer(mutation);
        }
    }

    pub fn is_observing(&self) -> bool {
        self.lock().observing
    }

    /// Append an item the way another plugin would
    pub fn push(&self, item: MemoryItem) {
        let listener = {
            let mut inner = self.lock();
            inner.items.push(item);
            inner.listener()
        };
        Self::emit(listener, Mutation::ChildList { added: 1, removed: 0 });
    }

    /// Remove the item at `index`, as a plugin unloading would
    pub fn remove(&self, index: usize) -> Option<MemoryItem> {
        let (item, listener) = {
            let mut inner = self.lock();
            if index >= inner.items.len() {
                return None;
            }
            (inner.items.remove(index), inner.listener())
        };
        Self::emit(listener, Mutation::ChildList { added: 0, removed: 1 });
        Some(item)
    }

    /// Copy of the live items in container order
    pub fn snapshot(&self) -> Vec<MemoryItem> {
        self.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatusBar for MemoryBar {
    type Item = MemoryItem;

    fn with_items<R>(&mut self, f: impl FnOnce(&mut [MemoryItem]) -> R) -> R {
        let (result, count, listener) = {
            let mut inner = self.lock();
            let before = inner.total_writes();
            let result = f(&mut inner.items);
            let count = inner.total_writes() - before;
            (result, count, inner.listener())
        };
        if count > 0 {
            Self::emit(listener, Mutation::Attributes { count });
        }
        result
    }

    fn set_observing(&mut self, observing: bool) {
        let mut inner = self.lock();
        if inner.observing != observing {
            debug!(observing = observing, "Status bar observation toggled");
            inner.observing = observing;
        }
    }
}
