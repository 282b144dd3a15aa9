#![forbid(unsafe_code)]

//! Keeps a host application's status bar in a user-chosen order.
//!
//! Items in the bar are anonymous, so each one gets a stable identity derived
//! from its classes. Presets map identities to a position and a visibility;
//! the active preset (one per window mode) is reapplied whenever items appear.

pub mod bar;
pub mod config;
pub mod constants;
pub mod hotkeys;
pub mod identity;
pub mod menu;
pub mod organizer;
pub mod presets;
pub mod reconcile;
pub mod reorder;
pub mod sync;

pub use bar::{BarItem, MemoryBar, MemoryItem, Mutation, StatusBar};
pub use config::{BarStatus, ElementStatus, JsonFileStore, MemoryStore, Settings, SettingsStore};
pub use identity::ElementId;
pub use organizer::Organizer;
pub use reconcile::{Reconciliation, Row};
pub use sync::{HostEvent, SyncScheduler, SyncState};
