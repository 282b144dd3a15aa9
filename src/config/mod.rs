//! Configuration management for the status bar organizer
//!
//! - **settings**: the persisted model (presets, active preset per mode)
//! - **migrate**: version-gated upgrades of older stored blobs
//! - **storage**: where the blob lives (host storage, a file, or memory)

pub mod migrate;
pub mod settings;
pub mod storage;

// Re-export commonly used types
pub use migrate::{CURRENT_VERSION, Migrator, UNVERSIONED, Version};
pub use settings::{BarStatus, ElementStatus, Settings};
pub use storage::{JsonFileStore, MemoryStore, SettingsStore};
