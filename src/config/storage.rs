//! Settings persistence
//!
//! The host hands us an opaque JSON blob on load and takes one back on save.
//! `JsonFileStore` keeps it on disk for the CLI, `MemoryStore` keeps it in
//! memory for embedding hosts and tests.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load/save of the settings blob
pub trait SettingsStore {
    /// `Ok(None)` when nothing has been stored yet
    fn load(&mut self) -> Result<Option<Value>>;

    fn save(&mut self, blob: &Value) -> Result<()>;
}

/// Settings kept as pretty-printed JSON in a file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/statusbar-organizer/settings.json`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<Value>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "Settings file not found");
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {:?}", self.path))?;
        let blob = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", self.path))?;

        debug!(path = %self.path.display(), "Loaded settings");
        Ok(Some(blob))
    }

    fn save(&mut self, blob: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(blob).context("Failed to serialize settings to JSON")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings to {:?}", self.path))?;

        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}

/// Settings kept in memory; counts saves so write-through can be checked
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub blob: Option<Value>,
    pub saves: usize,
    /// Make every save fail, to exercise the error path
    pub fail_saves: bool,
}

impl MemoryStore {
    pub fn with_blob(blob: Value) -> Self {
        Self {
            blob: Some(blob),
            ..Self::default()
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&mut self) -> Result<Option<Value>> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &Value) -> Result<()> {
        if self.fail_saves {
            return Err(anyhow!("Settings storage is unavailable"));
        }
        self.blob = Some(blob.clone());
        self.saves += 1;
        Ok(())
    }
}
