//! Persisted settings model
//!
//! One status map per named preset, plus which preset is active in windowed
//! and fullscreen mode. The JSON field names match the host's stored blob.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use super::migrate::{CURRENT_VERSION, Migrator};
use crate::constants::presets;

/// Per-preset record for one item id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStatus {
    /// Relative ordering key; only comparisons matter, gaps are fine
    #[serde(default)]
    pub position: i64,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl ElementStatus {
    pub fn new(position: i64, visible: bool) -> Self {
        Self { position, visible }
    }
}

/// Status map of a single preset, keyed by serialized element id
pub type BarStatus = BTreeMap<String, ElementStatus>;

/// Root settings object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_presets")]
    pub presets: BTreeMap<String, BarStatus>,
    /// Display and hotkey order; names the same set as `presets`
    #[serde(default = "default_presets_order")]
    pub presets_order: Vec<String>,
    #[serde(default = "default_preset_name")]
    pub active_preset: String,
    #[serde(default = "default_preset_name")]
    pub active_fullscreen_preset: String,
    #[serde(default)]
    pub separate_fullscreen_preset: bool,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_visible() -> bool {
    true
}

fn default_preset_name() -> String {
    presets::DEFAULT_NAME.to_string()
}

fn default_presets() -> BTreeMap<String, BarStatus> {
    BTreeMap::from([(default_preset_name(), BarStatus::new())])
}

fn default_presets_order() -> Vec<String> {
    vec![default_preset_name()]
}

fn default_version() -> String {
    CURRENT_VERSION.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            presets: default_presets(),
            presets_order: default_presets_order(),
            active_preset: default_preset_name(),
            active_fullscreen_preset: default_preset_name(),
            separate_fullscreen_preset: false,
            version: default_version(),
        }
    }
}

impl Settings {
    /// Build settings from a stored blob: migrate, merge over defaults, heal.
    /// A missing blob yields defaults; an unreadable one is logged and replaced.
    pub fn from_blob(blob: Option<Value>) -> Self {
        let Some(mut blob) = blob else {
            info!("No stored settings, starting from defaults");
            return Self::default();
        };

        let applied = Migrator::standard().migrate(&mut blob);
        if !applied.is_empty() {
            info!(
                count = applied.len(),
                to = %CURRENT_VERSION,
                "Applied settings upgrades"
            );
        }

        let mut settings = match serde_json::from_value::<Settings>(blob) {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "Stored settings are unreadable, falling back to defaults");
                Self::default()
            }
        };
        settings.heal();
        settings
    }

    pub fn to_blob(&self) -> Result<Value> {
        serde_json::to_value(self).context("Failed to serialize settings")
    }

    /// Restore the invariants: `presets_order` names exactly the keys of
    /// `presets`, at least one preset exists, and both active fields name a
    /// real preset. Returns true if anything had to change.
    pub fn heal(&mut self) -> bool {
        let mut changed = false;

        // Drop unknown and duplicate names from the order list
        let mut seen = Vec::with_capacity(self.presets_order.len());
        for name in self.presets_order.drain(..) {
            if self.presets.contains_key(&name) && !seen.contains(&name) {
                seen.push(name);
            } else {
                warn!(preset = %name, "Dropping stale entry from preset order");
                changed = true;
            }
        }
        self.presets_order = seen;

        for name in self.presets.keys() {
            if !self.presets_order.contains(name) {
                warn!(preset = %name, "Appending preset missing from preset order");
                self.presets_order.push(name.clone());
                changed = true;
            }
        }

        if self.presets_order.is_empty() {
            warn!(preset = presets::DEFAULT_NAME, "No presets left, recreating fallback");
            let name = default_preset_name();
            self.presets.entry(name.clone()).or_default();
            self.presets_order.push(name);
            changed = true;
        }

        let first = self.presets_order[0].clone();
        for active in [&mut self.active_preset, &mut self.active_fullscreen_preset] {
            if !self.presets.contains_key(active.as_str()) {
                warn!(missing = %active, fallback = %first, "Active preset does not exist");
                *active = first.clone();
                changed = true;
            }
        }

        changed
    }

    /// Name of the preset that reads and writes currently route to
    pub fn active_preset_name(&self, fullscreen: bool) -> &str {
        if fullscreen {
            &self.active_fullscreen_preset
        } else {
            &self.active_preset
        }
    }

    pub fn set_active_preset(&mut self, fullscreen: bool, name: &str) {
        if fullscreen {
            self.active_fullscreen_preset = name.to_string();
        } else {
            self.active_preset = name.to_string();
        }
    }

    pub fn active_status(&self, fullscreen: bool) -> Option<&BarStatus> {
        self.presets.get(self.active_preset_name(fullscreen))
    }

    /// Replace the active preset's status map wholesale
    pub fn store_active_status(&mut self, fullscreen: bool, status: BarStatus) {
        let name = self.active_preset_name(fullscreen).to_string();
        self.presets.insert(name, status);
    }

    pub fn has_preset(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_satisfy_invariants() {
        let mut settings = Settings::default();
        assert!(!settings.heal());
        assert_eq!(settings.presets_order, vec!["Default"]);
        assert_eq!(settings.version, CURRENT_VERSION.to_string());
    }

    #[test]
    fn test_from_blob_none_is_default() {
        assert_eq!(Settings::from_blob(None), Settings::default());
    }

    #[test]
    fn test_from_blob_merges_over_defaults() {
        let settings = Settings::from_blob(Some(json!({
            "version": "2.1.1",
            "separateFullscreenPreset": true
        })));
        assert!(settings.separate_fullscreen_preset);
        assert_eq!(settings.active_preset, "Default");
        assert!(settings.has_preset("Default"));
    }

    #[test]
    fn test_from_blob_garbage_falls_back() {
        let settings = Settings::from_blob(Some(json!({
            "version": "2.1.1",
            "presets": "not a map"
        })));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_heal_empty_order_recreates_default() {
        let mut settings = Settings {
            presets: BTreeMap::new(),
            presets_order: Vec::new(),
            active_preset: "Gone".to_string(),
            active_fullscreen_preset: "Gone".to_string(),
            ..Settings::default()
        };

        assert!(settings.heal());
        assert_eq!(settings.presets_order, vec!["Default"]);
        assert!(settings.has_preset("Default"));
        assert_eq!(settings.active_preset, "Default");
        assert_eq!(settings.active_fullscreen_preset, "Default");
    }

    #[test]
    fn test_heal_syncs_order_with_presets() {
        let mut settings = Settings {
            presets: BTreeMap::from([
                ("A".to_string(), BarStatus::new()),
                ("B".to_string(), BarStatus::new()),
            ]),
            presets_order: vec!["B".into(), "Ghost".into(), "B".into()],
            active_preset: "A".into(),
            active_fullscreen_preset: "Ghost".into(),
            ..Settings::default()
        };

        assert!(settings.heal());
        assert_eq!(settings.presets_order, vec!["B", "A"]);
        assert_eq!(settings.active_preset, "A");
        assert_eq!(settings.active_fullscreen_preset, "B");
    }

    #[test]
    fn test_active_preset_routing() {
        let mut settings = Settings::default();
        settings.presets.insert("Full".into(), BarStatus::new());
        settings.presets_order.push("Full".into());

        settings.set_active_preset(true, "Full");
        assert_eq!(settings.active_preset_name(true), "Full");
        assert_eq!(settings.active_preset_name(false), "Default");
    }

    #[test]
    fn test_serialized_field_names() {
        let blob = Settings::default().to_blob().unwrap();
        assert_eq!(blob["activePreset"], "Default");
        assert_eq!(blob["activeFullscreenPreset"], "Default");
        assert_eq!(blob["presetsOrder"], json!(["Default"]));
        assert_eq!(blob["separateFullscreenPreset"], false);
    }
}
