//! Preset store
//!
//! CRUD over the named presets in [`Settings`], routed through the preset
//! that is active for the current window mode. Callers persist and re-run the
//! reconciler afterwards; nothing here touches the status bar.

use tracing::{debug, info};

use crate::config::{BarStatus, Settings};
use crate::constants::presets::{DEFAULT_NAME, FIRST_SUFFIX, MAX_NAME_LENGTH, NEW_PRESET_NAME};

/// Truncate to the maximum name length, then trim surrounding whitespace
pub fn sanitize_name(proposed: &str) -> String {
    proposed
        .chars()
        .take(MAX_NAME_LENGTH)
        .collect::<String>()
        .trim()
        .to_string()
}

/// `base` if free, otherwise `base 2`, `base 3`, ... (exact, case-sensitive match)
pub fn disambiguate(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|name| name == base) {
        return base.to_string();
    }

    let mut suffix = FIRST_SUFFIX;
    loop {
        let candidate = format!("{base} {suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Preset operations for one window mode
pub struct PresetStore<'a> {
    settings: &'a mut Settings,
    fullscreen: bool,
}

impl<'a> PresetStore<'a> {
    pub fn new(settings: &'a mut Settings, fullscreen: bool) -> Self {
        Self { settings, fullscreen }
    }

    pub fn active_name(&self) -> &str {
        self.settings.active_preset_name(self.fullscreen)
    }

    /// Make `name` the active preset for the current mode.
    /// Unknown names are ignored and return false.
    pub fn switch_to(&mut self, name: &str) -> bool {
        if !self.settings.has_preset(name) {
            debug!(preset = %name, "Ignoring switch to unknown preset");
            return false;
        }

        self.settings.set_active_preset(self.fullscreen, name);
        info!(preset = %name, fullscreen = self.fullscreen, "Switched preset");
        true
    }

    /// Clone the active preset under a fresh "New Preset" name and switch to it
    pub fn create(&mut self) -> String {
        let name = disambiguate(NEW_PRESET_NAME, &self.settings.presets_order);
        let seed: BarStatus = self
            .settings
            .active_status(self.fullscreen)
            .cloned()
            .unwrap_or_default();

        self.settings.presets.insert(name.clone(), seed);
        self.settings.presets_order.push(name.clone());
        self.settings.set_active_preset(self.fullscreen, &name);

        info!(preset = %name, "Created preset");
        name
    }

    /// Rename `old` to a cleaned-up, collision-free version of `proposed`.
    /// Returns the new name, or `None` if `old` is unknown or the name
    /// resolves to what it already was.
    pub fn rename(&mut self, old: &str, proposed: &str) -> Option<String> {
        if !self.settings.has_preset(old) {
            debug!(preset = %old, "Ignoring rename of unknown preset");
            return None;
        }

        let others: Vec<String> = self
            .settings
            .presets_order
            .iter()
            .filter(|name| *name != old)
            .cloned()
            .collect();

        let cleaned = sanitize_name(proposed);
        let new_name = if cleaned.is_empty() {
            disambiguate(NEW_PRESET_NAME, &others)
        } else {
            disambiguate(&cleaned, &others)
        };

        if new_name == old {
            return None;
        }

        if let Some(status) = self.settings.presets.remove(old) {
            self.settings.presets.insert(new_name.clone(), status);
        }
        for name in self.settings.presets_order.iter_mut() {
            if name == old {
                *name = new_name.clone();
            }
        }
        for active in [
            &mut self.settings.active_preset,
            &mut self.settings.active_fullscreen_preset,
        ] {
            if active == old {
                *active = new_name.clone();
            }
        }

        info!(from = %old, to = %new_name, "Renamed preset");
        Some(new_name)
    }

    /// Remove `name`. Any active field pointing at it moves to the preceding
    /// preset, else the following one, else a recreated "Default".
    pub fn delete(&mut self, name: &str) -> bool {
        let Some(index) = self.settings.presets_order.iter().position(|n| n == name) else {
            debug!(preset = %name, "Ignoring delete of unknown preset");
            return false;
        };

        let order = &self.settings.presets_order;
        let fallback = if index > 0 {
            order[index - 1].clone()
        } else if index + 1 < order.len() {
            order[index + 1].clone()
        } else {
            DEFAULT_NAME.to_string()
        };

        self.settings.presets.remove(name);
        self.settings.presets_order.retain(|n| n != name);

        for active in [
            &mut self.settings.active_preset,
            &mut self.settings.active_fullscreen_preset,
        ] {
            if active == name {
                *active = fallback.clone();
            }
        }

        if self.settings.presets_order.is_empty() {
            self.settings.presets.entry(DEFAULT_NAME.to_string()).or_default();
            self.settings.presets_order.push(DEFAULT_NAME.to_string());
        }
        self.settings.heal();

        info!(preset = %name, active = %self.active_name(), "Deleted preset");
        true
    }

    /// Align the two active fields after the window entered or left
    /// fullscreen (`self.fullscreen` is the new mode).
    ///
    /// Without separate fullscreen presets, the mode we just left wins and is
    /// copied into the mode we entered. With separate presets the fields are
    /// left alone unless the newly relevant one names a missing preset.
    pub fn sync_fullscreen(&mut self) -> bool {
        let target_missing = !self.settings.has_preset(self.active_name());
        let mut changed = false;

        if !self.settings.separate_fullscreen_preset || target_missing {
            let source = self.settings.active_preset_name(!self.fullscreen).to_string();
            if self.settings.has_preset(&source) && self.active_name() != source {
                self.settings.set_active_preset(self.fullscreen, &source);
                changed = true;
            }
        }

        changed |= self.settings.heal();
        if changed {
            debug!(
                fullscreen = self.fullscreen,
                active = %self.active_name(),
                "Synchronized fullscreen preset"
            );
        }
        changed
    }
}
