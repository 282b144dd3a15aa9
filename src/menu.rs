//! View model for the settings screen
//!
//! Turns a reconciliation into labelled rows and the preset list into
//! entries with the active one marked. Rendering is left to the host.

use std::collections::HashMap;

use crate::config::Settings;
use crate::identity::ElementId;
use crate::reconcile::Reconciliation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub key: String,
    pub label: String,
    pub exists: bool,
    pub visible: bool,
    /// Live item content; `None` for orphans
    pub preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetEntry {
    pub name: String,
    pub active: bool,
}

/// `plugin-obsidian-git-status` becomes `Git Status`
pub fn display_name(name: &str) -> String {
    let stripped = name
        .strip_prefix("plugin-obsidian-")
        .or_else(|| name.strip_prefix("plugin-"))
        .unwrap_or(name);

    stripped
        .split('-')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Label rows, suffixing the index where several rows share a name
pub fn row_views(recon: &Reconciliation) -> Vec<RowView> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in &recon.rows {
        *counts.entry(row.id.name.as_str()).or_default() += 1;
    }

    recon
        .rows
        .iter()
        .map(|row| RowView {
            key: row.key.clone(),
            label: label(&row.id, counts[row.id.name.as_str()] > 1),
            exists: row.exists,
            visible: recon.status.get(&row.key).is_none_or(|s| s.visible),
            preview: row.preview.clone(),
        })
        .collect()
}

fn label(id: &ElementId, ambiguous: bool) -> String {
    let name = display_name(&id.name);
    if ambiguous {
        format!("{name} ({})", id.index)
    } else {
        name
    }
}

pub fn preset_entries(settings: &Settings, fullscreen: bool) -> Vec<PresetEntry> {
    let active = settings.active_preset_name(fullscreen);
    settings
        .presets_order
        .iter()
        .map(|name| PresetEntry {
            name: name.clone(),
            active: name == active,
        })
        .collect()
}
