//! Settings schema upgrades
//!
//! Every historical schema change is a named transformation registered under
//! the version that introduced it. Loading a blob applies, in ascending order,
//! every transformation newer than the version the blob declares, then stamps
//! the current version. Upgrades run on the raw JSON so old shapes never have
//! to deserialize into the current struct.

pub use semver::Version;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use tracing::{debug, info, warn};

/// Version assumed for blobs that declare none (or an unreadable one)
pub const UNVERSIONED: Version = Version::new(0, 0, 0);

/// Schema version written by this build
pub const CURRENT_VERSION: Version = Version::new(2, 1, 1);

/// A pure, in-place transformation of the settings object
pub type Upgrade = fn(&mut Map<String, Value>);

/// Ordered registry of version-gated upgrades
pub struct Migrator {
    upgrades: BTreeMap<Version, (&'static str, Upgrade)>,
    current: Version,
}

impl Migrator {
    pub fn new(current: Version) -> Self {
        Self {
            upgrades: BTreeMap::new(),
            current,
        }
    }

    /// Registry with every upgrade this crate has ever shipped
    pub fn standard() -> Self {
        let mut migrator = Self::new(CURRENT_VERSION);
        migrator
            .register(Version::new(2, 0, 0), "nest flat status under presets", nest_flat_status)
            .register(Version::new(2, 1, 1), "drop per-element exists flag", drop_exists_flag);
        migrator
    }

    pub fn register(&mut self, version: Version, label: &'static str, upgrade: Upgrade) -> &mut Self {
        self.upgrades.insert(version, (label, upgrade));
        self
    }

    /// Version a blob claims to be at. Missing or unreadable means 0.0.0.
    pub fn declared_version(blob: &Value) -> Version {
        match blob.get("version").and_then(Value::as_str) {
            Some(raw) => Version::parse(raw.trim()).unwrap_or_else(|e| {
                warn!(version = %raw, error = %e, "Unreadable settings version, assuming 0.0.0");
                UNVERSIONED
            }),
            None => UNVERSIONED,
        }
    }

    /// Upgrades strictly newer than `from`, ascending
    pub fn pending(&self, from: &Version) -> Vec<Version> {
        self.upgrades
            .range((Excluded(from), Unbounded))
            .map(|(version, _)| version.clone())
            .collect()
    }

    /// Bring `blob` up to the current schema. Returns the versions applied.
    pub fn migrate(&self, blob: &mut Value) -> Vec<Version> {
        if !blob.is_object() {
            warn!("Settings blob is not an object, discarding it");
            *blob = Value::Object(Map::new());
        }

        let from = Self::declared_version(blob);
        let pending = self.pending(&from);

        if let Value::Object(map) = blob {
            for version in &pending {
                let (label, upgrade) = self.upgrades[version];
                info!(version = %version, upgrade = label, "Upgrading settings");
                upgrade(map);
            }
            map.insert("version".to_string(), Value::String(self.current.to_string()));
        }

        debug!(from = %from, applied = pending.len(), "Settings migration finished");
        pending
    }
}

/// Before 2.0.0 there were no presets, only a single `status` map
fn nest_flat_status(settings: &mut Map<String, Value>) {
    let Some(status) = settings.remove("status") else {
        return;
    };

    let presets = settings
        .entry("presets")
        .or_insert_with(|| Value::Object(Map::new()));
    if !presets.is_object() {
        *presets = Value::Object(Map::new());
    }
    if let Value::Object(presets) = presets {
        presets.insert("default".to_string(), status);
    }

    let order = settings
        .entry("presetsOrder")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(order) = order {
        if !order.iter().any(|name| name == "default") {
            order.push(Value::String("default".to_string()));
        }
    }

    for key in ["activePreset", "activeFullscreenPreset"] {
        settings
            .entry(key)
            .or_insert_with(|| Value::String("default".to_string()));
    }
}

/// Existence used to be persisted per element; it is derived on every scan now
fn drop_exists_flag(settings: &mut Map<String, Value>) {
    let Some(Value::Object(presets)) = settings.get_mut("presets") else {
        return;
    };
    for preset in presets.values_mut() {
        let Value::Object(elements) = preset else {
            continue;
        };
        for element in elements.values_mut() {
            if let Value::Object(element) = element {
                element.remove("exists");
            }
        }
    }
}
