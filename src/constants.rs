//! Application-wide constants
//!
//! Marker names written onto host items, preset naming rules and scheduler
//! timings live here so every module agrees on them.

/// Attributes stamped onto live status bar items
pub mod attributes {
    /// Identity stamp (`name;index`) attached on first scan
    pub const ELEMENT_ID: &str = "data-statusbar-organizer-id";
}

/// Class markers read from and written to live status bar items
pub mod classes {
    /// Marker toggled on items the active preset hides
    pub const HIDDEN: &str = "statusbar-organizer-element-hidden";

    /// Host utility classes plus our own hidden marker.
    /// None of these take part in identity derivation.
    pub const IGNORED: [&str; 3] = ["mod-clickable", "status-bar-item", HIDDEN];

    /// Separator used when joining the remaining classes into an item name
    pub const NAME_SEPARATOR: &str = "-";
}

/// Preset naming rules
pub mod presets {
    /// Fallback preset created whenever the settings lose their last preset
    pub const DEFAULT_NAME: &str = "Default";

    /// Base name for presets created without an explicit name
    pub const NEW_PRESET_NAME: &str = "New Preset";

    /// Longest preset name accepted by rename (in characters)
    pub const MAX_NAME_LENGTH: usize = 25;

    /// First numeric suffix tried when a name is already taken
    pub const FIRST_SUFFIX: u32 = 2;
}

/// Sync scheduler timings
pub mod scheduler {
    use std::time::Duration;

    /// Settling delay after activation so slow plugins can register their items
    pub const STARTUP_DELAY: Duration = Duration::from_secs(5);

    /// Delay used when a run is requested while another one is in flight
    pub const RETRY_DELAY: Duration = Duration::from_secs(1);
}

/// Host command registration
pub mod commands {
    /// Prefix of the per-preset command id (suffixed with the preset index)
    pub const PRESET_COMMAND_PREFIX: &str = "statusbar-organizer-preset-";
}

/// Configuration file location
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "statusbar-organizer";

    /// Settings file name
    pub const FILENAME: &str = "settings.json";
}
