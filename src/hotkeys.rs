//! "Switch to preset" commands
//!
//! One command per preset slot, so the host can bind a hotkey to each. The
//! command addresses a slot, not a name: renaming a preset keeps its hotkey,
//! reordering presets moves it.

use tracing::debug;

use crate::constants::commands::PRESET_COMMAND_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetCommand {
    /// Stable id the host binds hotkeys to
    pub id: String,
    /// Title shown in the command palette
    pub name: String,
    /// Slot in the preset order
    pub index: usize,
}

/// Commands for the current preset order
pub fn preset_commands(order: &[String]) -> Vec<PresetCommand> {
    let commands: Vec<_> = order
        .iter()
        .enumerate()
        .map(|(index, preset)| PresetCommand {
            id: format!("{PRESET_COMMAND_PREFIX}{index}"),
            name: format!("Switch to preset \"{preset}\""),
            index,
        })
        .collect();

    debug!(count = commands.len(), "Registered preset commands");
    commands
}

/// The preset slot `index` currently points at, if the slot exists
pub fn command_target(order: &[String], index: usize) -> Option<&str> {
    order.get(index).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_one_command_per_preset() {
        let commands = preset_commands(&order(&["Default", "Work"]));

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].id, "statusbar-organizer-preset-1");
        assert_eq!(commands[1].name, "Switch to preset \"Work\"");
        assert_eq!(commands[1].index, 1);
    }

    #[test]
    fn test_command_target_out_of_range() {
        let order = order(&["Default"]);
        assert_eq!(command_target(&order, 0), Some("Default"));
        assert_eq!(command_target(&order, 1), None);
    }
}
