//! Organizer context
//!
//! Owns everything the plugin needs between activation and deactivation: the
//! settings, where they persist, the host's status bar, the sync scheduler,
//! the current window mode and the settings-screen state. Every user-level
//! operation goes through here and is written through to storage at once.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::bar::{BarItem, Mutation, StatusBar};
use crate::config::{BarStatus, Settings, SettingsStore};
use crate::constants::{attributes, scheduler::STARTUP_DELAY};
use crate::hotkeys::{self, PresetCommand};
use crate::menu::{self, PresetEntry, RowView};
use crate::presets::PresetStore;
use crate::reconcile::{reconcile, Reconciliation};
use crate::reorder::apply_order;
use crate::sync::SyncScheduler;

pub struct Organizer<B: StatusBar, S: SettingsStore> {
    bar: B,
    store: S,
    settings: Settings,
    scheduler: SyncScheduler,
    fullscreen: bool,
    /// Rows of the open settings screen
    menu: Option<Reconciliation>,
    /// Key of the row being dragged
    dragging: Option<String>,
    active: bool,
}

impl<B: StatusBar, S: SettingsStore> Organizer<B, S> {
    /// Load and upgrade settings, start observing the bar, and schedule the
    /// settling pass that catches items registered late during startup.
    pub fn activate(bar: B, mut store: S, fullscreen: bool) -> Self {
        let blob = store.load().unwrap_or_else(|e| {
            error!(error = ?e, "Failed to load settings, using defaults");
            None
        });

        let mut organizer = Self {
            bar,
            store,
            settings: Settings::from_blob(blob),
            scheduler: SyncScheduler::new(),
            fullscreen,
            menu: None,
            dragging: None,
            active: true,
        };
        info!(
            presets = organizer.settings.presets_order.len(),
            active = %organizer.active_preset(),
            fullscreen = fullscreen,
            "Organizer activated"
        );

        PresetStore::new(&mut organizer.settings, fullscreen).sync_fullscreen();
        organizer.persist();

        organizer.bar.set_observing(true);
        organizer.scheduler.request(Instant::now(), STARTUP_DELAY);
        organizer.fix_order();
        organizer
    }

    /// Stop observing and drop pending work. Safe to call more than once.
    pub fn deactivate(&mut self) {
        if self.active {
            info!("Organizer deactivated");
        }
        self.active = false;
        self.scheduler.cancel();
        self.bar.set_observing(false);
        self.dragging = None;
        self.menu = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    pub fn bar(&self) -> &B {
        &self.bar
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn active_preset(&self) -> &str {
        self.settings.active_preset_name(self.fullscreen)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write-through save. Failures are logged; in-memory state stays authoritative.
    fn persist(&mut self) {
        let result = self
            .settings
            .to_blob()
            .and_then(|blob| self.store.save(&blob));
        if let Err(e) = result {
            error!(error = ?e, "Failed to save settings");
        }
    }

    fn store_active_status(&mut self, status: BarStatus) {
        self.settings.store_active_status(self.fullscreen, status);
        self.persist();
    }

    // ------------------------------------------------------------------
    // Synchronization
    // ------------------------------------------------------------------

    /// Host delivered observed mutations
    pub fn on_mutations(&mut self, mutations: &[Mutation]) {
        if !self.active {
            return;
        }
        if self.scheduler.notify(Instant::now(), mutations) {
            debug!(count = mutations.len(), "Status bar changed, sync scheduled");
        }
    }

    /// Ask for a reorder pass `delay` from now
    pub fn request_sync(&mut self, delay: Duration) {
        if self.active {
            self.scheduler.request(Instant::now(), delay);
        }
    }

    /// Run the scheduled pass if its timer has come due
    pub fn run_due(&mut self) -> bool {
        if !self.scheduler.begin_run(Instant::now()) {
            return false;
        }
        self.reorder_pass();
        self.scheduler.finish_run(Instant::now());
        true
    }

    /// Reorder right away, under the same lock as scheduled passes
    pub fn fix_order(&mut self) {
        if !self.scheduler.begin_immediate() {
            return;
        }
        self.reorder_pass();
        self.scheduler.finish_run(Instant::now());
    }

    fn reorder_pass(&mut self) {
        let empty = BarStatus::new();
        let status = self
            .settings
            .active_status(self.fullscreen)
            .unwrap_or(&empty);

        self.bar.set_observing(false);
        let order = self.bar.with_items(|items| apply_order(items, status));
        self.bar.set_observing(self.active);

        debug!(items = order.len(), preset = %self.active_preset(), "Reorder pass complete");
    }

    /// Write to live items with observation suspended
    fn write_items(&mut self, f: impl FnOnce(&mut [B::Item])) {
        self.bar.set_observing(false);
        self.bar.with_items(f);
        self.bar.set_observing(self.active);
    }

    // ------------------------------------------------------------------
    // Window mode
    // ------------------------------------------------------------------

    /// Host entered or left fullscreen
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
        if PresetStore::new(&mut self.settings, fullscreen).sync_fullscreen() {
            self.persist();
        }
        info!(fullscreen = fullscreen, preset = %self.active_preset(), "Window mode changed");

        self.fix_order();
        if self.menu.is_some() {
            self.open_menu();
        }
    }

    pub fn set_separate_fullscreen(&mut self, separate: bool) {
        self.settings.separate_fullscreen_preset = separate;
        self.persist();
    }

    // ------------------------------------------------------------------
    // Settings screen
    // ------------------------------------------------------------------

    /// Reconcile the active preset with the bar, write the canonical status
    /// back and request an immediate reorder. The rows stay available for
    /// the row-level operations until the menu is closed.
    pub fn open_menu(&mut self) -> &Reconciliation {
        if self.settings.heal() {
            self.persist();
        }

        let empty = BarStatus::new();
        let saved = self
            .settings
            .active_status(self.fullscreen)
            .unwrap_or(&empty);
        let recon = self.bar.with_items(|items| reconcile(items, saved));

        self.store_active_status(recon.status.clone());
        self.request_sync(Duration::ZERO);
        self.dragging = None;
        self.menu.insert(recon)
    }

    pub fn close_menu(&mut self) {
        self.end_drag();
        self.menu = None;
    }

    pub fn menu(&self) -> Option<&Reconciliation> {
        self.menu.as_ref()
    }

    pub fn row_views(&self) -> Vec<RowView> {
        self.menu.as_ref().map(menu::row_views).unwrap_or_default()
    }

    pub fn preset_entries(&self) -> Vec<PresetEntry> {
        menu::preset_entries(&self.settings, self.fullscreen)
    }

    /// Show/hide a live row and its item. Returns the new visibility.
    pub fn toggle_visibility(&mut self, key: &str) -> Option<bool> {
        let visible = self.menu.as_mut()?.toggle_visibility(key)?;

        self.write_items(|items| {
            if let Some(item) = find_item(items, key) {
                item.set_hidden(!visible);
            }
        });

        let status = self.menu.as_ref()?.status.clone();
        self.store_active_status(status);
        info!(id = %key, visible = visible, "Toggled visibility");
        Some(visible)
    }

    /// Forget a row whose item is gone. Live rows cannot be removed.
    pub fn remove_orphan(&mut self, key: &str) -> bool {
        let Some(menu) = self.menu.as_mut() else {
            return false;
        };
        if !menu.remove_orphan(key) {
            return false;
        }

        let status = menu.status.clone();
        self.store_active_status(status);
        info!(id = %key, "Removed orphan");
        true
    }

    /// Begin dragging a row. Refused while another drag is in progress.
    pub fn start_drag(&mut self, key: &str) -> bool {
        if self.dragging.is_some() {
            debug!(id = %key, "Drag already in progress");
            return false;
        }
        let known = self
            .menu
            .as_ref()
            .is_some_and(|menu| menu.row_index(key).is_some());
        if !known {
            return false;
        }

        self.dragging = Some(key.to_string());
        true
    }

    /// Move the dragged row to `target` (clamped), one neighbour at a time.
    /// Live neighbours swap ordering hints on the bar as they are passed.
    /// Returns the dragged row's new index.
    pub fn drag_to(&mut self, target: usize) -> Option<usize> {
        let key = self.dragging.clone()?;
        let menu = self.menu.as_mut()?;
        let target = target.min(menu.rows.len().saturating_sub(1));
        let mut index = menu.row_index(&key)?;

        while index != target {
            let menu = self.menu.as_mut()?;
            let Some(passed) = menu.step_row(index, target) else {
                break;
            };
            let dragged_exists = menu.rows[passed].exists;
            let passed_exists = menu.rows[index].exists;
            let passed_key = menu.rows[index].key.clone();

            if dragged_exists && passed_exists {
                self.write_items(|items| swap_order_hints(items, &key, &passed_key));
            }
            index = passed;
        }

        Some(index)
    }

    /// Release the drag, whatever state it is in, and save the new order
    pub fn end_drag(&mut self) {
        let Some(key) = self.dragging.take() else {
            return;
        };
        if let Some(status) = self.menu.as_ref().map(|menu| menu.status.clone()) {
            self.store_active_status(status);
            debug!(id = %key, "Drag finished");
        }
    }

    // ------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------

    /// Reorder for the (possibly new) active preset and rebuild open rows
    fn refresh(&mut self) {
        self.dragging = None;
        self.fix_order();
        if self.menu.is_some() {
            self.open_menu();
        }
    }

    pub fn switch_preset(&mut self, name: &str) -> bool {
        if !PresetStore::new(&mut self.settings, self.fullscreen).switch_to(name) {
            return false;
        }
        self.persist();
        self.refresh();
        true
    }

    pub fn create_preset(&mut self) -> String {
        let name = PresetStore::new(&mut self.settings, self.fullscreen).create();
        self.persist();
        self.refresh();
        name
    }

    pub fn rename_preset(&mut self, old: &str, proposed: &str) -> Option<String> {
        let renamed = PresetStore::new(&mut self.settings, self.fullscreen).rename(old, proposed)?;
        self.persist();
        Some(renamed)
    }

    pub fn delete_preset(&mut self, name: &str) -> bool {
        if !PresetStore::new(&mut self.settings, self.fullscreen).delete(name) {
            return false;
        }
        self.persist();
        self.refresh();
        true
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn preset_commands(&self) -> Vec<PresetCommand> {
        hotkeys::preset_commands(&self.settings.presets_order)
    }

    /// "Switch to preset N". In check mode only reports availability.
    pub fn run_preset_command(&mut self, index: usize, checking: bool) -> bool {
        let Some(name) = hotkeys::command_target(&self.settings.presets_order, index) else {
            return false;
        };
        if !checking {
            let name = name.to_string();
            self.switch_preset(&name);
        }
        true
    }
}

fn find_item<'a, I: BarItem>(items: &'a mut [I], key: &str) -> Option<&'a mut I> {
    items
        .iter_mut()
        .find(|item| item.attribute(attributes::ELEMENT_ID).as_deref() == Some(key))
}

fn swap_order_hints<I: BarItem>(items: &mut [I], a: &str, b: &str) {
    let slot = |items: &[I], key: &str| {
        items
            .iter()
            .position(|item| item.attribute(attributes::ELEMENT_ID).as_deref() == Some(key))
    };
    let (Some(a), Some(b)) = (slot(items, a), slot(items, b)) else {
        return;
    };
    let (order_a, order_b) = (items[a].order(), items[b].order());
    if let Some(order) = order_b {
        items[a].set_order(order);
    }
    if let Some(order) = order_a {
        items[b].set_order(order);
    }
}
