//! Re-sync scheduling
//!
//! - **scheduler**: when a reorder pass should run (debounce, lock, retry)
//! - **driver**: the event loop that feeds host events in and runs passes on time

pub mod driver;
pub mod scheduler;

pub use driver::{channel, run, HostEvent};
pub use scheduler::{SyncScheduler, SyncState};
