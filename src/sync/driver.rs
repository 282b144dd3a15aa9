//! Event loop driving an [`Organizer`]
//!
//! The host pushes [`HostEvent`]s into a channel; the loop applies them and
//! sleeps until the scheduler's next deadline in between. Everything runs on
//! one task, so a reorder pass never overlaps with event handling.

use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::bar::{Mutation, StatusBar};
use crate::config::SettingsStore;
use crate::organizer::Organizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Observed changes to the status bar container
    Mutations(Vec<Mutation>),
    /// Explicit request for a pass after `delay`
    RequestSync { delay: Duration },
    /// Window entered (`true`) or left fullscreen
    Fullscreen(bool),
    Shutdown,
}

pub fn channel() -> (UnboundedSender<HostEvent>, UnboundedReceiver<HostEvent>) {
    mpsc::unbounded_channel()
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Run until [`HostEvent::Shutdown`] or until every sender is gone, then
/// deactivate and hand the organizer back.
pub async fn run<B, S>(
    mut organizer: Organizer<B, S>,
    mut rx: UnboundedReceiver<HostEvent>,
) -> Organizer<B, S>
where
    B: StatusBar,
    S: SettingsStore,
{
    info!("Sync driver started");

    loop {
        let deadline = organizer.scheduler().deadline();

        tokio::select! {
            // Drain pending events before a due pass so bursts coalesce
            biased;

            event = rx.recv() => match event {
                Some(HostEvent::Mutations(mutations)) => organizer.on_mutations(&mutations),
                Some(HostEvent::RequestSync { delay }) => organizer.request_sync(delay),
                Some(HostEvent::Fullscreen(fullscreen)) => organizer.set_fullscreen(fullscreen),
                Some(HostEvent::Shutdown) => {
                    info!("Shutdown requested");
                    break;
                }
                None => {
                    debug!("All event senders dropped");
                    break;
                }
            },
            _ = sleep_until_deadline(deadline) => {
                organizer.run_due();
            }
        }
    }

    organizer.deactivate();
    info!(runs = organizer.scheduler().runs(), "Sync driver stopped");
    organizer
}
