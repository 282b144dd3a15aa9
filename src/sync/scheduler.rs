//! Debounced re-sync scheduler
//!
//! Bursts of "items were added" notifications collapse into a single reorder
//! pass. The scheduler only decides *when* a pass runs; the caller performs it
//! between [`SyncScheduler::begin_run`] and [`SyncScheduler::finish_run`] with
//! observation disconnected, so the pass's own writes cannot schedule another.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::bar::Mutation;
use crate::constants::scheduler::RETRY_DELAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Scheduled { deadline: Instant },
    Running,
}

#[derive(Debug, Default)]
pub struct SyncScheduler {
    timer: Option<Instant>,
    locked: bool,
    /// A request arrived while locked and must run after the current pass
    deferred: bool,
    runs: u64,
}

impl SyncScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        match (self.locked, self.timer) {
            (true, _) => SyncState::Running,
            (false, Some(deadline)) => SyncState::Scheduled { deadline },
            (false, None) => SyncState::Idle,
        }
    }

    /// Completed passes since construction
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn deadline(&self) -> Option<Instant> {
        if self.locked { None } else { self.timer }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| deadline <= now)
    }

    /// Schedule a pass `delay` from now, replacing any pending one.
    /// While a pass is running the request is deferred, never dropped.
    pub fn request(&mut self, now: Instant, delay: Duration) {
        if self.locked {
            debug!(delay_ms = delay.as_millis() as u64, "Sync requested while running, deferring");
            self.deferred = true;
            return;
        }

        if self.timer.is_some() {
            debug!("Superseding pending sync");
        }
        self.timer = Some(now + delay);
        debug!(delay_ms = delay.as_millis() as u64, "Sync scheduled");
    }

    /// Feed observed mutations. Returns true if they scheduled a pass.
    pub fn notify(&mut self, now: Instant, mutations: &[Mutation]) -> bool {
        if self.locked || !mutations.iter().any(Mutation::adds_items) {
            return false;
        }
        self.request(now, Duration::ZERO);
        true
    }

    /// Take the lock for a timer that has come due
    pub fn begin_run(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.timer = None;
        self.locked = true;
        true
    }

    /// Take the lock for an immediate pass, leaving any pending timer armed.
    /// Fails (and defers) if a pass is already running.
    pub fn begin_immediate(&mut self) -> bool {
        if self.locked {
            self.deferred = true;
            return false;
        }
        self.locked = true;
        true
    }

    /// Release the lock; a deferred request is retried after [`RETRY_DELAY`]
    pub fn finish_run(&mut self, now: Instant) {
        if !self.locked {
            return;
        }
        self.locked = false;
        self.runs += 1;

        if std::mem::take(&mut self.deferred) {
            self.request(now, RETRY_DELAY);
        }
    }

    /// Drop the pending timer. A pass already running is not interrupted.
    pub fn cancel(&mut self) {
        self.timer = None;
        self.deferred = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDED: Mutation = Mutation::ChildList { added: 1, removed: 0 };

    #[test]
    fn test_new_request_supersedes_pending() {
        let now = Instant::now();
        let mut scheduler = SyncScheduler::new();

        scheduler.request(now, Duration::from_secs(5));
        scheduler.request(now, Duration::ZERO);

        assert_eq!(scheduler.state(), SyncState::Scheduled { deadline: now });
        assert!(scheduler.is_due(now));
    }

    #[test]
    fn test_burst_of_mutations_runs_once() {
        let now = Instant::now();
        let mut scheduler = SyncScheduler::new();

        for _ in 0..10 {
            assert!(scheduler.notify(now, &[ADDED]));
        }

        assert!(scheduler.begin_run(now));
        scheduler.finish_run(now);
        assert!(!scheduler.begin_run(now));
        assert_eq!(scheduler.runs(), 1);
        assert_eq!(scheduler.state(), SyncState::Idle);
    }

    #[test]
    fn test_non_additions_are_ignored() {
        let mut scheduler = SyncScheduler::new();
        let now = Instant::now();
        assert!(!scheduler.notify(now, &[Mutation::Attributes { count: 3 }]));
        assert!(!scheduler.notify(now, &[Mutation::ChildList { added: 0, removed: 1 }]));
        assert_eq!(scheduler.state(), SyncState::Idle);
    }

    #[test]
    fn test_mutations_while_running_do_not_reschedule() {
        let now = Instant::now();
        let mut scheduler = SyncScheduler::new();
        scheduler.request(now, Duration::ZERO);
        assert!(scheduler.begin_run(now));

        assert!(!scheduler.notify(now, &[ADDED]));
        scheduler.finish_run(now);

        assert_eq!(scheduler.state(), SyncState::Idle);
    }

    #[test]
    fn test_request_while_running_is_deferred() {
        let now = Instant::now();
        let mut scheduler = SyncScheduler::new();
        scheduler.request(now, Duration::ZERO);
        assert!(scheduler.begin_run(now));

        scheduler.request(now, Duration::ZERO);
        assert_eq!(scheduler.state(), SyncState::Running);
        assert_eq!(scheduler.deadline(), None);

        scheduler.finish_run(now);
        assert_eq!(
            scheduler.state(),
            SyncState::Scheduled { deadline: now + RETRY_DELAY }
        );
    }

    #[test]
    fn test_not_due_before_deadline() {
        let now = Instant::now();
        let mut scheduler = SyncScheduler::new();
        scheduler.request(now, Duration::from_secs(5));

        assert!(!scheduler.begin_run(now + Duration::from_secs(4)));
        assert!(scheduler.begin_run(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_immediate_run_keeps_timer() {
        let now = Instant::now();
        let mut scheduler = SyncScheduler::new();
        scheduler.request(now, Duration::from_secs(5));

        assert!(scheduler.begin_immediate());
        assert!(!scheduler.begin_immediate());
        scheduler.finish_run(now);

        // Deferred immediate request supersedes the startup timer
        assert_eq!(
            scheduler.state(),
            SyncState::Scheduled { deadline: now + RETRY_DELAY }
        );
    }

    #[test]
    fn test_cancel() {
        let now = Instant::now();
        let mut scheduler = SyncScheduler::new();
        scheduler.request(now, Duration::from_secs(1));
        scheduler.cancel();
        assert_eq!(scheduler.state(), SyncState::Idle);
        assert!(!scheduler.begin_run(now + Duration::from_secs(2)));
    }
}
