//! One-shot timer capability

use std::time::Duration;

/// Identity of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Source of one-shot timers
///
/// A scheduled timer fires once, after which the owner of the event loop
/// hands its id back to whoever scheduled it.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Cancelling an unknown or already fired timer does nothing
    fn cancel(&mut self, id: TimerId);
}

/// Scheduler whose timers fire only when asked to
///
/// Useful for tests and for batch drivers that don't need wall-clock time.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    elapsed: Duration,
    pending: Vec<(TimerId, Duration)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers waiting to fire
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Simulated time advanced by fired timers
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Fire the timer with the earliest deadline
    pub fn fire_next(&mut self) -> Option<TimerId> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, (id, due))| (*due, *id))
            .map(|(index, _)| index)?;
        let (id, due) = self.pending.remove(index);
        self.elapsed = self.elapsed.max(due);
        Some(id)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push((id, self.elapsed + delay));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|(pending, _)| *pending != id);
    }
}
