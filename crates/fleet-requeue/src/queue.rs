//! Pending re-evaluation deadlines, one per placement.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

/// Coalescing requeue queue.
///
/// Each placement has at most one pending deadline. Scheduling a later
/// deadline for a placement that already has an earlier one is a no-op.
#[derive(Debug, Default)]
pub struct RequeueQueue {
    pending: BTreeMap<String, Instant>,
}

impl RequeueQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a re-evaluation of `key` at `at`.
    ///
    /// Returns true if this moved the placement's deadline.
    pub fn schedule(&mut self, key: &str, at: Instant) -> bool {
        match self.pending.get_mut(key) {
            Some(existing) if *existing <= at => false,
            Some(existing) => {
                *existing = at;
                true
            }
            None => {
                self.pending.insert(key.to_string(), at);
                true
            }
        }
    }

    /// Request a re-evaluation of `key` `after` from `now`.
    ///
    /// Delays too large to represent are dropped.
    pub fn schedule_after(&mut self, key: &str, after: Duration, now: Instant) -> bool {
        match now.checked_add(after) {
            Some(at) => self.schedule(key, at),
            None => false,
        }
    }

    pub fn cancel(&mut self, key: &str) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn deadline(&self, key: &str) -> Option<Instant> {
        self.pending.get(key).copied()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every key due at `now`, in key order.
    pub fn pop_due(&mut self, now: Instant) -> Vec<String> {
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.pending.remove(key);
        }
        due
    }

    /// Drop deadlines for placements `keep` rejects.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.pending.retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
