//! Tick-driven debounce for coalescing writes of successive state versions.
//!
//! The caller owns the clock: it reports each new version with
//! [`Debouncer::schedule`] and periodically asks [`Debouncer::poll`] whether a
//! quiet period has elapsed.

use std::time::{Duration, Instant};

/// Default quiet period before a pending version is flushed.
pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    version: u64,
    deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending version and restarts the quiet period at `now`.
    pub fn schedule(&mut self, version: u64, now: Instant) {
        self.pending = Some(Pending {
            version,
            deadline: now + self.delay,
        });
    }

    /// Returns the pending version once its deadline has passed, clearing it.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        match self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending = None;
                Some(pending.version)
            }
            _ => None,
        }
    }

    /// Returns the pending version immediately, regardless of its deadline.
    pub fn take_pending(&mut self) -> Option<u64> {
        self.pending.take().map(|pending| pending.version)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.deadline)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_PERSIST_DEBOUNCE)
    }
}
