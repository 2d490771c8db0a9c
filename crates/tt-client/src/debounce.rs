//! Trailing-edge debouncer
//!
//! Used for terminal resizes: a burst of resize events collapses into one
//! report carrying the last value, sent once the burst has been quiet for
//! the configured period.

use std::time::Duration;

use tokio::time::Instant;

/// Holds the latest value until it has been quiet long enough
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a new value, restarting the quiet period
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.quiet, value));
    }

    /// When the pending value becomes due, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    /// Take the pending value if its quiet period has elapsed
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((at, _)) if at <= now => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
