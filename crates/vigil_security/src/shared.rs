//! # Shared Heuristics
//!
//! Hosts that dispatch events off the main thread share one detector
//! through [`SharedHeuristics`]. Every event, tick and registry mutation
//! takes the same lock, so per-subject state is never seen half-updated.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::HostEvent;
use crate::heuristics::{Heuristics, Millis, Verdict};
use crate::host::Host;

/// Cloneable, thread-safe handle to a [`Heuristics`].
pub struct SharedHeuristics<H: Host> {
    inner: Arc<Mutex<Heuristics<H>>>,
}

impl<H: Host> Clone for SharedHeuristics<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: Host> SharedHeuristics<H> {
    /// Wraps a detector.
    #[must_use]
    pub fn new(heuristics: Heuristics<H>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(heuristics)),
        }
    }

    /// Delivers one event, stamped with `now`.
    ///
    /// Setting the clock and handling happen under one lock so events from
    /// different threads never see each other's timestamps.
    pub fn handle_at(&self, now: Millis, event: HostEvent) {
        let mut heuristics = self.inner.lock();
        heuristics.set_time(now);
        heuristics.handle(event);
    }

    /// Delivers one event at the current clock.
    pub fn handle(&self, event: HostEvent) {
        self.inner.lock().handle(event);
    }

    /// Advances one server tick.
    pub fn tick(&self) {
        self.inner.lock().tick();
    }

    /// Sets the wall clock.
    pub fn set_time(&self, now: Millis) {
        self.inner.lock().set_time(now);
    }

    /// Takes ownership of issued verdicts.
    pub fn take_verdicts(&self) -> Vec<Verdict> {
        self.inner.lock().take_verdicts()
    }

    /// Runs `f` with exclusive access to the detector.
    pub fn with<R>(&self, f: impl FnOnce(&mut Heuristics<H>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
