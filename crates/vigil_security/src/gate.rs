//! # Warm-up Gate
//!
//! World loading produces wild movement deltas. Nothing is analyzed until a
//! fixed number of ticks has passed since the detector was armed.

/// Gate state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GateState {
    /// Not armed; events are ignored.
    #[default]
    Idle,
    /// Armed; opens at the given tick.
    Warming {
        /// Tick at which the gate opens.
        ready_at: u64,
    },
    /// Open; events are analyzed.
    Ready,
}

/// One-shot warm-up timer.
#[derive(Clone, Debug, Default)]
pub struct ReadyGate {
    state: GateState,
}

impl ReadyGate {
    /// A closed, unarmed gate.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: GateState::Idle }
    }

    /// An already open gate, for hosts that do their own warm-up.
    #[must_use]
    pub const fn open() -> Self {
        Self { state: GateState::Ready }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    /// Whether events should be analyzed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, GateState::Ready)
    }

    /// Starts (or restarts) the warm-up. The gate closes until it elapses.
    pub fn arm(&mut self, now_tick: u64, warmup_ticks: u64) {
        self.cancel();
        tracing::info!("Waiting until ready: {} ticks", warmup_ticks);
        self.state = GateState::Warming {
            ready_at: now_tick.saturating_add(warmup_ticks),
        };
    }

    /// Cancels a pending warm-up. Safe to call any number of times.
    ///
    /// Returns `true` if a pending timer was cancelled.
    pub fn cancel(&mut self) -> bool {
        if let GateState::Warming { .. } = self.state {
            self.state = GateState::Idle;
            true
        } else {
            false
        }
    }

    /// Closes the gate entirely.
    pub fn shut(&mut self) {
        self.cancel();
        self.state = GateState::Idle;
    }

    /// Advances the timer. Returns `true` on the tick the gate opens.
    pub fn poll(&mut self, now_tick: u64) -> bool {
        match self.state {
            GateState::Warming { ready_at } if now_tick >= ready_at => {
                self.state = GateState::Ready;
                tracing::info!("Ready at tick {}", now_tick);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup() {
        let mut gate = ReadyGate::new();
        assert!(!gate.is_ready());
        assert!(!gate.poll(1_000));

        gate.arm(10, 70);
        assert!(!gate.poll(79));
        assert!(!gate.is_ready());
        assert!(gate.poll(80));
        assert!(gate.is_ready());
        // Fires once
        assert!(!gate.poll(81));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut gate = ReadyGate::new();
        gate.arm(0, 70);
        assert!(gate.cancel());
        assert!(!gate.cancel());
        assert!(!gate.poll(100));
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn test_shut_closes_open_gate() {
        let mut gate = ReadyGate::open();
        assert!(gate.is_ready());
        gate.shut();
        assert!(!gate.is_ready());
    }
}
