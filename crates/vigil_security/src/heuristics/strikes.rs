//! # Strikes and Blackmarks
//!
//! Two accumulators feed verdicts:
//!
//! - **Strikes**: weighted suspicion from every detector. Idle for longer
//!   than the strike timeout and the total starts over.
//! - **Blackmarks**: coarse marks from combat patterns. Partly forgiven on
//!   death.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use super::{Detector, Millis, Scope};

/// Result of recording one strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrikeOutcome {
    /// Total after the strike.
    pub total: u32,
    /// The previous total was discarded as stale.
    pub decayed: bool,
    /// The limit was reached.
    pub struck_out: bool,
}

/// Weighted strike accumulator with timeout decay.
#[derive(Clone, Debug, Default)]
pub struct StrikeLedger {
    total: u32,
    last_strike: Option<Millis>,
    debug_reasons: BTreeSet<String>,
    public_reasons: BTreeSet<String>,
}

impl StrikeLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current total.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Time of the last recorded strike.
    #[must_use]
    pub const fn last_strike(&self) -> Option<Millis> {
        self.last_strike
    }

    /// Accumulated debug reasons.
    #[must_use]
    pub fn debug_reasons(&self) -> &BTreeSet<String> {
        &self.debug_reasons
    }

    /// Accumulated public reasons.
    #[must_use]
    pub fn public_reasons(&self) -> &BTreeSet<String> {
        &self.public_reasons
    }

    /// Records a strike of `amount` at `now`.
    ///
    /// Unless `skip_reset` is set, a gap of more than `timeout_ms` since the
    /// previous strike discards the previous total and reasons first. A
    /// timestamp earlier than the previous strike is treated as no gap.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        now: Millis,
        amount: u32,
        debug_reason: &str,
        public_reason: &str,
        skip_reset: bool,
        timeout_ms: u64,
        limit: u32,
    ) -> StrikeOutcome {
        let mut decayed = false;
        if !skip_reset {
            let stale = self
                .last_strike
                .and_then(|last| now.checked_sub(last))
                .is_some_and(|elapsed| elapsed > timeout_ms);
            if stale {
                decayed = self.total > 0;
                self.reset();
            }
        }

        self.total = self.total.saturating_add(amount);
        self.debug_reasons.insert(debug_reason.to_string());
        self.public_reasons.insert(public_reason.to_string());
        self.last_strike = Some(now);

        StrikeOutcome {
            total: self.total,
            decayed,
            struck_out: self.total >= limit,
        }
    }

    /// Zeroes the total and forgets all reasons.
    pub fn reset(&mut self) {
        self.total = 0;
        self.debug_reasons.clear();
        self.public_reasons.clear();
    }

    /// Debug reasons joined for logging.
    #[must_use]
    pub fn joined_debug_reasons(&self) -> String {
        join(&self.debug_reasons)
    }

    /// Public reasons joined for the verdict.
    #[must_use]
    pub fn joined_public_reasons(&self) -> String {
        join(&self.public_reasons)
    }
}

fn join(reasons: &BTreeSet<String>) -> String {
    reasons.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Blackmark counter with idle timeout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Blackmarks {
    count: u32,
    last: Option<Millis>,
}

impl Blackmarks {
    /// Current count.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Adds `n` marks and returns the new count.
    ///
    /// Marks older than `timeout_ms` are wiped before adding.
    pub fn give(&mut self, now: Millis, n: u32, timeout_ms: u64) -> u32 {
        let stale = self
            .last
            .and_then(|last| now.checked_sub(last))
            .is_some_and(|elapsed| elapsed >= timeout_ms);
        if stale {
            self.count = 0;
        }
        self.count = self.count.saturating_add(n);
        self.last = Some(now);
        self.count
    }

    /// Removes up to `n` marks and returns the new count.
    pub fn forgive(&mut self, n: u32) -> u32 {
        self.count = self.count.saturating_sub(n);
        self.count
    }
}

impl Detector {
    /// Records a strike and convicts on reaching the limit.
    ///
    /// `certain` defaults to `amount >= 100`. Returns `Break` if the strike
    /// produced a verdict.
    pub(crate) fn strike(
        &mut self,
        scope: &mut Scope<'_>,
        amount: u32,
        certain: Option<bool>,
        debug_reason: &str,
        public_reason: &str,
        skip_reset: bool,
    ) -> ControlFlow<()> {
        if !scope.enabled() {
            return ControlFlow::Continue(());
        }
        let certain = certain.unwrap_or(amount >= 100);
        let previous = self.strikes.total();

        let outcome = self.strikes.record(
            scope.now,
            amount,
            debug_reason,
            public_reason,
            skip_reset,
            scope.config.strike_timeout_ms,
            scope.config.strike_limit,
        );
        if outcome.decayed {
            debug!(scope, "Strikes reset for {}: {}", scope.name(), previous);
        }

        if amount > 0 {
            info!(
                "STRIKE {} +{} = {}: {}; {}",
                scope.name(),
                amount,
                outcome.total,
                debug_reason,
                public_reason
            );
        } else {
            debug!(scope, "Null strike {}: {}", scope.name(), debug_reason);
        }

        if outcome.struck_out {
            info!(
                "STRUCK OUT: {} for {}",
                scope.name(),
                self.strikes.joined_debug_reasons()
            );
            let reason = format!("hack client: {}", self.strikes.joined_public_reasons());
            return self.convict(scope, certain, reason);
        }
        ControlFlow::Continue(())
    }

    /// Adds blackmarks and convicts on reaching the maximum.
    pub(crate) fn give_blackmarks(&mut self, scope: &mut Scope<'_>, n: u32) -> ControlFlow<()> {
        if !scope.enabled() {
            return ControlFlow::Continue(());
        }
        self.reset();

        let timeout_ms = scope.config.blackmarks_timeout_secs.saturating_mul(1_000);
        let count = self.blackmarks.give(scope.now, n, timeout_ms);
        debug!(scope, "Blackmarks for {}: {}", scope.name(), count);

        if count >= scope.config.max_blackmarks {
            return self.convict(scope, true, "killaura/auto-click".to_string());
        }
        ControlFlow::Continue(())
    }

    /// Removes blackmarks, typically on death.
    pub(crate) fn forgive_blackmarks(&mut self, scope: &mut Scope<'_>, n: u32) {
        if self.blackmarks.count() > 0 {
            let count = self.blackmarks.forgive(n);
            debug!(scope, "Forgiven {}: {} blackmarks left", scope.name(), count);
        }
        self.reset_attack();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ledger: &mut StrikeLedger, now: Millis, amount: u32) -> StrikeOutcome {
        ledger.record(now, amount, "test:debug", "test", false, 26_000, 1_000)
    }

    #[test]
    fn test_strikes_accumulate() {
        let mut ledger = StrikeLedger::new();
        record(&mut ledger, 0, 200);
        let outcome = record(&mut ledger, 1_000, 300);
        assert_eq!(outcome.total, 500);
        assert!(!outcome.struck_out);
        assert!(record(&mut ledger, 2_000, 500).struck_out);
    }

    #[test]
    fn test_strikes_decay_after_timeout() {
        let mut ledger = StrikeLedger::new();
        record(&mut ledger, 0, 50);
        let outcome = record(&mut ledger, 30_000, 50);
        assert!(outcome.decayed);
        assert_eq!(ledger.total(), 50);
    }

    #[test]
    fn test_strikes_skip_reset() {
        let mut ledger = StrikeLedger::new();
        record(&mut ledger, 0, 50);
        let outcome = ledger.record(30_000, 0, "flight:inAirScore", "flight", true, 26_000, 1_000);
        assert!(!outcome.decayed);
        assert_eq!(outcome.total, 50);
    }

    #[test]
    fn test_strikes_clock_going_backwards() {
        let mut ledger = StrikeLedger::new();
        record(&mut ledger, 50_000, 50);
        record(&mut ledger, 10_000, 50);
        assert_eq!(ledger.total(), 100);
    }

    #[test]
    fn test_null_strike_keeps_reasons() {
        let mut ledger = StrikeLedger::new();
        ledger.record(0, 0, "flight:inAirScore", "flight", false, 26_000, 1_000);
        ledger.record(10, 100, "speed:anti-slow", "speed", false, 26_000, 1_000);
        assert_eq!(ledger.total(), 100);
        assert_eq!(ledger.joined_public_reasons(), "flight, speed");
    }

    #[test]
    fn test_blackmarks() {
        let mut marks = Blackmarks::default();
        assert_eq!(marks.give(0, 1, 60_000), 1);
        assert_eq!(marks.give(1_000, 2, 60_000), 3);
        assert_eq!(marks.forgive(2), 1);
        assert_eq!(marks.forgive(5), 0);
    }

    #[test]
    fn test_blackmarks_timeout() {
        let mut marks = Blackmarks::default();
        marks.give(0, 3, 60_000);
        assert_eq!(marks.give(60_000, 1, 60_000), 1);
    }
}
