//! # Exploit Mitigation
//!
//! Right after a kill, some clients auto-eat the moment health drops. For one
//! tick the killer's vitals are overridden to low values so an instant eat
//! gives itself away; the real vitals are then put back.
//!
//! ```text
//! kill ──(40 ticks)──► check ──► override ──(1 tick)──► restore
//!                                   │
//!                damage / eating ───┴──► restore now
//! ```

use vigil_core::{SubjectId, Vitals};

use super::{Detector, Millis, Scope};
use crate::host::VitalsControl;

/// Vitals applied while the check is running.
pub const OVERRIDE_VITALS: Vitals = Vitals::new(1.0, 1, 0.5);

/// Ticks between a kill and the check.
const CHECK_DELAY_TICKS: u64 = 40;
/// Ticks the override stays in place.
const OVERRIDE_TICKS: u64 = 1;
/// Recent damage postpones the check.
const RECENT_DAMAGE_MS: u64 = 2_000;
/// Eating sooner than this after a slot switch is ignored.
const SLOT_SWITCH_GRACE_MS: i64 = 1_000;
/// Eating sooner than this after the override is reported.
const AUTO_EAT_DELAY_MS: u64 = 250;

/// Per-subject override state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExploitGuard {
    saved: Option<Vitals>,
    check_started: Option<Millis>,
    last_damaged: Option<Millis>,
    last_item_held: Option<Millis>,
    check_due: Option<u64>,
    rollback_due: Option<u64>,
}

impl ExploitGuard {
    /// Vitals saved by an active override.
    #[must_use]
    pub const fn saved(&self) -> Option<Vitals> {
        self.saved
    }

    /// Whether an override is in place.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        self.saved.is_some()
    }

    /// Schedules the check, replacing any pending one.
    pub fn schedule_check(&mut self, tick: u64) {
        self.check_due = Some(tick + CHECK_DELAY_TICKS);
    }

    /// Whether any deferred work is due at `tick`.
    #[must_use]
    pub fn has_due_work(&self, tick: u64) -> bool {
        self.check_due.is_some_and(|due| due <= tick)
            || self.rollback_due.is_some_and(|due| due <= tick)
    }

    /// Consumes a due check.
    pub fn take_due_check(&mut self, tick: u64) -> bool {
        take_due(&mut self.check_due, tick)
    }

    /// Consumes a due rollback.
    pub fn take_due_rollback(&mut self, tick: u64) -> bool {
        take_due(&mut self.rollback_due, tick)
    }

    /// Saves `current` and returns the vitals to apply.
    ///
    /// Returns `None` if an override is already in place.
    pub fn engage(&mut self, now: Millis, tick: u64, current: Vitals) -> Option<Vitals> {
        if self.saved.is_some() {
            return None;
        }
        self.saved = Some(current);
        self.check_started = Some(now);
        self.rollback_due = Some(tick + OVERRIDE_TICKS);
        Some(OVERRIDE_VITALS)
    }

    /// Ends the override, returning the vitals to restore.
    ///
    /// Calling this without an override in place returns `None`.
    pub fn rollback(&mut self) -> Option<Vitals> {
        self.rollback_due = None;
        self.saved.take()
    }

    /// Drops all scheduled work.
    pub fn cancel(&mut self) {
        self.check_due = None;
        self.rollback_due = None;
    }

    /// Records damage taken.
    pub fn mark_damaged(&mut self, now: Millis) {
        self.last_damaged = Some(now);
    }

    /// Records a hotbar switch.
    pub fn mark_item_held(&mut self, now: Millis) {
        self.last_item_held = Some(now);
    }
}

fn take_due(slot: &mut Option<u64>, tick: u64) -> bool {
    if slot.is_some_and(|due| due <= tick) {
        *slot = None;
        true
    } else {
        false
    }
}

impl Detector {
    /// The subject killed another player.
    pub(crate) fn on_killed(&mut self, scope: &mut Scope<'_>) {
        if !scope.enabled() || !scope.config.exploit_mitigation_enabled {
            return;
        }
        self.exploit.schedule_check(scope.tick);
    }

    /// Runs deferred work due this tick.
    pub(crate) fn run_scheduled(&mut self, scope: &mut Scope<'_>) {
        if self.exploit.take_due_rollback(scope.tick) {
            self.pop_vitals(scope.player.id, &mut *scope.host);
        }
        if self.exploit.take_due_check(scope.tick) {
            self.run_exploit_check(scope);
        }
    }

    fn run_exploit_check(&mut self, scope: &mut Scope<'_>) {
        if !scope.enabled() {
            return;
        }
        let vitals = scope.player.vitals;
        if vitals.health < scope.player.max_health / 3.0 {
            return;
        }

        let recently_damaged = self
            .exploit
            .last_damaged
            .and_then(|t| scope.now.checked_sub(t))
            .is_some_and(|elapsed| elapsed <= RECENT_DAMAGE_MS);
        if recently_damaged {
            self.exploit.schedule_check(scope.tick);
            return;
        }

        if let Some(apply) = self.exploit.engage(scope.now, scope.tick, vitals) {
            verbose!(scope, "Overriding vitals for {}", scope.name());
            scope.host.override_vitals(scope.player.id, apply);
        }
    }

    /// Puts saved vitals back, if any.
    pub(crate) fn pop_vitals<V: VitalsControl + ?Sized>(&mut self, id: SubjectId, vitals: &mut V) {
        if let Some(saved) = self.exploit.rollback() {
            vitals.restore_vitals(id, saved);
        }
    }

    /// The subject took damage of any kind.
    pub(crate) fn on_damaged(&mut self, scope: &mut Scope<'_>) {
        self.exploit.mark_damaged(scope.now);
        if self.exploit.check_started.take().is_some() {
            self.pop_vitals(scope.player.id, &mut *scope.host);
        }
    }

    /// The subject switched from a non-edible item to an edible one.
    pub(crate) fn on_eating(&mut self, scope: &mut Scope<'_>) {
        let Some(started) = self.exploit.check_started else {
            return;
        };
        self.pop_vitals(scope.player.id, &mut *scope.host);

        let since_switch = self
            .exploit
            .last_item_held
            .and_then(|t| scope.now.checked_sub(t))
            .map_or(-1, |elapsed| i64::try_from(elapsed).unwrap_or(i64::MAX));
        let delay = scope.now.saturating_sub(started);
        debug!(
            scope,
            "{} eating {} ms after override, {} ms after slot switch",
            scope.name(),
            delay,
            since_switch
        );

        if since_switch < SLOT_SWITCH_GRACE_MS {
            return;
        }
        if delay < AUTO_EAT_DELAY_MS {
            info!("{} appears to be using autosoup: {} ms", scope.name(), delay);
        }
        self.exploit.check_started = None;
    }

    /// The subject switched hotbar slot.
    pub(crate) fn on_item_held(&mut self, now: Millis) {
        self.exploit.mark_item_held(now);
    }

    /// Cancels scheduled work and restores vitals. Used when the subject
    /// leaves.
    pub(crate) fn close<V: VitalsControl + ?Sized>(&mut self, id: SubjectId, vitals: &mut V) {
        self.exploit.cancel();
        self.pop_vitals(id, vitals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engage_and_rollback() {
        let mut guard = ExploitGuard::default();
        let real = Vitals::new(18.0, 17, 3.0);

        assert_eq!(guard.engage(0, 100, real), Some(OVERRIDE_VITALS));
        assert!(guard.is_engaged());
        assert!(guard.has_due_work(101));
        assert_eq!(guard.rollback(), Some(real));
        assert!(!guard.is_engaged());
    }

    #[test]
    fn test_engage_does_not_resave() {
        let mut guard = ExploitGuard::default();
        let real = Vitals::new(18.0, 17, 3.0);
        guard.engage(0, 100, real);
        // A second engage would otherwise save the override as the real vitals
        assert_eq!(guard.engage(10, 100, OVERRIDE_VITALS), None);
        assert_eq!(guard.rollback(), Some(real));
    }

    #[test]
    fn test_rollback_is_idempotent() {
        let mut guard = ExploitGuard::default();
        assert_eq!(guard.rollback(), None);
        guard.engage(0, 0, Vitals::default());
        assert!(guard.rollback().is_some());
        assert_eq!(guard.rollback(), None);
    }

    #[test]
    fn test_scheduling() {
        let mut guard = ExploitGuard::default();
        guard.schedule_check(10);
        assert!(!guard.has_due_work(49));
        assert!(!guard.take_due_check(49));
        assert!(guard.take_due_check(50));
        assert!(!guard.take_due_check(51));

        guard.schedule_check(10);
        guard.cancel();
        assert!(!guard.has_due_work(100));
    }
}
