//! Per-subject detector state.

use std::ops::ControlFlow;

use vigil_core::Location;

use super::{
    Blackmarks, CombatState, ExploitGuard, KnockbackState, MovementState, Scope, StrikeLedger,
};

/// All analysis state for one subject.
///
/// Each concern lives in its own component; the methods that update a
/// component live next to it.
#[derive(Clone, Debug, Default)]
pub struct Detector {
    pub(crate) movement: MovementState,
    pub(crate) knockback: KnockbackState,
    pub(crate) combat: CombatState,
    pub(crate) strikes: StrikeLedger,
    pub(crate) blackmarks: Blackmarks,
    pub(crate) exploit: ExploitGuard,
}

impl Detector {
    /// Fresh detector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Movement counters.
    #[must_use]
    pub fn movement(&self) -> &MovementState {
        &self.movement
    }

    /// Knockback counters.
    #[must_use]
    pub fn knockback(&self) -> &KnockbackState {
        &self.knockback
    }

    /// Combat counters.
    #[must_use]
    pub fn combat(&self) -> &CombatState {
        &self.combat
    }

    /// Strike accumulator.
    #[must_use]
    pub fn strikes(&self) -> &StrikeLedger {
        &self.strikes
    }

    /// Blackmarks.
    #[must_use]
    pub fn blackmarks(&self) -> &Blackmarks {
        &self.blackmarks
    }

    /// Vitals override state.
    #[must_use]
    pub fn exploit(&self) -> &ExploitGuard {
        &self.exploit
    }

    /// Clears cadence counters.
    pub fn reset_attack_speed(&mut self) {
        self.combat.reset_speed();
    }

    /// Clears all combat counters.
    pub fn reset_attack(&mut self) {
        self.combat.reset();
    }

    /// Clears the current airborne episode.
    pub fn reset_flight(&mut self) {
        self.movement.reset_flight();
    }

    /// Clears the airborne episode and the fly-hack signature counters.
    pub fn reset_flight_history(&mut self) {
        self.movement.reset_flight_history();
    }

    /// Clears the cumulative distance window.
    pub fn reset_blink(&mut self) {
        self.movement.reset_blink();
    }

    /// Clears all movement state.
    pub fn reset_movement(&mut self) {
        self.movement.reset();
    }

    /// Clears the pending knockback and the counter.
    pub fn reset_knockback(&mut self) {
        self.knockback.reset();
    }

    /// Clears strikes, reasons and the last strike time.
    pub fn reset_strikes(&mut self) {
        self.strikes = StrikeLedger::default();
    }

    /// Clears everything except blackmarks and vitals override state.
    pub fn reset(&mut self) {
        self.reset_attack();
        self.reset_movement();
        self.reset_knockback();
        self.reset_strikes();
    }

    /// Issues a verdict. Always returns `Break`.
    pub(crate) fn convict(
        &mut self,
        scope: &mut Scope<'_>,
        certain: bool,
        reason: String,
    ) -> ControlFlow<()> {
        self.reset();
        scope.convict(certain, reason);
        ControlFlow::Break(())
    }

    /// The host rejected a move; remember where it snapped back to.
    pub(crate) fn on_cancelled_move(&mut self, location: Location) {
        self.movement.cancelled_location = Some(location);
    }

    /// The subject teleported.
    pub(crate) fn on_teleport(&mut self) {
        self.reset_flight();
        self.reset_blink();
        self.movement.teleported = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teleport_sets_one_shot_flag() {
        let mut detector = Detector::new();
        detector.on_teleport();
        assert!(detector.movement().is_teleported());
        detector.reset_movement();
        assert!(!detector.movement().is_teleported());
    }

    #[test]
    fn test_reset_keeps_blackmarks() {
        let mut detector = Detector::new();
        detector.blackmarks.give(0, 2, 60_000);
        detector.strikes.record(0, 300, "a", "b", false, 26_000, 1_000);
        detector.reset();
        assert_eq!(detector.strikes().total(), 0);
        assert_eq!(detector.strikes().last_strike(), None);
        assert_eq!(detector.blackmarks().count(), 2);
    }
}
