//! # Knockback Evasion
//!
//! A melee hit pushes the victim away and up. The expected impulse is
//! recorded on the hit; the victim's next moves must show vertical motion
//! within a short window or the anti-knockback counter grows.

use std::ops::ControlFlow;

use vigil_core::constants::{KNOCKBACK_FACTOR, KNOCKBACK_MAX_Y};
use vigil_core::{PlayerSnapshot, Vec3};

use super::{Detector, Millis, Scope};

/// How long the victim has to show upward motion.
const KNOCKBACK_TIMEOUT_MS: u64 = 500;
/// A new hit while the previous impulse is older than this counts double.
const CONSECUTIVE_KNOCKBACK_MS: u64 = 300;
/// Counter value that triggers the alert.
const ANTI_KNOCKBACK_TRIGGER: u32 = 24;
/// Ignore impulses too small to see.
const MIN_IMPULSE_SQUARED: f64 = 0.0001;

/// Per-subject knockback tracking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KnockbackState {
    last_knockback: Option<Millis>,
    expected: Option<Vec3>,
    anti_knockback: u32,
}

impl KnockbackState {
    /// Current counter.
    #[must_use]
    pub const fn anti_knockback(&self) -> u32 {
        self.anti_knockback
    }

    /// Impulse the victim should be showing.
    #[must_use]
    pub const fn expected(&self) -> Option<Vec3> {
        self.expected
    }

    /// Time of the last unverified knockback.
    #[must_use]
    pub const fn last_knockback(&self) -> Option<Millis> {
        self.last_knockback
    }

    /// Forgets the pending knockback and the counter.
    pub fn reset(&mut self) {
        self.last_knockback = None;
        self.expected = None;
        self.anti_knockback = 0;
    }
}

/// Impulse a victim receives from a melee hit by `damager`.
///
/// Half the victim's current velocity, pushed away from the damager
/// horizontally and lifted vertically, capped at the vanilla maximum.
#[must_use]
pub fn expected_knockback(victim: &PlayerSnapshot, damager: &PlayerSnapshot) -> Vec3 {
    let mut direction = victim.location.to_vec() - damager.location.to_vec();
    direction.y = 0.0;
    let direction = direction.normalize();

    let motion = victim.velocity * 0.5;
    let x = motion.x + direction.x * KNOCKBACK_FACTOR;
    let z = motion.z + direction.z * KNOCKBACK_FACTOR;
    let y = (motion.y + KNOCKBACK_FACTOR).min(KNOCKBACK_MAX_Y);
    Vec3::new(x, y, z)
}

impl Detector {
    /// The subject was hit by another player.
    pub(crate) fn on_knockback(
        &mut self,
        scope: &mut Scope<'_>,
        damager: &PlayerSnapshot,
    ) -> ControlFlow<()> {
        if let Some(last) = self.knockback.last_knockback {
            let elapsed = scope.now.checked_sub(last).unwrap_or(0);
            if elapsed > CONSECUTIVE_KNOCKBACK_MS {
                return self.add_anti_knockback(scope, 6, 1);
            }
            return ControlFlow::Continue(());
        }

        let impulse = expected_knockback(&scope.player, damager);
        if impulse.length_squared() < MIN_IMPULSE_SQUARED {
            verbose!(scope, "Negligible knockback for {}", scope.name());
            return ControlFlow::Continue(());
        }

        verbose!(scope, "Expecting knockback {} for {}", impulse, scope.name());
        self.knockback.expected = Some(impulse);
        self.knockback.last_knockback = Some(scope.now);
        ControlFlow::Continue(())
    }

    /// Verifies a pending knockback against a move.
    pub(crate) fn check_knockback(
        &mut self,
        scope: &mut Scope<'_>,
        delta_v4s: i32,
    ) -> ControlFlow<()> {
        let Some(last) = self.knockback.last_knockback else {
            return ControlFlow::Continue(());
        };
        let Some(elapsed) = scope.now.checked_sub(last) else {
            return ControlFlow::Continue(());
        };

        let in_window = elapsed <= KNOCKBACK_TIMEOUT_MS;
        if in_window && delta_v4s <= 0 {
            return ControlFlow::Continue(());
        }

        self.knockback.last_knockback = None;
        self.knockback.expected = None;

        if in_window {
            if self.knockback.anti_knockback > 0 {
                self.knockback.anti_knockback -= 1;
            }
            verbose!(scope, "Knockback passed for {}: {} ms", scope.name(), elapsed);
            ControlFlow::Continue(())
        } else {
            self.add_anti_knockback(scope, 5, 2)
        }
    }

    fn add_anti_knockback(&mut self, scope: &mut Scope<'_>, amount: u32, id: u8) -> ControlFlow<()> {
        self.knockback.anti_knockback = self.knockback.anti_knockback.saturating_add(amount);
        debug!(
            scope,
            "Anti-knockback#{} for {}: {}",
            id,
            scope.name(),
            self.knockback.anti_knockback
        );

        if self.knockback.anti_knockback >= ANTI_KNOCKBACK_TRIGGER {
            info!(
                "TRIGGERED anti-knockback#{}: {}; {}",
                id,
                scope.name(),
                self.knockback.anti_knockback
            );
            if scope.config.enforce_anti_knockback {
                return self.convict(scope, false, format!("anti-knockback#{id}"));
            }
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{Location, SubjectId};

    #[test]
    fn test_expected_knockback() {
        let victim = PlayerSnapshot::new(SubjectId::from_u128(1), "v", Location::new(1.0, 64.0, 0.0));
        let damager = PlayerSnapshot::new(SubjectId::from_u128(2), "d", Location::new(0.0, 64.0, 0.0));

        let impulse = expected_knockback(&victim, &damager);
        assert!((impulse.x - 0.4).abs() < 1e-9);
        assert!(impulse.z.abs() < 1e-9);
        assert!((impulse.y - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_vertical_impulse_is_capped() {
        let mut victim = PlayerSnapshot::new(SubjectId::from_u128(1), "v", Location::new(0.0, 64.0, 1.0));
        victim.velocity = Vec3::new(0.0, 0.5, 0.0);
        let damager = PlayerSnapshot::new(SubjectId::from_u128(2), "d", Location::new(0.0, 64.0, 0.0));

        let impulse = expected_knockback(&victim, &damager);
        assert_eq!(impulse.y, KNOCKBACK_MAX_Y);
    }
}
