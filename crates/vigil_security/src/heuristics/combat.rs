//! # Combat Analysis
//!
//! Melee hits and misses reveal three kinds of cheats:
//!
//! - **Reach**: hits landed from too far away
//! - **Aim**: the look vector lands on the target with repeating error
//! - **Cadence**: attacks faster than a human can click

use std::collections::VecDeque;
use std::ops::ControlFlow;

use vigil_core::{NearbyEntity, PlayerSnapshot};

use super::{Detector, Millis, Scope, MISS_SEARCH_RADIUS};
use crate::host::PlayerDirectory;

/// Aim samples kept per subject.
pub const AIM_WINDOW: usize = 10;

/// Attacks closer together than this count as high-speed.
const HIGH_SPEED_MS: u64 = 75;
/// Attacks further apart than this end the combat session.
const COMBAT_TIMEOUT_MS: u64 = 1_750;

const SUSPICIOUS_HITS_LIMIT: u32 = 3;
const HIT_AIMS_LIMIT: u32 = 6;
const MISS_AIMS_LIMIT: u32 = 8;
const FAR_HITS_LIMIT: u32 = 48;
const HIGH_SPEED_STRIKE: u32 = 5;
const HIGH_SPEED_LIMIT: u32 = 10;

const VERY_FAR_REACH: f64 = 6.2;
const FAR_REACH: f64 = 5.7;
const LONG_REACH: f64 = 4.2;

/// Spread of recent aim errors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimSpread {
    /// Max minus min of horizontal error.
    pub horizontal: f64,
    /// Max minus min of vertical error.
    pub vertical: f64,
}

/// Rolling buffer of aim errors, newest last.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AimWindow {
    horizontal: VecDeque<f64>,
    vertical: VecDeque<f64>,
}

impl AimWindow {
    /// Empty window.
    #[must_use]
    pub fn new() -> Self {
        Self {
            horizontal: VecDeque::with_capacity(AIM_WINDOW),
            vertical: VecDeque::with_capacity(AIM_WINDOW),
        }
    }

    /// Adds a sample, evicting the oldest once full.
    pub fn push(&mut self, horizontal: f64, vertical: f64) {
        if self.horizontal.len() == AIM_WINDOW {
            self.horizontal.pop_front();
            self.vertical.pop_front();
        }
        self.horizontal.push_back(horizontal);
        self.vertical.push_back(vertical);
    }

    /// Samples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.horizontal.len()
    }

    /// Whether no samples are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty()
    }

    /// Horizontal samples, oldest first.
    pub fn horizontal(&self) -> impl Iterator<Item = f64> + '_ {
        self.horizontal.iter().copied()
    }

    /// Spread over the held samples, `None` when empty.
    #[must_use]
    pub fn spread(&self) -> Option<AimSpread> {
        Some(AimSpread {
            horizontal: range(&self.horizontal)?,
            vertical: range(&self.vertical)?,
        })
    }
}

fn range(values: &VecDeque<f64>) -> Option<f64> {
    let first = *values.front()?;
    let (min, max) = values
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    Some(max - min)
}

/// Per-subject combat counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CombatState {
    last_attack: Option<Millis>,
    misses: u32,
    suspicious_hits: u32,
    suspicious_aims: u32,
    far_hits: u32,
    high_speed_attacks: u32,
    miss_distance: Option<f64>,
    hit_distance: Option<f64>,
    last_variance_h: Option<f64>,
    aim: AimWindow,
}

impl CombatState {
    /// Misses since the last suspicious hit.
    #[must_use]
    pub const fn misses(&self) -> u32 {
        self.misses
    }

    /// Hits that followed many misses.
    #[must_use]
    pub const fn suspicious_hits(&self) -> u32 {
        self.suspicious_hits
    }

    /// Repeated aim geometry.
    #[must_use]
    pub const fn suspicious_aims(&self) -> u32 {
        self.suspicious_aims
    }

    /// Long-reach counter.
    #[must_use]
    pub const fn far_hits(&self) -> u32 {
        self.far_hits
    }

    /// Attacks in quick succession.
    #[must_use]
    pub const fn high_speed_attacks(&self) -> u32 {
        self.high_speed_attacks
    }

    /// Recent aim errors.
    #[must_use]
    pub fn aim(&self) -> &AimWindow {
        &self.aim
    }

    /// Clears the cadence counters.
    pub fn reset_speed(&mut self) {
        self.suspicious_hits = 0;
        self.misses = 0;
        self.high_speed_attacks = 0;
    }

    /// Clears all combat counters. The aim window is kept.
    pub fn reset(&mut self) {
        self.reset_speed();
        self.miss_distance = None;
        self.hit_distance = None;
        self.last_variance_h = None;
        self.suspicious_aims = 0;
        self.far_hits = 0;
    }
}

impl Detector {
    /// The subject landed a melee hit on `target`.
    pub(crate) fn mark_hit(&mut self, scope: &mut Scope<'_>, target: &PlayerSnapshot) -> ControlFlow<()> {
        if !scope.enabled() {
            return ControlFlow::Continue(());
        }

        let eye = scope.player.eye();
        let target_eye = target.eye();
        let distance = eye.distance(target_eye);
        let looking_at = eye + scope.player.location.direction().normalize() * distance;
        let variance = looking_at - target_eye;
        let variance_h = variance.horizontal_length();
        let variance_v = variance.y;
        self.combat.aim.push(variance_h, variance_v);

        let combat = &mut self.combat;
        let mut aim_repeated = false;
        if combat.misses >= scope.config.miss_threshold {
            combat.suspicious_hits += 1;
            combat.misses = combat.misses.saturating_sub(scope.config.miss_threshold);
            debug!(scope, "Suspicious hit by {}: {}", scope.name(), combat.suspicious_hits);
        }
        // A remembered miss distance is compared against one hit only.
        if combat.miss_distance.take() == Some(distance) && distance > 0.0 {
            combat.suspicious_aims += 1;
            aim_repeated = true;
            debug!(scope, "Hit at miss distance by {}: {}", scope.name(), distance);
        }
        if variance_h > 0.0 && combat.last_variance_h == Some(variance_h) {
            combat.suspicious_aims += 1;
            aim_repeated = true;
            debug!(scope, "Repeated aim error by {}: {:.6}", scope.name(), variance_h);
        }
        combat.last_variance_h = Some(variance_h);
        combat.hit_distance = Some(distance);

        verbose!(
            scope,
            "Hit by {}: distance {:.4}, aim error H:{:.4} V:{:.4}",
            scope.name(),
            distance,
            variance_h,
            variance_v
        );

        self.check_reach(scope, distance)?;
        self.update_cadence(scope, true)?;

        // Only a hit that repeated an aim can convict on the hit side
        if aim_repeated && self.combat.suspicious_aims >= HIT_AIMS_LIMIT {
            return self.convict(scope, true, "aimbot (hit)".to_string());
        }
        if self.combat.suspicious_hits >= SUSPICIOUS_HITS_LIMIT {
            self.give_blackmarks(scope, 1)?;
        }
        if self.combat.far_hits >= FAR_HITS_LIMIT {
            return self.convict(scope, false, "reach hack/excessive lag".to_string());
        }
        ControlFlow::Continue(())
    }

    fn check_reach(&mut self, scope: &mut Scope<'_>, distance: f64) -> ControlFlow<()> {
        if distance >= VERY_FAR_REACH {
            self.combat.far_hits += 8;
            info!("Very far hit by {}: {:.4}", scope.name(), distance);
            self.strike(scope, 100, None, "reach:very far", "reach", false)?;
        } else if distance >= FAR_REACH {
            self.combat.far_hits += 4;
            debug!(scope, "Far hit by {}: {:.4}", scope.name(), distance);
            if self.combat.far_hits > 4 {
                self.strike(scope, 50, None, "reach:far", "reach", false)?;
            }
        }
        if distance >= LONG_REACH {
            self.combat.far_hits += 2;
            verbose!(scope, "Long hit by {}: {:.4}", scope.name(), distance);
        } else if self.combat.far_hits > 0 {
            self.combat.far_hits -= 1;
        }
        ControlFlow::Continue(())
    }

    /// The subject swung at air or at a block.
    pub(crate) fn mark_miss(&mut self, scope: &mut Scope<'_>, air: bool) {
        if !scope.enabled() {
            return;
        }
        self.combat.misses += 1;

        let nearby = scope.host.nearby_entities(scope.player.id, MISS_SEARCH_RADIUS);
        // Swings at mobs are ordinary combat.
        if nearby.iter().any(|e| matches!(e, NearbyEntity::Other)) {
            return;
        }

        let eye = scope.player.eye();
        let nearest = nearby
            .iter()
            .filter_map(|e| match e {
                NearbyEntity::Player(p) => Some(eye.distance(p.eye())),
                NearbyEntity::Other => None,
            })
            .fold(None, |best: Option<f64>, d| Some(best.map_or(d, |b| b.min(d))));

        let air = match nearest {
            None => false,
            Some(distance) => {
                if distance > 0.0 && self.combat.hit_distance == Some(distance) {
                    self.combat.suspicious_aims += 1;
                    self.combat.hit_distance = None;
                    debug!(scope, "Miss at hit distance by {}: {}", scope.name(), distance);
                    if self.combat.suspicious_aims >= MISS_AIMS_LIMIT {
                        let _ = self.convict(scope, true, "aimbot (miss)".to_string());
                        return;
                    }
                }
                self.combat.miss_distance = Some(distance);
                if self.combat.misses > 3 {
                    self.combat.suspicious_aims = 0;
                }
                air
            }
        };

        let _ = self.update_cadence(scope, air);
    }

    /// Tracks the gap between attacks.
    fn update_cadence(&mut self, scope: &mut Scope<'_>, hit_or_air: bool) -> ControlFlow<()> {
        let now = scope.now;
        let delta = self.combat.last_attack.and_then(|last| now.checked_sub(last));

        if let Some(delta) = delta {
            if delta > COMBAT_TIMEOUT_MS {
                self.reset_attack();
            } else if delta > HIGH_SPEED_MS {
                self.reset_attack_speed();
            } else if hit_or_air {
                self.combat.high_speed_attacks += 1;
                debug!(
                    scope,
                    "High-speed attack by {}: {} ms; {}",
                    scope.name(),
                    delta,
                    self.combat.high_speed_attacks
                );
                if self.combat.high_speed_attacks >= HIGH_SPEED_STRIKE {
                    self.strike(scope, 50, None, "attack speed", "attack speed", false)?;
                }
                if self.combat.high_speed_attacks >= HIGH_SPEED_LIMIT {
                    self.combat.last_attack = Some(now);
                    return self.convict(scope, false, "killaura/speed attack/lag".to_string());
                }
            }
        }

        self.combat.last_attack = Some(now);
        ControlFlow::Continue(())
    }

    /// Something other than an attack produced a swing.
    pub(crate) fn on_attack_speed_tainted(&mut self) {
        self.reset_attack_speed();
    }

    /// The subject was hit by another player.
    pub(crate) fn mark_got_hit(&mut self, scope: &mut Scope<'_>, damager: &PlayerSnapshot) {
        if !scope.enabled() {
            return;
        }
        self.reset_attack();
        let _ = self.on_knockback(scope, damager);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aim_window_keeps_last_ten() {
        let mut window = AimWindow::new();
        for i in 0..12 {
            window.push(f64::from(i), -f64::from(i));
        }
        assert_eq!(window.len(), AIM_WINDOW);
        assert_eq!(window.horizontal().next(), Some(2.0));

        let spread = window.spread().unwrap();
        assert_eq!(spread.horizontal, 9.0);
        assert_eq!(spread.vertical, 9.0);
    }

    #[test]
    fn test_empty_window_has_no_spread() {
        assert!(AimWindow::new().spread().is_none());
        assert!(AimWindow::default().is_empty());
    }

    #[test]
    fn test_reset_keeps_aim_window() {
        let mut combat = CombatState::default();
        combat.aim.push(0.1, 0.2);
        combat.misses = 5;
        combat.far_hits = 8;
        combat.reset();
        assert_eq!(combat.misses(), 0);
        assert_eq!(combat.far_hits(), 0);
        assert_eq!(combat.aim().len(), 1);
    }
}
