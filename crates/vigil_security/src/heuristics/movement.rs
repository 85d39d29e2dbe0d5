//! # Movement Analysis
//!
//! Every move is checked in a fixed order:
//!
//! 1. Climbables and liquids: drag factors, swim oscillation, skipping
//!    across a water surface
//! 2. Blink: cumulative distance over short windows
//! 3. Pending knockback
//! 4. Vertical sign-flip evasion
//! 5. Airborne physics (acceleration against gravity)
//! 6. Water walking
//! 7. No-clip
//! 8. Client signatures
//!
//! A verdict anywhere stops the remaining checks for that move.

use std::ops::ControlFlow;

use vigil_core::constants::DEFAULT_WALK_SPEED;
use vigil_core::{BlockPos, Location, Material, PlayerSnapshot, PotionKind};

use super::signatures::{
    quantize, EVASION_FLIGHT_V, FALL_ACCELS, HUZUNI_ACCEL, HUZUNI_FLIGHT_V, JUMP_ACCELS,
    METRO_ACCEL, METRO_FLIGHT_V, NO_CLIP_FRACTIONS, NO_CLIP_MAX_H, NO_CLIP_MIN_V,
    OBVIOUS_EXPECTED_H, OBVIOUS_EXPECTED_V, OBVIOUS_FLY_LIMIT, PVP_STUCK_V, SPRINT_JUMP_V,
    SUSPICIOUS_FLIGHT_V, SUSPICIOUS_FLY_LIMIT, SUSPICIOUS_SPEED_H, VANILLA_GLIDE_V,
    WURST_FLIGHT_V, WURST_GLIDE_STRIKE, WURST_GLIDE_V, WURST_SPEED_H,
};
use super::terrain::{body_blocks, floor_blocks};
use super::{Detector, Millis, Scope};
use crate::host::WorldView;

/// Grace period after leaving a ladder, vine, web or liquid.
const CLIMBABLE_GRACE_MS: u64 = 800;
/// A jump this soon after leaving liquid counts as skipping across it.
const WATER_SKIP_MS: u64 = 200;
/// Moves further apart than this start a new blink window.
const BLINK_GAP_MS: u64 = 125;
/// Acceleration changes this soon after a knockback are expected.
const KNOCKBACK_JERK_MS: u64 = 600;
/// Minimum airborne time before a score verdict.
const MIN_FLIGHT_MS: u64 = 600;
/// Airborne score that produces a verdict.
const FLIGHT_SCORE_LIMIT: u32 = 24;
/// Airborne time without descending that produces a verdict.
const FLOATING_MS: u64 = 6_000;
/// Airborne time after which in-air strikes no longer decay.
const NO_DECAY_AIR_MS: u64 = 4_000;
/// Liquid enter/leave flips that count as water walking.
const SWIM_OSCILLATION_LIMIT: u32 = 6;
/// Sign-flip repeats that produce a certain verdict.
const EVASION_LIMIT: u32 = 5;

/// Deltas of a single move, in blocks per tick.
///
/// `eh` and `ev` are the deltas normalized to what an unmodified player
/// would have produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveDeltas {
    /// Horizontal distance.
    pub h: f64,
    /// Vertical delta, signed.
    pub v: f64,
    /// Expected-normalized horizontal distance.
    pub eh: f64,
    /// Expected-normalized vertical delta.
    pub ev: f64,
}

impl MoveDeltas {
    /// Computes deltas for a move, adjusting for walk speed and potions.
    ///
    /// Returns `None` for slowness strong enough to make the player
    /// effectively immobile.
    #[must_use]
    pub fn compute(player: &PlayerSnapshot, from: Location, to: Location) -> Option<Self> {
        let mut h = (to.x - from.x).hypot(to.z - from.z);
        let v = to.y - from.y;

        if player.walk_speed != DEFAULT_WALK_SPEED {
            h /= f64::from(player.walk_speed) * 5.0;
        }

        let mut eh = h;
        let mut ev = v;
        for effect in &player.potions {
            let level = f64::from(effect.amplifier);
            match effect.kind {
                PotionKind::Speed => eh /= 1.0 + 0.2 * level,
                PotionKind::Slowness => {
                    if level >= 7.0 {
                        return None;
                    }
                    eh /= 1.0 - 0.15 * level;
                }
                PotionKind::JumpBoost => ev /= (level + 4.2).powi(2) / 16.0 / 1.1025,
                PotionKind::Other => {}
            }
        }

        Some(Self { h, v, eh, ev })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct BlinkWindow {
    start: Millis,
    last: Option<Millis>,
    distance: f64,
    after_cancelled: bool,
}

/// Per-subject movement state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovementState {
    first_in_air: Option<Millis>,
    in_air_score: u32,
    last_air_delta_ev: f64,
    last_air_accel: Option<f64>,
    last_air_accel_rising: Option<bool>,
    jumping_count: u32,
    falling_count: u32,
    last_climbable: Option<Millis>,
    last_delta_v4s: Option<i32>,
    evasion_count: u32,
    water_walk_count: u32,
    obvious_fly_hacks: u32,
    suspicious_fly_hacks: u32,
    pub(crate) teleported: bool,
    pub(crate) cancelled_location: Option<Location>,
    blink: BlinkWindow,
    last_swimming: Option<bool>,
    swimming_oscillations: u32,
    last_delta_ev: f64,
    last_delta_eh: f64,
    last_distance_e: f64,
}

impl MovementState {
    /// Start of the current airborne episode.
    #[must_use]
    pub const fn first_in_air(&self) -> Option<Millis> {
        self.first_in_air
    }

    /// Suspicion accumulated during the current airborne episode.
    #[must_use]
    pub const fn in_air_score(&self) -> u32 {
        self.in_air_score
    }

    /// Obvious fly-hack signature counter.
    #[must_use]
    pub const fn obvious_fly_hacks(&self) -> u32 {
        self.obvious_fly_hacks
    }

    /// Suspicious fly-hack signature counter.
    #[must_use]
    pub const fn suspicious_fly_hacks(&self) -> u32 {
        self.suspicious_fly_hacks
    }

    /// Sign-flip evasion counter.
    #[must_use]
    pub const fn evasion_count(&self) -> u32 {
        self.evasion_count
    }

    /// Whether a teleport has not yet been followed by a move.
    #[must_use]
    pub const fn is_teleported(&self) -> bool {
        self.teleported
    }

    /// Clears the current airborne episode.
    pub fn reset_flight(&mut self) {
        self.teleported = false;
        self.first_in_air = None;
        self.in_air_score = 0;
        self.last_air_delta_ev = 0.0;
        self.last_air_accel = None;
        self.last_air_accel_rising = None;
        self.falling_count = 0;
        self.jumping_count = 0;
    }

    /// Also clears the fly-hack signature counters.
    pub fn reset_flight_history(&mut self) {
        self.reset_flight();
        self.obvious_fly_hacks = 0;
        self.suspicious_fly_hacks = 0;
    }

    /// Clears the blink window.
    pub fn reset_blink(&mut self) {
        self.blink.start = 0;
        self.blink.last = None;
        self.blink.distance = 0.0;
    }

    /// Clears all movement tracking.
    pub fn reset(&mut self) {
        self.reset_flight_history();
        self.reset_blink();
        self.last_delta_v4s = None;
        self.evasion_count = 0;
        self.last_climbable = None;
        self.cancelled_location = None;
    }
}

/// Derived values of one move shared by all checks.
#[derive(Clone, Copy, Debug)]
struct Sample {
    delta_h: f64,
    delta_v: f64,
    eh: f64,
    ev: f64,
    delta_h4: i32,
    delta_v4: i32,
    delta_v4s: i32,
    delta_eh4: i32,
    delta_ev4: i32,
    delta_ev4s: i32,
    distance_e: f64,
    over_water: bool,
    pre_last_knockback: Option<Millis>,
    teleported: bool,
}

impl Detector {
    /// Analyzes one move.
    pub(crate) fn on_move(
        &mut self,
        scope: &mut Scope<'_>,
        deltas: MoveDeltas,
        from: Location,
        to: Location,
    ) {
        let _ = self.analyze_move(scope, deltas, from, to);
    }

    fn analyze_move(
        &mut self,
        scope: &mut Scope<'_>,
        deltas: MoveDeltas,
        from: Location,
        to: Location,
    ) -> ControlFlow<()> {
        if !scope.enabled() {
            return ControlFlow::Continue(());
        }
        let now = scope.now;
        let teleported = std::mem::take(&mut self.movement.teleported);

        let blocks = body_blocks(&*scope.host, from);
        let floor = floor_blocks(&*scope.host, from);
        let feet = from.block();
        let below = scope
            .host
            .block_at(feet.offset(0, -1, 0))
            .unwrap_or(Material::Air);

        let mut eh = deltas.eh;
        let mut ev = deltas.ev;
        let mut climbing = false;
        let mut swimming = false;
        let airborne = !scope.player.on_ground && feet.y >= 0;
        let mut in_air = airborne;
        let since_climbable = self
            .movement
            .last_climbable
            .and_then(|t| now.checked_sub(t));

        for material in &blocks {
            let drag = if material.is_climbable() {
                climbing = true;
                1.0
            } else if material.is_lava() {
                climbing = true;
                swimming = true;
                0.65
            } else if material.is_liquid() {
                climbing = true;
                swimming = true;
                0.85
            } else if *material == Material::Web {
                climbing = true;
                0.15
            } else {
                1.0
            };
            eh *= drag;
            ev *= drag;
        }

        if climbing {
            in_air = false;
            self.reset_flight();
            self.movement.last_climbable = Some(now);
            verbose!(scope, "On climbable: {}", scope.name());
        } else if since_climbable.is_some_and(|elapsed| elapsed <= CLIMBABLE_GRACE_MS) {
            in_air = false;
            self.reset_flight();
            verbose!(scope, "Recently on climbable: {}", scope.name());
        }

        if let Some(last) = self.movement.last_swimming {
            if last != swimming {
                self.movement.swimming_oscillations += 1;
                let oscillations = self.movement.swimming_oscillations;
                if oscillations >= SWIM_OSCILLATION_LIMIT {
                    info!("Swimming oscillations: {}; {}", oscillations, scope.name());
                    self.movement.last_swimming = Some(swimming);
                    self.strike(scope, 200, None, "water walk:oscillating", "water walk", false)?;
                }
            } else {
                self.movement.swimming_oscillations = 0;
            }
        }
        self.movement.last_swimming = Some(swimming);

        let delta_v4s = quantize(deltas.v);
        let delta_ev4s = quantize(ev);
        let sample = Sample {
            delta_h: deltas.h,
            delta_v: deltas.v,
            eh,
            ev,
            delta_h4: quantize(deltas.h),
            delta_v4: delta_v4s.abs(),
            delta_v4s,
            delta_eh4: quantize(eh).max(0),
            delta_ev4: delta_ev4s.abs(),
            delta_ev4s,
            distance_e: eh.hypot(ev),
            over_water: !swimming
                && !climbing
                && below.is_liquid()
                && floor.iter().all(|m| m.is_liquid()),
            pre_last_knockback: self.knockback.last_knockback(),
            teleported,
        };

        // Airborne analysis is suspended right after leaving liquid
        if airborne
            && sample.over_water
            && sample.ev > self.movement.last_delta_ev
            && since_climbable.is_some_and(|elapsed| elapsed < WATER_SKIP_MS)
        {
            info!("Skipping across water surface: {}", scope.name());
            self.strike(scope, 250, None, "water walk:successive jump", "water walk", false)?;
        }

        self.check_blink(scope, &sample)?;
        self.movement.last_distance_e = sample.distance_e;
        self.movement.last_delta_ev = sample.ev;
        self.movement.last_delta_eh = sample.eh;

        self.check_knockback(scope, sample.delta_v4s)?;

        // Head rotation alone must not reset anything below
        if sample.delta_h == 0.0 && sample.delta_v == 0.0 {
            return ControlFlow::Continue(());
        }

        self.check_evasion(scope, &sample)?;

        let mut jumping = false;
        let mut falling = false;
        if in_air {
            self.check_airborne(scope, &sample, &mut jumping, &mut falling)?;
        } else if self.movement.first_in_air.is_some() {
            verbose!(scope, "Touched ground: {}", scope.name());
            self.reset_flight();
        }
        if !falling {
            self.movement.falling_count = 0;
        }
        if !jumping {
            self.movement.jumping_count = 0;
        }

        let level_with_block = f64::from(feet.y) == from.y;
        if !in_air
            && sample.over_water
            && sample.delta_v4 == 0
            && self.movement.last_delta_v4s == Some(0)
            && level_with_block
        {
            let previous = self.movement.water_walk_count;
            self.movement.water_walk_count += 1;
            if previous > 1 {
                info!(
                    "Walking on water: {}; {}",
                    self.movement.water_walk_count,
                    scope.name()
                );
                self.strike(scope, 250, None, "water walk:float", "water walk", false)?;
            }
        } else {
            self.movement.water_walk_count = 0;
        }

        self.check_no_clip(scope, &sample, feet, to)?;
        self.check_signatures(scope, &sample)?;

        self.movement.last_delta_v4s = Some(sample.delta_v4s);
        ControlFlow::Continue(())
    }

    fn check_blink(&mut self, scope: &mut Scope<'_>, s: &Sample) -> ControlFlow<()> {
        if self.movement.last_delta_ev == 0.0 && self.movement.last_delta_eh == 0.0 {
            return ControlFlow::Continue(());
        }
        let now = scope.now;

        if self
            .movement
            .cancelled_location
            .is_some_and(|cancelled| scope.player.location.same_position(cancelled))
        {
            self.movement.blink.after_cancelled = true;
        }

        let continuing = self
            .movement
            .blink
            .last
            .filter(|&last| now.checked_sub(last).is_some_and(|gap| gap <= BLINK_GAP_MS));
        let Some(last) = continuing else {
            self.movement.blink = BlinkWindow {
                start: now,
                last: Some(now),
                distance: s.distance_e,
                after_cancelled: false,
            };
            return ControlFlow::Continue(());
        };

        let blink = &mut self.movement.blink;
        let last_elapsed = last.saturating_sub(blink.start) as f64;
        let last_seconds = last_elapsed / 1_000.0;
        let last_bps = blink.distance / last_seconds;
        let last_distance = blink.distance;

        blink.last = Some(now);
        blink.distance += s.distance_e;
        let seconds = now.saturating_sub(blink.start) as f64 / 1_000.0;
        let bps = blink.distance / seconds;
        let after_cancelled = blink.after_cancelled;

        if !(last_elapsed > 25.0 && last_elapsed < 300.0 && self.movement.last_distance_e < 0.7) {
            return ControlFlow::Continue(());
        }

        if after_cancelled && bps > 30.0 {
            info!(
                "Blink after cancelled movement {}: {:.2} over {:.4} sec",
                scope.name(),
                bps,
                seconds
            );
            self.strike(scope, 100, Some(false), "blink:after cancelled", "blink/excessive lag", false)?;
        }

        if bps > 30.0 && (s.eh > s.delta_h || s.ev > s.delta_v) {
            info!("Evading slowness: {}; {:.2} over {:.3} sec", scope.name(), bps, seconds);
            self.strike(scope, 200, None, "speed:anti-slow", "speed", false)?;
            self.reset_blink();
        } else if bps < last_bps {
            if last_distance >= 7.0 {
                let suspicious = s.delta_h == 0.0 && s.delta_v == 0.0;
                let weight = if suspicious { 100 } else { 0 };

                if bps > 300.0 {
                    info!(
                        "Extremely fast blink for {}: {:.2} over {:.4} sec",
                        scope.name(),
                        last_bps,
                        last_seconds
                    );
                    self.strike(scope, weight, Some(false), "blink:extremely fast", "blink/excessive lag", false)?;
                } else if bps > 120.0 {
                    if suspicious {
                        info!(
                            "Very fast blink for {}: {:.2} over {:.4} sec",
                            scope.name(),
                            last_bps,
                            last_seconds
                        );
                        self.strike(scope, weight, Some(false), "blink:very fast", "blink/excessive lag", false)?;
                    } else {
                        debug!(
                            scope,
                            "Very fast blink for {}: {:.2} over {:.4} sec",
                            scope.name(),
                            last_bps,
                            last_seconds
                        );
                    }
                } else if bps > 80.0 {
                    info!(
                        "Fast blink for {}: {:.2} over {:.4} sec",
                        scope.name(),
                        last_bps,
                        last_seconds
                    );
                    self.strike(scope, weight, Some(false), "blink:fast", "blink/excessive lag", false)?;
                } else if bps > 50.0 {
                    if suspicious {
                        info!(
                            "Medium blink for {}: {:.2} over {:.4} sec",
                            scope.name(),
                            last_bps,
                            last_seconds
                        );
                    } else {
                        debug!(
                            scope,
                            "Medium blink for {}: {:.2} over {:.4} sec",
                            scope.name(),
                            last_bps,
                            last_seconds
                        );
                    }
                    self.strike(scope, weight, Some(false), "blink:medium", "blink/excessive lag", false)?;
                } else if bps > 30.0 {
                    debug!(
                        scope,
                        "Short blink for {}: {:.2} over {:.4} sec",
                        scope.name(),
                        last_bps,
                        last_seconds
                    );
                }
            }
            self.reset_blink();
        }
        ControlFlow::Continue(())
    }

    fn check_evasion(&mut self, scope: &mut Scope<'_>, s: &Sample) -> ControlFlow<()> {
        let last = match self.movement.last_delta_v4s {
            Some(last) if s.delta_v4s != 0 => last,
            _ => {
                if self.movement.evasion_count > 0 {
                    debug!(scope, "Reset evasion count: {}", scope.name());
                }
                self.movement.evasion_count = 0;
                return ControlFlow::Continue(());
            }
        };

        let kind = if s.delta_v4 == EVASION_FLIGHT_V { "flight" } else { "speed" };
        if -s.delta_v4s == last {
            if s.delta_v4 == PVP_STUCK_V || s.delta_ev4 == PVP_STUCK_V {
                debug!(
                    scope,
                    "Player oscillating: {}; V: {:.6}; {}",
                    self.movement.evasion_count,
                    s.delta_v,
                    scope.name()
                );
            } else {
                self.movement.evasion_count += 1;
                let count = self.movement.evasion_count;
                if s.delta_v4 == EVASION_FLIGHT_V || count >= 2 {
                    info!("Sign-flip {} evasion: {}; {:.6}; {}", kind, count, s.delta_v, scope.name());
                    let weight = if count >= 4 { 150 } else { 50 };
                    let reason = format!("{kind}:Wurst YesCheat+");
                    self.strike(scope, weight, None, &reason, kind, false)?;
                } else {
                    debug!(scope, "Sign-flip {} evasion: {}; {:.6}; {}", kind, count, s.delta_v, scope.name());
                }
            }
        }

        if self.movement.evasion_count >= EVASION_LIMIT {
            return self.convict(scope, true, format!("{kind} w/NCP evasion"));
        }
        ControlFlow::Continue(())
    }

    fn check_airborne(
        &mut self,
        scope: &mut Scope<'_>,
        s: &Sample,
        jumping: &mut bool,
        falling: &mut bool,
    ) -> ControlFlow<()> {
        let now = scope.now;
        let Some(first_in_air) = self.movement.first_in_air else {
            if s.over_water {
                info!("Jumping on water surface: {}", scope.name());
                self.strike(scope, 250, None, "water walk:cold jump", "water walk", false)?;
            }
            let m = &mut self.movement;
            m.first_in_air = Some(now);
            m.in_air_score = 1;
            m.last_air_delta_ev = s.delta_v;
            m.last_air_accel = None;
            m.last_air_accel_rising = None;
            verbose!(
                scope,
                "Entered airspace: {}; {}",
                scope.name(),
                if s.over_water { "over water" } else { "not over water" }
            );
            return ControlFlow::Continue(());
        };

        // Relative to the vertical delta on entering the air
        let accel = s.ev - self.movement.last_air_delta_ev;
        let accel4s = quantize(accel);
        let accel4 = accel4s.abs();
        let time_in_air = now.saturating_sub(first_in_air);
        let knocked_back = s
            .pre_last_knockback
            .and_then(|t| now.checked_sub(t))
            .is_some_and(|elapsed| elapsed < KNOCKBACK_JERK_MS);

        if let Some(last_accel) = self.movement.last_air_accel {
            let rising = accel > last_accel;
            if self.movement.last_air_accel_rising.is_some_and(|r| r != rising) {
                if self.movement.jumping_count > 1 {
                    verbose!(scope, "Ignoring vertical jerk from jump: {}", scope.name());
                } else if knocked_back {
                    verbose!(scope, "Ignoring vertical jerk from knockback: {}", scope.name());
                } else if self.movement.in_air_score > 8 {
                    self.movement.in_air_score += 4;
                    info!(
                        "In-air +4 vertical jerk: {}; {} ms; {}",
                        self.movement.in_air_score,
                        time_in_air,
                        scope.name()
                    );
                } else {
                    debug!(scope, "Ignoring in-air vertical jerk: {}", scope.name());
                }
            }
            self.movement.last_air_accel_rising = Some(rising);
        }

        let last_accel = self.movement.last_air_accel;
        if s.delta_v == 0.0 {
            if accel == 0.0 && last_accel == Some(0.0) {
                self.movement.in_air_score += 8;
                info!(
                    "In air, no vertical velocity +8: {}; {} ms; {}",
                    self.movement.in_air_score,
                    time_in_air,
                    scope.name()
                );
                self.strike(scope, 200, None, "flight:no vert velocity", "flight", false)?;
            }
        } else if accel4 == 0 && s.delta_v4s < 0 && s.delta_v4 < 10_000 {
            if s.delta_v4s == WURST_GLIDE_V {
                self.movement.in_air_score += 16;
                info!(
                    "Gliding down at Wurst speed +16: {}; {} ms; {}",
                    self.movement.in_air_score,
                    time_in_air,
                    scope.name()
                );
                self.strike(scope, WURST_GLIDE_STRIKE, None, "glide:Wurst", "glide", false)?;
            } else if VANILLA_GLIDE_V.contains(&s.delta_v4s) {
                debug!(scope, "Ignoring glide at key velocity: {}", scope.name());
            } else if s.teleported {
                debug!(scope, "Ignoring glide after teleport: {}", scope.name());
            } else {
                self.movement.in_air_score += 8;
                if self.movement.in_air_score > 8 {
                    info!(
                        "Gliding down +8: {}; {} ms, {:.6} blocks/tick; {}",
                        self.movement.in_air_score,
                        time_in_air,
                        s.delta_v,
                        scope.name()
                    );
                    self.strike(scope, 100, None, "glide:generic", "glide", false)?;
                } else {
                    debug!(scope, "Gliding down +8: {}; {}", self.movement.in_air_score, scope.name());
                }
            }
        } else if accel4 == METRO_ACCEL {
            if self.movement.in_air_score > 2 {
                self.movement.in_air_score += 8;
                info!("Vertical accel Metro +8: {}; {}", self.movement.in_air_score, scope.name());
                self.strike(scope, 0, None, "flight:vert accel metro", "flight", false)?;
            } else {
                self.movement.in_air_score += 1;
                debug!(scope, "Vertical accel Metro +1: {}; {}", self.movement.in_air_score, scope.name());
            }
        } else if accel4 == HUZUNI_ACCEL {
            debug!(scope, "Ignoring vertical accel Huzuni: {}", scope.name());
        } else if s.delta_v4s < 0 && accel4s > 0 && last_accel.is_some_and(|a| a > 0.0) {
            *falling = true;
            self.movement.falling_count += 1;
            if self.movement.jumping_count > 1 {
                *jumping = true;
                self.movement.jumping_count += 1;
            }
            self.movement.in_air_score += 8;
            info!(
                "Falling but slowing down +8: {}; {} ms; {}",
                self.movement.in_air_score,
                time_in_air,
                scope.name()
            );
            self.strike(scope, 50, None, "flight:decel on fall", "flight", false)?;
        } else if accel4s > 0 && last_accel.is_some_and(|a| a > 0.0) {
            if knocked_back {
                debug!(scope, "Ignoring upwards accel from knockback: {}", scope.name());
            } else if self.movement.in_air_score > 4 {
                self.movement.in_air_score += 2;
                info!("Unnatural upwards accel +2: {}; {}", self.movement.in_air_score, scope.name());
                self.strike(scope, 0, None, "flight:unnatural upwards accel", "flight", false)?;
            } else {
                debug!(scope, "Ignoring upwards accel: {}", scope.name());
            }
        } else if self.movement.jumping_count == 0 && FALL_ACCELS.contains(&accel4s) {
            *falling = true;
            self.movement.falling_count += 1;
            if self.movement.falling_count <= 1 && JUMP_ACCELS.contains(&accel4s) {
                *jumping = true;
                self.movement.jumping_count += 1;
            }
            verbose!(
                scope,
                "Jumping {} or falling {}: {}",
                self.movement.jumping_count,
                self.movement.falling_count,
                scope.name()
            );
        } else if JUMP_ACCELS.contains(&accel4s) {
            *jumping = true;
            self.movement.jumping_count += 1;
        } else if s.delta_v4s > 0 && accel4 == 0 && last_accel.map(quantize) == Some(0) {
            if knocked_back {
                debug!(scope, "Ignoring constant climb after knockback: {}", scope.name());
            } else {
                self.movement.in_air_score += 4;
                info!(
                    "Constant climb +4: {}; {} ms; {}",
                    self.movement.in_air_score,
                    time_in_air,
                    scope.name()
                );
                self.strike(scope, 25, None, "flight:constant climb", "flight", false)?;
            }
        } else if s.delta_v4s < 0 {
            if self.movement.in_air_score > 0 {
                self.movement.in_air_score -= 1;
            }
            verbose!(scope, "Falling: {}; {} ms; {}", self.movement.in_air_score, time_in_air, scope.name());
        } else if s.delta_v4s > 0 {
            verbose!(scope, "Rising: {}; {} ms; {}", self.movement.in_air_score, time_in_air, scope.name());
        }

        if time_in_air >= MIN_FLIGHT_MS && self.movement.in_air_score >= FLIGHT_SCORE_LIMIT {
            return self.convict(scope, false, "flight".to_string());
        }
        if time_in_air > FLOATING_MS
            && s.delta_v4s >= 0
            && accel4s >= 0
            && last_accel.is_some_and(|a| a >= 0.0)
            && s.delta_h4 > 0
        {
            info!("In air too long: {}; {} ms", scope.name(), time_in_air);
            return self.convict(scope, false, "flight/floating".to_string());
        }

        if self.movement.in_air_score >= 2 {
            self.strike(
                scope,
                0,
                None,
                "flight:inAirScore",
                "flight",
                time_in_air >= NO_DECAY_AIR_MS,
            )?;
        }

        self.movement.last_air_accel = Some(accel);
        ControlFlow::Continue(())
    }

    fn check_no_clip(
        &mut self,
        scope: &mut Scope<'_>,
        s: &Sample,
        feet: BlockPos,
        to: Location,
    ) -> ControlFlow<()> {
        let frac = s.delta_v4s % 10_000;
        if s.delta_h4 >= NO_CLIP_MAX_H || s.delta_v4 < NO_CLIP_MIN_V || !NO_CLIP_FRACTIONS.contains(&frac) {
            return ControlFlow::Continue(());
        }

        let step = if s.delta_v > 0.0 { 1 } else { -1 };
        let end = to.block().y;
        let mut y = feet.y + step;
        while (step > 0 && y < end) || (step < 0 && y > end) {
            let pos = BlockPos::new(feet.x, y, feet.z);
            if let Some(material) = scope.host.block_at(pos).filter(|m| m.is_solid()) {
                info!(
                    "NO-CLIP: {}; H:{:.6} V:{:.6}; ({}, {}, {}); {}",
                    scope.name(),
                    s.delta_h,
                    s.delta_v,
                    pos.x,
                    pos.y,
                    pos.z,
                    material.name()
                );
                return self.convict(scope, true, format!("no-clip through {}", material.display_name()));
            }
            y += step;
        }
        ControlFlow::Continue(())
    }

    fn check_signatures(&mut self, scope: &mut Scope<'_>, s: &Sample) -> ControlFlow<()> {
        if s.delta_h4 == 0 && s.delta_v4 == WURST_FLIGHT_V {
            self.movement.obvious_fly_hacks += 4;
            info!("Obvious flight hack (Wurst) for {}: {}", scope.name(), self.movement.obvious_fly_hacks);
            self.strike(scope, 200, None, "flight:obvious Wurst", "flight", false)?;
        } else if s.delta_v4 == METRO_FLIGHT_V {
            // Also seen in PvP, so no strike
            self.movement.obvious_fly_hacks += 2;
            info!("Obvious flight hack (Metro) for {}: {}", scope.name(), self.movement.obvious_fly_hacks);
        } else if s.delta_v4 == HUZUNI_FLIGHT_V {
            self.movement.obvious_fly_hacks += 4;
            info!("Obvious flight hack (Huzuni) for {}: {}", scope.name(), self.movement.obvious_fly_hacks);
            self.strike(scope, 25, None, "flight:obvious Huzuni", "flight", false)?;
        } else if WURST_SPEED_H.contains(&s.delta_h4) {
            self.movement.obvious_fly_hacks += 2;
            info!("Obvious speed hack (Wurst) for {}: {}", scope.name(), self.movement.obvious_fly_hacks);
            self.strike(scope, 25, None, "speed:obvious Wurst", "speed", false)?;
        } else if s.delta_ev4s > OBVIOUS_EXPECTED_V {
            info!("Suspicious vertical movement: {}; EV: {:.6}", scope.name(), s.ev);
            self.strike(scope, 25, None, "flight:suspicious", "flight", false)?;
        } else if s.delta_eh4 > OBVIOUS_EXPECTED_H && !SPRINT_JUMP_V.contains(&s.delta_ev4) {
            if self.movement.obvious_fly_hacks > 0 {
                info!("Suspicious horizontal movement: {}; EH: {:.6}", scope.name(), s.eh);
            }
        } else if self.movement.obvious_fly_hacks > 0 {
            self.movement.obvious_fly_hacks -= 1;
        }

        if s.delta_h4 == SUSPICIOUS_SPEED_H {
            self.movement.suspicious_fly_hacks += 160;
            info!("Suspicious horizontal speed for {}: {}", scope.name(), self.movement.suspicious_fly_hacks);
            self.strike(scope, 200, None, "speed:suspicious", "speed", false)?;
        } else if s.delta_v4 == SUSPICIOUS_FLIGHT_V {
            self.movement.suspicious_fly_hacks += 240;
            info!("Suspicious upward movement for {}: {}", scope.name(), self.movement.suspicious_fly_hacks);
            self.strike(scope, 100, None, "flight:suspicious Wurst", "flight", false)?;
        } else if s.delta_ev4s >= 20_000 {
            self.movement.suspicious_fly_hacks += 240;
            info!("Very fast upwards movement for {}: {}", scope.name(), self.movement.suspicious_fly_hacks);
            self.strike(scope, 200, None, "flight:very fast", "flight", false)?;
        } else if s.delta_ev4s > 11_200 {
            self.movement.suspicious_fly_hacks += 80;
            info!("Moderately fast upwards movement for {}: {}", scope.name(), self.movement.suspicious_fly_hacks);
            self.strike(scope, 25, None, "flight:moderately fast", "flight", false)?;
        } else if s.delta_eh4 >= 30_000 {
            self.movement.suspicious_fly_hacks += 160;
            info!("Very fast horizontal movement for {}: {}", scope.name(), self.movement.suspicious_fly_hacks);
            self.strike(scope, 100, None, "speed:very fast", "speed", false)?;
        } else if s.delta_eh4 >= 12_000 {
            // Knockback II reaches this
            self.movement.suspicious_fly_hacks += 20;
            info!("Moderately fast horizontal movement for {}: {}", scope.name(), self.movement.suspicious_fly_hacks);
        } else if s.delta_eh4 >= 9_800 {
            debug!(scope, "Slightly fast horizontal movement for {}: {:.6}", scope.name(), s.eh);
        } else if self.movement.suspicious_fly_hacks > 0 && self.movement.obvious_fly_hacks == 0 {
            self.movement.suspicious_fly_hacks = self.movement.suspicious_fly_hacks.saturating_sub(4);
        }

        if self.movement.obvious_fly_hacks >= OBVIOUS_FLY_LIMIT {
            return self.convict(scope, false, "fly hacks".to_string());
        }
        if self.movement.suspicious_fly_hacks >= SUSPICIOUS_FLY_LIMIT {
            return self.convict(scope, false, "fly/speed hacks".to_string());
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{PotionEffect, SubjectId};

    fn player() -> PlayerSnapshot {
        PlayerSnapshot::new(SubjectId::from_u128(1), "mover", Location::new(0.5, 64.0, 0.5))
    }

    #[test]
    fn test_plain_deltas() {
        let d = MoveDeltas::compute(
            &player(),
            Location::new(0.0, 64.0, 0.0),
            Location::new(0.3, 64.5, 0.4),
        )
        .unwrap();
        assert!((d.h - 0.5).abs() < 1e-12);
        assert!((d.v - 0.5).abs() < 1e-12);
        assert_eq!(d.eh, d.h);
        assert_eq!(d.ev, d.v);
    }

    #[test]
    fn test_speed_potion_scales_expected() {
        let mut p = player();
        p.potions.push(PotionEffect::new(PotionKind::Speed, 2));
        let d = MoveDeltas::compute(&p, Location::new(0.0, 64.0, 0.0), Location::new(0.7, 64.0, 0.0))
            .unwrap();
        assert!((d.eh - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_slowness_skips() {
        let mut p = player();
        p.potions.push(PotionEffect::new(PotionKind::Slowness, 7));
        assert!(MoveDeltas::compute(&p, Location::default(), Location::new(0.1, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_strong_slowness_still_analyzed() {
        let mut p = player();
        p.potions.push(PotionEffect::new(PotionKind::Slowness, 6));
        let d = MoveDeltas::compute(&p, Location::default(), Location::new(0.1, 0.0, 0.0)).unwrap();
        assert!((d.eh - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_walk_speed_normalizes_horizontal() {
        let mut p = player();
        p.walk_speed = 0.4;
        let d = MoveDeltas::compute(&p, Location::default(), Location::new(1.0, 0.0, 0.0)).unwrap();
        assert!((d.h - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_reset_movement_clears_signature_counters() {
        let mut state = MovementState {
            obvious_fly_hacks: 8,
            suspicious_fly_hacks: 320,
            in_air_score: 12,
            first_in_air: Some(100),
            last_delta_v4s: Some(1000),
            ..MovementState::default()
        };
        state.reset();
        assert_eq!(state.obvious_fly_hacks(), 0);
        assert_eq!(state.suspicious_fly_hacks(), 0);
        assert_eq!(state.first_in_air(), None);
        assert_eq!(state.last_delta_v4s, None);
    }
}
