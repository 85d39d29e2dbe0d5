//! # Heuristics
//!
//! Per-player behavioral analysis.
//!
//! ## Detection Methods
//!
//! - **Flight / glide**: in-air physics against gravity and known client
//!   signatures
//! - **Speed / blink**: cumulative distance windows
//! - **No-clip**: solid blocks between two positions of a single move
//! - **Water walk**: standing, jumping or oscillating on liquid surfaces
//! - **Reach / aim / cadence**: melee hits and misses
//! - **Anti-knockback**: expected post-hit impulses that never show up
//!
//! ## Architecture
//!
//! ```text
//! host event ──► Heuristics ──► SubjectRegistry ──► Detector
//!                    │                                 │
//!                    │◄──────── strikes / verdicts ────┘
//!                    ▼
//!              Enforcer (alert, commands)
//! ```

/// Debug output, emitted only when enabled in the config.
macro_rules! debug {
    ($scope:expr, $($arg:tt)+) => {
        if $scope.config.debug_enabled {
            tracing::debug!(target: "vigil::heuristics", $($arg)+);
        }
    };
}

/// Verbose debug output, emitted only when enabled in the config.
macro_rules! verbose {
    ($scope:expr, $($arg:tt)+) => {
        if $scope.config.verbose_debug_enabled {
            tracing::trace!(target: "vigil::heuristics", $($arg)+);
        }
    };
}

/// Always-on detector output.
macro_rules! info {
    ($($arg:tt)+) => {
        tracing::info!(target: "vigil::heuristics", $($arg)+)
    };
}

mod combat;
mod detector;
mod exploit;
mod knockback;
mod movement;
mod registry;
pub mod signatures;
mod strikes;
mod terrain;

pub use combat::{AimSpread, AimWindow, CombatState, AIM_WINDOW};
pub use detector::Detector;
pub use exploit::{ExploitGuard, OVERRIDE_VITALS};
pub use knockback::{expected_knockback, KnockbackState};
pub use movement::{MoveDeltas, MovementState};
pub use registry::{Subject, SubjectRegistry};
pub use strikes::{Blackmarks, StrikeLedger, StrikeOutcome};

use vigil_core::{Location, PlayerSnapshot, SubjectId, Vec3};

use crate::config::{render_command, HeuristicsConfig};
use crate::events::{DamageCause, HostEvent, InteractAction};
use crate::gate::ReadyGate;
use crate::host::{Enforcer, Host, PlayerDirectory};
use vigil_core::constants::{DAMAGE_VELOCITY_Y, SPRINT_JUMP_DELTA_Y};
use vigil_core::Material;

/// Wall-clock milliseconds.
pub type Millis = u64;

/// Radius searched for the player a missed swing was aimed at.
const MISS_SEARCH_RADIUS: f64 = 7.0;

/// The detector's decision that a subject is cheating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    /// Who.
    pub subject: SubjectId,
    /// Name at the time of the verdict.
    pub player_name: String,
    /// Certain verdicts use the certain command list.
    pub certain: bool,
    /// Public reason.
    pub reason: String,
    /// When.
    pub at: Millis,
}

/// Everything a detector may touch while handling one event for one subject.
pub(crate) struct Scope<'a> {
    pub(crate) now: Millis,
    pub(crate) tick: u64,
    pub(crate) ready: bool,
    pub(crate) config: &'a HeuristicsConfig,
    pub(crate) host: &'a mut dyn Host,
    /// Fresh snapshot; its presence is the liveness check.
    pub(crate) player: PlayerSnapshot,
    pub(crate) verdicts: &'a mut Vec<Verdict>,
}

impl Scope<'_> {
    /// Online, in an analyzable game mode, and not exempt.
    pub(crate) fn enabled(&self) -> bool {
        if self.config.is_exempt(self.player.id) {
            return false;
        }
        self.player.game_mode.is_analyzable()
    }

    pub(crate) fn name(&self) -> &str {
        &self.player.name
    }

    /// Alerts operators, dispatches enforcement and records the verdict.
    pub(crate) fn convict(&mut self, certain: bool, reason: String) {
        let name = self.player.name.clone();
        self.host.alert(&format!(
            "Caught {} cheating: {}.  IP: {}  UUID: {}",
            name, reason, self.player.address, self.player.id
        ));

        if self.ready {
            let config = self.config;
            for template in config.commands_for(certain) {
                match render_command(template, &name, &reason) {
                    Ok(command) => self.host.dispatch_command(&command),
                    Err(err) => tracing::warn!("Skipping enforcement command: {}", err),
                }
            }
        }

        self.verdicts.push(Verdict {
            subject: self.player.id,
            player_name: name,
            certain,
            reason,
            at: self.now,
        });
    }
}

/// The detector subsystem: routes host events to per-subject detectors.
pub struct Heuristics<H: Host> {
    /// Configuration.
    config: HeuristicsConfig,
    /// Server collaborator.
    host: H,
    /// Warm-up gate.
    gate: ReadyGate,
    /// Per-subject state.
    registry: SubjectRegistry,
    /// Verdicts not yet taken by the caller.
    verdicts: Vec<Verdict>,
    /// Current wall clock.
    now: Millis,
    /// Current server tick.
    tick: u64,
}

impl<H: Host> Heuristics<H> {
    /// Creates a detector that starts warming up immediately.
    #[must_use]
    pub fn new(config: HeuristicsConfig, host: H) -> Self {
        let mut gate = ReadyGate::new();
        gate.arm(0, config.warmup_ticks);
        Self::with_gate(config, host, gate)
    }

    /// Creates a detector with an explicit gate.
    #[must_use]
    pub fn with_gate(config: HeuristicsConfig, host: H, gate: ReadyGate) -> Self {
        Self {
            config,
            host,
            gate,
            registry: SubjectRegistry::new(),
            verdicts: Vec::new(),
            now: 0,
            tick: 0,
        }
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &HeuristicsConfig {
        &self.config
    }

    /// Server collaborator.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable server collaborator.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Whether events are being analyzed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Current wall clock.
    #[must_use]
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Current server tick.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Sets the wall clock used for the next events.
    pub fn set_time(&mut self, now: Millis) {
        self.now = now;
    }

    /// Per-subject state.
    #[must_use]
    pub fn registry(&self) -> &SubjectRegistry {
        &self.registry
    }

    /// Detector of a tracked subject.
    #[must_use]
    pub fn detector(&self, id: SubjectId) -> Option<&Detector> {
        self.registry.get(id).map(|s| &s.detector)
    }

    /// Verdicts issued so far.
    #[must_use]
    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    /// Takes ownership of issued verdicts.
    pub fn take_verdicts(&mut self) -> Vec<Verdict> {
        std::mem::take(&mut self.verdicts)
    }

    /// Advances one server tick: opens the gate when due and runs deferred
    /// exploit-mitigation work.
    pub fn tick(&mut self) {
        self.tick += 1;
        self.gate.poll(self.tick);
        if !self.gate.is_ready() {
            return;
        }

        for id in self.registry.ids_with_due_work(self.tick) {
            self.with_subject(id, |detector, scope| detector.run_scheduled(scope));
        }
    }

    /// Stops analysis and finalizes every subject.
    pub fn deinit(&mut self) {
        self.gate.shut();
        for id in self.registry.ids() {
            self.registry.remove(id, &mut self.host);
        }
    }

    /// Restarts the warm-up after [`Self::deinit`].
    pub fn reinit(&mut self) {
        self.gate.arm(self.tick, self.config.warmup_ticks);
    }

    /// Runs `f` against the subject's detector, creating it if needed.
    ///
    /// Returns `None` without creating anything if the gate is closed or the
    /// player is offline.
    fn with_subject<R>(
        &mut self,
        id: SubjectId,
        f: impl FnOnce(&mut Detector, &mut Scope<'_>) -> R,
    ) -> Option<R> {
        if !self.gate.is_ready() {
            return None;
        }
        let player = self.host.player(id)?;
        let subject = self.registry.resolve(id, self.now);
        let mut scope = Scope {
            now: self.now,
            tick: self.tick,
            ready: self.gate.is_ready(),
            config: &self.config,
            host: &mut self.host,
            player,
            verdicts: &mut self.verdicts,
        };
        Some(f(&mut subject.detector, &mut scope))
    }

    /// Routes a host event to its handler.
    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::Moved {
                player,
                from,
                to,
                cancelled,
            } => self.on_move(player, from, to, cancelled),
            HostEvent::DamagedByEntity {
                victim,
                attacker,
                final_damage,
                cause,
            } => self.on_damaged_by_entity(victim, attacker, final_damage, cause),
            HostEvent::DamagedByEnvironment { victim } => self.on_damaged_by_environment(victim),
            HostEvent::VelocityChanged { player, velocity } => self.on_velocity(player, velocity),
            HostEvent::Interacted {
                player,
                action,
                clicked,
                block_use_denied,
            } => self.on_interact(player, action, clicked, block_use_denied),
            HostEvent::Teleported { player } => self.on_teleport(player),
            HostEvent::Died { player, killer } => self.on_death(player, killer),
            HostEvent::Disconnected { player } => self.on_disconnect(player),
            HostEvent::ItemHeldChanged {
                player,
                old_slot,
                new_slot,
            } => self.on_item_held(player, old_slot, new_slot),
            HostEvent::BlockBroken { player } => self.on_block_break(player),
        }
    }

    /// A player moved from `from` to `to`.
    pub fn on_move(&mut self, id: SubjectId, from: Location, to: Location, cancelled: bool) {
        self.with_subject(id, |detector, scope| {
            if cancelled {
                detector.on_cancelled_move(from);
                return;
            }

            let player = &scope.player;
            if player.flying || !player.game_mode.is_analyzable() {
                detector.reset_movement();
                return;
            }
            if player.inside_vehicle {
                detector.reset_movement();
                return;
            }

            let Some(deltas) = MoveDeltas::compute(player, from, to) else {
                verbose!(scope, "Skipping extreme slowness: {}", scope.name());
                return;
            };

            let significant = scope.config.significant_movement;
            if deltas.v.abs() > significant
                || (deltas.h > significant && deltas.v != SPRINT_JUMP_DELTA_Y)
            {
                debug!(
                    scope,
                    "Movement for {}: H:{:.6}, V:{:.6}; {}; speed {}",
                    scope.name(),
                    deltas.h,
                    deltas.v,
                    if scope.player.on_ground { "on ground" } else { "in air" },
                    scope.player.walk_speed
                );
            }

            detector.on_move(scope, deltas, from, to);
        });
    }

    /// A player was hurt by an entity.
    pub fn on_damaged_by_entity(
        &mut self,
        victim: SubjectId,
        attacker: Option<SubjectId>,
        final_damage: f64,
        cause: DamageCause,
    ) {
        // Needed even if the damager isn't a player.
        let Some(victim_snapshot) =
            self.with_subject(victim, |detector, scope| {
                detector.on_damaged(scope);
                scope.player.clone()
            })
        else {
            return;
        };

        let Some(attacker) = attacker else {
            return;
        };
        let Some(attacker_snapshot) = self.host.player(attacker) else {
            return;
        };

        if final_damage == 0.0 {
            debug!(self, "{} null-hit {}", attacker_snapshot.name, victim_snapshot.name);
            return;
        }

        self.with_subject(victim, |detector, scope| {
            detector.mark_got_hit(scope, &attacker_snapshot);
        });

        match cause {
            DamageCause::EntityAttack => {
                self.with_subject(attacker, |detector, scope| {
                    let _ = detector.mark_hit(scope, &victim_snapshot);
                });
            }
            DamageCause::Projectile | DamageCause::Other => {
                debug!(
                    self,
                    "{} hit {} via {:?}",
                    attacker_snapshot.name,
                    victim_snapshot.name,
                    cause
                );
            }
        }
    }

    /// A player was hurt by a block, fall, fire or similar.
    pub fn on_damaged_by_environment(&mut self, victim: SubjectId) {
        self.with_subject(victim, |detector, scope| detector.on_damaged(scope));
    }

    /// The server changed a player's velocity.
    pub fn on_velocity(&mut self, id: SubjectId, velocity: Vec3) {
        self.with_subject(id, |_, scope| {
            if !scope.enabled() {
                return;
            }
            if velocity.y == DAMAGE_VELOCITY_Y && velocity.x == 0.0 && velocity.z == 0.0 {
                debug!(scope, "Standard damage velocity event: {}", scope.name());
            } else {
                debug!(
                    scope,
                    "Velocity for {}: {}; {}",
                    scope.name(),
                    velocity,
                    if scope.player.on_ground { "on ground" } else { "in air" }
                );
            }
        });
    }

    /// A player clicked.
    pub fn on_interact(
        &mut self,
        id: SubjectId,
        action: InteractAction,
        clicked: Option<Material>,
        block_use_denied: bool,
    ) {
        self.with_subject(id, |detector, scope| match action {
            InteractAction::LeftClickAir => detector.mark_miss(scope, true),
            InteractAction::LeftClickBlock => {
                // A denied click on an instant-break block never produces a
                // break event, so it cannot be told apart from a swing.
                if block_use_denied && !clicked.is_some_and(Material::is_solid) {
                    return;
                }
                detector.mark_miss(scope, false);
            }
            InteractAction::RightClickAir
            | InteractAction::RightClickBlock
            | InteractAction::Physical => {}
        });
    }

    /// A player teleported.
    pub fn on_teleport(&mut self, id: SubjectId) {
        self.with_subject(id, |detector, _| detector.on_teleport());
    }

    /// A player died.
    pub fn on_death(&mut self, id: SubjectId, killer: Option<SubjectId>) {
        let forgiven = self.config.forgiven_on_death;
        self.with_subject(id, |detector, scope| detector.forgive_blackmarks(scope, forgiven));

        if let Some(killer) = killer {
            self.with_subject(killer, |detector, scope| detector.on_killed(scope));
        }
    }

    /// A player quit or was kicked.
    pub fn on_disconnect(&mut self, id: SubjectId) {
        if !self.gate.is_ready() {
            return;
        }
        if self.registry.remove(id, &mut self.host) {
            debug!(self, "Removed detector: {}", id);
        }
    }

    /// A player changed hotbar slot.
    pub fn on_item_held(&mut self, id: SubjectId, old_slot: u8, new_slot: u8) {
        let new_item = self.host.held_item(id, new_slot);
        let old_item = self.host.held_item(id, old_slot);
        let eating =
            new_item.is_some_and(Material::is_edible) && !old_item.is_some_and(Material::is_edible);

        self.with_subject(id, |detector, scope| {
            if eating {
                detector.on_eating(scope);
            }
            detector.on_item_held(scope.now);
        });
    }

    /// A player broke a block.
    pub fn on_block_break(&mut self, id: SubjectId) {
        // Some blocks break near-instantly, and which ones changes between
        // client versions. Tainting every break costs nothing.
        self.with_subject(id, |detector, _| detector.on_attack_speed_tainted());
    }

    /// Adds blackmarks to a subject directly.
    pub fn give_blackmarks(&mut self, id: SubjectId, count: u32) {
        self.with_subject(id, |detector, scope| {
            let _ = detector.give_blackmarks(scope, count);
        });
    }

    /// Removes up to `count` blackmarks from a subject.
    pub fn forgive_blackmarks(&mut self, id: SubjectId, count: u32) {
        self.with_subject(id, |detector, scope| detector.forgive_blackmarks(scope, count));
    }

    /// Records a strike against a subject directly.
    ///
    /// `certain` defaults to `amount >= 100` when `None`.
    pub fn strike(
        &mut self,
        id: SubjectId,
        amount: u32,
        certain: Option<bool>,
        debug_reason: &str,
        public_reason: &str,
    ) {
        self.with_subject(id, |detector, scope| {
            let _ = detector.strike(scope, amount, certain, debug_reason, public_reason, false);
        });
    }
}
