//! # Player Types
//!
//! What the host reports about an online player.
//!
//! The detector never owns a player. It holds a [`SubjectId`] and asks the
//! host for a fresh [`PlayerSnapshot`] whenever it needs one; an offline
//! player simply has no snapshot.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_EYE_HEIGHT, DEFAULT_MAX_HEALTH, DEFAULT_WALK_SPEED};
use crate::math::{Location, Vec3};

/// Stable player identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub Uuid);

impl SubjectId {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Fresh random identity.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic identity from a small number, for fixtures.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Host game mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Normal play.
    #[default]
    Survival,
    /// Map play, no block breaking.
    Adventure,
    /// Free building, flight allowed.
    Creative,
    /// Non-interacting observer.
    Spectator,
}

impl GameMode {
    /// Modes in which normal physics and combat rules apply.
    #[must_use]
    pub const fn is_analyzable(self) -> bool {
        matches!(self, Self::Survival | Self::Adventure)
    }
}

/// Potion effects that change expected movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotionKind {
    /// Faster walking.
    Speed,
    /// Slower walking.
    Slowness,
    /// Higher jumps.
    JumpBoost,
    /// Anything the detector does not rescale for.
    Other,
}

/// An active potion effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotionEffect {
    /// Effect kind.
    pub kind: PotionKind,
    /// Zero-based amplifier ("level").
    pub amplifier: u8,
}

impl PotionEffect {
    /// Creates a potion effect.
    #[must_use]
    pub const fn new(kind: PotionKind, amplifier: u8) -> Self {
        Self { kind, amplifier }
    }
}

/// Health, food and saturation, always handled as one triple.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Health points.
    pub health: f64,
    /// Food level.
    pub food: i32,
    /// Saturation.
    pub saturation: f32,
}

impl Vitals {
    /// Creates a vitals triple.
    #[must_use]
    pub const fn new(health: f64, food: i32, saturation: f32) -> Self {
        Self { health, food, saturation }
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HEALTH, 20, 5.0)
    }
}

/// Point-in-time view of an online player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSnapshot {
    /// Identity.
    pub id: SubjectId,
    /// Display name.
    pub name: String,
    /// Network address.
    pub address: IpAddr,
    /// Current game mode.
    pub game_mode: GameMode,
    /// Allowed flight currently active.
    pub flying: bool,
    /// Server-side on-ground flag.
    pub on_ground: bool,
    /// Riding a vehicle or mount.
    pub inside_vehicle: bool,
    /// Walk speed attribute (0.2 is normal).
    pub walk_speed: f32,
    /// Active potion effects.
    pub potions: Vec<PotionEffect>,
    /// Current location.
    pub location: Location,
    /// Eye height above the feet.
    pub eye_height: f64,
    /// Current velocity.
    pub velocity: Vec3,
    /// Current health, food and saturation.
    pub vitals: Vitals,
    /// Maximum health.
    pub max_health: f64,
}

impl PlayerSnapshot {
    /// A survival-mode player standing at `location`.
    #[must_use]
    pub fn new(id: SubjectId, name: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            ..Self::default()
        }
    }

    /// Eye position.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.location.to_vec() + Vec3::new(0.0, self.eye_height, 0.0)
    }

    /// Eye-to-eye distance to another player.
    #[must_use]
    pub fn eye_distance(&self, other: &Self) -> f64 {
        self.eye().distance(other.eye())
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            id: SubjectId(Uuid::nil()),
            name: String::new(),
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            game_mode: GameMode::Survival,
            flying: false,
            on_ground: true,
            inside_vehicle: false,
            walk_speed: DEFAULT_WALK_SPEED,
            potions: Vec::new(),
            location: Location::default(),
            eye_height: DEFAULT_EYE_HEIGHT,
            velocity: Vec3::ZERO,
            vitals: Vitals::default(),
            max_health: DEFAULT_MAX_HEALTH,
        }
    }
}

/// Something near a player, as reported by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum NearbyEntity {
    /// Another player.
    Player(PlayerSnapshot),
    /// A mob, item, projectile or any other non-player entity.
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_distance() {
        let a = PlayerSnapshot::new(SubjectId::from_u128(1), "a", Location::new(0.0, 64.0, 0.0));
        let b = PlayerSnapshot::new(SubjectId::from_u128(2), "b", Location::new(3.0, 64.0, 4.0));
        assert!((a.eye_distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_game_modes() {
        assert!(GameMode::Survival.is_analyzable());
        assert!(GameMode::Adventure.is_analyzable());
        assert!(!GameMode::Creative.is_analyzable());
        assert!(!GameMode::Spectator.is_analyzable());
    }
}
