//! # Host Collaborator Traits
//!
//! The detector never reaches into the game server directly. The server
//! implements these traits and hands itself to [`crate::Heuristics`].
//!
//! ```text
//! Vigil defines:          Host implements:
//! ┌──────────────────┐    ┌──────────────────┐
//! │ trait WorldView  │ ←─ │ impl WorldView   │
//! └──────────────────┘    └──────────────────┘
//! ```

use vigil_core::{BlockPos, Material, NearbyEntity, PlayerSnapshot, SubjectId, Vitals};

/// Lookup of online players.
///
/// Every method must fail closed: an offline or unknown player yields `None`
/// or an empty list, never a stale value.
pub trait PlayerDirectory {
    /// Current state of an online player.
    fn player(&self, id: SubjectId) -> Option<PlayerSnapshot>;

    /// Entities within `radius` blocks of the player, excluding the player.
    fn nearby_entities(&self, id: SubjectId, radius: f64) -> Vec<NearbyEntity>;

    /// Item in the given hotbar slot.
    fn held_item(&self, id: SubjectId, slot: u8) -> Option<Material>;
}

/// Read-only block access.
pub trait WorldView {
    /// Material at a block position, `None` if the chunk is not loaded.
    fn block_at(&self, pos: BlockPos) -> Option<Material>;
}

/// Operator alerts and command dispatch.
pub trait Enforcer {
    /// Broadcasts a message to operators and the console.
    fn alert(&mut self, message: &str);

    /// Runs a fully rendered enforcement command.
    fn dispatch_command(&mut self, command: &str);
}

/// Health, food and saturation control.
pub trait VitalsControl {
    /// Replaces the player's vitals with temporary values.
    fn override_vitals(&mut self, id: SubjectId, vitals: Vitals);

    /// Puts the player's saved vitals back.
    fn restore_vitals(&mut self, id: SubjectId, vitals: Vitals);
}

/// Everything the detector needs from the server.
pub trait Host: PlayerDirectory + WorldView + Enforcer + VitalsControl {}

impl<T: PlayerDirectory + WorldView + Enforcer + VitalsControl> Host for T {}
