//! # Inbound Events
//!
//! Typed events the host feeds to [`crate::Heuristics::handle`].
//!
//! ## Event Flow for a Melee Hit:
//! ```text
//! 1. Host: DamagedByEntity { victim, attacker }
//! 2. Victim detector: on_damaged, expected knockback recorded
//! 3. Attacker detector: mark_hit (reach, aim, cadence)
//! 4. Victim's next Moved: knockback verified
//! ```

use serde::{Deserialize, Serialize};
use vigil_core::{Location, Material, SubjectId, Vec3};

/// Why an entity took damage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageCause {
    /// Melee attack.
    #[default]
    EntityAttack,
    /// Arrow or other projectile.
    Projectile,
    /// Explosion, thorns and everything else with an entity source.
    Other,
}

/// Player interaction kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractAction {
    /// Swing at nothing.
    LeftClickAir,
    /// Swing at a block.
    LeftClickBlock,
    /// Use at nothing.
    RightClickAir,
    /// Use on a block.
    RightClickBlock,
    /// Pressure plates, tripwires.
    Physical,
}

/// An event delivered by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A player moved or tried to.
    Moved {
        /// Who moved.
        player: SubjectId,
        /// Location before the move.
        from: Location,
        /// Location after the move.
        to: Location,
        /// The host rejected the move.
        #[serde(default)]
        cancelled: bool,
    },
    /// A player was damaged by an entity.
    DamagedByEntity {
        /// Who was hit.
        victim: SubjectId,
        /// Attacking player, `None` for mobs and other entities.
        #[serde(default)]
        attacker: Option<SubjectId>,
        /// Damage after armor and effects.
        final_damage: f64,
        /// Damage cause.
        #[serde(default)]
        cause: DamageCause,
    },
    /// A player was damaged by a block, fall, fire or similar.
    DamagedByEnvironment {
        /// Who was hurt.
        victim: SubjectId,
    },
    /// The server changed a player's velocity.
    VelocityChanged {
        /// Whose velocity.
        player: SubjectId,
        /// New velocity.
        velocity: Vec3,
    },
    /// A player clicked.
    Interacted {
        /// Who clicked.
        player: SubjectId,
        /// Click kind.
        action: InteractAction,
        /// Block clicked, if any.
        #[serde(default)]
        clicked: Option<Material>,
        /// The host denied use of the clicked block.
        #[serde(default)]
        block_use_denied: bool,
    },
    /// A player teleported.
    Teleported {
        /// Who teleported.
        player: SubjectId,
    },
    /// A player died.
    Died {
        /// Who died.
        player: SubjectId,
        /// Killing player, if any.
        #[serde(default)]
        killer: Option<SubjectId>,
    },
    /// A player quit or was kicked.
    Disconnected {
        /// Who left.
        player: SubjectId,
    },
    /// A player changed hotbar slot.
    ItemHeldChanged {
        /// Who switched.
        player: SubjectId,
        /// Previous slot.
        old_slot: u8,
        /// New slot.
        new_slot: u8,
    },
    /// A player broke a block.
    BlockBroken {
        /// Who broke it.
        player: SubjectId,
    },
}

impl HostEvent {
    /// The player the event is about.
    #[must_use]
    pub const fn subject(&self) -> SubjectId {
        match self {
            Self::Moved { player, .. }
            | Self::VelocityChanged { player, .. }
            | Self::Interacted { player, .. }
            | Self::Teleported { player }
            | Self::Died { player, .. }
            | Self::Disconnected { player }
            | Self::ItemHeldChanged { player, .. }
            | Self::BlockBroken { player } => *player,
            Self::DamagedByEntity { victim, .. } | Self::DamagedByEnvironment { victim } => *victim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject() {
        let id = SubjectId::from_u128(7);
        let event = HostEvent::DamagedByEnvironment { victim: id };
        assert_eq!(event.subject(), id);
    }
}
