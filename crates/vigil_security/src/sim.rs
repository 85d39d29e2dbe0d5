//! # Simulated Server
//!
//! In-memory [`Host`](crate::host::Host) for tests, benchmarks and replays.
//!
//! Blocks not set explicitly are air, so the whole world counts as loaded.
//! Alerts, dispatched commands and vitals changes are recorded for
//! inspection.

use std::collections::HashMap;

use vigil_core::{BlockPos, Material, NearbyEntity, PlayerSnapshot, SubjectId, Vitals};

use crate::host::{Enforcer, PlayerDirectory, VitalsControl, WorldView};

/// A recorded vitals change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VitalsChange {
    /// Temporary values applied.
    Override(SubjectId, Vitals),
    /// Saved values put back.
    Restore(SubjectId, Vitals),
}

/// In-memory game server.
#[derive(Clone, Debug, Default)]
pub struct SimServer {
    players: HashMap<SubjectId, PlayerSnapshot>,
    blocks: HashMap<BlockPos, Material>,
    held: HashMap<(SubjectId, u8), Material>,
    mobs: HashMap<SubjectId, usize>,
    alerts: Vec<String>,
    commands: Vec<String>,
    vitals_log: Vec<VitalsChange>,
}

impl SimServer {
    /// Empty world with no players.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings a player online, replacing any previous state.
    pub fn join(&mut self, player: PlayerSnapshot) {
        self.players.insert(player.id, player);
    }

    /// Takes a player offline.
    pub fn leave(&mut self, id: SubjectId) -> Option<PlayerSnapshot> {
        self.players.remove(&id)
    }

    /// Mutable state of an online player.
    pub fn player_mut(&mut self, id: SubjectId) -> Option<&mut PlayerSnapshot> {
        self.players.get_mut(&id)
    }

    /// Places a block.
    pub fn set_block(&mut self, pos: BlockPos, material: Material) {
        if material == Material::Air {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, material);
        }
    }

    /// Puts an item in a hotbar slot.
    pub fn set_held(&mut self, id: SubjectId, slot: u8, material: Material) {
        self.held.insert((id, slot), material);
    }

    /// Reports `count` non-player entities near the player.
    pub fn set_mobs_near(&mut self, id: SubjectId, count: usize) {
        self.mobs.insert(id, count);
    }

    /// Operator alerts so far.
    #[must_use]
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Enforcement commands so far.
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Vitals changes so far.
    #[must_use]
    pub fn vitals_log(&self) -> &[VitalsChange] {
        &self.vitals_log
    }
}

impl PlayerDirectory for SimServer {
    fn player(&self, id: SubjectId) -> Option<PlayerSnapshot> {
        self.players.get(&id).cloned()
    }

    fn nearby_entities(&self, id: SubjectId, radius: f64) -> Vec<NearbyEntity> {
        let Some(center) = self.players.get(&id).map(|p| p.location) else {
            return Vec::new();
        };

        let mut nearby: Vec<NearbyEntity> = self
            .players
            .values()
            .filter(|p| p.id != id)
            .filter(|p| {
                (p.location.x - center.x).abs() <= radius
                    && (p.location.y - center.y).abs() <= radius
                    && (p.location.z - center.z).abs() <= radius
            })
            .cloned()
            .map(NearbyEntity::Player)
            .collect();

        let mobs = self.mobs.get(&id).copied().unwrap_or(0);
        nearby.extend(std::iter::repeat(NearbyEntity::Other).take(mobs));
        nearby
    }

    fn held_item(&self, id: SubjectId, slot: u8) -> Option<Material> {
        self.held.get(&(id, slot)).copied()
    }
}

impl WorldView for SimServer {
    fn block_at(&self, pos: BlockPos) -> Option<Material> {
        Some(self.blocks.get(&pos).copied().unwrap_or(Material::Air))
    }
}

impl Enforcer for SimServer {
    fn alert(&mut self, message: &str) {
        tracing::warn!("{}", message);
        self.alerts.push(message.to_string());
    }

    fn dispatch_command(&mut self, command: &str) {
        tracing::info!("Dispatching: {}", command);
        self.commands.push(command.to_string());
    }
}

impl VitalsControl for SimServer {
    fn override_vitals(&mut self, id: SubjectId, vitals: Vitals) {
        if let Some(player) = self.players.get_mut(&id) {
            player.vitals = vitals;
        }
        self.vitals_log.push(VitalsChange::Override(id, vitals));
    }

    fn restore_vitals(&mut self, id: SubjectId, vitals: Vitals) {
        if let Some(player) = self.players.get_mut(&id) {
            player.vitals = vitals;
        }
        self.vitals_log.push(VitalsChange::Restore(id, vitals));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::Location;

    #[test]
    fn test_nearby_entities() {
        let mut server = SimServer::new();
        let a = SubjectId::from_u128(1);
        let b = SubjectId::from_u128(2);
        let c = SubjectId::from_u128(3);
        server.join(PlayerSnapshot::new(a, "a", Location::new(0.0, 64.0, 0.0)));
        server.join(PlayerSnapshot::new(b, "b", Location::new(3.0, 64.0, 0.0)));
        server.join(PlayerSnapshot::new(c, "c", Location::new(30.0, 64.0, 0.0)));
        server.set_mobs_near(a, 2);

        let nearby = server.nearby_entities(a, 7.0);
        assert_eq!(nearby.len(), 3);
        assert!(matches!(&nearby[0], NearbyEntity::Player(p) if p.id == b));
        assert!(server.nearby_entities(SubjectId::from_u128(9), 7.0).is_empty());
    }

    #[test]
    fn test_blocks_default_to_air() {
        let mut server = SimServer::new();
        let pos = BlockPos::new(0, 65, 0);
        assert_eq!(server.block_at(pos), Some(Material::Air));
        server.set_block(pos, Material::Stone);
        assert_eq!(server.block_at(pos), Some(Material::Stone));
    }

    #[test]
    fn test_vitals_applied_to_player() {
        let mut server = SimServer::new();
        let id = SubjectId::from_u128(1);
        server.join(PlayerSnapshot::new(id, "a", Location::default()));

        server.override_vitals(id, Vitals::new(1.0, 1, 0.5));
        assert_eq!(server.player(id).unwrap().vitals.health, 1.0);
        server.restore_vitals(id, Vitals::default());
        assert_eq!(server.player(id).unwrap().vitals, Vitals::default());
        assert_eq!(server.vitals_log().len(), 2);
    }
}
