//! # Scenarios
//!
//! A scenario is a scripted session: who is online, which blocks exist, and
//! a timeline of host events. It is replayed against a [`SimServer`] and the
//! resulting verdicts, alerts and commands are returned.
//!
//! ```toml
//! [config]
//! debug_enabled = true
//!
//! [[players]]
//! id = "00000000-0000-0000-0000-000000000001"
//! name = "Steve"
//! on_ground = false
//! location = { x = 0.5, y = 70.0, z = 0.5 }
//!
//! [[blocks]]
//! x = 0
//! y = 65
//! z = 0
//! material = "stone"
//!
//! [[steps]]
//! at = 1000
//! event = { type = "moved", player = "00000000-0000-0000-0000-000000000001", from = { x = 0.5, y = 70.0, z = 0.5 }, to = { x = 0.5, y = 70.1, z = 0.5 } }
//! ```
//!
//! Each step sets the clock to `at`, applies any player updates, delivers
//! its event and then advances `ticks` server ticks. A non-cancelled move
//! also updates the mover's simulated location.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vigil_core::{BlockPos, Material, PlayerSnapshot, SubjectId};

use crate::config::HeuristicsConfig;
use crate::error::{VigilError, VigilResult};
use crate::events::HostEvent;
use crate::gate::ReadyGate;
use crate::heuristics::{Heuristics, Millis, Verdict};
use crate::sim::{SimServer, VitalsChange};

/// A block placed before the timeline starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    /// Block X.
    pub x: i32,
    /// Block Y.
    pub y: i32,
    /// Block Z.
    pub z: i32,
    /// Material name, parsed leniently.
    pub material: String,
}

/// One point on the timeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    /// Wall clock for this step.
    pub at: Millis,
    /// Players joining or changing state before the event.
    pub players: Vec<PlayerSnapshot>,
    /// Players leaving before the event.
    pub leave: Vec<SubjectId>,
    /// Event to deliver.
    pub event: Option<HostEvent>,
    /// Server ticks to run after the event.
    pub ticks: u32,
}

/// A scripted session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Detector configuration.
    pub config: HeuristicsConfig,
    /// Players online at the start.
    pub players: Vec<PlayerSnapshot>,
    /// Blocks placed at the start.
    pub blocks: Vec<BlockSpec>,
    /// Timeline.
    pub steps: Vec<Step>,
}

/// What a replay produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioOutcome {
    /// Verdicts in issue order.
    pub verdicts: Vec<Verdict>,
    /// Operator alerts.
    pub alerts: Vec<String>,
    /// Dispatched enforcement commands.
    pub commands: Vec<String>,
    /// Vitals overrides and restores.
    pub vitals: Vec<VitalsChange>,
    /// Events delivered.
    pub events: usize,
    /// Ticks run.
    pub ticks: u64,
}

impl Scenario {
    /// Parses a scenario from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scenario or its
    /// configuration is out of range.
    pub fn from_toml_str(text: &str) -> VigilResult<Self> {
        let scenario: Self = toml::from_str(text)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Reads a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> VigilResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| VigilError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Builds the simulated world. Unknown materials are skipped.
    #[must_use]
    pub fn build_server(&self) -> SimServer {
        let mut server = SimServer::new();
        for player in &self.players {
            server.join(player.clone());
        }
        for block in &self.blocks {
            match block.material.parse::<Material>() {
                Ok(material) => server.set_block(BlockPos::new(block.x, block.y, block.z), material),
                Err(err) => tracing::warn!("Skipping block at {} {} {}: {}", block.x, block.y, block.z, err),
            }
        }
        server
    }

    /// Replays the timeline against a fresh simulated world. The warm-up is
    /// skipped.
    #[must_use]
    pub fn run(&self) -> ScenarioOutcome {
        let mut heuristics =
            Heuristics::with_gate(self.config.clone(), self.build_server(), ReadyGate::open());
        let mut outcome = ScenarioOutcome::default();

        for step in &self.steps {
            heuristics.set_time(step.at);
            for player in &step.players {
                heuristics.host_mut().join(player.clone());
            }
            for id in &step.leave {
                let _ = heuristics.host_mut().leave(*id);
            }

            if let Some(event) = &step.event {
                heuristics.handle(event.clone());
                outcome.events += 1;
                if let HostEvent::Moved {
                    player,
                    to,
                    cancelled: false,
                    ..
                } = event
                {
                    if let Some(snapshot) = heuristics.host_mut().player_mut(*player) {
                        snapshot.location = *to;
                    }
                }
            }

            for _ in 0..step.ticks {
                heuristics.tick();
            }
            outcome.ticks += u64::from(step.ticks);
        }

        outcome.verdicts = heuristics.take_verdicts();
        let host = heuristics.host();
        outcome.alerts = host.alerts().to_vec();
        outcome.commands = host.commands().to_vec();
        outcome.vitals = host.vitals_log().to_vec();
        outcome
    }
}
