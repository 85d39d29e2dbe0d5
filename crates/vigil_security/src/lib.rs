//! # Vigil Security - The Heuristics Engine
//!
//! Server-side behavioral anomaly detection for multiplayer game servers.
//!
//! ## Features
//!
//! - **Movement Analysis**: flight, glide, speed, blink, no-clip, water walk
//! - **Combat Analysis**: reach, repeated aim error, attack cadence
//! - **Knockback Tracking**: expected impulses that never show up
//! - **Strike Engine**: weighted strikes, blackmarks and verdicts
//! - **Exploit Mitigation**: post-kill vitals override against autosoup
//!
//! ## Architecture
//!
//! ```text
//! GAME SERVER                          VIGIL
//!     │                                  │
//!     │─── HostEvent ──────────────────►│ Heuristics::handle
//!     │─── tick() ─────────────────────►│ gate + deferred work
//!     │                                  │
//!     │                                  ▼
//!     │                          ┌───────────────┐
//!     │                          │ Detector per  │
//!     │                          │ subject       │
//!     │                          └───────────────┘
//!     │                                  │
//!     │◄─── alert / commands / vitals ──┤ Verdict
//!     │                                  │
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod heuristics;
pub mod host;
pub mod scenario;
pub mod shared;
pub mod sim;

pub use config::{render_command, HeuristicsConfig};
pub use error::{VigilError, VigilResult};
pub use events::{DamageCause, HostEvent, InteractAction};
pub use gate::{GateState, ReadyGate};
pub use heuristics::{Detector, Heuristics, Millis, Verdict};
pub use host::{Enforcer, Host, PlayerDirectory, VitalsControl, WorldView};
pub use scenario::{Scenario, ScenarioOutcome};
pub use shared::SharedHeuristics;
pub use sim::{SimServer, VitalsChange};
