//! # Vigil Core
//!
//! Types shared between the host game server and the anomaly detector.
//!
//! ## CRITICAL RULE
//!
//! This crate describes the world as the server reports it. It must never
//! contain detection logic: thresholds, scores and verdicts belong in
//! `vigil_security`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::perf)]

pub mod constants;
pub mod material;
pub mod math;
pub mod player;

pub use material::{Material, UnknownMaterial};
pub use math::{BlockPos, Location, Vec3};
pub use player::{
    GameMode, NearbyEntity, PlayerSnapshot, PotionEffect, PotionKind, SubjectId, Vitals,
};
