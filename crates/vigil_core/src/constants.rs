//! # Physics Constants
//!
//! Values the host's movement simulation uses. The detector only needs them
//! to rescale deltas and to describe a player's bounding box.

/// Walk speed attribute of an unmodified player.
pub const DEFAULT_WALK_SPEED: f32 = 0.2;

/// Eye height of a standing player.
pub const DEFAULT_EYE_HEIGHT: f64 = 1.62;

/// Maximum health of an unmodified player.
pub const DEFAULT_MAX_HEALTH: f64 = 20.0;

/// Bounding box width.
pub const PLAYER_WIDTH: f64 = 0.6;

/// Bounding box height while standing.
pub const PLAYER_HEIGHT: f64 = 1.85;

/// Server ticks per second.
pub const TICK_RATE: u32 = 20;

/// Vertical velocity the server applies on damage with no knockback source.
pub const DAMAGE_VELOCITY_Y: f64 = -0.078_400_001_525_878_9;

/// Vertical delta of a sprint-jump's first tick.
pub const SPRINT_JUMP_DELTA_Y: f64 = 0.419_999_986_886_978_15;

/// Upward impulse of a melee knockback.
pub const KNOCKBACK_FACTOR: f64 = 0.4;

/// Ceiling on vertical velocity after knockback.
pub const KNOCKBACK_MAX_Y: f64 = 0.400_000_005_960_464_5;
