//! # Movement Signatures
//!
//! Known cheat clients move by fixed amounts. Deltas are compared after
//! quantizing to four decimal places, so `-0.125` becomes `-1250`.
//!
//! Every value here was observed against a specific client or against
//! vanilla physics. Changing one changes what is detected.

/// Quantization factor.
pub const SCALE: f64 = 10_000.0;

/// Truncates a delta to four decimal places.
#[must_use]
pub fn quantize(value: f64) -> i32 {
    (value * SCALE) as i32
}

/// Vanilla jump accelerations, relative to the velocity on leaving the
/// ground, one per tick of a jump arc.
pub const JUMP_ACCELS: [i32; 12] = [
    -850, -1684, -2501, -3331, -4115, -4884, -3487, -752, -5637, -6375, -7098, -4372,
];

/// Vanilla accelerations at the start of a fall.
pub const FALL_ACCELS: [i32; 3] = [-752, -1490, -2213];

/// Constant descent of a popular glide module.
pub const WURST_GLIDE_V: i32 = -1250;
/// Terminal-ish vanilla descents that also show zero acceleration.
pub const VANILLA_GLIDE_V: [i32; 2] = [-980, -784];
/// Upward acceleration of a fly module.
pub const METRO_ACCEL: i32 = 4020;
/// Upward acceleration of a fly module. Too close to vanilla to act on.
pub const HUZUNI_ACCEL: i32 = 3332;

/// Vertical delta of a flight mode that evades a common server anticheat.
pub const EVASION_FLIGHT_V: i32 = 1010;
/// Vertical delta produced by players stuck against each other.
pub const PVP_STUCK_V: i32 = 784;

/// Constant vertical fly speed, one client each.
pub const WURST_FLIGHT_V: i32 = 10_000;
/// Constant vertical fly speed.
pub const METRO_FLIGHT_V: i32 = 3750;
/// Constant vertical fly speed.
pub const HUZUNI_FLIGHT_V: i32 = 3749;
/// Horizontal speeds of a speed module.
pub const WURST_SPEED_H: [i32; 2] = [9183, 10_014];
/// Horizontal speed rarely seen outside cheats.
pub const SUSPICIOUS_SPEED_H: i32 = 9800;
/// Vertical speed rarely seen outside cheats.
pub const SUSPICIOUS_FLIGHT_V: i32 = 10_100;

/// Expected vertical delta above which a fly hack is obvious.
pub const OBVIOUS_EXPECTED_V: i32 = 7200;
/// Expected horizontal delta above which a fly hack is obvious.
pub const OBVIOUS_EXPECTED_H: i32 = 6000;
/// Sprint-jump vertical deltas exempt from the horizontal check.
pub const SPRINT_JUMP_V: [i32; 2] = [4199, 4200];

/// Fractional Y values a no-clip module lands on.
pub const NO_CLIP_FRACTIONS: [i32; 3] = [0, -1142, 8857];
/// Minimum vertical jump for the no-clip scan.
pub const NO_CLIP_MIN_V: i32 = 20_000;
/// Maximum horizontal drift for the no-clip scan.
pub const NO_CLIP_MAX_H: i32 = 200;

/// Strike for the constant glide descent.
pub const WURST_GLIDE_STRIKE: u32 = 200;

/// Obvious-fly counter that produces a verdict.
pub const OBVIOUS_FLY_LIMIT: u32 = 12;
/// Suspicious-fly counter that produces a verdict.
pub const SUSPICIOUS_FLY_LIMIT: u32 = 640;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_truncates() {
        assert_eq!(quantize(-0.125), WURST_GLIDE_V);
        assert_eq!(quantize(1.0), WURST_FLIGHT_V);
        assert_eq!(quantize(0.099_99), 999);
        assert_eq!(quantize(-0.000_01), 0);
    }

    #[test]
    fn test_jump_arc_lookup() {
        assert!(JUMP_ACCELS.contains(&-850));
        assert!(!JUMP_ACCELS.contains(&0));
    }
}
