//! # Command emission
//!
//! The base command steers towards the lane center at cruise speed. The maneuver manager's
//! override is layered on top and the result is clamped to the actuator limits.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::act::DriveDems;
use serde::{Deserialize, Serialize};

use crate::mnvr_mgr::CmdOverride;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmitParams {
    /// Lane center column at which the vehicle steers straight.
    pub steer_reference_px: i32,

    pub cruise_speed: i32,

    /// Steer demands are clamped to `[-steer_limit, steer_limit]`.
    pub steer_limit: i32,

    pub min_speed: i32,
    pub max_speed: i32,
}

/// Which demands were limited by [`clamp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Limited {
    pub steer: bool,
    pub speed: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for EmitParams {
    fn default() -> Self {
        Self {
            steer_reference_px: 300,
            cruise_speed: 15,
            steer_limit: 50,
            min_speed: -30,
            max_speed: 30,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Command steering towards the given lane center at cruise speed.
///
/// The steer is half the offset of the center from the reference, rounded towards zero.
pub fn base_command(center: i32, params: &EmitParams) -> DriveDems {
    DriveDems::new((center - params.steer_reference_px) / 2, params.cruise_speed)
}

/// Apply a maneuver override to a base command.
pub fn apply(base: DriveDems, cmd: CmdOverride) -> DriveDems {
    DriveDems::new(cmd.steer.unwrap_or(base.steer), cmd.speed.unwrap_or(base.speed))
}

/// Clamp a command to the actuator limits.
pub fn clamp(cmd: DriveDems, params: &EmitParams) -> (DriveDems, Limited) {
    let steer = cmd.steer.max(-params.steer_limit).min(params.steer_limit);
    let speed = cmd.speed.max(params.min_speed).min(params.max_speed);

    (
        DriveDems::new(steer, speed),
        Limited {
            steer: steer != cmd.steer,
            speed: speed != cmd.speed,
        },
    )
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_base_command() {
        let p = EmitParams::default();

        assert_eq!(base_command(300, &p), DriveDems::new(0, 15));
        assert_eq!(base_command(315, &p), DriveDems::new(7, 15));
        assert_eq!(base_command(435, &p), DriveDems::new(67, 15));

        // Towards zero, not floored
        assert_eq!(base_command(285, &p), DriveDems::new(-7, 15));
        assert_eq!(base_command(299, &p), DriveDems::new(0, 15));
    }

    #[test]
    fn test_apply_and_clamp() {
        let p = EmitParams::default();
        let base = base_command(435, &p);

        assert_eq!(apply(base, CmdOverride::default()), base);
        assert_eq!(
            apply(base, CmdOverride::speed(0)),
            DriveDems::new(67, 0)
        );

        let (cmd, limited) = clamp(base, &p);
        assert_eq!(cmd, DriveDems::new(50, 15));
        assert_eq!(
            limited,
            Limited {
                steer: true,
                speed: false
            }
        );

        let (cmd, limited) = clamp(DriveDems::new(-80, -45), &p);
        assert_eq!(cmd, DriveDems::new(-50, -30));
        assert!(limited.steer && limited.speed);

        let (cmd, limited) = clamp(DriveDems::new(-50, -20), &p);
        assert_eq!(cmd, DriveDems::new(-50, -20));
        assert_eq!(limited, Limited::default());
    }
}
