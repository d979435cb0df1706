//! # Drive Executable Parameters
//!
//! This module provides parameters for the drive executable, loaded from `drive_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::mnvr_mgr::MnvrState;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Longest accepted frame timeout.
const MAX_FRAME_TIMEOUT_S: f64 = 3600.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriveExecParams {
    /// Maximum time to wait for a camera frame before the vehicle is stopped.
    pub frame_timeout_s: f64,

    /// A cycle taking longer than this is reported as an overrun.
    pub cycle_overrun_s: f64,

    /// Maneuver state at start-up.
    pub initial_state: MnvrState,

    /// Save one overlay picture every this many cycles, 0 disables saving.
    pub overlay_save_every_n_cycles: u64,
}

#[derive(Debug, Error, PartialEq)]
pub enum DriveExecParamsError {
    #[error(
        "invalid frame_timeout_s {0} (expected positive and at most {} s)",
        MAX_FRAME_TIMEOUT_S
    )]
    InvalidFrameTimeout(f64),

    #[error("invalid cycle_overrun_s {0} (expected positive)")]
    InvalidCycleOverrun(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveExecParams {
    /// Check the timing parameters can be used by the main loop.
    pub fn validate(&self) -> Result<(), DriveExecParamsError> {
        let t = self.frame_timeout_s;
        if !(t.is_finite() && t > 0.0 && t <= MAX_FRAME_TIMEOUT_S) {
            return Err(DriveExecParamsError::InvalidFrameTimeout(t));
        }

        let o = self.cycle_overrun_s;
        if !(o.is_finite() && o > 0.0) {
            return Err(DriveExecParamsError::InvalidCycleOverrun(o));
        }

        Ok(())
    }

    /// The frame timeout as a duration.
    pub fn frame_timeout(&self) -> Result<Duration, DriveExecParamsError> {
        self.validate()?;
        Ok(Duration::from_secs_f64(self.frame_timeout_s))
    }
}

impl Default for DriveExecParams {
    fn default() -> Self {
        Self {
            frame_timeout_s: 0.5,
            cycle_overrun_s: 0.1,
            initial_state: MnvrState::LaneFollow,
            overlay_save_every_n_cycles: 0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        let p: DriveExecParams = toml::from_str(
            r#"
            frame_timeout_s = 1.0
            initial_state = "INSERTING"
            "#,
        )
        .unwrap();

        assert_eq!(p.frame_timeout_s, 1.0);
        assert_eq!(p.initial_state, MnvrState::Inserting);
        assert_eq!(p.cycle_overrun_s, 0.1);
        assert_eq!(p.overlay_save_every_n_cycles, 0);

        assert!(toml::from_str::<DriveExecParams>("initial_state = \"FLYING\"").is_err());
    }

    #[test]
    fn test_validate() {
        let p = DriveExecParams::default();
        p.validate().unwrap();
        assert_eq!(p.frame_timeout().unwrap(), Duration::from_millis(500));

        for t in [0.0, -0.5, f64::NAN, f64::INFINITY, 1.0e300].iter() {
            let p = DriveExecParams {
                frame_timeout_s: *t,
                ..Default::default()
            };
            assert!(
                matches!(
                    p.frame_timeout(),
                    Err(DriveExecParamsError::InvalidFrameTimeout(_))
                ),
                "{}",
                t
            );
        }

        for o in [0.0, -1.0, f64::NAN].iter() {
            let p = DriveExecParams {
                cycle_overrun_s: *o,
                ..Default::default()
            };
            assert!(matches!(
                p.validate(),
                Err(DriveExecParamsError::InvalidCycleOverrun(_))
            ));
        }
    }
}
