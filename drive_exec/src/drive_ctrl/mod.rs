//! # Drive control module
//!
//! Drive control runs the per-cycle pipeline of the vehicle: the lane is scanned in the camera
//! mask, the maneuver manager is stepped with the lane and the fused sensors, and the resulting
//! command is clamped to the actuator limits.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod emit;
pub mod overlay;
mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use overlay::{OverlaySink, PngSaver};
pub use params::*;
pub use state::*;

use crate::{lane::LaneError, mnvr_mgr::MnvrMgrError};
use util::{archive::ArchiveError, params::LoadError};

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Could not load the DriveCtrl parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid camera calibration: {0}")]
    InvalidCalib(String),

    #[error("Lane error: {0}")]
    LaneError(LaneError),

    #[error("Maneuver manager error: {0}")]
    MnvrMgrError(MnvrMgrError),

    #[error("Could not archive DriveCtrl data: {0}")]
    ArchiveError(ArchiveError),

    #[error("DriveCtrl has not been initialised")]
    NotInit,
}
