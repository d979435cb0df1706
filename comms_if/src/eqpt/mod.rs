//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with sensor and actuation equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod act;
pub mod lane_cam;
pub mod range;

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use self::{
    lane_cam::{CueFlags, MaskFrame},
    range::{LandmarkReport, RangingScan, UltrasonicArray},
};

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// A message published by the sensor side to the drive executable.
///
/// Each sensor publishes independently of the others, the camera frame being the only one which
/// triggers a control cycle.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum SensorMsg {
    /// A rectified top-down lane mask along with the results of the scene cue detectors which ran
    /// on the matching undistorted colour frame.
    Frame { mask: MaskFrame, cues: CueFlags },

    /// A full ranging (lidar) scan.
    Ranging(RangingScan),

    /// A reading of the ultrasonic array.
    Ultrasonic(UltrasonicArray),

    /// Landmark (fiducial tag) detections.
    Landmark(LandmarkReport),
}

/// Errors which can occur when decoding equipment data.
#[derive(Debug, thiserror::Error, Clone)]
pub enum EqptError {
    #[error("Failed to decode frame data from base64: {0}")]
    FrameDecodeError(base64::DecodeError),

    #[error("The encoded frame data was the wrong size, expected {expected} bytes, found {found}")]
    FrameWrongSize { expected: usize, found: usize },
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl SensorMsg {
    /// Short name of the sensor which produced this message, used in logs.
    pub fn source(&self) -> &'static str {
        match self {
            SensorMsg::Frame { .. } => "camera",
            SensorMsg::Ranging(_) => "ranging",
            SensorMsg::Ultrasonic(_) => "ultrasonic",
            SensorMsg::Landmark(_) => "landmark",
        }
    }
}
