//! # Ranging, Ultrasonic and Landmark Equipment Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of ultrasonic sensors mounted on the vehicle.
pub const NUM_ULTRASONIC: usize = 8;

/// Ultrasonic channel on the left hand side of the vehicle.
pub const US_SIDE_LEFT: usize = 0;

/// Ultrasonic channel on the right hand side of the vehicle.
pub const US_SIDE_RIGHT: usize = 4;

/// Ultrasonic channel at the rear right of the vehicle.
pub const US_REAR_RIGHT: usize = 5;

/// Ultrasonic channel at the rear centre of the vehicle.
pub const US_REAR_CENTER: usize = 6;

/// Ultrasonic channel at the rear left of the vehicle.
pub const US_REAR_LEFT: usize = 7;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A full revolution of the ranging sensor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RangingScan {
    /// UTC timestamp at which the scan was completed
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Range samples in angular order, covering 360 degrees.
    ///
    /// Units: meters, negative values mark invalid samples.
    pub ranges_m: Vec<f64>,
}

/// A reading of all ultrasonic sensors.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct UltrasonicArray {
    /// UTC timestamp at which the array was read
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Distance reported by each sensor, in the sensor's integer units (centimeters).
    pub dist: [i32; NUM_ULTRASONIC],
}

/// A single landmark (fiducial tag) detection.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LandmarkDetection {
    /// Identifier encoded in the tag
    pub id: i32,

    /// Distance from the camera to the tag.
    ///
    /// Units: meters
    pub distance_m: f64,
}

/// All landmark detections from one landmark camera frame.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LandmarkReport {
    /// UTC timestamp of the frame the detections come from
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    pub detections: Vec<LandmarkDetection>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LandmarkReport {
    /// Get the detection closest to the vehicle, if any.
    pub fn nearest(&self) -> Option<LandmarkDetection> {
        self.detections
            .iter()
            .filter(|d| d.distance_m.is_finite())
            .copied()
            .min_by(|a, b| {
                a.distance_m
                    .partial_cmp(&b.distance_m)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}
