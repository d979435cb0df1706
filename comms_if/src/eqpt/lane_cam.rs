//! # Lane Camera Equipment Module
//!
//! The camera pipeline (acquisition, undistortion, perspective rectification and binarisation)
//! runs outside the drive software. What reaches the drive software is the rectified binary
//! top-down lane mask, plus the boolean results of the scene cue detectors.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use image::{GrayImage, ImageBuffer};
use serde::{Deserialize, Serialize};

use super::EqptError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A serialisable lane mask frame
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MaskFrame {
    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Width of the mask in pixels
    pub width: u32,

    /// Height of the mask in pixels
    pub height: u32,

    /// The mask data, one byte per pixel in row-major order (non-zero is lit), encoded in base64.
    pub b64_data: String,
}

/// A decoded lane mask.
#[derive(Debug, Clone)]
pub struct MaskImage {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// Single channel mask, any non-zero pixel is lane marking material.
    pub image: GrayImage,
}

/// Results of the external scene cue detectors for one frame.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct CueFlags {
    /// A traffic signal was detected
    pub signal: bool,

    /// A stop line was detected ahead
    pub stop_line: bool,

    /// A speed bump was detected ahead
    pub bump: bool,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl TryFrom<MaskFrame> for MaskImage {
    type Error = EqptError;

    fn try_from(frame: MaskFrame) -> Result<Self, Self::Error> {
        let bytes = base64::decode(&frame.b64_data).map_err(EqptError::FrameDecodeError)?;

        let expected = frame.width as usize * frame.height as usize;
        let found = bytes.len();

        let image: GrayImage = ImageBuffer::from_raw(frame.width, frame.height, bytes)
            .filter(|_| found == expected)
            .ok_or(EqptError::FrameWrongSize { expected, found })?;

        Ok(Self {
            timestamp: frame.timestamp,
            image,
        })
    }
}

impl From<&MaskImage> for MaskFrame {
    fn from(mask: &MaskImage) -> Self {
        Self {
            timestamp: mask.timestamp,
            width: mask.image.width(),
            height: mask.image.height(),
            b64_data: base64::encode(mask.image.as_raw()),
        }
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
