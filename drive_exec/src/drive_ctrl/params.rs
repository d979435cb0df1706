//! # DriveCtrl parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::{emit::EmitParams, DriveCtrlError};
use crate::{lane::LaneParams, mnvr_mgr::MnvrParams, sensor_hub::SensorHubParams};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of distortion coefficients in the camera model.
pub const NUM_DISTORTION_COEFFS: usize = 5;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the drive pipeline, loaded from `drive_ctrl.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DriveCtrlParams {
    pub lane: LaneParams,
    pub sensor_hub: SensorHubParams,
    pub mnvr: MnvrParams,
    pub emit: EmitParams,
    pub calib: CalibParams,
}

/// Static calibration of the camera.
///
/// This is consumed by the rectification stage which produces the lane mask, not by the drive
/// pipeline itself. It is carried here so the whole vehicle is configured from one place.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalibParams {
    pub image_width: u32,
    pub image_height: u32,

    /// Camera intrinsic matrix, row major.
    pub camera_matrix: Vec<Vec<f64>>,

    /// Distortion coefficients `[k1, k2, p1, p2, k3]`.
    pub distortion_coeffs: Vec<f64>,

    /// Threshold used to binarise the warped image into the lane mask.
    pub lane_bin_threshold: u8,

    pub edge_threshold_low: f64,
    pub edge_threshold_high: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CalibParams {
    fn default() -> Self {
        Self {
            image_width: 640,
            image_height: 480,
            camera_matrix: vec![
                vec![422.04, 0.0, 245.71],
                vec![0.0, 422.28, 171.04],
                vec![0.0, 0.0, 1.0],
            ],
            distortion_coeffs: vec![-0.31, 0.08, 0.0, 0.0, 0.0],
            lane_bin_threshold: 130,
            edge_threshold_low: 80.0,
            edge_threshold_high: 90.0,
        }
    }
}

impl CalibParams {
    /// Check the calibration is well formed.
    pub fn validate(&self) -> Result<(), DriveCtrlError> {
        let invalid = |s: String| Err(DriveCtrlError::InvalidCalib(s));

        if self.image_width == 0 || self.image_height == 0 {
            return invalid(format!(
                "image size {}x{} is empty",
                self.image_width, self.image_height
            ));
        }

        if self.camera_matrix.len() != 3 || self.camera_matrix.iter().any(|r| r.len() != 3) {
            return invalid("camera matrix is not 3x3".into());
        }

        if self
            .camera_matrix
            .iter()
            .flatten()
            .any(|v| !v.is_finite())
        {
            return invalid("camera matrix contains non-finite values".into());
        }

        if self.distortion_coeffs.len() != NUM_DISTORTION_COEFFS {
            return invalid(format!(
                "expected {} distortion coefficients, found {}",
                NUM_DISTORTION_COEFFS,
                self.distortion_coeffs.len()
            ));
        }

        if self.edge_threshold_low > self.edge_threshold_high {
            return invalid(format!(
                "edge thresholds are inverted ({} > {})",
                self.edge_threshold_low, self.edge_threshold_high
            ));
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_calib_is_valid() {
        CalibParams::default().validate().unwrap();
    }

    #[test]
    fn test_invalid_calib() {
        let bad = [
            CalibParams {
                camera_matrix: vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
                ..Default::default()
            },
            CalibParams {
                camera_matrix: vec![
                    vec![1.0, 0.0, 0.0],
                    vec![0.0, f64::NAN, 0.0],
                    vec![0.0, 0.0, 1.0],
                ],
                ..Default::default()
            },
            CalibParams {
                distortion_coeffs: vec![0.0; 4],
                ..Default::default()
            },
            CalibParams {
                edge_threshold_low: 100.0,
                ..Default::default()
            },
            CalibParams {
                image_height: 0,
                ..Default::default()
            },
        ];

        for c in bad.iter() {
            assert!(
                matches!(c.validate(), Err(DriveCtrlError::InvalidCalib(_))),
                "{:?}",
                c
            );
        }
    }

    #[test]
    fn test_params_from_toml() {
        let params: DriveCtrlParams = toml::from_str(
            r#"
            [lane]
            scan_row = 440

            [mnvr]
            signal_mnvr_t_s = 3.0
            parallel_phase_ends_s = [1.0, 2.0, 3.0, 4.0]

            [emit]
            cruise_speed = 20

            [calib]
            camera_matrix = [[400.0, 0.0, 320.0], [0.0, 400.0, 240.0], [0.0, 0.0, 1.0]]
            distortion_coeffs = [0.1, 0.0, 0.0, 0.0, 0.0]
            "#,
        )
        .unwrap();

        assert_eq!(params.lane.scan_row, 440);
        assert_eq!(params.lane.fallback_row, 450);
        assert_eq!(params.mnvr.signal_mnvr_t_s, 3.0);
        assert_eq!(params.mnvr.parallel_phase_ends_s, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(params.mnvr.signal_recover_turn_s, (3.0, 4.0));
        assert_eq!(params.emit.cruise_speed, 20);
        assert_eq!(params.emit.steer_limit, 50);
        assert_eq!(params.calib.camera_matrix[0][2], 320.0);
        assert_eq!(params.calib.lane_bin_threshold, 130);
        params.calib.validate().unwrap();
    }
}
