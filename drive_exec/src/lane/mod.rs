//! # Lane module
//!
//! Estimates the position of the lane from a rectified, binary, top-down mask of the track. The
//! estimate is found by scanning a row near the bottom of the mask outwards from the centre of the
//! lane found on the previous cycle. Missing or implausible edges are replaced using a fixed
//! fallback policy so that the vehicle always has a lane to follow:
//!
//! 1. If only one edge is found the other is synthesised one lane width away.
//! 2. If neither edge is found the fallback row is scanned in the same way, defaulting to the
//!    mask borders.
//! 3. Gaps which are too narrow or too wide are replaced by fixed pairs.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub mod scan;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::GrayImage;
use log::trace;
use serde::Serialize;

pub use params::LaneParams;
use scan::{clamp_edges, correct_gap, scan_left, scan_right};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Scans masks for the lane edges.
#[derive(Debug, Clone)]
pub struct LaneScanner {
    params: LaneParams,
}

/// The result of scanning one mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaneScan {
    pub left_x: i32,
    pub right_x: i32,
    pub quality: ScanQuality,
}

/// Position of the lane in the mask.
///
/// `last_center` is the origin of the next scan, it is normally the midpoint of the edges but may
/// be reset by the maneuver manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanePosition {
    pub left_x: i32,
    pub right_x: i32,
    pub center: i32,
    pub last_center: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How the edges of a [`LaneScan`] were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanQuality {
    /// Both edges were seen on the same row.
    Observed,

    /// At least one edge was seen, the other was synthesised or defaulted.
    Synthesised,

    /// Nothing was seen, the edges are the fallback defaults.
    Lost,
}

#[derive(Debug, thiserror::Error)]
pub enum LaneError {
    #[error("Expected a {expected:?} mask but got a {found:?} one")]
    WrongMaskSize {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("The {0} ({1}) is outside the mask")]
    RowOutOfBounds(&'static str, u32),

    #[error("The {0} pair {1:?} is not a valid pair of edges in the mask")]
    InvalidPair(&'static str, (u32, u32)),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LaneScanner {
    /// Create a new scanner, checking the parameters are consistent with the mask size.
    pub fn new(params: LaneParams) -> Result<Self, LaneError> {
        for (name, row) in [
            ("scan_row", params.scan_row),
            ("fallback_row", params.fallback_row),
            ("side_lane_row", params.side_lane_row),
        ]
        .iter()
        {
            if *row >= params.height {
                return Err(LaneError::RowOutOfBounds(*name, *row));
            }
        }

        for (name, pair) in [
            ("collapsed", params.collapsed_pair),
            ("wide", params.wide_pair),
        ]
        .iter()
        {
            if pair.0 >= pair.1 || pair.1 >= params.width {
                return Err(LaneError::InvalidPair(*name, *pair));
            }
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> &LaneParams {
        &self.params
    }

    /// Check that the mask has the expected dimensions.
    pub fn check_mask(&self, mask: &GrayImage) -> Result<(), LaneError> {
        let expected = (self.params.width, self.params.height);
        let found = mask.dimensions();

        if expected != found {
            return Err(LaneError::WrongMaskSize { expected, found });
        }

        Ok(())
    }

    /// Scan the mask for the lane edges, starting from the last center.
    pub fn scan(&self, mask: &GrayImage, last_center: i32) -> Result<LaneScan, LaneError> {
        self.check_mask(mask)?;

        let lane_width = self.params.lane_width_px as i32;

        let primary = self.edges_on_row(mask, self.params.scan_row, last_center);

        let (left_x, right_x, quality) = match primary {
            (Some(l), Some(r)) => (l, r, ScanQuality::Observed),
            (Some(l), None) => (l, l + lane_width, ScanQuality::Synthesised),
            (None, Some(r)) => (r - lane_width, r, ScanQuality::Synthesised),
            (None, None) => match self.edges_on_row(mask, self.params.fallback_row, last_center) {
                (Some(l), Some(r)) => (l, r, ScanQuality::Observed),
                (Some(l), None) => (l, l + lane_width, ScanQuality::Synthesised),
                (None, Some(r)) => (r - lane_width, r, ScanQuality::Synthesised),
                (None, None) => (0, self.params.width as i32, ScanQuality::Lost),
            },
        };

        trace!(
            "Lane scan from {}: raw edges ({}, {}), {:?}",
            last_center,
            left_x,
            right_x,
            quality
        );

        let (left_x, right_x) = correct_gap(left_x, right_x, &self.params);
        let (left_x, right_x) = clamp_edges(left_x, right_x, self.params.width);

        Ok(LaneScan {
            left_x,
            right_x,
            quality,
        })
    }

    /// Look for the edge of a neighbouring lane to the left of the current left edge.
    pub fn find_side_lane(&self, mask: &GrayImage, left_x: i32) -> Option<i32> {
        scan_left(
            mask,
            self.params.side_lane_row,
            left_x - self.params.side_lane_offset_px as i32,
        )
    }

    fn edges_on_row(&self, mask: &GrayImage, row: u32, from: i32) -> (Option<i32>, Option<i32>) {
        (scan_left(mask, row, from), scan_right(mask, row, from))
    }
}

impl LanePosition {
    /// Build a position from a pair of edges, the last center is set to the new center.
    pub fn from_edges(left_x: i32, right_x: i32) -> Self {
        let center = (left_x + right_x) / 2;

        Self {
            left_x,
            right_x,
            center,
            last_center: center,
        }
    }

    /// Replace the edges, recomputing the center and the last center.
    pub fn set_edges(&mut self, left_x: i32, right_x: i32) {
        *self = Self::from_edges(left_x, right_x);
    }
}

impl Default for LanePosition {
    fn default() -> Self {
        // Scanning starts from the nominal lane center
        Self {
            left_x: 250,
            right_x: 350,
            center: 300,
            last_center: 300,
        }
    }
}

impl From<LaneScan> for LanePosition {
    fn from(scan: LaneScan) -> Self {
        Self::from_edges(scan.left_x, scan.right_x)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Luma;

    fn scanner() -> LaneScanner {
        LaneScanner::new(LaneParams::default()).unwrap()
    }

    fn mask_with_cols(rows: &[u32], cols: &[u32]) -> GrayImage {
        let mut mask = GrayImage::new(640, 480);
        for &y in rows {
            for &x in cols {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }

    #[test]
    fn test_scan_both_edges() {
        let mask = mask_with_cols(&[445], &[240, 370]);
        let scan = scanner().scan(&mask, 300).unwrap();

        assert_eq!((scan.left_x, scan.right_x), (240, 370));
        assert_eq!(scan.quality, ScanQuality::Observed);
    }

    #[test]
    fn test_synthesised_edge_is_lane_width_away() {
        let s = scanner();

        for right in (310..600).step_by(13) {
            let mask = mask_with_cols(&[445], &[right]);
            let scan = s.scan(&mask, 300).unwrap();
            assert_eq!(scan.quality, ScanQuality::Synthesised);
            assert_eq!((scan.left_x, scan.right_x), (right as i32 - 130, right as i32));
        }

        for left in (140..300).step_by(13) {
            let mask = mask_with_cols(&[445], &[left]);
            let scan = s.scan(&mask, 300).unwrap();
            assert_eq!(scan.quality, ScanQuality::Synthesised);
            assert_eq!((scan.left_x, scan.right_x), (left as i32, left as i32 + 130));
        }
    }

    #[test]
    fn test_fallback_row() {
        let s = scanner();

        // Scan row empty, both edges on the fallback row
        let mask = mask_with_cols(&[450], &[200, 390]);
        let scan = s.scan(&mask, 300).unwrap();
        assert_eq!((scan.left_x, scan.right_x), (200, 390));
        assert_eq!(scan.quality, ScanQuality::Observed);

        // Only the left edge on the fallback row
        let mask = mask_with_cols(&[450], &[200]);
        let scan = s.scan(&mask, 300).unwrap();
        assert_eq!((scan.left_x, scan.right_x), (200, 330));

        // A single edge on the scan row takes priority over the fallback row
        let mut mask = mask_with_cols(&[450], &[100, 500]);
        mask.put_pixel(350, 445, Luma([255]));
        let scan = s.scan(&mask, 300).unwrap();
        assert_eq!((scan.left_x, scan.right_x), (220, 350));
    }

    #[test]
    fn test_blank_mask_is_lost() {
        let mask = GrayImage::new(640, 480);
        let scan = scanner().scan(&mask, 300).unwrap();

        // (0, 640) is too wide and is replaced by the wide pair
        assert_eq!((scan.left_x, scan.right_x), (350, 520));
        assert_eq!(scan.quality, ScanQuality::Lost);
        assert_eq!(LanePosition::from(scan).last_center, 435);
    }

    #[test]
    fn test_center_always_in_mask() {
        let s = scanner();

        for col in (0..640).step_by(17) {
            for last_center in [-50, 0, 300, 639, 700].iter() {
                let mask = mask_with_cols(&[445], &[col]);
                let pos = LanePosition::from(s.scan(&mask, *last_center).unwrap());

                assert!(pos.left_x >= 0 && pos.right_x < 640);
                assert!(pos.right_x > pos.left_x);
                assert_eq!(pos.last_center, (pos.left_x + pos.right_x) / 2);
                assert!(pos.last_center >= 0 && pos.last_center < 640);
            }
        }
    }

    #[test]
    fn test_wrong_mask_size() {
        let mask = GrayImage::new(320, 240);

        match scanner().scan(&mask, 300) {
            Err(LaneError::WrongMaskSize { expected, found }) => {
                assert_eq!(expected, (640, 480));
                assert_eq!(found, (320, 240));
            }
            r => panic!("Expected a wrong size error, got {:?}", r),
        }
    }

    #[test]
    fn test_invalid_params() {
        let params = LaneParams {
            scan_row: 480,
            ..Default::default()
        };
        assert!(matches!(
            LaneScanner::new(params),
            Err(LaneError::RowOutOfBounds("scan_row", 480))
        ));

        let params = LaneParams {
            wide_pair: (520, 350),
            ..Default::default()
        };
        assert!(matches!(
            LaneScanner::new(params),
            Err(LaneError::InvalidPair("wide", _))
        ));
    }

    #[test]
    fn test_side_lane() {
        let s = scanner();
        let mask = mask_with_cols(&[200], &[80]);

        assert_eq!(s.find_side_lane(&mask, 200), Some(80));
        assert_eq!(s.find_side_lane(&mask, 130), Some(80));

        // The search starts left of the offset
        let mask = mask_with_cols(&[200], &[160]);
        assert_eq!(s.find_side_lane(&mask, 200), None);
    }
}
