//! # Lane scanner parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the [`super::LaneScanner`].
///
/// All distances are in pixels of the rectified top-down mask.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LaneParams {
    /// Expected width of the mask.
    pub width: u32,

    /// Expected height of the mask.
    pub height: u32,

    /// Row scanned first for the lane edges, near the bottom of the mask.
    pub scan_row: u32,

    /// Row scanned when neither edge is found on the scan row.
    pub fallback_row: u32,

    /// Nominal lane width, used to synthesise a missing edge.
    pub lane_width_px: u32,

    /// Gaps below this are a collapsed estimate.
    pub min_gap_px: u32,

    /// Gaps below this (and at least `min_gap_px`) are widened to the nominal lane width.
    pub narrow_gap_px: u32,

    /// Gaps above this are implausibly wide.
    pub max_gap_px: u32,

    /// Edges used when the gap collapses below `min_gap_px`.
    pub collapsed_pair: (u32, u32),

    /// Edges used when the gap exceeds `max_gap_px`.
    pub wide_pair: (u32, u32),

    /// Row used to look for a neighbouring lane while inserting.
    pub side_lane_row: u32,

    /// Offset to the left of the current left edge at which the side lane search starts.
    pub side_lane_offset_px: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LaneParams {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            scan_row: 445,
            fallback_row: 450,
            lane_width_px: 130,
            min_gap_px: 10,
            narrow_gap_px: 100,
            max_gap_px: 600,
            collapsed_pair: (220, 380),
            wide_pair: (350, 520),
            side_lane_row: 200,
            side_lane_offset_px: 50,
        }
    }
}
