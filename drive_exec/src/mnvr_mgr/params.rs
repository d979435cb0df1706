//! # Maneuver manager parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::range::{US_REAR_RIGHT, US_SIDE_LEFT, US_SIDE_RIGHT};
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Thresholds and timings of the track maneuvers.
///
/// Times are in seconds since entry into the state, distances from the ranging sensor and the
/// landmark detector in meters, ultrasonic distances in the units of the array.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MnvrParams {
    /// Number of cycles which must be spent inserting before a side lane is accepted, and before
    /// the ultrasonic check is made once inserted.
    pub insert_min_dwell: u32,

    /// Bounds (exclusive) on the distance between the side lane and the current left edge.
    pub side_lane_gap_px: (i32, i32),

    /// Ultrasonic channels watched while inserted.
    pub inserted_us_channels: Vec<usize>,

    /// An inserted vehicle falls back to inserting if a watched channel reads below this.
    pub inserted_us_below: i32,

    /// Edges adopted when falling back to inserting.
    pub inserted_revert_edges: (i32, i32),

    /// Time after which an insertion is complete.
    pub inserted_timeout_s: f64,

    /// Landmark which triggers the signal maneuver.
    pub signal_landmark_id: i32,

    /// The signal maneuver starts when the landmark is closer than this.
    pub signal_landmark_dist_m: f64,

    /// Base duration of the signal maneuver phases.
    pub signal_mnvr_t_s: f64,

    /// The signal maneuver ends once the landmark is farther than this.
    pub signal_clear_dist_m: f64,

    /// Duration of the recovery after the signal maneuver.
    pub signal_recover_s: f64,

    /// Start of the gentle recovery turn, then of the sharp one which lasts until the end of the
    /// recovery.
    pub signal_recover_turn_s: (f64, f64),

    /// Scan origin adopted when the recovery ends.
    pub signal_recover_center: i32,

    /// Time spent holding before watching for a bump.
    pub hold_s: f64,

    /// Front clearance below which the vehicle starts its reverse approach.
    pub bump_clear_front_m: f64,

    /// Right sector samples closer than this count as contacts.
    pub reverse_contact_below_m: f64,

    /// Contacts needed before leaving the reverse approach.
    pub reverse_min_contacts: u32,

    /// Minimum time in the reverse approach.
    pub reverse_min_s: f64,

    /// Scan origin adopted when leaving the reverse approach.
    pub reverse_exit_center: i32,

    /// Time for which the exit turn is held.
    pub reverse_exit_turn_s: f64,

    /// Ultrasonic channel watched for a parking space.
    pub parallel_us_channel: usize,

    /// Readings above this count towards a clear space.
    pub parallel_clear_above: i32,

    /// Readings above this (but not clear) reset the count.
    pub parallel_reset_above: i32,

    /// Clear readings needed before parking.
    pub parallel_min_clear: u32,

    /// Ends of the parking phases: forward, reverse turning in, reverse straight, reverse
    /// counter-steering. The vehicle is parked at the end of the last one.
    pub parallel_phase_ends_s: [f64; 4],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for MnvrParams {
    fn default() -> Self {
        Self {
            insert_min_dwell: 10,
            side_lane_gap_px: (110, 130),
            inserted_us_channels: vec![US_SIDE_RIGHT, US_REAR_RIGHT],
            inserted_us_below: 40,
            inserted_revert_edges: (300, 400),
            inserted_timeout_s: 15.0,
            signal_landmark_id: 0,
            signal_landmark_dist_m: 0.6,
            signal_mnvr_t_s: 2.5,
            signal_clear_dist_m: 0.8,
            signal_recover_s: 8.0,
            signal_recover_turn_s: (3.0, 4.0),
            signal_recover_center: 200,
            hold_s: 60.0,
            bump_clear_front_m: 2.2,
            reverse_contact_below_m: 0.5,
            reverse_min_contacts: 10,
            reverse_min_s: 2.0,
            reverse_exit_center: 300,
            reverse_exit_turn_s: 3.0,
            parallel_us_channel: US_SIDE_LEFT,
            parallel_clear_above: 50,
            parallel_reset_above: 20,
            parallel_min_clear: 4,
            parallel_phase_ends_s: [3.5, 5.0, 6.0, 7.5],
        }
    }
}
