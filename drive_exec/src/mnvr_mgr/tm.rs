//! # Maneuver manager telemetry

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Serialize;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Summary of the maneuver manager at the end of a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MnvrTm {
    /// Code of the current state.
    pub state: i32,

    /// Code of the state the cycle started in.
    pub prev_state: i32,

    pub time_in_state_s: f64,
    pub dwell: u32,
    pub contacts: u32,
    pub clear_count: u32,
}
