//! # Data Store

use comms_if::eqpt::act::DriveDems;

use crate::drive_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Session time at the start of the current cycle
    pub cycle_time_s: f64,

    /// Sequence number of the last camera frame which started a cycle
    pub last_frame_seq: u64,

    // DriveCtrl
    pub drive_ctrl: drive_ctrl::DriveCtrl,
    pub drive_ctrl_input: drive_ctrl::InputData,
    pub drive_ctrl_output: DriveDems,
    pub drive_ctrl_status_rpt: drive_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive waits for a camera frame which timed out
    pub num_consec_frame_timeouts: u64,

    /// Number of consecutive failures to publish the demands
    pub num_consec_act_send_errors: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle and samples the session
    /// clock.
    pub fn cycle_start(&mut self, now_s: f64) {
        self.cycle_time_s = now_s;

        self.drive_ctrl_input = drive_ctrl::InputData::default();
        self.drive_ctrl_output = DriveDems::neutral();
        self.drive_ctrl_status_rpt = drive_ctrl::StatusReport::default();
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cycle_start_clears() {
        let mut ds = DataStore::default();

        ds.drive_ctrl_output = DriveDems::new(10, 15);
        ds.drive_ctrl_input.now_s = 4.0;
        ds.drive_ctrl_status_rpt.malformed_frame = true;
        ds.num_consec_frame_timeouts = 3;

        ds.cycle_start(5.0);

        assert_eq!(ds.cycle_time_s, 5.0);
        assert!(ds.drive_ctrl_output.is_neutral());
        assert_eq!(ds.drive_ctrl_input.now_s, 0.0);
        assert!(!ds.drive_ctrl_status_rpt.malformed_frame);

        // Monitoring counters survive the cycle boundary
        assert_eq!(ds.num_consec_frame_timeouts, 3);

        ds.cycle_end();
        ds.cycle_end();
        assert_eq!(ds.num_cycles, 2);
    }
}
