//! # Maneuver manager
//!
//! The maneuver manager is the state machine driving the vehicle around the track. Its states are
//! described as data in a [`MnvrTable`], so a state can be tested without any image processing and
//! new maneuvers are added by adding entries to the table.
//!
//! Each cycle is processed in the following order:
//!
//! 1. The tally of the current state updates the counters.
//! 2. The transitions of the current state are checked, the first one whose guard holds is
//!    taken. Only one transition can happen per cycle.
//! 3. The edge effects of the transition are applied and the lane position is computed.
//! 4. The command override of the state the cycle started in is evaluated.
//! 5. The transition is committed: the entry time is set, the counters are reset and the last
//!    center effects are applied. Without a transition the dwell counter is incremented.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod guard;
mod params;
pub mod table;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    convert::TryFrom,
    fmt::{self, Display},
};

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub use self::{
    guard::{CueDetector, Guard},
    params::MnvrParams,
    table::{CmdOverride, Effect, MnvrTable, StateSpec},
    tm::MnvrTm,
};
use self::guard::{CueCache, GuardCtx};
use crate::{lane::LanePosition, sensor_hub::FusedSensors};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Maneuver manager
pub struct MnvrMgr {
    table: MnvrTable,

    state: MnvrState,

    /// Session time at which the current state was entered.
    state_entry_time_s: f64,

    counters: Counters,

    /// Origin of the next lane scan.
    last_center: i32,
}

/// Counters local to a state, reset on every transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Number of cycles completed in the state.
    pub dwell: u32,

    /// Ranging contacts tallied in the state.
    pub contacts: u32,

    /// Clear ultrasonic readings tallied in the state.
    pub clear_count: u32,
}

/// Inputs to one step of the manager.
pub struct MnvrCtx<'a> {
    /// Current session time.
    pub now_s: f64,

    /// Corrected lane edges from this cycle's scan.
    pub edges: (i32, i32),

    /// Edge of the side lane, if one was found.
    pub side_lane_x: Option<i32>,

    pub fused: &'a FusedSensors,

    pub cues: &'a mut dyn CueDetector,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MnvrOutput {
    /// Lane position after the effects of any transition.
    pub lane: LanePosition,

    /// Override of the base command for this cycle.
    pub cmd: CmdOverride,

    /// The transition taken this cycle, if any.
    pub transition: Option<(MnvrState, MnvrState)>,

    pub tm: MnvrTm,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// States of the maneuver manager, the codes are shared with external tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MnvrState {
    None,
    Inserting,
    Inserted,
    LaneFollow,
    SignalWait,
    SignalManeuver,
    SignalRecover,
    Hold,
    BumpWatch,
    BumpClear,
    ReverseApproach,
    ReverseExit,
    ParallelWatch,
    ParallelManeuver,
    Parked,
}

#[derive(Debug, thiserror::Error)]
pub enum MnvrMgrError {
    #[error("Unknown maneuver state code {0}")]
    UnknownStateCode(i32),

    #[error("The maneuver table has no entry for the {0} state")]
    MissingState(MnvrState),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MnvrState {
    pub const ALL: [MnvrState; 15] = [
        MnvrState::None,
        MnvrState::Inserting,
        MnvrState::Inserted,
        MnvrState::LaneFollow,
        MnvrState::SignalWait,
        MnvrState::SignalManeuver,
        MnvrState::SignalRecover,
        MnvrState::Hold,
        MnvrState::BumpWatch,
        MnvrState::BumpClear,
        MnvrState::ReverseApproach,
        MnvrState::ReverseExit,
        MnvrState::ParallelWatch,
        MnvrState::ParallelManeuver,
        MnvrState::Parked,
    ];

    pub fn code(&self) -> i32 {
        match self {
            MnvrState::None => -1,
            MnvrState::Inserting => 0,
            MnvrState::Inserted => 1,
            MnvrState::LaneFollow => 2,
            MnvrState::SignalWait => 4,
            MnvrState::SignalManeuver => 5,
            MnvrState::SignalRecover => 6,
            MnvrState::Hold => 7,
            MnvrState::BumpWatch => 8,
            MnvrState::BumpClear => 9,
            MnvrState::ReverseApproach => 10,
            MnvrState::ReverseExit => 11,
            MnvrState::ParallelWatch => 15,
            MnvrState::ParallelManeuver => 16,
            MnvrState::Parked => 17,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            MnvrState::None => "NONE",
            MnvrState::Inserting => "INSERTING",
            MnvrState::Inserted => "INSERTED",
            MnvrState::LaneFollow => "LANE_FOLLOW",
            MnvrState::SignalWait => "SIGNAL_WAIT",
            MnvrState::SignalManeuver => "SIGNAL_MANEUVER",
            MnvrState::SignalRecover => "SIGNAL_RECOVER",
            MnvrState::Hold => "HOLD",
            MnvrState::BumpWatch => "BUMP_WATCH",
            MnvrState::BumpClear => "BUMP_CLEAR",
            MnvrState::ReverseApproach => "REVERSE_APPROACH",
            MnvrState::ReverseExit => "REVERSE_EXIT",
            MnvrState::ParallelWatch => "PARALLEL_WATCH",
            MnvrState::ParallelManeuver => "PARALLEL_MANEUVER",
            MnvrState::Parked => "PARKED",
        }
    }
}

impl TryFrom<i32> for MnvrState {
    type Error = MnvrMgrError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        MnvrState::ALL
            .iter()
            .find(|s| s.code() == code)
            .copied()
            .ok_or(MnvrMgrError::UnknownStateCode(code))
    }
}

impl Display for MnvrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

impl MnvrMgr {
    /// Create a manager running the track maneuvers.
    pub fn new(params: &MnvrParams, initial: MnvrState, now_s: f64) -> Result<Self, MnvrMgrError> {
        Self::with_table(MnvrTable::track(params), initial, now_s)
    }

    /// Create a manager running a custom table.
    pub fn with_table(
        table: MnvrTable,
        initial: MnvrState,
        now_s: f64,
    ) -> Result<Self, MnvrMgrError> {
        if table.get(initial).is_none() {
            return Err(MnvrMgrError::MissingState(initial));
        }
        if let Some(s) = table.find_missing() {
            return Err(MnvrMgrError::MissingState(s));
        }

        Ok(Self {
            table,
            state: initial,
            state_entry_time_s: now_s,
            counters: Counters::default(),
            last_center: LanePosition::default().last_center,
        })
    }

    pub fn state(&self) -> MnvrState {
        self.state
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Origin of the next lane scan.
    pub fn last_center(&self) -> i32 {
        self.last_center
    }

    pub fn time_in_state(&self, now_s: f64) -> f64 {
        (now_s - self.state_entry_time_s).max(0.0)
    }

    /// Step the manager by one cycle.
    pub fn step(&mut self, ctx: MnvrCtx) -> Result<MnvrOutput, MnvrMgrError> {
        let spec = self
            .table
            .get(self.state)
            .ok_or(MnvrMgrError::MissingState(self.state))?;

        let time_in_state_s = self.time_in_state(ctx.now_s);

        if let Some(ref tally) = spec.tally {
            tally.apply(&mut self.counters, ctx.fused);
        }

        let mut cues = CueCache::new(ctx.cues);
        let mut guard_ctx = GuardCtx {
            time_in_state_s,
            counters: &self.counters,
            left_x: ctx.edges.0,
            side_lane_x: ctx.side_lane_x,
            fused: ctx.fused,
            cues: &mut cues,
        };

        let fired = spec
            .transitions
            .iter()
            .find(|t| t.guard.eval(&mut guard_ctx));

        let (mut left_x, mut right_x) = ctx.edges;

        if let Some(t) = fired {
            for effect in t.effects.iter() {
                match effect {
                    Effect::AdoptSideLane => match ctx.side_lane_x {
                        Some(side_x) => {
                            right_x = left_x;
                            left_x = side_x;
                        }
                        None => warn!("No side lane to adopt on transition to {}", t.next),
                    },
                    Effect::SetEdges(l, r) => {
                        left_x = *l;
                        right_x = *r;
                    }
                    Effect::SetLastCenter(_) => (),
                }
            }
        }

        let mut lane = LanePosition::from_edges(left_x, right_x);

        let cmd = spec.command(&mut guard_ctx);

        let prev_state = self.state;
        let transition = match fired {
            Some(t) => {
                for effect in t.effects.iter() {
                    if let Effect::SetLastCenter(c) = effect {
                        lane.last_center = *c;
                    }
                }

                info!(
                    "MnvrMgr: {} -> {} after {:.2} s",
                    prev_state, t.next, time_in_state_s
                );

                self.state = t.next;
                self.state_entry_time_s = ctx.now_s;
                self.counters = Counters::default();

                Some((prev_state, t.next))
            }
            None => {
                self.counters.dwell += 1;
                None
            }
        };

        self.last_center = lane.last_center;

        Ok(MnvrOutput {
            lane,
            cmd,
            transition,
            tm: MnvrTm {
                state: self.state.code(),
                prev_state: prev_state.code(),
                time_in_state_s: self.time_in_state(ctx.now_s),
                dwell: self.counters.dwell,
                contacts: self.counters.contacts,
                clear_count: self.counters.clear_count,
            },
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::range::LandmarkDetection;

    #[derive(Debug, Clone, Copy, Default)]
    struct Cues {
        signal: bool,
        stop_line: bool,
        bump: bool,
    }

    impl CueDetector for Cues {
        fn signal(&mut self) -> bool {
            self.signal
        }

        fn stop_line(&mut self) -> bool {
            self.stop_line
        }

        fn bump(&mut self) -> bool {
            self.bump
        }
    }

    fn mgr(initial: MnvrState) -> MnvrMgr {
        MnvrMgr::new(&MnvrParams::default(), initial, 0.0).unwrap()
    }

    fn step(mgr: &mut MnvrMgr, now_s: f64, fused: &FusedSensors, cues: Cues) -> MnvrOutput {
        step_with(mgr, now_s, (250, 380), None, fused, cues)
    }

    fn step_with(
        mgr: &mut MnvrMgr,
        now_s: f64,
        edges: (i32, i32),
        side_lane_x: Option<i32>,
        fused: &FusedSensors,
        mut cues: Cues,
    ) -> MnvrOutput {
        mgr.step(MnvrCtx {
            now_s,
            edges,
            side_lane_x,
            fused,
            cues: &mut cues,
        })
        .unwrap()
    }

    fn landmark(id: i32, distance_m: f64) -> FusedSensors {
        FusedSensors {
            landmark: Some(LandmarkDetection { id, distance_m }),
            ..Default::default()
        }
    }

    fn ultrasonic(dist: [i32; 8]) -> FusedSensors {
        FusedSensors {
            ultrasonic: Some(dist),
            ..Default::default()
        }
    }

    #[test]
    fn test_state_codes() {
        for s in MnvrState::ALL.iter() {
            assert_eq!(MnvrState::try_from(s.code()).unwrap(), *s);
        }
        assert!(MnvrState::try_from(3).is_err());
        assert_eq!(format!("{}", MnvrState::SignalWait), "SIGNAL_WAIT(4)");
        assert_eq!(MnvrState::None.code(), -1);
        assert_eq!(MnvrState::Parked.code(), 17);
    }

    #[test]
    fn test_signal_maneuver_phases() {
        let fused = landmark(0, 0.5);
        let mut m = mgr(MnvrState::SignalManeuver);

        let expected = [
            (1.0, CmdOverride::both(50, 15)),
            (2.45, CmdOverride::both(0, 0)),
            (3.0, CmdOverride::both(0, 0)),
            (4.0, CmdOverride::both(-50, -20)),
            (6.0, CmdOverride::both(50, -20)),
            // Landmark still close, keep reversing straight
            (7.0, CmdOverride::both(0, -20)),
        ];

        for (t, cmd) in expected.iter() {
            let out = step(&mut m, *t, &fused, Cues::default());
            assert_eq!(out.cmd, *cmd, "t = {}", t);
            assert_eq!(out.transition, None);
        }

        // Landmark moves away, recovery starts and its timer is set
        let out = step(&mut m, 7.5, &landmark(0, 0.9), Cues::default());
        assert_eq!(
            out.transition,
            Some((MnvrState::SignalManeuver, MnvrState::SignalRecover))
        );
        assert_eq!(out.tm.time_in_state_s, 0.0);
    }

    #[test]
    fn test_signal_maneuver_reference_times() {
        // The phases are evaluated for the time since entry, whatever the clock origin
        let mut m = MnvrMgr::new(&MnvrParams::default(), MnvrState::SignalManeuver, 100.0)
            .unwrap();
        let fused = FusedSensors::default();

        let out = step(&mut m, 101.0, &fused, Cues::default());
        assert_eq!(out.cmd, CmdOverride::both(50, 15));

        let out = step(&mut m, 103.0, &fused, Cues::default());
        assert_eq!(out.cmd, CmdOverride::both(-50, -20));
    }

    #[test]
    fn test_signal_sequence() {
        let mut m = mgr(MnvrState::LaneFollow);
        let none = FusedSensors::default();

        // Stop line without a signal stops the vehicle
        let stop_line = Cues {
            stop_line: true,
            ..Default::default()
        };
        let out = step(&mut m, 0.5, &none, stop_line);
        assert_eq!(out.cmd, CmdOverride::both(0, 0));
        assert_eq!(m.state(), MnvrState::LaneFollow);

        // A signal with a close landmark only moves one state on
        let signal = Cues {
            signal: true,
            stop_line: true,
            ..Default::default()
        };
        let out = step(&mut m, 1.0, &landmark(0, 0.3), signal);
        assert_eq!(out.cmd, CmdOverride::default());
        assert_eq!(
            out.transition,
            Some((MnvrState::LaneFollow, MnvrState::SignalWait))
        );

        // Wrong landmark, or too far away
        step(&mut m, 1.1, &landmark(1, 0.3), Cues::default());
        step(&mut m, 1.2, &landmark(0, 0.7), Cues::default());
        assert_eq!(m.state(), MnvrState::SignalWait);

        let out = step(&mut m, 1.3, &landmark(0, 0.3), Cues::default());
        assert_eq!(out.cmd, CmdOverride::default());
        assert_eq!(m.state(), MnvrState::SignalManeuver);

        // Through the maneuver into recovery
        step(&mut m, 8.1, &landmark(0, 1.0), Cues::default());
        assert_eq!(m.state(), MnvrState::SignalRecover);

        let recover = [
            (9.1, CmdOverride::both(0, 0)),
            (11.5, CmdOverride::both(-20, 15)),
            (12.1, CmdOverride::both(0, 0)),
            (13.0, CmdOverride::both(-40, 15)),
        ];
        for (t, cmd) in recover.iter() {
            let out = step(&mut m, *t, &none, Cues::default());
            assert_eq!(out.cmd, *cmd, "t = {}", t);
        }

        // Leaving the recovery resets the scan origin
        let out = step(&mut m, 16.2, &none, Cues::default());
        assert_eq!(out.transition, Some((MnvrState::SignalRecover, MnvrState::Hold)));
        assert_eq!(out.lane.center, 315);
        assert_eq!(out.lane.last_center, 200);
        assert_eq!(m.last_center(), 200);

        step(&mut m, 76.0, &none, Cues::default());
        assert_eq!(m.state(), MnvrState::Hold);
        step(&mut m, 76.3, &none, Cues::default());
        assert_eq!(m.state(), MnvrState::BumpWatch);
    }

    #[test]
    fn test_bump_and_reverse() {
        let mut m = mgr(MnvrState::BumpWatch);
        let bump = Cues {
            bump: true,
            ..Default::default()
        };

        step(&mut m, 0.1, &FusedSensors::default(), Cues::default());
        assert_eq!(m.state(), MnvrState::BumpWatch);
        step(&mut m, 0.2, &FusedSensors::default(), bump);
        assert_eq!(m.state(), MnvrState::BumpClear);

        let far = FusedSensors {
            front_clearance_m: Some(3.0),
            ..Default::default()
        };
        let out = step(&mut m, 0.3, &far, Cues::default());
        assert_eq!(out.cmd, CmdOverride::both(-2, 20));

        let near = FusedSensors {
            front_clearance_m: Some(2.0),
            right_sector_m: vec![0.3, 0.4, 0.6, 0.2],
            ..Default::default()
        };
        step(&mut m, 1.0, &near, Cues::default());
        assert_eq!(m.state(), MnvrState::ReverseApproach);

        // Three contacts per cycle
        let out = step(&mut m, 1.1, &near, Cues::default());
        assert_eq!(out.cmd, CmdOverride::both(-2, 0));
        assert_eq!(out.tm.contacts, 3);
        for _ in 0..3 {
            step(&mut m, 1.5, &near, Cues::default());
        }
        assert_eq!(m.counters().contacts, 12);

        // Enough contacts, but not long enough in the state
        assert_eq!(m.state(), MnvrState::ReverseApproach);

        let out = step(&mut m, 3.1, &near, Cues::default());
        assert_eq!(
            out.transition,
            Some((MnvrState::ReverseApproach, MnvrState::ReverseExit))
        );
        assert_eq!(out.lane.last_center, 300);

        let out = step(&mut m, 4.0, &near, Cues::default());
        assert_eq!(out.cmd, CmdOverride::both(20, 15));
        let out = step(&mut m, 6.2, &near, Cues::default());
        assert_eq!(out.cmd, CmdOverride::speed(15));
    }

    #[test]
    fn test_insertion() {
        let mut m = mgr(MnvrState::Inserting);
        let none = FusedSensors::default();

        // A matching side lane is ignored until the minimum dwell has passed
        for i in 0..11 {
            let out = step_with(&mut m, 0.1 * i as f64, (200, 330), Some(80), &none, Cues::default());
            assert_eq!(out.transition, None);
        }
        assert_eq!(m.counters().dwell, 11);

        // Side lane too close
        step_with(&mut m, 1.2, (200, 330), Some(100), &none, Cues::default());
        assert_eq!(m.state(), MnvrState::Inserting);

        let out = step_with(&mut m, 1.3, (200, 330), Some(80), &none, Cues::default());
        assert_eq!(
            out.transition,
            Some((MnvrState::Inserting, MnvrState::Inserted))
        );
        assert_eq!((out.lane.left_x, out.lane.right_x), (80, 200));
        assert_eq!(out.lane.last_center, 140);
        assert_eq!(m.counters().dwell, 0);
    }

    #[test]
    fn test_inserted_ultrasonic_reverts() {
        let mut m = mgr(MnvrState::Inserted);
        let close = ultrasonic([100, 100, 100, 100, 35, 50, 100, 100]);

        // Close readings before the minimum dwell are ignored
        for i in 0..11 {
            step(&mut m, 0.1 * i as f64, &close, Cues::default());
        }
        assert_eq!(m.state(), MnvrState::Inserted);

        let out = step(&mut m, 1.2, &close, Cues::default());
        assert_eq!(
            out.transition,
            Some((MnvrState::Inserted, MnvrState::Inserting))
        );
        assert_eq!((out.lane.left_x, out.lane.right_x), (300, 400));
        assert_eq!(out.tm.dwell, 0);
        assert_eq!(m.counters().dwell, 0);
    }

    #[test]
    fn test_inserted_timeout() {
        let mut m = mgr(MnvrState::Inserted);

        // No ultrasonic data at all, the timeout still applies
        step(&mut m, 15.0, &FusedSensors::default(), Cues::default());
        assert_eq!(m.state(), MnvrState::Inserted);
        step(&mut m, 15.1, &FusedSensors::default(), Cues::default());
        assert_eq!(m.state(), MnvrState::LaneFollow);
    }

    #[test]
    fn test_parallel_parking() {
        let mut m = mgr(MnvrState::ParallelWatch);

        let readings = [60, 60, 30, 60, 10, 60, 60, 60];
        for r in readings.iter() {
            step(&mut m, 0.5, &ultrasonic([*r, 0, 0, 0, 0, 0, 0, 0]), Cues::default());
            assert_eq!(m.state(), MnvrState::ParallelWatch);
        }
        assert_eq!(m.counters().clear_count, 4);

        // Silent sensor leaves the count alone
        step(&mut m, 0.6, &FusedSensors::default(), Cues::default());
        assert_eq!(m.counters().clear_count, 4);

        step(&mut m, 1.0, &ultrasonic([60, 0, 0, 0, 0, 0, 0, 0]), Cues::default());
        assert_eq!(m.state(), MnvrState::ParallelManeuver);

        let expected = [
            (2.0, CmdOverride::both(0, 15)),
            (5.0, CmdOverride::both(50, -20)),
            (6.5, CmdOverride::both(0, -20)),
            (8.0, CmdOverride::both(-50, -20)),
        ];
        for (t, cmd) in expected.iter() {
            let out = step(&mut m, *t, &FusedSensors::default(), Cues::default());
            assert_eq!(out.cmd, *cmd, "t = {}", t);
        }

        step(&mut m, 8.5, &FusedSensors::default(), Cues::default());
        assert_eq!(m.state(), MnvrState::Parked);
        let out = step(&mut m, 100.0, &FusedSensors::default(), Cues::default());
        assert_eq!(out.cmd, CmdOverride::both(0, 0));
        assert_eq!(m.state(), MnvrState::Parked);
    }

    #[test]
    fn test_timings_from_params() {
        let params = MnvrParams {
            signal_recover_turn_s: (1.0, 2.0),
            signal_recover_s: 3.0,
            parallel_phase_ends_s: [1.0, 2.0, 3.0, 4.0],
            ..Default::default()
        };
        let none = FusedSensors::default();

        let mut m = MnvrMgr::new(&params, MnvrState::SignalRecover, 0.0).unwrap();
        let recover = [
            (0.5, CmdOverride::both(0, 0)),
            (1.5, CmdOverride::both(-20, 15)),
            (2.5, CmdOverride::both(-40, 15)),
        ];
        for (t, cmd) in recover.iter() {
            assert_eq!(step(&mut m, *t, &none, Cues::default()).cmd, *cmd, "t = {}", t);
        }
        step(&mut m, 3.5, &none, Cues::default());
        assert_eq!(m.state(), MnvrState::Hold);

        let mut m = MnvrMgr::new(&params, MnvrState::ParallelManeuver, 0.0).unwrap();
        let parking = [
            (0.5, CmdOverride::both(0, 15)),
            (1.5, CmdOverride::both(50, -20)),
            (2.5, CmdOverride::both(0, -20)),
            (3.5, CmdOverride::both(-50, -20)),
        ];
        for (t, cmd) in parking.iter() {
            assert_eq!(step(&mut m, *t, &none, Cues::default()).cmd, *cmd, "t = {}", t);
        }
        step(&mut m, 4.0, &none, Cues::default());
        assert_eq!(m.state(), MnvrState::Parked);
    }

    #[test]
    fn test_exit_cycle_commands() {
        // The cycle leaving a timed maneuver is past its last window, so it commands the
        // fallback of that maneuver rather than the lane following command
        let mut m = mgr(MnvrState::SignalManeuver);
        let out = step(&mut m, 7.0, &landmark(0, 0.9), Cues::default());
        assert_eq!(
            out.transition,
            Some((MnvrState::SignalManeuver, MnvrState::SignalRecover))
        );
        assert_eq!(out.cmd, CmdOverride::both(0, -20));

        let mut m = mgr(MnvrState::ParallelManeuver);
        let out = step(&mut m, 7.5, &FusedSensors::default(), Cues::default());
        assert_eq!(
            out.transition,
            Some((MnvrState::ParallelManeuver, MnvrState::Parked))
        );
        assert_eq!(out.cmd, CmdOverride::both(0, 0));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let inputs: Vec<(f64, FusedSensors, Cues)> = (0..400)
            .map(|i| {
                let t = i as f64 * 0.1;
                let fused = FusedSensors {
                    front_clearance_m: Some(3.0 - t * 0.05),
                    right_sector_m: vec![0.3; (i % 3) as usize],
                    landmark: Some(LandmarkDetection {
                        id: 0,
                        distance_m: (t - 2.0).abs() * 0.2,
                    }),
                    ..Default::default()
                };
                let cues = Cues {
                    signal: i == 5,
                    stop_line: i % 7 == 0,
                    bump: i % 50 == 0,
                };
                (t, fused, cues)
            })
            .collect();

        let run = || {
            let mut m = mgr(MnvrState::LaneFollow);
            inputs
                .iter()
                .map(|(t, f, c)| step(&mut m, *t, f, *c))
                .collect::<Vec<_>>()
        };

        let first = run();
        assert_eq!(first, run());
        assert!(first.iter().any(|o| o.transition.is_some()));
    }

    #[test]
    fn test_missing_state() {
        let mut table = MnvrTable::default();
        table.insert(
            MnvrState::LaneFollow,
            StateSpec {
                transitions: vec![table::Transition::to(Guard::Signal, MnvrState::SignalWait)],
                ..Default::default()
            },
        );

        assert!(matches!(
            MnvrMgr::with_table(table.clone(), MnvrState::Parked, 0.0),
            Err(MnvrMgrError::MissingState(MnvrState::Parked))
        ));
        assert!(matches!(
            MnvrMgr::with_table(table, MnvrState::LaneFollow, 0.0),
            Err(MnvrMgrError::MissingState(MnvrState::SignalWait))
        ));
    }
}
