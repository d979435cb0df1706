//! # Maneuver table
//!
//! Each state of the maneuver manager is described by a [`StateSpec`]. The command a state
//! produces is found from its timed phases (or its fallback if no phase is active), adjusted by
//! any reactions whose guards hold. The first transition whose guard holds is taken.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use serde::Serialize;

use super::{
    guard::{Guard, GuardCtx},
    Counters, MnvrParams, MnvrState,
};
use crate::sensor_hub::{fusion, FusedSensors};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The full set of states.
#[derive(Debug, Clone, Default)]
pub struct MnvrTable {
    specs: HashMap<MnvrState, StateSpec>,
}

/// Behaviour of one state.
#[derive(Debug, Clone, Default)]
pub struct StateSpec {
    /// Override used when no phase is active.
    pub fallback: CmdOverride,

    /// Timed phases, the first active one is used.
    pub phases: Vec<Phase>,

    /// Overrides applied on top of the phase or fallback when their guard holds.
    pub reactions: Vec<Reaction>,

    /// Counter updated at the start of every cycle spent in the state.
    pub tally: Option<Tally>,

    /// Transitions out of the state, in priority order.
    pub transitions: Vec<Transition>,
}

/// Override of the base command, `None` fields keep the base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CmdOverride {
    pub steer: Option<i32>,
    pub speed: Option<i32>,
}

/// A time window in a state.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub start_s: f64,

    /// Whether a time equal to `start_s` is within the phase. The end is always excluded.
    pub start_inclusive: bool,

    pub end_s: f64,

    pub cmd: CmdOverride,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub guard: Guard,
    pub cmd: CmdOverride,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub guard: Guard,
    pub next: MnvrState,
    pub effects: Vec<Effect>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Side effects of a transition on the lane position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The side lane becomes the lane: the left edge moves to the right and the side lane edge
    /// becomes the left edge.
    AdoptSideLane,

    /// Replace the edges before the center is computed.
    SetEdges(i32, i32),

    /// Replace the origin of the next scan, after the command has been computed.
    SetLastCenter(i32),
}

/// Per-cycle accumulation into the state counters.
#[derive(Debug, Clone, PartialEq)]
pub enum Tally {
    /// Count right sector samples strictly between zero and `below_m`.
    RightSectorContacts { below_m: f64 },

    /// Count consecutive clear readings of an ultrasonic channel. Readings above `clear_above`
    /// increment the count, readings above `reset_above` (but not clear) reset it, lower readings
    /// leave it unchanged.
    UltrasonicClear {
        channel: usize,
        clear_above: i32,
        reset_above: i32,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MnvrTable {
    /// Build the table of track maneuvers.
    pub fn track(params: &MnvrParams) -> Self {
        use MnvrState as S;

        let p = params;
        let t = p.signal_mnvr_t_s;
        let stop = CmdOverride::both(0, 0);

        let mut table = Self::default();

        table.insert(S::None, StateSpec::default());

        table.insert(
            S::Inserting,
            StateSpec {
                transitions: vec![Transition::new(
                    Guard::All(vec![
                        Guard::DwellAbove(p.insert_min_dwell),
                        Guard::SideLaneMatch {
                            min_gap: p.side_lane_gap_px.0,
                            max_gap: p.side_lane_gap_px.1,
                        },
                    ]),
                    S::Inserted,
                    vec![Effect::AdoptSideLane],
                )],
                ..Default::default()
            },
        );

        table.insert(
            S::Inserted,
            StateSpec {
                transitions: vec![
                    Transition::to(Guard::TimeInStateAbove(p.inserted_timeout_s), S::LaneFollow),
                    Transition::new(
                        Guard::All(vec![
                            Guard::UltrasonicBelow {
                                channels: p.inserted_us_channels.clone(),
                                below: p.inserted_us_below,
                            },
                            Guard::DwellAbove(p.insert_min_dwell),
                        ]),
                        S::Inserting,
                        vec![Effect::SetEdges(
                            p.inserted_revert_edges.0,
                            p.inserted_revert_edges.1,
                        )],
                    ),
                ],
                ..Default::default()
            },
        );

        table.insert(
            S::LaneFollow,
            StateSpec {
                reactions: vec![Reaction {
                    guard: Guard::All(vec![
                        Guard::Not(Box::new(Guard::Signal)),
                        Guard::StopLine,
                    ]),
                    cmd: stop,
                }],
                transitions: vec![Transition::to(Guard::Signal, S::SignalWait)],
                ..Default::default()
            },
        );

        table.insert(
            S::SignalWait,
            StateSpec {
                transitions: vec![Transition::to(
                    Guard::Landmark {
                        id: p.signal_landmark_id,
                        closer_than_m: p.signal_landmark_dist_m,
                    },
                    S::SignalManeuver,
                )],
                ..Default::default()
            },
        );

        let signal_end_s = 2.3 * t + 1.0;
        table.insert(
            S::SignalManeuver,
            StateSpec {
                fallback: CmdOverride::both(0, -20),
                phases: vec![
                    Phase::window(0.0, t - 0.1, CmdOverride::both(50, 15)),
                    Phase::window(t - 0.1, t + 1.0, stop),
                    Phase::window(t + 1.0, 1.8 * t + 1.0, CmdOverride::both(-50, -20)),
                    Phase::window(1.8 * t + 1.0, signal_end_s, CmdOverride::both(50, -20)),
                ],
                transitions: vec![Transition::to(
                    Guard::All(vec![
                        Guard::TimeInStateAtLeast(signal_end_s),
                        Guard::LandmarkFartherThan(p.signal_clear_dist_m),
                    ]),
                    S::SignalRecover,
                )],
                ..Default::default()
            },
        );

        table.insert(
            S::SignalRecover,
            StateSpec {
                fallback: stop,
                phases: vec![
                    Phase::open(
                        p.signal_recover_turn_s.0,
                        p.signal_recover_turn_s.1,
                        CmdOverride::both(-20, 15),
                    ),
                    Phase::open(
                        p.signal_recover_turn_s.1,
                        p.signal_recover_s,
                        CmdOverride::both(-40, 15),
                    ),
                ],
                transitions: vec![Transition::new(
                    Guard::TimeInStateAbove(p.signal_recover_s),
                    S::Hold,
                    vec![Effect::SetLastCenter(p.signal_recover_center)],
                )],
                ..Default::default()
            },
        );

        table.insert(
            S::Hold,
            StateSpec {
                transitions: vec![Transition::to(
                    Guard::TimeInStateAbove(p.hold_s),
                    S::BumpWatch,
                )],
                ..Default::default()
            },
        );

        table.insert(
            S::BumpWatch,
            StateSpec {
                transitions: vec![Transition::to(Guard::Bump, S::BumpClear)],
                ..Default::default()
            },
        );

        table.insert(
            S::BumpClear,
            StateSpec {
                fallback: CmdOverride::both(-2, 20),
                transitions: vec![Transition::to(
                    Guard::FrontClearanceBelow(p.bump_clear_front_m),
                    S::ReverseApproach,
                )],
                ..Default::default()
            },
        );

        table.insert(
            S::ReverseApproach,
            StateSpec {
                fallback: CmdOverride::both(-2, 0),
                tally: Some(Tally::RightSectorContacts {
                    below_m: p.reverse_contact_below_m,
                }),
                transitions: vec![Transition::new(
                    Guard::All(vec![
                        Guard::ContactsAbove(p.reverse_min_contacts),
                        Guard::TimeInStateAbove(p.reverse_min_s),
                    ]),
                    S::ReverseExit,
                    vec![Effect::SetLastCenter(p.reverse_exit_center)],
                )],
                ..Default::default()
            },
        );

        table.insert(
            S::ReverseExit,
            StateSpec {
                fallback: CmdOverride::speed(15),
                phases: vec![Phase::window(
                    0.0,
                    p.reverse_exit_turn_s,
                    CmdOverride::both(20, 15),
                )],
                ..Default::default()
            },
        );

        table.insert(
            S::ParallelWatch,
            StateSpec {
                tally: Some(Tally::UltrasonicClear {
                    channel: p.parallel_us_channel,
                    clear_above: p.parallel_clear_above,
                    reset_above: p.parallel_reset_above,
                }),
                transitions: vec![Transition::to(
                    Guard::ClearCountAbove(p.parallel_min_clear),
                    S::ParallelManeuver,
                )],
                ..Default::default()
            },
        );

        let [forward_s, turn_in_s, straight_s, parked_s] = p.parallel_phase_ends_s;
        table.insert(
            S::ParallelManeuver,
            StateSpec {
                fallback: stop,
                phases: vec![
                    Phase::window(0.0, forward_s, CmdOverride::both(0, 15)),
                    Phase::window(forward_s, turn_in_s, CmdOverride::both(50, -20)),
                    Phase::window(turn_in_s, straight_s, CmdOverride::both(0, -20)),
                    Phase::window(straight_s, parked_s, CmdOverride::both(-50, -20)),
                ],
                transitions: vec![Transition::to(
                    Guard::TimeInStateAtLeast(parked_s),
                    S::Parked,
                )],
                ..Default::default()
            },
        );

        table.insert(
            S::Parked,
            StateSpec {
                fallback: stop,
                ..Default::default()
            },
        );

        table
    }

    /// Add or replace the spec of a state.
    pub fn insert(&mut self, state: MnvrState, spec: StateSpec) {
        self.specs.insert(state, spec);
    }

    pub fn get(&self, state: MnvrState) -> Option<&StateSpec> {
        self.specs.get(&state)
    }

    /// Return the first state which is the target of a transition but has no spec.
    pub fn find_missing(&self) -> Option<MnvrState> {
        self.specs
            .values()
            .flat_map(|s| s.transitions.iter())
            .map(|t| t.next)
            .find(|n| !self.specs.contains_key(n))
    }
}

impl StateSpec {
    /// The override this state applies at the given time in state.
    pub fn command(&self, ctx: &mut GuardCtx) -> CmdOverride {
        let t = ctx.time_in_state_s;

        let mut cmd = self
            .phases
            .iter()
            .find(|p| p.contains(t))
            .map(|p| p.cmd)
            .unwrap_or(self.fallback);

        for reaction in self.reactions.iter() {
            if reaction.guard.eval(ctx) {
                cmd = cmd.then(reaction.cmd);
            }
        }

        cmd
    }
}

impl CmdOverride {
    pub fn both(steer: i32, speed: i32) -> Self {
        Self {
            steer: Some(steer),
            speed: Some(speed),
        }
    }

    pub fn speed(speed: i32) -> Self {
        Self {
            steer: None,
            speed: Some(speed),
        }
    }

    /// Layer another override on top of this one.
    pub fn then(self, other: CmdOverride) -> Self {
        Self {
            steer: other.steer.or(self.steer),
            speed: other.speed.or(self.speed),
        }
    }
}

impl Phase {
    /// A phase covering `[start_s, end_s)`.
    pub fn window(start_s: f64, end_s: f64, cmd: CmdOverride) -> Self {
        Self {
            start_s,
            start_inclusive: true,
            end_s,
            cmd,
        }
    }

    /// A phase covering `(start_s, end_s)`.
    pub fn open(start_s: f64, end_s: f64, cmd: CmdOverride) -> Self {
        Self {
            start_s,
            start_inclusive: false,
            end_s,
            cmd,
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        let after_start = if self.start_inclusive {
            t >= self.start_s
        } else {
            t > self.start_s
        };

        after_start && t < self.end_s
    }
}

impl Transition {
    pub fn new(guard: Guard, next: MnvrState, effects: Vec<Effect>) -> Self {
        Self {
            guard,
            next,
            effects,
        }
    }

    /// A transition with no effects.
    pub fn to(guard: Guard, next: MnvrState) -> Self {
        Self::new(guard, next, Vec::new())
    }
}

impl Tally {
    pub fn apply(&self, counters: &mut Counters, fused: &FusedSensors) {
        match self {
            Tally::RightSectorContacts { below_m } => {
                counters.contacts += fused
                    .right_sector_m
                    .iter()
                    .filter(|r| fusion::is_valid(**r) && **r < *below_m)
                    .count() as u32;
            }
            Tally::UltrasonicClear {
                channel,
                clear_above,
                reset_above,
            } => {
                let reading = match fused.ultrasonic.as_ref().and_then(|us| us.get(*channel)) {
                    Some(r) => *r,
                    None => return,
                };

                if reading > *clear_above {
                    counters.clear_count += 1;
                } else if reading > *reset_above {
                    counters.clear_count = 0;
                }
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
