//! # Transition guards
//!
//! Guards are plain data evaluated against a [`GuardCtx`]. Scene cues are only requested from the
//! detector when a guard actually needs them, and each cue is requested at most once per cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::sensor_hub::FusedSensors;

use super::Counters;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Detectors of scene cues in the undistorted camera frame.
pub trait CueDetector {
    /// A traffic signal is visible.
    fn signal(&mut self) -> bool;

    /// A stop line is visible.
    fn stop_line(&mut self) -> bool;

    /// A speed bump is visible.
    fn bump(&mut self) -> bool;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A condition on the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// Time in state is strictly greater than the value.
    TimeInStateAbove(f64),

    /// Time in state is greater than or equal to the value.
    TimeInStateAtLeast(f64),

    /// More than this many cycles have been spent in the state.
    DwellAbove(u32),

    /// Any of the given ultrasonic channels reads below the value. Never true without ultrasonic
    /// data.
    UltrasonicBelow { channels: Vec<usize>, below: i32 },

    /// A side lane edge was found, and its distance to the left edge is strictly between the
    /// bounds.
    SideLaneMatch { min_gap: i32, max_gap: i32 },

    Signal,
    StopLine,
    Bump,

    /// The given landmark is closer than the distance.
    Landmark { id: i32, closer_than_m: f64 },

    /// The current landmark is farther than the distance.
    LandmarkFartherThan(f64),

    /// The front clearance is below the distance.
    FrontClearanceBelow(f64),

    /// More than this many ranging contacts have been tallied.
    ContactsAbove(u32),

    /// More than this many clear ultrasonic readings have been tallied.
    ClearCountAbove(u32),

    Not(Box<Guard>),

    /// All guards hold, evaluated in order and stopping at the first which doesn't.
    All(Vec<Guard>),
}

#[derive(Debug, Clone, Copy)]
enum Cue {
    Signal = 0,
    StopLine = 1,
    Bump = 2,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Everything a guard may look at.
pub struct GuardCtx<'a, 'c> {
    pub time_in_state_s: f64,
    pub counters: &'a Counters,
    pub left_x: i32,
    pub side_lane_x: Option<i32>,
    pub fused: &'a FusedSensors,
    pub cues: &'a mut CueCache<'c>,
}

/// Memoises the results of a [`CueDetector`] for one cycle.
pub struct CueCache<'c> {
    detector: &'c mut dyn CueDetector,
    results: [Option<bool>; 3],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Guard {
    pub fn eval(&self, ctx: &mut GuardCtx) -> bool {
        match self {
            Guard::TimeInStateAbove(s) => ctx.time_in_state_s > *s,
            Guard::TimeInStateAtLeast(s) => ctx.time_in_state_s >= *s,
            Guard::DwellAbove(n) => ctx.counters.dwell > *n,
            Guard::UltrasonicBelow { channels, below } => match ctx.fused.ultrasonic {
                Some(us) => channels
                    .iter()
                    .filter_map(|c| us.get(*c))
                    .any(|d| d < below),
                None => false,
            },
            Guard::SideLaneMatch { min_gap, max_gap } => match ctx.side_lane_x {
                Some(x) => {
                    let gap = ctx.left_x - x;
                    gap > *min_gap && gap < *max_gap
                }
                None => false,
            },
            Guard::Signal => ctx.cues.get(Cue::Signal),
            Guard::StopLine => ctx.cues.get(Cue::StopLine),
            Guard::Bump => ctx.cues.get(Cue::Bump),
            Guard::Landmark { id, closer_than_m } => match ctx.fused.landmark {
                Some(l) => l.id == *id && l.distance_m < *closer_than_m,
                None => false,
            },
            Guard::LandmarkFartherThan(d) => match ctx.fused.landmark {
                Some(l) => l.distance_m > *d,
                None => false,
            },
            Guard::FrontClearanceBelow(d) => match ctx.fused.front_clearance_m {
                Some(f) => f < *d,
                None => false,
            },
            Guard::ContactsAbove(n) => ctx.counters.contacts > *n,
            Guard::ClearCountAbove(n) => ctx.counters.clear_count > *n,
            Guard::Not(g) => !g.eval(ctx),
            Guard::All(gs) => gs.iter().all(|g| g.eval(ctx)),
        }
    }
}

impl<'c> CueCache<'c> {
    pub fn new(detector: &'c mut dyn CueDetector) -> Self {
        Self {
            detector,
            results: [None; 3],
        }
    }

    fn get(&mut self, cue: Cue) -> bool {
        if let Some(r) = self.results[cue as usize] {
            return r;
        }

        let r = match cue {
            Cue::Signal => self.detector.signal(),
            Cue::StopLine => self.detector.stop_line(),
            Cue::Bump => self.detector.bump(),
        };
        self.results[cue as usize] = Some(r);

        r
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::range::LandmarkDetection;

    #[derive(Default)]
    struct CountingCues {
        signal: bool,
        calls: u32,
    }

    impl CueDetector for CountingCues {
        fn signal(&mut self) -> bool {
            self.calls += 1;
            self.signal
        }

        fn stop_line(&mut self) -> bool {
            self.calls += 1;
            true
        }

        fn bump(&mut self) -> bool {
            self.calls += 1;
            false
        }
    }

    fn eval(guard: &Guard, fused: &FusedSensors, cues: &mut CountingCues) -> bool {
        let counters = Counters {
            dwell: 11,
            contacts: 3,
            clear_count: 0,
        };
        let mut cache = CueCache::new(cues);
        let mut ctx = GuardCtx {
            time_in_state_s: 2.0,
            counters: &counters,
            left_x: 200,
            side_lane_x: Some(80),
            fused,
            cues: &mut cache,
        };

        guard.eval(&mut ctx)
    }

    #[test]
    fn test_missing_sensors_never_fire() {
        let fused = FusedSensors::default();
        let mut cues = CountingCues::default();

        for g in [
            Guard::UltrasonicBelow {
                channels: vec![4, 5],
                below: 40,
            },
            Guard::Landmark {
                id: 0,
                closer_than_m: 0.6,
            },
            Guard::LandmarkFartherThan(0.8),
            Guard::FrontClearanceBelow(2.2),
        ]
        .iter()
        {
            assert!(!eval(g, &fused, &mut cues), "{:?}", g);
        }
    }

    #[test]
    fn test_sensor_guards() {
        let fused = FusedSensors {
            front_clearance_m: Some(2.0),
            ultrasonic: Some([100, 0, 0, 0, 35, 50, 0, 0]),
            landmark: Some(LandmarkDetection {
                id: 0,
                distance_m: 0.5,
            }),
            ..Default::default()
        };
        let mut cues = CountingCues::default();

        let us = |channels: Vec<usize>| Guard::UltrasonicBelow {
            channels,
            below: 40,
        };
        assert!(eval(&us(vec![4, 5]), &fused, &mut cues));
        assert!(!eval(&us(vec![0, 5]), &fused, &mut cues));
        assert!(!eval(&us(vec![42]), &fused, &mut cues));

        let lm = |id| Guard::Landmark {
            id,
            closer_than_m: 0.6,
        };
        assert!(eval(&lm(0), &fused, &mut cues));
        assert!(!eval(&lm(1), &fused, &mut cues));
        assert!(!eval(&Guard::LandmarkFartherThan(0.8), &fused, &mut cues));
        assert!(eval(&Guard::FrontClearanceBelow(2.2), &fused, &mut cues));
        assert!(!eval(&Guard::FrontClearanceBelow(2.0), &fused, &mut cues));
    }

    #[test]
    fn test_counter_and_time_guards() {
        let fused = FusedSensors::default();
        let mut cues = CountingCues::default();

        assert!(eval(&Guard::DwellAbove(10), &fused, &mut cues));
        assert!(!eval(&Guard::DwellAbove(11), &fused, &mut cues));
        assert!(eval(&Guard::ContactsAbove(2), &fused, &mut cues));
        assert!(!eval(&Guard::ClearCountAbove(0), &fused, &mut cues));
        assert!(!eval(&Guard::TimeInStateAbove(2.0), &fused, &mut cues));
        assert!(eval(&Guard::TimeInStateAtLeast(2.0), &fused, &mut cues));

        let side = |min_gap, max_gap| Guard::SideLaneMatch { min_gap, max_gap };
        assert!(eval(&side(110, 130), &fused, &mut cues));
        assert!(!eval(&side(120, 130), &fused, &mut cues));
        assert!(!eval(&side(110, 120), &fused, &mut cues));
    }

    #[test]
    fn test_cues_are_lazy_and_cached() {
        let fused = FusedSensors::default();
        let mut cues = CountingCues::default();

        // The stop line is never looked at when the first guard fails
        let g = Guard::All(vec![Guard::DwellAbove(100), Guard::StopLine]);
        assert!(!eval(&g, &fused, &mut cues));
        assert_eq!(cues.calls, 0);

        // Within one cache each cue is only detected once
        let counters = Counters::default();
        let mut cache = CueCache::new(&mut cues);
        let mut ctx = GuardCtx {
            time_in_state_s: 0.0,
            counters: &counters,
            left_x: 0,
            side_lane_x: None,
            fused: &fused,
            cues: &mut cache,
        };
        let g = Guard::All(vec![Guard::Not(Box::new(Guard::Signal)), Guard::StopLine]);
        assert!(g.eval(&mut ctx));
        assert!(g.eval(&mut ctx));
        assert!(!Guard::Signal.eval(&mut ctx));
        drop(cache);
        assert_eq!(cues.calls, 2);
    }
}
