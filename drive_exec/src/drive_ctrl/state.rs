//! Implementations for the DriveCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{act::DriveDems, lane_cam::CueFlags};
use image::GrayImage;
use log::{debug, info, trace, warn};
use serde::Serialize;

use super::{emit, emit::Limited, overlay, DriveCtrlError, DriveCtrlParams, OverlaySink};
use crate::{
    lane::{LanePosition, LaneScanner, ScanQuality},
    mnvr_mgr::{CueDetector, MnvrCtx, MnvrMgr, MnvrState, MnvrTm},
    sensor_hub::{FusedSensors, HubSnapshot},
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::{self, Session},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const SENSOR_NAMES: [&str; 3] = ["ranging", "ultrasonic", "landmark"];

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Drive control module state
#[derive(Default)]
pub struct DriveCtrl {
    params: DriveCtrlParams,

    scanner: Option<LaneScanner>,

    mnvr_mgr: Option<MnvrMgr>,

    report: StatusReport,

    record: Option<CycleRecord>,
    arch_cycle: Archiver,

    /// Sensors which have reported at least once, and those already warned about.
    seen: [bool; 3],
    warned: [bool; 3],

    overlay_sink: Option<Box<dyn OverlaySink>>,
}

/// Data needed to initialise DriveCtrl.
#[derive(Debug, Clone)]
pub struct InitData {
    /// Parameter file name, relative to the params directory.
    pub params_file: String,

    pub initial_state: MnvrState,
}

/// Input to one cycle of DriveCtrl.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    /// Session time at the start of the cycle.
    pub now_s: f64,

    pub snapshot: HubSnapshot,
}

/// Status report for DriveCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// The frame was absent or malformed, the neutral command was emitted.
    pub malformed_frame: bool,

    pub quality: Option<ScanQuality>,

    pub lane: Option<LanePosition>,

    /// True if the maneuver state changed this cycle.
    pub transition: bool,

    pub limited: Limited,

    pub mnvr_tm: MnvrTm,
}

/// One line of the cycle archive.
#[derive(Debug, Clone, Copy, Serialize)]
struct CycleRecord {
    time_s: f64,
    state: i32,
    prev_state: i32,
    time_in_state_s: f64,
    quality: ScanQuality,
    left_x: i32,
    right_x: i32,
    center: i32,
    last_center: i32,
    steer: i32,
    speed: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl State for DriveCtrl {
    type InitData = InitData;
    type InitError = DriveCtrlError;

    type InputData = InputData;
    type OutputData = DriveDems;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: DriveCtrlParams =
            params::load(&init_data.params_file).map_err(DriveCtrlError::ParamLoadError)?;

        info!("Camera calibration: {:?}", params.calib);

        let sink = self.overlay_sink.take();

        *self = Self::from_params(
            params,
            init_data.initial_state,
            session::get_elapsed_seconds(),
        )?;

        self.overlay_sink = sink;
        self.arch_cycle = Archiver::from_path(session, "drive_ctrl/cycle.csv")
            .map_err(DriveCtrlError::ArchiveError)?;

        Ok(())
    }

    /// Perform one cycle of drive control.
    ///
    /// An absent or malformed mask results in the neutral command without stepping the maneuver
    /// manager.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport::default();
        self.record = None;

        self.watch_sensors(&input_data.snapshot.fused);

        let scanner = self.scanner.as_ref().ok_or(DriveCtrlError::NotInit)?;
        let mnvr_mgr = self.mnvr_mgr.as_mut().ok_or(DriveCtrlError::NotInit)?;

        let (mask, cues) = match frame_mask(&input_data.snapshot, scanner) {
            Ok(m) => m,
            Err(reason) => {
                warn!("Malformed frame, emitting neutral command: {}", reason);
                self.report.malformed_frame = true;
                return Ok((DriveDems::neutral(), self.report));
            }
        };

        let scan = scanner
            .scan(mask, mnvr_mgr.last_center())
            .map_err(DriveCtrlError::LaneError)?;

        let mut cues = cues;
        let out = mnvr_mgr
            .step(MnvrCtx {
                now_s: input_data.now_s,
                edges: (scan.left_x, scan.right_x),
                side_lane_x: scanner.find_side_lane(mask, scan.left_x),
                fused: &input_data.snapshot.fused,
                cues: &mut cues,
            })
            .map_err(DriveCtrlError::MnvrMgrError)?;

        let base = match scan.quality {
            ScanQuality::Lost => DriveDems::neutral(),
            _ => emit::base_command(out.lane.center, &self.params.emit),
        };
        let (cmd, limited) = emit::clamp(emit::apply(base, out.cmd), &self.params.emit);

        trace!(
            "DriveCtrl: lane ({}, {}) c {} lc {}, cmd {:?}",
            out.lane.left_x,
            out.lane.right_x,
            out.lane.center,
            out.lane.last_center,
            cmd
        );

        self.report = StatusReport {
            malformed_frame: false,
            quality: Some(scan.quality),
            lane: Some(out.lane),
            transition: out.transition.is_some(),
            limited,
            mnvr_tm: out.tm,
        };

        self.record = Some(CycleRecord {
            time_s: input_data.now_s,
            state: out.tm.state,
            prev_state: out.tm.prev_state,
            time_in_state_s: out.tm.time_in_state_s,
            quality: scan.quality,
            left_x: out.lane.left_x,
            right_x: out.lane.right_x,
            center: out.lane.center,
            last_center: out.lane.last_center,
            steer: cmd.steer,
            speed: cmd.speed,
        });

        if let Some(sink) = self.overlay_sink.as_mut() {
            if sink.wants_overlay() {
                let img = overlay::render(
                    mask,
                    &out.lane,
                    &input_data.snapshot.fused,
                    self.params.lane.scan_row,
                    self.params.sensor_hub.sector_ratio,
                );
                sink.overlay(&img);
            }
        }

        Ok((cmd, self.report))
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if let Some(ref record) = self.record {
            self.arch_cycle.serialise(record)?;
        }

        Ok(())
    }
}

impl DriveCtrl {
    /// Build the module from already loaded parameters, without any archiving.
    pub fn from_params(
        params: DriveCtrlParams,
        initial_state: MnvrState,
        now_s: f64,
    ) -> Result<Self, DriveCtrlError> {
        params.calib.validate()?;

        let scanner =
            LaneScanner::new(params.lane.clone()).map_err(DriveCtrlError::LaneError)?;
        let mnvr_mgr = MnvrMgr::new(&params.mnvr, initial_state, now_s)
            .map_err(DriveCtrlError::MnvrMgrError)?;

        info!("DriveCtrl starting in {}", initial_state);

        Ok(Self {
            params,
            scanner: Some(scanner),
            mnvr_mgr: Some(mnvr_mgr),
            ..Default::default()
        })
    }

    pub fn params(&self) -> &DriveCtrlParams {
        &self.params
    }

    pub fn mnvr_mgr(&self) -> Option<&MnvrMgr> {
        self.mnvr_mgr.as_ref()
    }

    /// Set the receiver of the overlay, rendered on the cycles it asks for.
    pub fn set_overlay_sink(&mut self, sink: Box<dyn OverlaySink>) {
        self.overlay_sink = Some(sink);
    }

    fn watch_sensors(&mut self, fused: &FusedSensors) {
        let fresh = [
            fused.fresh.ranging,
            fused.fresh.ultrasonic,
            fused.fresh.landmark,
        ];

        for i in 0..SENSOR_NAMES.len() {
            if fresh[i] {
                if !self.seen[i] {
                    info!("First {} data received", SENSOR_NAMES[i]);
                }
                self.seen[i] = true;
                continue;
            }

            debug!("No new {} data this cycle", SENSOR_NAMES[i]);

            if !self.seen[i] && !self.warned[i] {
                warn!(
                    "No {} data received yet, maneuvers gated on it will not trigger",
                    SENSOR_NAMES[i]
                );
                self.warned[i] = true;
            }
        }
    }
}

impl CueDetector for CueFlags {
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

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Get the mask and cues of the snapshot's camera frame, or the reason they can't be used.
fn frame_mask<'a>(
    snapshot: &'a HubSnapshot,
    scanner: &LaneScanner,
) -> Result<(&'a GrayImage, CueFlags), String> {
    let camera = snapshot
        .frame
        .camera
        .as_ref()
        .ok_or_else(|| String::from("no camera frame"))?;

    let mask = camera
        .mask
        .as_ref()
        .ok_or_else(|| String::from("the mask could not be decoded"))?;

    scanner.check_mask(mask).map_err(|e| e.to_string())?;

    Ok((mask, camera.cues))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
