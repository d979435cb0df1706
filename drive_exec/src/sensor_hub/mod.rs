//! # Sensor hub
//!
//! The [`SensorHub`] holds the latest reading of every sensor. Sensor data arrives asynchronously
//! from the network client thread and is written into the hub, while the control cycle takes one
//! complete snapshot of the hub at the start of each cycle. All buffers sit behind a single lock so
//! a snapshot can never contain a partially updated set of readings.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod fusion;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard},
    time::Duration,
};

use comms_if::eqpt::{
    lane_cam::CueFlags,
    range::{LandmarkDetection, LandmarkReport, RangingScan, UltrasonicArray},
};
use image::GrayImage;
use log::debug;
use serde::Deserialize;

pub use fusion::{FusedSensors, Freshness, RangingSectors};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorHubParams {
    /// Number of ranging samples per degree, compensating for the mounting offset of the sensor.
    pub sector_ratio: f64,
}

/// Shared store of the latest sensor readings.
pub struct SensorHub {
    params: SensorHubParams,
    buffers: Mutex<HubBuffers>,
    frame_arrived: Condvar,
}

/// A value stamped with the sequence number and session time at which it was written.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub seq: u64,
    pub stamp_s: f64,
    pub value: T,
}

/// One camera frame as received from the camera side.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// The lane mask, `None` if the frame could not be decoded.
    pub mask: Option<Arc<GrayImage>>,

    /// Results of the scene cue detectors for this frame.
    pub cues: CueFlags,
}

/// The data which arrived since the previous snapshot.
#[derive(Debug, Clone, Default)]
pub struct SensorFrame {
    /// Sequence number of the newest data in this frame.
    pub seq: u64,

    /// Session time of the snapshot.
    pub stamp_s: f64,

    pub camera: Option<CameraFrame>,
    pub ranging: Option<RangingScan>,
    pub ultrasonic: Option<UltrasonicArray>,
    pub landmark: Option<LandmarkReport>,
}

/// A fully formed snapshot of the hub.
#[derive(Debug, Clone, Default)]
pub struct HubSnapshot {
    pub frame: SensorFrame,
    pub fused: FusedSensors,
}

#[derive(Default)]
struct HubBuffers {
    /// Sequence number of the last write.
    seq: u64,

    /// Sequence number at the time of the last snapshot.
    snapshot_seq: u64,

    camera: Option<Versioned<CameraFrame>>,
    ranging: Option<Versioned<RangingScan>>,
    sectors: RangingSectors,
    ultrasonic: Option<Versioned<UltrasonicArray>>,
    landmark_report: Option<Versioned<LandmarkReport>>,
    landmark: Option<LandmarkDetection>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SensorHubError {
    #[error("The sensor buffers are poisoned, a writer panicked")]
    Poisoned,

    #[error("The sector ratio must be positive and finite, got {0}")]
    InvalidSectorRatio(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SensorHubParams {
    fn default() -> Self {
        Self {
            sector_ratio: 1.4027,
        }
    }
}

impl SensorHub {
    pub fn new(params: SensorHubParams) -> Result<Self, SensorHubError> {
        if !params.sector_ratio.is_finite() || params.sector_ratio <= 0.0 {
            return Err(SensorHubError::InvalidSectorRatio(params.sector_ratio));
        }

        Ok(Self {
            params,
            buffers: Mutex::new(HubBuffers::default()),
            frame_arrived: Condvar::new(),
        })
    }

    /// Write a new camera frame and wake the control cycle.
    pub fn update_frame(&self, frame: CameraFrame) -> Result<u64, SensorHubError> {
        let seq = {
            let mut buf = self.lock()?;
            let seq = buf.next_seq();
            buf.camera = Some(Versioned::now(seq, frame));
            seq
        };

        self.frame_arrived.notify_all();

        Ok(seq)
    }

    pub fn update_ranging(&self, scan: RangingScan) -> Result<u64, SensorHubError> {
        // Split outside the lock
        let sectors = fusion::split_sectors(&scan.ranges_m, self.params.sector_ratio);

        let mut buf = self.lock()?;
        let seq = buf.next_seq();
        buf.ranging = Some(Versioned::now(seq, scan));
        buf.sectors = sectors;

        Ok(seq)
    }

    pub fn update_ultrasonic(&self, array: UltrasonicArray) -> Result<u64, SensorHubError> {
        let mut buf = self.lock()?;
        let seq = buf.next_seq();
        buf.ultrasonic = Some(Versioned::now(seq, array));

        Ok(seq)
    }

    /// Write a landmark report, the nearest detection becomes the current landmark.
    ///
    /// A report with no detections is kept as the latest report but leaves the current landmark
    /// in place.
    pub fn update_landmark(&self, report: LandmarkReport) -> Result<u64, SensorHubError> {
        let nearest = report.nearest();

        let mut buf = self.lock()?;
        let seq = buf.next_seq();

        match nearest {
            Some(n) => buf.landmark = Some(n),
            None => debug!("Empty landmark report, keeping the previous landmark"),
        }
        buf.landmark_report = Some(Versioned::now(seq, report));

        Ok(seq)
    }

    /// Take a snapshot of the hub.
    ///
    /// The frame contains only the data which arrived since the previous snapshot, the fused
    /// sensors contain the latest value of everything.
    pub fn snapshot(&self) -> Result<HubSnapshot, SensorHubError> {
        let mut buf = self.lock()?;
        let since = buf.snapshot_seq;

        let fresh = |v: Option<u64>| v.map(|s| s > since).unwrap_or(false);

        let fresh_flags = Freshness {
            ranging: fresh(buf.ranging.as_ref().map(|v| v.seq)),
            ultrasonic: fresh(buf.ultrasonic.as_ref().map(|v| v.seq)),
            landmark: fresh(buf.landmark_report.as_ref().map(|v| v.seq)),
        };

        let frame = SensorFrame {
            seq: buf.seq,
            stamp_s: util::session::get_elapsed_seconds(),
            camera: take_fresh(&buf.camera, since),
            ranging: take_fresh(&buf.ranging, since),
            ultrasonic: take_fresh(&buf.ultrasonic, since),
            landmark: take_fresh(&buf.landmark_report, since),
        };

        let fused = FusedSensors {
            front_clearance_m: buf.sectors.front_clearance_m,
            left_sector_m: buf.sectors.left_m.clone(),
            right_sector_m: buf.sectors.right_m.clone(),
            ultrasonic: buf.ultrasonic.as_ref().map(|v| v.value.dist),
            landmark: buf.landmark,
            fresh: fresh_flags,
        };

        buf.snapshot_seq = buf.seq;

        Ok(HubSnapshot { frame, fused })
    }

    /// Block until a camera frame newer than `after_seq` is available, or the timeout elapses.
    ///
    /// Returns the sequence number of the newest frame, or `None` on timeout.
    pub fn wait_frame(
        &self,
        after_seq: u64,
        timeout: Duration,
    ) -> Result<Option<u64>, SensorHubError> {
        let buf = self.lock()?;

        let newer = |b: &mut HubBuffers| {
            b.camera
                .as_ref()
                .map(|c| c.is_newer_than(after_seq))
                .unwrap_or(false)
        };

        let (buf, _) = self
            .frame_arrived
            .wait_timeout_while(buf, timeout, |b| !newer(b))
            .map_err(|_| SensorHubError::Poisoned)?;

        Ok(buf
            .camera
            .as_ref()
            .filter(|c| c.is_newer_than(after_seq))
            .map(|c| c.seq))
    }

    fn lock(&self) -> Result<MutexGuard<'_, HubBuffers>, SensorHubError> {
        self.buffers.lock().map_err(|_| SensorHubError::Poisoned)
    }
}

impl HubBuffers {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

impl<T> Versioned<T> {
    fn now(seq: u64, value: T) -> Self {
        Self {
            seq,
            stamp_s: util::session::get_elapsed_seconds(),
            value,
        }
    }

    fn is_newer_than(&self, seq: u64) -> bool {
        self.seq > seq
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn take_fresh<T: Clone>(v: &Option<Versioned<T>>, since: u64) -> Option<T> {
    v.as_ref()
        .filter(|v| v.is_newer_than(since))
        .map(|v| v.value.clone())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
