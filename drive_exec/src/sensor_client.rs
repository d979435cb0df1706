//! # Sensor Client
//!
//! The SensorClient receives the data published by the sensor side and writes it into the
//! [`SensorHub`]. Each sensor publishes independently, as often as it can, so the client runs a
//! background thread which subscribes to all messages and dispatches them by type:
//!
//! - camera frames (lane mask and scene cues), which trigger a control cycle,
//! - ranging scans,
//! - ultrasonic array readings,
//! - landmark reports.
//!
//! If the background thread stops because of a socket failure the client is no longer alive, and
//! the executable shuts down.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    convert::TryFrom,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use chrono::Utc;
use log::{error, info, trace, warn};

use crate::sensor_hub::{CameraFrame, SensorHub, SensorHubError};
use comms_if::{
    eqpt::{lane_cam::MaskImage, SensorMsg},
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetError, NetParams, SocketOptions},
};
use util::time;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct SensorClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SensorClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not start the background thread: {0}")]
    ThreadError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SensorClient {
    /// Create a new instance of the SensorClient, which starts writing into the hub immediately.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        hub: Arc<SensorHub>,
    ) -> Result<Self, SensorClientError> {
        let socket_options = SocketOptions {
            connect_timeout: 1000,
            linger: 1,
            recv_timeout: 100,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, &params.sensor_endpoint)
            .map_err(SensorClientError::SocketError)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let alive = Arc::new(AtomicBool::new(true));

        let bg_run_clone = bg_run.clone();
        let alive_clone = alive.clone();

        let bg_jh = thread::Builder::new()
            .name("sensor_client".into())
            .spawn(move || bg_thread(socket, bg_run_clone, alive_clone, hub))
            .map_err(SensorClientError::ThreadError)?;

        Ok(Self {
            bg_jh: Some(bg_jh),
            bg_run,
            alive,
        })
    }

    /// Returns false once the background thread has stopped.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Stop the background thread and wait for it to exit.
    pub fn shutdown(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("SensorClient background thread panicked");
            }
        }
    }
}

impl Drop for SensorClient {
    fn drop(&mut self) {
        self.shutdown()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Write one sensor message into the hub, returning the sequence number it was given.
///
/// A lane mask which cannot be decoded is still delivered, without its mask, so that the cycle
/// it triggers emits the neutral command.
pub fn dispatch(hub: &SensorHub, msg: SensorMsg) -> Result<u64, SensorHubError> {
    match msg {
        SensorMsg::Frame { mask, cues } => {
            let mask = match MaskImage::try_from(mask) {
                Ok(m) => {
                    if let Some(age_s) = time::duration_to_seconds(Utc::now() - m.timestamp) {
                        trace!("Lane mask is {:.03} s old", age_s);
                    }
                    Some(Arc::new(m.image))
                }
                Err(e) => {
                    warn!("Could not decode the lane mask: {}", e);
                    None
                }
            };

            hub.update_frame(CameraFrame { mask, cues })
        }
        SensorMsg::Ranging(scan) => hub.update_ranging(scan),
        SensorMsg::Ultrasonic(array) => hub.update_ultrasonic(array),
        SensorMsg::Landmark(report) => hub.update_landmark(report),
    }
}

/// Background thread, writes into the hub whenever the sensor side publishes something new.
fn bg_thread(
    socket: MonitoredSocket,
    run: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    hub: Arc<SensorHub>,
) {
    while run.load(Ordering::Relaxed) {
        let msg = match socket.recv_json::<SensorMsg>() {
            Ok(Some(m)) => m,
            Ok(None) => continue,
            Err(NetError::RecvError(e)) => {
                error!("Error receiving message from the sensors: {:?}", e);
                break;
            }
            Err(e) => {
                warn!("Discarding sensor message: {}", e);
                continue;
            }
        };

        let source = msg.source();

        if let Err(e) = dispatch(&hub, msg) {
            error!("Could not write {} data into the hub: {}", source, e);
            break;
        }
    }

    info!("SensorClient stopped");
    alive.store(false, Ordering::Relaxed);
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
