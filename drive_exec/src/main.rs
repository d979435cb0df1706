//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop, one cycle per camera frame:
//!         - Wait for a new camera frame in the sensor hub
//!         - Snapshot the hub (frame and fused sensors)
//!         - Drive control processing:
//!             - Lane scanning
//!             - Maneuver management
//!             - Command emission
//!         - Publish the drive demands
//!         - Archiving
//!
//! # Modules
//!
//! All modules (e.g. `drive_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::{eqpt::act::DriveDems, net::NetParams};
use drive_lib::{
    act_client::ActClient,
    data_store::DataStore,
    drive_ctrl::{self, DriveCtrlParams, PngSaver},
    params::DriveExecParams,
    sensor_client::SensorClient,
    sensor_hub::SensorHub,
    shutdown::{ShutdownFlag, StopReason},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::{sync::Arc, time::Instant};

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the drive control parameter file.
const DRIVE_CTRL_PARAMS: &str = "drive_ctrl.toml";

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Track Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: DriveExecParams =
        util::params::load("drive_exec.toml").wrap_err("Could not load exec params")?;

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    let frame_timeout = exec_params.frame_timeout().wrap_err("Invalid exec params")?;

    info!("Exec parameters loaded");

    let shutdown = ShutdownFlag::install().wrap_err("Failed to install the shutdown handler")?;

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    if exec_params.overlay_save_every_n_cycles > 0 {
        let every_n = exec_params.overlay_save_every_n_cycles;
        let overlay_dir = session.session_root.join("overlay");
        std::fs::create_dir_all(&overlay_dir)
            .wrap_err("Failed to create the overlay directory")?;

        ds.drive_ctrl.set_overlay_sink(Box::new(PngSaver::new(overlay_dir, every_n)));
    }

    ds.drive_ctrl
        .init(
            drive_ctrl::InitData {
                params_file: DRIVE_CTRL_PARAMS.into(),
                initial_state: exec_params.initial_state,
            },
            &session,
        )
        .wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete");

    let drive_ctrl_params: &DriveCtrlParams = ds.drive_ctrl.params();
    let hub = Arc::new(
        SensorHub::new(drive_ctrl_params.sensor_hub.clone())
            .wrap_err("Failed to initialise the SensorHub")?,
    );
    info!("SensorHub init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let act_client = {
        let c = ActClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise ActClient")?;
        info!("ActClient initialised");
        c
    };

    let mut sensor_client = {
        let c = SensorClient::new(&zmq_ctx, &net_params, hub.clone())
            .wrap_err("Failed to initialise SensorClient")?;
        info!("SensorClient initialised");
        c
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let stop_reason = loop {
        if let Some(r) = shutdown.stop_reason(sensor_client.is_alive()) {
            break r;
        }

        // ---- DATA INPUT ----

        // Wait for the next camera frame, which starts the cycle
        match hub.wait_frame(ds.last_frame_seq, frame_timeout) {
            Ok(Some(seq)) => {
                ds.last_frame_seq = seq;
                ds.num_consec_frame_timeouts = 0;
            }
            Ok(None) => {
                // Stop the vehicle until frames come back
                if ds.num_consec_frame_timeouts == 0 {
                    warn!(
                        "No camera frame for {:.02} s, stopping",
                        exec_params.frame_timeout_s
                    );
                    send_demands(&act_client, &mut ds, &DriveDems::neutral());
                }
                ds.num_consec_frame_timeouts += 1;
                continue;
            }
            Err(e) => raise_error!("Cannot wait on the SensorHub: {}", e),
        }

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(session::get_elapsed_seconds());

        ds.drive_ctrl_input = drive_ctrl::InputData {
            now_s: ds.cycle_time_s,
            snapshot: match hub.snapshot() {
                Ok(s) => s,
                Err(e) => raise_error!("Cannot snapshot the SensorHub: {}", e),
            },
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ds.drive_ctrl.proc(&ds.drive_ctrl_input) {
            Ok((o, r)) => {
                ds.drive_ctrl_output = o;
                ds.drive_ctrl_status_rpt = r;
            }
            Err(e) => {
                warn!("Error during DriveCtrl processing: {}", e);
                ds.drive_ctrl_output = DriveDems::neutral();
            }
        };

        // ---- DEMANDS OUTPUT ----

        let dems = ds.drive_ctrl_output;
        send_demands(&act_client, &mut ds, &dems);

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.drive_ctrl.write() {
            warn!("Could not write the DriveCtrl archive: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        if cycle_dur.as_secs_f64() > exec_params.cycle_overrun_s {
            ds.num_consec_cycle_overruns += 1;
            warn!(
                "Cycle overran by {:.06} s ({} consecutive)",
                cycle_dur.as_secs_f64() - exec_params.cycle_overrun_s,
                ds.num_consec_cycle_overruns
            );
        } else {
            ds.num_consec_cycle_overruns = 0;
        }

        ds.cycle_end();
    };

    // ---- SHUTDOWN ----

    match stop_reason {
        StopReason::Interrupted => info!("Shutdown requested, stopping the vehicle"),
        StopReason::SensorClientStopped => {
            warn!("SensorClient is no longer running, stopping the vehicle")
        }
    }

    send_demands(&act_client, &mut ds, &DriveDems::neutral());
    sensor_client.shutdown();

    info!("End of execution after {} cycles", ds.num_cycles);

    Ok(())
}

/// Publish the demands, keeping count of consecutive failures.
fn send_demands(act_client: &ActClient, ds: &mut DataStore, dems: &DriveDems) {
    match act_client.send_demands(dems) {
        Ok(()) => ds.num_consec_act_send_errors = 0,
        Err(e) => {
            ds.num_consec_act_send_errors += 1;
            warn!(
                "Could not publish demands ({} consecutive): {}",
                ds.num_consec_act_send_errors, e
            );
        }
    }
}
