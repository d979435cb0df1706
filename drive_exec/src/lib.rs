//! # Drive library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the drive crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Lane pixel scanner - finds the lane edges in the binary mask
pub mod lane;

/// Sensor fusion hub - latest value of every sensor, shared between the clients and the cycle
pub mod sensor_hub;

/// Maneuver manager - the table-driven maneuver state machine
pub mod mnvr_mgr;

/// Drive control module - runs one perception to actuation cycle and emits the drive demands
pub mod drive_ctrl;

/// Global data store of the executable
pub mod data_store;

/// Executable parameters
pub mod params;

/// Sensor client - receives sensor data and writes it into the hub
pub mod sensor_client;

/// Actuator client - publishes the drive demands
pub mod act_client;

/// Shutdown flag - set on interrupt, stops the main loop
pub mod shutdown;
