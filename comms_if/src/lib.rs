//! # Communications interface crate.
//!
//! Provides the interface structures exchanged between the drive software and its external
//! collaborators (camera pipeline, ranging/ultrasonic/landmark sensors, actuation), and the
//! network layer used to carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Sensor and actuation equipment data definitions
pub mod eqpt;

/// Network module
pub mod net;
