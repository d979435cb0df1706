//! # Actuation Equipment Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the actuation collaborator once per control cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveDems {
    /// Steering demand, positive to the right. Nominally within [-50, 50].
    pub steer: i32,

    /// Speed demand, negative values drive in reverse.
    pub speed: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveDems {
    pub fn new(steer: i32, speed: i32) -> Self {
        Self { steer, speed }
    }

    /// The neutral command: wheels straight, vehicle stopped.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}
