//! # Shutdown
//!
//! The main loop runs until either an interrupt is received or the sensor client stops.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::info;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Flag cleared when the executable should stop.
#[derive(Debug, Clone)]
pub struct ShutdownFlag {
    running: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An interrupt (Ctrl-C or SIGTERM) was received.
    Interrupted,

    /// The sensor client background thread exited.
    SensorClientStopped,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ShutdownFlag {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create a flag cleared by the process interrupt handler. Only one handler can be installed
    /// per process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let flag = Self::new();
        let handler_flag = flag.clone();

        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            handler_flag.request();
        })?;

        Ok(flag)
    }

    pub fn request(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Why the main loop should stop, or `None` if it should keep going. An interrupt takes
    /// precedence.
    pub fn stop_reason(&self, sensor_client_alive: bool) -> Option<StopReason> {
        if !self.is_running() {
            Some(StopReason::Interrupted)
        } else if !sensor_client_alive {
            Some(StopReason::SensorClientStopped)
        } else {
            None
        }
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stop_reason() {
        let flag = ShutdownFlag::new();
        assert!(flag.is_running());
        assert_eq!(flag.stop_reason(true), None);
        assert_eq!(
            flag.stop_reason(false),
            Some(StopReason::SensorClientStopped)
        );

        // A clone shares the flag, as the interrupt handler does
        let handler_flag = flag.clone();
        std::thread::spawn(move || handler_flag.request())
            .join()
            .unwrap();

        assert!(!flag.is_running());
        assert_eq!(flag.stop_reason(true), Some(StopReason::Interrupted));
        assert_eq!(flag.stop_reason(false), Some(StopReason::Interrupted));
    }
}
