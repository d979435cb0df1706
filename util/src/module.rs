//! Cyclic module interface
//!
//! A module of the drive executable is a struct holding its own state between cycles. It is
//! initialised once from a parameter file, then processed once per control cycle on a borrowed
//! input, producing an output and a status report.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// Interface of a cyclic module.
pub trait State {
    /// Everything needed to build the module, usually the name of its parameter file.
    type InitData;
    type InitError;

    /// The snapshot of the world the module works on for one cycle.
    type InputData;
    type OutputData;

    /// Per-cycle telemetry, cheap to copy into the data store.
    type StatusReport;
    type ProcError;

    /// Initialise the module, opening any archive in the `session`.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one cycle.
    ///
    /// A module which cannot use its input should return its safe output rather than an error,
    /// errors are kept for a module which is not usable at all (not initialised, broken
    /// parameters).
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Counts the cycles it runs, refusing to run before init.
    #[derive(Default)]
    struct Counter {
        step: Option<u32>,
        total: u32,
    }

    impl State for Counter {
        type InitData = u32;
        type InitError = ();
        type InputData = bool;
        type OutputData = u32;
        type StatusReport = bool;
        type ProcError = &'static str;

        fn init(&mut self, step: u32, _session: &Session) -> Result<(), ()> {
            self.step = Some(step);
            Ok(())
        }

        fn proc(&mut self, count: &bool) -> Result<(u32, bool), &'static str> {
            let step = self.step.ok_or("not initialised")?;
            if *count {
                self.total += step;
            }
            Ok((self.total, *count))
        }
    }

    #[test]
    fn test_state_cycle() {
        // Built by hand, there can only be one session epoch per process
        let dir = tempfile::tempdir().unwrap();
        let session = Session {
            session_root: dir.path().to_path_buf(),
            arch_root: dir.path().join("arch"),
            log_file_path: dir.path().join("module_test.log"),
        };

        let mut c = Counter::default();
        assert!(c.proc(&true).is_err());

        c.init(3, &session).unwrap();
        assert_eq!(c.proc(&true), Ok((3, true)));
        assert_eq!(c.proc(&false), Ok((3, false)));
        assert_eq!(c.proc(&true), Ok((6, true)));
    }
}
