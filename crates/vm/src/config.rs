//! Machine configuration and defaults.

use std::time::Duration;

/// Tape size for whole-program runs.
pub const DEFAULT_TAPE_SIZE: usize = 30_000;

/// Tape size for interactive sessions, small enough to dump on one screen.
pub const DEFAULT_REPL_TAPE_SIZE: usize = 100;

/// Throttle delay a [`crate::Stepper`] starts with and returns to on resume.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(10);

/// Construction-time settings for a [`crate::Machine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Number of cells. Fixed for the machine's lifetime.
    pub tape_size: usize,
    /// Initial throttle delay for a stepper driving this machine.
    pub step_delay: Duration,
}

impl MachineConfig {
    /// Defaults for an interactive session.
    pub fn repl() -> Self {
        Self {
            tape_size: DEFAULT_REPL_TAPE_SIZE,
            ..Self::default()
        }
    }

    pub fn with_tape_size(mut self, tape_size: usize) -> Self {
        self.tape_size = tape_size;
        self
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            step_delay: DEFAULT_STEP_DELAY,
        }
    }
}
