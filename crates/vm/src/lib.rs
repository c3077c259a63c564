//! Tape machine for the eight-instruction tape language.
//!
//! The machine owns a fixed-size tape of integer cells and a pointer into
//! it, and executes token lists from [`bfcc_lexer`]:
//!
//! - [`Machine::execute`] / [`Machine::run_source`] run a whole program
//! - [`Machine::evaluate`] runs one submission of a REPL session, keeping
//!   the tape from earlier submissions
//! - [`StepHook`] / [`Stepper`] throttle or single-step execution
//! - [`TapeView`] reads the tape from another thread while it runs
//!
//! Loops are resolved by a depth-counting scan at runtime. Every tape
//! access is bounds-checked; a pointer leaving the tape is a
//! [`RuntimeError::TapeBounds`], an unmatched bracket found by a scan is a
//! [`RuntimeError::UnbalancedLoop`].
//!
//! # Usage
//!
//! ```
//! use bfcc_vm::{run, Machine, OutputBuffer};
//!
//! assert_eq!(run(",.", b"A").unwrap(), b"A");
//!
//! let out = OutputBuffer::new();
//! let mut session = Machine::repl(100).with_output(out.clone());
//! session.evaluate("+++").unwrap();
//! session.evaluate(".").unwrap();
//! assert_eq!(out.contents(), vec![3]);
//! ```

pub mod config;
pub mod error;
pub mod execute;
pub mod machine;
pub mod session;
pub mod sink;
pub mod step;
pub mod tape;

pub use config::{MachineConfig, DEFAULT_REPL_TAPE_SIZE, DEFAULT_STEP_DELAY, DEFAULT_TAPE_SIZE};
pub use error::{RuntimeError, StepError};
pub use machine::Machine;
pub use sink::OutputBuffer;
pub use step::{StepHook, StepMode, Stepper, StepperHook};
pub use tape::{Cell, CellFormat, TapeSnapshot, TapeView};

use std::io::Cursor;

/// Run a whole program on a fresh default-size tape and return its output.
///
/// # Errors
///
/// Returns [`RuntimeError`] if execution fails (pointer out of bounds,
/// unbalanced loop, input exhausted, etc.).
pub fn run(source: &str, input: &[u8]) -> Result<Vec<u8>, RuntimeError> {
    let output = OutputBuffer::new();
    let mut machine = Machine::new(DEFAULT_TAPE_SIZE)
        .with_input(Cursor::new(input.to_vec()))
        .with_output(output.clone());
    machine.run_source(source)?;
    Ok(output.take())
}
