//! Runtime errors for the tape machine.
//!
//! Every error that happens while tokens are evaluated carries the token
//! index (`at`) of the instruction that failed.

use bfcc_lexer::TokenizeError;
use std::io;
use thiserror::Error;

/// Errors that stop an `execute` or `evaluate` call.
///
/// None of these are retried. Effects of instructions that completed
/// before the failure stay on the tape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Strict validation rejected the instruction text.
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    /// A loop bracket has no matching counterpart in the token list.
    #[error("unbalanced loop bracket at instruction {at}")]
    UnbalancedLoop { at: usize },

    /// The pointer would leave the tape.
    #[error("pointer {pointer} outside tape of size {size} at instruction {at}")]
    TapeBounds {
        at: usize,
        pointer: isize,
        size: usize,
    },

    /// The input sink ran dry or failed, or the output sink rejected a write.
    #[error("i/o error at instruction {at}: {message}")]
    Io {
        at: usize,
        kind: io::ErrorKind,
        message: String,
    },

    /// Incremental evaluation on a machine built without a REPL lexer.
    #[error("repl has not been initialized")]
    SessionNotInitialized,

    /// The step hook refused to let execution continue.
    #[error("step hook failed at instruction {at}: {source}")]
    StepHook {
        at: usize,
        #[source]
        source: StepError,
    },
}

impl RuntimeError {
    pub(crate) fn io(at: usize, err: &io::Error) -> Self {
        RuntimeError::Io {
            at,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Failures reported by a step hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// Execution was cancelled from outside.
    #[error("execution cancelled")]
    Cancelled,

    /// The controller driving single-step mode went away.
    #[error("step controller disconnected")]
    Disconnected,

    /// Any other hook-specific failure.
    #[error("{0}")]
    Failed(String),
}
