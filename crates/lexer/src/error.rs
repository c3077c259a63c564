//! Tokenizer errors.

use thiserror::Error;

/// Errors produced by strict validation of instruction text.
///
/// [`crate::tokenize`] ignores unknown characters and never fails; this
/// error is only produced by [`crate::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// A character outside the instruction set and outside the stripped
    /// formatting characters.
    #[error("unknown instruction '{found}' at position {position}")]
    UnknownInstruction { position: usize, found: char },
}
