//! Incremental evaluation for REPL sessions.

use crate::error::RuntimeError;
use crate::machine::Machine;

impl Machine {
    /// Tokenize `instruction` and run it on the tape left by earlier calls.
    ///
    /// The session lexer is rewound first, so every call starts from a
    /// clean scan; only cells and pointer carry over.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::SessionNotInitialized`] on a machine built with
    /// [`Machine::new`] instead of [`Machine::repl`], plus anything
    /// [`Machine::execute`] can return.
    pub fn evaluate(&mut self, instruction: &str) -> Result<(), RuntimeError> {
        let lexer = self
            .repl
            .as_mut()
            .ok_or(RuntimeError::SessionNotInitialized)?;
        lexer.zero();
        self.tokens = lexer.read(instruction);
        self.cursor = 0;
        self.run()
    }

    /// Like [`Machine::evaluate`], but rejects text containing anything
    /// other than instructions and stripped formatting.
    pub fn evaluate_strict(&mut self, instruction: &str) -> Result<(), RuntimeError> {
        if !self.is_session() {
            return Err(RuntimeError::SessionNotInitialized);
        }
        bfcc_lexer::validate(instruction)?;
        self.evaluate(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::OutputBuffer;
    use bfcc_lexer::TokenizeError;

    #[test]
    fn state_carries_across_calls() {
        let out = OutputBuffer::new();
        let mut session = Machine::repl(10).with_output(out.clone());
        session.evaluate("+++").unwrap();
        session.evaluate(".").unwrap();
        assert_eq!(out.contents(), vec![3]);
    }

    #[test]
    fn pointer_carries_across_calls() {
        let mut session = Machine::repl(10);
        session.evaluate(">>").unwrap();
        session.evaluate("+").unwrap();
        assert_eq!(session.pointer(), 2);
        assert_eq!(session.cells()[2], 1);
    }

    #[test]
    fn batch_machine_is_not_a_session() {
        let mut machine = Machine::new(10);
        assert_eq!(
            machine.evaluate("+"),
            Err(RuntimeError::SessionNotInitialized)
        );
        assert_eq!(
            machine.evaluate_strict("+"),
            Err(RuntimeError::SessionNotInitialized)
        );
        assert_eq!(machine.cells()[0], 0);
    }

    #[test]
    fn failed_call_keeps_completed_effects() {
        let mut session = Machine::repl(2);
        assert_eq!(
            session.evaluate("+>+>+"),
            Err(RuntimeError::TapeBounds {
                at: 3,
                pointer: 2,
                size: 2
            })
        );
        assert_eq!(session.cells(), vec![1, 1]);
        assert_eq!(session.pointer(), 1);
        session.evaluate("+").unwrap();
        assert_eq!(session.cells(), vec![1, 2]);
    }

    #[test]
    fn strict_rejects_comments_without_running() {
        let mut session = Machine::repl(2);
        assert_eq!(
            session.evaluate_strict("+ hi"),
            Err(RuntimeError::Tokenize(TokenizeError::UnknownInstruction {
                position: 2,
                found: 'h'
            }))
        );
        assert_eq!(session.cells(), vec![0, 0]);
        session.evaluate_strict("+ +").unwrap();
        assert_eq!(session.cells(), vec![2, 0]);
    }

    #[test]
    fn empty_submission_is_a_no_op() {
        let mut session = Machine::repl(1);
        session.evaluate("").unwrap();
        session.evaluate("\n").unwrap();
        assert_eq!(session.cells(), vec![0]);
    }
}
