//! Evaluation loop and instruction dispatch.
//!
//! Loop brackets are resolved at runtime by walking the token list with a
//! depth counter. There is no jump table; skipping a loop costs one scan
//! step per token in its body.

use crate::error::RuntimeError;
use crate::machine::Machine;
use crate::tape::Cell;
use bfcc_lexer::{Lexer, Token, TokenKind};
use std::io::{Read, Write};
use tracing::{debug, trace};

impl Machine {
    /// Execute `tokens` to completion.
    ///
    /// Replaces the token list and rewinds the cursor. Cells and pointer
    /// carry over from earlier runs.
    pub fn execute(&mut self, tokens: Vec<Token>) -> Result<(), RuntimeError> {
        self.tokens = tokens;
        self.cursor = 0;
        self.run()
    }

    /// Tokenize a whole program and execute it.
    pub fn run_source(&mut self, source: &str) -> Result<(), RuntimeError> {
        self.execute(Lexer::new(source).tokens())
    }

    /// Run from the current cursor until the end of the token list.
    pub(crate) fn run(&mut self) -> Result<(), RuntimeError> {
        debug!(
            tokens = self.tokens.len(),
            pointer = self.tape.pointer(),
            "execution started"
        );

        let result = self.run_to_end();
        match &result {
            Ok(()) => debug!(pointer = self.tape.pointer(), "execution finished"),
            Err(e) => debug!(error = %e, cursor = self.cursor, "execution aborted"),
        }
        result
    }

    fn run_to_end(&mut self) -> Result<(), RuntimeError> {
        while self.cursor < self.tokens.len() {
            self.before_step(self.cursor)?;
            self.step()?;
        }
        Ok(())
    }

    /// Give the step hook a chance to pause or abort.
    fn before_step(&mut self, at: usize) -> Result<(), RuntimeError> {
        match self.hook.as_mut() {
            Some(hook) => hook
                .before_step()
                .map_err(|source| RuntimeError::StepHook { at, source }),
            None => Ok(()),
        }
    }

    /// Evaluate the token under the cursor and move the cursor.
    fn step(&mut self) -> Result<(), RuntimeError> {
        let at = self.cursor;
        let token = self.tokens[at];
        trace!(at, kind = %token.kind, repeat = token.repeat, "evaluate");

        match token.kind {
            TokenKind::MoveRight => self.tape.shift(at, distance(token.repeat))?,
            TokenKind::MoveLeft => self.tape.shift(at, -distance(token.repeat))?,
            TokenKind::IncCell => self
                .tape
                .update(at, |c| c.wrapping_add(token.repeat as Cell))?,
            TokenKind::DecCell => self
                .tape
                .update(at, |c| c.wrapping_sub(token.repeat as Cell))?,
            TokenKind::Output => {
                let cell = self.tape.current(at)?;
                self.output
                    .write_all(&[cell as u8])
                    .map_err(|e| RuntimeError::io(at, &e))?;
            }
            TokenKind::Input => {
                // Fail on a bad pointer before consuming input.
                self.tape.current(at)?;
                let mut byte = [0u8; 1];
                self.input
                    .read_exact(&mut byte)
                    .map_err(|e| RuntimeError::io(at, &e))?;
                self.tape.update(at, |_| Cell::from(byte[0]))?;
            }
            TokenKind::LoopOpen => {
                self.cursor = if self.tape.current(at)? != 0 {
                    at + 1
                } else {
                    self.match_forward(at)? + 1
                };
                return Ok(());
            }
            TokenKind::LoopClose => {
                self.cursor = if self.tape.current(at)? == 0 {
                    at + 1
                } else {
                    // Land on the `[` so it re-tests the cell.
                    self.match_backward(at)?
                };
                return Ok(());
            }
            TokenKind::EndOfStream => {
                self.cursor = self.tokens.len();
                return Ok(());
            }
        }

        self.cursor += 1;
        Ok(())
    }

    /// Index of the `]` matching the `[` at `at`.
    fn match_forward(&mut self, at: usize) -> Result<usize, RuntimeError> {
        let mut depth = 1usize;
        let mut scan = at;
        while depth != 0 {
            self.before_step(at)?;
            scan += 1;
            let token = self
                .tokens
                .get(scan)
                .ok_or(RuntimeError::UnbalancedLoop { at })?;
            match token.kind {
                TokenKind::LoopOpen => depth += 1,
                TokenKind::LoopClose => depth -= 1,
                _ => {}
            }
            trace!(at, scan, depth, "scan forward");
        }
        Ok(scan)
    }

    /// Index of the `[` matching the `]` at `at`.
    fn match_backward(&mut self, at: usize) -> Result<usize, RuntimeError> {
        let mut depth = 1usize;
        let mut scan = at;
        while depth != 0 {
            self.before_step(at)?;
            scan = scan
                .checked_sub(1)
                .ok_or(RuntimeError::UnbalancedLoop { at })?;
            match self.tokens[scan].kind {
                TokenKind::LoopClose => depth += 1,
                TokenKind::LoopOpen => depth -= 1,
                _ => {}
            }
            trace!(at, scan, depth, "scan backward");
        }
        Ok(scan)
    }
}

/// Pointer distance for a repeat count.
fn distance(repeat: usize) -> isize {
    isize::try_from(repeat).unwrap_or(isize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StepError;
    use crate::sink::OutputBuffer;
    use bfcc_lexer::tokenize;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn execute_replaces_tokens_but_keeps_tape() {
        let mut machine = Machine::new(4);
        machine.run_source("++>").unwrap();
        machine.run_source("+").unwrap();
        assert_eq!(machine.cells(), vec![2, 1, 0, 0]);
        assert_eq!(machine.pointer(), 1);
        assert_eq!(machine.tokens(), tokenize("+").as_slice());
    }

    #[test]
    fn forward_skip_lands_past_matching_close() {
        let mut machine = Machine::new(2);
        machine.execute(tokenize("[[-]+]>")).unwrap();
        assert_eq!(machine.cursor, machine.tokens.len());
        assert_eq!(machine.pointer(), 1);
        assert_eq!(machine.cells(), vec![0, 0]);
    }

    #[test]
    fn end_of_stream_token_stops_execution() {
        let mut machine = Machine::new(1);
        let tokens = vec![
            Token::single(TokenKind::IncCell),
            Token::end_of_stream(),
            Token::single(TokenKind::IncCell),
        ];
        machine.execute(tokens).unwrap();
        assert_eq!(machine.cells(), vec![1]);
    }

    #[test]
    fn input_out_of_bounds_does_not_consume_input() {
        let mut machine = Machine::new(0).with_input(Cursor::new(vec![9u8]));
        assert_eq!(
            machine.run_source(","),
            Err(RuntimeError::TapeBounds {
                at: 0,
                pointer: 0,
                size: 0
            })
        );
        let mut rest = Vec::new();
        machine.input.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![9]);
    }

    #[test]
    fn hook_runs_before_every_token_and_scan_step() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut machine = Machine::new(1).with_step_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), StepError>(())
        });
        // One call for `[`, then one per scan step over `+`, `.` and `]`.
        machine.execute(tokenize("[+.]")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn hook_failure_mid_scan_keeps_cursor_on_bracket() {
        let mut calls = 0;
        let mut machine = Machine::new(1).with_step_hook(move || {
            calls += 1;
            if calls == 3 {
                Err(StepError::Failed("stop".into()))
            } else {
                Ok(())
            }
        });
        assert_eq!(
            machine.execute(tokenize("[...]")),
            Err(RuntimeError::StepHook {
                at: 0,
                source: StepError::Failed("stop".into())
            })
        );
        assert_eq!(machine.cursor, 0);
    }

    #[test]
    fn hook_runs_before_every_backward_scan_step() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut machine = Machine::new(1).with_step_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), StepError>(())
        });
        // `+`, `[`, `-`, `]`, two scan steps back to `[`, then `[`, `-`, `]`.
        machine.execute(tokenize("++[-]")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 9);
        assert_eq!(machine.cells(), vec![0]);
    }

    #[test]
    fn hook_failure_mid_backward_scan_keeps_cursor_on_close() {
        let mut calls = 0;
        let mut machine = Machine::new(1).with_step_hook(move || {
            calls += 1;
            // Call 5 is the first scan step back from `]`, call 6 the second.
            if calls == 6 {
                Err(StepError::Cancelled)
            } else {
                Ok(())
            }
        });
        assert_eq!(
            machine.execute(tokenize("++[-]")),
            Err(RuntimeError::StepHook {
                at: 3,
                source: StepError::Cancelled
            })
        );
        assert_eq!(machine.cursor, 3);
        assert_eq!(machine.cells(), vec![1]);
    }

    #[test]
    fn hook_failure_on_first_backward_scan_step() {
        let mut calls = 0;
        let mut machine = Machine::new(1).with_step_hook(move || {
            calls += 1;
            if calls == 5 {
                Err(StepError::Cancelled)
            } else {
                Ok(())
            }
        });
        assert!(matches!(
            machine.execute(tokenize("++[-]")),
            Err(RuntimeError::StepHook { at: 3, .. })
        ));
        assert_eq!(machine.cursor, 3);
        assert_eq!(machine.cells(), vec![1]);
    }

    #[test]
    fn output_writes_low_byte() {
        let out = OutputBuffer::new();
        let mut machine = Machine::new(1).with_output(out.clone());
        machine
            .execute(vec![
                Token::new(TokenKind::IncCell, 321),
                Token::single(TokenKind::Output),
            ])
            .unwrap();
        assert_eq!(out.contents(), vec![(321 % 256) as u8]);
    }

    #[test]
    fn distance_saturates() {
        assert_eq!(distance(3), 3);
        assert_eq!(distance(usize::MAX), isize::MAX);
    }
}
