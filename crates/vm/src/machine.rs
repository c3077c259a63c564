//! Machine state: tape, token list, cursor, I/O endpoints, step hook.

use crate::step::StepHook;
use crate::tape::{Cell, CellFormat, Tape, TapeView};
use bfcc_lexer::{Lexer, Token};
use std::fmt;
use std::io::{self, Read, Write};

/// The tape machine.
///
/// Cells and pointer live for as long as the machine does. Each
/// [`Machine::execute`] or [`Machine::evaluate`] call replaces the token
/// list and rewinds the cursor; nothing else is reset.
///
/// Input defaults to an empty reader and output to a sink that discards
/// everything.
pub struct Machine {
    /// Cells and pointer, shared with [`TapeView`]s.
    pub(crate) tape: Tape,
    /// Tokens of the program being executed.
    pub(crate) tokens: Vec<Token>,
    /// Index of the next token to evaluate.
    pub(crate) cursor: usize,
    pub(crate) input: Box<dyn Read + Send>,
    pub(crate) output: Box<dyn Write + Send>,
    /// Runs before every transition when set.
    pub(crate) hook: Option<Box<dyn StepHook>>,
    /// Present only on machines built with [`Machine::repl`].
    pub(crate) repl: Option<Lexer>,
}

impl Machine {
    /// Create a machine with `tape_size` zeroed cells.
    pub fn new(tape_size: usize) -> Self {
        Self {
            tape: Tape::new(tape_size),
            tokens: Vec::new(),
            cursor: 0,
            input: Box::new(io::empty()),
            output: Box::new(io::sink()),
            hook: None,
            repl: None,
        }
    }

    /// Create a machine wired for incremental evaluation.
    pub fn repl(tape_size: usize) -> Self {
        Self {
            repl: Some(Lexer::repl()),
            ..Self::new(tape_size)
        }
    }

    pub fn with_input(mut self, input: impl Read + Send + 'static) -> Self {
        self.set_input(input);
        self
    }

    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.set_output(output);
        self
    }

    pub fn with_step_hook(mut self, hook: impl StepHook + 'static) -> Self {
        self.set_step_hook(hook);
        self
    }

    pub fn set_input(&mut self, input: impl Read + Send + 'static) {
        self.input = Box::new(input);
    }

    pub fn set_output(&mut self, output: impl Write + Send + 'static) {
        self.output = Box::new(output);
    }

    /// Install a hook to run before every transition, replacing any
    /// previous one.
    pub fn set_step_hook(&mut self, hook: impl StepHook + 'static) {
        self.hook = Some(Box::new(hook));
    }

    /// Run at full speed again.
    pub fn clear_step_hook(&mut self) {
        self.hook = None;
    }

    /// Whether [`Machine::evaluate`] is available.
    pub fn is_session(&self) -> bool {
        self.repl.is_some()
    }

    /// Index of the active cell.
    pub fn pointer(&self) -> usize {
        self.tape.pointer()
    }

    pub fn tape_size(&self) -> usize {
        self.tape.view().len()
    }

    /// Copy of all cells.
    pub fn cells(&self) -> Vec<Cell> {
        self.tape.view().snapshot().cells
    }

    /// The token list of the most recent run.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// A handle for reading the tape from other threads while this
    /// machine runs.
    pub fn view(&self) -> TapeView {
        self.tape.view()
    }

    /// Dump the tape. See [`crate::TapeSnapshot::render`].
    pub fn render(&self, format: CellFormat, wrap: usize) -> String {
        self.tape.view().render(format, wrap)
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("tape_size", &self.tape_size())
            .field("pointer", &self.pointer())
            .field("tokens", &self.tokens.len())
            .field("cursor", &self.cursor)
            .field("stepped", &self.hook.is_some())
            .field("session", &self.is_session())
            .finish()
    }
}
