//! Token kinds and run-length tokens for the tape language.

use std::fmt;

/// Identifies the instruction a token stands for.
///
/// The eight instruction kinds map one-to-one onto source characters.
/// `EndOfStream` is never part of a token list; the lexer hands it out
/// once its input is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `>`: move the pointer right.
    MoveRight,
    /// `<`: move the pointer left.
    MoveLeft,
    /// `+`: increment the current cell.
    IncCell,
    /// `-`: decrement the current cell.
    DecCell,
    /// `.`: write the current cell to the output sink.
    Output,
    /// `,`: read one byte from the input sink into the current cell.
    Input,
    /// `[`: enter the loop body if the current cell is non-zero.
    LoopOpen,
    /// `]`: jump back to the matching `[` if the current cell is non-zero.
    LoopClose,
    /// No more input.
    EndOfStream,
}

/// All instruction kinds, in definition order. `EndOfStream` is excluded.
pub const ALL_INSTRUCTIONS: [TokenKind; 8] = [
    TokenKind::MoveRight,
    TokenKind::MoveLeft,
    TokenKind::IncCell,
    TokenKind::DecCell,
    TokenKind::Output,
    TokenKind::Input,
    TokenKind::LoopOpen,
    TokenKind::LoopClose,
];

impl TokenKind {
    /// Map a source byte to its instruction kind.
    ///
    /// Returns `None` for every byte outside the instruction set.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'>' => Some(TokenKind::MoveRight),
            b'<' => Some(TokenKind::MoveLeft),
            b'+' => Some(TokenKind::IncCell),
            b'-' => Some(TokenKind::DecCell),
            b'.' => Some(TokenKind::Output),
            b',' => Some(TokenKind::Input),
            b'[' => Some(TokenKind::LoopOpen),
            b']' => Some(TokenKind::LoopClose),
            _ => None,
        }
    }

    /// Returns the source symbol for this kind.
    pub fn symbol(&self) -> &'static str {
        match self {
            TokenKind::MoveRight => ">",
            TokenKind::MoveLeft => "<",
            TokenKind::IncCell => "+",
            TokenKind::DecCell => "-",
            TokenKind::Output => ".",
            TokenKind::Input => ",",
            TokenKind::LoopOpen => "[",
            TokenKind::LoopClose => "]",
            TokenKind::EndOfStream => "EOF",
        }
    }

    /// Whether consecutive occurrences of this kind merge into one token.
    ///
    /// Only pointer movement and cell arithmetic are additive. I/O and
    /// loop brackets keep one token per character.
    pub fn is_collapsible(&self) -> bool {
        matches!(
            self,
            TokenKind::MoveRight | TokenKind::MoveLeft | TokenKind::IncCell | TokenKind::DecCell
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One instruction with the number of consecutive source characters it
/// stands for. `repeat` is always at least 1, and exactly 1 for kinds that
/// never collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub repeat: usize,
}

impl Token {
    /// Create a token. A `repeat` of zero is raised to one; kinds that
    /// never collapse always get one.
    pub fn new(kind: TokenKind, repeat: usize) -> Self {
        let repeat = if kind.is_collapsible() {
            repeat.max(1)
        } else {
            1
        };
        Self { kind, repeat }
    }

    /// A single, uncollapsed occurrence of `kind`.
    pub fn single(kind: TokenKind) -> Self {
        Self::new(kind, 1)
    }

    /// The end-of-stream marker.
    pub fn end_of_stream() -> Self {
        Self::single(TokenKind::EndOfStream)
    }

    /// Returns true for the end-of-stream marker.
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfStream
    }
}

/// Renders the token as the source text it was collapsed from.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            return f.write_str(self.kind.symbol());
        }
        for _ in 0..self.repeat {
            f.write_str(self.kind.symbol())?;
        }
        Ok(())
    }
}
