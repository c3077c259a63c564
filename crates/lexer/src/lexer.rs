//! Run-length collapsing scanner.

use crate::token::{Token, TokenKind};

/// Bytes removed before scanning. They are source formatting only.
const FORMATTING: [u8; 3] = [b'\n', b'\r', b' '];

/// Scans instruction text into [`Token`]s.
///
/// A batch lexer is built once with a whole program ([`Lexer::new`]). A
/// REPL lexer starts empty ([`Lexer::repl`]) and is handed fresh text on
/// every [`Lexer::read`]; the same instance is reused across submissions.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    input: Vec<u8>,
    position: usize,
}

impl Lexer {
    /// Create a batch lexer over a whole program.
    pub fn new(text: &str) -> Self {
        Self {
            input: normalize(text),
            position: 0,
        }
    }

    /// Create an empty lexer for incremental use.
    pub fn repl() -> Self {
        Self::default()
    }

    /// Replace the input with `text`, rewind, and return all of its tokens.
    pub fn read(&mut self, text: &str) -> Vec<Token> {
        self.input = normalize(text);
        self.zero();
        self.tokens()
    }

    /// Rewind the scan position to the start of the input.
    pub fn zero(&mut self) {
        self.position = 0;
    }

    /// Current scan position in the normalized input.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Drain every remaining token up to (not including) end of stream.
    pub fn tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if token.is_end() {
                return tokens;
            }
            tokens.push(token);
        }
    }

    /// Advance past the next token and return it.
    ///
    /// Unknown bytes are skipped. Once the input is exhausted every call
    /// returns the end-of-stream token.
    pub fn next_token(&mut self) -> Token {
        while let Some(&byte) = self.input.get(self.position) {
            let Some(kind) = TokenKind::from_byte(byte) else {
                self.position += 1;
                continue;
            };

            if !kind.is_collapsible() {
                self.position += 1;
                return Token::single(kind);
            }

            let begin = self.position;
            while self.input.get(self.position) == Some(&byte) {
                self.position += 1;
            }
            return Token::new(kind, self.position - begin);
        }

        Token::end_of_stream()
    }
}

fn normalize(text: &str) -> Vec<u8> {
    text.bytes().filter(|b| !FORMATTING.contains(b)).collect()
}
