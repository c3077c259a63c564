//! Tokenizer for the eight-instruction tape language.
//!
//! This crate turns instruction text into an ordered list of [`Token`]s:
//!
//! - [`TokenKind`] — the eight instructions plus an end-of-stream marker
//! - [`Token`] — a kind with the number of consecutive characters it covers
//! - [`Lexer`] — the scanner, in batch or REPL mode
//! - [`TokenizeError`] — strict-mode validation errors
//!
//! Runs of `>`, `<`, `+` and `-` collapse into one token. `.`, `,`, `[`
//! and `]` always produce one token per character. Newlines, carriage
//! returns and spaces are stripped first; any other unknown character is
//! skipped.
//!
//! # Usage
//!
//! ```
//! use bfcc_lexer::{tokenize, Token, TokenKind};
//!
//! let tokens = tokenize("+++++[-]");
//! assert_eq!(tokens[0], Token::new(TokenKind::IncCell, 5));
//! assert_eq!(tokens.len(), 4);
//! ```

pub mod error;
pub mod lexer;
pub mod token;

pub use error::TokenizeError;
pub use lexer::Lexer;
pub use token::{Token, TokenKind, ALL_INSTRUCTIONS};

/// Tokenize a whole program.
pub fn tokenize(text: &str) -> Vec<Token> {
    Lexer::new(text).tokens()
}

/// Check that `text` contains only instructions and stripped formatting.
///
/// Returns the first offending character. Positions count characters in
/// the original text.
pub fn validate(text: &str) -> Result<(), TokenizeError> {
    for (position, found) in text.chars().enumerate() {
        let known = matches!(found, '\n' | '\r' | ' ')
            || (found.is_ascii() && TokenKind::from_byte(found as u8).is_some());
        if !known {
            return Err(TokenizeError::UnknownInstruction { position, found });
        }
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy that generates text drawn mostly from the instruction set.
    fn arb_source() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop::sample::select(vec!['>', '<', '+', '-', '.', ',', '[', ']', ' ', '\n', 'x']),
            0..200,
        )
        .prop_map(|chars| chars.into_iter().collect())
    }

    proptest! {
        /// Tokenizing the same text twice yields identical sequences.
        #[test]
        fn tokenize_is_deterministic(src in arb_source()) {
            prop_assert_eq!(tokenize(&src), tokenize(&src));
        }

        /// Collapsing only ever reduces the count.
        #[test]
        fn token_count_bounded_by_length(src in arb_source()) {
            prop_assert!(tokenize(&src).len() <= src.len());
        }

        /// Every token has a positive repeat, and non-collapsible kinds
        /// always repeat exactly once.
        #[test]
        fn repeat_invariants(src in arb_source()) {
            for token in tokenize(&src) {
                prop_assert!(token.repeat >= 1);
                prop_assert!(!token.is_end());
                if !token.kind.is_collapsible() {
                    prop_assert_eq!(token.repeat, 1);
                }
            }
        }

        /// Expanding the tokens reproduces the instruction characters of
        /// the source in order.
        #[test]
        fn expansion_preserves_instructions(src in arb_source()) {
            let expanded: String = tokenize(&src).iter().map(|t| t.to_string()).collect();
            let instructions: String = src
                .chars()
                .filter(|c| "><+-.,[]".contains(*c))
                .collect();
            prop_assert_eq!(expanded, instructions);
        }

        /// A maximal run of k identical collapsible characters yields
        /// exactly one token with repeat k.
        #[test]
        fn maximal_run_collapses(
            kind in prop::sample::select(ALL_INSTRUCTIONS[..4].to_vec()),
            k in 1usize..500,
        ) {
            let src = kind.symbol().repeat(k);
            prop_assert_eq!(tokenize(&src), vec![Token::new(kind, k)]);
        }
    }
}
