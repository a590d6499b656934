//! SPARQL lexical analysis.
//!
//! This module handles tokenization of SPARQL queries, producing a
//! stream of tokens with source spans. The parser then consumes these
//! tokens.
//!
//! ## Design
//!
//! SPARQL lexing is non-trivial due to:
//! - Comments (single-line `#` style)
//! - String escaping (single/double quotes, long strings)
//! - IRIs vs. the `<` comparison operator
//! - Prefixed names (PN_CHARS rules, namespace:local)
//! - Keyword vs. prefix ambiguity (`a` is both keyword and valid prefix)
//! - Numeric formats (integer, decimal, exponent notation)
//!
//! Uses winnow for all tokenization. Invalid input becomes `Error`
//! tokens rather than aborting the lexer, so the parser can report
//! every problem with a precise span.

mod lexer;
mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{keyword_from_str, Token, TokenKind};
