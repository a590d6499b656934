//! SPARQL parsing.
//!
//! Recursive-descent parsing over the token stream produced by
//! [`crate::lex`]. The grammar is split in two:
//! - [`expr`]: expressions, with precedence climbing
//! - `query`: everything else (query forms, patterns, modifiers)
//!
//! The parser records diagnostics instead of returning on the first
//! error wherever it can keep going, so one parse reports as many
//! problems as possible.

pub mod expr;

mod query;
mod stream;

pub use query::parse_sparql;
pub use stream::TokenStream;
