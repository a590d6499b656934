//! SPARQL subset parser with spanned ASTs and structured diagnostics.
//!
//! This crate turns SPARQL text into a [`ast::Query`]: SELECT,
//! CONSTRUCT, and ASK forms over basic graph patterns with OPTIONAL,
//! UNION, FILTER, BIND, aggregation, and the usual solution modifiers.
//! Recognized-but-unsupported SPARQL (property paths, VALUES, MINUS,
//! named graphs, subqueries, DESCRIBE) is rejected with targeted
//! diagnostics rather than generic parse errors.
//!
//! Every AST node carries a [`span::SourceSpan`] back into the query
//! text, and all problems are reported as [`diag::Diagnostic`] values
//! with stable codes, so callers can render errors however they like.
//!
//! ## Usage
//!
//! ```
//! let query = trestle_sparql::parse("SELECT ?s WHERE { ?s ?p ?o }")?;
//! # Ok::<(), trestle_sparql::SyntaxError>(())
//! ```
//!
//! [`parse`] collapses diagnostics into a single [`SyntaxError`]. Use
//! [`parse_sparql`] to get the full diagnostic list, including
//! warnings for accepted-but-inert syntax such as `REDUCED`.

pub mod ast;
pub mod diag;
pub mod error;
pub mod lex;
pub mod parse;
pub mod span;

pub use diag::{DiagCode, Diagnostic, ParseOutput, Severity};
pub use error::{Result, SyntaxError};
pub use parse::parse_sparql;
pub use span::{LineIndex, SourceSpan};

use ast::Query;

/// Parse a SPARQL query, reporting the first error as a [`SyntaxError`].
pub fn parse(source: &str) -> Result<Query> {
    let output = parse_sparql(source);
    tracing::debug!(
        errors = output.errors().count(),
        warnings = output.warnings().count(),
        "parsed query"
    );
    output.into_result(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_returns_query() {
        let query = parse("SELECT ?s WHERE { ?s ?p ?o }").expect("valid query");
        assert!(matches!(query.body, ast::QueryBody::Select(_)));
    }

    #[test]
    fn parse_surfaces_first_error_with_location() {
        let err = parse("SELECT ?s WHERE { ?s ?p }").expect_err("incomplete triple");
        assert_eq!(err.line, 1);
        assert!(err.column > 1);
    }
}
