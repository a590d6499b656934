//! Parser error type for callers that want a plain `Result`.

use thiserror::Error;

use crate::diag::Diagnostic;
use crate::span::{LineIndex, SourceSpan};

/// A syntax error with the offending token text and its 1-indexed
/// source position.
///
/// Produced from the first error [`Diagnostic`] of a parse; the full
/// diagnostic list is available through `parse_sparql` when more
/// detail is needed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at line {line}, column {column}: {message}")]
pub struct SyntaxError {
    /// What went wrong
    pub message: String,
    /// Text of the offending token, if the error points at one
    pub token: Option<String>,
    /// 1-indexed line of the error
    pub line: u32,
    /// 1-indexed column of the error
    pub column: u32,
    /// Byte span in the original query text
    pub span: SourceSpan,
}

/// Result alias for parse entry points.
pub type Result<T> = std::result::Result<T, SyntaxError>;

impl SyntaxError {
    pub(crate) fn from_diagnostic(diag: &Diagnostic, source: &str, index: &LineIndex) -> Self {
        let loc = index.line_col(diag.span.start);
        let token = diag.span.slice(source);
        Self {
            message: diag.message.clone(),
            token: if token.is_empty() {
                None
            } else {
                Some(token.to_string())
            },
            line: loc.line,
            column: loc.col,
            span: diag.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::DiagCode;

    #[test]
    fn carries_token_text_and_location() {
        let source = "SELECT ?x FROM";
        let index = LineIndex::new(source);
        let diag = Diagnostic::error(
            DiagCode::UnexpectedToken,
            "Unexpected token",
            SourceSpan::new(10, 14),
        );
        let err = SyntaxError::from_diagnostic(&diag, source, &index);
        assert_eq!(err.token.as_deref(), Some("FROM"));
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 11);
        assert_eq!(
            err.to_string(),
            "syntax error at line 1, column 11: Unexpected token"
        );
    }
}
