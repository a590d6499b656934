//! Diagnostic types for SPARQL parsing errors and warnings.
//!
//! This module provides structured diagnostics with:
//! - Stable error codes for programmatic handling
//! - Precise source spans for error locations
//! - Actionable help text with suggested rewrites
//! - JSON serialization for API responses

mod render;

pub use render::{render_diagnostic, render_diagnostics};

use crate::error::SyntaxError;
use crate::span::{LineIndex, SourceSpan};
use serde::{Deserialize, Serialize};

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unrecoverable error - query cannot be executed
    Error,
    /// Warning - query can execute but may have issues
    Warning,
    /// Informational note
    Note,
}

impl Severity {
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// Stable error codes for diagnostics.
///
/// Organized by category:
/// - `S0xx`: Syntax errors (lexer and parser level)
/// - `E0xx`: Engine restrictions - "this SPARQL feature is not supported"
/// - `W0xx`: Warnings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DiagCode {
    /// Expected a specific token
    #[serde(rename = "S001")]
    ExpectedToken,

    /// String literal not terminated
    #[serde(rename = "S002")]
    UnterminatedString,

    /// Invalid numeric literal
    #[serde(rename = "S003")]
    InvalidNumericLiteral,

    /// Invalid IRI syntax
    #[serde(rename = "S004")]
    InvalidIri,

    /// Unexpected end of input
    #[serde(rename = "S005")]
    UnexpectedEof,

    /// Token cannot appear here
    #[serde(rename = "S006")]
    UnexpectedToken,

    /// SPARQL feature outside the supported subset
    #[serde(rename = "E001")]
    UnsupportedFeature,

    /// Function name not recognized
    #[serde(rename = "E002")]
    UnknownFunction,

    /// REDUCED is accepted but performs no duplicate elimination
    #[serde(rename = "W001")]
    ReducedHasNoEffect,
}

impl DiagCode {
    /// Get the string code (e.g., "S001", "E002").
    pub fn code(&self) -> &'static str {
        match self {
            Self::ExpectedToken => "S001",
            Self::UnterminatedString => "S002",
            Self::InvalidNumericLiteral => "S003",
            Self::InvalidIri => "S004",
            Self::UnexpectedEof => "S005",
            Self::UnexpectedToken => "S006",
            Self::UnsupportedFeature => "E001",
            Self::UnknownFunction => "E002",
            Self::ReducedHasNoEffect => "W001",
        }
    }

    /// Get the default severity for this code.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::ReducedHasNoEffect => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl std::fmt::Display for DiagCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A labeled span within a diagnostic, giving context about a
/// secondary location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// The span this label covers
    pub span: SourceSpan,
    /// The label message
    pub message: String,
}

impl Label {
    pub fn new(span: impl Into<SourceSpan>, message: impl Into<String>) -> Self {
        Self {
            span: span.into(),
            message: message.into(),
        }
    }
}

/// A diagnostic message from the SPARQL parser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable error code
    pub code: DiagCode,

    /// Severity level
    pub severity: Severity,

    /// Primary message (one sentence)
    pub message: String,

    /// Primary source span
    pub span: SourceSpan,

    /// Additional labeled spans
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,

    /// Suggested fix or rewrite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Additional context or explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity.
    pub fn new(code: DiagCode, message: impl Into<String>, span: impl Into<SourceSpan>) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            span: span.into(),
            labels: Vec::new(),
            help: None,
            note: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(code: DiagCode, message: impl Into<String>, span: impl Into<SourceSpan>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::new(code, message, span)
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(
        code: DiagCode,
        message: impl Into<String>,
        span: impl Into<SourceSpan>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::new(code, message, span)
        }
    }

    /// Add a labeled span.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }
}

/// Result of parsing, including AST and diagnostics.
///
/// The AST is present only when parsing produced a complete query; a
/// query with any error diagnostic never yields a partial AST.
#[derive(Debug)]
pub struct ParseOutput<T> {
    /// The parsed AST (if parsing succeeded)
    pub ast: Option<T>,
    /// All diagnostics emitted during parsing
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> ParseOutput<T> {
    /// Create a successful parse output.
    pub fn success(ast: T) -> Self {
        Self {
            ast: Some(ast),
            diagnostics: Vec::new(),
        }
    }

    /// Create a parse output with an AST and diagnostics.
    pub fn with_diagnostics(ast: Option<T>, diagnostics: Vec<Diagnostic>) -> Self {
        Self { ast, diagnostics }
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Get just the errors.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Get just the warnings.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    /// Collapse into a plain `Result`, converting the first error
    /// diagnostic into a [`SyntaxError`] located against `source`.
    pub fn into_result(self, source: &str) -> Result<T, SyntaxError> {
        if let Some(first) = self.errors().next() {
            let index = LineIndex::new(source);
            return Err(SyntaxError::from_diagnostic(first, source, &index));
        }
        match self.ast {
            Some(ast) => Ok(ast),
            None => {
                // No error diagnostic but no AST either; report the
                // whole input as unparseable.
                let index = LineIndex::new(source);
                let diag = Diagnostic::error(
                    DiagCode::UnexpectedEof,
                    "Query could not be parsed",
                    SourceSpan::point(source.len()),
                );
                Err(SyntaxError::from_diagnostic(&diag, source, &index))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diag_code_string() {
        assert_eq!(DiagCode::ExpectedToken.code(), "S001");
        assert_eq!(DiagCode::UnsupportedFeature.code(), "E001");
        assert_eq!(DiagCode::ReducedHasNoEffect.code(), "W001");
    }

    #[test]
    fn test_default_severity() {
        assert!(DiagCode::UnexpectedToken.default_severity().is_error());
        assert_eq!(
            DiagCode::ReducedHasNoEffect.default_severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::error(
            DiagCode::UnsupportedFeature,
            "MINUS is not supported",
            SourceSpan::new(10, 15),
        )
        .with_label(Label::new(SourceSpan::new(10, 15), "unsupported keyword"))
        .with_help("Filter with !BOUND over an OPTIONAL instead")
        .with_note("Supported patterns: triples, FILTER, OPTIONAL, UNION, BIND");

        assert!(diag.is_error());
        assert_eq!(diag.labels.len(), 1);
        assert!(diag.help.is_some());
        assert!(diag.note.is_some());
    }

    #[test]
    fn test_diagnostic_json() {
        let diag = Diagnostic::error(
            DiagCode::ExpectedToken,
            "Expected 'WHERE'",
            SourceSpan::new(10, 15),
        );

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"code\":\"S001\""));
        assert!(json.contains("\"severity\":\"error\""));
    }

    #[test]
    fn test_parse_output() {
        let output: ParseOutput<String> = ParseOutput::with_diagnostics(
            None,
            vec![
                Diagnostic::error(DiagCode::ExpectedToken, "error", SourceSpan::new(0, 1)),
                Diagnostic::warning(DiagCode::ReducedHasNoEffect, "warning", SourceSpan::new(5, 6)),
            ],
        );

        assert!(output.has_errors());
        assert_eq!(output.errors().count(), 1);
        assert_eq!(output.warnings().count(), 1);
    }

    #[test]
    fn test_into_result_reports_first_error() {
        let source = "SELECT ?x\nWHERE { ?s }";
        let output: ParseOutput<()> = ParseOutput::with_diagnostics(
            None,
            vec![Diagnostic::error(
                DiagCode::ExpectedToken,
                "Expected object",
                SourceSpan::new(21, 22),
            )],
        );
        let err = output.into_result(source).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 12);
    }
}
