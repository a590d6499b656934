//! Token stream for parsing.
//!
//! The `TokenStream` wraps the lexer output and provides:
//! - Lookahead (peeking) without consuming tokens
//! - Position tracking for error recovery
//! - Convenient matching and consuming methods
//! - Diagnostic collection for errors

use crate::diag::{DiagCode, Diagnostic};
use crate::lex::{Token, TokenKind};
use crate::span::SourceSpan;
use std::sync::Arc;

/// A stream of tokens for parsing.
///
/// Provides lookahead, matching, and error recovery utilities.
#[derive(Debug)]
pub struct TokenStream {
    /// The tokens to parse
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// Collected diagnostics
    diagnostics: Vec<Diagnostic>,
}

impl TokenStream {
    /// Create a new token stream from a vector of tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Get the current position in the stream.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Restore a previously saved position (for bounded backtracking).
    pub fn restore(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Get collected diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take the collected diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Add a diagnostic.
    pub fn add_diagnostic(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    /// True if any collected diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Check if at end of stream (only EOF remains).
    pub fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream always ends with EOF")
        })
    }

    /// Peek at the nth token ahead (0 = current).
    pub fn peek_n(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream always ends with EOF")
        })
    }

    /// Get the span of the current token.
    pub fn current_span(&self) -> SourceSpan {
        self.peek().span
    }

    /// Get the span of the previous token (for end-of-construct spans).
    pub fn previous_span(&self) -> SourceSpan {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            SourceSpan::point(0)
        }
    }

    /// Advance to the next token. EOF is sticky.
    pub fn advance(&mut self) {
        if !self.is_eof() {
            self.pos += 1;
        }
    }

    /// Consume the current token and return it (owned).
    pub fn consume(&mut self) -> Token {
        let token = self.peek().clone();
        self.advance();
        token
    }

    /// Check if the current token matches the expected kind, ignoring
    /// payloads.
    pub fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    /// Check if the current token is a specific keyword.
    pub fn check_keyword(&self, kw: TokenKind) -> bool {
        self.peek().kind == kw
    }

    /// Consume the current token if it matches, returning true.
    pub fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it's the expected keyword.
    pub fn match_keyword(&mut self, kw: TokenKind) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect and consume a specific token kind, or emit an error.
    ///
    /// Returns the token if matched, or None after recording the
    /// diagnostic.
    pub fn expect(&mut self, kind: &TokenKind, message: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.consume())
        } else {
            self.error_at_current(message);
            None
        }
    }

    /// Add an "expected ..." error at the current token position.
    pub fn error_at_current(&mut self, message: &str) {
        let span = self.current_span();
        self.error_at(message, span);
    }

    /// Add an "expected ..." error at a specific span.
    pub fn error_at(&mut self, message: &str, span: SourceSpan) {
        let code = if self.is_eof() {
            DiagCode::UnexpectedEof
        } else {
            DiagCode::ExpectedToken
        };
        self.add_diagnostic(Diagnostic::error(code, message.to_string(), span));
    }

    /// Add an "unexpected token" error at the current position.
    pub fn error_unexpected(&mut self, context: &str) {
        let token = self.peek();
        let (code, message) = if token.is_eof() {
            (
                DiagCode::UnexpectedEof,
                format!("unexpected end of input in {}", context),
            )
        } else {
            (
                DiagCode::UnexpectedToken,
                format!("unexpected token `{}` in {}", token.kind, context),
            )
        };
        let span = token.span;
        self.add_diagnostic(Diagnostic::error(code, message, span));
    }

    /// Skip tokens until one of the recovery points (or EOF).
    pub fn synchronize(&mut self, recovery_tokens: &[TokenKind]) {
        while !self.is_eof() {
            let current = &self.peek().kind;
            for recovery in recovery_tokens {
                if std::mem::discriminant(current) == std::mem::discriminant(recovery) {
                    return;
                }
            }
            self.advance();
        }
    }

    // =========================================================================
    // Convenience methods for common token patterns
    // =========================================================================

    /// Consume and return a variable name if the current token is a variable.
    pub fn consume_var(&mut self) -> Option<(Arc<str>, SourceSpan)> {
        match &self.peek().kind {
            TokenKind::Var(_) => {
                let token = self.consume();
                match token.kind {
                    TokenKind::Var(name) => Some((name, token.span)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Consume and return an IRI if the current token is an IRI.
    pub fn consume_iri(&mut self) -> Option<(Arc<str>, SourceSpan)> {
        match &self.peek().kind {
            TokenKind::Iri(_) => {
                let token = self.consume();
                match token.kind {
                    TokenKind::Iri(iri) => Some((iri, token.span)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Consume and return a prefixed name if the current token is one.
    pub fn consume_prefixed_name(&mut self) -> Option<(Arc<str>, Arc<str>, SourceSpan)> {
        match &self.peek().kind {
            TokenKind::PrefixedName { .. } => {
                let token = self.consume();
                match token.kind {
                    TokenKind::PrefixedName { prefix, local } => {
                        Some((prefix, local, token.span))
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Consume and return a bare namespace (`prefix:`) if the current
    /// token is one.
    pub fn consume_prefixed_name_ns(&mut self) -> Option<(Arc<str>, SourceSpan)> {
        match &self.peek().kind {
            TokenKind::PrefixedNameNs(_) => {
                let token = self.consume();
                match token.kind {
                    TokenKind::PrefixedNameNs(prefix) => Some((prefix, token.span)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Consume and return an integer if the current token is one.
    pub fn consume_integer(&mut self) -> Option<(i64, SourceSpan)> {
        match &self.peek().kind {
            TokenKind::Integer(_) => {
                let token = self.consume();
                match token.kind {
                    TokenKind::Integer(n) => Some((n, token.span)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Consume and return a string if the current token is one.
    pub fn consume_string(&mut self) -> Option<(Arc<str>, SourceSpan)> {
        match &self.peek().kind {
            TokenKind::String(_) => {
                let token = self.consume();
                match token.kind {
                    TokenKind::String(s) => Some((s, token.span)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Consume and return a decimal if the current token is one.
    pub fn consume_decimal(&mut self) -> Option<(Arc<str>, SourceSpan)> {
        match &self.peek().kind {
            TokenKind::Decimal(_) => {
                let token = self.consume();
                match token.kind {
                    TokenKind::Decimal(s) => Some((s, token.span)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Consume and return a double if the current token is one.
    pub fn consume_double(&mut self) -> Option<(f64, SourceSpan)> {
        match &self.peek().kind {
            TokenKind::Double(_) => {
                let token = self.consume();
                match token.kind {
                    TokenKind::Double(n) => Some((n, token.span)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Consume and return a language tag if the current token is one.
    pub fn consume_lang_tag(&mut self) -> Option<(Arc<str>, SourceSpan)> {
        match &self.peek().kind {
            TokenKind::LangTag(_) => {
                let token = self.consume();
                match token.kind {
                    TokenKind::LangTag(s) => Some((s, token.span)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Check if the current token can start a term (subject,
    /// predicate, or object).
    pub fn is_term_start(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Var(_)
                | TokenKind::Iri(_)
                | TokenKind::PrefixedName { .. }
                | TokenKind::PrefixedNameNs(_)
                | TokenKind::String(_)
                | TokenKind::Integer(_)
                | TokenKind::Decimal(_)
                | TokenKind::Double(_)
                | TokenKind::BlankNodeLabel(_)
                | TokenKind::KwTrue
                | TokenKind::KwFalse
                | TokenKind::KwA
        )
    }
}
