//! Recursive-descent SPARQL query parser.
//!
//! The parser turns a token stream into a [`Query`] AST, collecting
//! diagnostics along the way instead of failing on the first error
//! where recovery is possible. The entry point is [`parse_sparql`].
//!
//! Parsing is split across submodules by grammar area:
//! - [`select`]: SELECT queries and projections
//! - [`construct`]: CONSTRUCT and ASK queries
//! - [`pattern`]: WHERE clauses and group graph patterns
//! - [`term`]: triple patterns and RDF terms
//! - [`modifier`]: GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET

mod construct;
mod modifier;
mod pattern;
mod select;
mod term;

#[cfg(test)]
mod tests;

use crate::ast::{BaseDecl, GraphPattern, PrefixDecl, Prologue, Query, QueryBody, TriplePattern};
use crate::diag::{DiagCode, Diagnostic, ParseOutput};
use crate::lex::{tokenize, TokenKind};

use super::stream::TokenStream;

/// Parse a SPARQL query string into an AST plus diagnostics.
///
/// Lexing never fails; invalid characters surface here as diagnostics.
/// The returned [`ParseOutput`] carries an AST only when no error was
/// recorded, so callers can trust `ast` to be a complete query.
pub fn parse_sparql(source: &str) -> ParseOutput<Query> {
    let tokens = tokenize(source);

    // Report lexer errors up front. Parsing past garbage tokens would
    // only pile up confusing follow-on diagnostics.
    let lex_errors: Vec<Diagnostic> = tokens
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::Error(message) => {
                let code = if message.contains("unterminated string") {
                    DiagCode::UnterminatedString
                } else {
                    DiagCode::UnexpectedToken
                };
                Some(Diagnostic::error(code, message.as_ref(), token.span))
            }
            _ => None,
        })
        .collect();

    if !lex_errors.is_empty() {
        return ParseOutput::with_diagnostics(None, lex_errors);
    }

    let mut stream = TokenStream::new(tokens);
    let mut parser = Parser {
        stream: &mut stream,
    };

    let ast = parser.parse_query();
    let diagnostics = stream.take_diagnostics();

    let has_errors = diagnostics.iter().any(Diagnostic::is_error);
    ParseOutput::with_diagnostics(if has_errors { None } else { ast }, diagnostics)
}

/// The query parser.
///
/// Methods are spread across this module's submodules; each grammar
/// area extends `Parser` with its own `impl` block.
struct Parser<'a> {
    stream: &'a mut TokenStream,
}

impl<'a> Parser<'a> {
    /// Parse a complete query: prologue, body, end of input.
    fn parse_query(&mut self) -> Option<Query> {
        let start = self.stream.current_span();

        let prologue = self.parse_prologue()?;
        let body = self.parse_query_body()?;

        if !self.stream.is_eof() {
            self.stream.error_unexpected("query");
            return None;
        }

        let span = start.union(self.stream.previous_span());
        Some(Query::new(prologue, body, span))
    }

    /// Parse the prologue: any number of BASE and PREFIX declarations.
    fn parse_prologue(&mut self) -> Option<Prologue> {
        let mut prologue = Prologue::new();

        loop {
            if self.stream.check_keyword(TokenKind::KwBase) {
                let start = self.stream.current_span();
                self.stream.advance();

                match self.stream.consume_iri() {
                    Some((iri, iri_span)) => {
                        prologue.base = Some(BaseDecl::new(iri, start.union(iri_span)));
                    }
                    None => {
                        self.stream.add_diagnostic(Diagnostic::error(
                            DiagCode::InvalidIri,
                            "expected IRI after BASE",
                            self.stream.current_span(),
                        ));
                        return None;
                    }
                }
            } else if self.stream.check_keyword(TokenKind::KwPrefix) {
                let start = self.stream.current_span();
                self.stream.advance();

                let prefix = match self.stream.consume_prefixed_name_ns() {
                    Some((prefix, _)) => prefix,
                    None => {
                        self.stream
                            .error_at_current("expected prefix name (like `ex:`) after PREFIX");
                        return None;
                    }
                };

                match self.stream.consume_iri() {
                    Some((iri, iri_span)) => {
                        prologue.prefixes.push(PrefixDecl::new(
                            prefix,
                            iri,
                            start.union(iri_span),
                        ));
                    }
                    None => {
                        self.stream.add_diagnostic(Diagnostic::error(
                            DiagCode::InvalidIri,
                            format!("expected IRI after prefix `{prefix}:`"),
                            self.stream.current_span(),
                        ));
                        return None;
                    }
                }
            } else {
                break;
            }
        }

        Some(prologue)
    }

    /// Dispatch on the query form keyword.
    fn parse_query_body(&mut self) -> Option<QueryBody> {
        if self.stream.check_keyword(TokenKind::KwSelect) {
            self.parse_select_query().map(QueryBody::Select)
        } else if self.stream.check_keyword(TokenKind::KwConstruct) {
            self.parse_construct_query().map(QueryBody::Construct)
        } else if self.stream.check_keyword(TokenKind::KwAsk) {
            self.parse_ask_query().map(QueryBody::Ask)
        } else if self.stream.check_keyword(TokenKind::KwDescribe) {
            self.unsupported_here(
                "DESCRIBE queries are not supported",
                "use SELECT to retrieve bindings or CONSTRUCT to build triples",
            );
            None
        } else {
            self.stream
                .error_at_current("expected query form (SELECT, CONSTRUCT, or ASK)");
            None
        }
    }
}

/// Move accumulated triple patterns into the pattern list as a BGP.
fn flush_current_triples(current: &mut Vec<TriplePattern>, patterns: &mut Vec<GraphPattern>) {
    if current.is_empty() {
        return;
    }
    let triples = std::mem::take(current);
    let span = term::span_of_triples(&triples);
    patterns.push(GraphPattern::Bgp {
        patterns: triples,
        span,
    });
}
