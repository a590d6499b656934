//! Term parsing: subjects, predicates, objects, IRIs, literals, blank
//! nodes.

use crate::ast::{
    BlankNode, Iri, Literal, ObjectTerm, PredicateTerm, SubjectTerm, Term, TriplePattern, Var,
};
use crate::diag::{DiagCode, Diagnostic};
use crate::lex::TokenKind;
use crate::span::SourceSpan;

impl<'a> super::Parser<'a> {
    /// Parse a subject term.
    pub(super) fn parse_subject(&mut self) -> Option<SubjectTerm> {
        if let Some((name, span)) = self.stream.consume_var() {
            return Some(SubjectTerm::Var(Var::new(name, span)));
        }

        if let Some(iri) = self.parse_iri_term() {
            return Some(SubjectTerm::Iri(iri));
        }

        if let Some(bnode) = self.parse_blank_node() {
            return Some(SubjectTerm::BlankNode(bnode));
        }

        self.stream.error_unexpected("subject position");
        None
    }

    /// Parse a predicate: `a`, a variable, or an IRI.
    pub(super) fn parse_predicate(&mut self) -> Option<PredicateTerm> {
        if self.stream.check_keyword(TokenKind::KwA) {
            let span = self.stream.current_span();
            self.stream.advance();
            return Some(PredicateTerm::Iri(Iri::rdf_type(span)));
        }

        if let Some((name, span)) = self.stream.consume_var() {
            return Some(PredicateTerm::Var(Var::new(name, span)));
        }

        if let Some(iri) = self.parse_iri_term() {
            return Some(PredicateTerm::Iri(iri));
        }

        self.stream.error_at_current("expected predicate");
        None
    }

    /// Parse an object term.
    pub(super) fn parse_object(&mut self) -> Option<ObjectTerm> {
        if let Some((name, span)) = self.stream.consume_var() {
            return Some(Term::Var(Var::new(name, span)));
        }

        if let Some(iri) = self.parse_iri_term() {
            return Some(Term::Iri(iri));
        }

        if let Some(lit) = self.parse_literal() {
            return Some(Term::Literal(lit));
        }

        if let Some(bnode) = self.parse_blank_node() {
            return Some(Term::BlankNode(bnode));
        }

        self.stream.error_unexpected("object position");
        None
    }

    /// Parse an IRI (full or prefixed).
    pub(super) fn parse_iri_term(&mut self) -> Option<Iri> {
        if let Some((iri, span)) = self.stream.consume_iri() {
            return Some(Iri::full(iri, span));
        }

        if let Some((prefix, local, span)) = self.stream.consume_prefixed_name() {
            return Some(Iri::prefixed(prefix, local, span));
        }

        if let Some((prefix, span)) = self.stream.consume_prefixed_name_ns() {
            return Some(Iri::prefixed(prefix, "", span));
        }

        None
    }

    /// Parse a literal, including signed numbers (`-3`, `+2.5`).
    pub(super) fn parse_literal(&mut self) -> Option<Literal> {
        let token = self.stream.peek();
        let span = token.span;

        match &token.kind {
            TokenKind::String(_) => {
                let token = self.stream.consume();
                let TokenKind::String(value) = token.kind else {
                    return None;
                };
                if let TokenKind::LangTag(lang) = &self.stream.peek().kind {
                    let lang = lang.clone();
                    let lang_span = self.stream.current_span();
                    self.stream.advance();
                    let full_span = span.union(lang_span);
                    return Some(Literal::lang_string(value, lang, full_span));
                }
                if self.stream.match_token(&TokenKind::DoubleCaret) {
                    if let Some(dt) = self.parse_iri_term() {
                        let full_span = span.union(dt.span);
                        return Some(Literal::typed(value, dt, full_span));
                    }
                    self.stream
                        .error_at_current("expected datatype IRI after '^^'");
                    return Some(Literal::string(value, span));
                }
                Some(Literal::string(value, span))
            }
            TokenKind::Integer(n) => {
                let n = *n;
                self.stream.advance();
                Some(Literal::integer(n, span))
            }
            TokenKind::Decimal(_) => {
                let token = self.stream.consume();
                match token.kind {
                    TokenKind::Decimal(s) => Some(Literal::decimal(s, span)),
                    _ => None,
                }
            }
            TokenKind::Double(n) => {
                let n = *n;
                self.stream.advance();
                Some(Literal::double(n, span))
            }
            TokenKind::KwTrue => {
                self.stream.advance();
                Some(Literal::boolean(true, span))
            }
            TokenKind::KwFalse => {
                self.stream.advance();
                Some(Literal::boolean(false, span))
            }
            // Signed numeric literal: the sign lexes as a separate token
            TokenKind::Plus | TokenKind::Minus => {
                let negative = matches!(token.kind, TokenKind::Minus);
                if !self.peek_is_number(1) {
                    return None;
                }
                self.stream.advance();
                let num = self.stream.consume();
                let full_span = span.union(num.span);
                match num.kind {
                    TokenKind::Integer(n) => {
                        let n = if negative { -n } else { n };
                        Some(Literal::integer(n, full_span))
                    }
                    TokenKind::Decimal(s) => {
                        let s = if negative {
                            format!("-{}", s).into()
                        } else {
                            s
                        };
                        Some(Literal::decimal(s, full_span))
                    }
                    TokenKind::Double(n) => {
                        let n = if negative { -n } else { n };
                        Some(Literal::double(n, full_span))
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn peek_is_number(&self, n: usize) -> bool {
        matches!(
            self.stream.peek_n(n).kind,
            TokenKind::Integer(_) | TokenKind::Decimal(_) | TokenKind::Double(_)
        )
    }

    /// Parse a labeled blank node (`_:label`).
    pub(super) fn parse_blank_node(&mut self) -> Option<BlankNode> {
        let span = self.stream.current_span();
        match &self.stream.peek().kind {
            TokenKind::BlankNodeLabel(_) => {
                let token = self.stream.consume();
                match token.kind {
                    TokenKind::BlankNodeLabel(label) => Some(BlankNode::new(label, span)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Check if current token can start a predicate.
    pub(super) fn is_verb_start(&self) -> bool {
        matches!(
            self.stream.peek().kind,
            TokenKind::Var(_)
                | TokenKind::Iri(_)
                | TokenKind::PrefixedName { .. }
                | TokenKind::PrefixedNameNs(_)
                | TokenKind::KwA
        )
    }

    /// Parse triple patterns sharing one subject, handling `;` and `,`
    /// lists. Returns the accumulated patterns.
    pub(super) fn parse_triples_block(&mut self) -> Option<Vec<TriplePattern>> {
        let mut triples = Vec::new();

        let subject = self.parse_subject()?;
        self.parse_predicate_object_list(&subject, &mut triples)?;

        // Optional dot at end
        self.stream.match_token(&TokenKind::Dot);

        Some(triples)
    }

    /// Parse a predicate-object list for a given subject.
    fn parse_predicate_object_list(
        &mut self,
        subject: &SubjectTerm,
        triples: &mut Vec<TriplePattern>,
    ) -> Option<()> {
        loop {
            let predicate = self.parse_predicate()?;

            // A path operator after the predicate means a property path
            if matches!(self.stream.peek().kind, TokenKind::Slash) {
                let span = self.stream.current_span();
                self.stream.add_diagnostic(
                    Diagnostic::error(
                        DiagCode::UnsupportedFeature,
                        "property paths are not supported",
                        span,
                    )
                    .with_help("write each step of the path as its own triple pattern"),
                );
                return None;
            }

            self.parse_object_list(subject, &predicate, triples)?;

            // Semicolon continues with another predicate-object pair
            if !self.stream.match_token(&TokenKind::Semicolon) {
                break;
            }

            // Trailing semicolons are allowed
            if !self.is_verb_start() {
                break;
            }
        }

        Some(())
    }

    /// Parse an object list (`,`-separated) for a subject and predicate.
    fn parse_object_list(
        &mut self,
        subject: &SubjectTerm,
        predicate: &PredicateTerm,
        triples: &mut Vec<TriplePattern>,
    ) -> Option<()> {
        loop {
            let object = self.parse_object()?;

            let span = subject.span().union(predicate.span()).union(object.span());
            triples.push(TriplePattern::new(
                subject.clone(),
                predicate.clone(),
                object,
                span,
            ));

            if !self.stream.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Some(())
    }
}

/// Calculate the span covering a list of triple patterns.
pub(super) fn span_of_triples(triples: &[TriplePattern]) -> SourceSpan {
    match (triples.first(), triples.last()) {
        (Some(first), Some(last)) => first.span.union(last.span),
        _ => SourceSpan::point(0),
    }
}
