//! CONSTRUCT and ASK query parsing.

use crate::ast::{AskQuery, ConstructQuery, ConstructTemplate, TriplePattern};
use crate::lex::TokenKind;

impl<'a> super::Parser<'a> {
    /// Parse a CONSTRUCT query. The CONSTRUCT keyword has already been
    /// checked but not consumed.
    pub(super) fn parse_construct_query(&mut self) -> Option<ConstructQuery> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume CONSTRUCT

        let template = self.parse_construct_template()?;

        self.reject_dataset_clause();

        let where_clause = self.parse_where_clause()?;
        let modifiers = self.parse_solution_modifiers()?;

        let span = start.union(self.stream.previous_span());

        Some(ConstructQuery::new(template, where_clause, modifiers, span))
    }

    /// Parse the `{ triples }` template after CONSTRUCT.
    fn parse_construct_template(&mut self) -> Option<ConstructTemplate> {
        let start = self.stream.current_span();

        if !self.stream.match_token(&TokenKind::LBrace) {
            self.stream
                .error_at_current("expected '{' to begin CONSTRUCT template");
            return None;
        }

        let mut triples: Vec<TriplePattern> = Vec::new();

        while !self.stream.check(&TokenKind::RBrace) && !self.stream.is_eof() {
            if self.stream.is_term_start() {
                let block = self.parse_triples_block()?;
                triples.extend(block);
            } else if self.stream.check(&TokenKind::Dot) {
                self.stream.advance();
            } else {
                self.stream.error_unexpected("CONSTRUCT template");
                return None;
            }
        }

        if !self.stream.match_token(&TokenKind::RBrace) {
            self.stream
                .error_at_current("expected '}' to close CONSTRUCT template");
            return None;
        }

        let span = start.union(self.stream.previous_span());
        Some(ConstructTemplate::new(triples, span))
    }

    /// Parse an ASK query. The ASK keyword has already been checked but
    /// not consumed.
    pub(super) fn parse_ask_query(&mut self) -> Option<AskQuery> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume ASK

        self.reject_dataset_clause();

        let where_clause = self.parse_where_clause()?;

        // Modifiers are accepted after ASK but do not change the result
        let modifiers = self.parse_solution_modifiers()?;

        let span = start.union(self.stream.previous_span());

        let mut ask = AskQuery::new(where_clause, span);
        ask.modifiers = modifiers;
        Some(ask)
    }
}
