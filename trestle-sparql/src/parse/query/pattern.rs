//! Graph pattern parsing: WHERE, OPTIONAL, UNION, FILTER, BIND.

use crate::ast::{GraphPattern, Var, WhereClause};
use crate::diag::{DiagCode, Diagnostic};
use crate::lex::TokenKind;
use crate::parse::expr::parse_expression;

impl<'a> super::Parser<'a> {
    /// Parse a WHERE clause.
    pub(super) fn parse_where_clause(&mut self) -> Option<WhereClause> {
        let start = self.stream.current_span();

        // WHERE keyword is optional
        let has_where = self.stream.match_keyword(TokenKind::KwWhere);

        if !self.stream.match_token(&TokenKind::LBrace) {
            if has_where {
                self.stream.error_at_current("expected '{' after WHERE");
            } else {
                self.stream.error_at_current("expected WHERE clause or '{'");
            }
            return None;
        }

        let pattern = self.parse_group_graph_pattern()?;

        let span = start.union(self.stream.previous_span());

        Some(WhereClause::new(pattern, has_where, span))
    }

    /// Parse a group graph pattern (contents within { }).
    ///
    /// The opening brace has already been consumed.
    pub(super) fn parse_group_graph_pattern(&mut self) -> Option<GraphPattern> {
        let start = self.stream.previous_span(); // the opening brace

        let mut patterns: Vec<GraphPattern> = Vec::new();
        let mut current_triples: Vec<crate::ast::TriplePattern> = Vec::new();

        while !self.stream.check(&TokenKind::RBrace) && !self.stream.is_eof() {
            if self.stream.check_keyword(TokenKind::KwOptional) {
                super::flush_current_triples(&mut current_triples, &mut patterns);

                let optional = self.parse_optional_pattern()?;
                patterns.push(optional);
            } else if self.stream.check_keyword(TokenKind::KwUnion) {
                // UNION between bare triple blocks needs brace groups
                self.stream.error_at_current("UNION must follow a '{ ... }' group");
                return None;
            } else if self.stream.check_keyword(TokenKind::KwFilter) {
                super::flush_current_triples(&mut current_triples, &mut patterns);

                let filter = self.parse_filter_pattern()?;
                patterns.push(filter);
            } else if self.stream.check_keyword(TokenKind::KwBind) {
                super::flush_current_triples(&mut current_triples, &mut patterns);

                let bind = self.parse_bind_pattern()?;
                patterns.push(bind);
            } else if self.stream.check(&TokenKind::LBrace) {
                // Nested group, possibly the start of a UNION chain
                super::flush_current_triples(&mut current_triples, &mut patterns);

                self.stream.advance(); // consume {

                if self.stream.check_keyword(TokenKind::KwSelect) {
                    self.unsupported_here(
                        "subqueries are not supported",
                        "lift the inner SELECT into its own query",
                    );
                    return None;
                }

                let inner = self.parse_group_graph_pattern()?;
                if self.stream.check_keyword(TokenKind::KwUnion) {
                    let union = self.parse_union_continuation(inner)?;
                    patterns.push(union);
                } else {
                    patterns.push(inner);
                }
            } else if let Some(message) = self.check_unsupported_pattern_keyword() {
                self.unsupported_here(
                    message,
                    "supported patterns: triples, OPTIONAL, UNION, FILTER, and BIND",
                );
                return None;
            } else if self.stream.is_term_start() {
                let block = self.parse_triples_block()?;
                current_triples.extend(block);
            } else if self.stream.check(&TokenKind::Dot) {
                // Stray dots between patterns are allowed
                self.stream.advance();
            } else {
                self.stream.error_unexpected("graph pattern");
                return None;
            }
        }

        super::flush_current_triples(&mut current_triples, &mut patterns);

        if !self.stream.match_token(&TokenKind::RBrace) {
            self.stream.error_at_current("expected '}'");
            return None;
        }

        let span = start.union(self.stream.previous_span());

        // A group of one is just its member; an empty group matches once
        if patterns.is_empty() {
            Some(GraphPattern::empty_bgp(span))
        } else {
            Some(GraphPattern::group(patterns, span))
        }
    }

    /// Parse an OPTIONAL pattern.
    pub(super) fn parse_optional_pattern(&mut self) -> Option<GraphPattern> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume OPTIONAL

        if !self.stream.match_token(&TokenKind::LBrace) {
            self.stream.error_at_current("expected '{' after OPTIONAL");
            return None;
        }

        let pattern = self.parse_group_graph_pattern()?;
        let span = start.union(self.stream.previous_span());

        Some(GraphPattern::Optional {
            pattern: Box::new(pattern),
            span,
        })
    }

    /// Parse a FILTER pattern.
    ///
    /// Syntax: `FILTER (expression)` or `FILTER expression`
    pub(super) fn parse_filter_pattern(&mut self) -> Option<GraphPattern> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume FILTER

        match parse_expression(self.stream) {
            Ok(expr) => {
                let span = start.union(self.stream.previous_span());
                Some(GraphPattern::Filter { expr, span })
            }
            Err(err) => {
                self.stream.add_diagnostic(err.into_diagnostic());
                None
            }
        }
    }

    /// Parse a BIND pattern.
    ///
    /// Syntax: `BIND (expression AS ?var)`
    pub(super) fn parse_bind_pattern(&mut self) -> Option<GraphPattern> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume BIND

        if !self.stream.match_token(&TokenKind::LParen) {
            self.stream.error_at_current("expected '(' after BIND");
            return None;
        }

        let expr = match parse_expression(self.stream) {
            Ok(e) => e,
            Err(err) => {
                self.stream.add_diagnostic(err.into_diagnostic());
                return None;
            }
        };

        if !self.stream.check_keyword(TokenKind::KwAs) {
            let span = start.union(self.stream.previous_span());
            self.stream.add_diagnostic(
                Diagnostic::error(
                    DiagCode::ExpectedToken,
                    "BIND requires 'AS ?variable'",
                    span,
                )
                .with_help("use BIND(expression AS ?variable) syntax"),
            );
            return None;
        }
        self.stream.advance(); // consume AS

        let var = match self.stream.consume_var() {
            Some((name, var_span)) => Var::new(name, var_span),
            None => {
                self.stream.error_at_current("expected variable after AS");
                return None;
            }
        };

        if !self.stream.match_token(&TokenKind::RParen) {
            self.stream
                .error_at_current("expected ')' after BIND expression");
            return None;
        }

        let span = start.union(self.stream.previous_span());
        Some(GraphPattern::Bind { expr, var, span })
    }

    /// Parse UNION continuations after a group.
    pub(super) fn parse_union_continuation(&mut self, left: GraphPattern) -> Option<GraphPattern> {
        let start = left.span();

        self.stream.advance(); // consume UNION

        if !self.stream.match_token(&TokenKind::LBrace) {
            self.stream.error_at_current("expected '{' after UNION");
            return None;
        }

        let right = self.parse_group_graph_pattern()?;
        let span = start.union(self.stream.previous_span());

        let mut result = GraphPattern::Union {
            left: Box::new(left),
            right: Box::new(right),
            span,
        };

        // Chained UNIONs nest to the left
        while self.stream.check_keyword(TokenKind::KwUnion) {
            self.stream.advance(); // consume UNION

            if !self.stream.match_token(&TokenKind::LBrace) {
                self.stream.error_at_current("expected '{' after UNION");
                return None;
            }

            let right = self.parse_group_graph_pattern()?;
            let new_span = result.span().union(self.stream.previous_span());

            result = GraphPattern::Union {
                left: Box::new(result),
                right: Box::new(right),
                span: new_span,
            };
        }

        Some(result)
    }

    /// Check for recognized-but-unsupported pattern keywords.
    fn check_unsupported_pattern_keyword(&self) -> Option<&'static str> {
        match self.stream.peek().kind {
            TokenKind::KwValues => Some("VALUES blocks are not supported"),
            TokenKind::KwMinusPattern => Some("MINUS patterns are not supported"),
            TokenKind::KwGraph => Some("named graph patterns are not supported"),
            TokenKind::KwService => Some("federated SERVICE patterns are not supported"),
            TokenKind::KwExists => Some("EXISTS is not supported"),
            _ => None,
        }
    }

    /// Emit an unsupported-feature diagnostic at the current token.
    pub(super) fn unsupported_here(&mut self, message: &str, help: &str) {
        let span = self.stream.current_span();
        self.stream.add_diagnostic(
            Diagnostic::error(DiagCode::UnsupportedFeature, message, span).with_help(help),
        );
    }
}
