//! SELECT query parsing.

use crate::ast::{
    SelectClause, SelectModifier, SelectQuery, SelectVariable, SelectVariables, Var,
};
use crate::diag::{DiagCode, Diagnostic};
use crate::lex::TokenKind;
use crate::parse::expr::parse_expression;

impl<'a> super::Parser<'a> {
    /// Parse a SELECT query. The SELECT keyword has already been checked
    /// but not consumed.
    pub(super) fn parse_select_query(&mut self) -> Option<SelectQuery> {
        let start = self.stream.current_span();

        let select = self.parse_select_clause()?;

        self.reject_dataset_clause();

        let where_clause = self.parse_where_clause()?;
        let modifiers = self.parse_solution_modifiers()?;

        let span = start.union(self.stream.previous_span());

        Some(SelectQuery::new(select, where_clause, modifiers, span))
    }

    /// Parse the SELECT clause: `SELECT [DISTINCT|REDUCED] (* | vars...)`.
    fn parse_select_clause(&mut self) -> Option<SelectClause> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume SELECT

        let modifier = if self.stream.match_keyword(TokenKind::KwDistinct) {
            Some(SelectModifier::Distinct)
        } else if self.stream.match_keyword(TokenKind::KwReduced) {
            let span = self.stream.previous_span();
            self.stream.add_diagnostic(
                Diagnostic::warning(
                    DiagCode::ReducedHasNoEffect,
                    "REDUCED has no effect and is treated as plain SELECT",
                    span,
                )
                .with_help("use DISTINCT to eliminate duplicate solutions"),
            );
            Some(SelectModifier::Reduced)
        } else {
            None
        };

        let variables = self.parse_select_variables()?;

        let span = start.union(self.stream.previous_span());

        Some(SelectClause {
            modifier,
            variables,
            span,
        })
    }

    /// Parse the projection: `*` or one or more variables/expressions.
    fn parse_select_variables(&mut self) -> Option<SelectVariables> {
        if self.stream.match_token(&TokenKind::Star) {
            return Some(SelectVariables::Star);
        }

        let mut variables = Vec::new();

        while matches!(self.stream.peek().kind, TokenKind::Var(_))
            || self.stream.check(&TokenKind::LParen)
        {
            let variable = self.parse_select_variable()?;
            variables.push(variable);
        }

        if variables.is_empty() {
            self.stream
                .error_at_current("expected '*' or variables after SELECT");
            return None;
        }

        Some(SelectVariables::Explicit(variables))
    }

    /// Parse one projection item: `?var` or `(expression AS ?var)`.
    fn parse_select_variable(&mut self) -> Option<SelectVariable> {
        if let Some((name, span)) = self.stream.consume_var() {
            return Some(SelectVariable::Var(Var::new(name, span)));
        }

        // (expression AS ?var)
        let start = self.stream.current_span();
        self.stream.advance(); // consume (

        let expr = match parse_expression(self.stream) {
            Ok(e) => e,
            Err(err) => {
                self.stream.add_diagnostic(err.into_diagnostic());
                self.skip_to_closing_paren();
                return None;
            }
        };

        if !self.stream.match_keyword(TokenKind::KwAs) {
            self.stream
                .error_at_current("expected AS in projection expression");
            self.skip_to_closing_paren();
            return None;
        }

        let alias = match self.stream.consume_var() {
            Some((name, var_span)) => Var::new(name, var_span),
            None => {
                self.stream.error_at_current("expected variable after AS");
                self.skip_to_closing_paren();
                return None;
            }
        };

        if !self.stream.match_token(&TokenKind::RParen) {
            self.stream
                .error_at_current("expected ')' after projection expression");
            return None;
        }

        let span = start.union(self.stream.previous_span());
        Some(SelectVariable::Expr { expr, alias, span })
    }

    /// Skip tokens until after the closing paren of the current group,
    /// so a later clause can still be parsed for further diagnostics.
    fn skip_to_closing_paren(&mut self) {
        let mut depth = 1usize;
        while !self.stream.is_eof() && depth > 0 {
            if self.stream.check(&TokenKind::LParen) {
                depth += 1;
            } else if self.stream.check(&TokenKind::RParen) {
                depth -= 1;
            }
            self.stream.advance();
        }
    }

    /// Reject FROM dataset clauses with a targeted diagnostic and skip
    /// ahead to the WHERE clause.
    pub(super) fn reject_dataset_clause(&mut self) {
        if self.stream.check_keyword(TokenKind::KwFrom) {
            self.unsupported_here(
                "FROM dataset clauses are not supported",
                "queries always run against the single in-memory graph",
            );
            self.stream
                .synchronize(&[TokenKind::KwWhere, TokenKind::LBrace]);
        }
    }
}
