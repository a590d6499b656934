//! Solution modifier parsing: GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET.

use crate::ast::{
    GroupByClause, GroupCondition, HavingClause, LimitClause, OffsetClause, OrderByClause,
    OrderCondition, OrderDirection, OrderExpr, SolutionModifiers, Var,
};
use crate::diag::{DiagCode, Diagnostic};
use crate::lex::TokenKind;
use crate::parse::expr::parse_expression;
use crate::span::SourceSpan;

impl<'a> super::Parser<'a> {
    /// Parse the trailing solution modifiers of a query.
    ///
    /// GROUP BY, HAVING, and ORDER BY come in that order; LIMIT and
    /// OFFSET may appear in either order after them.
    pub(super) fn parse_solution_modifiers(&mut self) -> Option<SolutionModifiers> {
        let mut modifiers = SolutionModifiers::new();

        if self.stream.check_keyword(TokenKind::KwGroupBy) {
            modifiers.group_by = Some(self.parse_group_by_clause()?);
        }

        if self.stream.check_keyword(TokenKind::KwHaving) {
            modifiers.having = Some(self.parse_having_clause()?);
        }

        if self.stream.check_keyword(TokenKind::KwOrderBy) {
            modifiers.order_by = Some(self.parse_order_by_clause()?);
        }

        loop {
            if self.stream.check_keyword(TokenKind::KwLimit) {
                if modifiers.limit.is_some() {
                    self.stream.error_at_current("duplicate LIMIT clause");
                    return None;
                }
                let (value, span) = self.parse_clause_count("LIMIT")?;
                modifiers.limit = Some(LimitClause::new(value, span));
            } else if self.stream.check_keyword(TokenKind::KwOffset) {
                if modifiers.offset.is_some() {
                    self.stream.error_at_current("duplicate OFFSET clause");
                    return None;
                }
                let (value, span) = self.parse_clause_count("OFFSET")?;
                modifiers.offset = Some(OffsetClause::new(value, span));
            } else {
                break;
            }
        }

        Some(modifiers)
    }

    /// Parse `GROUP BY` followed by one or more group conditions.
    fn parse_group_by_clause(&mut self) -> Option<GroupByClause> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume GROUP

        if !self.stream.match_keyword(TokenKind::KwBy) {
            self.stream.error_at_current("expected BY after GROUP");
            return None;
        }

        let mut conditions = Vec::new();

        loop {
            if let Some((name, span)) = self.stream.consume_var() {
                conditions.push(GroupCondition::Var(Var::new(name, span)));
            } else if self.stream.check(&TokenKind::LParen) {
                conditions.push(self.parse_group_condition_expr()?);
            } else {
                break;
            }
        }

        if conditions.is_empty() {
            self.stream
                .error_at_current("expected variable or '(' after GROUP BY");
            return None;
        }

        let span = start.union(self.stream.previous_span());
        Some(GroupByClause { conditions, span })
    }

    /// Parse a parenthesized group condition: `(expr)` or `(expr AS ?var)`.
    fn parse_group_condition_expr(&mut self) -> Option<GroupCondition> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume (

        let expr = match parse_expression(self.stream) {
            Ok(e) => e,
            Err(err) => {
                self.stream.add_diagnostic(err.into_diagnostic());
                return None;
            }
        };

        let alias = if self.stream.match_keyword(TokenKind::KwAs) {
            match self.stream.consume_var() {
                Some((name, var_span)) => Some(Var::new(name, var_span)),
                None => {
                    self.stream.error_at_current("expected variable after AS");
                    return None;
                }
            }
        } else {
            None
        };

        if !self.stream.match_token(&TokenKind::RParen) {
            self.stream
                .error_at_current("expected ')' after group condition");
            return None;
        }

        let span = start.union(self.stream.previous_span());
        Some(GroupCondition::Expr { expr, alias, span })
    }

    /// Parse `HAVING` followed by one or more parenthesized constraints.
    fn parse_having_clause(&mut self) -> Option<HavingClause> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume HAVING

        let mut conditions = Vec::new();

        while self.stream.check(&TokenKind::LParen) {
            match parse_expression(self.stream) {
                Ok(expr) => conditions.push(expr),
                Err(err) => {
                    self.stream.add_diagnostic(err.into_diagnostic());
                    return None;
                }
            }
        }

        if conditions.is_empty() {
            let span = start.union(self.stream.current_span());
            self.stream.add_diagnostic(
                Diagnostic::error(
                    DiagCode::ExpectedToken,
                    "HAVING requires a parenthesized condition",
                    span,
                )
                .with_help("write HAVING (expression)"),
            );
            return None;
        }

        let span = start.union(self.stream.previous_span());
        Some(HavingClause { conditions, span })
    }

    /// Parse `ORDER BY` followed by one or more order conditions.
    fn parse_order_by_clause(&mut self) -> Option<OrderByClause> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume ORDER

        if !self.stream.match_keyword(TokenKind::KwBy) {
            self.stream.error_at_current("expected BY after ORDER");
            return None;
        }

        let mut conditions = Vec::new();

        loop {
            let condition = if self.stream.check_keyword(TokenKind::KwAsc) {
                self.parse_directed_order_condition(OrderDirection::Asc)?
            } else if self.stream.check_keyword(TokenKind::KwDesc) {
                self.parse_directed_order_condition(OrderDirection::Desc)?
            } else if let Some((name, span)) = self.stream.consume_var() {
                OrderCondition {
                    expr: OrderExpr::Var(Var::new(name, span)),
                    direction: OrderDirection::Asc,
                    span,
                }
            } else if self.stream.check(&TokenKind::LParen) {
                let expr_start = self.stream.current_span();
                match parse_expression(self.stream) {
                    Ok(expr) => {
                        let span = expr_start.union(self.stream.previous_span());
                        OrderCondition {
                            expr: OrderExpr::Expr(expr),
                            direction: OrderDirection::Asc,
                            span,
                        }
                    }
                    Err(err) => {
                        self.stream.add_diagnostic(err.into_diagnostic());
                        return None;
                    }
                }
            } else {
                break;
            };

            conditions.push(condition);
        }

        if conditions.is_empty() {
            self.stream
                .error_at_current("expected ordering condition after ORDER BY");
            return None;
        }

        let span = start.union(self.stream.previous_span());
        Some(OrderByClause { conditions, span })
    }

    /// Parse `ASC(expr)` or `DESC(expr)`.
    fn parse_directed_order_condition(
        &mut self,
        direction: OrderDirection,
    ) -> Option<OrderCondition> {
        let start = self.stream.current_span();
        let keyword = if direction == OrderDirection::Desc {
            "DESC"
        } else {
            "ASC"
        };
        self.stream.advance(); // consume ASC or DESC

        if !self.stream.check(&TokenKind::LParen) {
            let span = start.union(self.stream.current_span());
            self.stream.add_diagnostic(
                Diagnostic::error(
                    DiagCode::ExpectedToken,
                    format!("expected '(' after {keyword}"),
                    span,
                )
                .with_help(format!("write {keyword}(expression), e.g. {keyword}(?age)")),
            );
            return None;
        }

        let expr = match parse_expression(self.stream) {
            Ok(e) => e,
            Err(err) => {
                self.stream.add_diagnostic(err.into_diagnostic());
                return None;
            }
        };

        let span = start.union(self.stream.previous_span());
        Some(OrderCondition {
            expr: OrderExpr::Expr(expr),
            direction,
            span,
        })
    }

    /// Parse the numeric argument of LIMIT or OFFSET.
    fn parse_clause_count(&mut self, keyword: &str) -> Option<(u64, SourceSpan)> {
        let start = self.stream.current_span();
        self.stream.advance(); // consume LIMIT or OFFSET

        if self.stream.check(&TokenKind::Minus) {
            let span = start.union(self.stream.current_span());
            self.stream.add_diagnostic(Diagnostic::error(
                DiagCode::InvalidNumericLiteral,
                format!("{keyword} must be a non-negative integer"),
                span,
            ));
            return None;
        }

        if matches!(
            self.stream.peek().kind,
            TokenKind::Decimal(_) | TokenKind::Double(_)
        ) {
            let span = start.union(self.stream.current_span());
            self.stream.add_diagnostic(Diagnostic::error(
                DiagCode::InvalidNumericLiteral,
                format!("{keyword} must be an integer"),
                span,
            ));
            return None;
        }

        match self.stream.consume_integer() {
            Some((value, value_span)) => {
                let span = start.union(value_span);
                Some((value as u64, span))
            }
            None => {
                self.stream
                    .error_at_current(&format!("expected integer after {keyword}"));
                None
            }
        }
    }
}
