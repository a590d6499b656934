//! Aggregate hoisting for SELECT and HAVING.
//!
//! Aggregate calls cannot be evaluated per solution, so they never
//! survive into scalar [`Expr`]s. The extractor walks an expression,
//! replaces each aggregate call with a fresh output variable, and
//! records the call on a list destined for the Group node. Calls that
//! compute the same value share one output variable, so
//! `HAVING(COUNT(?x) > 5)` reuses the accumulator behind
//! `SELECT (COUNT(?x) AS ?n)`.

use std::sync::Arc;

use trestle_sparql::ast::{self, Expression, Var};

use crate::algebra::{AggregateCall, AggregateName, Expr};
use crate::error::{QueryError, Result};
use crate::translate::expression::translate_expression;
use crate::translate::term::Resolver;

pub(crate) struct AggregateExtractor<'a> {
    resolver: &'a Resolver<'a>,
    /// Name stem for synthetic output variables
    prefix: &'static str,
    /// Next synthetic suffix, counted separately from reused calls
    next_id: usize,
    calls: Vec<AggregateCall>,
}

impl<'a> AggregateExtractor<'a> {
    pub(crate) fn new(resolver: &'a Resolver<'a>, prefix: &'static str) -> Self {
        Self {
            resolver,
            prefix,
            next_id: 0,
            calls: Vec::new(),
        }
    }

    /// Continue with calls hoisted by an earlier pass, so equivalent
    /// computations are shared across SELECT and HAVING.
    pub(crate) fn with_existing(
        resolver: &'a Resolver<'a>,
        prefix: &'static str,
        calls: Vec<AggregateCall>,
    ) -> Self {
        Self {
            resolver,
            prefix,
            next_id: 0,
            calls,
        }
    }

    pub(crate) fn into_calls(self) -> Vec<AggregateCall> {
        self.calls
    }

    /// Whether `name` is the output of a hoisted call.
    pub(crate) fn defines(&self, name: &Arc<str>) -> bool {
        self.calls.iter().any(|call| call.output == *name)
    }

    /// Lower an expression, hoisting every aggregate call it contains.
    pub(crate) fn rewrite(&mut self, expr: &Expression) -> Result<Expr> {
        let stripped = self.strip(expr)?;
        translate_expression(&stripped, self.resolver)
    }

    /// Hoist an expression that is itself a single aggregate call,
    /// binding its result directly to `output`.
    pub(crate) fn hoist_named(
        &mut self,
        output: Arc<str>,
        function: &ast::AggregateFunction,
        input: Option<&Expression>,
        distinct: bool,
        separator: Option<Arc<str>>,
    ) -> Result<()> {
        let call = self.build_call(output, function, input, distinct, separator)?;
        self.calls.push(call);
        Ok(())
    }

    /// Replace aggregate sub-expressions with references to their
    /// output variables, leaving everything else intact.
    fn strip(&mut self, expr: &Expression) -> Result<Expression> {
        Ok(match expr {
            Expression::Aggregate {
                function,
                expr,
                distinct,
                separator,
                span,
            } => {
                let output =
                    self.hoist(function, expr.as_deref(), *distinct, separator.clone())?;
                Expression::Var(Var::new(output, *span))
            }
            Expression::Bracketed { inner, span } => Expression::Bracketed {
                inner: Box::new(self.strip(inner)?),
                span: *span,
            },
            Expression::Binary {
                op,
                left,
                right,
                span,
            } => Expression::Binary {
                op: *op,
                left: Box::new(self.strip(left)?),
                right: Box::new(self.strip(right)?),
                span: *span,
            },
            Expression::Unary { op, operand, span } => Expression::Unary {
                op: *op,
                operand: Box::new(self.strip(operand)?),
                span: *span,
            },
            Expression::FunctionCall { name, args, span } => Expression::FunctionCall {
                name: *name,
                args: self.strip_all(args)?,
                span: *span,
            },
            Expression::If {
                condition,
                then_expr,
                else_expr,
                span,
            } => Expression::If {
                condition: Box::new(self.strip(condition)?),
                then_expr: Box::new(self.strip(then_expr)?),
                else_expr: Box::new(self.strip(else_expr)?),
                span: *span,
            },
            Expression::Coalesce { args, span } => Expression::Coalesce {
                args: self.strip_all(args)?,
                span: *span,
            },
            Expression::In {
                expr,
                list,
                negated,
                span,
            } => Expression::In {
                expr: Box::new(self.strip(expr)?),
                list: self.strip_all(list)?,
                negated: *negated,
                span: *span,
            },
            leaf => leaf.clone(),
        })
    }

    fn strip_all(&mut self, exprs: &[Expression]) -> Result<Vec<Expression>> {
        exprs.iter().map(|expr| self.strip(expr)).collect()
    }

    /// Record an aggregate call and return its output variable,
    /// reusing an existing call that computes the same value.
    fn hoist(
        &mut self,
        function: &ast::AggregateFunction,
        input: Option<&Expression>,
        distinct: bool,
        separator: Option<Arc<str>>,
    ) -> Result<Arc<str>> {
        let placeholder: Arc<str> = Arc::from("");
        let candidate = self.build_call(placeholder, function, input, distinct, separator)?;

        if let Some(existing) = self
            .calls
            .iter()
            .find(|call| call.same_computation(&candidate))
        {
            return Ok(existing.output.clone());
        }

        let output: Arc<str> = Arc::from(format!("{}_{}", self.prefix, self.next_id));
        self.next_id += 1;
        self.calls.push(AggregateCall {
            output: output.clone(),
            ..candidate
        });
        Ok(output)
    }

    fn build_call(
        &mut self,
        output: Arc<str>,
        function: &ast::AggregateFunction,
        input: Option<&Expression>,
        distinct: bool,
        separator: Option<Arc<str>>,
    ) -> Result<AggregateCall> {
        if let Some(inner) = input {
            if inner.contains_aggregate() {
                return Err(QueryError::Translate(
                    "aggregate calls cannot be nested".into(),
                ));
            }
        }
        let name = match function {
            ast::AggregateFunction::Count => AggregateName::Count,
            ast::AggregateFunction::Sum => AggregateName::Sum,
            ast::AggregateFunction::Avg => AggregateName::Avg,
            ast::AggregateFunction::Min => AggregateName::Min,
            ast::AggregateFunction::Max => AggregateName::Max,
            ast::AggregateFunction::GroupConcat => AggregateName::GroupConcat,
            ast::AggregateFunction::Sample => AggregateName::Sample,
            ast::AggregateFunction::Custom(iri) => {
                let resolved = self.resolver.resolve_iri(iri)?;
                AggregateName::Iri(Arc::from(resolved.as_str()))
            }
        };
        let input = input
            .map(|expr| translate_expression(expr, self.resolver))
            .transpose()?;
        Ok(AggregateCall {
            output,
            name,
            input,
            distinct,
            separator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trestle_sparql::ast::{BinaryOp, Literal, Prologue};
    use trestle_sparql::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::new(0, 1)
    }

    fn count_of(var: &str) -> Expression {
        Expression::Aggregate {
            function: ast::AggregateFunction::Count,
            expr: Some(Box::new(Expression::Var(Var::new(var, span())))),
            distinct: false,
            separator: None,
            span: span(),
        }
    }

    #[test]
    fn aggregates_are_replaced_by_output_variables() {
        let prologue = Prologue::new();
        let resolver = Resolver::new(&prologue);
        let mut extractor = AggregateExtractor::new(&resolver, "__agg");

        let expr = Expression::binary(
            BinaryOp::Gt,
            count_of("x"),
            Expression::Literal(Literal::integer(5, span())),
            span(),
        );
        let rewritten = extractor.rewrite(&expr).unwrap();

        match rewritten {
            Expr::Binary { left, .. } => assert_eq!(*left, Expr::Var(Arc::from("__agg_0"))),
            other => panic!("expected binary, got {other:?}"),
        }
        let calls = extractor.into_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, AggregateName::Count);
    }

    #[test]
    fn equal_computations_share_one_output() {
        let prologue = Prologue::new();
        let resolver = Resolver::new(&prologue);
        let mut extractor = AggregateExtractor::new(&resolver, "__agg");

        let expr = Expression::binary(BinaryOp::Add, count_of("x"), count_of("x"), span());
        let rewritten = extractor.rewrite(&expr).unwrap();

        match rewritten {
            Expr::Binary { left, right, .. } => assert_eq!(left, right),
            other => panic!("expected binary, got {other:?}"),
        }
        assert_eq!(extractor.into_calls().len(), 1);
    }

    #[test]
    fn having_reuses_a_select_aggregate() {
        let prologue = Prologue::new();
        let resolver = Resolver::new(&prologue);

        let mut select = AggregateExtractor::new(&resolver, "__agg");
        select
            .hoist_named(Arc::from("n"), &ast::AggregateFunction::Count, Some(&Expression::Var(Var::new("x", span()))), false, None)
            .unwrap();

        let mut having =
            AggregateExtractor::with_existing(&resolver, "__having_agg", select.into_calls());
        let rewritten = having.rewrite(&count_of("x")).unwrap();

        assert_eq!(rewritten, Expr::Var(Arc::from("n")));
        assert_eq!(having.into_calls().len(), 1);
    }

    #[test]
    fn nested_aggregates_are_rejected() {
        let prologue = Prologue::new();
        let resolver = Resolver::new(&prologue);
        let mut extractor = AggregateExtractor::new(&resolver, "__agg");

        let nested = Expression::Aggregate {
            function: ast::AggregateFunction::Sum,
            expr: Some(Box::new(count_of("x"))),
            distinct: false,
            separator: None,
            span: span(),
        };
        let err = extractor.rewrite(&nested).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn custom_aggregate_iris_resolve_against_prefixes() {
        let prologue = Prologue::new().with_prefix(ast::PrefixDecl::new(
            "agg",
            "urn:example:agg/",
            span(),
        ));
        let resolver = Resolver::new(&prologue);
        let mut extractor = AggregateExtractor::new(&resolver, "__agg");

        let call = Expression::Aggregate {
            function: ast::AggregateFunction::Custom(ast::Iri::prefixed("agg", "median", span())),
            expr: Some(Box::new(Expression::Var(Var::new("x", span())))),
            distinct: false,
            separator: None,
            span: span(),
        };
        extractor.rewrite(&call).unwrap();
        let calls = extractor.into_calls();
        assert_eq!(
            calls[0].name,
            AggregateName::Iri(Arc::from("urn:example:agg/median"))
        );
    }
}
