//! Scalar-expression lowering.
//!
//! Bracketing is stripped here, IRIs and literals are resolved to
//! ground terms, and aggregate calls are rejected: the SELECT/HAVING
//! translator hoists aggregates onto the Group node before scalar
//! lowering ever sees them, so one surviving here is a query error.

use trestle_core::Term;
use trestle_sparql::ast::Expression;

use crate::algebra::Expr;
use crate::error::{QueryError, Result};
use crate::translate::term::Resolver;

pub(crate) fn translate_expression(expr: &Expression, resolver: &Resolver) -> Result<Expr> {
    Ok(match expr {
        Expression::Var(var) => Expr::Var(var.name.clone()),
        Expression::Literal(literal) => {
            Expr::Term(Term::Literal(resolver.resolve_literal(literal)?))
        }
        Expression::Iri(iri) => Expr::Term(Term::Iri(resolver.resolve_iri(iri)?)),
        Expression::Binary {
            op, left, right, ..
        } => Expr::Binary {
            op: *op,
            left: Box::new(translate_expression(left, resolver)?),
            right: Box::new(translate_expression(right, resolver)?),
        },
        Expression::Unary { op, operand, .. } => Expr::Unary {
            op: *op,
            operand: Box::new(translate_expression(operand, resolver)?),
        },
        Expression::FunctionCall { name, args, .. } => Expr::Function {
            name: *name,
            args: translate_all(args, resolver)?,
        },
        Expression::If {
            condition,
            then_expr,
            else_expr,
            ..
        } => Expr::If {
            condition: Box::new(translate_expression(condition, resolver)?),
            then_expr: Box::new(translate_expression(then_expr, resolver)?),
            else_expr: Box::new(translate_expression(else_expr, resolver)?),
        },
        Expression::Coalesce { args, .. } => Expr::Coalesce(translate_all(args, resolver)?),
        Expression::In {
            expr,
            list,
            negated,
            ..
        } => Expr::In {
            expr: Box::new(translate_expression(expr, resolver)?),
            list: translate_all(list, resolver)?,
            negated: *negated,
        },
        Expression::Aggregate { .. } => {
            return Err(QueryError::Translate(
                "aggregate calls are only allowed in SELECT expressions and HAVING".into(),
            ));
        }
        Expression::Bracketed { inner, .. } => translate_expression(inner, resolver)?,
    })
}

fn translate_all(exprs: &[Expression], resolver: &Resolver) -> Result<Vec<Expr>> {
    exprs
        .iter()
        .map(|expr| translate_expression(expr, resolver))
        .collect()
}
