//! WHERE-clause lowering.
//!
//! Group members fold left to right: triple blocks and sub-patterns
//! join onto the running operation, OPTIONAL becomes a left join
//! against it, BIND extends it. FILTER constraints apply to the whole
//! group, so they are collected during the fold and wrapped around the
//! finished operation. A filter written directly inside an OPTIONAL
//! group becomes the left join condition instead, which lets it see
//! left-side bindings.

use trestle_sparql::ast::{self, BinaryOp, GraphPattern};

use crate::algebra::{Expr, Operation, TriplePattern};
use crate::error::Result;
use crate::translate::expression::translate_expression;
use crate::translate::term::Resolver;

pub(crate) fn translate_pattern(pattern: &GraphPattern, resolver: &Resolver) -> Result<Operation> {
    match pattern {
        GraphPattern::Bgp { patterns, .. } => translate_bgp(patterns, resolver),
        GraphPattern::Group { patterns, .. } => translate_group(patterns.iter(), resolver),
        GraphPattern::Optional { pattern, .. } => {
            let (right, filter) = split_optional(pattern, resolver)?;
            Ok(Operation::LeftJoin {
                left: Box::new(Operation::unit()),
                right: Box::new(right),
                filter,
            })
        }
        GraphPattern::Union { left, right, .. } => Ok(Operation::Union {
            left: Box::new(translate_pattern(left, resolver)?),
            right: Box::new(translate_pattern(right, resolver)?),
        }),
        GraphPattern::Filter { expr, .. } => Ok(Operation::Filter {
            expr: translate_expression(expr, resolver)?,
            input: Box::new(Operation::unit()),
        }),
        GraphPattern::Bind { expr, var, .. } => Ok(Operation::Extend {
            input: Box::new(Operation::unit()),
            var: var.name.clone(),
            expr: translate_expression(expr, resolver)?,
        }),
    }
}

fn translate_bgp(patterns: &[ast::TriplePattern], resolver: &Resolver) -> Result<Operation> {
    let mut resolved = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        resolved.push(TriplePattern::new(
            resolver.subject_pattern(&pattern.subject)?,
            resolver.predicate_pattern(&pattern.predicate)?,
            resolver.object_pattern(&pattern.object)?,
        ));
    }
    Ok(Operation::Bgp(resolved))
}

fn translate_group<'a>(
    children: impl Iterator<Item = &'a GraphPattern>,
    resolver: &Resolver,
) -> Result<Operation> {
    let mut acc: Option<Operation> = None;
    let mut filters: Vec<Expr> = Vec::new();

    for child in children {
        match child {
            GraphPattern::Filter { expr, .. } => {
                filters.push(translate_expression(expr, resolver)?);
            }
            GraphPattern::Optional { pattern, .. } => {
                let (right, filter) = split_optional(pattern, resolver)?;
                let left = acc.take().unwrap_or_else(Operation::unit);
                acc = Some(Operation::LeftJoin {
                    left: Box::new(left),
                    right: Box::new(right),
                    filter,
                });
            }
            GraphPattern::Bind { expr, var, .. } => {
                let input = acc.take().unwrap_or_else(Operation::unit);
                acc = Some(Operation::Extend {
                    input: Box::new(input),
                    var: var.name.clone(),
                    expr: translate_expression(expr, resolver)?,
                });
            }
            other => {
                let translated = translate_pattern(other, resolver)?;
                acc = Some(match acc.take() {
                    Some(left) => Operation::Join {
                        left: Box::new(left),
                        right: Box::new(translated),
                    },
                    None => translated,
                });
            }
        }
    }

    let mut operation = acc.unwrap_or_else(Operation::unit);
    for expr in filters {
        operation = Operation::Filter {
            expr,
            input: Box::new(operation),
        };
    }
    Ok(operation)
}

/// Translate an OPTIONAL body, hoisting its top-level filters into the
/// left join condition.
fn split_optional(
    pattern: &GraphPattern,
    resolver: &Resolver,
) -> Result<(Operation, Option<Expr>)> {
    match pattern {
        GraphPattern::Group { patterns, .. } => {
            let mut condition: Option<Expr> = None;
            for child in patterns {
                if let GraphPattern::Filter { expr, .. } = child {
                    let translated = translate_expression(expr, resolver)?;
                    condition = Some(match condition.take() {
                        Some(prev) => Expr::binary(BinaryOp::And, prev, translated),
                        None => translated,
                    });
                }
            }
            let rest: Vec<&GraphPattern> = patterns
                .iter()
                .filter(|child| !matches!(child, GraphPattern::Filter { .. }))
                .collect();
            let inner = translate_group(rest.into_iter(), resolver)?;
            Ok((inner, condition))
        }
        other => Ok((translate_pattern(other, resolver)?, None)),
    }
}
