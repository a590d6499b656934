//! AST to algebra lowering.
//!
//! Translation is purely structural: prefixed names expand against the
//! prologue, WHERE patterns lower to operation trees, solution
//! modifiers stack above them. No optimization happens here.
//!
//! # Design
//!
//! The SELECT pipeline assembles bottom-up, in evaluation order:
//!
//! ```text
//! pattern -> [Extend: GROUP BY exprs] -> Group
//!         -> [Extend: projection exprs] -> [Filter: HAVING]
//!         -> [OrderBy] -> Project -> [Distinct] -> [Slice]
//! ```
//!
//! Ungrouped queries skip the Group stage; ORDER BY sits below Project
//! so sort keys may reference unprojected variables.

mod aggregate;
mod expression;
mod pattern;
mod term;

use std::collections::HashSet;
use std::sync::Arc;

use trestle_sparql::ast::{
    AskQuery, ConstructQuery, Expression, GroupCondition, OrderByClause, OrderDirection,
    OrderExpr, Query, QueryBody, SelectModifier, SelectQuery, SelectVariable, SelectVariables,
    SolutionModifiers,
};

use crate::algebra::{
    Expr, Operation, QueryForm, SortCondition, TemplateTriple, TranslatedQuery,
};
use crate::error::{QueryError, Result};
use crate::translate::aggregate::AggregateExtractor;
use crate::translate::expression::translate_expression;
use crate::translate::pattern::translate_pattern;
use crate::translate::term::{is_internal, Resolver};

/// Lower a parsed query to its algebra form.
pub fn translate(query: &Query) -> Result<TranslatedQuery> {
    let resolver = Resolver::new(&query.prologue);
    let translated = match &query.body {
        QueryBody::Select(select) => translate_select(select, &resolver)?,
        QueryBody::Construct(construct) => translate_construct(construct, &resolver)?,
        QueryBody::Ask(ask) => translate_ask(ask, &resolver)?,
    };
    tracing::debug!(root = translated.root.label(), "translated query");
    Ok(translated)
}

// ======================================================================
// SELECT
// ======================================================================

fn translate_select(query: &SelectQuery, resolver: &Resolver) -> Result<TranslatedQuery> {
    let mut root = translate_pattern(&query.where_clause.pattern, resolver)?;
    let modifiers = &query.modifiers;

    let select_has_aggregates = match &query.select.variables {
        SelectVariables::Explicit(items) => items.iter().any(|item| match item {
            SelectVariable::Expr { expr, .. } => expr.contains_aggregate(),
            SelectVariable::Var(_) => false,
        }),
        SelectVariables::Star => false,
    };
    let having_has_aggregates = modifiers.having.as_ref().is_some_and(|having| {
        having.conditions.iter().any(Expression::contains_aggregate)
    });
    let grouped = modifiers.group_by.is_some() || select_has_aggregates || having_has_aggregates;

    let mut projection: Vec<Arc<str>> = Vec::new();
    if grouped {
        root = translate_grouped(query, root, resolver, &mut projection)?;
    } else {
        root = translate_ungrouped(query, root, resolver, &mut projection)?;
    }

    let mut seen = HashSet::new();
    for name in &projection {
        if !seen.insert(name.clone()) {
            return Err(QueryError::Translate(format!(
                "duplicate variable in SELECT: ?{name}"
            )));
        }
    }

    if let Some(order_by) = &modifiers.order_by {
        root = Operation::OrderBy {
            input: Box::new(root),
            conditions: translate_order(order_by, resolver)?,
        };
    }

    root = Operation::Project {
        input: Box::new(root),
        variables: projection.clone(),
    };

    if query.select.modifier == Some(SelectModifier::Distinct) {
        root = Operation::Distinct {
            input: Box::new(root),
        };
    }
    // REDUCED is inert; the parser already warned about it.

    root = apply_slice(root, modifiers);

    Ok(TranslatedQuery {
        form: QueryForm::Select {
            variables: projection,
        },
        root,
    })
}

/// Ungrouped SELECT: expression items extend the solution, HAVING acts
/// as an ordinary filter.
fn translate_ungrouped(
    query: &SelectQuery,
    mut root: Operation,
    resolver: &Resolver,
    projection: &mut Vec<Arc<str>>,
) -> Result<Operation> {
    match &query.select.variables {
        SelectVariables::Star => {
            projection.extend(
                root.visible_variables()
                    .into_iter()
                    .filter(|name| !is_internal(name)),
            );
        }
        SelectVariables::Explicit(items) => {
            for item in items {
                match item {
                    SelectVariable::Var(var) => projection.push(var.name.clone()),
                    SelectVariable::Expr { expr, alias, .. } => {
                        root = Operation::Extend {
                            input: Box::new(root),
                            var: alias.name.clone(),
                            expr: translate_expression(expr, resolver)?,
                        };
                        projection.push(alias.name.clone());
                    }
                }
            }
        }
    }

    if let Some(having) = &query.modifiers.having {
        for condition in &having.conditions {
            root = Operation::Filter {
                expr: translate_expression(condition, resolver)?,
                input: Box::new(root),
            };
        }
    }
    Ok(root)
}

/// Grouped SELECT: hoist aggregates onto a Group node, stack the
/// remaining stages above it.
fn translate_grouped(
    query: &SelectQuery,
    input: Operation,
    resolver: &Resolver,
    projection: &mut Vec<Arc<str>>,
) -> Result<Operation> {
    let modifiers = &query.modifiers;

    // Group keys. GROUP BY expressions are bound below the Group node
    // so partitioning sees them as plain variables.
    let mut group_vars: Vec<Arc<str>> = Vec::new();
    let mut pre_extends: Vec<(Arc<str>, Expr)> = Vec::new();

    if let Some(group_by) = &modifiers.group_by {
        let mut next_expr_key = 0usize;
        for condition in &group_by.conditions {
            match condition {
                GroupCondition::Var(var) => group_vars.push(var.name.clone()),
                GroupCondition::Expr { expr, alias, .. } => {
                    let name: Arc<str> = match alias {
                        Some(alias) => alias.name.clone(),
                        None => {
                            let name = Arc::from(format!("__group_{next_expr_key}"));
                            next_expr_key += 1;
                            name
                        }
                    };
                    pre_extends.push((name.clone(), translate_expression(expr, resolver)?));
                    group_vars.push(name);
                }
            }
        }
    } else {
        // Implicit grouping: the plain SELECT variables are the keys.
        match &query.select.variables {
            SelectVariables::Explicit(items) => {
                for item in items {
                    if let SelectVariable::Var(var) = item {
                        group_vars.push(var.name.clone());
                    }
                }
            }
            SelectVariables::Star => {
                group_vars.extend(
                    input
                        .visible_variables()
                        .into_iter()
                        .filter(|name| !is_internal(name)),
                );
            }
        }
    }

    // Projection items. Expressions that are a single aggregate call
    // bind its output directly; anything else becomes an Extend above
    // the Group node and may only reference group keys, aggregate
    // outputs, and earlier aliases.
    let mut extractor = AggregateExtractor::new(resolver, "__agg");
    let mut post_extends: Vec<(Arc<str>, Expr)> = Vec::new();
    let mut in_scope: HashSet<Arc<str>> = group_vars.iter().cloned().collect();

    match &query.select.variables {
        SelectVariables::Star => {
            projection.extend(group_vars.iter().cloned());
        }
        SelectVariables::Explicit(items) => {
            for item in items {
                match item {
                    SelectVariable::Var(var) => {
                        if !in_scope.contains(&var.name) {
                            return Err(QueryError::Translate(format!(
                                "variable ?{} must appear in GROUP BY or inside an aggregate",
                                var.name
                            )));
                        }
                        projection.push(var.name.clone());
                    }
                    SelectVariable::Expr { expr, alias, .. } => {
                        match expr.unwrap_bracketed() {
                            Expression::Aggregate {
                                function,
                                expr: agg_input,
                                distinct,
                                separator,
                                ..
                            } => {
                                extractor.hoist_named(
                                    alias.name.clone(),
                                    function,
                                    agg_input.as_deref(),
                                    *distinct,
                                    separator.clone(),
                                )?;
                            }
                            other => {
                                let rewritten = extractor.rewrite(other)?;
                                check_group_scope(&rewritten, &in_scope, &extractor)?;
                                post_extends.push((alias.name.clone(), rewritten));
                            }
                        }
                        in_scope.insert(alias.name.clone());
                        projection.push(alias.name.clone());
                    }
                }
            }
        }
    }

    // HAVING shares accumulators with SELECT where the calls match.
    let mut having_extractor =
        AggregateExtractor::with_existing(resolver, "__having_agg", extractor.into_calls());
    let mut having_filters: Vec<Expr> = Vec::new();
    if let Some(having) = &modifiers.having {
        for condition in &having.conditions {
            having_filters.push(having_extractor.rewrite(condition)?);
        }
    }
    let aggregates = having_extractor.into_calls();

    let mut op = input;
    for (var, expr) in pre_extends {
        op = Operation::Extend {
            input: Box::new(op),
            var,
            expr,
        };
    }
    op = Operation::Group {
        input: Box::new(op),
        variables: group_vars,
        aggregates,
    };
    for (var, expr) in post_extends {
        op = Operation::Extend {
            input: Box::new(op),
            var,
            expr,
        };
    }
    for expr in having_filters {
        op = Operation::Filter {
            expr,
            input: Box::new(op),
        };
    }
    Ok(op)
}

/// Variables of a post-Group expression must survive the Group node.
fn check_group_scope(
    expr: &Expr,
    in_scope: &HashSet<Arc<str>>,
    extractor: &AggregateExtractor,
) -> Result<()> {
    for var in expr.variables() {
        if !in_scope.contains(&var) && !extractor.defines(&var) {
            return Err(QueryError::Translate(format!(
                "variable ?{var} must appear in GROUP BY or inside an aggregate"
            )));
        }
    }
    Ok(())
}

// ======================================================================
// CONSTRUCT / ASK
// ======================================================================

fn translate_construct(query: &ConstructQuery, resolver: &Resolver) -> Result<TranslatedQuery> {
    let modifiers = &query.modifiers;
    if modifiers.group_by.is_some() || modifiers.having.is_some() {
        return Err(QueryError::Translate(
            "CONSTRUCT queries do not support GROUP BY or HAVING".into(),
        ));
    }

    let mut root = translate_pattern(&query.where_clause.pattern, resolver)?;
    if let Some(order_by) = &modifiers.order_by {
        root = Operation::OrderBy {
            input: Box::new(root),
            conditions: translate_order(order_by, resolver)?,
        };
    }
    root = apply_slice(root, modifiers);

    let template = query
        .template
        .triples
        .iter()
        .map(|triple| {
            Ok(TemplateTriple {
                subject: resolver.subject_template(&triple.subject)?,
                predicate: resolver.predicate_template(&triple.predicate)?,
                object: resolver.object_template(&triple.object)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TranslatedQuery {
        form: QueryForm::Construct { template },
        root,
    })
}

fn translate_ask(query: &AskQuery, resolver: &Resolver) -> Result<TranslatedQuery> {
    // Modifiers cannot change a boolean answer, so they are ignored.
    let root = translate_pattern(&query.where_clause.pattern, resolver)?;
    Ok(TranslatedQuery {
        form: QueryForm::Ask,
        root,
    })
}

// ======================================================================
// Shared modifier lowering
// ======================================================================

fn translate_order(clause: &OrderByClause, resolver: &Resolver) -> Result<Vec<SortCondition>> {
    clause
        .conditions
        .iter()
        .map(|condition| {
            let expr = match &condition.expr {
                OrderExpr::Var(var) => Expr::Var(var.name.clone()),
                OrderExpr::Expr(expr) => translate_expression(expr, resolver)?,
            };
            Ok(SortCondition {
                expr,
                descending: condition.direction == OrderDirection::Desc,
            })
        })
        .collect()
}

fn apply_slice(root: Operation, modifiers: &SolutionModifiers) -> Operation {
    if modifiers.limit.is_none() && modifiers.offset.is_none() {
        return root;
    }
    Operation::Slice {
        input: Box::new(root),
        offset: modifiers.offset.as_ref().map_or(0, |offset| offset.value),
        limit: modifiers.limit.as_ref().map(|limit| limit.value),
    }
}
