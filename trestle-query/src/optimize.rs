//! Algebra optimizer
//!
//! Semantics-preserving rewrites applied between translation and
//! execution. The output solution set never changes, only the work
//! done to produce it.
//!
//! Two rewrites run in order:
//!
//! 1. Filter pushdown: each Filter sinks toward the patterns that bind
//!    its variables, so non-matching rows drop before joins multiply
//!    them.
//! 2. BGP reordering: triple patterns within one Bgp are greedily
//!    reordered most-selective-first, counting variables bound by
//!    earlier patterns as fixed.

use std::collections::HashSet;
use std::sync::Arc;

use crate::algebra::{Expr, Operation, PatternTerm, TriplePattern};

/// Rewrite an operation tree for cheaper evaluation.
pub fn optimize(op: Operation) -> Operation {
    let op = push_filters(op);
    let op = reorder_bgps(op);
    tracing::debug!(root = op.label(), "optimized plan");
    op
}

// ======================================================================
// Filter pushdown
// ======================================================================

fn push_filters(op: Operation) -> Operation {
    match op {
        Operation::Filter { expr, input } => {
            let input = push_filters(*input);
            sink_filter(expr, input)
        }
        Operation::Join { left, right } => Operation::Join {
            left: Box::new(push_filters(*left)),
            right: Box::new(push_filters(*right)),
        },
        Operation::LeftJoin {
            left,
            right,
            filter,
        } => Operation::LeftJoin {
            left: Box::new(push_filters(*left)),
            right: Box::new(push_filters(*right)),
            filter,
        },
        Operation::Union { left, right } => Operation::Union {
            left: Box::new(push_filters(*left)),
            right: Box::new(push_filters(*right)),
        },
        Operation::Extend { input, var, expr } => Operation::Extend {
            input: Box::new(push_filters(*input)),
            var,
            expr,
        },
        Operation::Group {
            input,
            variables,
            aggregates,
        } => Operation::Group {
            input: Box::new(push_filters(*input)),
            variables,
            aggregates,
        },
        Operation::Project { input, variables } => Operation::Project {
            input: Box::new(push_filters(*input)),
            variables,
        },
        Operation::OrderBy { input, conditions } => Operation::OrderBy {
            input: Box::new(push_filters(*input)),
            conditions,
        },
        Operation::Distinct { input } => Operation::Distinct {
            input: Box::new(push_filters(*input)),
        },
        Operation::Slice {
            input,
            offset,
            limit,
        } => Operation::Slice {
            input: Box::new(push_filters(*input)),
            offset,
            limit,
        },
        Operation::Bgp(patterns) => Operation::Bgp(patterns),
    }
}

/// Sink one filter as deep as legality allows, wrapping the node where
/// it stops.
///
/// Legal moves: into whichever Join side binds every referenced
/// variable, into the left side of a LeftJoin (the right side's rows
/// are conditional, so filtering there would change which left rows
/// survive), into both Union branches when each binds every referenced
/// variable, and past an Extend that does not define a referenced
/// variable. Everything else is a barrier.
fn sink_filter(expr: Expr, input: Operation) -> Operation {
    let needed = expr.variables();
    match input {
        Operation::Join { left, right } => {
            if binds_all(&left, &needed) {
                Operation::Join {
                    left: Box::new(sink_filter(expr, *left)),
                    right,
                }
            } else if binds_all(&right, &needed) {
                Operation::Join {
                    left,
                    right: Box::new(sink_filter(expr, *right)),
                }
            } else {
                wrap(expr, Operation::Join { left, right })
            }
        }
        Operation::LeftJoin {
            left,
            right,
            filter,
        } => {
            if binds_all(&left, &needed) {
                Operation::LeftJoin {
                    left: Box::new(sink_filter(expr, *left)),
                    right,
                    filter,
                }
            } else {
                wrap(
                    expr,
                    Operation::LeftJoin {
                        left,
                        right,
                        filter,
                    },
                )
            }
        }
        Operation::Union { left, right } => {
            if binds_all(&left, &needed) && binds_all(&right, &needed) {
                Operation::Union {
                    left: Box::new(sink_filter(expr.clone(), *left)),
                    right: Box::new(sink_filter(expr, *right)),
                }
            } else {
                wrap(expr, Operation::Union { left, right })
            }
        }
        Operation::Extend {
            input: inner,
            var,
            expr: binding,
        } => {
            if needed.contains(&var) {
                wrap(
                    expr,
                    Operation::Extend {
                        input: inner,
                        var,
                        expr: binding,
                    },
                )
            } else {
                Operation::Extend {
                    input: Box::new(sink_filter(expr, *inner)),
                    var,
                    expr: binding,
                }
            }
        }
        // Sibling filters commute, keep sinking through them.
        Operation::Filter {
            expr: sibling,
            input: inner,
        } => Operation::Filter {
            expr: sibling,
            input: Box::new(sink_filter(expr, *inner)),
        },
        barrier => wrap(expr, barrier),
    }
}

fn binds_all(op: &Operation, needed: &HashSet<Arc<str>>) -> bool {
    let visible: HashSet<Arc<str>> = op.visible_variables().into_iter().collect();
    needed.iter().all(|var| visible.contains(var))
}

fn wrap(expr: Expr, input: Operation) -> Operation {
    Operation::Filter {
        expr,
        input: Box::new(input),
    }
}

// ======================================================================
// BGP reordering
// ======================================================================

/// Pattern shape classes, most selective first. Derived ordering gives
/// the greedy reorder its priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PatternClass {
    /// All three positions fixed
    ExactMatch,
    /// Subject and object fixed
    BoundSubjectObject,
    /// Subject fixed
    BoundSubject,
    /// Object fixed
    BoundObject,
    /// Only the predicate fixed
    PropertyScan,
    /// Nothing fixed, full scan
    FullScan,
}

/// Classify a pattern, counting variables bound by earlier patterns as
/// fixed.
fn classify(pattern: &TriplePattern, bound: &HashSet<Arc<str>>) -> PatternClass {
    let s = is_fixed(&pattern.subject, bound);
    let p = is_fixed(&pattern.predicate, bound);
    let o = is_fixed(&pattern.object, bound);
    match (s, p, o) {
        (true, true, true) => PatternClass::ExactMatch,
        (true, _, true) => PatternClass::BoundSubjectObject,
        (true, _, false) => PatternClass::BoundSubject,
        (false, _, true) => PatternClass::BoundObject,
        (false, true, false) => PatternClass::PropertyScan,
        (false, false, false) => PatternClass::FullScan,
    }
}

fn is_fixed(term: &PatternTerm, bound: &HashSet<Arc<str>>) -> bool {
    match term {
        PatternTerm::Ground(_) => true,
        PatternTerm::Var(name) => bound.contains(name),
    }
}

fn reorder_bgps(op: Operation) -> Operation {
    match op {
        Operation::Bgp(patterns) => Operation::Bgp(reorder_patterns(patterns)),
        Operation::Join { left, right } => Operation::Join {
            left: Box::new(reorder_bgps(*left)),
            right: Box::new(reorder_bgps(*right)),
        },
        Operation::LeftJoin {
            left,
            right,
            filter,
        } => Operation::LeftJoin {
            left: Box::new(reorder_bgps(*left)),
            right: Box::new(reorder_bgps(*right)),
            filter,
        },
        Operation::Union { left, right } => Operation::Union {
            left: Box::new(reorder_bgps(*left)),
            right: Box::new(reorder_bgps(*right)),
        },
        Operation::Filter { expr, input } => Operation::Filter {
            expr,
            input: Box::new(reorder_bgps(*input)),
        },
        Operation::Extend { input, var, expr } => Operation::Extend {
            input: Box::new(reorder_bgps(*input)),
            var,
            expr,
        },
        Operation::Group {
            input,
            variables,
            aggregates,
        } => Operation::Group {
            input: Box::new(reorder_bgps(*input)),
            variables,
            aggregates,
        },
        Operation::Project { input, variables } => Operation::Project {
            input: Box::new(reorder_bgps(*input)),
            variables,
        },
        Operation::OrderBy { input, conditions } => Operation::OrderBy {
            input: Box::new(reorder_bgps(*input)),
            conditions,
        },
        Operation::Distinct { input } => Operation::Distinct {
            input: Box::new(reorder_bgps(*input)),
        },
        Operation::Slice {
            input,
            offset,
            limit,
        } => Operation::Slice {
            input: Box::new(reorder_bgps(*input)),
            offset,
            limit,
        },
    }
}

/// Greedy most-selective-first ordering. Ties keep source order, so
/// plans stay deterministic.
fn reorder_patterns(mut patterns: Vec<TriplePattern>) -> Vec<TriplePattern> {
    let mut bound: HashSet<Arc<str>> = HashSet::new();
    let mut ordered = Vec::with_capacity(patterns.len());

    while let Some(best) = patterns
        .iter()
        .enumerate()
        .min_by_key(|(_, pattern)| classify(pattern, &bound))
        .map(|(index, _)| index)
    {
        let pattern = patterns.remove(best);
        for var in pattern.variables() {
            bound.insert(var.clone());
        }
        ordered.push(pattern);
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use trestle_core::{Iri, Literal, Term};
    use trestle_sparql::ast::BinaryOp;

    fn var(name: &str) -> PatternTerm {
        PatternTerm::Var(Arc::from(name))
    }

    fn iri(value: &str) -> PatternTerm {
        PatternTerm::Ground(Term::Iri(Iri::new(value)))
    }

    fn pattern(s: PatternTerm, p: PatternTerm, o: PatternTerm) -> TriplePattern {
        TriplePattern::new(s, p, o)
    }

    fn gt_ten(name: &str) -> Expr {
        Expr::binary(
            BinaryOp::Gt,
            Expr::Var(Arc::from(name)),
            Expr::Term(Term::Literal(Literal::integer(10))),
        )
    }

    #[test]
    fn filter_sinks_into_the_covering_join_side() {
        let op = Operation::Filter {
            expr: gt_ten("age"),
            input: Box::new(Operation::Join {
                left: Box::new(Operation::Bgp(vec![pattern(
                    var("s"),
                    iri("urn:name"),
                    var("name"),
                )])),
                right: Box::new(Operation::Bgp(vec![pattern(
                    var("s"),
                    iri("urn:age"),
                    var("age"),
                )])),
            }),
        };
        match optimize(op) {
            Operation::Join { left, right } => {
                assert!(matches!(*left, Operation::Bgp(_)));
                assert!(matches!(*right, Operation::Filter { .. }));
            }
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn filter_needing_both_sides_stays_above_the_join() {
        let cross = Expr::binary(
            BinaryOp::Lt,
            Expr::Var(Arc::from("a")),
            Expr::Var(Arc::from("b")),
        );
        let op = Operation::Filter {
            expr: cross,
            input: Box::new(Operation::Join {
                left: Box::new(Operation::Bgp(vec![pattern(var("s"), iri("urn:a"), var("a"))])),
                right: Box::new(Operation::Bgp(vec![pattern(var("s"), iri("urn:b"), var("b"))])),
            }),
        };
        assert!(matches!(optimize(op), Operation::Filter { .. }));
    }

    #[test]
    fn filter_on_right_side_variables_stays_above_a_left_join() {
        let op = Operation::Filter {
            expr: gt_ten("age"),
            input: Box::new(Operation::LeftJoin {
                left: Box::new(Operation::Bgp(vec![pattern(
                    var("s"),
                    iri("urn:name"),
                    var("name"),
                )])),
                right: Box::new(Operation::Bgp(vec![pattern(
                    var("s"),
                    iri("urn:age"),
                    var("age"),
                )])),
                filter: None,
            }),
        };
        assert!(matches!(optimize(op), Operation::Filter { .. }));
    }

    #[test]
    fn filter_on_left_side_variables_sinks_into_a_left_join() {
        let op = Operation::Filter {
            expr: gt_ten("score"),
            input: Box::new(Operation::LeftJoin {
                left: Box::new(Operation::Bgp(vec![pattern(
                    var("s"),
                    iri("urn:score"),
                    var("score"),
                )])),
                right: Box::new(Operation::Bgp(vec![pattern(
                    var("s"),
                    iri("urn:age"),
                    var("age"),
                )])),
                filter: None,
            }),
        };
        match optimize(op) {
            Operation::LeftJoin { left, .. } => {
                assert!(matches!(*left, Operation::Filter { .. }));
            }
            other => panic!("expected left join, got {other:?}"),
        }
    }

    #[test]
    fn filter_splits_into_union_branches_binding_its_variables() {
        let op = Operation::Filter {
            expr: gt_ten("v"),
            input: Box::new(Operation::Union {
                left: Box::new(Operation::Bgp(vec![pattern(var("s"), iri("urn:a"), var("v"))])),
                right: Box::new(Operation::Bgp(vec![pattern(var("s"), iri("urn:b"), var("v"))])),
            }),
        };
        match optimize(op) {
            Operation::Union { left, right } => {
                assert!(matches!(*left, Operation::Filter { .. }));
                assert!(matches!(*right, Operation::Filter { .. }));
            }
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn filter_passes_an_unrelated_extend() {
        let op = Operation::Filter {
            expr: gt_ten("age"),
            input: Box::new(Operation::Extend {
                input: Box::new(Operation::Bgp(vec![pattern(
                    var("s"),
                    iri("urn:age"),
                    var("age"),
                )])),
                var: Arc::from("label"),
                expr: Expr::Term(Term::Literal(Literal::simple("x"))),
            }),
        };
        match optimize(op) {
            Operation::Extend { input, .. } => {
                assert!(matches!(*input, Operation::Filter { .. }));
            }
            other => panic!("expected extend, got {other:?}"),
        }
    }

    #[test]
    fn filter_stops_at_the_extend_defining_its_variable() {
        let op = Operation::Filter {
            expr: gt_ten("doubled"),
            input: Box::new(Operation::Extend {
                input: Box::new(Operation::Bgp(vec![pattern(
                    var("s"),
                    iri("urn:age"),
                    var("age"),
                )])),
                var: Arc::from("doubled"),
                expr: Expr::Var(Arc::from("age")),
            }),
        };
        assert!(matches!(optimize(op), Operation::Filter { .. }));
    }

    #[test]
    fn bgp_reorder_puts_selective_patterns_first() {
        let scan = pattern(var("s"), var("p"), var("o"));
        let exact = pattern(iri("urn:s1"), iri("urn:p1"), iri("urn:o1"));
        let by_subject = pattern(iri("urn:s1"), iri("urn:p2"), var("x"));

        match optimize(Operation::Bgp(vec![scan.clone(), by_subject.clone(), exact.clone()])) {
            Operation::Bgp(ordered) => {
                assert_eq!(ordered[0], exact);
                assert_eq!(ordered[1], by_subject);
                assert_eq!(ordered[2], scan);
            }
            other => panic!("expected bgp, got {other:?}"),
        }
    }

    #[test]
    fn bgp_reorder_counts_earlier_bindings_as_fixed() {
        // After the subject-bound pattern runs, ?x is bound, making the
        // second pattern subject-fixed rather than a full scan.
        let seed = pattern(iri("urn:s1"), iri("urn:knows"), var("x"));
        let chained = pattern(var("x"), var("p"), var("o"));
        let unrelated = pattern(var("a"), iri("urn:name"), var("n"));

        match optimize(Operation::Bgp(vec![chained.clone(), unrelated.clone(), seed.clone()])) {
            Operation::Bgp(ordered) => {
                assert_eq!(ordered[0], seed);
                assert_eq!(ordered[1], chained);
                assert_eq!(ordered[2], unrelated);
            }
            other => panic!("expected bgp, got {other:?}"),
        }
    }

    #[test]
    fn ties_keep_source_order() {
        let first = pattern(var("s"), iri("urn:a"), var("x"));
        let second = pattern(var("s"), iri("urn:b"), var("y"));
        match optimize(Operation::Bgp(vec![first.clone(), second.clone()])) {
            Operation::Bgp(ordered) => {
                assert_eq!(ordered, vec![first, second]);
            }
            other => panic!("expected bgp, got {other:?}"),
        }
    }
}
