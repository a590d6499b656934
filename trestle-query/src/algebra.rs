//! Query algebra
//!
//! The translator lowers a parsed query into a tree of [`Operation`]
//! nodes; the optimizer rewrites the tree and the executor evaluates
//! it. All IRIs are fully resolved here: prefixed names were expanded
//! against the prologue during translation, so algebra terms are plain
//! [`trestle_core`] values.
//!
//! # Design
//!
//! - `Operation` is a closed enum; translator, optimizer, and executor
//!   match exhaustively, so adding a node kind is a compile-checked
//!   change in all three.
//! - Aggregate calls never appear inside `Expr`. They live on `Group`
//!   nodes as [`AggregateCall`]s, and expressions reference their
//!   output variables instead.

use std::collections::HashSet;
use std::sync::Arc;

use trestle_core::Term;
use trestle_sparql::ast::{BinaryOp, FunctionName, UnaryOp};

/// One position of a triple pattern: a variable or a ground term.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternTerm {
    /// Variable to bind (blank nodes in WHERE become variables too)
    Var(Arc<str>),
    /// Ground term that must match exactly
    Ground(Term),
}

impl PatternTerm {
    pub fn as_var(&self) -> Option<&Arc<str>> {
        match self {
            PatternTerm::Var(name) => Some(name),
            PatternTerm::Ground(_) => None,
        }
    }

    pub fn is_ground(&self) -> bool {
        matches!(self, PatternTerm::Ground(_))
    }
}

/// A resolved triple pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

impl TriplePattern {
    pub fn new(subject: PatternTerm, predicate: PatternTerm, object: PatternTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Variables of this pattern in subject, predicate, object order.
    pub fn variables(&self) -> impl Iterator<Item = &Arc<str>> {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter_map(PatternTerm::as_var)
    }
}

/// A resolved scalar expression, used by Filter, Extend, LeftJoin
/// conditions, and OrderBy keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Variable reference
    Var(Arc<str>),
    /// Ground term (literal or IRI constant)
    Term(Term),
    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Built-in function call
    Function { name: FunctionName, args: Vec<Expr> },
    /// IF(condition, then, else)
    If {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// COALESCE(expr, ...)
    Coalesce(Vec<Expr>),
    /// expr [NOT] IN (list)
    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// All variables referenced anywhere in this expression.
    pub fn variables(&self) -> HashSet<Arc<str>> {
        let mut vars = HashSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, out: &mut HashSet<Arc<str>>) {
        match self {
            Expr::Var(name) => {
                out.insert(name.clone());
            }
            Expr::Term(_) => {}
            Expr::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Expr::Unary { operand, .. } => operand.collect_variables(out),
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
            Expr::If {
                condition,
                then_expr,
                else_expr,
            } => {
                condition.collect_variables(out);
                then_expr.collect_variables(out);
                else_expr.collect_variables(out);
            }
            Expr::Coalesce(args) => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
            Expr::In { expr, list, .. } => {
                expr.collect_variables(out);
                for item in list {
                    item.collect_variables(out);
                }
            }
        }
    }
}

/// An aggregate invocation attached to a Group node.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    /// Output variable the result binds to
    pub output: Arc<str>,
    /// Which aggregate to run
    pub name: AggregateName,
    /// Input expression evaluated per group member; `None` for COUNT(*)
    pub input: Option<Expr>,
    /// Deduplicate input values before accumulation
    pub distinct: bool,
    /// GROUP_CONCAT separator override
    pub separator: Option<Arc<str>>,
}

impl AggregateCall {
    /// Two calls compute the same value when everything but the output
    /// variable matches. Used to share one accumulator between SELECT
    /// and HAVING.
    pub fn same_computation(&self, other: &AggregateCall) -> bool {
        self.name == other.name
            && self.input == other.input
            && self.distinct == other.distinct
            && self.separator == other.separator
    }
}

/// Aggregate addressed by keyword or by IRI.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateName {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    GroupConcat,
    Sample,
    /// Extended built-in or custom aggregate, resolved against the
    /// registry at execution time
    Iri(Arc<str>),
}

/// One ORDER BY key.
#[derive(Debug, Clone, PartialEq)]
pub struct SortCondition {
    pub expr: Expr,
    pub descending: bool,
}

/// A node of the algebra tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Basic graph pattern: triple patterns matched in order, joined
    /// on shared variables. An empty Bgp yields a single empty
    /// solution.
    Bgp(Vec<TriplePattern>),

    /// Inner join of two sub-results on compatible bindings
    Join {
        left: Box<Operation>,
        right: Box<Operation>,
    },

    /// Left outer join; `filter` is evaluated against the merged
    /// solution before it counts as a match
    LeftJoin {
        left: Box<Operation>,
        right: Box<Operation>,
        filter: Option<Expr>,
    },

    /// Keep solutions whose condition has effective boolean value true
    Filter { expr: Expr, input: Box<Operation> },

    /// Concatenation of both branches, in order
    Union {
        left: Box<Operation>,
        right: Box<Operation>,
    },

    /// Bind a new variable to an expression value
    Extend {
        input: Box<Operation>,
        var: Arc<str>,
        expr: Expr,
    },

    /// Partition by group variables and fold each aggregate over the
    /// partition members
    Group {
        input: Box<Operation>,
        variables: Vec<Arc<str>>,
        aggregates: Vec<AggregateCall>,
    },

    /// Restrict solutions to the listed variables
    Project {
        input: Box<Operation>,
        variables: Vec<Arc<str>>,
    },

    /// Stable sort by the given keys
    OrderBy {
        input: Box<Operation>,
        conditions: Vec<SortCondition>,
    },

    /// Remove duplicate solutions, keeping the first occurrence
    Distinct { input: Box<Operation> },

    /// OFFSET then LIMIT
    Slice {
        input: Box<Operation>,
        offset: u64,
        limit: Option<u64>,
    },
}

impl Operation {
    /// An operation producing exactly one empty solution.
    pub fn unit() -> Self {
        Operation::Bgp(Vec::new())
    }

    /// Short label for tracing.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Bgp(_) => "bgp",
            Operation::Join { .. } => "join",
            Operation::LeftJoin { .. } => "left_join",
            Operation::Filter { .. } => "filter",
            Operation::Union { .. } => "union",
            Operation::Extend { .. } => "extend",
            Operation::Group { .. } => "group",
            Operation::Project { .. } => "project",
            Operation::OrderBy { .. } => "order_by",
            Operation::Distinct { .. } => "distinct",
            Operation::Slice { .. } => "slice",
        }
    }

    /// Variables this operation can bind, in first-mention order.
    ///
    /// LeftJoin includes right-side variables even though they may
    /// stay unbound; Group narrows to its keys and aggregate outputs.
    pub fn visible_variables(&self) -> Vec<Arc<str>> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        self.collect_visible(&mut ordered, &mut seen);
        ordered
    }

    fn collect_visible(&self, ordered: &mut Vec<Arc<str>>, seen: &mut HashSet<Arc<str>>) {
        let mut push = |name: &Arc<str>, ordered: &mut Vec<Arc<str>>, seen: &mut HashSet<Arc<str>>| {
            if seen.insert(name.clone()) {
                ordered.push(name.clone());
            }
        };

        match self {
            Operation::Bgp(patterns) => {
                for pattern in patterns {
                    for var in pattern.variables() {
                        push(var, ordered, seen);
                    }
                }
            }
            Operation::Join { left, right }
            | Operation::LeftJoin { left, right, .. }
            | Operation::Union { left, right } => {
                left.collect_visible(ordered, seen);
                right.collect_visible(ordered, seen);
            }
            Operation::Filter { input, .. }
            | Operation::OrderBy { input, .. }
            | Operation::Distinct { input }
            | Operation::Slice { input, .. } => input.collect_visible(ordered, seen),
            Operation::Extend { input, var, .. } => {
                input.collect_visible(ordered, seen);
                push(var, ordered, seen);
            }
            Operation::Group {
                variables,
                aggregates,
                ..
            } => {
                for var in variables {
                    push(var, ordered, seen);
                }
                for call in aggregates {
                    push(&call.output, ordered, seen);
                }
            }
            Operation::Project { variables, .. } => {
                for var in variables {
                    push(var, ordered, seen);
                }
            }
        }
    }
}

/// CONSTRUCT template position: blank nodes stay distinct from
/// variables because they are freshly instantiated per solution.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateTerm {
    Var(Arc<str>),
    Ground(Term),
    Blank(Arc<str>),
}

/// One triple of a CONSTRUCT template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateTriple {
    pub subject: TemplateTerm,
    pub predicate: TemplateTerm,
    pub object: TemplateTerm,
}

/// What the query returns.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryForm {
    /// Rows plus the ordered output variable list
    Select { variables: Vec<Arc<str>> },
    /// Triples built from a template, one instantiation per solution
    Construct { template: Vec<TemplateTriple> },
    /// True iff at least one solution exists
    Ask,
}

/// A fully translated query: form plus the root of the algebra tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    pub form: QueryForm,
    pub root: Operation,
}
