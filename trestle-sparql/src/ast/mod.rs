//! SPARQL abstract syntax tree.
//!
//! The AST mirrors the surface syntax: IRIs keep their prefixed form,
//! every node carries a [`SourceSpan`](crate::span::SourceSpan), and
//! nothing is resolved or rewritten. Translation to executable algebra
//! happens downstream.

pub mod expr;
pub mod pattern;
pub mod query;
pub mod term;

// Terms
pub use term::{
    BlankNode, Iri, IriValue, Literal, LiteralValue, ObjectTerm, PredicateTerm, SubjectTerm, Term,
    Var,
};

// Expressions
pub use expr::{AggregateFunction, BinaryOp, Expression, FunctionName, UnaryOp};

// Patterns
pub use pattern::{GraphPattern, TriplePattern};

// Queries
pub use query::{
    AskQuery, BaseDecl, ConstructQuery, ConstructTemplate, GroupByClause, GroupCondition,
    HavingClause, LimitClause, OffsetClause, OrderByClause, OrderCondition, OrderDirection,
    OrderExpr, PrefixDecl, Prologue, Query, QueryBody, SelectClause, SelectModifier, SelectQuery,
    SelectVariable, SelectVariables, SolutionModifiers, WhereClause,
};
