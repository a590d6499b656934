//! Graph pattern types for WHERE clauses.

use super::expr::Expression;
use super::term::{ObjectTerm, PredicateTerm, SubjectTerm, Var};
use crate::span::SourceSpan;

/// A triple pattern: subject, predicate, object, any of which may be
/// a variable.
#[derive(Clone, Debug, PartialEq)]
pub struct TriplePattern {
    pub subject: SubjectTerm,
    pub predicate: PredicateTerm,
    pub object: ObjectTerm,
    pub span: SourceSpan,
}

impl TriplePattern {
    pub fn new(
        subject: SubjectTerm,
        predicate: PredicateTerm,
        object: ObjectTerm,
        span: SourceSpan,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            span,
        }
    }
}

/// A graph pattern inside a WHERE clause.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphPattern {
    /// Basic graph pattern: a conjunction of triple patterns
    Bgp {
        patterns: Vec<TriplePattern>,
        span: SourceSpan,
    },

    /// Group of patterns evaluated in sequence (joined)
    Group {
        patterns: Vec<GraphPattern>,
        span: SourceSpan,
    },

    /// OPTIONAL { ... }
    Optional {
        pattern: Box<GraphPattern>,
        span: SourceSpan,
    },

    /// { ... } UNION { ... }
    Union {
        left: Box<GraphPattern>,
        right: Box<GraphPattern>,
        span: SourceSpan,
    },

    /// FILTER constraint
    Filter { expr: Expression, span: SourceSpan },

    /// BIND(expr AS ?var)
    Bind {
        expr: Expression,
        var: Var,
        span: SourceSpan,
    },
}

impl GraphPattern {
    /// Get the source span of this pattern.
    pub fn span(&self) -> SourceSpan {
        match self {
            GraphPattern::Bgp { span, .. }
            | GraphPattern::Group { span, .. }
            | GraphPattern::Optional { span, .. }
            | GraphPattern::Union { span, .. }
            | GraphPattern::Filter { span, .. }
            | GraphPattern::Bind { span, .. } => *span,
        }
    }

    /// Create a group pattern, collapsing a single-element group to
    /// its only member.
    pub fn group(mut patterns: Vec<GraphPattern>, span: SourceSpan) -> Self {
        if patterns.len() == 1 {
            patterns.remove(0)
        } else {
            GraphPattern::Group { patterns, span }
        }
    }

    /// Create an empty basic graph pattern (matches a single empty
    /// solution).
    pub fn empty_bgp(span: SourceSpan) -> Self {
        GraphPattern::Bgp {
            patterns: Vec::new(),
            span,
        }
    }
}
