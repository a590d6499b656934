//! SPARQL expression types.
//!
//! This module defines the AST for expressions used in FILTER, BIND,
//! SELECT (expr AS ?var), ORDER BY, and HAVING clauses. All nodes
//! carry source spans for diagnostics.

use super::term::{Iri, Literal, Var};
use crate::span::SourceSpan;
use std::sync::Arc;

/// A SPARQL expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// A variable reference
    Var(Var),

    /// A literal value
    Literal(Literal),

    /// An IRI (can appear in IN lists and comparisons)
    Iri(Iri),

    /// Binary operation (arithmetic, comparison, boolean)
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        span: SourceSpan,
    },

    /// Unary operation (negation, logical NOT)
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        span: SourceSpan,
    },

    /// Built-in function call
    FunctionCall {
        name: FunctionName,
        args: Vec<Expression>,
        span: SourceSpan,
    },

    /// IF(condition, then, else)
    If {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
        span: SourceSpan,
    },

    /// COALESCE(expr, expr, ...)
    Coalesce {
        args: Vec<Expression>,
        span: SourceSpan,
    },

    /// IN / NOT IN list membership test
    In {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
        span: SourceSpan,
    },

    /// Aggregate function call (only valid in SELECT and HAVING when
    /// the query groups solutions)
    Aggregate {
        function: AggregateFunction,
        /// `None` for COUNT(*)
        expr: Option<Box<Expression>>,
        distinct: bool,
        /// For GROUP_CONCAT
        separator: Option<Arc<str>>,
        span: SourceSpan,
    },

    /// Parenthesized expression (preserved for span accuracy)
    Bracketed {
        inner: Box<Expression>,
        span: SourceSpan,
    },
}

impl Expression {
    /// Get the source span of this expression.
    pub fn span(&self) -> SourceSpan {
        match self {
            Expression::Var(v) => v.span,
            Expression::Literal(l) => l.span,
            Expression::Iri(i) => i.span,
            Expression::Binary { span, .. } => *span,
            Expression::Unary { span, .. } => *span,
            Expression::FunctionCall { span, .. } => *span,
            Expression::If { span, .. } => *span,
            Expression::Coalesce { span, .. } => *span,
            Expression::In { span, .. } => *span,
            Expression::Aggregate { span, .. } => *span,
            Expression::Bracketed { span, .. } => *span,
        }
    }

    /// Create a binary expression.
    pub fn binary(op: BinaryOp, left: Expression, right: Expression, span: SourceSpan) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }
    }

    /// Create a unary expression.
    pub fn unary(op: UnaryOp, operand: Expression, span: SourceSpan) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
            span,
        }
    }

    /// Unwrap any bracketed expressions to get the innermost expression.
    ///
    /// `(?var)` is equivalent to `?var`; this recursively strips the
    /// `Bracketed` wrappers.
    pub fn unwrap_bracketed(&self) -> &Expression {
        match self {
            Expression::Bracketed { inner, .. } => inner.unwrap_bracketed(),
            _ => self,
        }
    }

    /// True if this expression contains an aggregate call anywhere.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::Var(_) | Expression::Literal(_) | Expression::Iri(_) => false,
            Expression::Binary { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expression::Unary { operand, .. } => operand.contains_aggregate(),
            Expression::FunctionCall { args, .. } | Expression::Coalesce { args, .. } => {
                args.iter().any(Expression::contains_aggregate)
            }
            Expression::If {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                condition.contains_aggregate()
                    || then_expr.contains_aggregate()
                    || else_expr.contains_aggregate()
            }
            Expression::In { expr, list, .. } => {
                expr.contains_aggregate() || list.iter().any(Expression::contains_aggregate)
            }
            Expression::Aggregate { .. } => true,
            Expression::Bracketed { inner, .. } => inner.contains_aggregate(),
        }
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    // Logical
    And, // &&
    Or,  // ||

    // Comparison
    Eq, // =
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=

    // Arithmetic
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
}

impl BinaryOp {
    /// Get the operator symbol as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    /// Get the precedence level (higher binds tighter).
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Mul | BinaryOp::Div => 5,
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT (!)
    Not,
    /// Arithmetic negation (-)
    Neg,
    /// Unary plus (+)
    Pos,
}

impl UnaryOp {
    /// Get the operator symbol as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
        }
    }
}

/// Built-in function names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionName {
    // Type checking
    Bound,
    IsIri,
    IsUri, // Alias for IsIri
    IsBlank,
    IsLiteral,
    IsNumeric,

    // Accessors
    Str,
    Lang,
    Datatype,

    // Strings
    Strlen,
    Ucase,
    Lcase,
    Contains,
    StrStarts,
    StrEnds,

    // Numeric
    Abs,
}

impl FunctionName {
    /// Get the function name in its canonical uppercase spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionName::Bound => "BOUND",
            FunctionName::IsIri => "ISIRI",
            FunctionName::IsUri => "ISURI",
            FunctionName::IsBlank => "ISBLANK",
            FunctionName::IsLiteral => "ISLITERAL",
            FunctionName::IsNumeric => "ISNUMERIC",
            FunctionName::Str => "STR",
            FunctionName::Lang => "LANG",
            FunctionName::Datatype => "DATATYPE",
            FunctionName::Strlen => "STRLEN",
            FunctionName::Ucase => "UCASE",
            FunctionName::Lcase => "LCASE",
            FunctionName::Contains => "CONTAINS",
            FunctionName::StrStarts => "STRSTARTS",
            FunctionName::StrEnds => "STRENDS",
            FunctionName::Abs => "ABS",
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(&self) -> usize {
        match self {
            FunctionName::Bound
            | FunctionName::IsIri
            | FunctionName::IsUri
            | FunctionName::IsBlank
            | FunctionName::IsLiteral
            | FunctionName::IsNumeric
            | FunctionName::Str
            | FunctionName::Lang
            | FunctionName::Datatype
            | FunctionName::Strlen
            | FunctionName::Ucase
            | FunctionName::Lcase
            | FunctionName::Abs => 1,
            FunctionName::Contains | FunctionName::StrStarts | FunctionName::StrEnds => 2,
        }
    }
}

/// Aggregate functions.
///
/// Seven built-in SPARQL aggregates plus IRI-named aggregates resolved
/// against a registry at query time.
#[derive(Clone, Debug, PartialEq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    GroupConcat,
    Sample,
    /// Aggregate named by IRI (extended or custom registered function)
    Custom(Iri),
}

impl AggregateFunction {
    /// Get the function name for the built-in aggregates.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::GroupConcat => "GROUP_CONCAT",
            AggregateFunction::Sample => "SAMPLE",
            AggregateFunction::Custom(_) => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::term::Literal;

    fn test_span() -> SourceSpan {
        SourceSpan::new(0, 10)
    }

    #[test]
    fn binary_op_precedence() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Eq.precedence());
        assert!(BinaryOp::Eq.precedence() > BinaryOp::And.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
    }

    #[test]
    fn expression_span() {
        let var = Expression::Var(Var::new("x", test_span()));
        assert_eq!(var.span(), test_span());

        let lit = Expression::Literal(Literal::integer(42, test_span()));
        assert_eq!(lit.span(), test_span());
    }

    #[test]
    fn unwrap_bracketed_strips_nesting() {
        let inner = Expression::Var(Var::new("x", SourceSpan::new(1, 3)));
        let wrapped = Expression::Bracketed {
            inner: Box::new(Expression::Bracketed {
                inner: Box::new(inner.clone()),
                span: SourceSpan::new(1, 3),
            }),
            span: SourceSpan::new(0, 4),
        };
        assert_eq!(wrapped.unwrap_bracketed(), &inner);
    }

    #[test]
    fn contains_aggregate_sees_through_operators() {
        let agg = Expression::Aggregate {
            function: AggregateFunction::Sum,
            expr: Some(Box::new(Expression::Var(Var::new("x", test_span())))),
            distinct: false,
            separator: None,
            span: test_span(),
        };
        let expr = Expression::binary(
            BinaryOp::Gt,
            agg,
            Expression::Literal(Literal::integer(10, test_span())),
            test_span(),
        );
        assert!(expr.contains_aggregate());

        let plain = Expression::Var(Var::new("x", test_span()));
        assert!(!plain.contains_aggregate());
    }
}
