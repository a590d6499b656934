//! Top-level SPARQL query types.
//!
//! This module defines the prologue (BASE/PREFIX), the three query
//! forms (SELECT, CONSTRUCT, ASK), and the solution modifiers
//! (GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET).

use super::expr::Expression;
use super::pattern::{GraphPattern, TriplePattern};
use super::term::Var;
use crate::span::SourceSpan;
use std::sync::Arc;

/// A complete parsed SPARQL query.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    /// The prologue (BASE and PREFIX declarations)
    pub prologue: Prologue,
    /// The query body
    pub body: QueryBody,
    /// Source span for the entire query
    pub span: SourceSpan,
}

impl Query {
    pub fn new(prologue: Prologue, body: QueryBody, span: SourceSpan) -> Self {
        Self {
            prologue,
            body,
            span,
        }
    }
}

/// The body of a SPARQL query.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryBody {
    /// SELECT query
    Select(SelectQuery),
    /// CONSTRUCT query
    Construct(ConstructQuery),
    /// ASK query
    Ask(AskQuery),
}

/// The query prologue containing BASE and PREFIX declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Prologue {
    /// Base IRI declaration
    pub base: Option<BaseDecl>,
    /// Prefix declarations
    pub prefixes: Vec<PrefixDecl>,
}

impl Prologue {
    /// Create an empty prologue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a base declaration.
    pub fn with_base(mut self, base: BaseDecl) -> Self {
        self.base = Some(base);
        self
    }

    /// Add a prefix declaration.
    pub fn with_prefix(mut self, prefix: PrefixDecl) -> Self {
        self.prefixes.push(prefix);
        self
    }

    /// Look up a prefix namespace. Later declarations shadow earlier
    /// ones with the same prefix.
    pub fn get_prefix(&self, prefix: &str) -> Option<&Arc<str>> {
        self.prefixes
            .iter()
            .rev()
            .find(|p| p.prefix.as_ref() == prefix)
            .map(|p| &p.iri)
    }
}

/// A BASE declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseDecl {
    /// The base IRI
    pub iri: Arc<str>,
    /// Source span
    pub span: SourceSpan,
}

impl BaseDecl {
    pub fn new(iri: impl AsRef<str>, span: SourceSpan) -> Self {
        Self {
            iri: Arc::from(iri.as_ref()),
            span,
        }
    }
}

/// A PREFIX declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct PrefixDecl {
    /// The prefix (empty string for the default prefix)
    pub prefix: Arc<str>,
    /// The namespace IRI
    pub iri: Arc<str>,
    /// Source span
    pub span: SourceSpan,
}

impl PrefixDecl {
    pub fn new(prefix: impl AsRef<str>, iri: impl AsRef<str>, span: SourceSpan) -> Self {
        Self {
            prefix: Arc::from(prefix.as_ref()),
            iri: Arc::from(iri.as_ref()),
            span,
        }
    }
}

/// A SELECT query.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectQuery {
    /// Select clause (variables or expressions)
    pub select: SelectClause,
    /// WHERE clause
    pub where_clause: WhereClause,
    /// Solution modifiers
    pub modifiers: SolutionModifiers,
    /// Source span
    pub span: SourceSpan,
}

impl SelectQuery {
    pub fn new(
        select: SelectClause,
        where_clause: WhereClause,
        modifiers: SolutionModifiers,
        span: SourceSpan,
    ) -> Self {
        Self {
            select,
            where_clause,
            modifiers,
            span,
        }
    }
}

/// The SELECT clause specifying what to return.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectClause {
    /// Modifier (DISTINCT, REDUCED, or none)
    pub modifier: Option<SelectModifier>,
    /// Variables to select (* for all, or a specific list)
    pub variables: SelectVariables,
    /// Source span
    pub span: SourceSpan,
}

impl SelectClause {
    /// Create a SELECT * clause.
    pub fn star(span: SourceSpan) -> Self {
        Self {
            modifier: None,
            variables: SelectVariables::Star,
            span,
        }
    }

    /// Create a SELECT with specific variables.
    pub fn variables(vars: Vec<SelectVariable>, span: SourceSpan) -> Self {
        Self {
            modifier: None,
            variables: SelectVariables::Explicit(vars),
            span,
        }
    }
}

/// SELECT modifier (DISTINCT or REDUCED).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectModifier {
    Distinct,
    Reduced,
}

/// Variables selected by a SELECT clause.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectVariables {
    /// SELECT * (all visible variables)
    Star,
    /// Explicit list of variables and expressions
    Explicit(Vec<SelectVariable>),
}

/// A variable or aliased expression in a SELECT clause.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectVariable {
    /// Simple variable
    Var(Var),
    /// Expression with alias: `(expr AS ?var)`
    Expr {
        expr: Expression,
        alias: Var,
        /// Full span including parens
        span: SourceSpan,
    },
}

impl SelectVariable {
    /// Get the variable this projection binds.
    pub fn var(&self) -> &Var {
        match self {
            SelectVariable::Var(v) => v,
            SelectVariable::Expr { alias, .. } => alias,
        }
    }

    /// Get the source span.
    pub fn span(&self) -> SourceSpan {
        match self {
            SelectVariable::Var(v) => v.span,
            SelectVariable::Expr { span, .. } => *span,
        }
    }
}

/// The WHERE clause containing the graph pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct WhereClause {
    /// Whether the WHERE keyword was present (it is optional)
    pub has_where_keyword: bool,
    /// The graph pattern
    pub pattern: GraphPattern,
    /// Source span
    pub span: SourceSpan,
}

impl WhereClause {
    pub fn new(pattern: GraphPattern, has_where_keyword: bool, span: SourceSpan) -> Self {
        Self {
            has_where_keyword,
            pattern,
            span,
        }
    }
}

/// Solution modifiers (GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolutionModifiers {
    /// GROUP BY clause
    pub group_by: Option<GroupByClause>,
    /// HAVING clause
    pub having: Option<HavingClause>,
    /// ORDER BY clause
    pub order_by: Option<OrderByClause>,
    /// LIMIT value
    pub limit: Option<LimitClause>,
    /// OFFSET value
    pub offset: Option<OffsetClause>,
}

impl SolutionModifiers {
    /// Create empty modifiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ORDER BY clause.
    pub fn with_order_by(mut self, order_by: OrderByClause) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Set the LIMIT.
    pub fn with_limit(mut self, limit: LimitClause) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the OFFSET.
    pub fn with_offset(mut self, offset: OffsetClause) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the GROUP BY clause.
    pub fn with_group_by(mut self, group_by: GroupByClause) -> Self {
        self.group_by = Some(group_by);
        self
    }

    /// Set the HAVING clause.
    pub fn with_having(mut self, having: HavingClause) -> Self {
        self.having = Some(having);
        self
    }
}

/// GROUP BY clause.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupByClause {
    /// Group conditions (variables or expressions)
    pub conditions: Vec<GroupCondition>,
    /// Source span
    pub span: SourceSpan,
}

/// A condition in GROUP BY.
#[derive(Clone, Debug, PartialEq)]
pub enum GroupCondition {
    /// Variable
    Var(Var),
    /// Expression with optional AS alias
    Expr {
        expr: Expression,
        alias: Option<Var>,
        span: SourceSpan,
    },
}

/// HAVING clause.
#[derive(Clone, Debug, PartialEq)]
pub struct HavingClause {
    /// Constraint expressions (all must hold)
    pub conditions: Vec<Expression>,
    /// Source span
    pub span: SourceSpan,
}

/// ORDER BY clause.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderByClause {
    /// Order conditions, applied left to right
    pub conditions: Vec<OrderCondition>,
    /// Source span
    pub span: SourceSpan,
}

/// A condition in ORDER BY.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderCondition {
    /// The ordering expression
    pub expr: OrderExpr,
    /// Sort direction
    pub direction: OrderDirection,
    /// Source span
    pub span: SourceSpan,
}

/// An expression in ORDER BY.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderExpr {
    /// Simple variable
    Var(Var),
    /// Parenthesized expression
    Expr(Expression),
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending (default)
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// LIMIT clause.
#[derive(Clone, Debug, PartialEq)]
pub struct LimitClause {
    pub value: u64,
    pub span: SourceSpan,
}

impl LimitClause {
    pub fn new(value: u64, span: SourceSpan) -> Self {
        Self { value, span }
    }
}

/// OFFSET clause.
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetClause {
    pub value: u64,
    pub span: SourceSpan,
}

impl OffsetClause {
    pub fn new(value: u64, span: SourceSpan) -> Self {
        Self { value, span }
    }
}

/// CONSTRUCT query.
///
/// Builds RDF triples by instantiating a template once per solution.
///
/// ```sparql
/// CONSTRUCT { ?s ex:knows ?o }
/// WHERE { ?s ex:friend ?o }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructQuery {
    /// The template triples to construct
    pub template: ConstructTemplate,
    /// WHERE clause
    pub where_clause: WhereClause,
    /// Solution modifiers (ORDER BY, LIMIT, OFFSET)
    pub modifiers: SolutionModifiers,
    /// Source span
    pub span: SourceSpan,
}

impl ConstructQuery {
    pub fn new(
        template: ConstructTemplate,
        where_clause: WhereClause,
        modifiers: SolutionModifiers,
        span: SourceSpan,
    ) -> Self {
        Self {
            template,
            where_clause,
            modifiers,
            span,
        }
    }
}

/// A CONSTRUCT template.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructTemplate {
    /// Triple patterns in the template
    pub triples: Vec<TriplePattern>,
    /// Source span (including braces)
    pub span: SourceSpan,
}

impl ConstructTemplate {
    pub fn new(triples: Vec<TriplePattern>, span: SourceSpan) -> Self {
        Self { triples, span }
    }
}

/// ASK query.
///
/// Tests whether the pattern has any match, returning a boolean.
///
/// ```sparql
/// ASK { ?s ex:name "Alice" }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AskQuery {
    /// WHERE clause
    pub where_clause: WhereClause,
    /// Solution modifiers (parsed but have no effect on the boolean)
    pub modifiers: SolutionModifiers,
    /// Source span
    pub span: SourceSpan,
}

impl AskQuery {
    pub fn new(where_clause: WhereClause, span: SourceSpan) -> Self {
        Self {
            where_clause,
            modifiers: SolutionModifiers::new(),
            span,
        }
    }
}
