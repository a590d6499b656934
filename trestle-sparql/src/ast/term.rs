//! SPARQL term types with source spans.
//!
//! These types represent the different kinds of terms that can appear
//! in query patterns: variables, IRIs, literals, and blank nodes.
//! IRIs stay in their written form here; prefixed names are expanded
//! against the prologue during translation, not parsing.

use crate::span::SourceSpan;
use std::sync::Arc;

use trestle_vocab::rdf;

/// A SPARQL variable (e.g., `?name` or `$name`).
///
/// The name does not include the leading `?` or `$`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Var {
    /// Variable name (without the `?` or `$` prefix)
    pub name: Arc<str>,
    /// Source span (includes the prefix)
    pub span: SourceSpan,
}

impl Var {
    pub fn new(name: impl Into<Arc<str>>, span: SourceSpan) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// An IRI reference, either written in full (`<http://...>`) or as a
/// prefixed name (`ex:foo`) awaiting expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Iri {
    /// The IRI value (full or prefixed)
    pub value: IriValue,
    /// Source span
    pub span: SourceSpan,
}

impl Iri {
    /// Create a full IRI (from `<...>` syntax).
    pub fn full(iri: impl Into<Arc<str>>, span: SourceSpan) -> Self {
        Self {
            value: IriValue::Full(iri.into()),
            span,
        }
    }

    /// Create a prefixed IRI (from `prefix:local` syntax).
    pub fn prefixed(
        prefix: impl Into<Arc<str>>,
        local: impl Into<Arc<str>>,
        span: SourceSpan,
    ) -> Self {
        Self {
            value: IriValue::Prefixed {
                prefix: prefix.into(),
                local: local.into(),
            },
            span,
        }
    }

    /// Create a reference to `rdf:type` (the `a` keyword).
    pub fn rdf_type(span: SourceSpan) -> Self {
        Self {
            value: IriValue::Full(Arc::from(rdf::TYPE)),
            span,
        }
    }
}

/// The value of an IRI reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IriValue {
    /// Full IRI as written (may still be relative to BASE)
    Full(Arc<str>),
    /// Prefixed name (needs expansion using PREFIX declarations)
    Prefixed {
        /// The prefix (empty string for the default prefix `:local`)
        prefix: Arc<str>,
        /// The local part
        local: Arc<str>,
    },
}

/// A labeled blank node (`_:label`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlankNode {
    /// The label (without `_:`)
    pub label: Arc<str>,
    /// Source span
    pub span: SourceSpan,
}

impl BlankNode {
    pub fn new(label: impl Into<Arc<str>>, span: SourceSpan) -> Self {
        Self {
            label: label.into(),
            span,
        }
    }
}

/// A literal value.
#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    /// The literal value
    pub value: LiteralValue,
    /// Source span
    pub span: SourceSpan,
}

impl Literal {
    /// Create a simple string literal.
    pub fn string(value: impl Into<Arc<str>>, span: SourceSpan) -> Self {
        Self {
            value: LiteralValue::Simple(value.into()),
            span,
        }
    }

    /// Create a language-tagged string.
    pub fn lang_string(
        value: impl Into<Arc<str>>,
        lang: impl Into<Arc<str>>,
        span: SourceSpan,
    ) -> Self {
        Self {
            value: LiteralValue::LangTagged {
                value: value.into(),
                lang: lang.into(),
            },
            span,
        }
    }

    /// Create a typed literal with an IRI datatype.
    pub fn typed(value: impl Into<Arc<str>>, datatype: Iri, span: SourceSpan) -> Self {
        Self {
            value: LiteralValue::Typed {
                value: value.into(),
                datatype: Box::new(datatype),
            },
            span,
        }
    }

    /// Create an integer literal.
    pub fn integer(value: i64, span: SourceSpan) -> Self {
        Self {
            value: LiteralValue::Integer(value),
            span,
        }
    }

    /// Create a decimal literal.
    pub fn decimal(value: impl Into<Arc<str>>, span: SourceSpan) -> Self {
        Self {
            value: LiteralValue::Decimal(value.into()),
            span,
        }
    }

    /// Create a double literal.
    pub fn double(value: f64, span: SourceSpan) -> Self {
        Self {
            value: LiteralValue::Double(value),
            span,
        }
    }

    /// Create a boolean literal.
    pub fn boolean(value: bool, span: SourceSpan) -> Self {
        Self {
            value: LiteralValue::Boolean(value),
            span,
        }
    }
}

/// The value of a literal.
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    /// Simple string literal (no language tag or datatype)
    Simple(Arc<str>),
    /// Language-tagged string (e.g., `"hello"@en`)
    LangTagged {
        /// The string value
        value: Arc<str>,
        /// The language tag (e.g., "en", "en-US")
        lang: Arc<str>,
    },
    /// Typed literal (e.g., `"42"^^xsd:integer`)
    Typed {
        /// The lexical form
        value: Arc<str>,
        /// The datatype IRI
        datatype: Box<Iri>,
    },
    /// Integer literal (syntactic shorthand, implicitly xsd:integer)
    Integer(i64),
    /// Decimal literal, stored as written to preserve the exact form
    Decimal(Arc<str>),
    /// Double literal (syntactic shorthand, implicitly xsd:double)
    Double(f64),
    /// Boolean literal (`true` or `false`)
    Boolean(bool),
}

/// A term in a SPARQL query (variable, IRI, literal, or blank node).
///
/// This is the unresolved form: IRIs may be prefixed and need
/// expansion.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// Variable (`?x` or `$x`)
    Var(Var),
    /// IRI (full or prefixed)
    Iri(Iri),
    /// Literal value
    Literal(Literal),
    /// Blank node
    BlankNode(BlankNode),
}

impl Term {
    /// Get the source span of this term.
    pub fn span(&self) -> SourceSpan {
        match self {
            Term::Var(v) => v.span,
            Term::Iri(i) => i.span,
            Term::Literal(l) => l.span,
            Term::BlankNode(b) => b.span,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(i) => Some(i),
            _ => None,
        }
    }
}

/// A term allowed in subject position.
#[derive(Clone, Debug, PartialEq)]
pub enum SubjectTerm {
    Var(Var),
    Iri(Iri),
    BlankNode(BlankNode),
}

impl SubjectTerm {
    /// Get the source span.
    pub fn span(&self) -> SourceSpan {
        match self {
            SubjectTerm::Var(v) => v.span,
            SubjectTerm::Iri(i) => i.span,
            SubjectTerm::BlankNode(b) => b.span,
        }
    }
}

/// A term allowed in predicate position.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateTerm {
    Var(Var),
    Iri(Iri),
}

impl PredicateTerm {
    /// Get the source span.
    pub fn span(&self) -> SourceSpan {
        match self {
            PredicateTerm::Var(v) => v.span,
            PredicateTerm::Iri(i) => i.span,
        }
    }
}

/// Any term may appear in object position.
pub type ObjectTerm = Term;
