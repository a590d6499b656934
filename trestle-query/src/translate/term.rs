//! Term resolution: prefixed-name expansion against the prologue,
//! BASE resolution, and lowering of parsed terms into algebra
//! pattern and template positions.

use std::sync::Arc;

use trestle_core::{Iri, Literal, Term};
use trestle_sparql::ast;
use trestle_vocab::xsd;

use crate::algebra::{PatternTerm, TemplateTerm};
use crate::error::{QueryError, Result};

/// Prefix reserved for engine-internal variables: blank-node stand-ins
/// and hoisted aggregate outputs. Never projected by `SELECT *`.
pub(crate) const INTERNAL_PREFIX: &str = "__";

pub(crate) fn is_internal(name: &str) -> bool {
    name.starts_with(INTERNAL_PREFIX)
}

/// The hidden variable standing in for a WHERE-clause blank node.
pub(crate) fn blank_var(label: &str) -> Arc<str> {
    Arc::from(format!("__blank_{label}"))
}

/// Resolves parsed terms against one query's prologue.
pub(crate) struct Resolver<'a> {
    prologue: &'a ast::Prologue,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(prologue: &'a ast::Prologue) -> Self {
        Self { prologue }
    }

    /// Expand a parsed IRI to its absolute form.
    ///
    /// Prefixed names concatenate the declared namespace; full IRIs
    /// without a scheme concatenate BASE when one is declared.
    pub(crate) fn resolve_iri(&self, iri: &ast::Iri) -> Result<Iri> {
        match &iri.value {
            ast::IriValue::Full(value) => {
                if !has_scheme(value) {
                    if let Some(base) = &self.prologue.base {
                        return Ok(Iri::new(format!("{}{}", base.iri, value)));
                    }
                }
                Ok(Iri::new(value.clone()))
            }
            ast::IriValue::Prefixed { prefix, local } => {
                let namespace = self
                    .prologue
                    .get_prefix(prefix)
                    .ok_or_else(|| QueryError::Translate(format!("unknown prefix: {prefix}")))?;
                Ok(Iri::new(format!("{namespace}{local}")))
            }
        }
    }

    pub(crate) fn resolve_literal(&self, literal: &ast::Literal) -> Result<Literal> {
        Ok(match &literal.value {
            ast::LiteralValue::Simple(value) => Literal::simple(value.clone()),
            ast::LiteralValue::LangTagged { value, lang } => {
                Literal::lang_tagged(value.clone(), lang.clone())
            }
            ast::LiteralValue::Typed { value, datatype } => {
                Literal::typed(value.clone(), self.resolve_iri(datatype)?)
            }
            ast::LiteralValue::Integer(n) => Literal::integer(*n),
            ast::LiteralValue::Decimal(lexical) => {
                Literal::typed(lexical.clone(), Iri::new(xsd::DECIMAL))
            }
            ast::LiteralValue::Double(n) => Literal::double(*n),
            ast::LiteralValue::Boolean(b) => Literal::boolean(*b),
        })
    }

    // ------------------------------------------------------------------
    // WHERE-clause pattern positions (blank nodes become variables)
    // ------------------------------------------------------------------

    pub(crate) fn subject_pattern(&self, term: &ast::SubjectTerm) -> Result<PatternTerm> {
        Ok(match term {
            ast::SubjectTerm::Var(var) => PatternTerm::Var(var.name.clone()),
            ast::SubjectTerm::Iri(iri) => {
                PatternTerm::Ground(Term::Iri(self.resolve_iri(iri)?))
            }
            ast::SubjectTerm::BlankNode(node) => PatternTerm::Var(blank_var(&node.label)),
        })
    }

    pub(crate) fn predicate_pattern(&self, term: &ast::PredicateTerm) -> Result<PatternTerm> {
        Ok(match term {
            ast::PredicateTerm::Var(var) => PatternTerm::Var(var.name.clone()),
            ast::PredicateTerm::Iri(iri) => {
                PatternTerm::Ground(Term::Iri(self.resolve_iri(iri)?))
            }
        })
    }

    pub(crate) fn object_pattern(&self, term: &ast::ObjectTerm) -> Result<PatternTerm> {
        Ok(match term {
            ast::Term::Var(var) => PatternTerm::Var(var.name.clone()),
            ast::Term::Iri(iri) => PatternTerm::Ground(Term::Iri(self.resolve_iri(iri)?)),
            ast::Term::Literal(literal) => {
                PatternTerm::Ground(Term::Literal(self.resolve_literal(literal)?))
            }
            ast::Term::BlankNode(node) => PatternTerm::Var(blank_var(&node.label)),
        })
    }

    // ------------------------------------------------------------------
    // CONSTRUCT template positions (blank nodes stay blank: they are
    // freshly instantiated per solution)
    // ------------------------------------------------------------------

    pub(crate) fn subject_template(&self, term: &ast::SubjectTerm) -> Result<TemplateTerm> {
        Ok(match term {
            ast::SubjectTerm::Var(var) => TemplateTerm::Var(var.name.clone()),
            ast::SubjectTerm::Iri(iri) => {
                TemplateTerm::Ground(Term::Iri(self.resolve_iri(iri)?))
            }
            ast::SubjectTerm::BlankNode(node) => TemplateTerm::Blank(node.label.clone()),
        })
    }

    pub(crate) fn predicate_template(&self, term: &ast::PredicateTerm) -> Result<TemplateTerm> {
        Ok(match term {
            ast::PredicateTerm::Var(var) => TemplateTerm::Var(var.name.clone()),
            ast::PredicateTerm::Iri(iri) => {
                TemplateTerm::Ground(Term::Iri(self.resolve_iri(iri)?))
            }
        })
    }

    pub(crate) fn object_template(&self, term: &ast::ObjectTerm) -> Result<TemplateTerm> {
        Ok(match term {
            ast::Term::Var(var) => TemplateTerm::Var(var.name.clone()),
            ast::Term::Iri(iri) => TemplateTerm::Ground(Term::Iri(self.resolve_iri(iri)?)),
            ast::Term::Literal(literal) => {
                TemplateTerm::Ground(Term::Literal(self.resolve_literal(literal)?))
            }
            ast::Term::BlankNode(node) => TemplateTerm::Blank(node.label.clone()),
        })
    }
}

/// Whether an IRI already carries a scheme (`http:`, `urn:`, ...).
/// Scheme-less IRIs are resolved against BASE by concatenation.
fn has_scheme(iri: &str) -> bool {
    match iri.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trestle_sparql::ast::{BaseDecl, PrefixDecl, Prologue};
    use trestle_sparql::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::new(0, 1)
    }

    fn prologue() -> Prologue {
        Prologue::new()
            .with_base(BaseDecl::new("http://example.org/", span()))
            .with_prefix(PrefixDecl::new("ex", "http://example.org/ns#", span()))
    }

    #[test]
    fn prefixed_names_expand() {
        let prologue = prologue();
        let resolver = Resolver::new(&prologue);
        let iri = resolver
            .resolve_iri(&ast::Iri::prefixed("ex", "name", span()))
            .unwrap();
        assert_eq!(iri.as_str(), "http://example.org/ns#name");
    }

    #[test]
    fn unknown_prefix_is_a_translation_error() {
        let prologue = Prologue::new();
        let resolver = Resolver::new(&prologue);
        let err = resolver
            .resolve_iri(&ast::Iri::prefixed("nope", "x", span()))
            .unwrap_err();
        assert!(err.to_string().contains("unknown prefix: nope"));
    }

    #[test]
    fn base_resolves_scheme_less_iris() {
        let prologue = prologue();
        let resolver = Resolver::new(&prologue);

        let relative = resolver
            .resolve_iri(&ast::Iri::full("people/alice", span()))
            .unwrap();
        assert_eq!(relative.as_str(), "http://example.org/people/alice");

        let absolute = resolver
            .resolve_iri(&ast::Iri::full("urn:thing:1", span()))
            .unwrap();
        assert_eq!(absolute.as_str(), "urn:thing:1");
    }

    #[test]
    fn scheme_detection() {
        assert!(has_scheme("http://example.org/"));
        assert!(has_scheme("urn:uuid:1234"));
        assert!(!has_scheme("people/alice"));
        assert!(!has_scheme(":weird"));
    }

    #[test]
    fn blank_nodes_become_internal_variables() {
        let prologue = Prologue::new();
        let resolver = Resolver::new(&prologue);
        let term = resolver
            .subject_pattern(&ast::SubjectTerm::BlankNode(ast::BlankNode::new(
                "b0",
                span(),
            )))
            .unwrap();
        assert_eq!(term, PatternTerm::Var(Arc::from("__blank_b0")));
        assert!(is_internal("__blank_b0"));
        assert!(!is_internal("name"));
    }

    #[test]
    fn template_blank_nodes_stay_blank() {
        let prologue = Prologue::new();
        let resolver = Resolver::new(&prologue);
        let term = resolver
            .subject_template(&ast::SubjectTerm::BlankNode(ast::BlankNode::new(
                "b0",
                span(),
            )))
            .unwrap();
        assert_eq!(term, TemplateTerm::Blank(Arc::from("b0")));
    }

    #[test]
    fn decimal_literals_carry_the_decimal_datatype() {
        let prologue = Prologue::new();
        let resolver = Resolver::new(&prologue);
        let literal = resolver
            .resolve_literal(&ast::Literal::decimal("-2.5", span()))
            .unwrap();
        assert_eq!(literal.value(), "-2.5");
        assert_eq!(literal.datatype_iri(), xsd::DECIMAL);
    }
}
