//! RDF term model
//!
//! The term types form a small hierarchy:
//! - `Iri`: an absolute IRI, interned as `Arc<str>`
//! - `Literal`: lexical value plus optional datatype IRI or language tag
//! - `BlankNode`: scoped identifier with no global meaning
//! - `Resource`: `Iri` or `BlankNode` (subject/predicate position)
//! - `Term`: any of the three (object position)
//!
//! Equality is structural. Two literals are equal only when value,
//! datatype, and language tag all match; `"5"^^xsd:integer` and
//! `"5"^^xsd:double` are distinct terms. Numeric comparison lives in
//! the `value` module, not here.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;

use trestle_vocab::{rdf, xsd};

/// An absolute IRI.
///
/// Cheap to clone; the underlying string is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(Arc<str>);

impl Iri {
    /// Create an IRI from its string form. The string must be non-empty.
    pub fn new(iri: impl Into<Arc<str>>) -> Self {
        let iri = iri.into();
        debug_assert!(!iri.is_empty(), "IRI must be non-empty");
        Self(iri)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// A blank node, identified only within one dataset or query scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNode(Arc<str>);

impl BlankNode {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// An RDF literal: lexical value with an optional datatype IRI or
/// language tag (never both).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    value: Arc<str>,
    datatype: Option<Iri>,
    lang: Option<Arc<str>>,
}

impl Literal {
    /// Plain literal with no datatype or language tag.
    pub fn simple(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    /// Literal with an explicit datatype IRI.
    pub fn typed(value: impl Into<Arc<str>>, datatype: Iri) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype),
            lang: None,
        }
    }

    /// Language-tagged string literal.
    pub fn lang_tagged(value: impl Into<Arc<str>>, lang: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            lang: Some(lang.into()),
        }
    }

    /// `xsd:integer` literal from a machine integer.
    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), Iri::new(xsd::INTEGER))
    }

    /// `xsd:double` literal from a machine float.
    pub fn double(value: f64) -> Self {
        Self::typed(value.to_string(), Iri::new(xsd::DOUBLE))
    }

    /// `xsd:boolean` literal.
    pub fn boolean(value: bool) -> Self {
        Self::typed(if value { "true" } else { "false" }, Iri::new(xsd::BOOLEAN))
    }

    /// The lexical value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The explicit datatype IRI, if any.
    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }

    /// The datatype IRI including implied defaults: `rdf:langString`
    /// for language-tagged literals, `xsd:string` for plain ones.
    pub fn datatype_iri(&self) -> &str {
        if self.lang.is_some() {
            rdf::LANG_STRING
        } else {
            match &self.datatype {
                Some(dt) => dt.as_str(),
                None => xsd::STRING,
            }
        }
    }

    /// The language tag, if any.
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub fn is_lang_tagged(&self) -> bool {
        self.lang.is_some()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.value.chars() {
            match c {
                '"' => write!(f, "\\\"")?,
                '\\' => write!(f, "\\\\")?,
                '\n' => write!(f, "\\n")?,
                c => write!(f, "{c}")?,
            }
        }
        write!(f, "\"")?;
        if let Some(lang) = &self.lang {
            write!(f, "@{lang}")?;
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^{dt}")?;
        }
        Ok(())
    }
}

/// A term allowed in subject or predicate position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Iri(Iri),
    Blank(BlankNode),
}

impl Resource {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Resource::Iri(iri) => Some(iri),
            Resource::Blank(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Resource::Blank(_))
    }
}

impl From<Iri> for Resource {
    fn from(iri: Iri) -> Self {
        Resource::Iri(iri)
    }
}

impl From<BlankNode> for Resource {
    fn from(node: BlankNode) -> Self {
        Resource::Blank(node)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Iri(iri) => iri.fmt(f),
            Resource::Blank(node) => node.fmt(f),
        }
    }
}

/// A term in any position: IRI, blank node, or literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(Iri),
    Blank(BlankNode),
    Literal(Literal),
}

impl Term {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    /// Narrow to a `Resource` if this term may appear in subject or
    /// predicate position.
    pub fn to_resource(&self) -> Option<Resource> {
        match self {
            Term::Iri(iri) => Some(Resource::Iri(iri.clone())),
            Term::Blank(node) => Some(Resource::Blank(node.clone())),
            Term::Literal(_) => None,
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Term::Blank(node)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl From<Resource> for Term {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Iri(iri) => Term::Iri(iri),
            Resource::Blank(node) => Term::Blank(node),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => iri.fmt(f),
            Term::Blank(node) => node.fmt(f),
            Term::Literal(lit) => lit.fmt(f),
        }
    }
}

/// A single RDF statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Resource,
    pub predicate: Resource,
    pub object: Term,
}

impl Triple {
    pub fn new(
        subject: impl Into<Resource>,
        predicate: impl Into<Resource>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Test this triple against a partial pattern. `None` matches any
    /// term in that position.
    pub fn matches(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&Resource>,
        object: Option<&Term>,
    ) -> bool {
        subject.is_none_or(|s| *s == self.subject)
            && predicate.is_none_or(|p| *p == self.predicate)
            && object.is_none_or(|o| *o == self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

// Terms serialize in the SPARQL 1.1 JSON results shape:
// {"type": "uri"|"literal"|"bnode", "value": ..., "datatype"?, "xml:lang"?}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Term::Iri(iri) => {
                map.serialize_entry("type", "uri")?;
                map.serialize_entry("value", iri.as_str())?;
            }
            Term::Blank(node) => {
                map.serialize_entry("type", "bnode")?;
                map.serialize_entry("value", node.id())?;
            }
            Term::Literal(lit) => {
                map.serialize_entry("type", "literal")?;
                map.serialize_entry("value", lit.value())?;
                if let Some(lang) = lit.lang() {
                    map.serialize_entry("xml:lang", lang)?;
                } else if let Some(dt) = lit.datatype() {
                    map.serialize_entry("datatype", dt.as_str())?;
                }
            }
        }
        map.end()
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Term::from(self.clone()).serialize(serializer)
    }
}

impl Serialize for Triple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("subject", &self.subject)?;
        map.serialize_entry("predicate", &self.predicate)?;
        map.serialize_entry("object", &self.object)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_equality_is_componentwise() {
        let plain = Literal::simple("5");
        let typed = Literal::typed("5", Iri::new(xsd::INTEGER));
        let tagged = Literal::lang_tagged("5", "en");
        assert_ne!(plain, typed);
        assert_ne!(plain, tagged);
        assert_ne!(typed, tagged);
        assert_eq!(typed, Literal::integer(5));
    }

    #[test]
    fn effective_datatype() {
        assert_eq!(Literal::simple("a").datatype_iri(), xsd::STRING);
        assert_eq!(Literal::lang_tagged("a", "en").datatype_iri(), rdf::LANG_STRING);
        assert_eq!(Literal::integer(1).datatype_iri(), xsd::INTEGER);
    }

    #[test]
    fn display_forms() {
        let t = Triple::new(
            Iri::new("http://example.org/s"),
            Iri::new("http://example.org/p"),
            Literal::lang_tagged("chat", "fr"),
        );
        assert_eq!(
            t.to_string(),
            "<http://example.org/s> <http://example.org/p> \"chat\"@fr ."
        );
        assert_eq!(Term::Blank(BlankNode::new("b0")).to_string(), "_:b0");
        assert_eq!(
            Term::Literal(Literal::integer(42)).to_string(),
            "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn triple_pattern_matching() {
        let s = Resource::Iri(Iri::new("http://example.org/s"));
        let p = Resource::Iri(Iri::new("http://example.org/p"));
        let o = Term::Literal(Literal::simple("x"));
        let t = Triple::new(s.clone(), p.clone(), o.clone());

        assert!(t.matches(None, None, None));
        assert!(t.matches(Some(&s), None, Some(&o)));
        assert!(!t.matches(Some(&p), None, None));
        assert!(!t.matches(None, None, Some(&Term::Literal(Literal::simple("y")))));
    }

    #[test]
    fn literal_in_subject_position_is_unrepresentable() {
        let term = Term::Literal(Literal::simple("x"));
        assert!(term.to_resource().is_none());
        assert!(Term::Iri(Iri::new("http://example.org/s")).to_resource().is_some());
    }

    #[test]
    fn json_term_shape() {
        let lit = Term::Literal(Literal::lang_tagged("chat", "fr"));
        let json = serde_json::to_value(&lit).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "literal", "value": "chat", "xml:lang": "fr"})
        );

        let iri = Term::Iri(Iri::new("http://example.org/s"));
        let json = serde_json::to_value(&iri).unwrap();
        assert_eq!(json, serde_json::json!({"type": "uri", "value": "http://example.org/s"}));
    }
}
