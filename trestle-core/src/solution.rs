//! Solution mappings
//!
//! A [`SolutionMapping`] is one row of query results: a partial map
//! from variable names to terms. Entries keep insertion order so that
//! results echo pattern order, but equality is order-insensitive set
//! equality. A variable absent from the map is *unbound*, which is
//! never the same thing as being bound to an empty literal.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::term::Term;

/// One query solution: variable name to term bindings.
#[derive(Debug, Clone, Default, Eq)]
pub struct SolutionMapping {
    entries: Vec<(Arc<str>, Term)>,
}

impl SolutionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `var` to `term`, replacing any existing binding.
    pub fn bind(&mut self, var: impl Into<Arc<str>>, term: Term) {
        let var = var.into();
        match self.entries.iter_mut().find(|(name, _)| *name == var) {
            Some(entry) => entry.1 = term,
            None => self.entries.push((var, term)),
        }
    }

    pub fn get(&self, var: &str) -> Option<&Term> {
        self.entries
            .iter()
            .find(|(name, _)| name.as_ref() == var)
            .map(|(_, term)| term)
    }

    pub fn is_bound(&self, var: &str) -> bool {
        self.get(var).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.entries.iter().map(|(name, term)| (name.as_ref(), term))
    }

    /// Bound variable names in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_ref())
    }

    /// Two mappings are compatible when every shared variable is bound
    /// to the same term in both.
    pub fn compatible_with(&self, other: &SolutionMapping) -> bool {
        self.entries.iter().all(|(name, term)| match other.get(name) {
            Some(other_term) => term == other_term,
            None => true,
        })
    }

    /// Merge with another mapping, or `None` if they conflict on a
    /// shared variable.
    pub fn merged_with(&self, other: &SolutionMapping) -> Option<SolutionMapping> {
        let mut merged = self.clone();
        for (name, term) in &other.entries {
            match merged.get(name) {
                Some(existing) if existing != term => return None,
                Some(_) => {}
                None => merged.entries.push((name.clone(), term.clone())),
            }
        }
        Some(merged)
    }

    /// Restrict to the given variables, keeping their order. Unbound
    /// variables simply stay absent.
    pub fn project(&self, vars: &[Arc<str>]) -> SolutionMapping {
        let mut projected = SolutionMapping::new();
        for var in vars {
            if let Some(term) = self.get(var) {
                projected.entries.push((var.clone(), term.clone()));
            }
        }
        projected
    }

    /// Bindings sorted by variable name. Usable as a hash key when the
    /// insertion order must not matter, as in DISTINCT.
    pub fn sorted_entries(&self) -> Vec<(Arc<str>, Term)> {
        let mut entries = self.entries.clone();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }
}

impl PartialEq for SolutionMapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(name, term)| other.get(name) == Some(term))
    }
}

impl FromIterator<(Arc<str>, Term)> for SolutionMapping {
    fn from_iter<I: IntoIterator<Item = (Arc<str>, Term)>>(iter: I) -> Self {
        let mut mapping = SolutionMapping::new();
        for (name, term) in iter {
            mapping.bind(name, term);
        }
        mapping
    }
}

impl fmt::Display for SolutionMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, term)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{name} = {term}")?;
        }
        write!(f, "}}")
    }
}

impl Serialize for SolutionMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, term) in &self.entries {
            map.serialize_entry(name.as_ref(), term)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Iri, Literal};

    fn mapping(pairs: &[(&str, &str)]) -> SolutionMapping {
        let mut m = SolutionMapping::new();
        for (name, value) in pairs {
            m.bind(*name, Term::Literal(Literal::simple(*value)));
        }
        m
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let ab = mapping(&[("a", "1"), ("b", "2")]);
        let ba = mapping(&[("b", "2"), ("a", "1")]);
        assert_eq!(ab, ba);
        assert_ne!(ab, mapping(&[("a", "1")]));
        assert_ne!(ab, mapping(&[("a", "1"), ("b", "3")]));
    }

    #[test]
    fn unbound_differs_from_empty_literal() {
        let unbound = mapping(&[("a", "1")]);
        let empty = mapping(&[("a", "1"), ("b", "")]);
        assert_ne!(unbound, empty);
        assert!(!unbound.is_bound("b"));
        assert!(empty.is_bound("b"));
    }

    #[test]
    fn bind_replaces_existing() {
        let mut m = mapping(&[("a", "1")]);
        m.bind("a", Term::Literal(Literal::simple("2")));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("a"), Some(&Term::Literal(Literal::simple("2"))));
    }

    #[test]
    fn merge_detects_conflicts() {
        let left = mapping(&[("a", "1"), ("b", "2")]);
        let right = mapping(&[("b", "2"), ("c", "3")]);
        let conflicting = mapping(&[("b", "9")]);

        assert!(left.compatible_with(&right));
        let merged = left.merged_with(&right).unwrap();
        assert_eq!(merged, mapping(&[("a", "1"), ("b", "2"), ("c", "3")]));

        assert!(!left.compatible_with(&conflicting));
        assert!(left.merged_with(&conflicting).is_none());
    }

    #[test]
    fn disjoint_mappings_are_compatible() {
        let left = mapping(&[("a", "1")]);
        let right = mapping(&[("b", "2")]);
        assert!(left.compatible_with(&right));
        assert_eq!(left.merged_with(&right).unwrap().len(), 2);
    }

    #[test]
    fn project_keeps_requested_order_and_skips_unbound() {
        let m = mapping(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let vars: Vec<Arc<str>> = vec!["c".into(), "missing".into(), "a".into()];
        let projected = m.project(&vars);
        let names: Vec<&str> = projected.variables().collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let m = mapping(&[("z", "1"), ("a", "2")]);
        let names: Vec<&str> = m.variables().collect();
        assert_eq!(names, vec!["z", "a"]);
        let sorted = m.sorted_entries();
        assert_eq!(sorted[0].0.as_ref(), "a");
    }

    #[test]
    fn display_shows_bindings() {
        let mut m = SolutionMapping::new();
        m.bind("x", Term::Iri(Iri::new("http://example.org/a")));
        assert_eq!(m.to_string(), "{?x = <http://example.org/a>}");
    }
}
