//! In-memory triple store
//!
//! Triples live in an insertion-ordered arena with set semantics;
//! re-inserting an existing triple is a no-op. Three positional
//! indexes (subject, predicate, object) map terms to arena offsets,
//! and [`TripleStore::matching`] scans through whichever bound
//! position has the fewest candidates.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::slice;

use tracing::trace;

use crate::term::{Resource, Term, Triple};

/// An in-memory set of triples with positional indexes.
#[derive(Debug, Clone, Default)]
pub struct TripleStore {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    by_subject: HashMap<Resource, Vec<usize>>,
    by_predicate: HashMap<Resource, Vec<usize>>,
    by_object: HashMap<Term, Vec<usize>>,
}

impl TripleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        let idx = self.triples.len();
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .push(idx);
        self.by_predicate
            .entry(triple.predicate.clone())
            .or_default()
            .push(idx);
        self.by_object
            .entry(triple.object.clone())
            .or_default()
            .push(idx);
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    /// Insert every triple from an iterator; returns how many were new.
    pub fn insert_all(&mut self, triples: impl IntoIterator<Item = Triple>) -> usize {
        let before = self.triples.len();
        for triple in triples {
            self.insert(triple);
        }
        self.triples.len() - before
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.seen.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// All triples in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, Triple> {
        self.triples.iter()
    }

    /// Triples matching a partial pattern, in insertion order. `None`
    /// in a position matches anything.
    pub fn matching<'a>(
        &'a self,
        subject: Option<&'a Resource>,
        predicate: Option<&'a Resource>,
        object: Option<&'a Term>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        let candidates = self.candidates(subject, predicate, object);
        trace!(
            total = self.triples.len(),
            candidates = candidates.len(),
            "index scan"
        );
        candidates
            .map(move |idx| &self.triples[idx])
            .filter(move |triple| triple.matches(subject, predicate, object))
    }

    /// Pick the smallest candidate list among the bound positions, or
    /// the whole arena when nothing is bound.
    fn candidates<'a>(
        &'a self,
        subject: Option<&Resource>,
        predicate: Option<&Resource>,
        object: Option<&Term>,
    ) -> Candidates<'a> {
        const EMPTY: &[usize] = &[];

        let mut best: Option<&'a [usize]> = None;
        let mut consider = |lookup: Option<&'a [usize]>| {
            // A bound term missing from its index means no matches at all.
            let slice = lookup.unwrap_or(EMPTY);
            if best.is_none_or(|b| slice.len() < b.len()) {
                best = Some(slice);
            }
        };

        if let Some(s) = subject {
            consider(self.by_subject.get(s).map(Vec::as_slice));
        }
        if let Some(p) = predicate {
            consider(self.by_predicate.get(p).map(Vec::as_slice));
        }
        if let Some(o) = object {
            consider(self.by_object.get(o).map(Vec::as_slice));
        }

        match best {
            Some(slice) => Candidates::Listed(slice.iter()),
            None => Candidates::All(0..self.triples.len()),
        }
    }
}

impl Extend<Triple> for TripleStore {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}

impl FromIterator<Triple> for TripleStore {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut store = TripleStore::new();
        store.insert_all(iter);
        store
    }
}

/// Arena offsets to visit: an index posting list or a full scan.
enum Candidates<'a> {
    Listed(slice::Iter<'a, usize>),
    All(Range<usize>),
}

impl Candidates<'_> {
    fn len(&self) -> usize {
        match self {
            Candidates::Listed(iter) => iter.len(),
            Candidates::All(range) => range.len(),
        }
    }
}

impl Iterator for Candidates<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            Candidates::Listed(iter) => iter.next().copied(),
            Candidates::All(range) => range.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Iri, Literal};

    fn iri(local: &str) -> Iri {
        Iri::new(format!("http://example.org/{local}"))
    }

    fn sample_store() -> TripleStore {
        let mut store = TripleStore::new();
        store.insert(Triple::new(iri("alice"), iri("name"), Literal::simple("Alice")));
        store.insert(Triple::new(iri("alice"), iri("age"), Literal::integer(30)));
        store.insert(Triple::new(iri("bob"), iri("name"), Literal::simple("Bob")));
        store.insert(Triple::new(iri("bob"), iri("knows"), iri("alice")));
        store
    }

    #[test]
    fn insert_is_idempotent() {
        let mut store = TripleStore::new();
        let t = Triple::new(iri("s"), iri("p"), Literal::simple("o"));
        assert!(store.insert(t.clone()));
        assert!(!store.insert(t.clone()));
        assert_eq!(store.len(), 1);
        assert!(store.contains(&t));
    }

    #[test]
    fn matching_by_subject() {
        let store = sample_store();
        let s = Resource::Iri(iri("alice"));
        let found: Vec<_> = store.matching(Some(&s), None, None).collect();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|t| t.subject == s));
    }

    #[test]
    fn matching_by_predicate_and_object() {
        let store = sample_store();
        let p = Resource::Iri(iri("name"));
        let o = Term::Literal(Literal::simple("Bob"));
        let found: Vec<_> = store.matching(None, Some(&p), Some(&o)).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].subject, Resource::Iri(iri("bob")));
    }

    #[test]
    fn matching_unknown_term_is_empty() {
        let store = sample_store();
        let s = Resource::Iri(iri("nobody"));
        assert_eq!(store.matching(Some(&s), None, None).count(), 0);
    }

    #[test]
    fn matching_unbound_returns_everything_in_insertion_order() {
        let store = sample_store();
        let all: Vec<_> = store.matching(None, None, None).collect();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].subject, Resource::Iri(iri("alice")));
        assert_eq!(all[3].predicate, Resource::Iri(iri("knows")));
    }

    #[test]
    fn iri_object_is_indexed() {
        let store = sample_store();
        let o = Term::Iri(iri("alice"));
        let found: Vec<_> = store.matching(None, None, Some(&o)).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].predicate, Resource::Iri(iri("knows")));
    }

    #[test]
    fn insert_all_counts_new_triples() {
        let mut store = sample_store();
        let added = store.insert_all(vec![
            Triple::new(iri("alice"), iri("age"), Literal::integer(30)),
            Triple::new(iri("carol"), iri("name"), Literal::simple("Carol")),
        ]);
        assert_eq!(added, 1);
        assert_eq!(store.len(), 5);
    }
}
