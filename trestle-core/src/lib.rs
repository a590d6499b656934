//! # Trestle Core
//!
//! RDF data model shared by the trestle crates.
//!
//! This crate provides:
//! - Term types: `Iri`, `Literal`, `BlankNode`, `Resource`, `Term`, `Triple`
//! - `SolutionMapping`: one row of query results
//! - `TripleStore`: insertion-ordered in-memory store with positional indexes
//! - Numeric coercion and the total term order used for sorting
//!
//! Everything here is synchronous and self-contained; query parsing
//! and evaluation live in `trestle-sparql` and `trestle-query`.

pub mod solution;
pub mod store;
pub mod term;
pub mod value;

// Re-export main types
pub use solution::SolutionMapping;
pub use store::TripleStore;
pub use term::{BlankNode, Iri, Literal, Resource, Term, Triple};
pub use value::{compare_bindings, compare_terms, is_numeric_datatype, literal_to_f64, term_to_f64};
