//! # Trestle Query
//!
//! SPARQL-subset query engine over a [`trestle_core::TripleStore`].
//!
//! This crate provides:
//! - [`algebra`]: the query algebra (operations, scalar expressions,
//!   aggregate calls)
//! - [`translate`]: AST lowering, including aggregate hoisting and
//!   implicit grouping
//! - [`optimize`]: filter pushdown and selectivity-based pattern
//!   reordering
//! - [`eval`]: materializing evaluation against a store
//! - [`aggregate`]: built-in aggregates plus a registry for custom
//!   ones addressed by IRI
//! - [`results`]: SELECT/ASK/CONSTRUCT result forms with SPARQL 1.1
//!   JSON rendering
//!
//! [`QueryEngine`] ties the stages together: parse, translate,
//! optimize, evaluate. [`QueryEngine::prepare`] stops after the
//! optimize step so one query can run against several stores.
//!
//! ## Example
//!
//! ```
//! use trestle_core::{Iri, Literal, Triple, TripleStore};
//! use trestle_query::QueryEngine;
//!
//! let mut store = TripleStore::new();
//! store.insert(Triple::new(
//!     Iri::new("http://example.org/alice"),
//!     Iri::new("http://example.org/name"),
//!     Literal::simple("Alice"),
//! ));
//!
//! let engine = QueryEngine::new();
//! let results = engine.execute(
//!     "SELECT ?name WHERE { ?s <http://example.org/name> ?name }",
//!     &store,
//! )?;
//! assert_eq!(results.len(), 1);
//! # Ok::<(), trestle_query::QueryError>(())
//! ```

pub mod aggregate;
pub mod algebra;
pub mod error;
pub mod eval;
pub mod optimize;
pub mod results;
pub mod translate;

// Re-export main types
pub use aggregate::{AggregateFunction, AggregateRegistry, AggregateState, CustomAggregateError};
pub use algebra::{Operation, QueryForm, TranslatedQuery};
pub use error::{QueryError, Result};
pub use results::QueryResults;

use tracing::warn;
use trestle_core::TripleStore;
use trestle_sparql::parse_sparql;

/// Parse, plan, and run queries, carrying the aggregate registry the
/// queries resolve custom aggregates against.
#[derive(Debug, Default)]
pub struct QueryEngine {
    registry: AggregateRegistry,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The custom aggregate registry.
    pub fn registry(&self) -> &AggregateRegistry {
        &self.registry
    }

    /// Mutable access for registering and unregistering custom
    /// aggregates.
    pub fn registry_mut(&mut self) -> &mut AggregateRegistry {
        &mut self.registry
    }

    /// Run a query against a store.
    pub fn execute(&self, source: &str, store: &TripleStore) -> Result<QueryResults> {
        let _span = tracing::debug_span!("execute_query", source_len = source.len()).entered();
        self.prepare(source)?.execute(store, &self.registry)
    }

    /// Parse, translate, and optimize a query without running it.
    ///
    /// Parser warnings (inert syntax such as `REDUCED`) are logged,
    /// not returned; only errors fail the preparation.
    pub fn prepare(&self, source: &str) -> Result<PreparedQuery> {
        let _span = tracing::debug_span!("prepare_query", source_len = source.len()).entered();
        let output = parse_sparql(source);
        for diagnostic in output.warnings() {
            warn!(code = %diagnostic.code, "{}", diagnostic.message);
        }
        let query = output.into_result(source)?;
        let translated = translate::translate(&query)?;
        Ok(PreparedQuery {
            query: TranslatedQuery {
                form: translated.form,
                root: optimize::optimize(translated.root),
            },
        })
    }
}

/// A parsed and optimized query, ready to run any number of times.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    query: TranslatedQuery,
}

impl PreparedQuery {
    /// The optimized plan.
    pub fn query(&self) -> &TranslatedQuery {
        &self.query
    }

    pub fn execute(
        &self,
        store: &TripleStore,
        registry: &AggregateRegistry,
    ) -> Result<QueryResults> {
        eval::execute(&self.query, store, registry)
    }
}
