//! Aggregate framework: the function trait, the custom registry, and
//! IRI resolution
//!
//! Every aggregate, built-in or custom, is an [`AggregateFunction`]:
//! `init` creates a per-group accumulator, `step` folds one input
//! value in, `finalize` turns the accumulator into the output term
//! (`None` leaves the output variable unbound for that row). The
//! accumulator is type-erased behind [`AggregateState`]; only the
//! defining aggregate's `step`/`finalize` pair looks inside it, never
//! the executor.
//!
//! Keyword aggregates (COUNT, SUM, ...) resolve directly to built-ins.
//! IRI-addressed aggregates resolve through [`resolve`]: the custom
//! registry is checked first, then the extended built-in table under
//! the reserved `agg:` namespace, so a custom registration can shadow
//! an extended built-in.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use trestle_core::Term;
use trestle_vocab::agg;

use crate::algebra::{AggregateCall, AggregateName};
use crate::error::{QueryError, Result};

pub mod builtin;

/// Opaque per-group accumulator.
///
/// Created by [`AggregateFunction::init`] and owned by that function's
/// `step`/`finalize` pair. The wrapped type is whatever the aggregate
/// chose; downcasting with a different type yields `None`.
pub struct AggregateState(Box<dyn Any + Send>);

impl AggregateState {
    /// Wrap an accumulator value.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Mutable access for `step`.
    pub fn downcast_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.0.downcast_mut()
    }

    /// Consume the state for `finalize`.
    pub fn into_inner<T: Any + Send>(self) -> Option<T> {
        self.0.downcast::<T>().ok().map(|boxed| *boxed)
    }
}

impl std::fmt::Debug for AggregateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AggregateState(..)")
    }
}

/// One aggregate function: a fold over the solutions of a group.
///
/// `step` receives the evaluated input expression per group member;
/// `None` means the expression was unbound or errored for that member.
/// Implementations decide whether that counts (COUNT skips it, SAMPLE
/// skips it, COUNT(*) never sees an input at all).
pub trait AggregateFunction: Send + Sync {
    /// Create the accumulator for a new group.
    fn init(&self) -> AggregateState;

    /// Fold one value into the accumulator.
    fn step(&self, state: &mut AggregateState, value: Option<&Term>);

    /// Produce the result. `None` leaves the output variable unbound.
    fn finalize(&self, state: AggregateState) -> Option<Term>;
}

impl std::fmt::Debug for dyn AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AggregateFunction(..)")
    }
}

/// Errors raised by [`AggregateRegistry::register`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustomAggregateError {
    /// The registration IRI was empty
    #[error("aggregate IRI must not be empty")]
    EmptyIri,

    /// The IRI is already registered
    #[error("aggregate already registered: {0}")]
    AlreadyRegistered(String),
}

/// Registry mapping aggregate IRIs to custom implementations.
///
/// The registry is an explicit value threaded into each execution,
/// never ambient global state. A registration under an extended
/// built-in's IRI shadows that built-in.
#[derive(Clone, Default)]
pub struct AggregateRegistry {
    functions: HashMap<Arc<str>, Arc<dyn AggregateFunction>>,
}

impl AggregateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom aggregate under an IRI.
    ///
    /// Fails if the IRI is empty or already registered; existing
    /// registrations are never silently replaced.
    pub fn register(
        &mut self,
        iri: impl Into<Arc<str>>,
        function: impl AggregateFunction + 'static,
    ) -> std::result::Result<(), CustomAggregateError> {
        let iri = iri.into();
        if iri.is_empty() {
            return Err(CustomAggregateError::EmptyIri);
        }
        if self.functions.contains_key(&iri) {
            return Err(CustomAggregateError::AlreadyRegistered(iri.to_string()));
        }
        self.functions.insert(iri, Arc::new(function));
        Ok(())
    }

    /// Remove a registration. Returns `false` if the IRI was absent.
    pub fn unregister(&mut self, iri: &str) -> bool {
        self.functions.remove(iri).is_some()
    }

    pub fn get(&self, iri: &str) -> Option<Arc<dyn AggregateFunction>> {
        self.functions.get(iri).cloned()
    }

    pub fn contains(&self, iri: &str) -> bool {
        self.functions.contains_key(iri)
    }

    pub fn clear(&mut self) {
        self.functions.clear();
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered IRIs, sorted for deterministic iteration.
    pub fn registered_iris(&self) -> Vec<Arc<str>> {
        let mut iris: Vec<Arc<str>> = self.functions.keys().cloned().collect();
        iris.sort();
        iris
    }
}

impl std::fmt::Debug for AggregateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateRegistry")
            .field("iris", &self.registered_iris())
            .finish()
    }
}

/// Resolve an aggregate call to its implementation.
///
/// Keyword aggregates map straight to built-ins. IRI aggregates check
/// the custom registry first, then the extended built-in table;
/// absent from both fails with [`QueryError::UnknownAggregate`].
pub fn resolve(call: &AggregateCall, registry: &AggregateRegistry) -> Result<Arc<dyn AggregateFunction>> {
    match &call.name {
        AggregateName::Count => {
            if call.input.is_some() {
                Ok(Arc::new(builtin::Count))
            } else {
                Ok(Arc::new(builtin::CountAll))
            }
        }
        AggregateName::Sum => Ok(Arc::new(builtin::Sum)),
        AggregateName::Avg => Ok(Arc::new(builtin::Avg)),
        AggregateName::Min => Ok(Arc::new(builtin::Min)),
        AggregateName::Max => Ok(Arc::new(builtin::Max)),
        AggregateName::GroupConcat => {
            let separator = call.separator.clone().unwrap_or_else(|| Arc::from(" "));
            Ok(Arc::new(builtin::GroupConcat::new(separator)))
        }
        AggregateName::Sample => Ok(Arc::new(builtin::Sample)),
        AggregateName::Iri(iri) => registry
            .get(iri)
            .or_else(|| extended_builtin(iri))
            .ok_or_else(|| QueryError::UnknownAggregate(iri.to_string())),
    }
}

/// Look up an extended built-in by IRI.
fn extended_builtin(iri: &str) -> Option<Arc<dyn AggregateFunction>> {
    match iri {
        agg::MEDIAN => Some(Arc::new(builtin::Median)),
        agg::VARIANCE => Some(Arc::new(builtin::Variance)),
        agg::STDDEV => Some(Arc::new(builtin::StdDev)),
        agg::MODE => Some(Arc::new(builtin::Mode)),
        _ => {
            let suffix = iri.strip_prefix(agg::PERCENTILE_PREFIX)?;
            let pct: u32 = suffix.parse().ok()?;
            if pct <= 100 {
                Some(Arc::new(builtin::Percentile::new(pct)))
            } else {
                None
            }
        }
    }
}
