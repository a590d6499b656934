//! Query result forms
//!
//! One result type per query form: solution sequences for SELECT,
//! a boolean for ASK, a deduplicated triple list for CONSTRUCT.
//! [`QueryResults::to_json`] renders SELECT and ASK results in the
//! SPARQL 1.1 Query Results JSON Format; CONSTRUCT renders as an
//! array of subject/predicate/object objects.

use std::sync::Arc;

use serde_json::json;
use trestle_core::{SolutionMapping, Triple};

/// The outcome of executing a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResults {
    /// SELECT: projected variables in clause order, plus one mapping
    /// per solution. A variable may be unbound in any given row.
    Solutions {
        variables: Vec<Arc<str>>,
        rows: Vec<SolutionMapping>,
    },
    /// ASK: whether at least one solution matched.
    Boolean(bool),
    /// CONSTRUCT: instantiated triples, duplicates removed.
    Graph(Vec<Triple>),
}

impl QueryResults {
    /// Projected variables and rows, when this is a SELECT result.
    pub fn as_solutions(&self) -> Option<(&[Arc<str>], &[SolutionMapping])> {
        match self {
            QueryResults::Solutions { variables, rows } => Some((variables, rows)),
            _ => None,
        }
    }

    /// The boolean answer, when this is an ASK result.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            QueryResults::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// The constructed triples, when this is a CONSTRUCT result.
    pub fn as_graph(&self) -> Option<&[Triple]> {
        match self {
            QueryResults::Graph(triples) => Some(triples),
            _ => None,
        }
    }

    /// Number of solutions or triples; `1` for a boolean.
    pub fn len(&self) -> usize {
        match self {
            QueryResults::Solutions { rows, .. } => rows.len(),
            QueryResults::Boolean(_) => 1,
            QueryResults::Graph(triples) => triples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            QueryResults::Solutions { rows, .. } => rows.is_empty(),
            QueryResults::Boolean(_) => false,
            QueryResults::Graph(triples) => triples.is_empty(),
        }
    }

    /// Render as JSON. SELECT and ASK follow the SPARQL 1.1 results
    /// format; unbound variables are simply absent from a binding.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            QueryResults::Solutions { variables, rows } => {
                let vars: Vec<&str> = variables.iter().map(|v| v.as_ref()).collect();
                json!({
                    "head": { "vars": vars },
                    "results": { "bindings": rows },
                })
            }
            QueryResults::Boolean(value) => json!({
                "head": {},
                "boolean": value,
            }),
            QueryResults::Graph(triples) => json!(triples),
        }
    }
}
