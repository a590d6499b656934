//! Error types for query translation and execution

use thiserror::Error;

use crate::aggregate::CustomAggregateError;

/// Query errors
#[derive(Error, Debug)]
pub enum QueryError {
    /// Parse failure from trestle-sparql
    #[error(transparent)]
    Syntax(#[from] trestle_sparql::SyntaxError),

    /// Query shape that cannot be lowered to algebra
    #[error("Translation error: {0}")]
    Translate(String),

    /// Aggregate IRI absent from both the custom registry and the
    /// extended built-in table
    #[error("Unknown custom aggregate function: {0}")]
    UnknownAggregate(String),

    /// Registration-time registry error
    #[error(transparent)]
    CustomAggregate(#[from] CustomAggregateError),
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;
