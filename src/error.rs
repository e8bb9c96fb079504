//! Error types for semtree operations.

use thiserror::Error;

/// Errors that can occur while building or pruning a semantic tree.
///
/// Only conditions that make the input impossible to traverse are errors.
/// Similarity failures and unsatisfiable budgets are absorbed and reported
/// through the prune result instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
