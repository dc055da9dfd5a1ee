//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A variable name is empty or contains whitespace.
    #[error("invalid variable name: {0:?}")]
    InvalidVariableName(String),

    /// An override assignment is not of the form `NAME=VALUE`.
    #[error("invalid override assignment: {0}")]
    InvalidAssignment(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
