//! Application error types

use thiserror::Error;
use vareval_domain::DomainError;

use crate::ports::{EvaluatorError, ProviderError};

/// Application-level errors.
///
/// Preprocessing failures (`UnsupportedFunction`, `MissingArgument`,
/// `InvalidArgument`, `Syntax`) abort the resolution of the value being
/// evaluated and are never retried.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Unknown built-in, unknown namespace member or namespace outside the
    /// allowed set.
    #[error("Unsupported function {0}")]
    UnsupportedFunction(String),

    /// A function that needs an argument was called without one.
    #[error("{0} requires a value")]
    MissingArgument(String),

    /// A function received an argument it cannot process.
    #[error("invalid argument for {function}: {reason}")]
    InvalidArgument {
        /// Function name as written at the call site.
        function: String,
        /// What was wrong with the argument.
        reason: String,
    },

    /// Unterminated `${` in an expression.
    #[error("Syntax error. {0}")]
    Syntax(String),

    /// The variable provider failed.
    #[error("variable provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The external expression evaluator failed.
    #[error("evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
