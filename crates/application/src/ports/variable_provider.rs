//! Variable provider port
//!
//! Supplies the variables of the current environment.

use async_trait::async_trait;
use vareval_domain::Variable;

/// Errors that can occur while loading variables.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Source of the raw variable list for the current environment.
///
/// The engine issues one request per context build and waits for the answer;
/// no timeout is imposed, implementations bound their own latency.
#[async_trait]
pub trait VariableProvider: Send + Sync {
    /// Returns the current variables, or `None` when the provider declines
    /// to supply any (no active environment).
    ///
    /// # Errors
    /// Returns an error if the variables exist but cannot be loaded.
    async fn current_variables(&self) -> Result<Option<Vec<Variable>>, ProviderError>;
}
