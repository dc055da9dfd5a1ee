//! Expression evaluator port
//!
//! The engine never evaluates expressions itself. It translates values into
//! the evaluator grammar and forwards them through this port:
//!
//! ```text
//! 'literal ' + name + ' more literal'
//! ```
//!
//! Literals are single-quoted with `\'` and `\\` escapes, segments are joined
//! with ` + `, and bare identifiers are resolved against the context.

use async_trait::async_trait;
use vareval_domain::Context;

/// Errors reported by an expression evaluator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluatorError {
    /// The expression could not be parsed.
    #[error("cannot parse expression `{expression}`: {reason}")]
    Parse {
        /// The offending expression.
        expression: String,
        /// Parser message.
        reason: String,
    },

    /// The evaluator is not available.
    #[error("evaluator unavailable: {0}")]
    Unavailable(String),
}

/// Evaluates a translated expression against a context.
#[async_trait]
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluates `expression` with identifiers bound from `context`.
    ///
    /// # Errors
    /// Returns an error if the expression is malformed.
    async fn eval(&self, expression: &str, context: &Context) -> Result<String, EvaluatorError>;
}
