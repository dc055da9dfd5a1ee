//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the resolution engine and its
//! collaborators. Each port is a trait implemented by adapters in the
//! infrastructure layer.

mod clock;
mod expression_evaluator;
mod variable_provider;

pub use clock::Clock;
pub use expression_evaluator::{EvaluatorError, ExpressionEvaluator};
pub use variable_provider::{ProviderError, VariableProvider};
