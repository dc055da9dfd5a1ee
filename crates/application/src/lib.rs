//! Vareval Application - Resolution engine, ports and use cases
//!
//! This crate defines the application layer with:
//! - Port traits (variable provider, expression evaluator, clock)
//! - The variable resolution engine and its function library
//! - Use case orchestration
//! - Application-level error handling

pub mod error;
pub mod ports;
pub mod use_cases;
pub mod variable_resolver;

pub use error::{ApplicationError, ApplicationResult};
pub use ports::{Clock, EvaluatorError, ExpressionEvaluator, ProviderError, VariableProvider};
pub use use_cases::{
    EvaluateValue, EvaluateValueInput, ProcessRequest, ProcessRequestInput, ProcessRequestOutput,
};
pub use variable_resolver::VariablesEvaluator;
