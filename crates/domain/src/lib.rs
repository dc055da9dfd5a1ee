//! Vareval Domain - Core resolution types
//!
//! This crate defines the data model shared by the resolution engine:
//! variables, resolved contexts, request records and evaluator settings.
//! All types here are pure Rust with no I/O dependencies.

pub mod environment;
pub mod error;
pub mod request;
pub mod settings;
pub mod value;

pub use environment::{
    Context, EXPRESSION_MARKER, OverrideMap, Variable, needs_evaluation, override_variables,
    parse_assignment,
};
pub use error::{DomainError, DomainResult};
pub use request::{RequestConfig, RequestField, RequestRecord};
pub use settings::{DEFAULT_MAX_PASSES, EvaluatorSettings};
pub use value::{Value, number_to_string};
