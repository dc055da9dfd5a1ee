//! Variable resolution module
//!
//! Resolves `${...}` expressions, function calls and legacy magic variables
//! in values against a context built from the current variables.
//!
//! # Usage
//!
//! ```
//! use vareval_application::variable_resolver::{legacy, translator};
//!
//! // Legacy markers become function calls
//! assert_eq!(legacy::rewrite("${now:1}"), "${now(1)}");
//!
//! // Expressions are translated for the expression evaluator
//! let expression = translator::prepare_value("Bearer ${token}").unwrap();
//! assert_eq!(expression, "'Bearer ' + token + ''");
//! ```

pub mod builtins;
pub mod cache;
pub mod engine;
pub mod functions;
pub mod legacy;
pub mod namespace;
pub mod tokenizer;
pub mod translator;

pub use builtins::{Builtin, BuiltinInfo};
pub use cache::{CachedFunction, GroupedCache};
pub use engine::VariablesEvaluator;
pub use functions::{CallSite, FunctionDispatcher, find_call_site};
pub use namespace::Namespace;
pub use tokenizer::Tokenizer;
pub use translator::{Translation, prepare_multiline_value, prepare_value, translate};
