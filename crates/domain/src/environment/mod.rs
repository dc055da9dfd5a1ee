//! Environment and variable domain types

mod context;
mod variable;

pub use context::{Context, OverrideMap};
pub use variable::{
    EXPRESSION_MARKER, Variable, needs_evaluation, override_variables, parse_assignment,
};
