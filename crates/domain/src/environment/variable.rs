//! Environment variable types

use serde::{Deserialize, Serialize};

use super::context::OverrideMap;
use crate::error::{DomainError, DomainResult};

/// Opening marker of an embedded expression.
pub const EXPRESSION_MARKER: &str = "${";

/// Returns true if the value still carries `${...}` syntax.
#[must_use]
pub fn needs_evaluation(value: &str) -> bool {
    value.contains(EXPRESSION_MARKER)
}

/// Represents a single named variable as supplied by a variable provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// The variable name. Older exports call this field `variable`.
    #[serde(alias = "variable")]
    pub name: String,

    /// The raw value. May contain `${...}` references to other variables.
    #[serde(default)]
    pub value: String,

    /// Whether this variable is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl Variable {
    /// Creates a new enabled variable.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a disabled variable.
    #[must_use]
    pub fn disabled(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            enabled: false,
        }
    }

    /// Creates a variable after checking that the name is usable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidVariableName` for empty names or names
    /// containing whitespace.
    pub fn try_new(name: impl Into<String>, value: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidVariableName(name));
        }
        Ok(Self::new(name, value))
    }

    /// Returns true if the value contains `${...}` syntax.
    #[must_use]
    pub fn needs_evaluation(&self) -> bool {
        needs_evaluation(&self.value)
    }
}

/// Applies an override map to a variable list.
///
/// Variables whose name is present in `overrides` take the override value.
/// Override entries with no matching variable are appended as new variables.
#[must_use]
pub fn override_variables(variables: Vec<Variable>, overrides: &OverrideMap) -> Vec<Variable> {
    let mut remaining = overrides.clone();
    let mut result: Vec<Variable> = variables
        .into_iter()
        .map(|mut item| {
            if let Some(value) = remaining.remove(&item.name) {
                item.value = value;
            }
            item
        })
        .collect();

    result.extend(
        remaining
            .into_iter()
            .map(|(name, value)| Variable::new(name, value)),
    );
    result
}

/// Parses a `NAME=VALUE` assignment. The value may itself contain `=`.
///
/// # Errors
///
/// Returns `DomainError::InvalidAssignment` when there is no `=` and
/// `DomainError::InvalidVariableName` when the name is empty.
pub fn parse_assignment(input: &str) -> DomainResult<(String, String)> {
    let Some((name, value)) = input.split_once('=') else {
        return Err(DomainError::InvalidAssignment(input.to_string()));
    };
    let variable = Variable::try_new(name.trim(), value)?;
    Ok((variable.name, variable.value))
}
