//! Evaluator Settings Domain Model
//!
//! Tunables for the resolution engine.

use serde::{Deserialize, Serialize};

/// Default number of dependency-resolution passes.
pub const DEFAULT_MAX_PASSES: usize = 2;

/// Settings for the variables evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorSettings {
    /// Maximum number of passes when resolving variables that reference
    /// other variables. Bounds circular references.
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,

    /// If set, the before-request hook leaves requests untouched.
    #[serde(default)]
    pub skip_before_request: bool,
}

const fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
            skip_before_request: false,
        }
    }
}

impl EvaluatorSettings {
    /// Pass limit, never below one.
    #[must_use]
    pub fn pass_limit(&self) -> usize {
        self.max_passes.max(1)
    }
}
