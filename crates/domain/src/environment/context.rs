//! Resolved variable context
//!
//! The flat name -> value map handed to the expression evaluator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::variable::needs_evaluation;

/// Caller supplied values that replace or extend the provider's variables.
pub type OverrideMap = BTreeMap<String, String>;

/// A flat mapping from variable name to its (resolved) value.
///
/// Keys are kept sorted so that serialized contexts are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: BTreeMap<String, String>,
}

impl Context {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Binds `name` to `value`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Names whose value still contains `${...}` syntax.
    #[must_use]
    pub fn unresolved_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, value)| needs_evaluation(value))
            .map(|(name, _)| name)
            .collect()
    }

    /// Returns a copy of this context with `overrides` applied on top.
    /// Override entries win on key collision.
    #[must_use]
    pub fn with_overrides(&self, overrides: &OverrideMap) -> Self {
        let mut merged = self.clone();
        for (name, value) in overrides {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Consumes the context, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.values
    }
}

impl From<BTreeMap<String, String>> for Context {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_context_new_is_empty() {
        let ctx = Context::new();
        assert!(ctx.is_empty());
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn test_with_overrides_copies_and_wins() {
        let ctx: Context = [("test", "true"), ("value", "my-value")].into_iter().collect();
        let mut overrides = OverrideMap::new();
        overrides.insert("value".to_string(), "other-value".to_string());

        let merged = ctx.with_overrides(&overrides);
        assert_eq!(merged.get("value"), Some("other-value"));
        assert_eq!(merged.get("test"), Some("true"));
        // original untouched
        assert_eq!(ctx.get("value"), Some("my-value"));
    }

    #[test]
    fn test_unresolved_names() {
        let ctx: Context = [("a", "${b}"), ("b", "plain")].into_iter().collect();
        assert_eq!(ctx.unresolved_names(), vec!["a"]);
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let ctx: Context = [("b", "2"), ("a", "1")].into_iter().collect();
        let json = serde_json::to_string(&ctx).expect("Should serialize");
        assert_eq!(json, r#"{"a":"1","b":"2"}"#);
    }
}
