//! Grouped cache for non-deterministic built-ins
//!
//! `now(group)` and `random(group)` store their first value under
//! `(function, group)` so later references to the same group agree. The cache
//! is owned by one evaluator session; two sessions never see each other's
//! groups.

use std::collections::HashMap;

/// Functions whose results can be grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedFunction {
    /// `now()`
    Now,
    /// `random()`
    Random,
}

/// Session-owned store of grouped values.
#[derive(Debug, Clone, Default)]
pub struct GroupedCache {
    entries: HashMap<(CachedFunction, String), i64>,
}

impl GroupedCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the grouped value, computing and storing it on first use.
    /// Without a group the value is computed fresh and not stored.
    pub fn get_or_insert_with(
        &mut self,
        function: CachedFunction,
        group: Option<&str>,
        compute: impl FnOnce() -> i64,
    ) -> i64 {
        let Some(group) = group.filter(|g| !g.is_empty()) else {
            return compute();
        };
        *self
            .entries
            .entry((function, group.to_string()))
            .or_insert_with(compute)
    }

    /// Removes every stored group.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no group is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
