//! Deterministic JSON serialization.
//!
//! Contexts, requests and settings are printed with:
//! - keys sorted alphabetically (via `BTreeMap` in domain types)
//! - 2-space indentation
//! - a trailing newline

mod json;

pub use json::*;
