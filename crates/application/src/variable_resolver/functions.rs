//! Function call dispatch
//!
//! Finds `name(args)` and `${name(args)}` call sites, calls the matching
//! built-in or namespace function and splices the result into the value.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};
use vareval_domain::Context;

use super::builtins::Builtin;
use super::cache::GroupedCache;
use super::namespace::{self, BridgeError, Namespace};
use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::Clock;

static CALL_SITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\$\{)?([.a-zA-Z0-9_-]+)\(([^)]*)?\)(?:\})?").expect("valid regex")
});

/// A call site found in a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Function name, possibly namespaced (`Math.abs`).
    pub name: String,
    /// Trimmed, comma separated arguments. Empty for `name()`.
    pub args: Vec<String>,
    /// Byte range of the whole call site, including `${` and `}` if present.
    pub span: std::ops::Range<usize>,
}

/// Finds the first call site at or after byte offset `start`.
#[must_use]
pub fn find_call_site(value: &str, start: usize) -> Option<CallSite> {
    let caps = CALL_SITE.captures_at(value, start)?;
    let whole = caps.get(0)?;
    let args = caps
        .get(2)
        .map(|m| m.as_str())
        .filter(|raw| !raw.is_empty())
        .map(|raw| raw.split(',').map(|a| a.trim().to_string()).collect())
        .unwrap_or_default();
    Some(CallSite {
        name: caps[1].to_string(),
        args,
        span: whole.range(),
    })
}

/// Evaluates function call sites in a value.
///
/// Borrows the session's grouped cache so grouped `now()` and `random()`
/// calls agree across every value resolved in the session.
pub struct FunctionDispatcher<'a> {
    cache: &'a mut GroupedCache,
    clock: &'a dyn Clock,
    context: Option<&'a Context>,
}

impl<'a> FunctionDispatcher<'a> {
    /// Creates a dispatcher over the session cache and clock.
    pub fn new(cache: &'a mut GroupedCache, clock: &'a dyn Clock) -> Self {
        Self {
            cache,
            clock,
            context: None,
        }
    }

    /// Sets the context used to resolve `${name}` arguments of namespace
    /// functions.
    #[must_use]
    pub const fn with_context(mut self, context: &'a Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Replaces every call site in `value` with the result of the call.
    ///
    /// Scanning resumes right after each inserted result, so results are
    /// never rescanned and the next call site is found whatever the length
    /// of the replacement.
    ///
    /// # Errors
    /// Fails on the first call site that cannot be evaluated.
    pub fn eval_functions(&mut self, value: &str) -> ApplicationResult<String> {
        let mut result = value.to_string();
        let mut cursor = 0;
        while let Some(site) = find_call_site(&result, cursor) {
            let replacement = self.call_fn(&site.name, &site.args)?;
            trace!(
                function = %site.name,
                matched = &result[site.span.clone()],
                replacement = %replacement,
                "replacing call site"
            );
            cursor = site.span.start + replacement.len();
            result.replace_range(site.span, &replacement);
        }
        Ok(result)
    }

    /// Calls one function and returns its textual result.
    ///
    /// # Errors
    /// `UnsupportedFunction` for unknown names, namespaces or members,
    /// `MissingArgument` when a required argument is absent.
    pub fn call_fn(&mut self, name: &str, args: &[String]) -> ApplicationResult<String> {
        if let Some((prefix, member)) = name.split_once('.') {
            let namespace = Namespace::parse(prefix)
                .ok_or_else(|| ApplicationError::UnsupportedFunction(name.to_string()))?;
            return namespace::call(namespace, member, args, self.context).map_err(|e| match e {
                BridgeError::MissingReceiver => {
                    ApplicationError::MissingArgument(format!("{name}()"))
                }
                BridgeError::UnknownMember => {
                    ApplicationError::UnsupportedFunction(name.to_string())
                }
                BridgeError::InvalidArgument(reason) => {
                    debug!(function = %name, %reason, "namespace function rejected its arguments");
                    ApplicationError::UnsupportedFunction(name.to_string())
                }
            });
        }

        let builtin = Builtin::lookup(name)
            .ok_or_else(|| ApplicationError::UnsupportedFunction(name.to_string()))?;
        builtin.call(args, self.cache, self.clock)
    }
}
