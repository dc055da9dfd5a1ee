//! Built-in functions
//!
//! `now()`, `random()`, `encodeURIComponent()` and `decodeURIComponent()`.
//! Names are matched after capitalizing their first character, so `now()`
//! and `Now()` are the same function.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use super::cache::{CachedFunction, GroupedCache};
use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::Clock;

/// Characters left alone by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Largest integer exactly representable in an `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Information about a built-in function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinInfo {
    /// Function name as written in values
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Example call
    pub example: &'static str,
}

/// The closed set of built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// Current epoch time in milliseconds, optionally grouped.
    Now,
    /// Random non-negative integer, optionally grouped.
    Random,
    /// Percent-encodes the first argument.
    EncodeUriComponent,
    /// Percent-decodes the first argument.
    DecodeUriComponent,
}

impl Builtin {
    /// Looks up a built-in by name. Only the first character is
    /// case-insensitive.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let first = chars.next()?;
        let capitalized: String = first.to_uppercase().chain(chars).collect();
        match capitalized.as_str() {
            "Now" => Some(Self::Now),
            "Random" => Some(Self::Random),
            "EncodeURIComponent" => Some(Self::EncodeUriComponent),
            "DecodeURIComponent" => Some(Self::DecodeUriComponent),
            _ => None,
        }
    }

    /// Canonical name as written in values.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Now => "now",
            Self::Random => "random",
            Self::EncodeUriComponent => "encodeURIComponent",
            Self::DecodeUriComponent => "decodeURIComponent",
        }
    }

    /// Calls the built-in with the arguments found at the call site.
    ///
    /// # Errors
    /// Returns `MissingArgument` when encode/decode get no value and
    /// `InvalidArgument` when a decoded value is not valid UTF-8.
    pub fn call(
        self,
        args: &[String],
        cache: &mut GroupedCache,
        clock: &dyn Clock,
    ) -> ApplicationResult<String> {
        let first = args.first().map(String::as_str).filter(|a| !a.is_empty());
        match self {
            Self::Now => Ok(cache
                .get_or_insert_with(CachedFunction::Now, first, || clock.now_millis())
                .to_string()),
            Self::Random => Ok(cache
                .get_or_insert_with(CachedFunction::Random, first, random_int)
                .to_string()),
            Self::EncodeUriComponent => {
                let value = first.ok_or_else(|| self.missing_argument())?;
                Ok(utf8_percent_encode(value, URI_COMPONENT).to_string())
            }
            Self::DecodeUriComponent => {
                let value = first.ok_or_else(|| self.missing_argument())?;
                percent_decode_str(value)
                    .decode_utf8()
                    .map(|decoded| decoded.into_owned())
                    .map_err(|e| ApplicationError::InvalidArgument {
                        function: self.name().to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    }

    fn missing_argument(self) -> ApplicationError {
        ApplicationError::MissingArgument(format!("{}()", self.name()))
    }

    /// Returns all built-ins with descriptions.
    #[must_use]
    pub fn available() -> Vec<BuiltinInfo> {
        vec![
            BuiltinInfo {
                name: "now",
                description: "Current time in milliseconds since the Unix epoch. \
                              Calls sharing a group argument share the value",
                example: "${now()} ${now(1)}",
            },
            BuiltinInfo {
                name: "random",
                description: "Random non-negative integer. \
                              Calls sharing a group argument share the value",
                example: "${random()} ${random(1)}",
            },
            BuiltinInfo {
                name: "encodeURIComponent",
                description: "Percent-encodes the argument",
                example: "encodeURIComponent(a b)",
            },
            BuiltinInfo {
                name: "decodeURIComponent",
                description: "Decodes a percent-encoded argument",
                example: "decodeURIComponent(a%20b)",
            },
            BuiltinInfo {
                name: "Math.*",
                description: "Math functions, e.g. Math.abs, Math.max, Math.round",
                example: "Math.abs(-1)",
            },
            BuiltinInfo {
                name: "String.*",
                description: "String methods, the first argument is the receiver",
                example: "String.toUpperCase(abc)",
            },
            BuiltinInfo {
                name: "JSON.*",
                description: "JSON.stringify and JSON.parse",
                example: "JSON.stringify(abc)",
            },
        ]
    }
}

/// Random integer in `[0, 2^31]`: a uniform draw scaled to the safe integer
/// range, truncated to a signed 32-bit integer, then made non-negative.
fn random_int() -> i64 {
    let scaled = (rand::random::<f64>() * MAX_SAFE_INTEGER).floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let truncated = (scaled as u64) as u32 as i32;
    i64::from(truncated.unsigned_abs())
}
