//! Legacy magic-variable syntax
//!
//! Older values use `${now}`, `${now:N}`, `${random}` and `${random:N}`.
//! These are rewritten into function-call syntax before dispatch, keeping the
//! group number.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static LEGACY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(random|now):?([0-9]+)?\}").expect("valid regex")
});

/// Rewrites legacy markers into `${now()}`, `${now(N)}`, `${random()}` and
/// `${random(N)}`. Other content is kept verbatim.
///
/// Returns the input borrowed when nothing matched.
///
/// # Examples
///
/// ```
/// use vareval_application::variable_resolver::legacy::rewrite;
///
/// assert_eq!(rewrite("a ${now:1} b ${random}"), "a ${now(1)} b ${random()}");
/// ```
#[must_use]
pub fn rewrite(value: &str) -> Cow<'_, str> {
    LEGACY_PATTERN.replace_all(value, |caps: &Captures<'_>| {
        let word = &caps[1];
        let group = caps.get(2).map_or("", |m| m.as_str());
        format!("${{{word}({group})}}")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_upgrades_now() {
        assert_eq!(rewrite("test ${now}"), "test ${now()}");
    }

    #[test]
    fn test_upgrades_now_with_group() {
        assert_eq!(rewrite("test ${now:1}"), "test ${now(1)}");
    }

    #[test]
    fn test_upgrades_random() {
        assert_eq!(rewrite("test ${random}"), "test ${random()}");
    }

    #[test]
    fn test_upgrades_random_with_group() {
        assert_eq!(rewrite("test ${random:1}"), "test ${random(1)}");
    }

    #[test]
    fn test_upgrades_adjacent_markers() {
        assert_eq!(
            rewrite("${random:1}${random:2}${random:1}${now}"),
            "${random(1)}${random(2)}${random(1)}${now()}"
        );
    }

    #[test]
    fn test_identity_without_markers() {
        let input = "plain ${value} now() random(2)";
        assert!(matches!(rewrite(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let inputs = [
            "x ${now} y ${random:12} z",
            "${now:}",
            "already ${now(3)}",
            "",
        ];
        for input in inputs {
            let once = rewrite(input).into_owned();
            let twice = rewrite(&once).into_owned();
            assert_eq!(once, twice);
        }
    }
}
