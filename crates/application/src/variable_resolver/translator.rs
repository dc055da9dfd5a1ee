//! Expression translation
//!
//! Turns a value with `${expr}` markers into a concatenation expression for
//! the external evaluator:
//!
//! ```text
//! test ${val} done   ->   'test ' + val + ' done'
//! ```
//!
//! Literal runs are single-quoted with `\` and `'` escaped, so the evaluator
//! gives back the literal text byte for byte.

use std::borrow::Cow;

use vareval_domain::needs_evaluation;

use super::tokenizer::Tokenizer;
use crate::error::{ApplicationError, ApplicationResult};

/// A value translated for the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// One expression for a single-line value.
    Single(String),
    /// One expression per line. Results are joined with `\n`.
    Lines(Vec<String>),
}

/// Translates a value, splitting multiline values into one expression per
/// line.
///
/// # Errors
/// Returns `ApplicationError::Syntax` for an unterminated `${`.
pub fn translate(value: &str) -> ApplicationResult<Translation> {
    if value.contains('\n') {
        prepare_multiline_value(value).map(Translation::Lines)
    } else {
        prepare_value(value).map(|expr| Translation::Single(expr.into_owned()))
    }
}

/// Quotes a literal run for the evaluator grammar.
#[must_use]
pub fn quote_literal(literal: &str) -> String {
    let mut quoted = String::with_capacity(literal.len() + 2);
    quoted.push('\'');
    for ch in literal.chars() {
        if ch == '\\' || ch == '\'' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

/// Translates a single-line value.
///
/// Values without `${` are returned untouched. A `$` that does not open a
/// `${` marker is kept as literal text.
///
/// # Errors
/// Returns `ApplicationError::Syntax` when a `${` has no closing `}`.
pub fn prepare_value(value: &str) -> ApplicationResult<Cow<'_, str>> {
    if !needs_evaluation(value) {
        return Ok(Cow::Borrowed(value));
    }

    let mut tokenizer = Tokenizer::new(value);
    let mut parsed = String::with_capacity(value.len() + 8);
    let mut literal = String::new();
    loop {
        let start = tokenizer.position();
        let Some(left) = tokenizer.next_until('$') else {
            tokenizer.rewind(start);
            literal.push_str(&tokenizer.eof());
            parsed.push_str(&quote_literal(&literal));
            return Ok(Cow::Owned(parsed));
        };
        literal.push_str(&left);

        if tokenizer.peek() != Some('{') {
            literal.push('$');
            continue;
        }
        tokenizer.next();

        let expression = tokenizer
            .next_until('}')
            .ok_or_else(|| ApplicationError::Syntax("Unclosed curly bracket.".to_string()))?;

        parsed.push_str(&quote_literal(&literal));
        parsed.push_str(" + ");
        parsed.push_str(&expression);
        parsed.push_str(" + ");
        literal.clear();
    }
}

/// Translates every line of a multiline value. Lines without `${` become a
/// single quoted literal.
///
/// # Errors
/// Returns `ApplicationError::Syntax` when any line has an unterminated `${`.
pub fn prepare_multiline_value(value: &str) -> ApplicationResult<Vec<String>> {
    value
        .split('\n')
        .map(|line| {
            if needs_evaluation(line) {
                prepare_value(line).map(Cow::into_owned)
            } else {
                Ok(quote_literal(line))
            }
        })
        .collect()
}
