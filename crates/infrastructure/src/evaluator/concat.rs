//! Concatenation expression evaluator.
//!
//! Evaluates the expressions produced by the translator:
//! - `'literal'` with `\'` and `\\` escapes (double quotes work too)
//! - bare identifiers, looked up in the context; after the first character
//!   they may contain `-` and `.` (`base-url`, `api.host`)
//! - numbers, `true`, `false` and `null`
//! - `+` joining operands left to right
//!
//! `+` adds when neither side is a string and concatenates otherwise, the
//! way JavaScript does.

use async_trait::async_trait;
use tracing::warn;
use vareval_application::ports::{EvaluatorError, ExpressionEvaluator};
use vareval_domain::{Context, number_to_string};

/// Evaluates `'literal' + name + ...` expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatEvaluator;

impl ConcatEvaluator {
    /// Creates a new evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExpressionEvaluator for ConcatEvaluator {
    async fn eval(&self, expression: &str, context: &Context) -> Result<String, EvaluatorError> {
        evaluate(expression, context).map(|value| value.into_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Number(f64),
    Ident(String),
    Plus,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Operand {
    fn to_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Bool(flag) => f64::from(u8::from(*flag)),
            Self::Null => 0.0,
            Self::Text(text) => text.trim().parse().unwrap_or(f64::NAN),
        }
    }

    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(n) => number_to_string(n),
            Self::Bool(flag) => flag.to_string(),
            Self::Null => "null".to_string(),
        }
    }

    fn add(self, other: Self) -> Self {
        if matches!(self, Self::Text(_)) || matches!(other, Self::Text(_)) {
            let mut joined = self.into_string();
            joined.push_str(&other.into_string());
            Self::Text(joined)
        } else {
            Self::Number(self.to_number() + other.to_number())
        }
    }
}

fn parse_error(expression: &str, reason: impl Into<String>) -> EvaluatorError {
    EvaluatorError::Parse {
        expression: expression.to_string(),
        reason: reason.into(),
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>, EvaluatorError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '+' => tokens.push(Token::Plus),
            '\'' | '"' => {
                let mut text = String::new();
                let mut escape_next = false;
                let mut closed = false;
                for c in chars.by_ref() {
                    if escape_next {
                        text.push(c);
                        escape_next = false;
                    } else if c == '\\' {
                        escape_next = true;
                    } else if c == ch {
                        closed = true;
                        break;
                    } else {
                        text.push(c);
                    }
                }
                if !closed {
                    return Err(parse_error(expression, "unterminated string literal"));
                }
                tokens.push(Token::Text(text));
            }
            c if c.is_ascii_digit() => {
                let mut number = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !next.is_ascii_digit() && next != '.' {
                        break;
                    }
                    number.push(next);
                    chars.next();
                }
                let value = number
                    .parse()
                    .map_err(|_| parse_error(expression, format!("invalid number `{number}`")))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut name = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !next.is_alphanumeric() && !matches!(next, '_' | '$' | '-' | '.') {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                tokens.push(Token::Ident(name));
            }
            other => {
                return Err(parse_error(expression, format!("unexpected character `{other}`")));
            }
        }
    }

    Ok(tokens)
}

fn operand(expression: &str, token: Token, context: &Context) -> Result<Operand, EvaluatorError> {
    Ok(match token {
        Token::Text(text) => Operand::Text(text),
        Token::Number(n) => Operand::Number(n),
        Token::Ident(name) => match name.as_str() {
            "true" => Operand::Bool(true),
            "false" => Operand::Bool(false),
            "null" => Operand::Null,
            _ => match context.get(&name) {
                Some(value) => Operand::Text(value.to_string()),
                None => {
                    warn!(identifier = %name, "unknown identifier evaluates to an empty string");
                    Operand::Text(String::new())
                }
            },
        },
        Token::Plus => return Err(parse_error(expression, "expected a value, found `+`")),
    })
}

fn evaluate(expression: &str, context: &Context) -> Result<Operand, EvaluatorError> {
    let mut tokens = tokenize(expression)?.into_iter();
    let first = tokens
        .next()
        .ok_or_else(|| parse_error(expression, "empty expression"))?;
    let mut result = operand(expression, first, context)?;

    while let Some(token) = tokens.next() {
        if token != Token::Plus {
            return Err(parse_error(expression, "expected `+` between values"));
        }
        let next = tokens
            .next()
            .ok_or_else(|| parse_error(expression, "expression ends with `+`"))?;
        result = result.add(operand(expression, next, context)?);
    }

    Ok(result)
}
