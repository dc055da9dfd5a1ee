//! Values accepted by the evaluator
//!
//! Request fields and on-demand inputs are not always text. Only text and
//! scalars are evaluated; everything else passes through untouched.

use serde::{Deserialize, Serialize};

/// Any value handed to the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value. Never evaluated.
    Null,
    /// Boolean scalar, evaluated as `"true"` / `"false"`.
    Bool(bool),
    /// Numeric scalar, evaluated in its JavaScript string form.
    Number(f64),
    /// Text, possibly containing `${...}` expressions.
    Text(String),
    /// Opaque bytes (file or multipart payloads). Never evaluated.
    #[serde(skip_deserializing)]
    Binary(Vec<u8>),
    /// Structured JSON (objects, arrays). Never evaluated.
    Object(serde_json::Value),
}

impl Value {
    /// Returns the text form for values that take part in evaluation.
    /// `Null`, `Binary` and `Object` return `None`.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Bool(flag) => Some(flag.to_string()),
            Self::Number(n) => Some(number_to_string(*n)),
            Self::Null | Self::Binary(_) | Self::Object(_) => None,
        }
    }

    /// Returns true for values that are empty or absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::Binary(bytes) => bytes.is_empty(),
            Self::Bool(_) | Self::Number(_) | Self::Object(_) => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

/// Formats a number the way JavaScript's `String(n)` does: integral values
/// carry no fraction, `NaN` and infinities are named, and magnitudes below
/// `1e-6` or from `1e21` up switch to exponent notation (`1e-7`, `1.5e+21`).
#[must_use]
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // covers -0
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-tripping digits, e.g. `1.5e21`.
    let scientific = format!("{:e}", n.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if n < 0.0 { "-" } else { "" };
    // decimal point position relative to the start of `digits`
    let point = exponent + 1;
    let count = i32::try_from(digits.len()).unwrap_or(i32::MAX);

    let body = if count <= point && point <= 21 {
        let zeros = usize::try_from(point - count).unwrap_or(0);
        format!("{digits}{}", "0".repeat(zeros))
    } else if 0 < point && point <= 21 {
        let split = usize::try_from(point).unwrap_or(0);
        format!("{}.{}", &digits[..split], &digits[split..])
    } else if -6 < point && point <= 0 {
        let zeros = usize::try_from(-point).unwrap_or(0);
        format!("0.{}{digits}", "0".repeat(zeros))
    } else {
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        let (head, tail) = digits.split_at(1);
        if tail.is_empty() {
            format!("{head}e{exponent_sign}{}", exponent.abs())
        } else {
            format!("{head}.{tail}e{exponent_sign}{}", exponent.abs())
        }
    };
    format!("{sign}{body}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(2.0), "2");
        assert_eq!(number_to_string(-110.0), "-110");
        assert_eq!(number_to_string(0.5), "0.5");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_number_to_string_switches_to_exponent_at_the_extremes() {
        assert_eq!(number_to_string(0.000_001), "0.000001");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(-1.5e-7), "-1.5e-7");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e21), "1.5e+21");
        assert_eq!(number_to_string(123.456), "123.456");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_to_text_scalars() {
        assert_eq!(Value::from(2.0).to_text(), Some("2".to_string()));
        assert_eq!(Value::from(false).to_text(), Some("false".to_string()));
        assert_eq!(Value::from("x").to_text(), Some("x".to_string()));
    }

    #[test]
    fn test_to_text_pass_through_values() {
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::Binary(vec![1, 2]).to_text(), None);
        assert_eq!(Value::Object(serde_json::json!({"a": "b"})).to_text(), None);
    }

    #[test]
    fn test_deserialize_untagged() {
        let values: Vec<Value> =
            serde_json::from_str(r#"[null, true, 2, "text", {"a": 1}]"#).expect("Should parse");
        assert_eq!(values[0], Value::Null);
        assert_eq!(values[1], Value::Bool(true));
        assert_eq!(values[2], Value::Number(2.0));
        assert_eq!(values[3], Value::Text("text".to_string()));
        assert!(matches!(values[4], Value::Object(_)));
    }
}
