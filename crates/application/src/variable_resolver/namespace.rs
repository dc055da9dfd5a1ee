//! Namespaced native functions
//!
//! Bridges `Math.member(args)`, `String.member(receiver, args)` and
//! `JSON.member(args)` call sites to Rust implementations that mirror the
//! behaviour of the JavaScript globals of the same name. String positions
//! are counted in characters.

use vareval_domain::{Context, number_to_string};

/// Longest string `String.repeat` and `String.padStart`/`padEnd` may build.
const MAX_GENERATED_LEN: usize = 1_000_000;

/// Namespaces that may be called from a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// `Math.*`
    Math,
    /// `String.*`
    String,
    /// `JSON.*`
    Json,
}

impl Namespace {
    /// Parses a namespace name. Matching is exact and case-sensitive.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Math" => Some(Self::Math),
            "String" => Some(Self::String),
            "JSON" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Failures inside the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The namespace has no such member.
    UnknownMember,
    /// `String.*` called without a receiver.
    MissingReceiver,
    /// An argument is out of range or malformed.
    InvalidArgument(String),
}

/// Replaces an argument of the form `${name}` with the value bound in
/// `context`. Unbound names are returned bare, without the marker.
#[must_use]
pub fn apply_arguments_context(arg: &str, context: &Context) -> String {
    match arg.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(name) => context.get(name).unwrap_or(name).to_string(),
        None => arg.to_string(),
    }
}

/// Calls `namespace.member` with `args`.
///
/// # Errors
/// See [`BridgeError`].
pub fn call(
    namespace: Namespace,
    member: &str,
    args: &[String],
    context: Option<&Context>,
) -> Result<String, BridgeError> {
    let args: Vec<String> = match context {
        Some(context) => args
            .iter()
            .map(|arg| apply_arguments_context(arg, context))
            .collect(),
        None => args.to_vec(),
    };
    match namespace {
        Namespace::Math => call_math(member, &args),
        Namespace::Json => call_json(member, &args),
        Namespace::String => {
            let (receiver, rest) = args.split_first().ok_or(BridgeError::MissingReceiver)?;
            call_string(member, receiver, rest)
        }
    }
}

/// JavaScript `Number(value)` for the argument strings found at call sites.
#[allow(clippy::cast_precision_loss)]
fn to_number(value: &str) -> f64 {
    let trimmed = value.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => {
            if let Some(hex) = trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
            {
                return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
            }
            // Rust accepts "inf" and "nan"; JavaScript does not.
            if trimmed
                .chars()
                .any(|c| c.is_alphabetic() && c != 'e' && c != 'E')
            {
                return f64::NAN;
            }
            trimmed.parse().unwrap_or(f64::NAN)
        }
    }
}

/// JavaScript `ToIntegerOrInfinity`.
fn to_integer(value: &str) -> f64 {
    let n = to_number(value);
    if n.is_nan() { 0.0 } else { n.trunc() }
}

fn number_arg(args: &[String], index: usize) -> f64 {
    args.get(index).map_or(f64::NAN, |arg| to_number(arg))
}

fn call_math(member: &str, args: &[String]) -> Result<String, BridgeError> {
    let x = number_arg(args, 0);
    let value = match member {
        "abs" => x.abs(),
        "acos" => x.acos(),
        "acosh" => x.acosh(),
        "asin" => x.asin(),
        "asinh" => x.asinh(),
        "atan" => x.atan(),
        "atanh" => x.atanh(),
        "atan2" => x.atan2(number_arg(args, 1)),
        "cbrt" => x.cbrt(),
        "ceil" => x.ceil(),
        "cos" => x.cos(),
        "cosh" => x.cosh(),
        "exp" => x.exp(),
        "expm1" => x.exp_m1(),
        "floor" => x.floor(),
        "fround" => fround(x),
        "log" => x.ln(),
        "log1p" => x.ln_1p(),
        "log10" => x.log10(),
        "log2" => x.log2(),
        "pow" => x.powf(number_arg(args, 1)),
        "random" => rand::random::<f64>(),
        "round" => js_round(x),
        "sign" => {
            if x.is_nan() || x == 0.0 {
                x
            } else {
                x.signum()
            }
        }
        "sin" => x.sin(),
        "sinh" => x.sinh(),
        "sqrt" => x.sqrt(),
        "tan" => x.tan(),
        "tanh" => x.tanh(),
        "trunc" => x.trunc(),
        "max" => fold_numbers(args, f64::NEG_INFINITY, f64::max),
        "min" => fold_numbers(args, f64::INFINITY, f64::min),
        "hypot" => args
            .iter()
            .map(|a| to_number(a))
            .fold(0.0, |acc: f64, n| acc.hypot(n)),
        _ => return Err(BridgeError::UnknownMember),
    };
    Ok(number_to_string(value))
}

/// `Math.fround`: nearest single-precision value.
#[allow(clippy::cast_possible_truncation)]
/// Rounds half up like `Math.round`, without the `x + 0.5` precision loss.
fn js_round(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

fn fround(x: f64) -> f64 {
    f64::from(x as f32)
}

/// `Math.max` / `Math.min`: any NaN argument makes the result NaN.
fn fold_numbers(args: &[String], initial: f64, pick: fn(f64, f64) -> f64) -> f64 {
    args.iter().map(|a| to_number(a)).fold(initial, |acc, n| {
        if acc.is_nan() || n.is_nan() {
            f64::NAN
        } else {
            pick(acc, n)
        }
    })
}

fn call_json(member: &str, args: &[String]) -> Result<String, BridgeError> {
    match member {
        "stringify" => Ok(args.first().map_or_else(
            || "undefined".to_string(),
            |arg| serde_json::Value::String(arg.clone()).to_string(),
        )),
        "parse" => {
            let input = args.first().map_or("", String::as_str);
            let parsed: serde_json::Value = serde_json::from_str(input)
                .map_err(|e| BridgeError::InvalidArgument(e.to_string()))?;
            Ok(match parsed {
                serde_json::Value::String(text) => text,
                serde_json::Value::Number(n) => {
                    n.as_f64().map_or_else(|| n.to_string(), number_to_string)
                }
                other => other.to_string(),
            })
        }
        _ => Err(BridgeError::UnknownMember),
    }
}

/// Resolves a possibly negative relative index against `len`.
fn relative_index(arg: Option<&String>, len: usize, default: f64) -> usize {
    let n = arg.map_or(default, |a| to_integer(a));
    #[allow(clippy::cast_precision_loss)]
    let len_f = len as f64;
    let resolved = if n < 0.0 { (len_f + n).max(0.0) } else { n.min(len_f) };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = resolved as usize;
    index
}

/// Clamps an absolute index to `[0, len]`.
fn clamped_index(arg: Option<&String>, len: usize, default: f64) -> usize {
    let n = arg.map_or(default, |a| to_integer(a));
    #[allow(clippy::cast_precision_loss)]
    let clamped = n.clamp(0.0, len as f64);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = clamped as usize;
    index
}

fn char_slice(chars: &[char], start: usize, end: usize) -> String {
    if start >= end {
        return String::new();
    }
    chars[start..end].iter().collect()
}

fn char_index_of(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let byte_from = haystack
        .char_indices()
        .nth(from)
        .map_or(haystack.len(), |(i, _)| i);
    haystack[byte_from..]
        .find(needle)
        .map(|byte| haystack[..byte_from + byte].chars().count())
}

fn pad(receiver: &str, args: &[String], at_start: bool) -> Result<String, BridgeError> {
    let requested = args.first().map_or(0.0, |a| to_integer(a));
    let len = receiver.chars().count();
    #[allow(clippy::cast_precision_loss)]
    let limit = len.max(MAX_GENERATED_LEN) as f64;
    if requested > limit {
        return Err(BridgeError::InvalidArgument(format!(
            "invalid target length: {requested}"
        )));
    }
    let target = clamped_index(args.first(), MAX_GENERATED_LEN.max(len), 0.0);
    let fill = args.get(1).map_or(" ", String::as_str);
    if target <= len || fill.is_empty() {
        return Ok(receiver.to_string());
    }
    let padding: String = fill.chars().cycle().take(target - len).collect();
    Ok(if at_start {
        format!("{padding}{receiver}")
    } else {
        format!("{receiver}{padding}")
    })
}

#[allow(clippy::too_many_lines)]
fn call_string(member: &str, receiver: &str, args: &[String]) -> Result<String, BridgeError> {
    let chars: Vec<char> = receiver.chars().collect();
    let len = chars.len();
    let first = args.first().map_or("undefined", String::as_str);

    let result = match member {
        "toUpperCase" | "toLocaleUpperCase" => receiver.to_uppercase(),
        "toLowerCase" | "toLocaleLowerCase" => receiver.to_lowercase(),
        "trim" => receiver.trim().to_string(),
        "trimStart" => receiver.trim_start().to_string(),
        "trimEnd" => receiver.trim_end().to_string(),
        "toString" | "valueOf" => receiver.to_string(),
        "substr" => {
            let start = relative_index(args.first(), len, 0.0);
            #[allow(clippy::cast_precision_loss)]
            let count = args
                .get(1)
                .map_or(len as f64, |a| to_integer(a))
                .max(0.0);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let end = (start + count.min(len as f64) as usize).min(len);
            char_slice(&chars, start, end)
        }
        "substring" => {
            let a = clamped_index(args.first(), len, 0.0);
            #[allow(clippy::cast_precision_loss)]
            let b = clamped_index(args.get(1), len, len as f64);
            char_slice(&chars, a.min(b), a.max(b))
        }
        "slice" => {
            let start = relative_index(args.first(), len, 0.0);
            #[allow(clippy::cast_precision_loss)]
            let end = relative_index(args.get(1), len, len as f64);
            char_slice(&chars, start, end)
        }
        "charAt" => {
            let index = to_integer(args.first().map_or("0", String::as_str));
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let found = (index >= 0.0)
                .then(|| chars.get(index as usize))
                .flatten();
            found.map_or_else(String::new, ToString::to_string)
        }
        "at" => {
            let index = to_integer(args.first().map_or("0", String::as_str));
            #[allow(clippy::cast_precision_loss)]
            let absolute = if index < 0.0 { len as f64 + index } else { index };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let found = (absolute >= 0.0)
                .then(|| chars.get(absolute as usize))
                .flatten();
            found.map_or_else(|| "undefined".to_string(), ToString::to_string)
        }
        "indexOf" => {
            let from = clamped_index(args.get(1), len, 0.0);
            char_index_of(receiver, first, from)
                .map_or_else(|| "-1".to_string(), |i| i.to_string())
        }
        "lastIndexOf" => receiver
            .rfind(first)
            .map_or_else(|| "-1".to_string(), |byte| receiver[..byte].chars().count().to_string()),
        "includes" => receiver.contains(first).to_string(),
        "startsWith" => receiver.starts_with(first).to_string(),
        "endsWith" => receiver.ends_with(first).to_string(),
        "repeat" => {
            let count = to_integer(first);
            #[allow(clippy::cast_precision_loss)]
            let limit = (MAX_GENERATED_LEN.max(len) / len.max(1)) as f64;
            if !(0.0..=limit).contains(&count) {
                return Err(BridgeError::InvalidArgument(format!(
                    "invalid count value: {first}"
                )));
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = count as usize;
            receiver.repeat(count)
        }
        "padStart" => pad(receiver, args, true)?,
        "padEnd" => pad(receiver, args, false)?,
        "replace" => {
            let replacement = args.get(1).map_or("undefined", String::as_str);
            receiver.replacen(first, replacement, 1)
        }
        "replaceAll" => {
            let replacement = args.get(1).map_or("undefined", String::as_str);
            receiver.replace(first, replacement)
        }
        "concat" => {
            let mut joined = receiver.to_string();
            for arg in args {
                joined.push_str(arg);
            }
            joined
        }
        "split" => match args.first() {
            None => receiver.to_string(),
            Some(separator) if separator.is_empty() => chars
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            Some(separator) => receiver.split(separator.as_str()).collect::<Vec<_>>().join(","),
        },
        _ => return Err(BridgeError::UnknownMember),
    };
    Ok(result)
}
