//! Normalization of loosely typed request values.
//!
//! HTTP query strings blur the line between scalars, delimited strings,
//! and arrays. The helpers here fold those shapes into canonical ones; a
//! value that cannot be folded yields `None` rather than an error so
//! callers can skip it and keep compiling.

use serde_json::Value as Json;

/// Normalize a value to a list of tokens.
///
/// Arrays pass through unchanged. Strings containing a comma split on the
/// comma into whitespace-trimmed tokens. Anything else is not list-like
/// and yields `None`.
pub fn to_list(value: &Json) -> Option<Vec<Json>> {
    match value {
        Json::Array(items) => Some(items.clone()),
        Json::String(s) if s.contains(',') => Some(
            s.split(',')
                .map(|token| Json::String(token.trim().to_string()))
                .collect(),
        ),
        _ => None,
    }
}

/// Fold the literal strings `"true"` / `"false"` into real booleans.
///
/// Any other value passes through unchanged, including strings that merely
/// look boolean-ish.
pub fn boolean(value: Json) -> Json {
    match value {
        Json::String(ref s) if s == "true" => Json::Bool(true),
        Json::String(ref s) if s == "false" => Json::Bool(false),
        other => other,
    }
}

/// Whether a value is a native number, or a string that is non-empty and
/// integer-parseable after stripping non-numeric characters.
pub fn looks_numeric(value: &Json) -> bool {
    match value {
        Json::Number(_) => true,
        Json::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '-')
                .collect();
            !digits.is_empty() && digits.parse::<i64>().is_ok()
        }
        _ => false,
    }
}

/// Read a value as an integer: native numbers directly, strings via parse.
pub fn integer(value: &Json) -> Option<i64> {
    match value {
        Json::Number(n) => n.as_i64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
