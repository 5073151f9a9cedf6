//! Display-safety redaction for execution-state snapshots.
//!
//! Interrupt snapshots are shown to the user and may be copied into logs or
//! bug reports, so fields whose names look credential-like are masked and
//! string values are stripped of markup-like sequences before display.
//!
//! This is a display-safety measure, not a security boundary: the unredacted
//! snapshot still exists in the runtime, and the name heuristic cannot catch
//! every sensitive field. Do not use the output for trust decisions.

use serde_json::Value;

/// Placeholder substituted for values of sensitive-looking fields.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

/// Case-insensitive substrings that mark a field name as sensitive.
const SENSITIVE_MARKERS: &[&str] = &[
    "password",
    "secret",
    "token",
    "credential",
    "session",
    "api_key",
    "apikey",
    "auth",
    "private",
];

fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SENSITIVE_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Remove markup-like `<...>` sequences from a string.
///
/// An unterminated `<` drops the remainder of the string, since a truncated
/// tag is still markup-like.
#[must_use]
pub fn strip_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Produce a display-safe copy of an execution-state snapshot.
///
/// Any object field whose name contains a sensitive marker (case-insensitive
/// substring match) is replaced with [`REDACTED_PLACEHOLDER`] regardless of
/// its value type; remaining string values are stripped of markup. Objects
/// and arrays are walked recursively. The input is not modified.
///
/// # Examples
///
/// ```rust
/// use flowboard::utils::redact_state;
/// use serde_json::json;
///
/// let safe = redact_state(&json!({"token": "abc", "user": "alice"}));
/// assert_eq!(safe, json!({"token": "[REDACTED]", "user": "alice"}));
/// ```
#[must_use]
pub fn redact_state(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, val) in map {
                if is_sensitive_key(key) {
                    out.insert(key.clone(), Value::String(REDACTED_PLACEHOLDER.into()));
                } else {
                    out.insert(key.clone(), redact_state(val));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_state).collect()),
        Value::String(s) => Value::String(strip_markup(s)),
        other => other.clone(),
    }
}
