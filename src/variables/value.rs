//! Canonical variable value encoding.
//!
//! Variable values are stored as strings because they end up in
//! `TF_VAR_name` environment variables. Plain strings are kept as-is and
//! every other value is compact JSON, which is also the syntax Terraform
//! accepts for complex-typed `TF_VAR_name` values.

use crate::Result;
use hcl::{Number, Value};

/// Encode a decoded value as its canonical string.
pub fn canonical(value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}

/// Whether a declared type constraint is exactly `string`.
fn is_string_type(type_hint: Option<&str>) -> bool {
    type_hint.is_some_and(|hint| hint.trim() == "string")
}

/// Convert a canonical string back into a typed HCL value.
///
/// Variables declared as `string` keep their text. Anything else is decoded
/// as JSON when possible and otherwise kept as a plain string. An empty
/// value of a declared non-string type has no value at all.
pub fn typed(value: &str, type_hint: Option<&str>) -> Value {
    if is_string_type(type_hint) {
        return Value::String(value.to_string());
    }
    if value.is_empty() {
        return match type_hint {
            Some(_) => Value::Null,
            None => Value::String(String::new()),
        };
    }
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(decoded) => from_json(decoded),
        Err(_) => Value::String(value.to_string()),
    }
}

/// Convert a JSON value into the equivalent HCL value.
pub fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(Number::from(i))
            } else if let Some(u) = n.as_u64() {
                Value::Number(Number::from(u))
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(from_json).collect())
        }
        serde_json::Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, from_json(value)))
                .collect(),
        ),
    }
}

/// Flatten a rendered HCL value to a string the way variables are encoded.
pub fn flatten(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}
