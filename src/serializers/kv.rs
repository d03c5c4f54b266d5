//! Key/value binding: query strings, form fields, and route parameters
//! overlaid onto typed request objects.
//!
//! # Design Decisions
//! - Bridged through `serde_json::Value`: serialize the base instance,
//!   overlay pairs, deserialize back — no per-field reflection
//! - Field name matching is case-insensitive, wire convention
//! - Raw strings are coerced toward the existing field's type so `"123"`
//!   still binds into a string field

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::CodecError;

/// Build a fresh `T` from pairs alone (the GET/DELETE/OPTIONS path).
pub fn bind<T>(pairs: &[(String, String)]) -> Result<T, CodecError>
where
    T: Default + Serialize + DeserializeOwned,
{
    merge(T::default(), pairs)
}

/// Overlay pairs onto an existing instance.
pub fn merge<T>(base: T, pairs: &[(String, String)]) -> Result<T, CodecError>
where
    T: Serialize + DeserializeOwned,
{
    if pairs.is_empty() {
        return Ok(base);
    }
    let mut tree = serde_json::to_value(&base)?;
    let Value::Object(ref mut map) = tree else {
        return Err(CodecError::Binding(
            "key/value binding requires a struct-shaped request".to_string(),
        ));
    };
    for (key, raw) in pairs {
        // match the declared field name case-insensitively
        let field = map
            .keys()
            .find(|k| k.eq_ignore_ascii_case(key))
            .cloned()
            .unwrap_or_else(|| key.clone());
        let coerced = coerce(raw, map.get(&field));
        map.insert(field, coerced);
    }
    Ok(serde_json::from_value(tree)?)
}

fn coerce(raw: &str, existing: Option<&Value>) -> Value {
    match existing {
        Some(Value::String(_)) => Value::String(raw.to_string()),
        Some(Value::Number(n)) => {
            if n.is_f64() {
                raw.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(raw.to_string()))
            } else {
                raw.parse::<i64>()
                    .map(|v| Value::Number(v.into()))
                    .unwrap_or_else(|_| Value::String(raw.to_string()))
            }
        }
        Some(Value::Bool(_)) => raw
            .parse::<bool>()
            .map(Value::Bool)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(Value::Array(_)) => Value::Array(raw.split(',').map(infer).collect()),
        _ => infer(raw),
    }
}

fn infer(raw: &str) -> Value {
    if let Ok(v) = raw.parse::<i64>() {
        return Value::Number(v.into());
    }
    if let Ok(v) = raw.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(v) {
            return Value::Number(n);
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}
