//! Firestore REST value mapping.
//!
//! The REST API wraps every field in a typed value object
//! (`{"stringValue": ...}`, `{"integerValue": "42"}`, ...). This module
//! converts between those wrappers and plain JSON / domain types. Timestamp
//! fields go through `Timestamp::parse_flexible` after unwrapping, because
//! older app revisions wrote creation times in several shapes.

use serde_json::{json, Map, Value};

use crate::domain::foundation::Timestamp;

/// Firestore document fields, as returned under the `fields` key.
pub type Fields = Map<String, Value>;

// ── Encoding ─────────────────────────────────────────────────────────────

pub fn string_value(s: impl Into<String>) -> Value {
    let s: String = s.into();
    json!({ "stringValue": s })
}

pub fn double_value(v: f64) -> Value {
    json!({ "doubleValue": v })
}

pub fn bool_value(v: bool) -> Value {
    json!({ "booleanValue": v })
}

/// Integers travel as strings in the REST API.
pub fn integer_value(v: i64) -> Value {
    json!({ "integerValue": v.to_string() })
}

pub fn timestamp_value(ts: &Timestamp) -> Value {
    json!({ "timestampValue": ts.to_rfc3339() })
}

// ── Decoding ─────────────────────────────────────────────────────────────

/// Unwraps a typed Firestore value into plain JSON.
pub fn decode(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };

    if let Some(s) = obj.get("stringValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(s) = obj.get("timestampValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(i) = obj.get("integerValue") {
        // Number or decimal string, depending on the writer
        let parsed = match i {
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        if let Some(n) = parsed {
            return json!(n);
        }
    }
    if let Some(d) = obj.get("doubleValue").and_then(Value::as_f64) {
        return json!(d);
    }
    if let Some(b) = obj.get("booleanValue").and_then(Value::as_bool) {
        return Value::Bool(b);
    }
    if obj.contains_key("nullValue") {
        return Value::Null;
    }
    if let Some(map) = obj.get("mapValue").and_then(|m| m.get("fields")) {
        let mut out = Map::new();
        if let Some(fields) = map.as_object() {
            for (k, v) in fields {
                out.insert(k.clone(), decode(v));
            }
        }
        return Value::Object(out);
    }
    if let Some(values) = obj
        .get("arrayValue")
        .and_then(|a| a.get("values"))
        .and_then(Value::as_array)
    {
        return Value::Array(values.iter().map(decode).collect());
    }

    Value::Null
}

// ── Field readers ────────────────────────────────────────────────────────

pub fn get_string(fields: &Fields, name: &str) -> Option<String> {
    match decode(fields.get(name)?) {
        Value::String(s) => Some(s),
        _ => None,
    }
}

pub fn get_f64(fields: &Fields, name: &str) -> Option<f64> {
    decode(fields.get(name)?).as_f64()
}

pub fn get_bool(fields: &Fields, name: &str) -> Option<bool> {
    decode(fields.get(name)?).as_bool()
}

/// Reads and normalizes a timestamp field. Unparseable values are logged and
/// dropped rather than failing the whole document.
pub fn get_timestamp(fields: &Fields, name: &str) -> Option<Timestamp> {
    let raw = decode(fields.get(name)?);
    if raw.is_null() {
        return None;
    }
    match Timestamp::parse_flexible(&raw) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::warn!(field = name, error = %e, "Dropping unparseable timestamp field");
            None
        }
    }
}
