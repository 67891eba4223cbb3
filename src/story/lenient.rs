//! Forgiving field deserializers for user-supplied form data.
//!
//! Form values arrive from HTML inputs, so numbers may be strings and text
//! fields may be missing or of the wrong JSON type. None of these are errors:
//! unusable values collapse to "absent" and the synthesizer substitutes its
//! defaults.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a count: integers, floats (truncated) and
/// numeric strings are accepted, anything else is absent.
pub fn parse_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Interpret a JSON value as free text. Scalars are stringified, everything
/// else becomes empty.
pub fn parse_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub fn count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_count(&value))
}

pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_text(&value))
}
