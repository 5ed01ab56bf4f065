mod de;
mod ser;

use std::collections::BTreeMap;

use crate::types::Value;

/// Bridge from the serde_json data model. Integer widths re-run the same
/// classification the text parser applies.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(number) => {
                if let Some(value) = number.as_u64() {
                    de::classify_u64(value)
                } else if let Some(value) = number.as_i64() {
                    de::classify_i64(value)
                } else {
                    Value::Double(number.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(members) => {
                let converted: BTreeMap<String, Value> = members
                    .into_iter()
                    .map(|(key, member)| (key, Value::from(member)))
                    .collect();
                Value::Object(converted)
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int32(n) => serde_json::Value::from(*n),
            Value::UInt32(n) => serde_json::Value::from(*n),
            Value::IntWide(n) | Value::Int64(n) => serde_json::Value::from(*n),
            Value::UIntWide(n) | Value::UInt64(n) => serde_json::Value::from(*n),
            Value::Double(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(members) => {
                let converted: serde_json::Map<String, serde_json::Value> = members
                    .iter()
                    .map(|(key, member)| (key.clone(), serde_json::Value::from(member)))
                    .collect();
                serde_json::Value::Object(converted)
            }
        }
    }
}
