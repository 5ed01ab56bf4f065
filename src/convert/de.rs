use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::types::Value;

/// Width classification mirroring the text parser's cascade: non-negative
/// integers land in the unsigned variants, negative ones in the signed.
pub(crate) fn classify_i64(value: i64) -> Value {
    if value >= 0 {
        return classify_u64(value as u64);
    }
    match i32::try_from(value) {
        Ok(narrow) => Value::Int32(narrow),
        Err(_) => Value::IntWide(value),
    }
}

pub(crate) fn classify_u64(value: u64) -> Value {
    match u32::try_from(value) {
        Ok(narrow) => Value::UInt32(narrow),
        Err(_) => Value::UIntWide(value),
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any valid document value")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
        Ok(Value::Bool(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
        Ok(classify_i64(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
        Ok(classify_u64(value))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
        Ok(Value::Double(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Value, E> {
        Ok(Value::String(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<Value, E> {
        Ok(Value::String(value))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut members = BTreeMap::new();
        while let Some((key, member)) = map.next_entry::<String, Value>()? {
            members.insert(key, member);
        }
        Ok(Value::Object(members))
    }
}
