use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// The tree of typed values a document parses into. Object members are
/// keyed by a sorted map, so serialization order is deterministic and
/// independent of insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    IntWide(i64),
    UIntWide(u64),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int32(_) => "int32",
            Value::UInt32(_) => "uint32",
            Value::IntWide(_) => "wide int",
            Value::UIntWide(_) => "wide uint",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Int32(_)
                | Value::UInt32(_)
                | Value::IntWide(_)
                | Value::UIntWide(_)
                | Value::Int64(_)
                | Value::UInt64(_)
                | Value::Double(_)
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(i64::from(*n)),
            Value::UInt32(n) => Some(i64::from(*n)),
            Value::IntWide(n) | Value::Int64(n) => Some(*n),
            Value::UIntWide(n) | Value::UInt64(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int32(n) => u64::try_from(*n).ok(),
            Value::UInt32(n) => Some(u64::from(*n)),
            Value::IntWide(n) | Value::Int64(n) => u64::try_from(*n).ok(),
            Value::UIntWide(n) | Value::UInt64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(n) => Some(f64::from(*n)),
            Value::UInt32(n) => Some(f64::from(*n)),
            Value::IntWide(n) | Value::Int64(n) => Some(*n as f64),
            Value::UIntWide(n) | Value::UInt64(n) => Some(*n as f64),
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }

    pub fn expect_array(&self) -> Result<&Vec<Value>> {
        self.as_array()
            .ok_or_else(|| Error::type_mismatch("array", self.type_name()))
    }

    pub fn expect_object(&self) -> Result<&BTreeMap<String, Value>> {
        self.as_object()
            .ok_or_else(|| Error::type_mismatch("object", self.type_name()))
    }

    /// Object member lookup; `None` for missing keys and non-objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|members| members.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.as_object_mut().and_then(|members| members.get_mut(key))
    }

    /// Array element lookup; `None` out of range and for non-arrays.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.as_object().is_some_and(|members| members.contains_key(key))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
        match self {
            Value::Object(members) => Ok(members.insert(key.into(), value)),
            other => Err(Error::type_mismatch("object", other.type_name())),
        }
    }

    pub fn push(&mut self, value: Value) -> Result<()> {
        match self {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(Error::type_mismatch("array", other.type_name())),
        }
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        match self {
            Value::Object(members) => Ok(members.remove(key)),
            other => Err(Error::type_mismatch("object", other.type_name())),
        }
    }

    pub fn remove_index(&mut self, index: usize) -> Result<Option<Value>> {
        match self {
            Value::Array(items) => {
                if index < items.len() {
                    Ok(Some(items.remove(index)))
                } else {
                    Ok(None)
                }
            }
            other => Err(Error::type_mismatch("array", other.type_name())),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        match self {
            Value::Array(items) => {
                items.clear();
                Ok(())
            }
            Value::Object(members) => {
                members.clear();
                Ok(())
            }
            other => Err(Error::type_mismatch("array or object", other.type_name())),
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(items.len()),
            Value::Object(members) => Some(members.len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::encode::display_compact(self))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int32(i32::from(v))
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int32(i32::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::UInt32(u32::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::UInt32(u32::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Double(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Object(v)
    }
}
