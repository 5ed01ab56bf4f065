//! Conversion engine between JSON text, a BSON-style binary format, and an
//! in-memory tree of typed values.
//!
//! The four core pieces share one token vocabulary and one value model:
//! the tokenizer scans text into tokens, the builder reconstructs a
//! [`Value`] tree from them, the serializer flattens a tree back into
//! tokens and renders them (compact or pretty-printed), and the binary
//! codec converts between the binary layout and the textual form.
//!
//! Inputs are assumed fully materialized and already normalized to UTF-8;
//! file handling, BOM stripping, and source transcoding belong to the
//! caller.
//!
//! ```
//! let value = binjson::parse_str(r#"{"greeting": "hello", "count": 2}"#)?;
//! assert_eq!(value.get("greeting").and_then(|v| v.as_str()), Some("hello"));
//!
//! let text = binjson::to_string(&value)?;
//! assert_eq!(text, r#"{"count":2,"greeting":"hello"}"#);
//!
//! let binary = binjson::to_bson(&value)?;
//! assert_eq!(binjson::from_bson(&binary)?, value);
//! # Ok::<(), binjson::Error>(())
//! ```

pub mod bson;
pub mod constants;
mod convert;
pub mod decode;
pub mod encode;
pub mod error;
pub mod num;
pub mod text;
pub mod types;

pub use crate::error::{Error, ErrorKind, Position, Result};
pub use crate::types::{Token, Value};

/// Parse a UTF-8 text document into a value tree.
pub fn parse_str(input: &str) -> Result<Value> {
    decode::from_str(input)
}

/// Parse a UTF-8 byte buffer into a value tree.
pub fn parse_slice(input: &[u8]) -> Result<Value> {
    decode::from_slice(input)
}

/// Render a value tree as compact text.
pub fn to_string(value: &Value) -> Result<String> {
    encode::to_string(value)
}

/// Render a value tree as pretty-printed text.
pub fn to_string_pretty(value: &Value) -> Result<String> {
    encode::to_string_pretty(value)
}

/// Render a value tree as compact text bytes.
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    Ok(to_string(value)?.into_bytes())
}

/// Encode a value tree as a binary document.
pub fn to_bson(value: &Value) -> Result<Vec<u8>> {
    bson::from_value(value)
}

/// Decode a binary document into a value tree.
pub fn from_bson(bytes: &[u8]) -> Result<Value> {
    bson::to_value(bytes)
}

/// Decode a binary document into JSON text without building a tree.
pub fn bson_to_string(bytes: &[u8]) -> Result<String> {
    bson::decode(bytes)
}
