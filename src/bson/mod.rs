pub mod decode;
pub mod encode;

pub use decode::decode;
pub use encode::encode;

use crate::error::Result;
use crate::types::Value;

/// Encode a value tree as a binary document.
pub fn from_value(value: &Value) -> Result<Vec<u8>> {
    encode(&crate::encode::tokenize_value(value)?)
}

/// Decode a binary document all the way to a value tree.
pub fn to_value(bytes: &[u8]) -> Result<Value> {
    crate::decode::from_str(&decode(bytes)?)
}
