pub mod parser;
pub mod scanner;

use crate::error::{Error, Result};
use crate::types::Value;

pub use parser::build;
pub use scanner::tokenize;

/// Parse a UTF-8 text document into a value tree.
pub fn from_str(input: &str) -> Result<Value> {
    build(&tokenize(input)?)
}

/// Parse a byte buffer, which must already be normalized UTF-8; encoding
/// detection and transcoding are the caller's responsibility.
pub fn from_slice(input: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(input).map_err(|_| Error::invalid_utf8())?;
    from_str(text)
}
