pub mod writer;

use smol_str::SmolStr;

use crate::error::{Error, Result};
use crate::types::{Token, Value};

pub use writer::render;

/// Flatten a value tree into the token sequence its text form is built
/// from. The inverse of the tree builder: array elements appear in order,
/// object members in key order, every container terminated by its closing
/// bracket. The root must be an array or object.
pub fn tokenize_value(value: &Value) -> Result<Vec<Token>> {
    if !value.is_array() && !value.is_object() {
        return Err(Error::type_mismatch("array or object", value.type_name()));
    }
    let mut tokens = Vec::new();
    emit_value(value, &mut tokens);
    Ok(tokens)
}

/// Render a tree as compact text.
pub fn to_string(value: &Value) -> Result<String> {
    Ok(render(&tokenize_value(value)?, false))
}

/// Render a tree as pretty-printed text, 4 spaces per nesting depth.
pub fn to_string_pretty(value: &Value) -> Result<String> {
    Ok(render(&tokenize_value(value)?, true))
}

/// Compact rendering without the container-root restriction; used by the
/// `Display` impl on `Value`.
pub(crate) fn display_compact(value: &Value) -> String {
    let mut tokens = Vec::new();
    emit_value(value, &mut tokens);
    render(&tokens, false)
}

fn emit_value(value: &Value, tokens: &mut Vec<Token>) {
    match value {
        Value::Null => tokens.push(Token::Null),
        Value::Bool(b) => tokens.push(Token::Bool(*b)),
        Value::Int32(n) => tokens.push(Token::Int32(*n)),
        Value::UInt32(n) => tokens.push(Token::UInt32(*n)),
        Value::IntWide(n) => tokens.push(Token::IntWide(*n)),
        Value::UIntWide(n) => tokens.push(Token::UIntWide(*n)),
        Value::Int64(n) => tokens.push(Token::Int64(*n)),
        Value::UInt64(n) => tokens.push(Token::UInt64(*n)),
        Value::Double(f) => tokens.push(Token::Double(*f)),
        Value::String(s) => tokens.push(Token::Str(SmolStr::from(s))),
        Value::Array(items) => {
            tokens.push(Token::LeftBracket);
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    tokens.push(Token::Comma);
                }
                emit_value(item, tokens);
            }
            tokens.push(Token::RightBracket);
        }
        Value::Object(members) => {
            tokens.push(Token::LeftBrace);
            for (index, (key, member)) in members.iter().enumerate() {
                if index > 0 {
                    tokens.push(Token::Comma);
                }
                tokens.push(Token::Key(SmolStr::from(key)));
                tokens.push(Token::Colon);
                emit_value(member, tokens);
            }
            tokens.push(Token::RightBrace);
        }
    }
}
