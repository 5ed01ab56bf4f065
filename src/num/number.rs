use std::num::IntErrorKind;

use crate::error::{Error, Result};
use crate::types::Token;

/// Canonical text form of a floating value: fixed-point, exactly 15 digits
/// after the decimal point. Round-tripping a float through the engine is
/// expected to rewrite it into this form.
pub fn format_double(value: f64) -> String {
    format!("{value:.15}")
}

pub fn push_i64(out: &mut String, value: i64) {
    let mut buffer = itoa::Buffer::new();
    out.push_str(buffer.format(value));
}

pub fn push_u64(out: &mut String, value: u64) {
    let mut buffer = itoa::Buffer::new();
    out.push_str(buffer.format(value));
}

/// Parse a floating literal. Values outside the finite range are rejected,
/// not saturated.
pub fn parse_double(text: &str) -> Result<f64> {
    let value: f64 = text
        .parse()
        .map_err(|_| Error::malformed(format!("invalid number `{text}`")))?;
    if !value.is_finite() {
        return Err(Error::malformed(format!("number out of range `{text}`")));
    }
    Ok(value)
}

/// Classify an integer literal against the signedness-ordered width
/// cascade: `i32 -> wide -> i64` for negative values, `u32 -> wide -> u64`
/// otherwise. A stage is abandoned only on overflow; any other parse error
/// fails the literal outright. The wide stages carry 64-bit payloads, so
/// the final stage only surfaces range exhaustion.
pub fn classify_integer(text: &str) -> Result<Token> {
    if text.starts_with('-') {
        match text.parse::<i32>() {
            Ok(value) => return Ok(Token::Int32(value)),
            Err(err) if is_overflow(err.kind()) => {}
            Err(_) => return Err(Error::malformed(format!("invalid number `{text}`"))),
        }
        match text.parse::<i64>() {
            Ok(value) => Ok(Token::IntWide(value)),
            Err(err) if is_overflow(err.kind()) => {
                Err(Error::malformed(format!("number out of range `{text}`")))
            }
            Err(_) => Err(Error::malformed(format!("invalid number `{text}`"))),
        }
    } else {
        match text.parse::<u32>() {
            Ok(value) => return Ok(Token::UInt32(value)),
            Err(err) if is_overflow(err.kind()) => {}
            Err(_) => return Err(Error::malformed(format!("invalid number `{text}`"))),
        }
        match text.parse::<u64>() {
            Ok(value) => Ok(Token::UIntWide(value)),
            Err(err) if is_overflow(err.kind()) => {
                Err(Error::malformed(format!("number out of range `{text}`")))
            }
            Err(_) => Err(Error::malformed(format!("invalid number `{text}`"))),
        }
    }
}

fn is_overflow(kind: &IntErrorKind) -> bool {
    matches!(kind, IntErrorKind::PosOverflow | IntErrorKind::NegOverflow)
}
