use crate::error::{Error, Result};

/// Escape `s` into `out` for emission inside a quoted JSON literal.
///
/// Named escapes where they exist, `\uXXXX` for other control characters
/// below `0x1f` and for every non-ASCII code point (as a surrogate pair
/// above `0xFFFF`); printable ASCII passes through untouched.
pub fn escape_into(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            _ if (ch as u32) < 0x1f || !ch.is_ascii() => {
                push_u_escape(out, ch as u32);
            }
            _ => out.push(ch),
        }
    }
}

/// Byte-level variant for binary payloads: the bytes must form valid UTF-8
/// or the conversion fails.
pub fn escape_bytes_into(out: &mut String, bytes: &[u8]) -> Result<()> {
    let text = std::str::from_utf8(bytes).map_err(|_| Error::invalid_utf8())?;
    escape_into(out, text);
    Ok(())
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    escape_into(&mut out, s);
    out
}

/// Write `\uXXXX`, splitting code points above the basic plane into a
/// UTF-16 surrogate pair.
pub fn push_u_escape(out: &mut String, code: u32) {
    if (0x10000..=0x10ffff).contains(&code) {
        let reduced = code - 0x10000;
        let high = 0xd800 + reduced / 0x400;
        let low = 0xdc00 + reduced % 0x400;
        out.push_str(&format!("\\u{high:04x}"));
        out.push_str(&format!("\\u{low:04x}"));
    } else {
        out.push_str(&format!("\\u{code:04x}"));
    }
}

/// Combine a UTF-16 surrogate pair into one code point.
pub fn combine_surrogates(high: u32, low: u32) -> u32 {
    0x10000 + (high - 0xd800) * 0x400 + (low - 0xdc00)
}

pub fn is_high_surrogate(code: u32) -> bool {
    (0xd800..=0xdbff).contains(&code)
}

pub fn is_low_surrogate(code: u32) -> bool {
    (0xdc00..=0xdfff).contains(&code)
}

/// Decode a scanned code point into a character. Lone surrogates cannot
/// live in a Rust string and fall back to U+FFFD.
pub fn code_point_to_char(code: u32) -> char {
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}
