use memchr::memchr2;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::constants::is_skippable;
use crate::error::{Error, Result};
use crate::num::number::{classify_integer, parse_double};
use crate::text::string::{
    code_point_to_char, combine_surrogates, is_high_surrogate, is_low_surrogate,
};
use crate::types::Token;

/// Scan a UTF-8 text buffer into a flat token sequence.
///
/// Quoted strings in an object's member-name position become [`Token::Key`];
/// every other quoted string becomes [`Token::Str`]. The scanner keeps a
/// bracket stack for that classification only; grammar enforcement is the
/// builder's job.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    if input.is_empty() {
        return Err(Error::empty_input());
    }
    Scanner::new(input).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Object,
    Array,
}

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    containers: SmallVec<[ContainerKind; 16]>,
    expect_key: bool,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            containers: SmallVec::new(),
            expect_key: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(&byte) = self.bytes.get(self.pos) {
            if is_skippable(byte, false) {
                self.pos += 1;
                continue;
            }
            match byte {
                b'{' => {
                    tokens.push(Token::LeftBrace);
                    self.containers.push(ContainerKind::Object);
                    self.expect_key = true;
                    self.pos += 1;
                }
                b'[' => {
                    tokens.push(Token::LeftBracket);
                    self.containers.push(ContainerKind::Array);
                    self.expect_key = false;
                    self.pos += 1;
                }
                b'}' => {
                    tokens.push(Token::RightBrace);
                    self.containers.pop();
                    self.expect_key = false;
                    self.pos += 1;
                }
                b']' => {
                    tokens.push(Token::RightBracket);
                    self.containers.pop();
                    self.expect_key = false;
                    self.pos += 1;
                }
                b':' => {
                    tokens.push(Token::Colon);
                    self.expect_key = false;
                    self.pos += 1;
                }
                b',' => {
                    tokens.push(Token::Comma);
                    self.expect_key = self.containers.last() == Some(&ContainerKind::Object);
                    self.pos += 1;
                }
                b'"' => {
                    let is_key =
                        self.expect_key && self.containers.last() == Some(&ContainerKind::Object);
                    let text = self.scan_string()?;
                    self.expect_key = false;
                    tokens.push(if is_key {
                        Token::Key(text)
                    } else {
                        Token::Str(text)
                    });
                }
                b't' => {
                    self.scan_keyword("true")?;
                    tokens.push(Token::Bool(true));
                }
                b'f' => {
                    self.scan_keyword("false")?;
                    tokens.push(Token::Bool(false));
                }
                b'n' => {
                    self.scan_keyword("null")?;
                    tokens.push(Token::Null);
                }
                b'-' | b'+' | b'.' | b'0'..=b'9' | b'e' | b'E' => {
                    tokens.push(self.scan_number()?);
                }
                _ => {
                    return Err(
                        Error::malformed(format!("unexpected character `{}`", byte as char))
                            .at_byte(self.pos),
                    );
                }
            }
        }
        Ok(tokens)
    }

    fn scan_keyword(&mut self, literal: &'static str) -> Result<()> {
        let end = self.pos + literal.len();
        if self.bytes.get(self.pos..end) == Some(literal.as_bytes()) {
            self.pos = end;
            Ok(())
        } else {
            Err(Error::malformed(format!("expected literal `{literal}`")).at_byte(self.pos))
        }
    }

    /// Collect a number literal up to the next delimiter and run it through
    /// the width cascade (or the float parser when a decimal point or
    /// exponent marker is present).
    fn scan_number(&mut self) -> Result<Token> {
        let start = self.pos;
        while let Some(&byte) = self.bytes.get(self.pos) {
            if byte == b',' || byte == b']' || byte == b'}' || is_skippable(byte, false) {
                break;
            }
            self.pos += 1;
        }
        let text = &self.input[start..self.pos];
        let is_float = text.contains(['.', 'e', 'E']);
        if is_float {
            parse_double(text)
                .map(Token::Double)
                .map_err(|err| err.at_byte(start))
        } else {
            classify_integer(text).map_err(|err| err.at_byte(start))
        }
    }

    /// Scan a string literal starting at the opening quote, resolving
    /// escapes. Plain spans are bulk-copied between escape boundaries.
    fn scan_string(&mut self) -> Result<SmolStr> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            let rest = &self.bytes[self.pos..];
            let Some(stop) = memchr2(b'"', b'\\', rest) else {
                return Err(Error::malformed("unterminated string").at_byte(start));
            };
            value.push_str(&self.input[self.pos..self.pos + stop]);
            self.pos += stop;
            if self.bytes[self.pos] == b'"' {
                self.pos += 1;
                return Ok(SmolStr::from(value));
            }
            self.scan_escape(&mut value)?;
        }
    }

    /// Resolve one backslash escape; `self.pos` sits on the backslash.
    fn scan_escape(&mut self, value: &mut String) -> Result<()> {
        let escape_pos = self.pos;
        let Some(&byte) = self.bytes.get(self.pos + 1) else {
            return Err(Error::malformed("unterminated escape").at_byte(escape_pos));
        };
        self.pos += 2;
        match byte {
            b'"' | b'\\' | b'/' => value.push(byte as char),
            b'b' => value.push('\u{8}'),
            b'f' => value.push('\u{c}'),
            b'n' => value.push('\n'),
            b'r' => value.push('\r'),
            b't' => value.push('\t'),
            b'v' => value.push('\u{b}'),
            b'u' => self.scan_unicode_escape(value)?,
            _ => {
                return Err(Error::malformed(format!(
                    "invalid escape character `{}`",
                    byte as char
                ))
                .at_byte(escape_pos));
            }
        }
        Ok(())
    }

    /// `self.pos` sits just past `\u`. A short hex run is not consumed as
    /// an escape: the `u` and the collected digits are emitted literally
    /// and scanning resumes at the first non-hex character.
    fn scan_unicode_escape(&mut self, value: &mut String) -> Result<()> {
        let Some(code) = self.collect_hex4()? else {
            let collected = self.hex_run_len();
            value.push('u');
            value.push_str(&self.input[self.pos..self.pos + collected]);
            self.pos += collected;
            return Ok(());
        };
        self.pos += 4;

        // Peek for a second escape; a high surrogate must pair with a
        // low surrogate to combine into one code point.
        if self.bytes.get(self.pos) == Some(&b'\\') && self.bytes.get(self.pos + 1) == Some(&b'u') {
            let follower_pos = self.pos;
            self.pos += 2;
            let Some(second) = self.collect_hex4()? else {
                return Err(
                    Error::malformed("invalid code point for low surrogate").at_byte(follower_pos)
                );
            };
            if is_high_surrogate(code) {
                if is_low_surrogate(second) {
                    self.pos += 4;
                    let combined = combine_surrogates(code, second);
                    value.push(code_point_to_char(combined));
                    return Ok(());
                }
                return Err(
                    Error::malformed("invalid code point range for low surrogate")
                        .at_byte(follower_pos),
                );
            }
            // Not a surrogate lead: emit it standalone and back up so the
            // second escape is reprocessed from its backslash.
            self.pos = follower_pos;
            value.push(code_point_to_char(code));
            return Ok(());
        }

        if self.pos >= self.bytes.len() {
            return Err(Error::malformed("unterminated string").at_byte(self.pos));
        }
        value.push(code_point_to_char(code));
        Ok(())
    }

    /// Parse four hex digits at `self.pos` without consuming them.
    /// `Ok(None)` means a non-hex character cut the run short; truncation
    /// by end of input is a hard failure.
    fn collect_hex4(&mut self) -> Result<Option<u32>> {
        let mut code: u32 = 0;
        for offset in 0..4 {
            let Some(&byte) = self.bytes.get(self.pos + offset) else {
                return Err(Error::malformed("unterminated escape").at_byte(self.pos + offset));
            };
            let Some(digit) = (byte as char).to_digit(16) else {
                return Ok(None);
            };
            code = code * 16 + digit;
        }
        Ok(Some(code))
    }

    fn hex_run_len(&self) -> usize {
        self.bytes[self.pos..]
            .iter()
            .take(4)
            .take_while(|byte| (**byte as char).is_ascii_hexdigit())
            .count()
    }
}
