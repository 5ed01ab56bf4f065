use smallvec::SmallVec;

use crate::constants::{
    TAG_ARRAY, TAG_BOOLEAN, TAG_DOUBLE, TAG_INT32, TAG_INT64, TAG_NULL, TAG_STRING, TAG_TIMESTAMP,
};
use crate::error::{Error, Result};
use crate::types::Token;

/// Encode a token sequence (as produced by flattening a value tree) into a
/// binary document. The root must be an object.
///
/// Structural `:`/`,` tokens are stripped first and the width variants the
/// binary format does not represent are narrowed onto supported tags:
/// `UInt32` onto the int32 tag (bit pattern preserved), `IntWide` onto
/// int64, `UIntWide` onto uint64. Array lengths are back-patched: the
/// offset of each length field is recorded when the array opens and the
/// 4-byte little-endian count is spliced in when it closes.
pub fn encode(tokens: &[Token]) -> Result<Vec<u8>> {
    if tokens.is_empty() {
        return Err(Error::empty_input());
    }
    let tokens = normalize(tokens);
    if tokens.first() != Some(&Token::LeftBrace) {
        return Err(Error::unexpected("binary document root must be an object").at_token(0));
    }

    let mut encoder = Encoder {
        buffer: Vec::new(),
        frames: SmallVec::new(),
    };
    encoder.frames.push(Frame::object());

    let mut index = 1;
    while index < tokens.len() {
        index = encoder
            .step(&tokens, index)
            .map_err(|err| err.at_token(index))?;
    }
    if !encoder.frames.is_empty() {
        return Err(Error::unexpected("unclosed container").at_token(tokens.len()));
    }

    let mut document = Vec::with_capacity(encoder.buffer.len() + 4);
    let total = i32::try_from(encoder.buffer.len() + 4)
        .map_err(|_| Error::corrupt_length("document exceeds the 4-byte length range"))?;
    document.extend_from_slice(&total.to_le_bytes());
    document.extend_from_slice(&encoder.buffer);
    Ok(document)
}

/// Drop structurally implicit tokens and narrow unsupported widths.
fn normalize(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .filter_map(|token| match token {
            Token::Colon | Token::Comma => None,
            Token::UInt32(value) => Some(Token::Int32(*value as i32)),
            Token::IntWide(value) => Some(Token::Int64(*value)),
            Token::UIntWide(value) => Some(Token::UInt64(*value)),
            other => Some(other.clone()),
        })
        .collect()
}

enum FrameKind {
    Object,
    Array { next_index: u16 },
}

struct Frame {
    kind: FrameKind,
    /// For arrays: the buffer offset where the length field is spliced in.
    start: usize,
}

impl Frame {
    fn object() -> Self {
        Frame {
            kind: FrameKind::Object,
            start: 0,
        }
    }

    fn array(start: usize) -> Self {
        Frame {
            kind: FrameKind::Array { next_index: 0 },
            start,
        }
    }
}

struct Encoder {
    buffer: Vec<u8>,
    frames: SmallVec<[Frame; 16]>,
}

impl Encoder {
    /// Consume the element starting at `index`, returning the index of the
    /// next one.
    fn step(&mut self, tokens: &[Token], index: usize) -> Result<usize> {
        let token = &tokens[index];
        match token {
            Token::RightBrace => {
                match self.frames.pop() {
                    Some(Frame {
                        kind: FrameKind::Object,
                        ..
                    }) => {}
                    _ => return Err(Error::unexpected("`}` does not close an object")),
                }
                self.buffer.push(0);
                Ok(index + 1)
            }
            Token::RightBracket => {
                let frame = match self.frames.pop() {
                    Some(
                        frame @ Frame {
                            kind: FrameKind::Array { .. },
                            ..
                        },
                    ) => frame,
                    _ => return Err(Error::unexpected("`]` does not close an array")),
                };
                let content = self.buffer.len() - frame.start;
                let declared = i32::try_from(4 + content + 1)
                    .map_err(|_| Error::corrupt_length("array exceeds the 4-byte length range"))?;
                self.buffer
                    .splice(frame.start..frame.start, declared.to_le_bytes());
                self.buffer.push(0);
                Ok(index + 1)
            }
            Token::Key(name) => {
                if !matches!(
                    self.frames.last(),
                    Some(Frame {
                        kind: FrameKind::Object,
                        ..
                    })
                ) {
                    return Err(Error::unexpected("member name outside an object"));
                }
                let value = tokens
                    .get(index + 1)
                    .ok_or_else(|| Error::unexpected("member name without a value"))?;
                match value {
                    Token::LeftBrace => {
                        // Nested objects carry no tag and no length in this
                        // format: key, members, terminator.
                        self.write_cstring(name)?;
                        self.frames.push(Frame::object());
                    }
                    Token::LeftBracket => {
                        self.buffer.push(TAG_ARRAY);
                        self.write_cstring(name)?;
                        self.frames.push(Frame::array(self.buffer.len()));
                    }
                    scalar if scalar.is_scalar() => {
                        self.buffer.push(scalar_tag(scalar)?);
                        self.write_cstring(name)?;
                        self.write_scalar(scalar)?;
                    }
                    other => {
                        return Err(Error::unexpected(format!(
                            "{} cannot be a member value",
                            other.describe()
                        )));
                    }
                }
                Ok(index + 2)
            }
            element => {
                let Some(Frame {
                    kind: FrameKind::Array { next_index },
                    ..
                }) = self.frames.last_mut()
                else {
                    return Err(Error::unexpected(format!(
                        "{} is not valid inside an object",
                        element.describe()
                    )));
                };
                let element_index = *next_index;
                *next_index += 1;
                match element {
                    Token::LeftBrace => {
                        self.buffer.extend_from_slice(&element_index.to_le_bytes());
                        self.frames.push(Frame::object());
                    }
                    Token::LeftBracket => {
                        self.buffer.push(TAG_ARRAY);
                        self.buffer.extend_from_slice(&element_index.to_le_bytes());
                        self.frames.push(Frame::array(self.buffer.len()));
                    }
                    scalar if scalar.is_scalar() => {
                        self.buffer.push(scalar_tag(scalar)?);
                        self.buffer.extend_from_slice(&element_index.to_le_bytes());
                        self.write_scalar(scalar)?;
                    }
                    other => {
                        return Err(Error::unexpected(format!(
                            "{} is not valid inside an array",
                            other.describe()
                        )));
                    }
                }
                Ok(index + 1)
            }
        }
    }

    fn write_cstring(&mut self, name: &str) -> Result<()> {
        if name.as_bytes().contains(&0) {
            return Err(Error::malformed("member name contains a NUL byte"));
        }
        self.buffer.extend_from_slice(name.as_bytes());
        self.buffer.push(0);
        Ok(())
    }

    fn write_scalar(&mut self, token: &Token) -> Result<()> {
        match token {
            Token::Null => {}
            Token::Bool(value) => self.buffer.push(u8::from(*value)),
            Token::Int32(value) => self.buffer.extend_from_slice(&value.to_le_bytes()),
            Token::Int64(value) => self.buffer.extend_from_slice(&value.to_le_bytes()),
            Token::UInt64(value) => self.buffer.extend_from_slice(&value.to_le_bytes()),
            Token::Double(value) => self.buffer.extend_from_slice(&value.to_le_bytes()),
            Token::Str(value) => {
                let declared = i32::try_from(value.len() + 1)
                    .map_err(|_| Error::corrupt_length("string exceeds the 4-byte length range"))?;
                self.buffer.extend_from_slice(&declared.to_le_bytes());
                self.buffer.extend_from_slice(value.as_bytes());
                self.buffer.push(0);
            }
            other => {
                return Err(Error::unexpected(format!(
                    "{} has no binary payload form",
                    other.describe()
                )));
            }
        }
        Ok(())
    }
}

fn scalar_tag(token: &Token) -> Result<u8> {
    Ok(match token {
        Token::Null => TAG_NULL,
        Token::Bool(_) => TAG_BOOLEAN,
        Token::Int32(_) => TAG_INT32,
        Token::Int64(_) => TAG_INT64,
        Token::UInt64(_) => TAG_TIMESTAMP,
        Token::Double(_) => TAG_DOUBLE,
        Token::Str(_) => TAG_STRING,
        other => {
            return Err(Error::unexpected(format!(
                "{} has no binary tag",
                other.describe()
            )));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::tokenize_value;
    use crate::error::ErrorKind;
    use crate::types::Value;
    use std::collections::BTreeMap;

    fn encode_value(value: &Value) -> Result<Vec<u8>> {
        encode(&tokenize_value(value)?)
    }

    #[rstest::rstest]
    fn test_array_root_is_rejected() {
        let err = encode_value(&Value::Array(vec![])).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedToken(_)));
    }

    #[rstest::rstest]
    fn test_empty_object() {
        // 4-byte prefix + root terminator.
        assert_eq!(encode_value(&Value::Object(BTreeMap::new())).unwrap(), vec![
            5, 0, 0, 0, 0
        ]);
    }

    #[rstest::rstest]
    fn test_length_prefix_covers_members_and_terminator() {
        let mut members = BTreeMap::new();
        members.insert("ab".to_string(), Value::String("xyz".into()));
        members.insert("c".to_string(), Value::String("".into()));
        let bytes = encode_value(&Value::Object(members)).unwrap();

        // "ab": tag + "ab\0" + length + "xyz\0"  = 1 + 3 + 4 + 4 = 12
        // "c":  tag + "c\0" + length + "\0"      = 1 + 2 + 4 + 1 = 8
        let expected_total = 4 + 12 + 8 + 1;
        assert_eq!(bytes.len(), expected_total);
        assert_eq!(
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            expected_total as i32
        );
        assert_eq!(bytes[expected_total - 1], 0);
    }

    #[rstest::rstest]
    fn test_member_layout() {
        let mut members = BTreeMap::new();
        members.insert("n".to_string(), Value::Int32(-2));
        let bytes = encode_value(&Value::Object(members)).unwrap();
        let mut expected = vec![];
        expected.extend_from_slice(&12i32.to_le_bytes());
        expected.push(TAG_INT32);
        expected.extend_from_slice(b"n\0");
        expected.extend_from_slice(&(-2i32).to_le_bytes());
        expected.push(0);
        assert_eq!(bytes, expected);
    }

    #[rstest::rstest]
    fn test_width_narrowing() {
        let mut members = BTreeMap::new();
        members.insert("u".to_string(), Value::UInt32(4_000_000_000));
        members.insert("w".to_string(), Value::IntWide(1));
        members.insert("x".to_string(), Value::UIntWide(2));
        let bytes = encode_value(&Value::Object(members)).unwrap();
        assert_eq!(bytes[4], TAG_INT32);
        let narrowed = i32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]);
        assert_eq!(narrowed as u32, 4_000_000_000);
        assert_eq!(bytes[11], TAG_INT64);
        assert_eq!(bytes[22], TAG_TIMESTAMP);
    }

    #[rstest::rstest]
    fn test_array_length_backpatch() {
        let mut members = BTreeMap::new();
        members.insert(
            "a".to_string(),
            Value::Array(vec![Value::Int32(7), Value::Bool(true)]),
        );
        let bytes = encode_value(&Value::Object(members)).unwrap();

        let mut expected = vec![];
        // elements: (tag + key + 4) + (tag + key + 1)
        let element_bytes = (1 + 2 + 4) + (1 + 2 + 1);
        let array_declared = (4 + element_bytes + 1) as i32;
        let total = (4 + (1 + 2) + element_bytes + 4 + 1 + 1) as i32;
        expected.extend_from_slice(&total.to_le_bytes());
        expected.push(TAG_ARRAY);
        expected.extend_from_slice(b"a\0");
        expected.extend_from_slice(&array_declared.to_le_bytes());
        expected.push(TAG_INT32);
        expected.extend_from_slice(&0u16.to_le_bytes());
        expected.extend_from_slice(&7i32.to_le_bytes());
        expected.push(TAG_BOOLEAN);
        expected.extend_from_slice(&1u16.to_le_bytes());
        expected.push(1);
        expected.push(0); // array terminator
        expected.push(0); // document terminator
        assert_eq!(bytes, expected);
    }

    #[rstest::rstest]
    fn test_key_with_nul_is_rejected() {
        let mut members = BTreeMap::new();
        members.insert("a\0b".to_string(), Value::Null);
        let err = encode_value(&Value::Object(members)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedLiteral(_)));
    }
}
