use memchr::memchr;
use smallvec::SmallVec;

use crate::constants::{
    SUBTYPE_GENERIC, SUBTYPE_OLD_GENERIC, TAG_ARRAY, TAG_BINARY, TAG_BOOLEAN, TAG_DOUBLE,
    TAG_INT32, TAG_INT64, TAG_JS_CODE, TAG_NULL, TAG_STRING, TAG_TIMESTAMP, TAG_UTC_DATETIME,
};
use crate::error::{Error, Result};
use crate::num::number::{format_double, push_i64, push_u64};
use crate::text::string::escape_bytes_into;

/// Decode a binary document into JSON text.
///
/// The document is a 4-byte little-endian total length (covering itself),
/// the members of the root object, and a `0x00` terminator. A stack of
/// array frames tracks declared byte lengths against bytes consumed, both
/// to catch corruption and to know when to emit a closing bracket.
pub fn decode(bytes: &[u8]) -> Result<String> {
    let total = document_length(bytes)?;
    let mut cursor = Cursor { bytes, pos: 4 };
    let mut frames: SmallVec<[ArrayFrame; 16]> = SmallVec::new();
    let mut out = String::from("{");

    loop {
        if frames.is_empty() {
            if cursor.pos + 1 == total {
                if cursor.read_u8()? != 0 {
                    return Err(
                        Error::corrupt_length("document terminator missing").at_byte(total - 1)
                    );
                }
                break;
            }
            if cursor.pos + 1 > total {
                return Err(Error::corrupt_length(format!(
                    "content runs past the declared length {total}"
                ))
                .at_byte(cursor.pos));
            }
        }

        match frames.last() {
            Some(frame) if frame.consumed > frame.declared => {
                return Err(Error::corrupt_length(format!(
                    "array consumed {} of {} declared bytes",
                    frame.consumed, frame.declared
                ))
                .at_byte(cursor.pos));
            }
            Some(frame) if frame.consumed + 1 == frame.declared => {
                if cursor.read_u8()? != 0 {
                    return Err(
                        Error::corrupt_length("array terminator missing").at_byte(cursor.pos - 1)
                    );
                }
                let declared = frame.declared;
                trim_separator(&mut out);
                out.push(']');
                frames.pop();
                if let Some(parent) = frames.last_mut() {
                    parent.consumed += declared;
                }
                out.push_str(", ");
                continue;
            }
            _ => {}
        }

        let tag = cursor.read_u8()?;

        // Array elements carry a 2-byte integer index instead of a key;
        // it is read and discarded.
        if let Some(frame) = frames.last_mut() {
            cursor.read_bytes(2)?;
            frame.consumed += 3;
        } else {
            let key = cursor.read_cstring()?;
            out.push('"');
            escape_bytes_into(&mut out, key)?;
            out.push_str("\": ");
        }

        match tag {
            TAG_NULL => {
                out.push_str("null");
            }
            TAG_BOOLEAN => {
                let value = cursor.read_u8()?;
                out.push_str(if value != 0 { "true" } else { "false" });
                consume(&mut frames, 1);
            }
            TAG_INT32 => {
                let value = i32::from_le_bytes(cursor.read_array::<4>()?);
                push_i64(&mut out, i64::from(value));
                consume(&mut frames, 4);
            }
            TAG_TIMESTAMP => {
                let value = u64::from_le_bytes(cursor.read_array::<8>()?);
                push_u64(&mut out, value);
                consume(&mut frames, 8);
            }
            TAG_UTC_DATETIME | TAG_INT64 => {
                let value = i64::from_le_bytes(cursor.read_array::<8>()?);
                push_i64(&mut out, value);
                consume(&mut frames, 8);
            }
            TAG_DOUBLE => {
                let value = f64::from_le_bytes(cursor.read_array::<8>()?);
                out.push_str(&format_double(value));
                consume(&mut frames, 8);
            }
            TAG_STRING | TAG_JS_CODE => {
                let declared = cursor.read_length()?;
                if declared == 0 {
                    return Err(
                        Error::corrupt_length("string length must be positive")
                            .at_byte(cursor.pos - 4),
                    );
                }
                let payload = cursor.read_bytes(declared)?;
                let Some((0, content)) = payload.split_last() else {
                    return Err(
                        Error::corrupt_length("string payload is not NUL-terminated")
                            .at_byte(cursor.pos - 1),
                    );
                };
                out.push('"');
                escape_bytes_into(&mut out, content)?;
                out.push('"');
                consume(&mut frames, 4 + declared as i32);
            }
            TAG_ARRAY => {
                let declared = cursor.read_length()?;
                if declared < 5 {
                    return Err(Error::corrupt_length(format!(
                        "array length {declared} cannot hold its prefix and terminator"
                    ))
                    .at_byte(cursor.pos - 4));
                }
                frames.push(ArrayFrame {
                    declared: declared as i32,
                    consumed: 4,
                });
                out.push('[');
                continue;
            }
            TAG_BINARY => {
                let declared = cursor.read_length()?;
                let subtype = cursor.read_u8()?;
                match subtype {
                    SUBTYPE_GENERIC | SUBTYPE_OLD_GENERIC => {}
                    other => return Err(Error::unsupported_type(other).at_byte(cursor.pos - 1)),
                }
                let payload = cursor.read_bytes(declared)?;
                out.push('[');
                for (index, byte) in payload.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    push_u64(&mut out, u64::from(*byte));
                }
                out.push(']');
                consume(&mut frames, 4 + 1 + declared as i32);
            }
            other => {
                return Err(Error::unsupported_type(other).at_byte(cursor.pos - 1));
            }
        }

        out.push_str(", ");
    }

    trim_separator(&mut out);
    out.push('}');
    Ok(out)
}

struct ArrayFrame {
    declared: i32,
    consumed: i32,
}

fn consume(frames: &mut SmallVec<[ArrayFrame; 16]>, count: i32) {
    if let Some(frame) = frames.last_mut() {
        frame.consumed += count;
    }
}

fn trim_separator(out: &mut String) {
    if out.ends_with(", ") {
        out.truncate(out.len() - 2);
    }
}

fn document_length(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < 5 {
        return Err(Error::corrupt_length(
            "document is shorter than its length prefix and terminator",
        ));
    }
    let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if declared < 5 {
        return Err(Error::corrupt_length(format!(
            "declared document length {declared} is invalid"
        )));
    }
    let declared = declared as usize;
    if declared > bytes.len() {
        return Err(Error::corrupt_length(format!(
            "declared document length {declared} exceeds the buffer ({} bytes)",
            bytes.len()
        )));
    }
    Ok(declared)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn read_u8(&mut self) -> Result<u8> {
        let Some(&byte) = self.bytes.get(self.pos) else {
            return Err(Error::corrupt_length("read past end of buffer").at_byte(self.pos));
        };
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let Some(slice) = self.bytes.get(self.pos..self.pos + count) else {
            return Err(Error::corrupt_length("read past end of buffer").at_byte(self.pos));
        };
        self.pos += count;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.read_bytes(N)?;
        Ok(slice.try_into().expect("slice length checked"))
    }

    /// A 4-byte little-endian length field; negative values are corrupt.
    fn read_length(&mut self) -> Result<usize> {
        let start = self.pos;
        let value = i32::from_le_bytes(self.read_array::<4>()?);
        if value < 0 {
            return Err(
                Error::corrupt_length(format!("length {value} is negative")).at_byte(start),
            );
        }
        Ok(value as usize)
    }

    fn read_cstring(&mut self) -> Result<&'a [u8]> {
        let rest = &self.bytes[self.pos..];
        let Some(end) = memchr(0, rest) else {
            return Err(Error::corrupt_length("unterminated key").at_byte(self.pos));
        };
        let key = &rest[..end];
        self.pos += end + 1;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn doc(content: &[u8]) -> Vec<u8> {
        let total = (content.len() + 5) as i32;
        let mut bytes = total.to_le_bytes().to_vec();
        bytes.extend_from_slice(content);
        bytes.push(0);
        bytes
    }

    #[rstest::rstest]
    fn test_empty_document() {
        assert_eq!(decode(&doc(&[])).unwrap(), "{}");
    }

    #[rstest::rstest]
    fn test_scalar_members() {
        let mut content = vec![];
        content.extend_from_slice(&[TAG_INT32]);
        content.extend_from_slice(b"a\0");
        content.extend_from_slice(&7i32.to_le_bytes());
        content.extend_from_slice(&[TAG_BOOLEAN]);
        content.extend_from_slice(b"b\0");
        content.push(1);
        content.extend_from_slice(&[TAG_NULL]);
        content.extend_from_slice(b"c\0");
        assert_eq!(
            decode(&doc(&content)).unwrap(),
            r#"{"a": 7, "b": true, "c": null}"#
        );
    }

    #[rstest::rstest]
    fn test_string_member() {
        let mut content = vec![TAG_STRING];
        content.extend_from_slice(b"s\0");
        content.extend_from_slice(&6i32.to_le_bytes());
        content.extend_from_slice(b"hello\0");
        assert_eq!(decode(&doc(&content)).unwrap(), r#"{"s": "hello"}"#);
    }

    #[rstest::rstest]
    fn test_js_code_renders_as_string() {
        let mut content = vec![TAG_JS_CODE];
        content.extend_from_slice(b"f\0");
        content.extend_from_slice(&4i32.to_le_bytes());
        content.extend_from_slice(b"x=1\0");
        assert_eq!(decode(&doc(&content)).unwrap(), r#"{"f": "x=1"}"#);
    }

    #[rstest::rstest]
    fn test_int64_and_timestamp() {
        let mut content = vec![TAG_INT64];
        content.extend_from_slice(b"i\0");
        content.extend_from_slice(&(-5i64).to_le_bytes());
        content.push(TAG_TIMESTAMP);
        content.extend_from_slice(b"t\0");
        content.extend_from_slice(&u64::MAX.to_le_bytes());
        assert_eq!(
            decode(&doc(&content)).unwrap(),
            format!(r#"{{"i": -5, "t": {}}}"#, u64::MAX)
        );
    }

    #[rstest::rstest]
    fn test_double_renders_canonical() {
        let mut content = vec![TAG_DOUBLE];
        content.extend_from_slice(b"d\0");
        content.extend_from_slice(&1.5f64.to_le_bytes());
        assert_eq!(
            decode(&doc(&content)).unwrap(),
            r#"{"d": 1.500000000000000}"#
        );
    }

    #[rstest::rstest]
    fn test_array_member() {
        // [int32 7, bool true] with 2-byte integer element keys.
        let mut elements = vec![TAG_INT32];
        elements.extend_from_slice(&0u16.to_le_bytes());
        elements.extend_from_slice(&7i32.to_le_bytes());
        elements.push(TAG_BOOLEAN);
        elements.extend_from_slice(&1u16.to_le_bytes());
        elements.push(1);
        let declared = (4 + elements.len() + 1) as i32;

        let mut content = vec![TAG_ARRAY];
        content.extend_from_slice(b"a\0");
        content.extend_from_slice(&declared.to_le_bytes());
        content.extend_from_slice(&elements);
        content.push(0);
        assert_eq!(decode(&doc(&content)).unwrap(), r#"{"a": [7, true]}"#);
    }

    #[rstest::rstest]
    fn test_binary_data_renders_decimal_bytes() {
        let mut content = vec![TAG_BINARY];
        content.extend_from_slice(b"bin\0");
        content.extend_from_slice(&3i32.to_le_bytes());
        content.push(SUBTYPE_GENERIC);
        content.extend_from_slice(&[65, 0, 255]);
        assert_eq!(decode(&doc(&content)).unwrap(), r#"{"bin": [65, 0, 255]}"#);
    }

    #[rstest::rstest]
    fn test_unsupported_binary_subtype() {
        let mut content = vec![TAG_BINARY];
        content.extend_from_slice(b"bin\0");
        content.extend_from_slice(&1i32.to_le_bytes());
        content.push(0x80);
        content.push(0);
        let err = decode(&doc(&content)).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::UnsupportedBinaryType(0x80));
    }

    #[rstest::rstest]
    fn test_unknown_tag() {
        let mut content = vec![0x7f];
        content.extend_from_slice(b"x\0");
        let err = decode(&doc(&content)).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::UnsupportedBinaryType(0x7f));
    }

    #[rstest::rstest]
    fn test_negative_document_length() {
        let mut bytes = (-1i32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0, 0]);
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::CorruptLength(_)));
    }

    #[rstest::rstest]
    fn test_missing_terminator() {
        let mut bytes = decode_input_with_bad_terminator();
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::CorruptLength(_)));
        bytes.pop();
        assert!(decode(&bytes).is_err());
    }

    fn decode_input_with_bad_terminator() -> Vec<u8> {
        let mut bytes = doc(&[]);
        let last = bytes.len() - 1;
        bytes[last] = 0x55;
        bytes
    }

    #[rstest::rstest]
    fn test_truncated_payload() {
        let mut content = vec![TAG_INT32];
        content.extend_from_slice(b"a\0");
        content.extend_from_slice(&[1, 2]);
        let err = decode(&doc(&content)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::CorruptLength(_)));
    }

    #[rstest::rstest]
    fn test_invalid_utf8_key() {
        let mut content = vec![TAG_NULL];
        content.extend_from_slice(&[0xff, 0xfe, 0x00]);
        let err = decode(&doc(&content)).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::InvalidUtf8);
    }
}
