use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::types::{Token, Value};

/// Reconstruct a value tree from a token sequence.
///
/// The grammar is enforced with explicit allow-lists per position; any
/// token outside the allowed set fails the whole conversion with the
/// offending token index attached. Exactly one root (object or array)
/// must remain when the tokens run out.
pub fn build(tokens: &[Token]) -> Result<Value> {
    if tokens.is_empty() {
        return Err(Error::empty_input());
    }
    if !tokens[0].is_opener() {
        return Err(Error::unexpected(format!(
            "expected `{{` or `[` at document start, found {}",
            tokens[0].describe()
        ))
        .at_token(0));
    }

    let mut builder = Builder {
        stack: SmallVec::new(),
        root: None,
    };
    for (index, token) in tokens.iter().enumerate() {
        builder
            .step(token)
            .map_err(|err| err.at_token(index))?;
    }
    match (builder.root, builder.stack.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(Error::unexpected("unexpected end of input").at_token(tokens.len())),
    }
}

enum Frame {
    Array {
        items: Vec<Value>,
        after_element: bool,
        after_comma: bool,
    },
    Object {
        members: BTreeMap<String, Value>,
        pending_key: Option<String>,
        has_colon: bool,
        after_member: bool,
        after_comma: bool,
    },
}

impl Frame {
    fn array() -> Self {
        Frame::Array {
            items: Vec::new(),
            after_element: false,
            after_comma: false,
        }
    }

    fn object() -> Self {
        Frame::Object {
            members: BTreeMap::new(),
            pending_key: None,
            has_colon: false,
            after_member: false,
            after_comma: false,
        }
    }
}

struct Builder {
    stack: SmallVec<[Frame; 16]>,
    root: Option<Value>,
}

impl Builder {
    fn step(&mut self, token: &Token) -> Result<()> {
        if self.root.is_some() {
            return Err(Error::unexpected("trailing content after document root"));
        }
        match token {
            Token::LeftBrace => {
                self.check_value_position(token)?;
                self.stack.push(Frame::object());
                Ok(())
            }
            Token::LeftBracket => {
                self.check_value_position(token)?;
                self.stack.push(Frame::array());
                Ok(())
            }
            Token::RightBrace => match self.stack.pop() {
                Some(Frame::Object {
                    members,
                    pending_key: None,
                    after_comma: false,
                    ..
                }) => self.complete(Value::Object(members)),
                _ => Err(Error::unexpected("`}` does not close an object member")),
            },
            Token::RightBracket => match self.stack.pop() {
                Some(Frame::Array {
                    items,
                    after_comma: false,
                    ..
                }) => self.complete(Value::Array(items)),
                _ => Err(Error::unexpected("`]` does not close an array element")),
            },
            Token::Colon => match self.stack.last_mut() {
                Some(Frame::Object {
                    pending_key: Some(_),
                    has_colon,
                    ..
                }) if !*has_colon => {
                    *has_colon = true;
                    Ok(())
                }
                _ => Err(Error::unexpected("`:` is only valid after a member name")),
            },
            Token::Comma => match self.stack.last_mut() {
                Some(Frame::Object {
                    after_member,
                    after_comma,
                    ..
                }) if *after_member => {
                    *after_member = false;
                    *after_comma = true;
                    Ok(())
                }
                Some(Frame::Array {
                    after_element,
                    after_comma,
                    ..
                }) if *after_element => {
                    *after_element = false;
                    *after_comma = true;
                    Ok(())
                }
                _ => Err(Error::unexpected("`,` without a preceding value")),
            },
            Token::Key(name) => match self.stack.last_mut() {
                Some(Frame::Object {
                    pending_key,
                    after_member: false,
                    after_comma,
                    ..
                }) if pending_key.is_none() => {
                    *pending_key = Some(name.to_string());
                    *after_comma = false;
                    Ok(())
                }
                _ => Err(Error::unexpected("member name outside an object")),
            },
            scalar => {
                let value = scalar_to_value(scalar)?;
                self.complete(value)
            }
        }
    }

    /// An opening bracket is only valid where a value may start.
    fn check_value_position(&self, token: &Token) -> Result<()> {
        match self.stack.last() {
            None => Ok(()),
            Some(Frame::Array {
                after_element: false,
                ..
            }) => Ok(()),
            Some(Frame::Object {
                pending_key: Some(_),
                has_colon: true,
                ..
            }) => Ok(()),
            _ => Err(Error::unexpected(format!(
                "{} is not valid here",
                token.describe()
            ))),
        }
    }

    /// Attach a finished value to the enclosing container, or record it as
    /// the document root when none remains.
    fn complete(&mut self, value: Value) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                if value.is_array() || value.is_object() {
                    self.root = Some(value);
                    Ok(())
                } else {
                    Err(Error::unexpected(format!(
                        "{} cannot be a document root",
                        value.type_name()
                    )))
                }
            }
            Some(Frame::Array {
                items,
                after_element,
                after_comma,
            }) => {
                if *after_element {
                    return Err(Error::unexpected("array elements must be comma-separated"));
                }
                items.push(value);
                *after_element = true;
                *after_comma = false;
                Ok(())
            }
            Some(Frame::Object {
                members,
                pending_key,
                has_colon,
                after_member,
                ..
            }) => {
                let Some(key) = pending_key.take() else {
                    return Err(Error::unexpected("object member is missing its name"));
                };
                if !*has_colon {
                    return Err(Error::unexpected("object member is missing `:`"));
                }
                members.insert(key, value);
                *has_colon = false;
                *after_member = true;
                Ok(())
            }
        }
    }
}

fn scalar_to_value(token: &Token) -> Result<Value> {
    Ok(match token {
        Token::Null => Value::Null,
        Token::Bool(b) => Value::Bool(*b),
        Token::Int32(n) => Value::Int32(*n),
        Token::UInt32(n) => Value::UInt32(*n),
        Token::IntWide(n) => Value::IntWide(*n),
        Token::UIntWide(n) => Value::UIntWide(*n),
        Token::Int64(n) => Value::Int64(*n),
        Token::UInt64(n) => Value::UInt64(*n),
        Token::Double(f) => Value::Double(*f),
        Token::Str(s) => Value::String(s.to_string()),
        other => {
            return Err(Error::unexpected(format!(
                "{} is not a value",
                other.describe()
            )));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::scanner::tokenize;
    use crate::error::ErrorKind;

    fn parse(input: &str) -> Result<Value> {
        build(&tokenize(input)?)
    }

    #[rstest::rstest]
    fn test_empty_tokens() {
        let err = build(&[]).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::EmptyInput);
    }

    #[rstest::rstest]
    fn test_root_must_be_bracketed() {
        assert!(parse("42").is_err());
        assert!(parse(r#""hello""#).is_err());
        assert!(parse("true").is_err());
    }

    #[rstest::rstest]
    fn test_empty_containers() {
        assert_eq!(parse("{}").unwrap(), Value::Object(BTreeMap::new()));
        assert_eq!(parse("[]").unwrap(), Value::Array(vec![]));
    }

    #[rstest::rstest]
    fn test_nested_document() {
        let value = parse(r#"{"a": [1, {"b": null}], "c": "x"}"#).unwrap();
        assert_eq!(value.get("c"), Some(&Value::String("x".into())));
        let items = value.get("a").unwrap().as_array().unwrap();
        assert_eq!(items[0], Value::UInt32(1));
        assert_eq!(items[1].get("b"), Some(&Value::Null));
    }

    #[rstest::rstest]
    fn test_missing_colon_is_rejected() {
        let err = parse(r#"{ "a" "b" }"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedToken(_)));
    }

    #[rstest::rstest]
    #[case(r#"{"a": 1,}"#)]
    #[case("[1,]")]
    #[case("[,1]")]
    #[case(r#"{"a":}"#)]
    #[case(r#"{"a" 1}"#)]
    #[case("[1 2]")]
    #[case(r#"{"a": 1 "b": 2}"#)]
    fn test_grammar_violations(#[case] input: &str) {
        let err = parse(input).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedToken(_)));
    }

    #[rstest::rstest]
    #[case("[1")]
    #[case(r#"{"a": 1"#)]
    fn test_unclosed_container(#[case] input: &str) {
        assert!(parse(input).is_err());
    }

    #[rstest::rstest]
    fn test_trailing_content() {
        assert!(parse("[] []").is_err());
        assert!(parse("{} 1").is_err());
    }

    #[rstest::rstest]
    fn test_duplicate_keys_keep_last() {
        let value = parse(r#"{"a": 1, "a": 2}"#).unwrap();
        assert_eq!(value.get("a"), Some(&Value::UInt32(2)));
        assert_eq!(value.len(), Some(1));
    }
}
