use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("input is empty")]
    EmptyInput,
    #[error("malformed literal: {0}")]
    MalformedLiteral(String),
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("unsupported binary type {0:#04x}")]
    UnsupportedBinaryType(u8),
    #[error("corrupt length: {0}")]
    CorruptLength(String),
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Byte(usize),
    Token(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    position: Option<Position>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    pub fn at_byte(mut self, offset: usize) -> Self {
        self.position = Some(Position::Byte(offset));
        self
    }

    pub fn at_token(mut self, index: usize) -> Self {
        self.position = Some(Position::Token(index));
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub(crate) fn empty_input() -> Self {
        Self::new(ErrorKind::EmptyInput)
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedLiteral(message.into()))
    }

    pub(crate) fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedToken(message.into()))
    }

    pub(crate) fn invalid_utf8() -> Self {
        Self::new(ErrorKind::InvalidUtf8)
    }

    pub(crate) fn unsupported_type(tag: u8) -> Self {
        Self::new(ErrorKind::UnsupportedBinaryType(tag))
    }

    pub(crate) fn corrupt_length(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CorruptLength(message.into()))
    }

    pub(crate) fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, found })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(Position::Byte(offset)) => write!(f, "{} at byte {offset}", self.kind),
            Some(Position::Token(index)) => write!(f, "{} at token {index}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
