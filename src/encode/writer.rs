use crate::constants::PRETTY_INDENT;
use crate::num::number::{format_double, push_i64, push_u64};
use crate::text::string::escape_into;
use crate::types::Token;

/// Render a token sequence to text. Compact mode is the plain
/// concatenation of every token's character form; pretty mode derives
/// layout from adjacent token pairs and a depth counter tracked alongside
/// the bracket tokens.
pub fn render(tokens: &[Token], pretty: bool) -> String {
    let mut writer = Writer::new(pretty);
    for token in tokens {
        writer.write(token);
    }
    writer.finish()
}

pub(crate) struct Writer {
    buffer: String,
    pretty: bool,
    depth: usize,
    previous: Option<Token>,
}

impl Writer {
    pub fn new(pretty: bool) -> Self {
        Self {
            buffer: String::new(),
            pretty,
            depth: 0,
            previous: None,
        }
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    pub fn write(&mut self, token: &Token) {
        if token.is_closer() {
            self.depth = self.depth.saturating_sub(1);
        }
        if self.pretty {
            self.write_separator(token);
        }
        self.write_token(token);
        if token.is_opener() {
            self.depth += 1;
        }
        self.previous = Some(token.clone());
    }

    /// Whitespace between the previous token and `token`:
    /// - a closer not directly after its opener sits on a new line at the
    ///   outer depth; directly after its opener the container collapses;
    /// - a colon is followed by one space;
    /// - a comma is followed by a new line at the current depth, except
    ///   before an opening bracket, which stays on the comma's line;
    /// - an opener is followed by a new line at the new depth.
    fn write_separator(&mut self, token: &Token) {
        let Some(previous) = self.previous.as_ref() else {
            return;
        };
        if token.is_closer() {
            if !previous.is_opener() {
                self.newline_indent();
            }
            return;
        }
        match previous {
            Token::Colon => self.buffer.push(' '),
            Token::Comma => {
                if token.is_opener() {
                    self.buffer.push(' ');
                } else {
                    self.newline_indent();
                }
            }
            prev if prev.is_opener() => self.newline_indent(),
            _ => {}
        }
    }

    fn newline_indent(&mut self) {
        self.buffer.push('\n');
        for _ in 0..self.depth * PRETTY_INDENT {
            self.buffer.push(' ');
        }
    }

    fn write_token(&mut self, token: &Token) {
        match token {
            Token::Null => self.buffer.push_str("null"),
            Token::Bool(true) => self.buffer.push_str("true"),
            Token::Bool(false) => self.buffer.push_str("false"),
            Token::Int32(n) => push_i64(&mut self.buffer, i64::from(*n)),
            Token::UInt32(n) => push_u64(&mut self.buffer, u64::from(*n)),
            Token::IntWide(n) | Token::Int64(n) => push_i64(&mut self.buffer, *n),
            Token::UIntWide(n) | Token::UInt64(n) => push_u64(&mut self.buffer, *n),
            Token::Double(f) => self.buffer.push_str(&format_double(*f)),
            Token::Key(s) | Token::Str(s) => {
                self.buffer.push('"');
                escape_into(&mut self.buffer, s);
                self.buffer.push('"');
            }
            structural => {
                if let Some(ch) = structural.structural_char() {
                    self.buffer.push(ch);
                }
            }
        }
    }
}
