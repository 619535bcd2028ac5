//! Forward-only tokenizing JSON reader.
//!
//! [`JsonReader`] converts a character stream into a sequence of
//! [`JsonToken`]s, one per [`JsonReader::read`] call, tracking nesting depth
//! and line/column position. Beyond standard JSON it accepts the documented
//! extensions: single-quoted strings, bare property names, `//` and `/* */`
//! comments (surfaced as tokens), `NaN`/`Infinity`/`-Infinity` literals,
//! `undefined`, `new Name(...)` constructor scopes, and automatic recognition
//! of the legacy `\/Date(ms)\/` string form.
//!
//! ## Usage
//!
//! ```rust
//! use jsontext::{JsonReader, JsonToken};
//!
//! let mut reader = JsonReader::new(r#"{"name": "Alice", "age": 30}"#);
//! let mut kinds = Vec::new();
//! while reader.read().unwrap() {
//!     kinds.push(reader.take_token().unwrap().kind());
//! }
//! assert_eq!(
//!     kinds,
//!     ["StartObject", "PropertyName", "String", "PropertyName", "Integer", "EndObject"]
//! );
//! assert_eq!(reader.depth(), 0);
//! ```
//!
//! Any lexical or structural fault permanently poisons the reader; every
//! subsequent `read` fails. End of input yields `Ok(false)` without
//! validating container balance — callers check [`JsonReader::depth`].

use crate::date;
use crate::source::Source;
use crate::token::{ContainerKind, JsonToken};
use crate::{Error, Result};

/// Position of the reader within the token grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReadState {
    Start,
    Property,
    ObjectStart,
    Object,
    ArrayStart,
    Array,
    ConstructorStart,
    Constructor,
    PostValue,
    Finished,
    Error,
}

enum PostValueStep {
    Token(JsonToken),
    Continue,
    End,
}

/// Streaming JSON token reader over a borrowed string slice.
///
/// Single-owner and forward-only; create one instance per document and per
/// thread. Use [`crate::from_reader`] to drain an `io::Read` first.
pub struct JsonReader<'a> {
    source: Source<'a>,
    state: ReadState,
    stack: Vec<ContainerKind>,
    current: Option<JsonToken>,
}

impl<'a> JsonReader<'a> {
    pub fn new(input: &'a str) -> Self {
        JsonReader {
            source: Source::new(input),
            state: ReadState::Start,
            stack: Vec::new(),
            current: None,
        }
    }

    /// Reads the next token, returning `Ok(true)` when one is available via
    /// [`JsonReader::token`] and `Ok(false)` at end of input.
    ///
    /// `Ok(false)` is returned only from positions where no further token is
    /// syntactically required; input ending after an opener, a `:`, or a `,`
    /// is an [`Error::UnexpectedEof`] fault. Container balance at end of
    /// input is the caller's concern ([`JsonReader::depth`]).
    pub fn read(&mut self) -> Result<bool> {
        match self.read_step() {
            Ok(token) => {
                let produced = token.is_some();
                self.current = token;
                Ok(produced)
            }
            Err(err) => {
                self.state = ReadState::Error;
                self.current = None;
                Err(err)
            }
        }
    }

    /// The most recently read token.
    #[must_use]
    pub fn token(&self) -> Option<&JsonToken> {
        self.current.as_ref()
    }

    /// Takes ownership of the most recently read token.
    pub fn take_token(&mut self) -> Option<JsonToken> {
        self.current.take()
    }

    /// Number of currently open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// 1-based line of the next unconsumed character.
    #[must_use]
    pub fn line(&self) -> usize {
        self.source.line()
    }

    /// 1-based column of the next unconsumed character.
    #[must_use]
    pub fn column(&self) -> usize {
        self.source.column()
    }

    /// Unwinds all open containers and stops producing tokens.
    pub fn close(&mut self) {
        self.stack.clear();
        self.current = None;
        if self.state != ReadState::Error {
            self.state = ReadState::Finished;
        }
    }

    fn read_step(&mut self) -> Result<Option<JsonToken>> {
        loop {
            match self.state {
                ReadState::Error => {
                    return Err(Error::structural(
                        "reader is in a faulted state and cannot continue",
                    ))
                }
                ReadState::Start
                | ReadState::Property
                | ReadState::ArrayStart
                | ReadState::Array
                | ReadState::ConstructorStart
                | ReadState::Constructor => return self.parse_value(),
                ReadState::ObjectStart | ReadState::Object => {
                    return self.parse_property().map(Some)
                }
                ReadState::PostValue => match self.parse_post_value()? {
                    PostValueStep::Token(token) => return Ok(Some(token)),
                    PostValueStep::Continue => {}
                    PostValueStep::End => return Ok(None),
                },
                ReadState::Finished => return self.parse_finished(),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Option<JsonToken>> {
        self.skip_whitespace();
        let Some(ch) = self.source.peek() else {
            if self.stack.is_empty() {
                self.state = ReadState::Finished;
                return Ok(None);
            }
            return Err(self.eof_fault("a value"));
        };

        match ch {
            '"' | '\'' => {
                self.source.next();
                let text = self.parse_quoted(ch)?;
                self.set_post_value();
                // Date literal recognition is a compatibility behavior;
                // malformed candidates stay plain strings.
                match date::parse_legacy_date(&text) {
                    Some(parsed) => Ok(Some(JsonToken::Date(parsed))),
                    None => Ok(Some(JsonToken::String(text))),
                }
            }
            '{' => {
                self.source.next();
                self.stack.push(ContainerKind::Object);
                self.state = ReadState::ObjectStart;
                Ok(Some(JsonToken::StartObject))
            }
            '[' => {
                self.source.next();
                self.stack.push(ContainerKind::Array);
                self.state = ReadState::ArrayStart;
                Ok(Some(JsonToken::StartArray))
            }
            ']' if self.state == ReadState::ArrayStart => {
                self.source.next();
                self.pop_container(ContainerKind::Array)?;
                self.set_post_value();
                Ok(Some(JsonToken::EndArray))
            }
            ')' if self.state == ReadState::ConstructorStart => {
                self.source.next();
                self.pop_container(ContainerKind::Constructor)?;
                self.set_post_value();
                Ok(Some(JsonToken::EndConstructor))
            }
            '/' => self.parse_comment().map(Some),
            '-' if self.source.starts_with("-Infinity") => {
                self.parse_literal("-Infinity")?;
                self.set_post_value();
                Ok(Some(JsonToken::Float(f64::NEG_INFINITY)))
            }
            '-' | '.' | '0'..='9' => self.parse_number().map(Some),
            'I' => {
                self.parse_literal("Infinity")?;
                self.set_post_value();
                Ok(Some(JsonToken::Float(f64::INFINITY)))
            }
            'N' => {
                self.parse_literal("NaN")?;
                self.set_post_value();
                Ok(Some(JsonToken::Float(f64::NAN)))
            }
            't' => {
                self.parse_literal("true")?;
                self.set_post_value();
                Ok(Some(JsonToken::Boolean(true)))
            }
            'f' => {
                self.parse_literal("false")?;
                self.set_post_value();
                Ok(Some(JsonToken::Boolean(false)))
            }
            'u' => {
                self.parse_literal("undefined")?;
                self.set_post_value();
                Ok(Some(JsonToken::Undefined))
            }
            'n' => {
                if self.source.starts_with("new") {
                    self.parse_constructor().map(Some)
                } else {
                    self.parse_literal("null")?;
                    self.set_post_value();
                    Ok(Some(JsonToken::Null))
                }
            }
            other => Err(self.syntax_fault(format!(
                "unexpected character '{other}' while parsing value"
            ))),
        }
    }

    fn parse_property(&mut self) -> Result<JsonToken> {
        self.skip_whitespace();
        let Some(ch) = self.source.peek() else {
            return Err(self.eof_fault("a property name or '}'"));
        };

        match ch {
            '}' if self.state == ReadState::ObjectStart => {
                self.source.next();
                self.pop_container(ContainerKind::Object)?;
                self.set_post_value();
                Ok(JsonToken::EndObject)
            }
            '/' => self.parse_comment(),
            '"' | '\'' => {
                self.source.next();
                let name = self.parse_quoted(ch)?;
                self.expect_colon()?;
                self.state = ReadState::Property;
                Ok(JsonToken::PropertyName(name))
            }
            c if is_bare_name_char(c) => {
                let mut name = String::new();
                while let Some(c) = self.source.peek() {
                    if is_bare_name_char(c) {
                        name.push(c);
                        self.source.next();
                    } else {
                        break;
                    }
                }
                self.expect_colon()?;
                self.state = ReadState::Property;
                Ok(JsonToken::PropertyName(name))
            }
            other => Err(self.syntax_fault(format!(
                "unexpected character '{other}' while parsing property name"
            ))),
        }
    }

    fn parse_post_value(&mut self) -> Result<PostValueStep> {
        self.skip_whitespace();
        let Some(ch) = self.source.peek() else {
            // Balance is not validated at end of input.
            self.state = ReadState::PostValue;
            return Ok(PostValueStep::End);
        };

        match ch {
            '}' => {
                self.source.next();
                self.pop_container(ContainerKind::Object)?;
                self.set_post_value();
                Ok(PostValueStep::Token(JsonToken::EndObject))
            }
            ']' => {
                self.source.next();
                self.pop_container(ContainerKind::Array)?;
                self.set_post_value();
                Ok(PostValueStep::Token(JsonToken::EndArray))
            }
            ')' => {
                self.source.next();
                self.pop_container(ContainerKind::Constructor)?;
                self.set_post_value();
                Ok(PostValueStep::Token(JsonToken::EndConstructor))
            }
            ',' => {
                self.source.next();
                self.state = match self.stack.last() {
                    Some(ContainerKind::Object) => ReadState::Object,
                    Some(ContainerKind::Array) => ReadState::Array,
                    Some(ContainerKind::Constructor) => ReadState::Constructor,
                    None => return Err(self.syntax_fault("unexpected ',' outside any container")),
                };
                Ok(PostValueStep::Continue)
            }
            '/' => self.parse_comment().map(PostValueStep::Token),
            other => Err(self.syntax_fault(format!(
                "unexpected character '{other}' after a value"
            ))),
        }
    }

    fn parse_finished(&mut self) -> Result<Option<JsonToken>> {
        self.skip_whitespace();
        match self.source.peek() {
            None => Ok(None),
            Some('/') => self.parse_comment().map(Some),
            Some(other) => Err(self.syntax_fault(format!(
                "additional text '{other}' encountered after finished reading JSON content"
            ))),
        }
    }

    fn parse_constructor(&mut self) -> Result<JsonToken> {
        self.parse_literal("new")?;
        self.skip_whitespace();
        let mut name = String::new();
        while let Some(c) = self.source.peek() {
            if is_bare_name_char(c) {
                name.push(c);
                self.source.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.syntax_fault("expected a constructor name after 'new'"));
        }
        self.skip_whitespace();
        if !self.source.eat('(') {
            return Err(self.syntax_fault("expected '(' after constructor name"));
        }
        self.stack.push(ContainerKind::Constructor);
        self.state = ReadState::ConstructorStart;
        Ok(JsonToken::StartConstructor(name))
    }

    fn parse_number(&mut self) -> Result<JsonToken> {
        let (line, col) = (self.source.line(), self.source.column());
        let mut text = String::new();
        while let Some(c) = self.source.peek() {
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-') {
                text.push(c);
                self.source.next();
            } else {
                break;
            }
        }
        self.set_post_value();
        if text.contains(['.', 'e', 'E']) {
            match text.parse::<f64>() {
                Ok(f) => Ok(JsonToken::Float(f)),
                Err(_) => Err(Error::syntax(line, col, format!("invalid number '{text}'"))),
            }
        } else if let Ok(i) = text.parse::<i64>() {
            Ok(JsonToken::Integer(i))
        } else {
            // Integer literals past i64 range lose the integer kind.
            match text.parse::<f64>() {
                Ok(f) => Ok(JsonToken::Float(f)),
                Err(_) => Err(Error::syntax(line, col, format!("invalid number '{text}'"))),
            }
        }
    }

    fn parse_comment(&mut self) -> Result<JsonToken> {
        let (line, col) = (self.source.line(), self.source.column());
        self.source.next(); // leading '/'
        let mut text = String::new();
        match self.source.peek() {
            Some('/') => {
                self.source.next();
                while let Some(c) = self.source.peek() {
                    if c == '\n' {
                        break;
                    }
                    text.push(c);
                    self.source.next();
                }
                Ok(JsonToken::Comment(text))
            }
            Some('*') => {
                self.source.next();
                loop {
                    match self.source.next() {
                        None => {
                            return Err(Error::syntax(line, col, "unterminated block comment"))
                        }
                        Some('*') => {
                            if self.source.eat('/') {
                                return Ok(JsonToken::Comment(text));
                            }
                            text.push('*');
                        }
                        Some(c) => text.push(c),
                    }
                }
            }
            _ => Err(Error::syntax(line, col, "expected '//' or '/*' comment")),
        }
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String> {
        let (line, col) = (self.source.line(), self.source.column());
        let mut out = String::new();
        loop {
            match self.source.next() {
                None => {
                    return Err(Error::unexpected_eof(
                        line,
                        col,
                        format!("closing {quote} for string"),
                    ))
                }
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.parse_escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<()> {
        match self.source.next() {
            None => Err(self.eof_fault("an escape sequence")),
            Some('b') => {
                out.push('\u{0008}');
                Ok(())
            }
            Some('t') => {
                out.push('\t');
                Ok(())
            }
            Some('n') => {
                out.push('\n');
                Ok(())
            }
            Some('f') => {
                out.push('\u{000C}');
                Ok(())
            }
            Some('r') => {
                out.push('\r');
                Ok(())
            }
            Some('\\') => {
                out.push('\\');
                Ok(())
            }
            Some('/') => {
                out.push('/');
                Ok(())
            }
            Some('"') => {
                out.push('"');
                Ok(())
            }
            Some('\'') => {
                out.push('\'');
                Ok(())
            }
            Some('u') => self.parse_unicode_escape(out),
            Some(other) => Err(self.syntax_fault(format!("invalid escape sequence '\\{other}'"))),
        }
    }

    // UTF-16 escape decoding. Unpaired surrogate halves become U+FFFD, a
    // documented leniency rather than a fault.
    fn parse_unicode_escape(&mut self, out: &mut String) -> Result<()> {
        const REPLACEMENT: char = '\u{FFFD}';
        let mut unit = self.read_hex4()?;
        loop {
            if (0xD800..0xDC00).contains(&unit) {
                if self.source.starts_with("\\u") {
                    self.source.next();
                    self.source.next();
                    let next_unit = self.read_hex4()?;
                    if (0xDC00..0xE000).contains(&next_unit) {
                        let combined = 0x10000 + ((unit - 0xD800) << 10) + (next_unit - 0xDC00);
                        out.push(char::from_u32(combined).unwrap_or(REPLACEMENT));
                        return Ok(());
                    }
                    // The high half degrades; the unit that followed is
                    // reconsidered on its own.
                    out.push(REPLACEMENT);
                    unit = next_unit;
                    continue;
                }
                out.push(REPLACEMENT);
                return Ok(());
            }
            if (0xDC00..0xE000).contains(&unit) {
                out.push(REPLACEMENT);
                return Ok(());
            }
            out.push(char::from_u32(unit).unwrap_or(REPLACEMENT));
            return Ok(());
        }
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            match self.source.next() {
                Some(c) if c.is_ascii_hexdigit() => {
                    value = value * 16 + c.to_digit(16).unwrap_or(0);
                }
                Some(_) => {
                    return Err(
                        self.syntax_fault("invalid unicode escape, expected 4 hex digits")
                    )
                }
                None => return Err(self.eof_fault("4 hex digits")),
            }
        }
        Ok(value)
    }

    fn parse_literal(&mut self, word: &str) -> Result<()> {
        let (line, col) = (self.source.line(), self.source.column());
        for expected in word.chars() {
            match self.source.next() {
                Some(c) if c == expected => {}
                _ => {
                    return Err(Error::syntax(
                        line,
                        col,
                        format!("invalid literal, expected '{word}'"),
                    ))
                }
            }
        }
        if matches!(self.source.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            return Err(Error::syntax(
                line,
                col,
                format!("invalid literal, expected '{word}'"),
            ));
        }
        Ok(())
    }

    fn expect_colon(&mut self) -> Result<()> {
        self.skip_whitespace();
        match self.source.peek() {
            Some(':') => {
                self.source.next();
                Ok(())
            }
            Some(other) => Err(self.syntax_fault(format!(
                "expected ':' after property name, found '{other}'"
            ))),
            None => Err(self.eof_fault("':' after property name")),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.source.peek(), Some(c) if c.is_whitespace()) {
            self.source.next();
        }
    }

    fn set_post_value(&mut self) {
        self.state = if self.stack.is_empty() {
            ReadState::Finished
        } else {
            ReadState::PostValue
        };
    }

    fn pop_container(&mut self, expected: ContainerKind) -> Result<()> {
        match self.stack.pop() {
            Some(kind) if kind == expected => Ok(()),
            Some(kind) => Err(self.syntax_fault(format!(
                "closing token does not match open {kind:?} container"
            ))),
            None => Err(self.syntax_fault("closing token without an open container")),
        }
    }

    fn syntax_fault(&self, msg: impl Into<String>) -> Error {
        Error::syntax(self.source.line(), self.source.column(), msg)
    }

    fn eof_fault(&self, expected: impl Into<String>) -> Error {
        Error::unexpected_eof(self.source.line(), self.source.column(), expected)
    }
}

fn is_bare_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
