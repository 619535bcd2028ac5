//! Incremental JSON writer.
//!
//! [`JsonWriter`] appends tokens to an owned [`String`], validating every
//! write against a state-transition table so the output is always
//! syntactically well-formed. Separators, quoting, indentation, and escaping
//! are applied automatically from the active [`JsonSettings`].
//!
//! ## Usage
//!
//! ```rust
//! use jsontext::JsonWriter;
//!
//! let mut writer = JsonWriter::new();
//! writer.write_start_object().unwrap();
//! writer.write_property_name("name").unwrap();
//! writer.write_str("Alice").unwrap();
//! writer.write_property_name("age").unwrap();
//! writer.write_i64(30).unwrap();
//! writer.write_end_object().unwrap();
//! assert_eq!(writer.into_inner(), r#"{"name":"Alice","age":30}"#);
//! ```

use crate::date;
use crate::settings::{
    DateFormatHandling, FloatFormatHandling, Formatting, JsonSettings, StringEscapeHandling,
};
use crate::token::{ContainerKind, JsonToken};
use crate::value::{JsonValue, Number};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset};
use std::fmt::Write as _;

/// Position of the writer within the token grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriteState {
    Start,
    Property,
    ObjectStart,
    Object,
    ArrayStart,
    Array,
    ConstructorStart,
    Constructor,
    Closed,
    Error,
}

impl WriteState {
    fn index(self) -> usize {
        match self {
            WriteState::Start => 0,
            WriteState::Property => 1,
            WriteState::ObjectStart => 2,
            WriteState::Object => 3,
            WriteState::ArrayStart => 4,
            WriteState::Array => 5,
            WriteState::ConstructorStart => 6,
            WriteState::Constructor => 7,
            WriteState::Closed => 8,
            WriteState::Error => 9,
        }
    }
}

/// Class of an incoming token, the row index of [`LEGAL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenClass {
    StartObject,
    StartArray,
    StartConstructor,
    PropertyName,
    Value,
    Comment,
}

/// Whether a token class may be written in a given state. Columns follow the
/// order of [`WriteState`]: Start, Property, ObjectStart, Object, ArrayStart,
/// Array, ConstructorStart, Constructor, Closed, Error.
#[rustfmt::skip]
const LEGAL: [[bool; 10]; 6] = [
    // StartObject
    [true,  true,  false, false, true,  true,  true,  true,  false, false],
    // StartArray
    [true,  true,  false, false, true,  true,  true,  true,  false, false],
    // StartConstructor
    [true,  true,  false, false, true,  true,  true,  true,  false, false],
    // PropertyName
    [false, false, true,  true,  false, false, false, false, false, false],
    // Value
    [true,  true,  false, false, true,  true,  true,  true,  false, false],
    // Comment
    [true,  true,  true,  true,  true,  true,  true,  true,  false, false],
];

/// Incremental, validating JSON text writer.
///
/// Single-owner; buffers into an owned `String` retrieved with
/// [`JsonWriter::into_inner`].
pub struct JsonWriter {
    out: String,
    settings: JsonSettings,
    stack: Vec<ContainerKind>,
    state: WriteState,
    root_written: bool,
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(JsonSettings::new())
    }

    #[must_use]
    pub fn with_settings(settings: JsonSettings) -> Self {
        JsonWriter {
            out: String::new(),
            settings,
            stack: Vec::new(),
            state: WriteState::Start,
            root_written: false,
        }
    }

    /// Text produced so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Number of currently open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn settings(&self) -> &JsonSettings {
        &self.settings
    }

    /// Consumes the writer, returning the produced text.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.out
    }

    pub fn write_start_object(&mut self) -> Result<()> {
        self.auto_complete(TokenClass::StartObject)?;
        self.out.push('{');
        self.stack.push(ContainerKind::Object);
        self.state = WriteState::ObjectStart;
        Ok(())
    }

    pub fn write_start_array(&mut self) -> Result<()> {
        self.auto_complete(TokenClass::StartArray)?;
        self.out.push('[');
        self.stack.push(ContainerKind::Array);
        self.state = WriteState::ArrayStart;
        Ok(())
    }

    /// Opens a `new Name(` constructor scope. Constructor contents are always
    /// written inline, even under indented formatting.
    pub fn write_start_constructor(&mut self, name: &str) -> Result<()> {
        self.auto_complete(TokenClass::StartConstructor)?;
        self.out.push_str("new ");
        self.out.push_str(name);
        self.out.push('(');
        self.stack.push(ContainerKind::Constructor);
        self.state = WriteState::ConstructorStart;
        Ok(())
    }

    pub fn write_end_object(&mut self) -> Result<()> {
        self.write_close(ContainerKind::Object)
    }

    pub fn write_end_array(&mut self) -> Result<()> {
        self.write_close(ContainerKind::Array)
    }

    pub fn write_end_constructor(&mut self) -> Result<()> {
        self.write_close(ContainerKind::Constructor)
    }

    /// Closes whatever container is currently open.
    pub fn write_end(&mut self) -> Result<()> {
        match self.stack.last().copied() {
            Some(kind) => self.write_close(kind),
            None => Err(Error::structural("no container is open")),
        }
    }

    /// Writes a property name and its `:` separator. The name is always
    /// quoted and escaped, regardless of what the reader would accept.
    pub fn write_property_name(&mut self, name: &str) -> Result<()> {
        self.auto_complete(TokenClass::PropertyName)?;
        let quote = self.settings.quote_char;
        let handling = self.settings.string_escape_handling;
        self.out.push(quote);
        escape_into(&mut self.out, name, quote, handling);
        self.out.push(quote);
        self.out.push(':');
        if self.settings.formatting == Formatting::Indented {
            self.out.push(' ');
        }
        self.state = WriteState::Property;
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        self.out.push_str("null");
        self.post_value();
        Ok(())
    }

    pub fn write_undefined(&mut self) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        self.out.push_str("undefined");
        self.post_value();
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        self.out.push_str(if value { "true" } else { "false" });
        self.post_value();
        Ok(())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        let _ = write!(self.out, "{value}");
        self.post_value();
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        let _ = write!(self.out, "{value}");
        self.post_value();
        Ok(())
    }

    /// Writes a float. Finite values that would render without a fractional
    /// or exponent part gain a trailing `.0` so the kind survives a
    /// round trip; non-finite values follow
    /// [`JsonSettings::float_format_handling`].
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        if value.is_finite() {
            let mut text = value.to_string();
            if !text.contains(['.', 'e', 'E']) {
                text.push_str(".0");
            }
            self.out.push_str(&text);
        } else {
            let symbol = if value.is_nan() {
                "NaN"
            } else if value > 0.0 {
                "Infinity"
            } else {
                "-Infinity"
            };
            match self.settings.float_format_handling {
                FloatFormatHandling::Symbol => self.out.push_str(symbol),
                FloatFormatHandling::String => {
                    let quote = self.settings.quote_char;
                    self.out.push(quote);
                    self.out.push_str(symbol);
                    self.out.push(quote);
                }
                FloatFormatHandling::DefaultValue => self.out.push_str("null"),
            }
        }
        self.post_value();
        Ok(())
    }

    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        let quote = self.settings.quote_char;
        let handling = self.settings.string_escape_handling;
        self.out.push(quote);
        escape_into(&mut self.out, value, quote, handling);
        self.out.push(quote);
        self.post_value();
        Ok(())
    }

    /// Writes a timestamp per [`JsonSettings::date_format_handling`].
    pub fn write_date(&mut self, value: &DateTime<FixedOffset>) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        let quote = self.settings.quote_char;
        self.out.push(quote);
        match self.settings.date_format_handling {
            DateFormatHandling::IsoDateFormat => {
                self.out.push_str(&date::format_iso_date(value));
            }
            DateFormatHandling::MicrosoftDateFormat => {
                date::format_legacy_date(&mut self.out, value);
            }
        }
        self.out.push(quote);
        self.post_value();
        Ok(())
    }

    /// Writes binary data as a base64 string.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        let quote = self.settings.quote_char;
        self.out.push(quote);
        BASE64.encode_string(value, &mut self.out);
        self.out.push(quote);
        self.post_value();
        Ok(())
    }

    /// Writes a `/* */` comment. Comments take no comma separator and leave
    /// the grammar state untouched.
    pub fn write_comment(&mut self, text: &str) -> Result<()> {
        self.auto_complete(TokenClass::Comment)?;
        self.out.push_str("/*");
        self.out.push_str(text);
        self.out.push_str("*/");
        Ok(())
    }

    /// Appends text verbatim with no validation and no state change.
    pub fn write_raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Appends pre-rendered text in a value position. The text participates
    /// in separator and state bookkeeping but its content is trusted.
    pub fn write_raw_value(&mut self, text: &str) -> Result<()> {
        self.auto_complete(TokenClass::Value)?;
        self.out.push_str(text);
        self.post_value();
        Ok(())
    }

    /// Writes an entire [`JsonValue`] tree.
    pub fn write_value(&mut self, value: &JsonValue) -> Result<()> {
        match value {
            JsonValue::Null => self.write_null(),
            JsonValue::Undefined => self.write_undefined(),
            JsonValue::Bool(b) => self.write_bool(*b),
            JsonValue::Number(Number::Integer(i)) => self.write_i64(*i),
            JsonValue::Number(Number::Float(f)) => self.write_f64(*f),
            JsonValue::String(s) => self.write_str(s),
            JsonValue::Date(d) => self.write_date(d),
            JsonValue::Bytes(b) => self.write_bytes(b),
            JsonValue::Array(items) => {
                self.write_start_array()?;
                for item in items {
                    self.write_value(item)?;
                }
                self.write_end_array()
            }
            JsonValue::Object(map) => {
                self.write_start_object()?;
                for (name, member) in map {
                    self.write_property_name(name)?;
                    self.write_value(member)?;
                }
                self.write_end_object()
            }
        }
    }

    /// Replays a single reader token, for stream-to-stream copying.
    pub fn write_token(&mut self, token: &JsonToken) -> Result<()> {
        match token {
            JsonToken::StartObject => self.write_start_object(),
            JsonToken::EndObject => self.write_end_object(),
            JsonToken::StartArray => self.write_start_array(),
            JsonToken::EndArray => self.write_end_array(),
            JsonToken::StartConstructor(name) => self.write_start_constructor(name),
            JsonToken::EndConstructor => self.write_end_constructor(),
            JsonToken::PropertyName(name) => self.write_property_name(name),
            JsonToken::Comment(text) => self.write_comment(text),
            JsonToken::Raw(text) => self.write_raw_value(text),
            JsonToken::Integer(i) => self.write_i64(*i),
            JsonToken::Float(f) => self.write_f64(*f),
            JsonToken::String(s) => self.write_str(s),
            JsonToken::Boolean(b) => self.write_bool(*b),
            JsonToken::Null => self.write_null(),
            JsonToken::Undefined => self.write_undefined(),
            JsonToken::Date(d) => self.write_date(d),
            JsonToken::Bytes(b) => self.write_bytes(b),
        }
    }

    /// Completes every open container and stops accepting tokens. A dangling
    /// property name is completed with `null`.
    pub fn close(&mut self) -> Result<()> {
        if self.state == WriteState::Error {
            return Err(Error::structural("writer is in a faulted state"));
        }
        if self.state == WriteState::Property {
            self.write_null()?;
        }
        while !self.stack.is_empty() {
            self.write_end()?;
        }
        self.state = WriteState::Closed;
        Ok(())
    }

    fn write_close(&mut self, kind: ContainerKind) -> Result<()> {
        let legal = matches!(
            (kind, self.state),
            (ContainerKind::Object, WriteState::ObjectStart | WriteState::Object)
                | (ContainerKind::Array, WriteState::ArrayStart | WriteState::Array)
                | (
                    ContainerKind::Constructor,
                    WriteState::ConstructorStart | WriteState::Constructor
                )
        );
        if !legal || self.stack.last() != Some(&kind) {
            let state = self.state;
            self.state = WriteState::Error;
            return Err(Error::structural(format!(
                "cannot close {kind:?} in state {state:?}"
            )));
        }
        let had_content = matches!(self.state, WriteState::Object | WriteState::Array);
        self.stack.pop();
        if self.settings.formatting == Formatting::Indented && had_content {
            self.write_indent();
        }
        self.out.push(match kind {
            ContainerKind::Object => '}',
            ContainerKind::Array => ']',
            ContainerKind::Constructor => ')',
        });
        self.post_value();
        Ok(())
    }

    /// Validates the transition and emits any separator or indentation the
    /// incoming token needs.
    fn auto_complete(&mut self, class: TokenClass) -> Result<()> {
        if !LEGAL[class as usize][self.state.index()] {
            let state = self.state;
            self.state = WriteState::Error;
            return Err(Error::structural(format!(
                "token {class:?} in state {state:?} would produce invalid JSON"
            )));
        }
        let indented = self.settings.formatting == Formatting::Indented;
        match self.state {
            WriteState::Start => {
                if self.root_written && class != TokenClass::Comment {
                    // Roots need some separator so adjacent literals do not
                    // merge into one token.
                    self.out.push(if indented { '\n' } else { ' ' });
                }
            }
            WriteState::Property => {}
            WriteState::ObjectStart | WriteState::ArrayStart => {
                if indented {
                    self.write_indent();
                }
            }
            WriteState::Object | WriteState::Array => {
                if class != TokenClass::Comment {
                    self.out.push(',');
                }
                if indented {
                    self.write_indent();
                }
            }
            WriteState::ConstructorStart => {}
            WriteState::Constructor => {
                if class != TokenClass::Comment {
                    self.out.push(',');
                }
            }
            WriteState::Closed | WriteState::Error => {}
        }
        Ok(())
    }

    fn write_indent(&mut self) {
        self.out.push('\n');
        let width = self.stack.len() * self.settings.indent;
        for _ in 0..width {
            self.out.push(' ');
        }
    }

    fn post_value(&mut self) {
        self.state = match self.stack.last() {
            Some(ContainerKind::Object) => WriteState::Object,
            Some(ContainerKind::Array) => WriteState::Array,
            Some(ContainerKind::Constructor) => WriteState::Constructor,
            None => {
                self.root_written = true;
                WriteState::Start
            }
        };
    }
}

/// Escapes `text` into `out` per the always-escaped set plus the selected
/// [`StringEscapeHandling`] additions. The line separators U+0085, U+2028,
/// and U+2029 are always escaped because they break JavaScript string
/// literals.
fn escape_into(out: &mut String, text: &str, quote: char, handling: StringEscapeHandling) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{000C}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(quote);
            }
            c if (c as u32) < 0x20 || matches!(c, '\u{0085}' | '\u{2028}' | '\u{2029}') => {
                push_unicode_escape(out, c);
            }
            '<' | '>' | '&' | '\'' | '"' if handling == StringEscapeHandling::EscapeHtml => {
                push_unicode_escape(out, c);
            }
            c if handling == StringEscapeHandling::EscapeNonAscii && (c as u32) > 0x7E => {
                push_unicode_escape(out, c);
            }
            c => out.push(c),
        }
    }
}

/// `\uXXXX` escape, two units for characters outside the basic plane.
fn push_unicode_escape(out: &mut String, c: char) {
    let mut units = [0u16; 2];
    for unit in c.encode_utf16(&mut units) {
        let _ = write!(out, "\\u{unit:04x}");
    }
}

/// Chunk-resumable base64 encoder for writing large binary values
/// incrementally. Carries up to two pending bytes between chunks so the
/// produced text equals a one-shot encode of the concatenated input.
///
/// # Examples
///
/// ```rust
/// use jsontext::Base64Encoder;
///
/// let mut enc = Base64Encoder::new();
/// let mut out = String::new();
/// enc.encode_chunk(&mut out, b"hell");
/// enc.encode_chunk(&mut out, b"o world");
/// enc.finish(&mut out);
/// assert_eq!(out, "aGVsbG8gd29ybGQ=");
/// ```
#[derive(Debug, Default)]
pub struct Base64Encoder {
    carry: [u8; 2],
    carry_len: usize,
}

impl Base64Encoder {
    #[must_use]
    pub fn new() -> Self {
        Base64Encoder::default()
    }

    /// Encodes a chunk, emitting every complete 3-byte group.
    pub fn encode_chunk(&mut self, out: &mut String, mut bytes: &[u8]) {
        if self.carry_len > 0 {
            let need = 3 - self.carry_len;
            if bytes.len() < need {
                self.carry[self.carry_len..self.carry_len + bytes.len()].copy_from_slice(bytes);
                self.carry_len += bytes.len();
                return;
            }
            let mut triple = [0u8; 3];
            triple[..self.carry_len].copy_from_slice(&self.carry[..self.carry_len]);
            triple[self.carry_len..].copy_from_slice(&bytes[..need]);
            bytes = &bytes[need..];
            BASE64.encode_string(triple, out);
            self.carry_len = 0;
        }
        let whole = bytes.len() - bytes.len() % 3;
        if whole > 0 {
            BASE64.encode_string(&bytes[..whole], out);
        }
        let rest = &bytes[whole..];
        self.carry[..rest.len()].copy_from_slice(rest);
        self.carry_len = rest.len();
    }

    /// Emits the final padded group, if any bytes are pending.
    pub fn finish(&mut self, out: &mut String) {
        if self.carry_len > 0 {
            BASE64.encode_string(&self.carry[..self.carry_len], out);
            self.carry_len = 0;
        }
    }
}
