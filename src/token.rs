//! Token model shared by the reader and writer.
//!
//! [`JsonToken`] is the discriminated unit of JSON structure or value that the
//! reader produces and the writer consumes. [`ContainerKind`] identifies the
//! entries of the open-container stacks both state machines keep; the stack
//! length is always equal to the nesting depth.

use chrono::{DateTime, FixedOffset};

/// One atomic unit of JSON structure or value.
///
/// End-of-input is represented by the reader returning `false` from
/// [`crate::JsonReader::read`] rather than by a dedicated variant.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonToken {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// `new Name(` constructor scope (non-standard extension)
    StartConstructor(String),
    EndConstructor,
    PropertyName(String),
    /// `//` or `/* */` comment; surfaced as a token, never silently skipped
    Comment(String),
    /// Pre-rendered JSON text passed through verbatim
    Raw(String),
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Undefined,
    /// Decoded `\/Date(ms±HHMM)\/` literal
    Date(DateTime<FixedOffset>),
    Bytes(Vec<u8>),
}

impl JsonToken {
    /// Short kind name used in fault messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            JsonToken::StartObject => "StartObject",
            JsonToken::EndObject => "EndObject",
            JsonToken::StartArray => "StartArray",
            JsonToken::EndArray => "EndArray",
            JsonToken::StartConstructor(_) => "StartConstructor",
            JsonToken::EndConstructor => "EndConstructor",
            JsonToken::PropertyName(_) => "PropertyName",
            JsonToken::Comment(_) => "Comment",
            JsonToken::Raw(_) => "Raw",
            JsonToken::Integer(_) => "Integer",
            JsonToken::Float(_) => "Float",
            JsonToken::String(_) => "String",
            JsonToken::Boolean(_) => "Boolean",
            JsonToken::Null => "Null",
            JsonToken::Undefined => "Undefined",
            JsonToken::Date(_) => "Date",
            JsonToken::Bytes(_) => "Bytes",
        }
    }

    /// True for tokens that open a container scope.
    #[must_use]
    pub fn starts_container(&self) -> bool {
        matches!(
            self,
            JsonToken::StartObject | JsonToken::StartArray | JsonToken::StartConstructor(_)
        )
    }

    /// True for tokens that close a container scope.
    #[must_use]
    pub fn ends_container(&self) -> bool {
        matches!(
            self,
            JsonToken::EndObject | JsonToken::EndArray | JsonToken::EndConstructor
        )
    }
}

/// Kind of an open container scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    Object,
    Array,
    Constructor,
}

impl ContainerKind {
    /// The closing token matching this container, used by the generic end
    /// operation and auto-completion on close.
    #[must_use]
    pub fn end_token(self) -> JsonToken {
        match self {
            ContainerKind::Object => JsonToken::EndObject,
            ContainerKind::Array => JsonToken::EndArray,
            ContainerKind::Constructor => JsonToken::EndConstructor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_predicates() {
        assert!(JsonToken::StartArray.starts_container());
        assert!(JsonToken::StartConstructor("Date".into()).starts_container());
        assert!(JsonToken::EndObject.ends_container());
        assert!(!JsonToken::Null.starts_container());
        assert!(!JsonToken::PropertyName("a".into()).ends_container());
    }

    #[test]
    fn end_token_matches_kind() {
        assert_eq!(ContainerKind::Object.end_token(), JsonToken::EndObject);
        assert_eq!(ContainerKind::Array.end_token(), JsonToken::EndArray);
        assert_eq!(
            ContainerKind::Constructor.end_token(),
            JsonToken::EndConstructor
        );
    }
}
