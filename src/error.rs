//! Error types for JSON reading, writing, and object mapping.
//!
//! Faults fall into a fixed taxonomy:
//!
//! - **Lexical faults** ([`Error::Syntax`], [`Error::UnexpectedEof`]): malformed
//!   token text; always carry line/column and permanently poison the reader.
//! - **Structural faults** ([`Error::Structural`]): a token sequence that the
//!   reader or writer transition table rejects.
//! - **Conversion faults** ([`Error::Conversion`]): a token value that cannot be
//!   coerced to the declared target type; names both sides.
//! - **Policy-governed faults** ([`Error::MissingMember`],
//!   [`Error::ReferenceLoop`]): severity selected by [`crate::JsonSettings`].
//! - **Schema faults** ([`Error::Schema`]): a target type with no usable
//!   construction path.
//!
//! Once a reader or writer has surfaced a fault it refuses further use; there
//! is no resynchronization.
//!
//! ## Examples
//!
//! ```rust
//! use jsontext::{JsonReader, Error};
//!
//! let mut reader = JsonReader::new("{\"a\": !}");
//! reader.read().unwrap(); // StartObject
//! reader.read().unwrap(); // PropertyName
//! let err = reader.read().unwrap_err();
//! assert!(matches!(err, Error::Syntax { .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// All faults that can occur while reading, writing, or mapping JSON.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO failure while draining a reader or flushing a sink
    #[error("IO error: {0}")]
    Io(String),

    /// Lexical fault with position information
    #[error("syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },

    /// Input ended where the grammar requires another token
    #[error("unexpected end of input at line {line}, column {col}: expected {expected}")]
    UnexpectedEof {
        line: usize,
        col: usize,
        expected: String,
    },

    /// Token sequence rejected by the reader or writer state table
    #[error("invalid token sequence: {0}")]
    Structural(String),

    /// A value that cannot be coerced to the declared target type
    #[error("cannot convert {from} to {to}")]
    Conversion { from: String, to: String },

    /// A property with no matching member, under `MissingMemberHandling::Error`
    #[error("could not find member '{member}' on type {type_name}")]
    MissingMember { member: String, type_name: String },

    /// A value reachable from itself, under `ReferenceLoopHandling::Error`
    #[error("self referencing loop detected while serializing {type_name}")]
    ReferenceLoop { type_name: String },

    /// A target type with no usable construction path
    #[error("unable to construct instance of {type_name}: {msg}")]
    Schema { type_name: String, msg: String },

    /// Generic message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Creates a lexical fault with line and column information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsontext::Error;
    ///
    /// let err = Error::syntax(10, 5, "unexpected character '!'");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: impl Into<String>) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.into(),
        }
    }

    /// Creates an unexpected end-of-input fault.
    pub fn unexpected_eof(line: usize, col: usize, expected: impl Into<String>) -> Self {
        Error::UnexpectedEof {
            line,
            col,
            expected: expected.into(),
        }
    }

    /// Creates a structural fault for an illegal token sequence.
    pub fn structural(msg: impl Into<String>) -> Self {
        Error::Structural(msg.into())
    }

    /// Creates a conversion fault naming source and target types.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsontext::Error;
    ///
    /// let err = Error::conversion("string", "u32");
    /// assert!(err.to_string().contains("cannot convert string to u32"));
    /// ```
    pub fn conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::Conversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a missing-member fault naming the offending property.
    pub fn missing_member(member: impl Into<String>, type_name: impl Into<String>) -> Self {
        Error::MissingMember {
            member: member.into(),
            type_name: type_name.into(),
        }
    }

    /// Creates a reference-loop fault for the named type.
    pub fn reference_loop(type_name: impl Into<String>) -> Self {
        Error::ReferenceLoop {
            type_name: type_name.into(),
        }
    }

    /// Creates a schema fault for a type with no usable construction path.
    pub fn schema(type_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Schema {
            type_name: type_name.into(),
            msg: msg.into(),
        }
    }

    /// Creates a generic error with a display message.
    pub fn message<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }

    /// Creates an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
