//! A streaming JSON engine: a forward-only tokenizing reader, an incremental
//! validating writer, and a settings-driven object-mapping layer on top.
//!
//! # Overview
//!
//! The crate is organized in two levels:
//!
//! - **Token streams.** [`JsonReader`] turns text into [`JsonToken`]s one call
//!   at a time; [`JsonWriter`] turns write calls into text, validating every
//!   transition. Both accept a tolerant superset of JSON: comments, single
//!   quotes, unquoted property names, `NaN`/`Infinity` literals, `undefined`,
//!   `new Name(...)` constructors, and legacy `\/Date(ms)\/` timestamps.
//! - **Object mapping.** [`JsonSerializer`] and [`JsonDeserializer`] connect
//!   token streams to Rust structs through the [`JsonObject`] reflection
//!   traits, applying the policies in [`JsonSettings`]: null/default
//!   suppression, missing-member strictness, populate-in-place, reference
//!   loop handling, and custom [`JsonConverter`]s.
//!
//! Structs opt in with the [`json_mapped!`] macro:
//!
//! ```rust
//! use jsontext::json_mapped;
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Movie {
//!     name: String,
//!     release_year: i64,
//! }
//!
//! json_mapped!(Movie {
//!     name => "Name",
//!     release_year => "ReleaseYear",
//! });
//!
//! let movie = Movie { name: "Bad Boys".into(), release_year: 1995 };
//! let text = jsontext::to_string(&movie).unwrap();
//! assert_eq!(text, r#"{"Name":"Bad Boys","ReleaseYear":1995}"#);
//!
//! let back: Movie = jsontext::from_str(&text).unwrap();
//! assert_eq!(back, movie);
//! ```
//!
//! Documents with no compile-time shape go through [`JsonValue`]:
//!
//! ```rust
//! use jsontext::json;
//!
//! let value = jsontext::value_from_str(r#"{name: 'quirky', /* legal */ n: NaN}"#).unwrap();
//! assert!(value.as_object().unwrap().get("name").is_some());
//!
//! let rendered = jsontext::value_to_string(&json!({"a": [1, 2]})).unwrap();
//! assert_eq!(rendered, r#"{"a":[1,2]}"#);
//! ```

pub mod convert;
pub mod date;
pub mod de;
pub mod error;
pub mod macros;
pub mod map;
pub mod mapping;
pub mod reader;
pub mod ser;
pub mod settings;
pub mod source;
pub mod token;
pub mod value;
pub mod writer;

pub use convert::{FromJsonValue, JsonConverter};
pub use de::{FromJson, JsonDeserializer};
pub use error::{Error, Result};
pub use map::JsonMap;
pub use mapping::{
    object_from_map, AsObjectMut, FromJsonObject, JsonBytes, JsonObject, MappingCache, Member,
    MemberMapping, MemberView, ToMemberView,
};
pub use reader::JsonReader;
pub use ser::JsonSerializer;
pub use settings::{
    DateFormatHandling, DefaultValueHandling, FloatFormatHandling, Formatting, JsonSettings,
    MetadataPropertyHandling, MissingMemberHandling, NullValueHandling, ObjectCreationHandling,
    PreserveReferencesHandling, ReferenceLoopHandling, StringEscapeHandling, TypeNameHandling,
};
pub use token::{ContainerKind, JsonToken};
pub use value::{JsonValue, Number};
pub use writer::{Base64Encoder, JsonWriter};

use std::io::Read;

/// Serializes a mapped object to compact JSON text.
///
/// # Examples
///
/// ```rust
/// use jsontext::json_mapped;
///
/// #[derive(Default)]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// json_mapped!(Point { x => "x", y => "y" });
///
/// let text = jsontext::to_string(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(text, r#"{"x":1,"y":2}"#);
/// ```
pub fn to_string(obj: &dyn JsonObject) -> Result<String> {
    to_string_with_settings(obj, JsonSettings::new())
}

/// Serializes a mapped object to indented JSON text.
pub fn to_string_pretty(obj: &dyn JsonObject) -> Result<String> {
    to_string_with_settings(obj, JsonSettings::pretty())
}

/// Serializes a mapped object with explicit settings.
pub fn to_string_with_settings(obj: &dyn JsonObject, settings: JsonSettings) -> Result<String> {
    let serializer = JsonSerializer::with_settings(settings.clone());
    let mut writer = JsonWriter::with_settings(settings);
    serializer.serialize(&mut writer, obj)?;
    Ok(writer.into_inner())
}

/// Renders a dynamic value tree to compact JSON text.
pub fn value_to_string(value: &JsonValue) -> Result<String> {
    let mut writer = JsonWriter::new();
    writer.write_value(value)?;
    Ok(writer.into_inner())
}

/// Renders a dynamic value tree to indented JSON text.
pub fn value_to_string_pretty(value: &JsonValue) -> Result<String> {
    let mut writer = JsonWriter::with_settings(JsonSettings::pretty());
    writer.write_value(value)?;
    Ok(writer.into_inner())
}

/// Deserializes a value of type `T` from JSON text.
///
/// # Examples
///
/// ```rust
/// let numbers: Vec<i64> = jsontext::from_str("[1, 2, 3]").unwrap();
/// assert_eq!(numbers, [1, 2, 3]);
/// ```
pub fn from_str<T: FromJson>(input: &str) -> Result<T> {
    from_str_with_settings(input, JsonSettings::new())
}

/// Deserializes with explicit settings.
pub fn from_str_with_settings<T: FromJson>(input: &str, settings: JsonSettings) -> Result<T> {
    let de = JsonDeserializer::with_settings(settings);
    let mut reader = JsonReader::new(input);
    de.deserialize(&mut reader)
}

/// Deserializes from any [`Read`] source by draining it first.
pub fn from_reader<T: FromJson, R: Read>(mut source: R) -> Result<T> {
    let mut input = String::new();
    source
        .read_to_string(&mut input)
        .map_err(|e| Error::io(e.to_string()))?;
    from_str(&input)
}

/// Parses JSON text into a dynamic value tree.
pub fn value_from_str(input: &str) -> Result<JsonValue> {
    let de = JsonDeserializer::new();
    let mut reader = JsonReader::new(input);
    de.read_value(&mut reader)
}

/// Populates an existing mapped object from JSON text, leaving members the
/// document does not name untouched.
pub fn populate(input: &str, obj: &mut dyn JsonObject) -> Result<()> {
    populate_with_settings(input, obj, JsonSettings::new())
}

/// Populates with explicit settings.
pub fn populate_with_settings(
    input: &str,
    obj: &mut dyn JsonObject,
    settings: JsonSettings,
) -> Result<()> {
    let de = JsonDeserializer::with_settings(settings);
    let mut reader = JsonReader::new(input);
    de.populate(&mut reader, obj)
}
