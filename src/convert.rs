//! Conversions from dynamic [`JsonValue`]s into concrete member types, and
//! the custom-converter extension point.
//!
//! [`FromJsonValue`] is the narrowing step the deserializer applies when
//! assigning a scalar to a typed field: wire kinds are coerced where the
//! conversion is lossless (an integral float to an integer, a numeric string
//! to a number, a base64 string to bytes) and faulted otherwise, naming both
//! kinds in the error.

use crate::mapping::JsonBytes;
use crate::value::{JsonValue, Number};
use crate::{Error, JsonMap, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, Utc};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;

/// A type constructible from a dynamic JSON value.
pub trait FromJsonValue: Sized {
    fn from_json_value(value: JsonValue) -> Result<Self>;
}

macro_rules! int_from_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromJsonValue for $ty {
                fn from_json_value(value: JsonValue) -> Result<Self> {
                    let target = stringify!($ty);
                    match value {
                        JsonValue::Number(Number::Integer(i)) => {
                            <$ty>::try_from(i).map_err(|_| Error::conversion("integer", target))
                        }
                        JsonValue::Number(Number::Float(f)) => {
                            // Only integral floats inside the target range
                            // narrow without loss.
                            if f.fract() == 0.0
                                && f >= <$ty>::MIN as f64
                                && f <= <$ty>::MAX as f64
                            {
                                Ok(f as $ty)
                            } else {
                                Err(Error::conversion("float", target))
                            }
                        }
                        JsonValue::String(s) => {
                            s.parse().map_err(|_| Error::conversion("string", target))
                        }
                        other => Err(Error::conversion(other.kind(), target)),
                    }
                }
            }
        )+
    };
}

int_from_value!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromJsonValue for f64 {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Number(n) => Ok(n.as_f64()),
            JsonValue::String(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other.parse().map_err(|_| Error::conversion("string", "f64")),
            },
            other => Err(Error::conversion(other.kind(), "f64")),
        }
    }
}

impl FromJsonValue for f32 {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        f64::from_json_value(value).map(|f| f as f32)
    }
}

impl FromJsonValue for bool {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Bool(b) => Ok(b),
            JsonValue::String(s) => match s.as_str() {
                "true" | "True" => Ok(true),
                "false" | "False" => Ok(false),
                _ => Err(Error::conversion("string", "bool")),
            },
            other => Err(Error::conversion(other.kind(), "bool")),
        }
    }
}

impl FromJsonValue for String {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::String(s) => Ok(s),
            JsonValue::Number(n) => Ok(n.to_string()),
            JsonValue::Bool(b) => Ok(b.to_string()),
            JsonValue::Date(d) => Ok(crate::date::format_iso_date(&d)),
            other => Err(Error::conversion(other.kind(), "String")),
        }
    }
}

impl FromJsonValue for DateTime<FixedOffset> {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Date(d) => Ok(d),
            JsonValue::String(s) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .or_else(|| crate::date::parse_legacy_date(&s))
                .ok_or_else(|| Error::conversion("string", "DateTime")),
            other => Err(Error::conversion(other.kind(), "DateTime")),
        }
    }
}

impl FromJsonValue for DateTime<Utc> {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        DateTime::<FixedOffset>::from_json_value(value).map(|d| d.with_timezone(&Utc))
    }
}

impl FromJsonValue for JsonBytes {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Bytes(b) => Ok(JsonBytes(b)),
            JsonValue::String(s) => BASE64
                .decode(s.as_bytes())
                .map(JsonBytes)
                .map_err(|_| Error::conversion("string", "bytes")),
            other => Err(Error::conversion(other.kind(), "bytes")),
        }
    }
}

impl<T: FromJsonValue> FromJsonValue for Option<T> {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        if value.is_null_like() {
            Ok(None)
        } else {
            T::from_json_value(value).map(Some)
        }
    }
}

impl<T: FromJsonValue> FromJsonValue for Vec<T> {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Array(items) => items.into_iter().map(T::from_json_value).collect(),
            other => Err(Error::conversion(other.kind(), "array")),
        }
    }
}

impl<K, V> FromJsonValue for HashMap<K, V>
where
    K: FromJsonValue + Eq + Hash,
    V: FromJsonValue,
{
    fn from_json_value(value: JsonValue) -> Result<Self> {
        match value {
            // Property names convert into the key type the same way any
            // string value would, so numeric keys parse from their text.
            JsonValue::Object(map) => map
                .into_iter()
                .map(|(k, v)| {
                    let key = K::from_json_value(JsonValue::String(k))?;
                    Ok((key, V::from_json_value(v)?))
                })
                .collect(),
            other => Err(Error::conversion(other.kind(), "object")),
        }
    }
}

impl FromJsonValue for JsonMap {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(map),
            other => Err(Error::conversion(other.kind(), "object")),
        }
    }
}

impl FromJsonValue for JsonValue {
    fn from_json_value(value: JsonValue) -> Result<Self> {
        Ok(value)
    }
}

/// Takes over (de)serialization of the concrete types it claims.
///
/// Converters registered on [`crate::JsonSettings`] are consulted before the
/// member mapping in both directions; the first converter whose
/// [`JsonConverter::handles`] accepts the target's [`TypeId`] wins.
pub trait JsonConverter: Send + Sync {
    /// Whether this converter claims the given concrete type.
    fn handles(&self, type_id: TypeId) -> bool;

    /// Writes `value`, which is of a claimed type, to `writer`.
    fn write_json(&self, writer: &mut crate::JsonWriter, value: &dyn Any) -> Result<()>;

    /// Reads a value of a claimed type. The reader is positioned at the
    /// value's first token; the implementation must consume exactly the
    /// value's tokens.
    fn read_json(
        &self,
        de: &crate::JsonDeserializer,
        reader: &mut crate::JsonReader<'_>,
    ) -> Result<Box<dyn Any>>;
}
