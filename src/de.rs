//! Token-stream deserialization into mapped objects and dynamic values.
//!
//! [`JsonDeserializer`] pulls tokens from a [`JsonReader`] and routes them
//! into targets three ways: dynamic [`JsonValue`] trees via
//! [`JsonDeserializer::read_value`], freshly constructed mapped types via
//! [`JsonDeserializer::deserialize_object`], and existing instances populated
//! in place via [`JsonDeserializer::populate`]. Comments in the stream are
//! skipped everywhere.
//!
//! Every entry point shares one contract: the reader is handed over with the
//! target value not yet consumed, so the next [`JsonReader::read`] yields the
//! value's first token.

use crate::convert::FromJsonValue;
use crate::mapping::{FromJsonObject, JsonBytes, JsonObject, MappingCache, MemberMapping};
use crate::reader::JsonReader;
use crate::settings::{
    JsonSettings, MissingMemberHandling, NullValueHandling, ObjectCreationHandling,
};
use crate::token::JsonToken;
use crate::value::{JsonValue, Number};
use crate::{Error, JsonMap, Result};
use chrono::{DateTime, FixedOffset, Utc};
use std::any::TypeId;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// A type readable from a token stream.
///
/// Implemented for scalars and collections here, and generated for mapped
/// structs by [`crate::json_mapped!`].
pub trait FromJson: Sized {
    fn from_json(de: &JsonDeserializer, reader: &mut JsonReader<'_>) -> Result<Self>;
}

/// Settings-driven deserializer.
///
/// ```rust
/// use jsontext::{JsonDeserializer, JsonReader, JsonValue};
///
/// let de = JsonDeserializer::new();
/// let mut reader = JsonReader::new(r#"{"a": [1, 2]}"#);
/// let value = de.read_value(&mut reader).unwrap();
/// assert!(value.is_object());
/// ```
pub struct JsonDeserializer {
    settings: JsonSettings,
    cache: Arc<MappingCache>,
}

impl Default for JsonDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonDeserializer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(JsonSettings::new())
    }

    #[must_use]
    pub fn with_settings(settings: JsonSettings) -> Self {
        JsonDeserializer {
            settings,
            cache: Arc::new(MappingCache::new()),
        }
    }

    /// Shares a mapping cache across deserializer instances.
    #[must_use]
    pub fn with_cache(settings: JsonSettings, cache: Arc<MappingCache>) -> Self {
        JsonDeserializer { settings, cache }
    }

    #[must_use]
    pub fn settings(&self) -> &JsonSettings {
        &self.settings
    }

    /// Reads one value of type `T` from the stream.
    pub fn deserialize<T: FromJson>(&self, reader: &mut JsonReader<'_>) -> Result<T> {
        T::from_json(self, reader)
    }

    /// Reads an object into a new instance of a mapped type.
    ///
    /// A registered converter claiming `T` takes over the whole read.
    /// Otherwise the type is either default-constructed and populated member
    /// by member, or, for constructor-bound types, buffered into a map that
    /// feeds [`FromJsonObject::construct_with`] with leftovers assigned as
    /// ordinary members.
    pub fn deserialize_object<T: FromJsonObject>(&self, reader: &mut JsonReader<'_>) -> Result<T> {
        if let Some(converter) = self.settings.converter_for(TypeId::of::<T>()) {
            let converter = Arc::clone(converter);
            let boxed = converter.read_json(self, reader)?;
            return boxed.downcast::<T>().map(|b| *b).map_err(|_| {
                Error::schema(
                    std::any::type_name::<T>(),
                    "converter produced a value of a different type",
                )
            });
        }

        match self.next_token(reader)? {
            JsonToken::StartObject => {}
            other => {
                return Err(Error::structural(format!(
                    "expected an object, found {}",
                    other.kind()
                )))
            }
        }

        match T::construct() {
            Some(mut obj) => {
                self.populate_members(reader, &mut obj)?;
                Ok(obj)
            }
            None => {
                let mut args = self.read_members(reader)?;
                let mut obj = T::construct_with(&mut args)?;
                let mapping = self.cache.mapping_for(&obj);
                for (name, value) in args {
                    self.assign_member(&mut obj, &mapping, &name, value)?;
                }
                Ok(obj)
            }
        }
    }

    /// Populates an existing object from the next object in the stream.
    pub fn populate(&self, reader: &mut JsonReader<'_>, obj: &mut dyn JsonObject) -> Result<()> {
        match self.next_token(reader)? {
            JsonToken::StartObject => self.populate_members(reader, obj),
            other => Err(Error::structural(format!(
                "expected an object, found {}",
                other.kind()
            ))),
        }
    }

    /// Appends the elements of the next array in the stream to `list`.
    pub fn populate_list<T: FromJsonValue>(
        &self,
        reader: &mut JsonReader<'_>,
        list: &mut Vec<T>,
    ) -> Result<()> {
        match self.next_token(reader)? {
            JsonToken::StartArray => {}
            other => {
                return Err(Error::structural(format!(
                    "expected an array, found {}",
                    other.kind()
                )))
            }
        }
        loop {
            let token = self.next_token(reader)?;
            if token == JsonToken::EndArray {
                return Ok(());
            }
            let value = self.value_from_token(reader, token)?;
            list.push(T::from_json_value(value)?);
        }
    }

    /// Reads the next value as a dynamic tree.
    pub fn read_value(&self, reader: &mut JsonReader<'_>) -> Result<JsonValue> {
        let token = self.next_token(reader)?;
        self.value_from_token(reader, token)
    }

    /// Skips the next value, including a whole container.
    pub fn skip_value(&self, reader: &mut JsonReader<'_>) -> Result<()> {
        let token = self.next_token(reader)?;
        if token.starts_container() {
            let mut depth = 1usize;
            while depth > 0 {
                let token = self.next_token(reader)?;
                if token.starts_container() {
                    depth += 1;
                } else if token.ends_container() {
                    depth -= 1;
                }
            }
        }
        Ok(())
    }

    /// Object members, with the opening `{` already consumed.
    fn populate_members(
        &self,
        reader: &mut JsonReader<'_>,
        obj: &mut dyn JsonObject,
    ) -> Result<()> {
        let mapping = self.cache.mapping_for(obj);
        loop {
            match self.next_token(reader)? {
                JsonToken::EndObject => return Ok(()),
                JsonToken::PropertyName(name) => {
                    let Some(member) = mapping.get(&name) else {
                        match self.settings.missing_member_handling {
                            MissingMemberHandling::Ignore => {
                                self.skip_value(reader)?;
                                continue;
                            }
                            MissingMemberHandling::Error => {
                                return Err(Error::missing_member(name, mapping.type_name()))
                            }
                        }
                    };
                    if !member.is_deserializable() {
                        self.skip_value(reader)?;
                        continue;
                    }
                    let token = self.next_token(reader)?;
                    if token == JsonToken::StartObject
                        && self.settings.object_creation_handling != ObjectCreationHandling::Replace
                    {
                        let reused = match obj.member_mut(&name) {
                            Some(nested) => {
                                self.populate_members(reader, nested)?;
                                true
                            }
                            None => false,
                        };
                        if reused {
                            continue;
                        }
                        let value = JsonValue::Object(self.read_members(reader)?);
                        self.maybe_assign(obj, &name, value)?;
                        continue;
                    }
                    let value = self.value_from_token(reader, token)?;
                    self.maybe_assign(obj, &name, value)?;
                }
                other => {
                    return Err(Error::structural(format!(
                        "unexpected {} inside an object",
                        other.kind()
                    )))
                }
            }
        }
    }

    fn maybe_assign(
        &self,
        obj: &mut dyn JsonObject,
        name: &str,
        value: JsonValue,
    ) -> Result<()> {
        if value.is_null_like() && self.settings.null_value_handling == NullValueHandling::Ignore {
            return Ok(());
        }
        obj.set_member(name, value)
    }

    fn assign_member(
        &self,
        obj: &mut dyn JsonObject,
        mapping: &MemberMapping,
        name: &str,
        value: JsonValue,
    ) -> Result<()> {
        match mapping.get(name) {
            None => match self.settings.missing_member_handling {
                MissingMemberHandling::Ignore => Ok(()),
                MissingMemberHandling::Error => {
                    Err(Error::missing_member(name, mapping.type_name()))
                }
            },
            Some(member) if !member.is_deserializable() => Ok(()),
            Some(_) => self.maybe_assign(obj, name, value),
        }
    }

    /// Buffers object members into a map, with the opening `{` consumed.
    fn read_members(&self, reader: &mut JsonReader<'_>) -> Result<JsonMap> {
        let mut map = JsonMap::new();
        loop {
            match self.next_token(reader)? {
                JsonToken::EndObject => return Ok(map),
                JsonToken::PropertyName(name) => {
                    let value = self.read_value(reader)?;
                    map.insert(name, value);
                }
                other => {
                    return Err(Error::structural(format!(
                        "unexpected {} inside an object",
                        other.kind()
                    )))
                }
            }
        }
    }

    fn value_from_token(
        &self,
        reader: &mut JsonReader<'_>,
        token: JsonToken,
    ) -> Result<JsonValue> {
        match token {
            JsonToken::Integer(i) => Ok(JsonValue::Number(Number::Integer(i))),
            JsonToken::Float(f) => Ok(JsonValue::Number(Number::Float(f))),
            JsonToken::String(s) => Ok(JsonValue::String(s)),
            JsonToken::Boolean(b) => Ok(JsonValue::Bool(b)),
            JsonToken::Null => Ok(JsonValue::Null),
            JsonToken::Undefined => Ok(JsonValue::Undefined),
            JsonToken::Date(d) => Ok(JsonValue::Date(d)),
            JsonToken::Bytes(b) => Ok(JsonValue::Bytes(b)),
            JsonToken::Raw(r) => Ok(JsonValue::String(r)),
            JsonToken::StartObject => self.read_members(reader).map(JsonValue::Object),
            JsonToken::StartArray => {
                let mut items = Vec::new();
                loop {
                    let token = self.next_token(reader)?;
                    if token == JsonToken::EndArray {
                        return Ok(JsonValue::Array(items));
                    }
                    items.push(self.value_from_token(reader, token)?);
                }
            }
            JsonToken::StartConstructor(name) => self.read_constructor(reader, &name),
            other => Err(Error::structural(format!(
                "unexpected {} where a value was expected",
                other.kind()
            ))),
        }
    }

    /// Only `Date` constructors are understood; they carry epoch milliseconds.
    fn read_constructor(&self, reader: &mut JsonReader<'_>, name: &str) -> Result<JsonValue> {
        if name != "Date" {
            return Err(Error::structural(format!(
                "unsupported constructor 'new {name}(...)'"
            )));
        }
        let mut millis: Option<i64> = None;
        loop {
            match self.next_token(reader)? {
                JsonToken::EndConstructor => break,
                JsonToken::Integer(i) if millis.is_none() => millis = Some(i),
                other => {
                    return Err(Error::structural(format!(
                        "unexpected {} in Date constructor",
                        other.kind()
                    )))
                }
            }
        }
        let millis =
            millis.ok_or_else(|| Error::structural("Date constructor requires one argument"))?;
        let utc = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| Error::structural("Date constructor argument is out of range"))?;
        Ok(JsonValue::Date(utc.fixed_offset()))
    }

    /// Next non-comment token; end of input is a fault here because every
    /// caller still expects part of a value.
    fn next_token(&self, reader: &mut JsonReader<'_>) -> Result<JsonToken> {
        loop {
            if !reader.read()? {
                return Err(Error::unexpected_eof(
                    reader.line(),
                    reader.column(),
                    "a value",
                ));
            }
            match reader.take_token() {
                Some(JsonToken::Comment(_)) | None => continue,
                Some(token) => return Ok(token),
            }
        }
    }
}

macro_rules! from_json_via_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromJson for $ty {
                fn from_json(de: &JsonDeserializer, reader: &mut JsonReader<'_>) -> Result<Self> {
                    de.read_value(reader).and_then(<$ty>::from_json_value)
                }
            }
        )+
    };
}

from_json_via_value! {
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64,
    String, JsonValue, JsonMap, JsonBytes,
    DateTime<FixedOffset>, DateTime<Utc>,
}

impl<T: FromJsonValue> FromJson for Option<T> {
    fn from_json(de: &JsonDeserializer, reader: &mut JsonReader<'_>) -> Result<Self> {
        de.read_value(reader).and_then(Option::<T>::from_json_value)
    }
}

impl<T: FromJsonValue> FromJson for Vec<T> {
    fn from_json(de: &JsonDeserializer, reader: &mut JsonReader<'_>) -> Result<Self> {
        de.read_value(reader).and_then(Vec::<T>::from_json_value)
    }
}

impl<K, V> FromJson for HashMap<K, V>
where
    K: FromJsonValue + Eq + Hash,
    V: FromJsonValue,
{
    fn from_json(de: &JsonDeserializer, reader: &mut JsonReader<'_>) -> Result<Self> {
        de.read_value(reader)
            .and_then(HashMap::<K, V>::from_json_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{Member, MemberView, ToMemberView};
    use std::any::Any;

    #[derive(Default, Debug, PartialEq)]
    struct Address {
        city: String,
        zip: String,
    }

    #[derive(Default, Debug, PartialEq)]
    struct Person {
        name: String,
        age: i64,
        address: Address,
    }

    impl JsonObject for Address {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn type_name(&self) -> &'static str {
            "Address"
        }

        fn build_mapping(&self) -> MemberMapping {
            let mut mapping = MemberMapping::new("Address");
            mapping.push(Member::new("city"));
            mapping.push(Member::new("zip"));
            mapping
        }

        fn member(&self, name: &str) -> Option<MemberView<'_>> {
            match name {
                "city" => Some(self.city.to_member_view()),
                "zip" => Some(self.zip.to_member_view()),
                _ => None,
            }
        }

        fn set_member(&mut self, name: &str, value: JsonValue) -> Result<()> {
            match name {
                "city" => {
                    self.city = String::from_json_value(value)?;
                    Ok(())
                }
                "zip" => {
                    self.zip = String::from_json_value(value)?;
                    Ok(())
                }
                _ => Err(Error::missing_member(name, "Address")),
            }
        }

        fn member_mut(&mut self, _name: &str) -> Option<&mut dyn JsonObject> {
            None
        }
    }

    impl FromJsonObject for Address {
        fn construct() -> Option<Self> {
            Some(Address::default())
        }
    }

    impl JsonObject for Person {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn type_name(&self) -> &'static str {
            "Person"
        }

        fn build_mapping(&self) -> MemberMapping {
            let mut mapping = MemberMapping::new("Person");
            mapping.push(Member::new("name"));
            mapping.push(Member::new("age"));
            mapping.push(Member::new("address"));
            mapping
        }

        fn member(&self, name: &str) -> Option<MemberView<'_>> {
            match name {
                "name" => Some(self.name.to_member_view()),
                "age" => Some(self.age.to_member_view()),
                "address" => Some(MemberView::Object(&self.address)),
                _ => None,
            }
        }

        fn set_member(&mut self, name: &str, value: JsonValue) -> Result<()> {
            match name {
                "name" => {
                    self.name = String::from_json_value(value)?;
                    Ok(())
                }
                "age" => {
                    self.age = i64::from_json_value(value)?;
                    Ok(())
                }
                "address" => {
                    let map = JsonMap::from_json_value(value)?;
                    let mut address = Address::default();
                    for (k, v) in map {
                        address.set_member(&k, v)?;
                    }
                    self.address = address;
                    Ok(())
                }
                _ => Err(Error::missing_member(name, "Person")),
            }
        }

        fn member_mut(&mut self, name: &str) -> Option<&mut dyn JsonObject> {
            match name {
                "address" => Some(&mut self.address),
                _ => None,
            }
        }
    }

    impl FromJsonObject for Person {
        fn construct() -> Option<Self> {
            Some(Person::default())
        }
    }

    // Constructor-bound type: no default construction.
    #[derive(Debug, PartialEq)]
    struct Interval {
        start: i64,
        end: i64,
        label: String,
    }

    impl JsonObject for Interval {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn type_name(&self) -> &'static str {
            "Interval"
        }

        fn build_mapping(&self) -> MemberMapping {
            let mut mapping = MemberMapping::new("Interval");
            mapping.push(Member::new("start"));
            mapping.push(Member::new("end"));
            mapping.push(Member::new("label"));
            mapping
        }

        fn member(&self, name: &str) -> Option<MemberView<'_>> {
            match name {
                "start" => Some(self.start.to_member_view()),
                "end" => Some(self.end.to_member_view()),
                "label" => Some(self.label.to_member_view()),
                _ => None,
            }
        }

        fn set_member(&mut self, name: &str, value: JsonValue) -> Result<()> {
            match name {
                "start" => {
                    self.start = i64::from_json_value(value)?;
                    Ok(())
                }
                "end" => {
                    self.end = i64::from_json_value(value)?;
                    Ok(())
                }
                "label" => {
                    self.label = String::from_json_value(value)?;
                    Ok(())
                }
                _ => Err(Error::missing_member(name, "Interval")),
            }
        }

        fn member_mut(&mut self, _name: &str) -> Option<&mut dyn JsonObject> {
            None
        }
    }

    impl FromJsonObject for Interval {
        fn construct() -> Option<Self> {
            None
        }

        fn construct_with(args: &mut JsonMap) -> Result<Self> {
            let start = i64::from_json_value(args.shift_remove("start").unwrap_or_default())?;
            let end = i64::from_json_value(args.shift_remove("end").unwrap_or_default())?;
            Ok(Interval {
                start,
                end,
                label: String::new(),
            })
        }
    }

    fn de_from(settings: JsonSettings) -> JsonDeserializer {
        JsonDeserializer::with_settings(settings)
    }

    #[test]
    fn deserializes_nested_objects() {
        let de = JsonDeserializer::new();
        let mut reader = JsonReader::new(
            r#"{"name": "Alice", "age": 30, "address": {"city": "Oslo", "zip": "0150"}}"#,
        );
        let person: Person = de.deserialize_object(&mut reader).expect("deserialize");
        assert_eq!(person.name, "Alice");
        assert_eq!(person.age, 30);
        assert_eq!(person.address.city, "Oslo");
    }

    #[test]
    fn unknown_members_ignored_by_default() {
        let de = JsonDeserializer::new();
        let mut reader =
            JsonReader::new(r#"{"name": "A", "extra": {"deep": [1, 2]}, "age": 5}"#);
        let person: Person = de.deserialize_object(&mut reader).expect("deserialize");
        assert_eq!(person.age, 5);
    }

    #[test]
    fn unknown_members_fault_when_strict() {
        let de = de_from(
            JsonSettings::new().with_missing_member_handling(MissingMemberHandling::Error),
        );
        let mut reader = JsonReader::new(r#"{"name": "A", "extra": 1}"#);
        match de.deserialize_object::<Person>(&mut reader) {
            Err(Error::MissingMember { member, type_name }) => {
                assert_eq!(member, "extra");
                assert_eq!(type_name, "Person");
            }
            other => panic!("expected missing member fault, got {other:?}"),
        }
    }

    #[test]
    fn null_handling_ignore_keeps_existing() {
        let de = de_from(JsonSettings::new().with_null_value_handling(NullValueHandling::Ignore));
        let mut person = Person {
            name: "keep".into(),
            ..Person::default()
        };
        let mut reader = JsonReader::new(r#"{"name": null, "age": 9}"#);
        de.populate(&mut reader, &mut person).expect("populate");
        assert_eq!(person.name, "keep");
        assert_eq!(person.age, 9);
    }

    #[test]
    fn nested_objects_populate_in_place() {
        let de = JsonDeserializer::new();
        let mut person = Person::default();
        person.address.city = "Bergen".into();
        person.address.zip = "5003".into();
        let mut reader = JsonReader::new(r#"{"address": {"zip": "5004"}}"#);
        de.populate(&mut reader, &mut person).expect("populate");
        // The member not named in the document survives.
        assert_eq!(person.address.city, "Bergen");
        assert_eq!(person.address.zip, "5004");
    }

    #[test]
    fn replace_handling_discards_existing_members() {
        let de = de_from(
            JsonSettings::new().with_object_creation_handling(ObjectCreationHandling::Replace),
        );
        let mut person = Person::default();
        person.address.city = "Bergen".into();
        let mut reader = JsonReader::new(r#"{"address": {"zip": "5004"}}"#);
        de.populate(&mut reader, &mut person).expect("populate");
        assert_eq!(person.address.city, "");
        assert_eq!(person.address.zip, "5004");
    }

    #[test]
    fn constructor_binding_consumes_args() {
        let de = JsonDeserializer::new();
        let mut reader = JsonReader::new(r#"{"start": 3, "label": "x", "end": 8}"#);
        let interval: Interval = de.deserialize_object(&mut reader).expect("deserialize");
        assert_eq!(
            interval,
            Interval {
                start: 3,
                end: 8,
                label: "x".into()
            }
        );
    }

    #[test]
    fn read_value_builds_dynamic_tree() {
        let de = JsonDeserializer::new();
        let mut reader = JsonReader::new(r#"{"a": [1, "two", {"b": null}], "c": true}"#);
        let value = de.read_value(&mut reader).expect("read");
        let obj = value.as_object().expect("object");
        let a = obj.get("a").and_then(JsonValue::as_array).expect("array");
        assert_eq!(a.len(), 3);
        assert_eq!(obj.get("c"), Some(&JsonValue::Bool(true)));
    }

    #[test]
    fn read_value_resolves_date_constructor() {
        let de = JsonDeserializer::new();
        let mut reader = JsonReader::new("new Date(1198908717056)");
        match de.read_value(&mut reader).expect("read") {
            JsonValue::Date(d) => assert_eq!(d.timestamp_millis(), 1_198_908_717_056),
            other => panic!("expected date, got {other:?}"),
        }
    }

    #[test]
    fn unknown_constructor_faults() {
        let de = JsonDeserializer::new();
        let mut reader = JsonReader::new("new Widget(1)");
        assert!(matches!(
            de.read_value(&mut reader),
            Err(Error::Structural(_))
        ));
    }

    #[test]
    fn comments_are_transparent() {
        let de = JsonDeserializer::new();
        let mut reader =
            JsonReader::new("// header\n{\"name\": /* inline */ \"A\", \"age\": 1}");
        let person: Person = de.deserialize_object(&mut reader).expect("deserialize");
        assert_eq!(person.name, "A");
    }

    #[test]
    fn populate_list_appends() {
        let de = JsonDeserializer::new();
        let mut list = vec![1i64];
        let mut reader = JsonReader::new("[2, 3]");
        de.populate_list(&mut reader, &mut list).expect("populate");
        assert_eq!(list, [1, 2, 3]);
    }

    #[test]
    fn scalar_from_json() {
        let de = JsonDeserializer::new();
        let mut reader = JsonReader::new("42");
        let n: i64 = de.deserialize(&mut reader).expect("deserialize");
        assert_eq!(n, 42);
    }

    #[test]
    fn truncated_object_faults() {
        let de = JsonDeserializer::new();
        let mut reader = JsonReader::new(r#"{"name": "A""#);
        assert!(de.deserialize_object::<Person>(&mut reader).is_err());
    }
}
