//! Object-graph serialization.
//!
//! [`JsonSerializer`] walks a [`JsonObject`] graph through its cached
//! [`crate::MemberMapping`] and drives a [`JsonWriter`], applying the
//! per-member policies from [`JsonSettings`]: null and default suppression,
//! member flags, registered converters, and reference-loop handling.
//!
//! Loop detection tracks the identity of every mapped object on the current
//! descent path. Reaching an object already on the path applies
//! [`crate::ReferenceLoopHandling`]; an object merely shared between two
//! sibling branches is not a loop and serializes twice.

use crate::mapping::{JsonObject, MappingCache, MemberView};
use crate::settings::{DefaultValueHandling, JsonSettings, NullValueHandling, ReferenceLoopHandling};
use crate::value::JsonValue;
use crate::writer::JsonWriter;
use crate::{Error, Result};
use std::sync::Arc;

enum LoopAction {
    Write,
    Skip,
}

/// Settings-driven serializer for mapped object graphs.
///
/// ```rust
/// use jsontext::{json_mapped, JsonSerializer, JsonWriter};
///
/// #[derive(Default)]
/// struct User {
///     name: String,
///     age: i64,
/// }
///
/// json_mapped!(User {
///     name => "name",
///     age => "age",
/// });
///
/// let user = User { name: "Alice".into(), age: 30 };
/// let serializer = JsonSerializer::new();
/// let mut writer = JsonWriter::new();
/// serializer.serialize(&mut writer, &user).unwrap();
/// assert_eq!(writer.into_inner(), r#"{"name":"Alice","age":30}"#);
/// ```
pub struct JsonSerializer {
    settings: JsonSettings,
    cache: Arc<MappingCache>,
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSerializer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(JsonSettings::new())
    }

    #[must_use]
    pub fn with_settings(settings: JsonSettings) -> Self {
        JsonSerializer {
            settings,
            cache: Arc::new(MappingCache::new()),
        }
    }

    /// Shares a mapping cache across serializer instances.
    #[must_use]
    pub fn with_cache(settings: JsonSettings, cache: Arc<MappingCache>) -> Self {
        JsonSerializer { settings, cache }
    }

    #[must_use]
    pub fn settings(&self) -> &JsonSettings {
        &self.settings
    }

    /// Serializes a mapped object graph into `writer`.
    pub fn serialize(&self, writer: &mut JsonWriter, obj: &dyn JsonObject) -> Result<()> {
        let mut scope = Vec::new();
        self.write_object(writer, obj, &mut scope)
    }

    /// Serializes a dynamic value tree into `writer`.
    pub fn serialize_value(&self, writer: &mut JsonWriter, value: &JsonValue) -> Result<()> {
        writer.write_value(value)
    }

    fn write_object(
        &self,
        writer: &mut JsonWriter,
        obj: &dyn JsonObject,
        scope: &mut Vec<*const ()>,
    ) -> Result<()> {
        if let Some(converter) = self.settings.converter_for(obj.as_any().type_id()) {
            return converter.write_json(writer, obj.as_any());
        }

        let identity = obj as *const dyn JsonObject as *const ();
        scope.push(identity);
        let mapping = self.cache.mapping_for(obj);

        writer.write_start_object()?;
        for member in mapping.members() {
            if !member.is_serializable() {
                continue;
            }
            let Some(view) = obj.member(member.name()) else {
                continue;
            };
            if view.is_null() && self.settings.null_value_handling == NullValueHandling::Ignore {
                continue;
            }
            if view.is_default()
                && self.settings.default_value_handling == DefaultValueHandling::Ignore
            {
                continue;
            }
            if let MemberView::Object(child) = &view {
                if let LoopAction::Skip = self.check_loop(*child, scope)? {
                    continue;
                }
            }
            writer.write_property_name(member.name())?;
            self.write_view(writer, view, scope)?;
        }
        writer.write_end_object()?;

        scope.pop();
        Ok(())
    }

    fn write_view(
        &self,
        writer: &mut JsonWriter,
        view: MemberView<'_>,
        scope: &mut Vec<*const ()>,
    ) -> Result<()> {
        match view {
            MemberView::Value(value) => writer.write_value(&value),
            MemberView::Object(child) => self.write_object(writer, child, scope),
            MemberView::Array(items) => {
                writer.write_start_array()?;
                for item in items {
                    if let MemberView::Object(child) = &item {
                        if let LoopAction::Skip = self.check_loop(*child, scope)? {
                            continue;
                        }
                    }
                    self.write_view(writer, item, scope)?;
                }
                writer.write_end_array()
            }
            MemberView::Map(entries) => {
                writer.write_start_object()?;
                for (name, item) in entries {
                    if let MemberView::Object(child) = &item {
                        if let LoopAction::Skip = self.check_loop(*child, scope)? {
                            continue;
                        }
                    }
                    writer.write_property_name(&name)?;
                    self.write_view(writer, item, scope)?;
                }
                writer.write_end_object()
            }
        }
    }

    /// Applies the loop policy when `child` is already on the descent path.
    fn check_loop(&self, child: &dyn JsonObject, scope: &[*const ()]) -> Result<LoopAction> {
        let identity = child as *const dyn JsonObject as *const ();
        if !scope.contains(&identity) {
            return Ok(LoopAction::Write);
        }
        match self.settings.reference_loop_handling {
            ReferenceLoopHandling::Error => Err(Error::reference_loop(child.type_name())),
            ReferenceLoopHandling::Ignore => Ok(LoopAction::Skip),
            ReferenceLoopHandling::Serialize => Ok(LoopAction::Write),
        }
    }
}
