//! Behavioral switches consumed by the engine and writer.
//!
//! [`JsonSettings`] bundles every enumerated option axis. It is constructed by
//! the caller, optionally via the builder methods, and read-only for the
//! duration of one (de)serialize call.
//!
//! ## Examples
//!
//! ```rust
//! use jsontext::{JsonSettings, Formatting, NullValueHandling};
//!
//! let settings = JsonSettings::new()
//!     .with_formatting(Formatting::Indented)
//!     .with_null_value_handling(NullValueHandling::Ignore);
//! assert_eq!(settings.formatting, Formatting::Indented);
//! ```

use crate::convert::JsonConverter;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// What to do when a value already on the serialization stack is reached again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReferenceLoopHandling {
    /// Fault immediately
    #[default]
    Error,
    /// Silently omit the looping member
    Ignore,
    /// Serialize anyway; recursion depth is bounded only by the stack
    Serialize,
}

/// What to do with a property that has no matching member on the target type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MissingMemberHandling {
    #[default]
    Ignore,
    Error,
}

/// Whether null member values are written/assigned or skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NullValueHandling {
    #[default]
    Include,
    Ignore,
}

/// Whether members equal to their kind's default value are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DefaultValueHandling {
    #[default]
    Include,
    Ignore,
}

/// Whether an existing member value is populated in place or replaced when the
/// incoming token starts a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ObjectCreationHandling {
    /// Reuse existing non-null values, create otherwise
    #[default]
    Auto,
    /// Always reuse existing values where the shape allows it
    Reuse,
    /// Always create new values
    Replace,
}

/// Reference-preservation metadata axis. Off by default and otherwise inert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PreserveReferencesHandling {
    #[default]
    None,
    Objects,
    Arrays,
    All,
}

/// Type-name metadata axis. Off by default and otherwise inert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TypeNameHandling {
    #[default]
    None,
    Objects,
    Arrays,
    Auto,
    All,
}

/// Metadata-property read strategy axis. Off by default and otherwise inert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MetadataPropertyHandling {
    #[default]
    Default,
    ReadAhead,
    Ignore,
}

/// Output text formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Formatting {
    #[default]
    None,
    Indented,
}

/// How timestamp values are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DateFormatHandling {
    /// ISO-8601, e.g. `"2007-12-29T00:11:57.056Z"`
    #[default]
    IsoDateFormat,
    /// Legacy `"\/Date(1198908717056)\/"` wire convention
    MicrosoftDateFormat,
}

/// How non-finite floats are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FloatFormatHandling {
    /// Bare `NaN` / `Infinity` / `-Infinity` literals
    #[default]
    Symbol,
    /// Quoted `"NaN"` / `"Infinity"` / `"-Infinity"`
    String,
    /// `null`
    DefaultValue,
}

/// Which characters the writer escapes beyond the always-escaped set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StringEscapeHandling {
    /// Control characters, the active quote, and backslash only
    #[default]
    Default,
    /// Additionally `<`, `>`, `&`, `'`, `"`
    EscapeHtml,
    /// Additionally every character outside printable ASCII
    EscapeNonAscii,
}

/// Immutable-after-construction bundle of behavioral switches.
///
/// Threaded read-only through [`crate::JsonSerializer`],
/// [`crate::JsonDeserializer`], and [`crate::JsonWriter`].
#[derive(Clone, Default)]
pub struct JsonSettings {
    pub reference_loop_handling: ReferenceLoopHandling,
    pub missing_member_handling: MissingMemberHandling,
    pub null_value_handling: NullValueHandling,
    pub default_value_handling: DefaultValueHandling,
    pub object_creation_handling: ObjectCreationHandling,
    pub preserve_references_handling: PreserveReferencesHandling,
    pub type_name_handling: TypeNameHandling,
    pub metadata_property_handling: MetadataPropertyHandling,
    pub formatting: Formatting,
    pub date_format_handling: DateFormatHandling,
    pub float_format_handling: FloatFormatHandling,
    pub string_escape_handling: StringEscapeHandling,
    /// Spaces per nesting level when `Formatting::Indented` is selected
    pub indent: usize,
    /// Active quote character, `"` or `'`
    pub quote_char: char,
    converters: Vec<Arc<dyn JsonConverter>>,
}

impl fmt::Debug for JsonSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSettings")
            .field("reference_loop_handling", &self.reference_loop_handling)
            .field("missing_member_handling", &self.missing_member_handling)
            .field("null_value_handling", &self.null_value_handling)
            .field("default_value_handling", &self.default_value_handling)
            .field("object_creation_handling", &self.object_creation_handling)
            .field("formatting", &self.formatting)
            .field("date_format_handling", &self.date_format_handling)
            .field("float_format_handling", &self.float_format_handling)
            .field("string_escape_handling", &self.string_escape_handling)
            .field("indent", &self.indent)
            .field("quote_char", &self.quote_char)
            .field("converters", &self.converters.len())
            .finish()
    }
}

impl JsonSettings {
    /// Default settings: compact output, double quotes, every policy at its
    /// documented default.
    #[must_use]
    pub fn new() -> Self {
        JsonSettings {
            indent: 2,
            quote_char: '"',
            ..Default::default()
        }
    }

    /// Settings for indented output.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsontext::{JsonSettings, Formatting};
    ///
    /// let settings = JsonSettings::pretty();
    /// assert_eq!(settings.formatting, Formatting::Indented);
    /// ```
    #[must_use]
    pub fn pretty() -> Self {
        JsonSettings {
            formatting: Formatting::Indented,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_reference_loop_handling(mut self, handling: ReferenceLoopHandling) -> Self {
        self.reference_loop_handling = handling;
        self
    }

    #[must_use]
    pub fn with_missing_member_handling(mut self, handling: MissingMemberHandling) -> Self {
        self.missing_member_handling = handling;
        self
    }

    #[must_use]
    pub fn with_null_value_handling(mut self, handling: NullValueHandling) -> Self {
        self.null_value_handling = handling;
        self
    }

    #[must_use]
    pub fn with_default_value_handling(mut self, handling: DefaultValueHandling) -> Self {
        self.default_value_handling = handling;
        self
    }

    #[must_use]
    pub fn with_object_creation_handling(mut self, handling: ObjectCreationHandling) -> Self {
        self.object_creation_handling = handling;
        self
    }

    #[must_use]
    pub fn with_formatting(mut self, formatting: Formatting) -> Self {
        self.formatting = formatting;
        self
    }

    #[must_use]
    pub fn with_date_format_handling(mut self, handling: DateFormatHandling) -> Self {
        self.date_format_handling = handling;
        self
    }

    #[must_use]
    pub fn with_float_format_handling(mut self, handling: FloatFormatHandling) -> Self {
        self.float_format_handling = handling;
        self
    }

    #[must_use]
    pub fn with_string_escape_handling(mut self, handling: StringEscapeHandling) -> Self {
        self.string_escape_handling = handling;
        self
    }

    /// Sets the indentation width (spaces per level). Default is 2.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the active quote character. Must be `"` or `'`.
    #[must_use]
    pub fn with_quote_char(mut self, quote_char: char) -> Self {
        debug_assert!(quote_char == '"' || quote_char == '\'');
        self.quote_char = quote_char;
        self
    }

    /// Registers a converter that claims target types wholesale.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn JsonConverter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// First registered converter claiming `type_id`, if any.
    #[must_use]
    pub fn converter_for(&self, type_id: TypeId) -> Option<&Arc<dyn JsonConverter>> {
        self.converters.iter().find(|c| c.handles(type_id))
    }
}
