//! Member metadata and the runtime reflection surface of the engine.
//!
//! The serializer and deserializer never see concrete struct types. They work
//! against [`JsonObject`], an object-safe trait describing a type's members by
//! name, and [`MemberMapping`], the per-type metadata built once and shared
//! through a [`MappingCache`]. The [`crate::json_mapped!`] macro generates all
//! of these impls from a field list; hand-written impls are only needed for
//! unusual shapes.
//!
//! ## The mapping model
//!
//! A [`Member`] carries the wire name and per-member policy flags. A
//! [`MemberMapping`] is the ordered collection of members for one type;
//! member order is wire-visible, so mappings preserve declaration order.
//! [`MappingCache`] guarantees each type's mapping is built once per cache,
//! no matter how many threads serialize concurrently.

use crate::value::JsonValue;
use crate::{Error, JsonMap, Result};
use chrono::{DateTime, FixedOffset, Utc};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, PoisonError, RwLock};

/// Metadata for one serializable member of a type.
///
/// Built with a chain of flag methods:
///
/// ```rust
/// use jsontext::Member;
///
/// let member = Member::new("password").write_only();
/// assert!(!member.is_serializable());
/// assert!(member.is_deserializable());
/// ```
#[derive(Clone, Debug)]
pub struct Member {
    name: String,
    ignored: bool,
    read_only: bool,
    write_only: bool,
}

impl Member {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Member {
            name: name.into(),
            ignored: false,
            read_only: false,
            write_only: false,
        }
    }

    /// Excludes the member from both directions.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Serialized but never assigned from incoming JSON.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Assigned from incoming JSON but never serialized.
    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Wire name of the member.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Whether the member participates in serialization.
    #[must_use]
    pub fn is_serializable(&self) -> bool {
        !self.ignored && !self.write_only
    }

    /// Whether the member accepts assignment during deserialization.
    #[must_use]
    pub fn is_deserializable(&self) -> bool {
        !self.ignored && !self.read_only
    }
}

/// Ordered member metadata for one type.
#[derive(Debug)]
pub struct MemberMapping {
    type_name: &'static str,
    members: Vec<Member>,
    by_name: HashMap<String, usize>,
}

impl MemberMapping {
    #[must_use]
    pub fn new(type_name: &'static str) -> Self {
        MemberMapping {
            type_name,
            members: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Appends a member. Declaration order is serialization order.
    pub fn push(&mut self, member: Member) {
        self.by_name.insert(member.name.clone(), self.members.len());
        self.members.push(member);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.by_name.get(name).map(|&i| &self.members[i])
    }

    /// Members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Thread-safe cache of [`MemberMapping`]s keyed by [`TypeId`].
///
/// Lookups take a read lock; a miss builds the mapping outside any lock and
/// races through `or_insert_with`, so concurrent first-time lookups of the
/// same type still observe one logical mapping.
#[derive(Debug, Default)]
pub struct MappingCache {
    mappings: RwLock<HashMap<TypeId, Arc<MemberMapping>>>,
}

impl MappingCache {
    #[must_use]
    pub fn new() -> Self {
        MappingCache::default()
    }

    /// Returns the cached mapping for `obj`'s concrete type, building and
    /// caching it on first use.
    pub fn mapping_for(&self, obj: &dyn JsonObject) -> Arc<MemberMapping> {
        let type_id = obj.as_any().type_id();
        {
            let mappings = self
                .mappings
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(mapping) = mappings.get(&type_id) {
                return Arc::clone(mapping);
            }
        }
        let built = Arc::new(obj.build_mapping());
        let mut mappings = self
            .mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(mappings.entry(type_id).or_insert(built))
    }

    /// Number of cached mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Borrowed view of one member's current value, produced during
/// serialization.
///
/// Scalars and fully-owned values travel as [`MemberView::Value`]; nested
/// mapped objects stay borrowed so the serializer can track identity for
/// reference-loop detection.
pub enum MemberView<'a> {
    Value(JsonValue),
    Object(&'a dyn JsonObject),
    Array(Vec<MemberView<'a>>),
    Map(Vec<(String, MemberView<'a>)>),
}

impl MemberView<'_> {
    /// True for a `null`-like scalar value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, MemberView::Value(v) if v.is_null_like())
    }

    /// True when the underlying value equals its kind's default. Objects,
    /// arrays, and maps never count as default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, MemberView::Value(v) if v.is_default())
    }
}

/// A type whose members the engine can enumerate and assign by name.
///
/// Implemented by [`crate::json_mapped!`]; the contract is that
/// [`JsonObject::member`] and [`JsonObject::set_member`] agree with the names
/// in [`JsonObject::build_mapping`].
pub trait JsonObject: Any {
    /// Upcast used for converter dispatch and [`TypeId`] lookups.
    fn as_any(&self) -> &dyn Any;

    /// Stable display name used in fault messages.
    fn type_name(&self) -> &'static str;

    /// Builds the member metadata for this type. Called at most once per
    /// [`MappingCache`].
    fn build_mapping(&self) -> MemberMapping;

    /// Current value of the named member, or `None` for an unknown name.
    fn member(&self, name: &str) -> Option<MemberView<'_>>;

    /// Assigns the named member from a dynamic value.
    fn set_member(&mut self, name: &str, value: JsonValue) -> Result<()>;

    /// Mutable access to a nested mapped object, for populate-in-place. The
    /// default mapped impl returns `None` for scalar members.
    fn member_mut(&mut self, name: &str) -> Option<&mut dyn JsonObject>;
}

/// A mapped type the engine can instantiate while deserializing.
pub trait FromJsonObject: JsonObject + Sized {
    /// Default-constructs an instance, or `None` when the type can only be
    /// built through constructor binding.
    fn construct() -> Option<Self>;

    /// Builds an instance from named constructor arguments, removing each
    /// consumed argument from `args`. Leftover entries are assigned as
    /// ordinary members afterwards.
    fn construct_with(args: &mut JsonMap) -> Result<Self> {
        let _ = args;
        Err(Error::schema(
            std::any::type_name::<Self>(),
            "type has no constructor binding",
        ))
    }
}

/// Builds a mapped object from an already-buffered member map, the fallback
/// when in-place population is unavailable. Member names the mapping does not
/// know are dropped.
pub fn object_from_map<T: FromJsonObject>(mut map: JsonMap) -> Result<T> {
    let mut obj = match T::construct() {
        Some(obj) => obj,
        None => T::construct_with(&mut map)?,
    };
    let mapping = obj.build_mapping();
    for (name, value) in map {
        if mapping.get(&name).is_some_and(Member::is_deserializable) {
            obj.set_member(&name, value)?;
        }
    }
    Ok(obj)
}

/// Produces the serialization view of a member value.
pub trait ToMemberView {
    fn to_member_view(&self) -> MemberView<'_>;
}

/// Mutable downcast of a member to a nested mapped object, used when an
/// incoming object token may populate the existing value in place.
pub trait AsObjectMut {
    fn as_object_mut(&mut self) -> Option<&mut dyn JsonObject>;
}

macro_rules! view_via_value {
    ($($ty:ty => |$v:ident| $expr:expr),+ $(,)?) => {
        $(
            impl ToMemberView for $ty {
                fn to_member_view(&self) -> MemberView<'_> {
                    let $v = self;
                    MemberView::Value($expr)
                }
            }
        )+
    };
}

view_via_value! {
    bool => |v| JsonValue::Bool(*v),
    i8 => |v| JsonValue::from(i64::from(*v)),
    i16 => |v| JsonValue::from(i64::from(*v)),
    i32 => |v| JsonValue::from(i64::from(*v)),
    i64 => |v| JsonValue::from(*v),
    u8 => |v| JsonValue::from(i64::from(*v)),
    u16 => |v| JsonValue::from(i64::from(*v)),
    u32 => |v| JsonValue::from(i64::from(*v)),
    // Values past i64::MAX fall back to the float kind, mirroring the
    // reader's handling of overflowing integer literals.
    u64 => |v| match i64::try_from(*v) {
        Ok(i) => JsonValue::from(i),
        Err(_) => JsonValue::from(*v as f64),
    },
    f32 => |v| JsonValue::from(f64::from(*v)),
    f64 => |v| JsonValue::from(*v),
    String => |v| JsonValue::String(v.clone()),
    JsonValue => |v| v.clone(),
    JsonMap => |v| JsonValue::Object(v.clone()),
    DateTime<FixedOffset> => |v| JsonValue::Date(*v),
    DateTime<Utc> => |v| JsonValue::Date((*v).into()),
    JsonBytes => |v| JsonValue::Bytes(v.0.clone()),
}

impl<T: ToMemberView> ToMemberView for Option<T> {
    fn to_member_view(&self) -> MemberView<'_> {
        match self {
            Some(inner) => inner.to_member_view(),
            None => MemberView::Value(JsonValue::Null),
        }
    }
}

impl<T: ToMemberView> ToMemberView for Vec<T> {
    fn to_member_view(&self) -> MemberView<'_> {
        MemberView::Array(self.iter().map(ToMemberView::to_member_view).collect())
    }
}

// Keys render through their string form, so maps keyed by integers or other
// scalars become ordinary JSON objects.
impl<K: ToString, V: ToMemberView> ToMemberView for HashMap<K, V> {
    fn to_member_view(&self) -> MemberView<'_> {
        MemberView::Map(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_member_view()))
                .collect(),
        )
    }
}

impl<T: JsonObject> ToMemberView for Box<T> {
    fn to_member_view(&self) -> MemberView<'_> {
        MemberView::Object(&**self)
    }
}

impl<T: JsonObject> ToMemberView for Rc<T> {
    fn to_member_view(&self) -> MemberView<'_> {
        MemberView::Object(&**self)
    }
}

impl<T: JsonObject> ToMemberView for Arc<T> {
    fn to_member_view(&self) -> MemberView<'_> {
        MemberView::Object(&**self)
    }
}

macro_rules! no_object_mut {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl AsObjectMut for $ty {
                fn as_object_mut(&mut self) -> Option<&mut dyn JsonObject> {
                    None
                }
            }
        )+
    };
}

no_object_mut! {
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64,
    String, JsonValue, JsonMap, JsonBytes,
    DateTime<FixedOffset>, DateTime<Utc>,
}

impl<T> AsObjectMut for Vec<T> {
    fn as_object_mut(&mut self) -> Option<&mut dyn JsonObject> {
        None
    }
}

impl<K, V> AsObjectMut for HashMap<K, V> {
    fn as_object_mut(&mut self) -> Option<&mut dyn JsonObject> {
        None
    }
}

impl<T: AsObjectMut> AsObjectMut for Option<T> {
    fn as_object_mut(&mut self) -> Option<&mut dyn JsonObject> {
        self.as_mut().and_then(AsObjectMut::as_object_mut)
    }
}

impl<T: JsonObject> AsObjectMut for Box<T> {
    fn as_object_mut(&mut self) -> Option<&mut dyn JsonObject> {
        Some(&mut **self)
    }
}

// Shared pointers cannot hand out mutable access; populate-in-place falls
// back to replacement for them.
impl<T: JsonObject> AsObjectMut for Rc<T> {
    fn as_object_mut(&mut self) -> Option<&mut dyn JsonObject> {
        None
    }
}

impl<T: JsonObject> AsObjectMut for Arc<T> {
    fn as_object_mut(&mut self) -> Option<&mut dyn JsonObject> {
        None
    }
}

/// Binary member data serialized as a base64 string rather than an array of
/// numbers.
///
/// ```rust
/// use jsontext::JsonBytes;
///
/// let bytes = JsonBytes::from(vec![1, 2, 3]);
/// assert_eq!(bytes.as_slice(), &[1, 2, 3]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JsonBytes(pub Vec<u8>);

impl JsonBytes {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        JsonBytes(bytes)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for JsonBytes {
    fn from(bytes: Vec<u8>) -> Self {
        JsonBytes(bytes)
    }
}
