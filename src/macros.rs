/// Builds a [`crate::JsonValue`] from JSON-like syntax.
///
/// ```rust
/// use jsontext::json;
///
/// let value = json!({
///     "name": "Alice",
///     "tags": ["admin", "user"],
///     "age": 30
/// });
/// assert!(value.is_object());
/// ```
#[macro_export]
macro_rules! json {
    // Handle null
    (null) => {
        $crate::JsonValue::Null
    };

    // Handle true
    (true) => {
        $crate::JsonValue::Bool(true)
    };

    // Handle false
    (false) => {
        $crate::JsonValue::Bool(false)
    };

    // Handle empty array
    ([]) => {
        $crate::JsonValue::Array(vec![])
    };

    // Handle non-empty array
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::JsonValue::Array(vec![$($crate::json!($elem)),*])
    };

    // Handle empty object
    ({}) => {
        $crate::JsonValue::Object($crate::JsonMap::new())
    };

    // Handle non-empty object
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::JsonMap::new();
        $(
            object.insert($key.to_string(), $crate::json!($value));
        )*
        $crate::JsonValue::Object(object)
    }};

    // Fallback for any expression with a From conversion
    ($other:expr) => {
        $crate::JsonValue::from($other)
    };
}

/// Wires a struct into the mapping engine.
///
/// Generates [`crate::JsonObject`], [`crate::FromJsonObject`],
/// [`crate::FromJson`], [`crate::FromJsonValue`], [`crate::ToMemberView`],
/// and [`crate::AsObjectMut`] from a member list. Each entry pairs a field
/// with its wire name, optionally followed by member flags in brackets
/// (`ignored`, `read_only`, `write_only`).
///
/// The plain form requires [`Default`]:
///
/// ```rust
/// use jsontext::json_mapped;
///
/// #[derive(Default)]
/// struct User {
///     name: String,
///     age: i64,
///     password: String,
/// }
///
/// json_mapped!(User {
///     name => "name",
///     age => "age",
///     password => "password" [write_only],
/// });
///
/// let user = User { name: "A".into(), age: 1, password: "secret".into() };
/// assert_eq!(jsontext::to_string(&user).unwrap(), r#"{"name":"A","age":1}"#);
/// ```
///
/// The constructor form names an associated function and the wire names that
/// feed it; remaining document members are assigned afterwards:
///
/// ```rust
/// use jsontext::json_mapped;
///
/// struct Interval {
///     start: i64,
///     end: i64,
/// }
///
/// impl Interval {
///     fn new(start: i64, end: i64) -> Self {
///         Interval { start, end }
///     }
/// }
///
/// json_mapped!(Interval(new(start: i64 => "start", end: i64 => "end")) {
///     start => "start",
///     end => "end",
/// });
///
/// let interval: Interval = jsontext::from_str(r#"{"end": 9, "start": 2}"#).unwrap();
/// assert_eq!((interval.start, interval.end), (2, 9));
/// ```
#[macro_export]
macro_rules! json_mapped {
    // Default-constructed form
    ($ty:ident { $($field:ident => $name:literal $([$($flag:ident),+ $(,)?])?),+ $(,)? }) => {
        $crate::json_mapped!(@object $ty { $($field => $name $([$($flag),+])?),+ });

        impl $crate::FromJsonObject for $ty {
            fn construct() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(<$ty as ::core::default::Default>::default())
            }
        }
    };

    // Constructor-bound form
    ($ty:ident ($ctor:ident ( $($arg:ident : $aty:ty => $aname:literal),* $(,)? ))
     { $($field:ident => $name:literal $([$($flag:ident),+ $(,)?])?),+ $(,)? }) => {
        $crate::json_mapped!(@object $ty { $($field => $name $([$($flag),+])?),+ });

        impl $crate::FromJsonObject for $ty {
            fn construct() -> ::core::option::Option<Self> {
                ::core::option::Option::None
            }

            fn construct_with(args: &mut $crate::JsonMap) -> $crate::Result<Self> {
                ::core::result::Result::Ok($ty::$ctor(
                    $(
                        {
                            let $arg = args.shift_remove($aname).unwrap_or_default();
                            <$aty as $crate::FromJsonValue>::from_json_value($arg)?
                        }
                    ),*
                ))
            }
        }
    };

    (@object $ty:ident { $($field:ident => $name:literal $([$($flag:ident),+])?),+ }) => {
        impl $crate::JsonObject for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn type_name(&self) -> &'static str {
                ::core::stringify!($ty)
            }

            fn build_mapping(&self) -> $crate::MemberMapping {
                let mut mapping = $crate::MemberMapping::new(::core::stringify!($ty));
                $(
                    mapping.push($crate::Member::new($name)$($(.$flag())+)?);
                )+
                mapping
            }

            fn member(&self, name: &str) -> ::core::option::Option<$crate::MemberView<'_>> {
                match name {
                    $(
                        $name => ::core::option::Option::Some(
                            $crate::ToMemberView::to_member_view(&self.$field),
                        ),
                    )+
                    _ => ::core::option::Option::None,
                }
            }

            fn set_member(
                &mut self,
                name: &str,
                value: $crate::JsonValue,
            ) -> $crate::Result<()> {
                match name {
                    $(
                        $name => {
                            self.$field = $crate::FromJsonValue::from_json_value(value)?;
                            ::core::result::Result::Ok(())
                        }
                    )+
                    _ => ::core::result::Result::Err($crate::Error::missing_member(
                        name,
                        ::core::stringify!($ty),
                    )),
                }
            }

            fn member_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<&mut dyn $crate::JsonObject> {
                match name {
                    $(
                        $name => $crate::AsObjectMut::as_object_mut(&mut self.$field),
                    )+
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl $crate::ToMemberView for $ty {
            fn to_member_view(&self) -> $crate::MemberView<'_> {
                $crate::MemberView::Object(self)
            }
        }

        impl $crate::AsObjectMut for $ty {
            fn as_object_mut(&mut self) -> ::core::option::Option<&mut dyn $crate::JsonObject> {
                ::core::option::Option::Some(self)
            }
        }

        impl $crate::FromJsonValue for $ty {
            fn from_json_value(value: $crate::JsonValue) -> $crate::Result<Self> {
                let map = <$crate::JsonMap as $crate::FromJsonValue>::from_json_value(value)?;
                $crate::object_from_map(map)
            }
        }

        impl $crate::FromJson for $ty {
            fn from_json(
                de: &$crate::JsonDeserializer,
                reader: &mut $crate::JsonReader<'_>,
            ) -> $crate::Result<Self> {
                de.deserialize_object(reader)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{JsonMap, JsonValue, Number};

    #[test]
    fn json_macro_primitives() {
        assert_eq!(json!(null), JsonValue::Null);
        assert_eq!(json!(true), JsonValue::Bool(true));
        assert_eq!(json!(false), JsonValue::Bool(false));
        assert_eq!(json!(42), JsonValue::Number(Number::Integer(42)));
        assert_eq!(json!(3.5), JsonValue::Number(Number::Float(3.5)));
        assert_eq!(json!("hello"), JsonValue::String("hello".to_string()));
    }

    #[test]
    fn json_macro_arrays() {
        assert_eq!(json!([]), JsonValue::Array(vec![]));

        let arr = json!([1, 2, 3]);
        match arr {
            JsonValue::Array(vec) => {
                assert_eq!(vec.len(), 3);
                assert_eq!(vec[0], JsonValue::Number(Number::Integer(1)));
            }
            _ => panic!("Expected array"),
        }
    }

    #[test]
    fn json_macro_objects() {
        assert_eq!(json!({}), JsonValue::Object(JsonMap::new()));

        let obj = json!({
            "name": "Alice",
            "nested": {"inner": [true, null]},
            "age": 30
        });

        match obj {
            JsonValue::Object(map) => {
                assert_eq!(map.len(), 3);
                assert_eq!(
                    map.get("name"),
                    Some(&JsonValue::String("Alice".to_string()))
                );
                assert!(map.get("nested").is_some_and(JsonValue::is_object));
            }
            _ => panic!("Expected object"),
        }
    }

    mod mapped {
        use crate::{
            FromJsonObject, JsonObject, JsonValue, Member, MemberView, ToMemberView,
        };

        #[derive(Default, Debug, PartialEq)]
        struct Gadget {
            label: String,
            weight: i64,
            secret: String,
            cached: i64,
        }

        json_mapped!(Gadget {
            label => "label",
            weight => "weight",
            secret => "secret" [write_only],
            cached => "cached" [ignored],
        });

        struct Span {
            from: i64,
            to: i64,
            note: String,
        }

        impl Span {
            fn bounded(from: i64, to: i64) -> Self {
                Span {
                    from,
                    to,
                    note: String::new(),
                }
            }
        }

        json_mapped!(Span(bounded(from: i64 => "from", to: i64 => "to")) {
            from => "from",
            to => "to",
            note => "note",
        });

        #[test]
        fn generated_mapping_carries_flags() {
            let gadget = Gadget::default();
            let mapping = gadget.build_mapping();
            assert_eq!(
                mapping.members().map(Member::name).collect::<Vec<_>>(),
                ["label", "weight", "secret", "cached"]
            );
            assert!(!mapping.get("secret").unwrap().is_serializable());
            assert!(mapping.get("cached").unwrap().is_ignored());
        }

        #[test]
        fn generated_member_access() {
            let mut gadget = Gadget::default();
            gadget.set_member("label", JsonValue::from("anvil")).unwrap();
            gadget.set_member("weight", JsonValue::from(100)).unwrap();
            assert_eq!(gadget.label, "anvil");
            match gadget.member("weight") {
                Some(MemberView::Value(v)) => assert_eq!(v.as_i64(), Some(100)),
                _ => panic!("expected value view"),
            }
            assert!(gadget.member("nope").is_none());
        }

        #[test]
        fn round_trip_through_facades() {
            let gadget = Gadget {
                label: "anvil".into(),
                weight: 100,
                secret: "hidden".into(),
                cached: 9,
            };
            let text = crate::to_string(&gadget).unwrap();
            assert_eq!(text, r#"{"label":"anvil","weight":100}"#);

            let back: Gadget =
                crate::from_str(r#"{"label":"anvil","weight":100,"secret":"s"}"#).unwrap();
            assert_eq!(back.label, "anvil");
            assert_eq!(back.secret, "s");
            assert_eq!(back.cached, 0);
        }

        #[test]
        fn constructor_form_builds_through_ctor() {
            let span: Span = crate::from_str(r#"{"note": "n", "to": 7, "from": 2}"#).unwrap();
            assert_eq!((span.from, span.to), (2, 7));
            assert_eq!(span.note, "n");
        }

        #[test]
        fn constructor_form_faults_on_missing_arg() {
            assert!(crate::from_str::<Span>(r#"{"from": 2}"#).is_err());
        }

        #[test]
        fn object_views_borrow_self() {
            let gadget = Gadget::default();
            match gadget.to_member_view() {
                MemberView::Object(obj) => assert_eq!(obj.type_name(), "Gadget"),
                _ => panic!("expected object view"),
            }
        }

        #[test]
        fn construct_defaults() {
            assert!(Gadget::construct().is_some());
            assert!(Span::construct().is_none());
        }

        #[derive(Default, Debug, PartialEq)]
        struct Counter {
            hits: u64,
        }

        json_mapped!(Counter {
            hits => "hits",
        });

        #[test]
        fn unsigned_members_round_trip() {
            let counter = Counter { hits: 5 };
            let text = crate::to_string(&counter).unwrap();
            assert_eq!(text, r#"{"hits":5}"#);
            let back: Counter = crate::from_str(&text).unwrap();
            assert_eq!(back, counter);
        }

        #[test]
        fn unsigned_members_past_i64_render_as_float() {
            let counter = Counter { hits: 1 << 63 };
            let text = crate::to_string(&counter).unwrap();
            assert_eq!(text, r#"{"hits":9223372036854776000.0}"#);
            let back: Counter = crate::from_str(&text).unwrap();
            assert_eq!(back.hits, 1 << 63);
        }
    }
}
