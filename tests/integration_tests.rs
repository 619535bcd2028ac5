//! End-to-end tests of the object-mapping engine through the public API.

use chrono::{DateTime, Utc};
use jsontext::{
    json_mapped, DefaultValueHandling, Error, JsonBytes, JsonConverter, JsonDeserializer,
    JsonReader, JsonSettings, JsonWriter, MissingMemberHandling, NullValueHandling,
    ObjectCreationHandling,
};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default, Debug, PartialEq)]
struct Address {
    street: String,
    city: String,
}

json_mapped!(Address {
    street => "street",
    city => "city",
});

#[derive(Default, Debug, PartialEq)]
struct Account {
    name: String,
    age: i64,
    email: Option<String>,
    address: Address,
    roles: Vec<String>,
    scores: HashMap<String, i64>,
    created: Option<DateTime<Utc>>,
    avatar: JsonBytes,
    session_token: String,
}

json_mapped!(Account {
    name => "name",
    age => "age",
    email => "email",
    address => "address",
    roles => "roles",
    scores => "scores",
    created => "created",
    avatar => "avatar",
    session_token => "sessionToken" [write_only],
});

fn sample_account() -> Account {
    Account {
        name: "Alice".into(),
        age: 30,
        email: Some("alice@example.com".into()),
        address: Address {
            street: "Main St 1".into(),
            city: "Oslo".into(),
        },
        roles: vec!["admin".into(), "user".into()],
        scores: HashMap::new(),
        created: None,
        avatar: JsonBytes::from(b"png".to_vec()),
        session_token: "secret".into(),
    }
}

#[test]
fn mapped_struct_round_trip() {
    let account = sample_account();
    let text = jsontext::to_string(&account).unwrap();
    assert!(text.starts_with(r#"{"name":"Alice","age":30"#));
    // write-only members never appear in output
    assert!(!text.contains("sessionToken"));
    assert!(text.contains(r#""address":{"street":"Main St 1","city":"Oslo"}"#));
    assert!(text.contains(r#""avatar":"cG5n""#));

    let back: Account = jsontext::from_str(&text).unwrap();
    assert_eq!(back.name, account.name);
    assert_eq!(back.address, account.address);
    assert_eq!(back.roles, account.roles);
    assert_eq!(back.avatar, account.avatar);
    assert_eq!(back.session_token, "");
}

#[test]
fn write_only_members_accept_input() {
    let account: Account = jsontext::from_str(r#"{"sessionToken": "tok"}"#).unwrap();
    assert_eq!(account.session_token, "tok");
}

#[test]
fn dates_survive_round_trip() {
    let created: DateTime<Utc> = "2007-12-29T00:11:57.056Z".parse().unwrap();
    let account = Account {
        created: Some(created),
        ..Account::default()
    };
    let text = jsontext::to_string(&account).unwrap();
    assert!(text.contains(r#""created":"2007-12-29T00:11:57.056Z""#));
    let back: Account = jsontext::from_str(&text).unwrap();
    assert_eq!(back.created, Some(created));
}

#[test]
fn missing_member_ignored_by_default() {
    let account: Account =
        jsontext::from_str(r#"{"name": "A", "unknown": {"nested": [1, 2, {"x": 1}]}}"#).unwrap();
    assert_eq!(account.name, "A");
}

#[test]
fn missing_member_faults_when_strict() {
    let settings =
        JsonSettings::new().with_missing_member_handling(MissingMemberHandling::Error);
    let result = jsontext::from_str_with_settings::<Account>(
        r#"{"name": "A", "unknown": 1}"#,
        settings,
    );
    match result {
        Err(Error::MissingMember { member, type_name }) => {
            assert_eq!(member, "unknown");
            assert_eq!(type_name, "Account");
        }
        other => panic!("expected missing member fault, got {other:?}"),
    }
}

#[test]
fn null_value_handling_on_write() {
    let account = Account {
        name: "A".into(),
        ..Account::default()
    };
    let settings = JsonSettings::new().with_null_value_handling(NullValueHandling::Ignore);
    let text = jsontext::to_string_with_settings(&account, settings).unwrap();
    assert!(!text.contains("email"));
    assert!(!text.contains("created"));
}

#[test]
fn default_value_handling_on_write() {
    let account = Account::default();
    let settings =
        JsonSettings::new().with_default_value_handling(DefaultValueHandling::Ignore);
    let text = jsontext::to_string_with_settings(&account, settings).unwrap();
    // All scalars are at defaults; containers still serialize.
    assert!(!text.contains("name"));
    assert!(!text.contains("age"));
    assert!(text.contains("roles"));
}

#[test]
fn populate_merges_into_existing_graph() {
    let mut account = sample_account();
    jsontext::populate(
        r#"{"age": 31, "address": {"city": "Bergen"}}"#,
        &mut account,
    )
    .unwrap();
    assert_eq!(account.age, 31);
    assert_eq!(account.address.city, "Bergen");
    // members the document does not name are untouched
    assert_eq!(account.address.street, "Main St 1");
    assert_eq!(account.name, "Alice");
}

#[test]
fn replace_handling_rebuilds_nested_objects() {
    let mut account = sample_account();
    let settings =
        JsonSettings::new().with_object_creation_handling(ObjectCreationHandling::Replace);
    jsontext::populate_with_settings(
        r#"{"address": {"city": "Bergen"}}"#,
        &mut account,
        settings,
    )
    .unwrap();
    assert_eq!(account.address.city, "Bergen");
    assert_eq!(account.address.street, "");
}

#[test]
fn null_handling_ignore_preserves_existing_on_read() {
    let mut account = sample_account();
    let settings = JsonSettings::new().with_null_value_handling(NullValueHandling::Ignore);
    jsontext::populate_with_settings(r#"{"email": null, "age": 1}"#, &mut account, settings)
        .unwrap();
    assert_eq!(account.email.as_deref(), Some("alice@example.com"));
    assert_eq!(account.age, 1);
}

#[test]
fn vectors_replace_rather_than_append_on_set() {
    let mut account = sample_account();
    jsontext::populate(r#"{"roles": ["ops"]}"#, &mut account).unwrap();
    assert_eq!(account.roles, ["ops"]);
}

#[test]
fn populate_list_appends_to_existing() {
    let de = JsonDeserializer::new();
    let mut roles = vec!["admin".to_string()];
    let mut reader = JsonReader::new(r#"["ops", "dev"]"#);
    de.populate_list(&mut reader, &mut roles).unwrap();
    assert_eq!(roles, ["admin", "ops", "dev"]);
}

#[test]
fn dictionaries_map_by_key() {
    let account: Account =
        jsontext::from_str(r#"{"scores": {"math": 7, "art": 9}}"#).unwrap();
    assert_eq!(account.scores.get("math"), Some(&7));
    assert_eq!(account.scores.get("art"), Some(&9));
}

#[derive(Default, Debug, PartialEq)]
struct Ledger {
    balances: HashMap<i64, String>,
}

json_mapped!(Ledger {
    balances => "balances",
});

#[test]
fn integer_keyed_dictionaries_round_trip() {
    // Keys render through their string form on write and parse back from
    // the property-name text on read.
    let mut ledger = Ledger::default();
    ledger.balances.insert(42, "credit".into());
    let text = jsontext::to_string(&ledger).unwrap();
    assert_eq!(text, r#"{"balances":{"42":"credit"}}"#);

    let back: Ledger = jsontext::from_str(&text).unwrap();
    assert_eq!(back, ledger);

    let direct: HashMap<i64, String> =
        jsontext::from_str(r#"{"1": "a", "-3": "b"}"#).unwrap();
    assert_eq!(direct.get(&1).map(String::as_str), Some("a"));
    assert_eq!(direct.get(&-3).map(String::as_str), Some("b"));
}

#[test]
fn non_numeric_key_for_integer_map_faults() {
    assert!(jsontext::from_str::<HashMap<i64, String>>(r#"{"x": "a"}"#).is_err());
}

#[test]
fn scalar_coercions_apply_to_members() {
    // A numeric string narrows into an integer member; an integral float too.
    let account: Account = jsontext::from_str(r#"{"age": "42"}"#).unwrap();
    assert_eq!(account.age, 42);
    let account: Account = jsontext::from_str(r#"{"age": 42.0}"#).unwrap();
    assert_eq!(account.age, 42);
    assert!(jsontext::from_str::<Account>(r#"{"age": 42.5}"#).is_err());
}

// Constructor-bound type exercised through the facades.
#[derive(Debug, PartialEq)]
struct Measurement {
    value: f64,
    unit: String,
    label: String,
}

impl Measurement {
    fn with_unit(value: f64, unit: String) -> Self {
        Measurement {
            value,
            unit,
            label: String::new(),
        }
    }
}

json_mapped!(Measurement(with_unit(value: f64 => "value", unit: String => "unit")) {
    value => "value",
    unit => "unit",
    label => "label",
});

#[test]
fn constructor_binding_with_leftover_members() {
    let m: Measurement =
        jsontext::from_str(r#"{"label": "temp", "unit": "C", "value": 21.5}"#).unwrap();
    assert_eq!(
        m,
        Measurement {
            value: 21.5,
            unit: "C".into(),
            label: "temp".into()
        }
    );
}

#[test]
fn constructor_binding_missing_argument_faults() {
    assert!(jsontext::from_str::<Measurement>(r#"{"value": 1.0}"#).is_err());
}

// A converter that claims a mapped type wholesale and writes it as a scalar.
#[derive(Default, Debug, PartialEq)]
struct Celsius {
    degrees: f64,
}

json_mapped!(Celsius {
    degrees => "degrees",
});

struct CelsiusConverter;

impl JsonConverter for CelsiusConverter {
    fn handles(&self, type_id: TypeId) -> bool {
        type_id == TypeId::of::<Celsius>()
    }

    fn write_json(&self, writer: &mut JsonWriter, value: &dyn Any) -> jsontext::Result<()> {
        let celsius = value
            .downcast_ref::<Celsius>()
            .ok_or_else(|| Error::message("converter applied to a foreign type"))?;
        writer.write_f64(celsius.degrees)
    }

    fn read_json(
        &self,
        de: &JsonDeserializer,
        reader: &mut JsonReader<'_>,
    ) -> jsontext::Result<Box<dyn Any>> {
        let value = de.read_value(reader)?;
        let degrees = value
            .as_f64()
            .ok_or_else(|| Error::conversion(value.kind(), "f64"))?;
        Ok(Box::new(Celsius { degrees }))
    }
}

#[test]
fn converter_takes_over_both_directions() {
    let settings = JsonSettings::new().with_converter(Arc::new(CelsiusConverter));

    let text =
        jsontext::to_string_with_settings(&Celsius { degrees: 21.5 }, settings.clone()).unwrap();
    assert_eq!(text, "21.5");

    let back: Celsius = jsontext::from_str_with_settings("21.5", settings).unwrap();
    assert_eq!(back, Celsius { degrees: 21.5 });
}

#[test]
fn from_reader_accepts_io_sources() {
    let source = std::io::Cursor::new(br#"{"name": "B", "age": 2}"#.to_vec());
    let account: Account = jsontext::from_reader(source).unwrap();
    assert_eq!(account.name, "B");
    assert_eq!(account.age, 2);
}

#[test]
fn indented_output_through_facade() {
    let address = Address {
        street: "Main".into(),
        city: "Oslo".into(),
    };
    let text = jsontext::to_string_pretty(&address).unwrap();
    assert_eq!(
        text,
        "{\n  \"street\": \"Main\",\n  \"city\": \"Oslo\"\n}"
    );
}
