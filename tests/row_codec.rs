mod common;

use common::{instant_millis, CentsConversion, Note, Price, Sample};
use rust_sqlite_orm::{
    extract, FieldValue, OrmError, Row, RowCodec, SemanticType, TypeConversion, TypeRegistry,
    DataType, Value, ValueError,
};

fn sample() -> Sample {
    Sample {
        id: 7,
        count: -42,
        ratio: 0.25,
        amount: 1234.5678,
        label: "hello".to_string(),
        flag: true,
        grade: 'B',
        initial: "Z".to_string(),
        at: Some(instant_millis(1_700_000_000_123)),
    }
}

#[test]
fn test_encode_produces_one_cell_per_column() {
    let registry = TypeRegistry::new();
    let descriptor = extract::<Sample>(&registry).unwrap();
    let values = RowCodec::new(&registry).encode(&sample(), &descriptor).unwrap();

    let columns: Vec<&str> = values.columns().collect();
    assert_eq!(
        columns,
        ["id", "count", "ratio", "amount", "label", "flag", "grade", "initial", "at"]
    );
    assert_eq!(values.get("id"), Some(&Value::Integer(7)));
    assert_eq!(values.get("count"), Some(&Value::Integer(-42)));
    assert_eq!(values.get("ratio"), Some(&Value::Real(0.25)));
    assert_eq!(values.get("amount"), Some(&Value::Real(1234.5678)));
    assert_eq!(values.get("label"), Some(&Value::Text("hello".to_string())));
    assert_eq!(values.get("flag"), Some(&Value::Integer(1)));
    assert_eq!(values.get("grade"), Some(&Value::Text("B".to_string())));
    assert_eq!(values.get("at"), Some(&Value::Integer(1_700_000_000_123)));
}

#[test]
fn test_round_trip_every_builtin_type() {
    let registry = TypeRegistry::new();
    let codec = RowCodec::new(&registry);
    let descriptor = extract::<Sample>(&registry).unwrap();

    let original = sample();
    let values = codec.encode(&original, &descriptor).unwrap();
    let row = Row {
        cells: values.values.clone(),
    };
    let decoded: Sample = codec.decode(&row, &descriptor).unwrap();
    assert_eq!(decoded, original);

    let negative = Sample {
        flag: false,
        ratio: -3.5,
        at: Some(instant_millis(-1_500)),
        ..sample()
    };
    let row = Row {
        cells: codec.encode(&negative, &descriptor).unwrap().values,
    };
    assert_eq!(codec.decode::<Sample>(&row, &descriptor).unwrap(), negative);
}

#[test]
fn test_character_is_truncated_to_first_char() {
    let registry = TypeRegistry::new();
    let codec = RowCodec::new(&registry);
    let descriptor = extract::<Sample>(&registry).unwrap();

    let entity = Sample {
        initial: "AB".to_string(),
        ..sample()
    };
    let values = codec.encode(&entity, &descriptor).unwrap();
    assert_eq!(values.get("initial"), Some(&Value::Text("A".to_string())));

    let decoded: Sample = codec
        .decode(&Row { cells: values.values }, &descriptor)
        .unwrap();
    assert_eq!(decoded.initial, "A");

    let conversion = registry.resolve(SemanticType::Character).unwrap();
    assert_eq!(
        conversion.encode(&FieldValue::from("AB")).unwrap(),
        Value::Text("A".to_string())
    );
    assert_eq!(conversion.encode(&FieldValue::from("")).unwrap(), Value::Null);
}

#[test]
fn test_instant_is_stored_as_epoch_millis() {
    let registry = TypeRegistry::new();
    let conversion = registry.resolve(SemanticType::Instant).unwrap();

    let instant = instant_millis(1_234_567_890_987);
    let cell = conversion.encode(&FieldValue::Instant(instant)).unwrap();
    assert_eq!(cell, Value::Integer(1_234_567_890_987));
    assert_eq!(conversion.decode(&cell).unwrap(), FieldValue::Instant(instant));

    // sub-millisecond precision is dropped
    let precise = instant + time::Duration::microseconds(456);
    assert_eq!(
        conversion.encode(&FieldValue::Instant(precise)).unwrap(),
        Value::Integer(1_234_567_890_987)
    );
}

#[test]
fn test_nulls_round_trip_through_optional_fields() {
    let registry = TypeRegistry::new();
    let codec = RowCodec::new(&registry);
    let descriptor = extract::<Note>(&registry).unwrap();

    let note = Note::new(3, "draft", false);
    let values = codec.encode(&note, &descriptor).unwrap();
    assert_eq!(values.get("author"), Some(&Value::Null));
    assert_eq!(values.get("date"), Some(&Value::Null));
    assert_eq!(values.get("sent"), Some(&Value::Integer(0)));

    let decoded: Note = codec
        .decode(&Row { cells: values.values }, &descriptor)
        .unwrap();
    assert_eq!(decoded, note);
}

#[test]
fn test_decode_reports_missing_column() {
    let registry = TypeRegistry::new();
    let codec = RowCodec::new(&registry);
    let descriptor = extract::<Note>(&registry).unwrap();

    let row = Row::new()
        .with_cell("id", 1_i64)
        .with_cell("body", "hi")
        .with_cell("author", Value::Null)
        .with_cell("sent", 1_i64);
    match codec.decode::<Note>(&row, &descriptor) {
        Err(OrmError::SchemaMismatch { table, reason }) => {
            assert_eq!(table, "Note");
            assert!(reason.contains("date"));
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
}

#[test]
fn test_decode_rejects_cell_of_wrong_shape() {
    let registry = TypeRegistry::new();
    let codec = RowCodec::new(&registry);
    let descriptor = extract::<Note>(&registry).unwrap();

    let row = Row::new()
        .with_cell("id", "one")
        .with_cell("body", "hi")
        .with_cell("author", Value::Null)
        .with_cell("sent", 1_i64)
        .with_cell("date", Value::Null);
    assert!(matches!(
        codec.decode::<Note>(&row, &descriptor),
        Err(OrmError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_decode_null_into_required_field_is_field_access_error() {
    let registry = TypeRegistry::new();
    let codec = RowCodec::new(&registry);
    let descriptor = extract::<Note>(&registry).unwrap();

    let row = Row::new()
        .with_cell("id", 1_i64)
        .with_cell("body", Value::Null)
        .with_cell("author", Value::Null)
        .with_cell("sent", 1_i64)
        .with_cell("date", Value::Null);
    match codec.decode::<Note>(&row, &descriptor) {
        Err(OrmError::FieldAccess { field, source }) => {
            assert_eq!(field, "body");
            assert_eq!(source, ValueError::mismatch("text", "null"));
        }
        other => panic!("expected FieldAccess, got {other:?}"),
    }
}

#[test]
fn test_decode_ignores_extra_cells() {
    let registry = TypeRegistry::new();
    let codec = RowCodec::new(&registry);
    let descriptor = extract::<Note>(&registry).unwrap();

    let row = Row::new()
        .with_cell("rowid", 99_i64)
        .with_cell("date", 86_400_000_i64)
        .with_cell("sent", 1_i64)
        .with_cell("author", "mario")
        .with_cell("body", "hi")
        .with_cell("id", 1_i64);
    let note: Note = codec.decode(&row, &descriptor).unwrap();
    assert_eq!(note.id, 1);
    assert_eq!(note.author.as_deref(), Some("mario"));
    assert!(note.sent);
    assert_eq!(note.date, Some(instant_millis(86_400_000)));
}

#[test]
fn test_custom_conversion_is_used_by_codec() {
    let mut registry = TypeRegistry::new();
    registry.register(SemanticType::Custom("cents"), CentsConversion);
    let codec = RowCodec::new(&registry);
    let descriptor = extract::<Price>(&registry).unwrap();

    let price = Price {
        id: 1,
        amount: 12.34,
    };
    let values = codec.encode(&price, &descriptor).unwrap();
    assert_eq!(values.get("amount"), Some(&Value::Integer(1234)));
    let decoded: Price = codec
        .decode(&Row { cells: values.values }, &descriptor)
        .unwrap();
    assert_eq!(decoded, price);
}

/// Booleans as "yes"/"no" text
struct YesNo;

impl TypeConversion for YesNo {
    fn storage_type(&self) -> DataType {
        DataType::Text
    }

    fn encode(&self, value: &FieldValue) -> Result<Value, ValueError> {
        match value {
            FieldValue::Boolean(true) => Ok(Value::Text("yes".to_string())),
            FieldValue::Boolean(false) => Ok(Value::Text("no".to_string())),
            other => Err(ValueError::mismatch("boolean", other.kind())),
        }
    }

    fn decode(&self, cell: &Value) -> Result<FieldValue, ValueError> {
        match cell {
            Value::Text(text) => Ok(FieldValue::Boolean(text == "yes")),
            other => Err(ValueError::mismatch("text", other.kind())),
        }
    }
}

#[test]
fn test_builtin_conversion_can_be_replaced() {
    let mut registry = TypeRegistry::new();
    registry.register(SemanticType::Boolean, YesNo);
    assert!(registry.is_registered(SemanticType::Boolean));

    let descriptor = extract::<Note>(&registry).unwrap();
    assert_eq!(descriptor.columns()[3].storage_type, DataType::Text);

    let codec = RowCodec::new(&registry);
    let note = Note::new(1, "hi", true);
    let values = codec.encode(&note, &descriptor).unwrap();
    assert_eq!(values.get("sent"), Some(&Value::Text("yes".to_string())));
    let decoded: Note = codec
        .decode(&Row { cells: values.values }, &descriptor)
        .unwrap();
    assert_eq!(decoded, note);
}

#[test]
fn test_resolve_unknown_type_fails() {
    let registry = TypeRegistry::new();
    assert!(!registry.is_registered(SemanticType::Custom("uuid")));
    assert!(matches!(
        registry.resolve(SemanticType::Custom("uuid")),
        Err(OrmError::UnregisteredType(SemanticType::Custom("uuid")))
    ));
}
