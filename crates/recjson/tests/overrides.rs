use recjson::{
    CodecError, FieldDescriptor, FieldValue, JsonMap, Record, RecordSchema, RegisterOptions,
    Registry, TypeExpr,
};
use serde_json::{json, Value};

fn obj(v: Value) -> JsonMap {
    match v {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

#[test]
fn custom_encoder_bypasses_built_in_nested_record_encoding() {
    let registry = Registry::new();
    registry
        .register(
            RecordSchema::new("Point")
                .field("x", TypeExpr::Int)
                .field("y", TypeExpr::Int),
        )
        .unwrap();
    let path = registry
        .register(RecordSchema::new("Path").field_desc(
            FieldDescriptor::new("points", TypeExpr::list(TypeExpr::named("Point"))).with_encoder(
                |value| {
                    let FieldValue::List(points) = value else {
                        return Err(CodecError::malformed("points must be a list"));
                    };
                    let mut out = Vec::with_capacity(points.len());
                    for p in points {
                        let FieldValue::Record(rec) = p else {
                            return Err(CodecError::malformed("points must hold records"));
                        };
                        out.push(json!([
                            rec.get("x").unwrap().to_json(),
                            rec.get("y").unwrap().to_json(),
                        ]));
                    }
                    Ok(Value::Array(out))
                },
            ),
        ))
        .unwrap();

    let rec = path
        .from_mapping(&obj(json!({"points": [{"x": 1, "y": 2}, {"x": 3, "y": 4}]})))
        .unwrap();
    // Pair arrays, not nested-record objects.
    assert_eq!(
        Value::Object(path.to_mapping(&rec).unwrap()),
        json!({"points": [[1, 2], [3, 4]]})
    );
}

#[test]
fn custom_decoder_replaces_built_transform_in_one_direction_only() {
    let registry = Registry::new();
    let doubled = registry
        .register(RecordSchema::new("Doubled").field_desc(
            FieldDescriptor::new("n", TypeExpr::Int).with_decoder(|v| match v.as_i64() {
                Some(i) => Ok(FieldValue::Int(i * 2)),
                None => Err(CodecError::malformed("n must be an integer")),
            }),
        ))
        .unwrap();

    let rec = doubled.from_mapping(&obj(json!({"n": 21}))).unwrap();
    assert_eq!(rec.get("n").unwrap(), &FieldValue::Int(42));
    // Encode still uses the built-in integer codec.
    assert_eq!(
        Value::Object(doubled.to_mapping(&rec).unwrap()),
        json!({"n": 42})
    );
}

#[test]
fn explicit_wire_name_renames_in_both_directions() {
    let registry = Registry::new();
    let aliased = registry
        .register(
            RecordSchema::new("Aliased").field_desc(
                FieldDescriptor::new("user_id", TypeExpr::Text).with_wire_name("userId"),
            ),
        )
        .unwrap();

    let rec = aliased.from_mapping(&obj(json!({"userId": "u1"}))).unwrap();
    assert_eq!(rec.get("user_id").unwrap(), &FieldValue::text("u1"));
    assert_eq!(
        Value::Object(aliased.to_mapping(&rec).unwrap()),
        json!({"userId": "u1"})
    );
}

#[test]
fn schema_wide_name_transform_with_explicit_override_winning() {
    let registry = Registry::new();
    let schema = RecordSchema::new("Styled")
        .field("plain_name", TypeExpr::Int)
        .field_desc(FieldDescriptor::new("special", TypeExpr::Int).with_wire_name("SPECIAL"));
    let styled = registry
        .register_with(
            schema,
            RegisterOptions::new().wire_name_transform(|name| name.to_uppercase()),
        )
        .unwrap();

    let rec = styled
        .from_mapping(&obj(json!({"PLAIN_NAME": 1, "SPECIAL": 2})))
        .unwrap();
    assert_eq!(rec.get("plain_name").unwrap(), &FieldValue::Int(1));
    assert_eq!(rec.get("special").unwrap(), &FieldValue::Int(2));
    assert_eq!(
        Value::Object(styled.to_mapping(&rec).unwrap()),
        json!({"PLAIN_NAME": 1, "SPECIAL": 2})
    );
}

#[test]
fn custom_encoder_on_absent_value_is_omitted() {
    let registry = Registry::new();
    let sparse = registry
        .register(RecordSchema::new("Sparse").field_desc(
            FieldDescriptor::new("maybe", TypeExpr::option(TypeExpr::Int))
                .with_encoder(|_| Ok(json!("never called for null"))),
        ))
        .unwrap();

    let rec = Record::new("Sparse").with_field("maybe", FieldValue::Null);
    let wire = sparse.to_mapping(&rec).unwrap();
    assert!(wire.is_empty());
}
