use std::sync::Arc;
use std::thread;

use recjson::{EnumDef, JsonMap, RecordSchema, Registry, TypeExpr};
use serde_json::{json, Value};

fn obj(v: Value) -> JsonMap {
    match v {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

#[test]
fn concurrent_first_calls_agree() {
    let registry = Registry::new();
    let point = registry
        .register(
            RecordSchema::new("Point")
                .field("x", TypeExpr::Int)
                .field("y", TypeExpr::Int),
        )
        .unwrap();

    let input = Arc::new(obj(json!({"x": 1, "y": 2})));
    let mut joins = Vec::new();
    for _ in 0..8 {
        let point = point.clone();
        let input = input.clone();
        joins.push(thread::spawn(move || point.from_mapping(&input).unwrap()));
    }
    let records: Vec<_> = joins.into_iter().map(|j| j.join().unwrap()).collect();
    for rec in &records[1..] {
        assert_eq!(rec, &records[0]);
    }
}

#[test]
fn second_call_reuses_the_installed_routine() {
    let registry = Registry::new();
    let point = registry
        .register(RecordSchema::new("Point").field("x", TypeExpr::Int))
        .unwrap();
    let input = obj(json!({"x": 5}));
    let a = point.from_mapping(&input).unwrap();
    let b = point.from_mapping(&input).unwrap();
    assert_eq!(a, b);
}

#[test]
fn nested_type_may_register_after_the_referencing_schema() {
    let registry = Registry::new();
    // Outer registers first, referencing a type that does not exist yet.
    let outer = registry
        .register(RecordSchema::new("Outer").field("inner", TypeExpr::named("Inner")))
        .unwrap();
    registry
        .register(RecordSchema::new("Inner").field("n", TypeExpr::Int))
        .unwrap();

    let rec = outer.from_mapping(&obj(json!({"inner": {"n": 1}}))).unwrap();
    assert_eq!(
        Value::Object(outer.to_mapping(&rec).unwrap()),
        json!({"inner": {"n": 1}})
    );
}

#[test]
fn unknown_nested_type_fails_at_first_use_and_recovers_after_registration() {
    let registry = Registry::new();
    let outer = registry
        .register(RecordSchema::new("Outer").field("inner", TypeExpr::named("Missing")))
        .unwrap();

    let err = outer.from_mapping(&obj(json!({"inner": {}}))).unwrap_err();
    assert_eq!(err.kind, recjson::CodecErrorKind::Config);
    assert!(err.message.contains("Missing"), "{}", err.message);

    // A failed compile does not poison the gate.
    registry
        .register(RecordSchema::new("Missing").field("n", TypeExpr::Int))
        .unwrap();
    let rec = outer.from_mapping(&obj(json!({"inner": {"n": 2}}))).unwrap();
    assert_eq!(
        Value::Object(outer.to_mapping(&rec).unwrap()),
        json!({"inner": {"n": 2}})
    );
}

#[test]
fn registration_is_idempotent_for_identical_schemas() {
    let registry = Registry::new();
    let schema = || RecordSchema::new("Point").field("x", TypeExpr::Int);
    let a = registry.register(schema()).unwrap();
    let b = registry.register(schema()).unwrap();
    assert_eq!(a.name(), b.name());

    // Both handles hit the same compiled routine.
    let input = obj(json!({"x": 1}));
    assert_eq!(a.from_mapping(&input).unwrap(), b.from_mapping(&input).unwrap());
}

#[test]
fn conflicting_registration_is_a_config_error() {
    let registry = Registry::new();
    registry
        .register(RecordSchema::new("Point").field("x", TypeExpr::Int))
        .unwrap();
    let err = registry
        .register(RecordSchema::new("Point").field("x", TypeExpr::Text))
        .unwrap_err();
    assert_eq!(err.kind, recjson::CodecErrorKind::Config);
}

#[test]
fn enum_redefinition_rules() {
    let registry = Registry::new();
    let def = EnumDef::new("Color", [("Red", json!("red"))]);
    registry.register_enum(def.clone()).unwrap();
    // Identical redefinition is a no-op.
    registry.register_enum(def).unwrap();
    // Different members conflict.
    let err = registry
        .register_enum(EnumDef::new("Color", [("Green", json!("green"))]))
        .unwrap_err();
    assert_eq!(err.kind, recjson::CodecErrorKind::Config);
    // A name cannot be both an enum and a record.
    let err = registry
        .register(RecordSchema::new("Color").field("x", TypeExpr::Int))
        .unwrap_err();
    assert_eq!(err.kind, recjson::CodecErrorKind::Config);
}

#[test]
fn mutually_referencing_types_compile_on_demand() {
    let registry = Registry::new();
    let node = registry
        .register(
            RecordSchema::new("Node")
                .field("label", TypeExpr::Text)
                .field(
                    "children",
                    TypeExpr::list(TypeExpr::named("Node")),
                ),
        )
        .unwrap();

    let input = json!({
        "label": "root",
        "children": [
            {"label": "a", "children": []},
            {"label": "b", "children": [{"label": "c", "children": []}]},
        ],
    });
    let rec = node.from_mapping(&obj(input.clone())).unwrap();
    assert_eq!(Value::Object(node.to_mapping(&rec).unwrap()), input);
}
