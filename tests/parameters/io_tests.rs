//! Tests for JSON and binary persistence

use paramtree::io::{
    from_bytes, from_json, from_json_with, load_json, save_json, to_bytes, to_json,
    to_json_pretty, to_json_with,
};
use paramtree::parameters::{register_type, NativeType, ValueCodec};
use paramtree::{
    Binding, ChildDef, ChoiceSet, Interval, JsonConfig, Node, ParamError, TypeRegistry, Validator,
    Value,
};
use std::sync::Arc;
use tempfile::tempdir;

use crate::test_helpers::{init_test_logging, mechanics, quiche_loraine};

#[test]
fn test_json_round_trip_preserves_mapping() {
    init_test_logging();

    for tree in [quiche_loraine(), mechanics()] {
        let json = to_json(&tree).unwrap();
        let loaded = from_json(&json).unwrap();

        assert_eq!(loaded.name(), tree.name());
        assert_eq!(loaded.child_count(true), tree.child_count(true));
        // extern needs an outside variable, so compare the raw values there
        for (original, copy) in tree.iter_children(true).zip(loaded.iter_children(true)) {
            assert_eq!(original.absolute_name(), copy.absolute_name());
            if original.is_leaf() {
                assert_eq!(original.raw_value().unwrap(), copy.raw_value().unwrap());
                assert_eq!(original.is_editable(), copy.is_editable());
            }
        }
    }

    let recipe = quiche_loraine();
    let loaded = from_json(&to_json(&recipe).unwrap()).unwrap();
    assert_eq!(loaded.to_mapping().unwrap(), recipe.to_mapping().unwrap());
}

#[test]
fn test_loaded_tree_keeps_types_and_validators() {
    let loaded = from_json(&to_json(&quiche_loraine()).unwrap()).unwrap();
    let servings = loaded.child("ingredients.servings").unwrap();

    assert_eq!(servings.param_type().unwrap().tag(), "int");
    assert!(matches!(
        servings.set_value(11),
        Err(ParamError::ValidationError { .. })
    ));
    servings.set_value("6").unwrap();
    assert_eq!(servings.value().unwrap(), Value::Int(6));
}

#[test]
fn test_subtree_names_start_at_the_saved_node() {
    let recipe = quiche_loraine();
    let ingredients = recipe.child("ingredients").unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&to_json(&ingredients).unwrap()).unwrap();
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["ingredients", "ingredients.servings", "ingredients.milk"]
    );

    let loaded = from_json(&to_json(&ingredients).unwrap()).unwrap();
    assert!(loaded.parent().is_none());
    assert_eq!(loaded.child("servings").unwrap().value().unwrap(), Value::Int(4));
}

#[test]
fn test_save_and_load_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recipe.json");

    let recipe = quiche_loraine();
    save_json(&recipe, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, to_json_pretty(&recipe).unwrap());

    let loaded = load_json(&path).unwrap();
    assert_eq!(to_json(&loaded).unwrap(), to_json(&recipe).unwrap());

    assert!(matches!(
        load_json(dir.path().join("missing.json")),
        Err(ParamError::Io(_))
    ));
}

#[test]
fn test_pretty_output_parses_the_same() {
    let recipe = quiche_loraine();
    let pretty = to_json_pretty(&recipe).unwrap();
    let compact = to_json(&recipe).unwrap();
    assert!(pretty.contains('\n'));
    assert!(!compact.contains('\n'));

    let pretty: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    let compact: serde_json::Value = serde_json::from_str(&compact).unwrap();
    assert_eq!(pretty, compact);

    // types resolved through another registry are unknown to it
    let registry = TypeRegistry::new();
    assert!(matches!(
        to_json_with(&recipe, &JsonConfig::pretty(), &registry),
        Err(ParamError::UnknownType(_))
    ));
}

#[test]
fn test_malformed_snapshots_are_rejected() {
    let cases = [
        (r#"{"name": "root"}"#, "not an array"),
        ("[]", "empty"),
        (r#"[{"name": "a"}, {"name": "b"}]"#, "two roots"),
        (
            r#"[{"name": "a"}, {"name": "a.x", "value": "many", "type": "int"}]"#,
            "bad value",
        ),
        (
            r#"[{"name": "a"}, {"name": "a.x", "value": 1, "type": "no_such_type"}]"#,
            "unknown type",
        ),
        (
            r#"[{"name": "a"}, {"name": "a.x", "value": 1, "validator": "[0; 1]"}]"#,
            "bad interval",
        ),
        (
            r#"[{"name": "a"}, {"name": "a.x", "value": 1}, {"name": "a.x", "value": 2}]"#,
            "duplicate",
        ),
    ];
    for (json, label) in cases {
        assert!(from_json(json).is_err(), "{} should be rejected", label);
    }

    assert!(matches!(
        from_json(r#"[{"name": "a"}, {"name": "a.b.c", "value": 1}]"#),
        Err(ParamError::MissingParent { .. })
    ));
}

#[test]
fn test_read_only_formula_is_restored() {
    let json = r#"[
        {"name": "set"},
        {"name": "set.x", "value": 2},
        {"name": "set.double", "value": "= 2 * x", "type": "float", "editable": false,
         "validator": [4.0, 8.0]}
    ]"#;
    let set = from_json(json).unwrap();
    let double = set.child("double").unwrap();

    assert!(!double.is_editable());
    assert!(double.is_formula());
    assert_eq!(double.value().unwrap(), Value::Float(4.0));
    assert!(matches!(double.validator(), Some(Validator::Choices(_))));

    set.child("x").unwrap().set_value(3).unwrap();
    assert!(matches!(
        double.value(),
        Err(ParamError::ValidationError { .. })
    ));
}

struct DegreesCodec;

impl ValueCodec for DegreesCodec {
    fn encode(&self, value: &Value) -> serde_json::Value {
        serde_json::Value::String(format!("{}deg", value))
    }

    fn decode(&self, json: &serde_json::Value) -> Result<Value, String> {
        json.as_str()
            .and_then(|text| text.strip_suffix("deg"))
            .and_then(|number| number.parse::<f64>().ok())
            .map(Value::Float)
            .ok_or_else(|| format!("{} is not an angle", json))
    }
}

#[test]
fn test_codec_of_registered_type() {
    let mut registry = TypeRegistry::new();
    registry
        .register_type("angle", NativeType::Float, Some(Arc::new(DegreesCodec) as Arc<dyn ValueCodec>))
        .unwrap();

    let root = Node::new_group("root").unwrap();
    root.add_children_with([ChildDef::new("tilt").value(12.5).param_type("angle")], &registry)
        .unwrap();

    let json = to_json_with(&root, &JsonConfig::default(), &registry).unwrap();
    assert!(json.contains("\"12.5deg\""));

    let loaded = from_json_with(&json, &registry).unwrap();
    assert_eq!(loaded.child("tilt").unwrap().value().unwrap(), Value::Float(12.5));
    assert!(matches!(from_json(&json), Err(ParamError::UnknownType(_))));
}

#[test]
fn test_shared_registry_registration() {
    register_type("io_test_flag", NativeType::Bool, None).unwrap();
    assert!(matches!(
        register_type("io_test_flag", NativeType::Bool, None),
        Err(ParamError::DuplicateTag(_))
    ));

    let root = Node::new_group("root").unwrap();
    root.add_child_def(ChildDef::new("on").value("true").param_type("io_test_flag"))
        .unwrap();
    let loaded = from_json(&to_json(&root).unwrap()).unwrap();
    assert_eq!(loaded.child("on").unwrap().value().unwrap(), Value::Bool(true));
}

#[test]
fn test_binary_round_trip() {
    let recipe = quiche_loraine();
    recipe
        .add_child_def(
            ChildDef::new("cheese")
                .value("gruyere")
                .validator(ChoiceSet::new(["gruyere", "emmental"])),
        )
        .unwrap();
    let steps = recipe.add_child(Node::new_group("steps").unwrap()).unwrap();
    steps
        .add_column(
            ChildDef::new("minutes")
                .value(0)
                .param_type("int")
                .validator(Interval::new(0.0, 120.0).unwrap()),
        )
        .unwrap();
    steps.add_row("bake", [("minutes", 35)]).unwrap();

    let loaded = from_bytes(&to_bytes(&recipe).unwrap()).unwrap();
    assert_eq!(loaded.to_mapping().unwrap(), recipe.to_mapping().unwrap());

    let steps = loaded.child("steps").unwrap();
    assert_eq!(steps.column_count(), 1);
    assert!(steps.add_row("cool", [("minutes", 500)]).is_err());
    let rest = steps.add_row("rest", [("minutes", 10)]).unwrap();
    assert_eq!(rest.child("minutes").unwrap().value().unwrap(), Value::Int(10));
}

#[test]
fn test_bound_leaves_persist_their_current_value() {
    let root = Node::new_group("root").unwrap();
    root.add_child_def(ChildDef::new("clock").binding(Binding::new(|| Value::Int(7))))
        .unwrap();

    let loaded = from_bytes(&to_bytes(&root).unwrap()).unwrap();
    let clock = loaded.child("clock").unwrap();
    assert!(!clock.is_bound());
    assert!(!clock.is_editable());
    assert_eq!(clock.value().unwrap(), Value::Int(7));

    let table = root.add_child(Node::new_group("table").unwrap()).unwrap();
    table
        .add_column(ChildDef::new("cell").binding(Binding::new(|| Value::Int(0))))
        .unwrap();
    assert!(matches!(to_bytes(&root), Err(ParamError::Format(_))));
}

#[test]
fn test_non_finite_floats_survive_json() {
    let root = Node::new_group("limits").unwrap();
    root.add_children([
        ChildDef::new("upper").value(f64::INFINITY).param_type("float"),
        ChildDef::new("lower").value(f64::NEG_INFINITY),
        ChildDef::new("missing").value(f64::NAN),
        ChildDef::new("samples").value(Value::List(vec![Value::Float(f64::INFINITY), Value::Int(1)])),
    ])
    .unwrap();

    let json = to_json(&root).unwrap();
    assert!(!json.contains("\"value\":null"));

    let loaded = from_json(&json).unwrap();
    assert_eq!(loaded.child("upper").unwrap().value().unwrap(), Value::Float(f64::INFINITY));
    assert_eq!(
        loaded.child("lower").unwrap().value().unwrap(),
        Value::Float(f64::NEG_INFINITY)
    );
    assert!(loaded
        .child("missing")
        .unwrap()
        .value()
        .unwrap()
        .as_f64()
        .unwrap()
        .is_nan());
    assert_eq!(
        loaded.child("samples").unwrap().value().unwrap(),
        Value::List(vec![Value::Float(f64::INFINITY), Value::Int(1)])
    );
}
