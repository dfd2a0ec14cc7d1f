//! Tests for parameter leaves and formula evaluation

use approx::assert_relative_eq;
use paramtree::{Binding, ChildDef, EvalConfig, Interval, Node, ParamError, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::test_helpers::{init_test_logging, mechanics};

fn context(entries: &[(&str, Value)]) -> HashMap<String, Value> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn test_mechanics_values() {
    init_test_logging();

    let set = mechanics();
    assert_eq!(set.child("F").unwrap().value().unwrap(), Value::Float(10.0));
    assert_eq!(set.child("Sigma").unwrap().value().unwrap(), Value::Float(2.5));
    assert_eq!(set.child("l").unwrap().value().unwrap(), Value::Float(2.0));
}

#[test]
fn test_formulas_follow_their_inputs() {
    let set = mechanics();
    set.child("m").unwrap().set_value(7.5).unwrap();
    assert_relative_eq!(
        set.child("Sigma").unwrap().value().unwrap().as_f64().unwrap(),
        3.75
    );

    // replacing a formula by a literal stops the dependency
    set.child("F").unwrap().set_value(1.0).unwrap();
    assert!(!set.child("F").unwrap().is_formula());
    assert_relative_eq!(
        set.child("Sigma").unwrap().value().unwrap().as_f64().unwrap(),
        0.25
    );
}

#[test]
fn test_siblings_take_precedence_over_context() {
    let set = mechanics();
    let ext = set.child("extern").unwrap();

    assert!(matches!(
        ext.value(),
        Err(ParamError::UnresolvedVariable { ref name, .. }) if name == "x"
    ));

    let ctx = context(&[("x", Value::Int(2)), ("F", Value::Int(34))]);
    assert_eq!(ext.value_with(&ctx).unwrap(), Value::Float(42.0));
}

#[test]
fn test_dotted_variables_descend_into_sibling_groups() {
    let root = Node::new_group("root").unwrap();
    root.add_children([
        ChildDef::new("dims"),
        ChildDef::new("dims.width").value(3),
        ChildDef::new("dims.height").value(4),
        ChildDef::new("area").value("= dims.width * dims.height"),
        ChildDef::new("nested").value("= dims.depth"),
    ])
    .unwrap();

    assert_eq!(root.child("area").unwrap().value().unwrap(), Value::Int(12));
    assert_eq!(
        root.child("area").unwrap().variables(),
        vec!["dims.width", "dims.height"]
    );
    assert!(matches!(
        root.child("nested").unwrap().value(),
        Err(ParamError::UnresolvedVariable { .. })
    ));
}

#[test]
fn test_only_direct_siblings_resolve() {
    let root = Node::new_group("root").unwrap();
    root.add_children([
        ChildDef::new("k").value(1),
        ChildDef::new("inner"),
        ChildDef::new("inner.uses_outer").value("= k + 1"),
    ])
    .unwrap();

    let leaf = root.child("inner.uses_outer").unwrap();
    assert!(leaf.value().is_err());
    assert_eq!(
        leaf.value_with(&context(&[("k", Value::Int(10))])).unwrap(),
        Value::Int(11)
    );
}

#[test]
fn test_formula_result_is_coerced_and_validated_on_read() {
    let root = Node::new_group("root").unwrap();
    root.add_children([
        ChildDef::new("n").value(3),
        ChildDef::new("half")
            .value("= n / 2")
            .param_type("int"),
        ChildDef::new("limited")
            .value("= n * 10")
            .validator(Interval::new(0.0, 20.0).unwrap()),
    ])
    .unwrap();

    assert_eq!(root.child("half").unwrap().value().unwrap(), Value::Int(1));
    let limited = root.child("limited").unwrap();
    assert!(matches!(
        limited.value(),
        Err(ParamError::ValidationError { .. })
    ));
    assert!(!limited.is_valid());

    root.child("n").unwrap().set_value(2).unwrap();
    assert_eq!(limited.value().unwrap(), Value::Int(20));
    assert!(limited.is_valid());
}

#[test]
fn test_typed_leaf_rejects_without_mutation() {
    let root = Node::new_group("root").unwrap();
    let count = root
        .add_child_def(
            ChildDef::new("count")
                .value(5)
                .param_type("int")
                .validator(Interval::new(0.0, 10.0).unwrap()),
        )
        .unwrap();

    assert!(matches!(
        count.set_value("many"),
        Err(ParamError::TypeMismatch { .. })
    ));
    assert!(matches!(
        count.set_value(1e300),
        Err(ParamError::TypeMismatch { .. })
    ));
    assert!(matches!(
        count.set_value(11),
        Err(ParamError::ValidationError { .. })
    ));
    assert_eq!(count.value().unwrap(), Value::Int(5));

    count.set_value("7").unwrap();
    assert_eq!(count.value().unwrap(), Value::Int(7));
}

#[test]
fn test_self_reference() {
    let root = Node::new_group("root").unwrap();
    let x = root.add_child_def(ChildDef::new("x").value(1)).unwrap();

    assert!(matches!(
        x.set_value("= x * 2"),
        Err(ParamError::SelfReference(_))
    ));
    assert_eq!(x.value().unwrap(), Value::Int(1));

    assert!(matches!(
        root.add_child_def(ChildDef::new("y").value("= 1 + y")),
        Err(ParamError::SelfReference(_))
    ));
    assert!(!root.contains("y"));
}

#[test]
fn test_mutual_recursion_hits_the_depth_limit() {
    let root = Node::new_group("root").unwrap();
    root.add_children([
        ChildDef::new("a").value("= b + 1"),
        ChildDef::new("b").value("= a + 1"),
    ])
    .unwrap();

    let config = EvalConfig::default().with_max_depth(8);
    let result = root
        .child("a")
        .unwrap()
        .evaluate(&HashMap::<String, Value>::new(), &config);
    assert!(matches!(result, Err(ParamError::RecursionLimit(_, 8))));
}

#[test]
fn test_read_only_leaf() {
    let root = Node::new_group("root").unwrap();
    let fixed = root
        .add_child_def(ChildDef::new("fixed").value(3.0).editable(false))
        .unwrap();

    assert_eq!(fixed.value().unwrap(), Value::Float(3.0));
    assert!(!fixed.is_editable());
    assert!(matches!(
        fixed.set_value(4.0),
        Err(ParamError::NotEditable(_))
    ));
    assert!(fixed.is_valid_value(4.0));
}

#[test]
fn test_bound_leaf_reads_and_writes_through() {
    let store = Rc::new(RefCell::new(Value::from("blue")));
    let (read, write) = (store.clone(), store.clone());
    let binding = Binding::new(move || read.borrow().clone())
        .with_setter(move |value| *write.borrow_mut() = value);

    let root = Node::new_group("root").unwrap();
    let color = root
        .add_child_def(ChildDef::new("color").binding(binding).param_type("str"))
        .unwrap();

    assert!(color.is_bound());
    assert!(color.is_editable());
    assert_eq!(color.value().unwrap(), Value::from("blue"));

    color.set_value("red").unwrap();
    assert_eq!(*store.borrow(), Value::from("red"));

    *store.borrow_mut() = Value::from("green");
    assert_eq!(color.value().unwrap(), Value::from("green"));

    assert!(matches!(
        color.set_value("=other"),
        Err(ParamError::TypeMismatch { .. })
    ));
}

#[test]
fn test_read_only_binding() {
    let root = Node::new_group("root").unwrap();
    let clock = root
        .add_child_def(ChildDef::new("clock").binding(Binding::new(|| Value::Int(12))))
        .unwrap();

    assert!(!clock.is_editable());
    assert!(matches!(clock.set_value(1), Err(ParamError::NotEditable(_))));
    assert!(matches!(
        clock.set_editable(true),
        Err(ParamError::NotEditable(_))
    ));

    assert!(matches!(
        root.add_child_def(
            ChildDef::new("other")
                .binding(Binding::new(|| Value::Int(0)))
                .value(5)
        ),
        Err(ParamError::NotEditable(_))
    ));
}

#[test]
fn test_binding_getter_may_return_formula() {
    let root = Node::new_group("root").unwrap();
    root.add_children([
        ChildDef::new("base").value(20),
        ChildDef::new("derived").binding(Binding::new(|| Value::from("= base + 1"))),
    ])
    .unwrap();

    assert_eq!(root.child("derived").unwrap().value().unwrap(), Value::Int(21));
}

#[test]
fn test_formula_errors_surface_as_expression_errors() {
    let root = Node::new_group("root").unwrap();
    root.add_children([
        ChildDef::new("zero").value(0),
        ChildDef::new("broken").value("= 1 +"),
        ChildDef::new("div").value("= 1 / zero"),
    ])
    .unwrap();

    assert!(matches!(
        root.child("broken").unwrap().value(),
        Err(ParamError::Expression { .. })
    ));
    assert!(matches!(
        root.child("div").unwrap().value(),
        Err(ParamError::Expression { .. })
    ));
}

#[test]
fn test_group_scenario_square_root() {
    let root = Node::new_group("root").unwrap();
    root.add_children([
        ChildDef::new("x").value(-1.0),
        ChildDef::new("y").value(2.0),
        ChildDef::new("z").value("=(x+y)**0.5"),
    ])
    .unwrap();

    assert_relative_eq!(
        root.child("z").unwrap().value().unwrap().as_f64().unwrap(),
        1.0
    );
}

#[test]
fn test_overflowing_formula_is_an_error() {
    let root = Node::new_group("root").unwrap();
    root.add_children([
        ChildDef::new("low").value("= -9223372036854775807 - 1"),
        ChildDef::new("quotient").value("= low // -1"),
        ChildDef::new("remainder").value("= low % -1"),
    ])
    .unwrap();

    for name in ["quotient", "remainder"] {
        let leaf = root.child(name).unwrap();
        assert!(
            matches!(leaf.value(), Err(ParamError::Expression { .. })),
            "{} should fail with an overflow",
            name
        );
        assert!(!leaf.is_valid());
    }
    assert_eq!(root.child("low").unwrap().value().unwrap(), Value::Int(i64::MIN));
}
