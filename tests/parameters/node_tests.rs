//! Tests for the node hierarchy

use paramtree::parameters::name::{display_name, validate_name};
use paramtree::{ChildDef, Node, NodeEvent, ParamError};
use std::cell::RefCell;
use std::rc::Rc;

use crate::test_helpers::init_test_logging;

fn tree() -> Node {
    let root = Node::new_group("root").unwrap();
    root.add_children([
        ChildDef::new("a"),
        ChildDef::new("a.b"),
        ChildDef::new("a.b.leaf").value(1),
        ChildDef::new("c").value(2.5),
    ])
    .unwrap();
    root
}

#[test]
fn test_name_normalization() {
    for name in ["foo bar", "x", "with  two spaces", "üäö@€$?"] {
        let stored = validate_name(name).unwrap();
        assert!(!stored.contains(' '));
        assert_eq!(display_name(&stored), name);

        let node = Node::new_group(name).unwrap();
        assert_eq!(node.name(), stored);
        assert_eq!(node.display_name(), name);
    }

    assert!(matches!(Node::new_group(""), Err(ParamError::InvalidName(_))));
    assert!(matches!(
        Node::new_parameter("a.b", 1),
        Err(ParamError::InvalidName(_))
    ));
}

#[test]
fn test_absolute_and_relative_names() {
    let root = tree();
    for node in root.iter_children(true) {
        assert_eq!(
            node.absolute_name(),
            format!("{}.{}", root.name(), node.relative_name(&root).unwrap())
        );
    }
    assert_eq!(root.absolute_name(), "root");

    let leaf = root.child("a.b.leaf").unwrap();
    let a = root.child("a").unwrap();
    assert_eq!(leaf.relative_name(&a).unwrap(), "b.leaf");
    assert!(matches!(
        a.relative_name(&leaf),
        Err(ParamError::NotAncestor { .. })
    ));
}

#[test]
fn test_name_conflict_keeps_existing_sibling() {
    let root = tree();
    let existing = root.child("c").unwrap();

    let result = root.add_child(Node::new_parameter("c", 99).unwrap());
    assert!(matches!(result, Err(ParamError::NameConflict { .. })));
    assert!(root.child("c").unwrap().ptr_eq(&existing));
    assert_eq!(existing.value().unwrap().as_f64(), Some(2.5));
    assert_eq!(root.child_count(false), 2);
}

#[test]
fn test_leaves_cannot_have_children() {
    let root = tree();
    let c = root.child("c").unwrap();
    assert!(matches!(
        c.add_child(Node::new_group("x").unwrap()),
        Err(ParamError::NotAGroup(_))
    ));
    assert!(matches!(c.child("x"), Err(ParamError::NotFound(_))));
}

#[test]
fn test_selectors() {
    let root = tree();
    assert_eq!(root.child(1).unwrap().name(), "c");
    assert_eq!(root.child("a.b.leaf").unwrap().name(), "leaf");
    let path = String::from("a.b");
    assert_eq!(root.child(&path).unwrap().name(), "b");

    assert!(matches!(root.child("a.x"), Err(ParamError::NotFound(_))));
    assert!(matches!(root.child(7), Err(ParamError::NotFound(_))));
    assert!(root.contains("a.b"));
    assert!(!root.contains("b"));
}

#[test]
fn test_iteration_is_fresh_each_call() {
    let root = tree();
    let first: Vec<String> = root.iter_children(true).map(|n| n.absolute_name()).collect();
    let second: Vec<String> = root.iter_children(true).map(|n| n.absolute_name()).collect();
    assert_eq!(first, second);
    assert_eq!(first, vec!["root.a", "root.a.b", "root.a.b.leaf", "root.c"]);

    let mut lazy = root.iter_children(true);
    assert_eq!(lazy.next().unwrap().name(), "a");
}

#[test]
fn test_remove_discards_subtree() {
    let root = tree();
    let b = root.child("a.b").unwrap();
    root.remove_child("a").unwrap();

    assert!(!root.contains("a"));
    assert_eq!(root.child_count(true), 1);
    // nothing keeps the removed group alive
    assert!(b.parent().is_none());
    assert_eq!(b.absolute_name(), "b");
}

#[test]
fn test_root_index_and_siblings() {
    let root = tree();
    let leaf = root.child("a.b.leaf").unwrap();
    assert!(leaf.root().ptr_eq(&root));
    assert_eq!(root.child("c").unwrap().index(), Some(1));
    assert_eq!(root.index(), None);

    let c = root.child("c").unwrap();
    let siblings = c.siblings();
    assert_eq!(siblings.len(), 1);
    assert_eq!(siblings[0].name(), "a");
    assert!(c.sibling("c").is_none());
}

#[test]
fn test_change_notification() {
    init_test_logging();

    let root = Node::new_group("root").unwrap();
    let other = Node::new_group("other").unwrap();
    let child = Node::new_group("child").unwrap();
    let events: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let sink = events.clone();
    root.subscribe(move |event| {
        if let NodeEvent::ChildAdded(node) = event {
            sink.borrow_mut().push(format!("root added {}", node.name()));
        } else if let NodeEvent::ChildRemoved = event {
            sink.borrow_mut().push("root removed".to_string());
        }
    });
    let sink = events.clone();
    child.subscribe(move |event| match event {
        NodeEvent::ParentChanged { old, new } => sink.borrow_mut().push(format!(
            "child moved {:?} -> {:?}",
            old.as_ref().map(Node::name),
            new.as_ref().map(Node::name)
        )),
        NodeEvent::NameChanged { old, new } => {
            sink.borrow_mut().push(format!("child renamed {} -> {}", old, new))
        }
        _ => {}
    });

    root.add_child(child.clone()).unwrap();
    child.set_name("kid").unwrap();
    other.add_child(child.clone()).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            "root added child",
            "child moved None -> Some(\"root\")",
            "child renamed child -> kid",
            "root removed",
            "child moved Some(\"root\") -> Some(\"other\")",
        ]
    );
}

#[test]
fn test_failed_mutation_emits_nothing() {
    let root = tree();
    let count = Rc::new(RefCell::new(0));
    let sink = count.clone();
    root.subscribe(move |_| *sink.borrow_mut() += 1);

    assert!(root.add_child(Node::new_group("a").unwrap()).is_err());
    assert!(root.remove_child("missing").is_err());
    assert_eq!(*count.borrow(), 0);
}

#[test]
fn test_adding_to_current_parent_is_a_no_op() {
    let root = tree();
    let count = Rc::new(RefCell::new(0));
    let sink = count.clone();
    root.subscribe(move |_| *sink.borrow_mut() += 1);

    let a = root.child("a").unwrap();
    let again = root.add_child(a.clone()).unwrap();

    assert!(again.ptr_eq(&a));
    assert_eq!(a.index(), Some(0));
    assert_eq!(root.child_count(false), 2);
    assert_eq!(*count.borrow(), 0);
}
