//! Object tree integration tests
//!
//! Ownership (attach, clone on reattach, cycle rejection), references and
//! value equality of runtime objects.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use sdata::error::Error;
use sdata::namespaces::FullName;
use sdata::objects::{ObjectId, ObjectKind, ObjectRef, XTree};
use sdata::values::{AtomicValue, SimpleValue};

fn text(tree: &mut XTree, value: &str) -> ObjectId {
    tree.new_simple(None, SimpleValue::Atomic(AtomicValue::String(value.to_string())))
}

/// A complex object with one `name` attribute
fn named(tree: &mut XTree, name: &str) -> ObjectId {
    let complex = tree.new_complex(None);
    let set = tree.new_attribute_set();
    let attribute = tree.new_attribute("name");
    let value = text(tree, name);
    tree.set_value(attribute, Some(value)).unwrap();
    tree.add_attribute(set, attribute).unwrap();
    tree.set_attributes(complex, set).unwrap();
    complex
}

fn string_value(tree: &XTree, holder: ObjectId) -> String {
    let value = tree.value_of(holder).unwrap().unwrap();
    match tree.get(value).unwrap() {
        ObjectKind::Simple {
            value: SimpleValue::Atomic(AtomicValue::String(s)),
            ..
        } => s.clone(),
        other => panic!("unexpected object {:?}", other),
    }
}

/// Build a chain of nested child sets; returns them root first
fn nested_sets(tree: &mut XTree, depth: usize) -> Vec<ObjectId> {
    let mut sets = vec![tree.new_child_set(None)];
    for _ in 0..depth {
        let child = tree.new_child_set(Some("inner"));
        let parent = *sets.last().unwrap();
        tree.add_child(parent, child).unwrap();
        sets.push(child);
    }
    sets
}

// ============================================================================
// Ownership
// ============================================================================

#[test]
fn test_clone_on_share() {
    let mut tree = XTree::new();
    let first = tree.new_child_set(None);
    let second = tree.new_child_set(None);

    let element = tree.new_element(FullName::local("Person"));
    let person = named(&mut tree, "Tank");
    tree.set_value(element, Some(person)).unwrap();
    tree.add_child(first, element).unwrap();

    let shared = tree.add_child(second, element).unwrap();
    assert_ne!(shared, element);
    assert_eq!(ObjectRef::new(&tree, shared), ObjectRef::new(&tree, element));
    assert_eq!(tree.items(first).unwrap(), vec![element]);
    assert_eq!(tree.items(second).unwrap(), vec![shared]);

    let cloned_person = tree.value_of(shared).unwrap().unwrap();
    let cloned_name = tree.find_attribute(cloned_person, "name").unwrap().unwrap();
    let renamed = text(&mut tree, "Mike");
    tree.set_value(cloned_name, Some(renamed)).unwrap();

    let original_name = tree.find_attribute(person, "name").unwrap().unwrap();
    assert_eq!(string_value(&tree, original_name), "Tank");
    assert_eq!(string_value(&tree, cloned_name), "Mike");
    assert_ne!(ObjectRef::new(&tree, shared), ObjectRef::new(&tree, element));
}

#[test]
fn test_clone_keeps_references() {
    let mut tree = XTree::new();
    let global = tree.new_element(FullName::new("urn:a", "Shared"));
    let first = tree.new_child_set(None);
    let second = tree.new_child_set(None);
    let local = tree.new_element(FullName::new("urn:a", "Shared"));
    tree.set_reference(local, global).unwrap();
    tree.add_child(first, local).unwrap();

    let clone = tree.add_child(second, local).unwrap();
    assert_eq!(tree.effective(clone).unwrap(), global);
}

#[test]
fn test_reattaching_moves_unparented_value() {
    let mut tree = XTree::new();
    let complex = tree.new_complex(None);
    let set = tree.new_child_set(None);
    let attached = tree.set_children(complex, set).unwrap();
    assert_eq!(attached, set);
    assert_eq!(tree.parent(set), Some(complex));
    assert_eq!(tree.depth(set), 1);
}

#[test]
fn test_circular_attach_is_rejected() {
    let mut tree = XTree::new();
    let sets = nested_sets(&mut tree, 3);
    let root = sets[0];
    let leaf = sets[3];
    let err = tree.add_child(leaf, root).unwrap_err();
    assert!(matches!(err, Error::CircularReference(_)), "{}", err);
    assert_eq!(tree.items(leaf).unwrap(), Vec::<ObjectId>::new());
    assert_eq!(tree.parent(root), None);
}

#[test]
fn test_wrong_container_kind() {
    let mut tree = XTree::new();
    let list = tree.new_child_list(Some("items"));
    let nested = tree.new_child_list(Some("nested"));
    assert!(matches!(
        tree.add_child(list, nested),
        Err(Error::InvalidOperation(_))
    ));
    let simple = text(&mut tree, "x");
    assert!(matches!(
        tree.add_child(simple, list),
        Err(Error::InvalidObject(_))
    ));
}

proptest! {
    #[test]
    fn prop_any_ancestor_attach_is_rejected(depth in 1usize..40, pick in 0usize..40) {
        let mut tree = XTree::new();
        let sets = nested_sets(&mut tree, depth);
        let ancestor = sets[pick % depth];
        let leaf = *sets.last().unwrap();
        let result = tree.add_child(leaf, ancestor);
        prop_assert!(matches!(result, Err(Error::CircularReference(_))));
        prop_assert_eq!(tree.depth(leaf), depth);
    }

    #[test]
    fn prop_equality_is_reflexive_and_symmetric(values in proptest::collection::vec("[a-z]{0,6}", 0..6)) {
        let mut tree = XTree::new();
        let left = tree.new_child_list(Some("names"));
        let right = tree.new_child_list(Some("names"));
        for value in &values {
            for list in [left, right] {
                let element = tree.new_element(FullName::local("name"));
                let simple = text(&mut tree, value);
                tree.set_value(element, Some(simple)).unwrap();
                tree.add_child(list, element).unwrap();
            }
        }
        let l = ObjectRef::new(&tree, left);
        let r = ObjectRef::new(&tree, right);
        prop_assert!(l == l);
        prop_assert!(l == r);
        prop_assert!(r == l);
    }
}

// ============================================================================
// References
// ============================================================================

#[test]
fn test_reference_chain() {
    let mut tree = XTree::new();
    let holders: Vec<ObjectId> = (0..4).map(|_| tree.new_attribute("code")).collect();
    for pair in holders.windows(2) {
        tree.set_reference(pair[0], pair[1]).unwrap();
    }
    let value = text(&mut tree, "X1");
    tree.set_value(holders[0], Some(value)).unwrap();

    assert_eq!(tree.effective(holders[0]).unwrap(), holders[3]);
    assert_eq!(tree.reference_depth(holders[0]).unwrap(), 3);
    assert_eq!(string_value(&tree, holders[3]), "X1");
    assert_eq!(tree.parent(value), Some(holders[3]));

    let err = tree.set_reference(holders[3], holders[0]).unwrap_err();
    assert!(matches!(err, Error::CircularReference(_)));
}

#[test]
fn test_null_values() {
    let mut tree = XTree::new();
    let element = tree.new_element(FullName::local("e"));
    assert_eq!(tree.value_of(element).unwrap(), None);

    let value = text(&mut tree, "v");
    tree.set_value(element, Some(value)).unwrap();
    tree.set_value(element, None).unwrap();
    assert_eq!(tree.value_of(element).unwrap(), None);
    assert_eq!(tree.parent(value), None);
}

// ============================================================================
// Value equality
// ============================================================================

#[test]
fn test_simple_value_equality() {
    let mut tree = XTree::new();
    let a = tree.new_simple(
        None,
        SimpleValue::List(vec![
            SimpleValue::Atomic(AtomicValue::Int32(1)),
            SimpleValue::Atomic(AtomicValue::Int32(2)),
        ]),
    );
    let b = tree.new_simple(
        None,
        SimpleValue::List(vec![
            SimpleValue::Atomic(AtomicValue::Int32(1)),
            SimpleValue::Atomic(AtomicValue::Int32(2)),
        ]),
    );
    let c = tree.new_simple(None, SimpleValue::Atomic(AtomicValue::Binary(vec![1, 2])));
    let d = tree.new_simple(None, SimpleValue::Atomic(AtomicValue::Binary(vec![1, 2])));
    let typed = tree.new_simple(
        Some(FullName::new("urn:a", "Bytes")),
        SimpleValue::Atomic(AtomicValue::Binary(vec![1, 2])),
    );

    assert_eq!(ObjectRef::new(&tree, a), ObjectRef::new(&tree, b));
    assert_eq!(ObjectRef::new(&tree, c), ObjectRef::new(&tree, d));
    assert_ne!(ObjectRef::new(&tree, c), ObjectRef::new(&tree, typed));
    assert_ne!(ObjectRef::new(&tree, a), ObjectRef::new(&tree, c));
}
