//! Structural equality of object subtrees

use std::hash::{Hash, Hasher};

use super::{ObjectId, ObjectKind, Slot, XTree};

/// An object viewed through its tree, compared by value
///
/// Two refs are equal when their owned subtrees have the same shape, names,
/// types and values. Reference slots compare by target identity. Parents and
/// spans are ignored.
#[derive(Debug, Clone, Copy)]
pub struct ObjectRef<'t> {
    tree: &'t XTree,
    id: ObjectId,
}

impl<'t> ObjectRef<'t> {
    /// View `id` in `tree`
    pub fn new(tree: &'t XTree, id: ObjectId) -> Self {
        Self { tree, id }
    }

    /// The viewed object
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

/// Compare one node's own data, pushing owned pairs to `pending`
fn shallow_eq(
    left: &ObjectKind,
    right: &ObjectKind,
    pending: &mut Vec<(ObjectId, ObjectId)>,
) -> bool {
    use ObjectKind::*;
    let (a, b) = match (left, right) {
        (
            Simple {
                type_name: t1,
                value: v1,
            },
            Simple {
                type_name: t2,
                value: v2,
            },
        ) => return t1 == t2 && v1 == v2,
        (Complex { type_name: t1, .. }, Complex { type_name: t2, .. }) if t1 != t2 => {
            return false
        }
        (Attribute { name: n1, slot: s1 }, Attribute { name: n2, slot: s2 }) if n1 == n2 => {
            return slot_eq(s1, s2, pending)
        }
        (Element { name: n1, slot: s1 }, Element { name: n2, slot: s2 }) if n1 == n2 => {
            return slot_eq(s1, s2, pending)
        }
        (Complex { attributes: a1, children: c1, .. }, Complex { attributes: a2, children: c2, .. }) => {
            if a1.is_some() != a2.is_some() || c1.is_some() != c2.is_some() {
                return false;
            }
            (left.owned(), right.owned())
        }
        (AttributeSet { .. }, AttributeSet { .. }) => (left.owned(), right.owned()),
        (ChildSet { member_name: m1, .. }, ChildSet { member_name: m2, .. })
        | (ChildList { member_name: m1, .. }, ChildList { member_name: m2, .. })
            if m1 == m2 =>
        {
            (left.owned(), right.owned())
        }
        _ => return false,
    };
    if a.len() != b.len() {
        return false;
    }
    pending.extend(a.into_iter().zip(b));
    true
}

fn slot_eq(left: &Slot, right: &Slot, pending: &mut Vec<(ObjectId, ObjectId)>) -> bool {
    match (left, right) {
        (Slot::Direct(None), Slot::Direct(None)) => true,
        (Slot::Direct(Some(a)), Slot::Direct(Some(b))) => {
            pending.push((*a, *b));
            true
        }
        (Slot::Reference(a), Slot::Reference(b)) => a == b,
        _ => false,
    }
}

impl PartialEq for ObjectRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self.id, other.id)];
        while let Some((a, b)) = pending.pop() {
            if std::ptr::eq(self.tree, other.tree) && a == b {
                continue;
            }
            let (Ok(left), Ok(right)) = (self.tree.get(a), other.tree.get(b)) else {
                return false;
            };
            if !shallow_eq(left, right, &mut pending) {
                return false;
            }
        }
        true
    }
}

impl Eq for ObjectRef<'_> {}

impl Hash for ObjectRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            let Ok(kind) = self.tree.get(id) else {
                continue;
            };
            std::mem::discriminant(kind).hash(state);
            match kind {
                ObjectKind::Simple { type_name, value } => {
                    type_name.hash(state);
                    value.hash(state);
                }
                ObjectKind::Complex { type_name, .. } => type_name.hash(state),
                ObjectKind::Attribute { name, slot } => {
                    name.hash(state);
                    if let Slot::Reference(target) = slot {
                        target.hash(state);
                    }
                }
                ObjectKind::Element { name, slot } => {
                    name.hash(state);
                    if let Slot::Reference(target) = slot {
                        target.hash(state);
                    }
                }
                ObjectKind::ChildSet { member_name, .. }
                | ObjectKind::ChildList { member_name, .. } => member_name.hash(state),
                ObjectKind::AttributeSet { .. } => {}
            }
            let owned = kind.owned();
            owned.len().hash(state);
            stack.extend(owned.into_iter().rev());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::FullName;
    use crate::values::{AtomicValue, SimpleValue};
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(r: ObjectRef<'_>) -> u64 {
        let mut hasher = DefaultHasher::new();
        r.hash(&mut hasher);
        hasher.finish()
    }

    fn person(tree: &mut XTree, name: &str) -> ObjectId {
        let complex = tree.new_complex(Some(FullName::new("urn:a", "Person")));
        let set = tree.new_attribute_set();
        let attribute = tree.new_attribute("name");
        let value = tree.new_simple(
            None,
            SimpleValue::Atomic(AtomicValue::String(name.to_string())),
        );
        tree.set_value(attribute, Some(value)).unwrap();
        tree.add_attribute(set, attribute).unwrap();
        tree.set_attributes(complex, set).unwrap();
        complex
    }

    #[test]
    fn test_equal_by_value() {
        let mut tree = XTree::new();
        let a = person(&mut tree, "Tank");
        let b = person(&mut tree, "Tank");
        let c = person(&mut tree, "Mike");
        assert_ne!(a, b);
        assert_eq!(ObjectRef::new(&tree, a), ObjectRef::new(&tree, b));
        assert_eq!(
            hash_of(ObjectRef::new(&tree, a)),
            hash_of(ObjectRef::new(&tree, b))
        );
        assert_ne!(ObjectRef::new(&tree, a), ObjectRef::new(&tree, c));
    }

    #[test]
    fn test_references_compare_by_target() {
        let mut tree = XTree::new();
        let first = tree.new_element(FullName::local("g1"));
        let second = tree.new_element(FullName::local("g1"));
        let x = tree.new_element(FullName::local("e"));
        let y = tree.new_element(FullName::local("e"));
        let z = tree.new_element(FullName::local("e"));
        tree.set_reference(x, first).unwrap();
        tree.set_reference(y, first).unwrap();
        tree.set_reference(z, second).unwrap();
        assert_eq!(ObjectRef::new(&tree, x), ObjectRef::new(&tree, y));
        assert_ne!(ObjectRef::new(&tree, x), ObjectRef::new(&tree, z));
    }

    #[test]
    fn test_clone_is_equal_and_independent() {
        let mut tree = XTree::new();
        let list = tree.new_child_list(Some("people"));
        let other = tree.new_child_list(Some("people"));
        let element = tree.new_element(FullName::local("p"));
        let value = person(&mut tree, "Tank");
        tree.set_value(element, Some(value)).unwrap();
        tree.add_child(list, element).unwrap();
        let clone = tree.add_child(other, element).unwrap();

        assert_eq!(ObjectRef::new(&tree, list), ObjectRef::new(&tree, other));

        let cloned_person = tree.value_of(clone).unwrap().unwrap();
        let attribute = tree.find_attribute(cloned_person, "name").unwrap().unwrap();
        let renamed = tree.new_simple(
            None,
            SimpleValue::Atomic(AtomicValue::String("Mike".to_string())),
        );
        tree.set_value(attribute, Some(renamed)).unwrap();

        assert_ne!(ObjectRef::new(&tree, list), ObjectRef::new(&tree, other));
        let original = tree.find_attribute(value, "name").unwrap().unwrap();
        let text = tree.value_of(original).unwrap().unwrap();
        assert!(matches!(
            tree.get(text).unwrap(),
            ObjectKind::Simple { value: SimpleValue::Atomic(AtomicValue::String(s)), .. } if s == "Tank"
        ));
    }
}
