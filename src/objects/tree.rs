//! Object arena and ownership operations

use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::{ObjectId, ObjectKind, Slot};
use crate::diagnostics::TextSpan;
use crate::error::{Error, Result};
use crate::namespaces::FullName;
use crate::values::SimpleValue;

#[derive(Debug, Clone)]
struct Node {
    parent: Option<ObjectId>,
    kind: ObjectKind,
    span: Option<TextSpan>,
}

/// An arena of runtime objects
///
/// Ids are only meaningful for the tree that issued them. Objects are never
/// freed individually; detached objects stay in the arena.
#[derive(Debug, Clone, Default)]
pub struct XTree {
    nodes: Vec<Node>,
}

impl XTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects ever created
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no object was created
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            kind,
            span: None,
        });
        id
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a simple object
    pub fn new_simple(&mut self, type_name: Option<FullName>, value: SimpleValue) -> ObjectId {
        self.push(ObjectKind::Simple { type_name, value })
    }

    /// Create a complex object without attributes or children
    pub fn new_complex(&mut self, type_name: Option<FullName>) -> ObjectId {
        self.push(ObjectKind::Complex {
            type_name,
            attributes: None,
            children: None,
        })
    }

    /// Create an attribute holding a null value
    pub fn new_attribute(&mut self, name: impl Into<String>) -> ObjectId {
        self.push(ObjectKind::Attribute {
            name: name.into(),
            slot: Slot::default(),
        })
    }

    /// Create an element holding a null value
    pub fn new_element(&mut self, name: FullName) -> ObjectId {
        self.push(ObjectKind::Element {
            name,
            slot: Slot::default(),
        })
    }

    /// Create an empty attribute set
    pub fn new_attribute_set(&mut self) -> ObjectId {
        self.push(ObjectKind::AttributeSet {
            attributes: Vec::new(),
        })
    }

    /// Create an empty child set
    pub fn new_child_set(&mut self, member_name: Option<&str>) -> ObjectId {
        self.push(ObjectKind::ChildSet {
            member_name: member_name.map(str::to_string),
            children: Vec::new(),
        })
    }

    /// Create an empty child list
    pub fn new_child_list(&mut self, member_name: Option<&str>) -> ObjectId {
        self.push(ObjectKind::ChildList {
            member_name: member_name.map(str::to_string),
            items: Vec::new(),
        })
    }

    /// Attach a source span to an object
    pub fn set_span(&mut self, id: ObjectId, span: TextSpan) -> Result<()> {
        self.node_mut(id)?.span = Some(span);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    fn node(&self, id: ObjectId) -> Result<&Node> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| Error::InvalidObject(format!("unknown object {}", id)))
    }

    fn node_mut(&mut self, id: ObjectId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| Error::InvalidObject(format!("unknown object {}", id)))
    }

    /// Get an object
    pub fn get(&self, id: ObjectId) -> Result<&ObjectKind> {
        Ok(&self.node(id)?.kind)
    }

    /// Parent of an object
    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    /// Source span of an object
    pub fn span(&self, id: ObjectId) -> Option<&TextSpan> {
        self.nodes.get(id.index()).and_then(|n| n.span.as_ref())
    }

    /// Ancestors of an object, nearest first
    pub fn ancestors(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Number of ancestors
    pub fn depth(&self, id: ObjectId) -> usize {
        self.ancestors(id).count()
    }

    /// Attributes of a complex object, in order
    pub fn attributes(&self, complex: ObjectId) -> Result<Vec<ObjectId>> {
        match self.get(complex)? {
            ObjectKind::Complex {
                attributes: Some(set),
                ..
            } => self.items(*set),
            ObjectKind::Complex { .. } => Ok(Vec::new()),
            other => Err(wrong_kind(complex, "complex", other)),
        }
    }

    /// Members of a container object, in order
    pub fn items(&self, container: ObjectId) -> Result<Vec<ObjectId>> {
        match self.get(container)? {
            ObjectKind::AttributeSet { attributes } => Ok(attributes.clone()),
            ObjectKind::ChildSet { children, .. } => Ok(children.clone()),
            ObjectKind::ChildList { items, .. } => Ok(items.clone()),
            other => Err(wrong_kind(container, "container", other)),
        }
    }

    /// Find an attribute of a complex object by name
    pub fn find_attribute(&self, complex: ObjectId, name: &str) -> Result<Option<ObjectId>> {
        for attribute in self.attributes(complex)? {
            if let ObjectKind::Attribute { name: n, .. } = self.get(attribute)? {
                if n == name {
                    return Ok(Some(attribute));
                }
            }
        }
        Ok(None)
    }

    // -------------------------------------------------------------------------
    // Ownership
    // -------------------------------------------------------------------------

    /// Make `child` (or a clone of it) a child of `parent`
    ///
    /// An unparented `child` is moved under `parent` and returned. A parented
    /// one is deep-cloned and the clone is returned; the original stays where
    /// it was. Fails if `child` is `parent` or one of its ancestors.
    ///
    /// This only sets the parent link; the container mutators below call it
    /// and store the returned id.
    pub fn set_parent(&mut self, child: ObjectId, parent: ObjectId) -> Result<ObjectId> {
        self.node(child)?;
        self.node(parent)?;
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child {
                return Err(Error::CircularReference(format!(
                    "object {} is an ancestor of {}",
                    child, parent
                )));
            }
            current = self.parent(id);
        }

        let attached = if self.parent(child).is_some() {
            let clone = self.clone_subtree(child)?;
            trace!(original = %child, clone = %clone, "cloned parented object");
            clone
        } else {
            child
        };
        self.node_mut(attached)?.parent = Some(parent);
        Ok(attached)
    }

    fn detach(&mut self, id: Option<ObjectId>) -> Result<()> {
        if let Some(id) = id {
            self.node_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Deep-clone an owned subtree; references are kept as they are
    fn clone_subtree(&mut self, root: ObjectId) -> Result<ObjectId> {
        let mut order = vec![root];
        let mut index = 0;
        while index < order.len() {
            let owned = self.get(order[index])?.owned();
            order.extend(owned);
            index += 1;
        }

        let base = self.nodes.len() as u32;
        let mapping: HashMap<ObjectId, ObjectId> = order
            .iter()
            .enumerate()
            .map(|(i, old)| (*old, ObjectId(base + i as u32)))
            .collect();

        for old in &order {
            let mut node = self.node(*old)?.clone();
            node.parent = if *old == root {
                None
            } else {
                node.parent.and_then(|p| mapping.get(&p).copied())
            };
            node.kind
                .remap_owned(|id| mapping.get(&id).copied().unwrap_or(id));
            self.nodes.push(node);
        }
        Ok(ObjectId(base))
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Set the attribute set of a complex object
    pub fn set_attributes(&mut self, complex: ObjectId, set: ObjectId) -> Result<ObjectId> {
        expect_kind(self, set, "attribute set", |k| {
            matches!(k, ObjectKind::AttributeSet { .. })
        })?;
        let old = match self.get(complex)? {
            ObjectKind::Complex { attributes, .. } => *attributes,
            other => return Err(wrong_kind(complex, "complex", other)),
        };
        if old == Some(set) {
            return Ok(set);
        }
        let attached = self.set_parent(set, complex)?;
        if old != Some(attached) {
            self.detach(old)?;
        }
        if let ObjectKind::Complex { attributes, .. } = &mut self.node_mut(complex)?.kind {
            *attributes = Some(attached);
        }
        Ok(attached)
    }

    /// Set the children of a complex object: a child set, or a simple object
    /// for simple content
    pub fn set_children(&mut self, complex: ObjectId, children: ObjectId) -> Result<ObjectId> {
        expect_kind(self, children, "child set or simple", |k| {
            matches!(k, ObjectKind::ChildSet { .. } | ObjectKind::Simple { .. })
        })?;
        let old = match self.get(complex)? {
            ObjectKind::Complex { children, .. } => *children,
            other => return Err(wrong_kind(complex, "complex", other)),
        };
        if old == Some(children) {
            return Ok(children);
        }
        let attached = self.set_parent(children, complex)?;
        if old != Some(attached) {
            self.detach(old)?;
        }
        if let ObjectKind::Complex { children: slot, .. } = &mut self.node_mut(complex)?.kind {
            *slot = Some(attached);
        }
        Ok(attached)
    }

    /// Append an attribute to an attribute set
    ///
    /// Attribute names are unique within a set.
    pub fn add_attribute(&mut self, set: ObjectId, attribute: ObjectId) -> Result<ObjectId> {
        let name = match self.get(attribute)? {
            ObjectKind::Attribute { name, .. } => name.clone(),
            other => return Err(wrong_kind(attribute, "attribute", other)),
        };
        let existing = match self.get(set)? {
            ObjectKind::AttributeSet { attributes } => attributes.clone(),
            other => return Err(wrong_kind(set, "attribute set", other)),
        };
        for id in existing {
            if matches!(self.get(id)?, ObjectKind::Attribute { name: n, .. } if *n == name) {
                return Err(Error::InvalidOperation(format!(
                    "attribute '{}' already exists in {}",
                    name, set
                )));
            }
        }
        let attached = self.set_parent(attribute, set)?;
        if let ObjectKind::AttributeSet { attributes } = &mut self.node_mut(set)?.kind {
            attributes.push(attached);
        }
        Ok(attached)
    }

    /// Append a child to a child set (element, set or list) or to a child
    /// list (element or set)
    pub fn add_child(&mut self, container: ObjectId, child: ObjectId) -> Result<ObjectId> {
        let child_kind = self.get(child)?;
        let accepted = match self.get(container)? {
            ObjectKind::ChildSet { .. } => matches!(
                child_kind,
                ObjectKind::Element { .. } | ObjectKind::ChildSet { .. } | ObjectKind::ChildList { .. }
            ),
            ObjectKind::ChildList { .. } => matches!(
                child_kind,
                ObjectKind::Element { .. } | ObjectKind::ChildSet { .. }
            ),
            other => return Err(wrong_kind(container, "child set or list", other)),
        };
        if !accepted {
            return Err(Error::InvalidOperation(format!(
                "{} object {} cannot be a child of {}",
                child_kind.kind_name(),
                child,
                container
            )));
        }
        let attached = self.set_parent(child, container)?;
        match &mut self.node_mut(container)?.kind {
            ObjectKind::ChildSet { children, .. } => children.push(attached),
            ObjectKind::ChildList { items, .. } => items.push(attached),
            _ => {}
        }
        Ok(attached)
    }

    // -------------------------------------------------------------------------
    // Slots
    // -------------------------------------------------------------------------

    fn slot(&self, holder: ObjectId) -> Result<Slot> {
        match self.get(holder)? {
            ObjectKind::Attribute { slot, .. } | ObjectKind::Element { slot, .. } => Ok(*slot),
            other => Err(wrong_kind(holder, "attribute or element", other)),
        }
    }

    fn set_slot(&mut self, holder: ObjectId, new: Slot) -> Result<()> {
        match &mut self.node_mut(holder)?.kind {
            ObjectKind::Attribute { slot, .. } | ObjectKind::Element { slot, .. } => {
                *slot = new;
                Ok(())
            }
            other => Err(wrong_kind(holder, "attribute or element", other)),
        }
    }

    /// The instance at the end of the reference chain of an attribute or
    /// element
    pub fn effective(&self, holder: ObjectId) -> Result<ObjectId> {
        let mut visited = HashSet::new();
        let mut current = holder;
        loop {
            if !visited.insert(current) {
                return Err(Error::CircularReference(format!(
                    "reference chain of {} loops at {}",
                    holder, current
                )));
            }
            match self.slot(current)? {
                Slot::Direct(_) => return Ok(current),
                Slot::Reference(target) => current = target,
            }
        }
    }

    /// Number of references followed to reach the effective instance
    pub fn reference_depth(&self, holder: ObjectId) -> Result<usize> {
        let effective = self.effective(holder)?;
        let mut depth = 0;
        let mut current = holder;
        while current != effective {
            if let Slot::Reference(target) = self.slot(current)? {
                current = target;
            }
            depth += 1;
        }
        Ok(depth)
    }

    /// Value of an attribute or element, read through references
    pub fn value_of(&self, holder: ObjectId) -> Result<Option<ObjectId>> {
        match self.slot(self.effective(holder)?)? {
            Slot::Direct(value) => Ok(value),
            Slot::Reference(_) => Ok(None),
        }
    }

    /// Set the value of an attribute or element, written through references
    ///
    /// Attribute values must be simple objects; element values simple or
    /// complex objects. `None` sets a null value. Returns the attached value.
    pub fn set_value(&mut self, holder: ObjectId, value: Option<ObjectId>) -> Result<Option<ObjectId>> {
        let target = self.effective(holder)?;
        if let Some(value) = value {
            let is_attribute = matches!(self.get(target)?, ObjectKind::Attribute { .. });
            let accepted = match self.get(value)? {
                ObjectKind::Simple { .. } => true,
                ObjectKind::Complex { .. } => !is_attribute,
                _ => false,
            };
            if !accepted {
                return Err(Error::InvalidOperation(format!(
                    "object {} cannot be the value of {}",
                    value, holder
                )));
            }
        }

        let old = match self.slot(target)? {
            Slot::Direct(old) => old,
            Slot::Reference(_) => None,
        };
        if old.is_some() && old == value {
            return Ok(old);
        }
        let attached = match value {
            Some(value) => Some(self.set_parent(value, target)?),
            None => None,
        };
        if old != attached {
            self.detach(old)?;
        }
        self.set_slot(target, Slot::Direct(attached))?;
        Ok(attached)
    }

    /// Make an attribute or element read its value from `target`
    ///
    /// Both objects must be of the same kind; fails if `target` reads its
    /// value from `holder`, directly or through a chain.
    pub fn set_reference(&mut self, holder: ObjectId, target: ObjectId) -> Result<()> {
        let same_kind = matches!(
            (self.get(holder)?, self.get(target)?),
            (ObjectKind::Attribute { .. }, ObjectKind::Attribute { .. })
                | (ObjectKind::Element { .. }, ObjectKind::Element { .. })
        );
        if !same_kind {
            return Err(Error::InvalidOperation(format!(
                "object {} cannot reference {}",
                holder, target
            )));
        }

        let mut visited = HashSet::new();
        let mut current = target;
        loop {
            if current == holder {
                return Err(Error::CircularReference(format!(
                    "{} is already referenced by {}",
                    holder, target
                )));
            }
            if !visited.insert(current) {
                break;
            }
            match self.slot(current)? {
                Slot::Reference(next) => current = next,
                Slot::Direct(_) => break,
            }
        }

        if let Slot::Direct(old) = self.slot(holder)? {
            self.detach(old)?;
        }
        self.set_slot(holder, Slot::Reference(target))
    }
}

fn wrong_kind(id: ObjectId, expected: &str, actual: &ObjectKind) -> Error {
    Error::InvalidObject(format!(
        "object {} is a {} object, expected {}",
        id,
        actual.kind_name(),
        expected
    ))
}

fn expect_kind(
    tree: &XTree,
    id: ObjectId,
    expected: &str,
    predicate: impl Fn(&ObjectKind) -> bool,
) -> Result<()> {
    let kind = tree.get(id)?;
    if predicate(kind) {
        Ok(())
    } else {
        Err(wrong_kind(id, expected, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::AtomicValue;

    fn int(tree: &mut XTree, value: i32) -> ObjectId {
        tree.new_simple(None, SimpleValue::Atomic(AtomicValue::Int32(value)))
    }

    #[test]
    fn test_unparented_child_is_moved() {
        let mut tree = XTree::new();
        let set = tree.new_child_set(None);
        let element = tree.new_element(FullName::local("a"));
        let attached = tree.add_child(set, element).unwrap();
        assert_eq!(attached, element);
        assert_eq!(tree.parent(element), Some(set));
    }

    #[test]
    fn test_parented_child_is_cloned() {
        let mut tree = XTree::new();
        let first = tree.new_child_set(None);
        let second = tree.new_child_set(None);
        let element = tree.new_element(FullName::local("a"));
        let value = int(&mut tree, 7);
        tree.set_value(element, Some(value)).unwrap();
        tree.add_child(first, element).unwrap();

        let clone = tree.add_child(second, element).unwrap();
        assert_ne!(clone, element);
        assert_eq!(tree.parent(element), Some(first));
        assert_eq!(tree.parent(clone), Some(second));

        let cloned_value = tree.value_of(clone).unwrap().unwrap();
        assert_ne!(cloned_value, value);
        assert_eq!(tree.parent(cloned_value), Some(clone));
    }

    #[test]
    fn test_self_attach_is_rejected() {
        let mut tree = XTree::new();
        let set = tree.new_child_set(None);
        assert!(matches!(
            tree.add_child(set, set),
            Err(Error::CircularReference(_))
        ));
    }

    #[test]
    fn test_reference_reads_and_writes_through() {
        let mut tree = XTree::new();
        let global = tree.new_attribute("id");
        let local = tree.new_attribute("id");
        tree.set_reference(local, global).unwrap();
        assert_eq!(tree.effective(local).unwrap(), global);

        let value = int(&mut tree, 1);
        tree.set_value(local, Some(value)).unwrap();
        assert_eq!(tree.value_of(global).unwrap(), Some(value));
        assert_eq!(tree.value_of(local).unwrap(), Some(value));
        assert_eq!(tree.reference_depth(local).unwrap(), 1);
    }

    #[test]
    fn test_reference_cycle_is_rejected() {
        let mut tree = XTree::new();
        let a = tree.new_element(FullName::local("a"));
        let b = tree.new_element(FullName::local("b"));
        let c = tree.new_element(FullName::local("c"));
        tree.set_reference(a, b).unwrap();
        tree.set_reference(b, c).unwrap();
        assert!(matches!(
            tree.set_reference(c, a),
            Err(Error::CircularReference(_))
        ));
        assert!(tree.set_reference(a, a).is_err());
    }

    #[test]
    fn test_kind_checks() {
        let mut tree = XTree::new();
        let complex = tree.new_complex(None);
        let attribute = tree.new_attribute("x");
        assert!(matches!(
            tree.set_value(attribute, Some(complex)),
            Err(Error::InvalidOperation(_))
        ));
        let element = tree.new_element(FullName::local("e"));
        assert!(tree.set_reference(attribute, element).is_err());
        assert!(tree.set_attributes(complex, attribute).is_err());
    }

    #[test]
    fn test_duplicate_attribute_names() {
        let mut tree = XTree::new();
        let set = tree.new_attribute_set();
        let first = tree.new_attribute("id");
        let second = tree.new_attribute("id");
        tree.add_attribute(set, first).unwrap();
        assert!(matches!(
            tree.add_attribute(set, second),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_replacing_value_detaches_old_one() {
        let mut tree = XTree::new();
        let attribute = tree.new_attribute("x");
        let first = int(&mut tree, 1);
        let second = int(&mut tree, 2);
        tree.set_value(attribute, Some(first)).unwrap();
        tree.set_value(attribute, Some(second)).unwrap();
        assert_eq!(tree.parent(first), None);
        assert_eq!(tree.parent(second), Some(attribute));
    }

    #[test]
    fn test_reassigning_current_value_keeps_it() {
        let mut tree = XTree::new();
        let attribute = tree.new_attribute("x");
        let value = int(&mut tree, 1);
        tree.set_value(attribute, Some(value)).unwrap();
        let nodes = tree.len();

        assert_eq!(tree.set_value(attribute, Some(value)).unwrap(), Some(value));
        assert_eq!(tree.parent(value), Some(attribute));

        let complex = tree.new_complex(None);
        let set = tree.new_attribute_set();
        let children = tree.new_child_set(None);
        tree.set_attributes(complex, set).unwrap();
        tree.set_children(complex, children).unwrap();
        assert_eq!(tree.set_attributes(complex, set).unwrap(), set);
        assert_eq!(tree.set_children(complex, children).unwrap(), children);
        assert_eq!(tree.parent(set), Some(complex));
        assert_eq!(tree.parent(children), Some(complex));
        assert_eq!(tree.len(), nodes + 3);
    }
}
