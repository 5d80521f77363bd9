//! Runtime object model
//!
//! Parsed data is held in an [`XTree`]: an arena of typed objects linked by
//! parent pointers. Every object has at most one parent. Attaching an object
//! that already has a parent attaches a deep clone instead, so a subtree is
//! never shared between two owners; attaching an ancestor below one of its
//! descendants is rejected.
//!
//! Attributes and elements hold their value through a [`Slot`]: either the
//! value itself or a reference to another attribute/element whose value is
//! used instead. The instance at the end of a reference chain is the
//! *effective* instance.

mod equality;
mod tree;

use std::fmt;

pub use equality::ObjectRef;
pub use tree::XTree;

use crate::namespaces::FullName;
use crate::values::SimpleValue;

/// Index of an object in an [`XTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    /// Position in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value holder of an attribute or element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Owned value; `None` is a null value
    Direct(Option<ObjectId>),
    /// The value of another attribute or element
    Reference(ObjectId),
}

impl Default for Slot {
    fn default() -> Self {
        Slot::Direct(None)
    }
}

/// Shape and content of one object
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// Instance of a simple type
    Simple {
        /// Explicit instance type; the expected type when absent
        type_name: Option<FullName>,
        /// The value
        value: SimpleValue,
    },
    /// Instance of a complex type
    Complex {
        /// Explicit instance type; the expected type when absent
        type_name: Option<FullName>,
        /// Attribute set
        attributes: Option<ObjectId>,
        /// Child set, or simple object for simple content
        children: Option<ObjectId>,
    },
    /// Named attribute
    Attribute {
        /// Local name
        name: String,
        /// Value holder
        slot: Slot,
    },
    /// Named element
    Element {
        /// Full name; an empty URI matches local elements of any namespace
        name: FullName,
        /// Value holder
        slot: Slot,
    },
    /// Attributes of a complex object
    AttributeSet {
        /// Attributes in insertion order
        attributes: Vec<ObjectId>,
    },
    /// Sequence or choice instance
    ChildSet {
        /// Member name within the enclosing set; root sets have none
        member_name: Option<String>,
        /// Elements, nested sets and lists in order
        children: Vec<ObjectId>,
    },
    /// List instance
    ChildList {
        /// Member name within the enclosing set
        member_name: Option<String>,
        /// Items in order
        items: Vec<ObjectId>,
    },
}

impl ObjectKind {
    /// Kind name used in messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            ObjectKind::Simple { .. } => "simple",
            ObjectKind::Complex { .. } => "complex",
            ObjectKind::Attribute { .. } => "attribute",
            ObjectKind::Element { .. } => "element",
            ObjectKind::AttributeSet { .. } => "attribute set",
            ObjectKind::ChildSet { .. } => "child set",
            ObjectKind::ChildList { .. } => "child list",
        }
    }

    /// Whether this is a type instance (simple or complex)
    pub fn is_type(&self) -> bool {
        matches!(self, ObjectKind::Simple { .. } | ObjectKind::Complex { .. })
    }

    /// Explicit instance type of a type instance
    pub fn type_name(&self) -> Option<&FullName> {
        match self {
            ObjectKind::Simple { type_name, .. } | ObjectKind::Complex { type_name, .. } => {
                type_name.as_ref()
            }
            _ => None,
        }
    }

    /// Objects owned by this one, in order
    pub fn owned(&self) -> Vec<ObjectId> {
        match self {
            ObjectKind::Simple { .. } => Vec::new(),
            ObjectKind::Complex {
                attributes,
                children,
                ..
            } => attributes.iter().chain(children.iter()).copied().collect(),
            ObjectKind::Attribute { slot, .. } | ObjectKind::Element { slot, .. } => match slot {
                Slot::Direct(Some(value)) => vec![*value],
                _ => Vec::new(),
            },
            ObjectKind::AttributeSet { attributes } => attributes.clone(),
            ObjectKind::ChildSet { children, .. } => children.clone(),
            ObjectKind::ChildList { items, .. } => items.clone(),
        }
    }

    /// Replace every owned id through `map`
    pub(crate) fn remap_owned(&mut self, map: impl Fn(ObjectId) -> ObjectId) {
        match self {
            ObjectKind::Simple { .. } => {}
            ObjectKind::Complex {
                attributes,
                children,
                ..
            } => {
                *attributes = attributes.map(&map);
                *children = children.map(&map);
            }
            ObjectKind::Attribute { slot, .. } | ObjectKind::Element { slot, .. } => {
                if let Slot::Direct(Some(value)) = slot {
                    *value = map(*value);
                }
            }
            ObjectKind::AttributeSet { attributes: ids }
            | ObjectKind::ChildSet { children: ids, .. }
            | ObjectKind::ChildList { items: ids, .. } => {
                for id in ids.iter_mut() {
                    *id = map(*id);
                }
            }
        }
    }
}
