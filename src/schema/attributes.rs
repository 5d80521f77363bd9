//! Attribute symbols

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::TypeId;
use crate::diagnostics::TextSpan;
use crate::namespaces::FullName;
use crate::values::SimpleValue;

/// Index of a global attribute in a schema set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeId(pub(crate) u32);

impl AttributeId {
    /// Position in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attribute#{}", self.0)
    }
}

/// Where an attribute or element was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    /// Inside a type
    Local,
    /// At namespace level
    Global,
    /// Inside a type, as a reference to a global declaration
    Reference,
}

/// A compiled attribute
///
/// A `Reference` attribute carries the type, nullability and default of the
/// global attribute it refers to; `referenced` points at that global.
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    /// Full name; local attributes have no namespace
    pub full_name: FullName,
    /// Declaration kind
    pub kind: DeclarationKind,
    /// Simple type of the value
    pub type_id: TypeId,
    /// Whether the attribute may be absent
    pub is_optional: bool,
    /// Whether the value may be null
    pub is_nullable: bool,
    /// Default value
    pub default_value: Option<SimpleValue>,
    /// Referenced global attribute
    pub referenced: Option<AttributeId>,
    /// Declaration location
    pub span: Option<TextSpan>,
}

impl AttributeInfo {
    /// Local name, the key within an attribute set
    pub fn name(&self) -> &str {
        &self.full_name.name
    }
}

/// The effective attributes of a complex type, in declaration order
#[derive(Debug, Clone, Default)]
pub struct AttributeSetInfo {
    attributes: IndexMap<String, AttributeInfo>,
}

impl AttributeSetInfo {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute. Returns `false` if the name is already taken.
    pub fn insert(&mut self, attribute: AttributeInfo) -> bool {
        if self.attributes.contains_key(attribute.name()) {
            return false;
        }
        self.attributes.insert(attribute.name().to_string(), attribute);
        true
    }

    /// Get an attribute by local name
    pub fn get(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.get(name)
    }

    /// Whether an attribute with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attributes.values()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
