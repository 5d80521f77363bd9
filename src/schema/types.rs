//! Type symbols
//!
//! Every type, built-in or declared, is a [`TypeInfo`] in the arena of a
//! [`SchemaSet`](super::SchemaSet). Types form a single-rooted derivation
//! tree through `base`; the content of a type is its *effective* content, with
//! inherited members already merged in.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::attributes::AttributeSetInfo;
use super::builtins::TypeKind;
use super::facets::FacetSet;
use super::groups::ChildSetInfo;
use crate::diagnostics::TextSpan;
use crate::namespaces::FullName;

/// Index of a type in a schema set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Position in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// How a type was derived from its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivationMethod {
    /// Built-in type or a type deriving implicitly from a root
    None,
    /// Members were added to the base
    Extension,
    /// The base was narrowed
    Restriction,
}

/// A compiled type
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// Full name
    pub full_name: FullName,
    /// Kind: `ComplexType` for complex types, the value kind otherwise
    pub kind: TypeKind,
    /// Base type, `None` only for the two roots
    pub base: Option<TypeId>,
    /// How the type derives from its base
    pub derivation: DerivationMethod,
    /// Whether instances must use a derived type
    pub is_abstract: bool,
    /// Whether the type can be derived from
    pub is_sealed: bool,
    /// Effective content
    pub content: TypeContent,
    /// Declaration location
    pub span: Option<TextSpan>,
}

impl TypeInfo {
    /// Whether this is a complex type
    pub fn is_complex(&self) -> bool {
        self.kind.is_complex()
    }

    /// Whether this is a simple type
    pub fn is_simple(&self) -> bool {
        self.kind.is_simple()
    }

    /// Whether this is a built-in type
    pub fn is_system(&self) -> bool {
        self.full_name.is_system()
    }

    /// Simple content, for simple types
    pub fn as_simple(&self) -> Option<&SimpleTypeInfo> {
        match &self.content {
            TypeContent::Simple(simple) => Some(simple),
            TypeContent::Complex(_) => None,
        }
    }

    /// Complex content, for complex types
    pub fn as_complex(&self) -> Option<&ComplexTypeInfo> {
        match &self.content {
            TypeContent::Simple(_) => None,
            TypeContent::Complex(complex) => Some(complex),
        }
    }

    /// Effective facets, for restricted simple types
    pub fn facets(&self) -> Option<&FacetSet> {
        self.as_simple().and_then(|s| s.facets.as_ref())
    }
}

/// Content of a type
#[derive(Debug, Clone)]
pub enum TypeContent {
    /// Simple type content
    Simple(SimpleTypeInfo),
    /// Complex type content
    Complex(ComplexTypeInfo),
}

/// Content of a simple type
#[derive(Debug, Clone, Default)]
pub struct SimpleTypeInfo {
    /// Effective facets
    pub facets: Option<FacetSet>,
    /// Item type of a list type
    pub item_type: Option<TypeId>,
}

/// Content of a complex type
#[derive(Debug, Clone, Default)]
pub struct ComplexTypeInfo {
    /// Effective attributes
    pub attributes: Option<AttributeSetInfo>,
    /// Effective children
    pub children: Option<ChildrenInfo>,
}

impl ComplexTypeInfo {
    /// Whether the children are simple content
    pub fn has_simple_content(&self) -> bool {
        matches!(self.children, Some(ChildrenInfo::Simple(_)))
    }

    /// Root child set of structural content
    pub fn child_set(&self) -> Option<&ChildSetInfo> {
        match &self.children {
            Some(ChildrenInfo::Set(set)) => Some(set),
            _ => None,
        }
    }
}

/// Children of a complex type
#[derive(Debug, Clone)]
pub enum ChildrenInfo {
    /// Simple content of the given simple type
    Simple(TypeId),
    /// Structural content
    Set(ChildSetInfo),
}
