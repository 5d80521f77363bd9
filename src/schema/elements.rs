//! Element symbols

use std::fmt;

use serde::{Deserialize, Serialize};

use super::attributes::DeclarationKind;
use super::types::TypeId;
use crate::diagnostics::TextSpan;
use crate::namespaces::FullName;

/// Index of a global element in a schema set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    /// Position in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// A compiled element
///
/// Global elements live in the schema set arena; local elements and
/// references to globals live inside the child sets of complex types. A
/// `Reference` element copies the shape of the global it refers to.
#[derive(Debug, Clone)]
pub struct ElementInfo {
    /// Full name
    pub full_name: FullName,
    /// Declaration kind
    pub kind: DeclarationKind,
    /// Type of the value
    pub type_id: TypeId,
    /// Whether the value may be null
    pub is_nullable: bool,
    /// Whether instances must use a substitutor
    pub is_abstract: bool,
    /// Whether the element cannot be substituted
    pub is_sealed: bool,
    /// Head of the substitution group this global element joins
    pub substituted: Option<ElementId>,
    /// Referenced global element
    pub referenced: Option<ElementId>,
    /// Declaration location
    pub span: Option<TextSpan>,
}

impl ElementInfo {
    /// Local name
    pub fn name(&self) -> &str {
        &self.full_name.name
    }

    /// The global element this declaration stands for, if any
    pub fn global(&self) -> Option<ElementId> {
        self.referenced
    }
}
