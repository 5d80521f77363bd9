//! Structural children: child sets, lists and members
//!
//! The children of a complex type form a tree: a root [`ChildSetInfo`]
//! (sequence or choice) whose members are elements, nested sets or lists. A
//! list wraps one item member with occurrence bounds.

use std::fmt;

use super::elements::ElementInfo;
use super::particles::Occurs;
pub use crate::ast::ChildSetKind;
use crate::diagnostics::TextSpan;

/// A sequence or choice of members
#[derive(Debug, Clone)]
pub struct ChildSetInfo {
    /// Set kind
    pub kind: ChildSetKind,
    /// Members in declaration order
    pub members: Vec<ChildInfo>,
    /// Declaration location
    pub span: Option<TextSpan>,
}

impl ChildSetInfo {
    /// Create an empty set
    pub fn new(kind: ChildSetKind) -> Self {
        Self {
            kind,
            members: Vec::new(),
            span: None,
        }
    }

    /// Whether the whole set may be absent
    ///
    /// A sequence is optional iff all its members are optional; a choice is
    /// optional iff any member is optional.
    pub fn is_optional(&self) -> bool {
        match self.kind {
            ChildSetKind::Sequence => self.members.iter().all(ChildInfo::is_optional),
            ChildSetKind::Choice => self.members.iter().any(ChildInfo::is_optional),
        }
    }

    /// Find a direct member by member name
    pub fn member(&self, name: &str) -> Option<&ChildInfo> {
        self.members.iter().find(|m| m.member_name == name)
    }

    /// Whether a direct member with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.member(name).is_some()
    }
}

/// One member of a child set
#[derive(Debug, Clone)]
pub struct ChildInfo {
    /// Member name, unique among siblings
    pub member_name: String,
    /// Position among siblings
    pub order: usize,
    /// Member shape
    pub kind: ChildKind,
    /// Declaration location
    pub span: Option<TextSpan>,
}

impl ChildInfo {
    /// Whether the member may be absent
    pub fn is_optional(&self) -> bool {
        match &self.kind {
            ChildKind::Element { is_optional, .. } => *is_optional,
            ChildKind::Set(set) => set.is_optional(),
            ChildKind::List(list) => list.occurs.is_emptiable(),
        }
    }

    /// Shape category used by restriction checks
    pub fn member_kind(&self) -> MemberKind {
        match &self.kind {
            ChildKind::Element { element, .. } => {
                if element.referenced.is_some() {
                    MemberKind::GlobalElementReference
                } else {
                    MemberKind::LocalElement
                }
            }
            ChildKind::Set(set) => match set.kind {
                ChildSetKind::Sequence => MemberKind::Sequence,
                ChildSetKind::Choice => MemberKind::Choice,
            },
            ChildKind::List(_) => MemberKind::List,
        }
    }
}

/// Shape of a member
#[derive(Debug, Clone)]
pub enum ChildKind {
    /// A single element
    Element {
        /// The element
        element: ElementInfo,
        /// Whether the element may be absent
        is_optional: bool,
    },
    /// A nested set
    Set(ChildSetInfo),
    /// A repeated item
    List(ChildListInfo),
}

/// A list of one repeated item member
#[derive(Debug, Clone)]
pub struct ChildListInfo {
    /// Item member
    pub item: Box<ChildInfo>,
    /// Occurrence bounds
    pub occurs: Occurs,
}

/// Category of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Local element
    LocalElement,
    /// Reference to a global element
    GlobalElementReference,
    /// Nested sequence
    Sequence,
    /// Nested choice
    Choice,
    /// List
    List,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberKind::LocalElement => "local element",
            MemberKind::GlobalElementReference => "global element reference",
            MemberKind::Sequence => "sequence",
            MemberKind::Choice => "choice",
            MemberKind::List => "list",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::FullName;
    use crate::schema::attributes::DeclarationKind;
    use crate::schema::types::TypeId;

    fn element(name: &str, is_optional: bool) -> ChildInfo {
        ChildInfo {
            member_name: name.to_string(),
            order: 0,
            kind: ChildKind::Element {
                element: ElementInfo {
                    full_name: FullName::new("urn:test", name),
                    kind: DeclarationKind::Local,
                    type_id: TypeId(0),
                    is_nullable: false,
                    is_abstract: false,
                    is_sealed: false,
                    substituted: None,
                    referenced: None,
                    span: None,
                },
                is_optional,
            },
            span: None,
        }
    }

    #[test]
    fn test_sequence_optional_iff_all_optional() {
        let mut set = ChildSetInfo::new(ChildSetKind::Sequence);
        set.members.push(element("a", true));
        set.members.push(element("b", false));
        assert!(!set.is_optional());
        set.members[1] = element("b", true);
        assert!(set.is_optional());
    }

    #[test]
    fn test_choice_optional_iff_any_optional() {
        let mut set = ChildSetInfo::new(ChildSetKind::Choice);
        set.members.push(element("a", false));
        set.members.push(element("b", false));
        assert!(!set.is_optional());
        set.members[0] = element("a", true);
        assert!(set.is_optional());
    }

    #[test]
    fn test_empty_sets() {
        assert!(ChildSetInfo::new(ChildSetKind::Sequence).is_optional());
        assert!(!ChildSetInfo::new(ChildSetKind::Choice).is_optional());
    }

    #[test]
    fn test_list_optionality() {
        let list = ChildInfo {
            member_name: "items".to_string(),
            order: 0,
            kind: ChildKind::List(ChildListInfo {
                item: Box::new(element("item", false)),
                occurs: Occurs::zero_or_more(),
            }),
            span: None,
        };
        assert!(list.is_optional());
        assert_eq!(list.member_kind(), MemberKind::List);
    }
}
