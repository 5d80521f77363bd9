//! Schema parse-tree nodes
//!
//! These nodes are the input of the compiler. They are produced by the SData
//! schema grammar (not part of this crate) or loaded from their JSON form with
//! [`load_namespaces`]. Every node that can be the subject of a diagnostic
//! carries an optional [`TextSpan`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::TextSpan;
use crate::error::Result;
use crate::names::split_qualified_name;

// =============================================================================
// Names
// =============================================================================

/// An identifier with its source span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameNode {
    /// Identifier text
    pub value: String,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

impl NameNode {
    /// Create a name without a span
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            span: None,
        }
    }

    /// Attach a span
    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.span = Some(span);
        self
    }
}

/// A name optionally qualified by an import alias: `alias:Name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiableNameNode {
    /// Import alias
    #[serde(default)]
    pub alias: Option<NameNode>,
    /// Local name
    pub name: NameNode,
}

impl QualifiableNameNode {
    /// Build from `Name` or `alias:Name` text
    pub fn parse(text: &str) -> Self {
        let (alias, name) = split_qualified_name(text);
        Self {
            alias: alias.map(NameNode::new),
            name: NameNode::new(name),
        }
    }

    /// Span of the whole reference
    pub fn span(&self) -> Option<&TextSpan> {
        self.name
            .span
            .as_ref()
            .or_else(|| self.alias.as_ref().and_then(|a| a.span.as_ref()))
    }
}

impl std::fmt::Display for QualifiableNameNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}:{}", alias.value, self.name.value),
            None => write!(f, "{}", self.name.value),
        }
    }
}

// =============================================================================
// Namespaces
// =============================================================================

/// `namespace "uri" { import ...; members... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceNode {
    /// Namespace URI
    pub uri: String,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
    /// Imports of this declaration
    #[serde(default)]
    pub imports: Vec<ImportNode>,
    /// Global declarations
    #[serde(default)]
    pub members: Vec<MemberNode>,
}

impl NamespaceNode {
    /// Create an empty namespace declaration
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            span: None,
            imports: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Add an import
    pub fn import(mut self, uri: impl Into<String>, alias: Option<&str>) -> Self {
        self.imports.push(ImportNode {
            uri: uri.into(),
            alias: alias.map(NameNode::new),
            span: None,
        });
        self
    }

    /// Add a member
    pub fn member(mut self, member: impl Into<MemberNode>) -> Self {
        self.members.push(member.into());
        self
    }
}

/// `import "uri" as alias`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportNode {
    /// Imported namespace URI
    pub uri: String,
    /// Optional alias
    #[serde(default)]
    pub alias: Option<NameNode>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// A global declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum MemberNode {
    /// Global type
    Type(TypeNode),
    /// Global attribute
    Attribute(GlobalAttributeNode),
    /// Global element
    Element(GlobalElementNode),
}

impl MemberNode {
    /// Declared name
    pub fn name(&self) -> &NameNode {
        match self {
            MemberNode::Type(t) => &t.name,
            MemberNode::Attribute(a) => &a.name,
            MemberNode::Element(e) => &e.name,
        }
    }
}

impl From<TypeNode> for MemberNode {
    fn from(node: TypeNode) -> Self {
        MemberNode::Type(node)
    }
}

impl From<GlobalAttributeNode> for MemberNode {
    fn from(node: GlobalAttributeNode) -> Self {
        MemberNode::Attribute(node)
    }
}

impl From<GlobalElementNode> for MemberNode {
    fn from(node: GlobalElementNode) -> Self {
        MemberNode::Element(node)
    }
}

// =============================================================================
// Types
// =============================================================================

/// `type Name [abstract|sealed] <body>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    /// Type name
    pub name: NameNode,
    /// Whether the type is abstract
    #[serde(default)]
    pub is_abstract: bool,
    /// Whether the type is sealed
    #[serde(default)]
    pub is_sealed: bool,
    /// Type body
    pub body: TypeBody,
}

impl TypeNode {
    /// `type Name list<Item>`
    pub fn list(name: &str, item: &str) -> Self {
        Self::with_body(
            name,
            TypeBody::List {
                item: QualifiableNameNode::parse(item),
            },
        )
    }

    /// `type Name { attributes children }`
    pub fn complex(name: &str) -> Self {
        Self::with_body(
            name,
            TypeBody::Complex {
                attributes: None,
                children: None,
            },
        )
    }

    /// `type Name extends Base { ... }`
    pub fn extension(name: &str, base: &str) -> Self {
        Self::with_body(
            name,
            TypeBody::Extension {
                base: QualifiableNameNode::parse(base),
                attributes: None,
                children: None,
            },
        )
    }

    /// `type Name restricts Base { ... }`
    pub fn restriction(name: &str, base: &str) -> Self {
        Self::with_body(
            name,
            TypeBody::Restriction {
                base: QualifiableNameNode::parse(base),
                facets: None,
                attributes: None,
                children: None,
            },
        )
    }

    fn with_body(name: &str, body: TypeBody) -> Self {
        Self {
            name: NameNode::new(name),
            is_abstract: false,
            is_sealed: false,
            body,
        }
    }

    /// Mark abstract
    pub fn set_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Mark sealed
    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    /// Set the attributes block
    pub fn attributes(mut self, node: AttributesNode) -> Self {
        match &mut self.body {
            TypeBody::Complex { attributes, .. }
            | TypeBody::Extension { attributes, .. }
            | TypeBody::Restriction { attributes, .. } => *attributes = Some(node),
            TypeBody::List { .. } => {}
        }
        self
    }

    /// Set the children block
    pub fn children(mut self, node: ChildrenNode) -> Self {
        match &mut self.body {
            TypeBody::Complex { children, .. }
            | TypeBody::Extension { children, .. }
            | TypeBody::Restriction { children, .. } => *children = Some(node),
            TypeBody::List { .. } => {}
        }
        self
    }

    /// Set the facets of a restriction
    pub fn facets(mut self, node: FacetsNode) -> Self {
        if let TypeBody::Restriction { facets, .. } = &mut self.body {
            *facets = Some(node);
        }
        self
    }
}

/// The derivation form of a type declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum TypeBody {
    /// `list<Item>`
    List {
        /// Item type
        item: QualifiableNameNode,
    },
    /// A complex type deriving from `sys:ComplexType`
    Complex {
        /// Attributes block
        #[serde(default)]
        attributes: Option<AttributesNode>,
        /// Children block
        #[serde(default)]
        children: Option<ChildrenNode>,
    },
    /// `extends Base`
    Extension {
        /// Base type
        base: QualifiableNameNode,
        /// Attributes block
        #[serde(default)]
        attributes: Option<AttributesNode>,
        /// Children block
        #[serde(default)]
        children: Option<ChildrenNode>,
    },
    /// `restricts Base`
    Restriction {
        /// Base type
        base: QualifiableNameNode,
        /// Facets of a simple type restriction
        #[serde(default)]
        facets: Option<FacetsNode>,
        /// Attributes block
        #[serde(default)]
        attributes: Option<AttributesNode>,
        /// Children block
        #[serde(default)]
        children: Option<ChildrenNode>,
    },
}

// =============================================================================
// Attributes
// =============================================================================

/// `attributes { ... }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributesNode {
    /// Members in declaration order
    #[serde(default)]
    pub members: Vec<AttributeMemberNode>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

impl AttributesNode {
    /// Create an empty block
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member
    pub fn member(mut self, member: AttributeMemberNode) -> Self {
        self.members.push(member);
        self
    }
}

/// A member of an attributes block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum AttributeMemberNode {
    /// `name[?] as Type [nullable] [= default]`
    Local(LocalAttributeNode),
    /// `&GlobalAttribute[?]`
    Reference(AttributeReferenceNode),
    /// `delete name`
    Delete(DeleteNode),
}

impl AttributeMemberNode {
    /// Local attribute with the given type
    pub fn local(name: &str, type_name: &str) -> Self {
        AttributeMemberNode::Local(LocalAttributeNode {
            name: NameNode::new(name),
            type_name: QualifiableNameNode::parse(type_name),
            is_optional: false,
            is_nullable: false,
            default_value: None,
            span: None,
        })
    }

    /// Optional local attribute with the given type
    pub fn optional(name: &str, type_name: &str) -> Self {
        let mut member = Self::local(name, type_name);
        if let AttributeMemberNode::Local(local) = &mut member {
            local.is_optional = true;
        }
        member
    }

    /// Reference to a global attribute
    pub fn reference(reference: &str, is_optional: bool) -> Self {
        AttributeMemberNode::Reference(AttributeReferenceNode {
            reference: QualifiableNameNode::parse(reference),
            is_optional,
            span: None,
        })
    }

    /// Deletion of an inherited attribute
    pub fn delete(name: &str) -> Self {
        AttributeMemberNode::Delete(DeleteNode {
            name: NameNode::new(name),
            span: None,
        })
    }

    /// Span of the member
    pub fn span(&self) -> Option<&TextSpan> {
        match self {
            AttributeMemberNode::Local(n) => n.span.as_ref().or(n.name.span.as_ref()),
            AttributeMemberNode::Reference(n) => n.span.as_ref().or(n.reference.span()),
            AttributeMemberNode::Delete(n) => n.span.as_ref().or(n.name.span.as_ref()),
        }
    }
}

/// A local attribute declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalAttributeNode {
    /// Attribute name
    pub name: NameNode,
    /// Simple type of the attribute
    pub type_name: QualifiableNameNode,
    /// Whether the attribute may be absent
    #[serde(default)]
    pub is_optional: bool,
    /// Whether the attribute value may be null
    #[serde(default)]
    pub is_nullable: bool,
    /// Default value literal
    #[serde(default)]
    pub default_value: Option<String>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// A reference to a global attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeReferenceNode {
    /// Referenced global attribute
    pub reference: QualifiableNameNode,
    /// Whether the attribute may be absent
    #[serde(default)]
    pub is_optional: bool,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// `delete name` inside a restriction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteNode {
    /// Name of the deleted member
    pub name: NameNode,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// `attribute Name as Type [nullable] [= default]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalAttributeNode {
    /// Attribute name
    pub name: NameNode,
    /// Simple type of the attribute
    pub type_name: QualifiableNameNode,
    /// Whether the attribute value may be null
    #[serde(default)]
    pub is_nullable: bool,
    /// Default value literal
    #[serde(default)]
    pub default_value: Option<String>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

impl GlobalAttributeNode {
    /// Create a global attribute declaration
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: NameNode::new(name),
            type_name: QualifiableNameNode::parse(type_name),
            is_nullable: false,
            default_value: None,
            span: None,
        }
    }
}

// =============================================================================
// Elements
// =============================================================================

/// `element Name [abstract|sealed] as Type [nullable] [substitutes Head]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalElementNode {
    /// Element name
    pub name: NameNode,
    /// Type of the element
    pub type_name: QualifiableNameNode,
    /// Whether the element value may be null
    #[serde(default)]
    pub is_nullable: bool,
    /// Whether the element is abstract
    #[serde(default)]
    pub is_abstract: bool,
    /// Whether the element cannot be substituted
    #[serde(default)]
    pub is_sealed: bool,
    /// Head of the substitution group this element joins
    #[serde(default)]
    pub substitutes: Option<QualifiableNameNode>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

impl GlobalElementNode {
    /// Create a global element declaration
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: NameNode::new(name),
            type_name: QualifiableNameNode::parse(type_name),
            is_nullable: false,
            is_abstract: false,
            is_sealed: false,
            substitutes: None,
            span: None,
        }
    }

    /// Join the substitution group of `head`
    pub fn substitutes(mut self, head: &str) -> Self {
        self.substitutes = Some(QualifiableNameNode::parse(head));
        self
    }
}

// =============================================================================
// Children
// =============================================================================

/// The children block of a complex type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum ChildrenNode {
    /// Simple content
    Simple {
        /// Simple type of the content
        type_name: QualifiableNameNode,
        /// Source location
        #[serde(default)]
        span: Option<TextSpan>,
    },
    /// Structural content
    Set(ChildSetNode),
}

impl ChildrenNode {
    /// Simple content of the given type
    pub fn simple(type_name: &str) -> Self {
        ChildrenNode::Simple {
            type_name: QualifiableNameNode::parse(type_name),
            span: None,
        }
    }
}

/// Kind of a child set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildSetKind {
    /// Members in declaration order
    Sequence,
    /// Exactly one member
    Choice,
}

/// `seq { ... }` or `choice { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSetNode {
    /// Set kind
    pub kind: ChildSetKind,
    /// Members in declaration order
    #[serde(default)]
    pub members: Vec<ChildMemberNode>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

impl ChildSetNode {
    /// Create an empty sequence
    pub fn sequence() -> Self {
        Self {
            kind: ChildSetKind::Sequence,
            members: Vec::new(),
            span: None,
        }
    }

    /// Create an empty choice
    pub fn choice() -> Self {
        Self {
            kind: ChildSetKind::Choice,
            members: Vec::new(),
            span: None,
        }
    }

    /// Add a member
    pub fn member(mut self, member: ChildMemberNode) -> Self {
        self.members.push(member);
        self
    }
}

/// A member of a child set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum ChildMemberNode {
    /// `Name as Type [nullable] [occurrence]`
    Element(LocalElementNode),
    /// `&GlobalElement [as MemberName] [occurrence]`
    Reference(ElementReferenceNode),
    /// Nested `seq`/`choice` with an optional member name and occurrence
    Set(NestedSetNode),
    /// `delete name`
    Delete(DeleteNode),
}

impl ChildMemberNode {
    /// Local element with the given type
    pub fn element(name: &str, type_name: &str) -> Self {
        ChildMemberNode::Element(LocalElementNode {
            name: NameNode::new(name),
            type_name: QualifiableNameNode::parse(type_name),
            is_nullable: false,
            occurrence: None,
            span: None,
        })
    }

    /// Reference to a global element
    pub fn reference(reference: &str) -> Self {
        ChildMemberNode::Reference(ElementReferenceNode {
            reference: QualifiableNameNode::parse(reference),
            member_name: None,
            occurrence: None,
            span: None,
        })
    }

    /// Named nested set
    pub fn set(name: &str, set: ChildSetNode) -> Self {
        ChildMemberNode::Set(NestedSetNode {
            name: Some(NameNode::new(name)),
            set,
            occurrence: None,
        })
    }

    /// Deletion of an inherited member
    pub fn delete(name: &str) -> Self {
        ChildMemberNode::Delete(DeleteNode {
            name: NameNode::new(name),
            span: None,
        })
    }

    /// Set the occurrence of an element, reference or nested set
    pub fn occurs(mut self, min: u64, max: u64) -> Self {
        let occurrence = Some(OccurrenceNode {
            min,
            max,
            span: None,
        });
        match &mut self {
            ChildMemberNode::Element(n) => n.occurrence = occurrence,
            ChildMemberNode::Reference(n) => n.occurrence = occurrence,
            ChildMemberNode::Set(n) => n.occurrence = occurrence,
            ChildMemberNode::Delete(_) => {}
        }
        self
    }

    /// Mark a local element nullable
    pub fn nullable(mut self) -> Self {
        if let ChildMemberNode::Element(n) = &mut self {
            n.is_nullable = true;
        }
        self
    }

    /// Declared occurrence
    pub fn occurrence(&self) -> Option<&OccurrenceNode> {
        match self {
            ChildMemberNode::Element(n) => n.occurrence.as_ref(),
            ChildMemberNode::Reference(n) => n.occurrence.as_ref(),
            ChildMemberNode::Set(n) => n.occurrence.as_ref(),
            ChildMemberNode::Delete(_) => None,
        }
    }

    /// Span of the member
    pub fn span(&self) -> Option<&TextSpan> {
        match self {
            ChildMemberNode::Element(n) => n.span.as_ref().or(n.name.span.as_ref()),
            ChildMemberNode::Reference(n) => n.span.as_ref().or(n.reference.span()),
            ChildMemberNode::Set(n) => n.set.span.as_ref(),
            ChildMemberNode::Delete(n) => n.span.as_ref().or(n.name.span.as_ref()),
        }
    }
}

/// A local element declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalElementNode {
    /// Element name
    pub name: NameNode,
    /// Type of the element
    pub type_name: QualifiableNameNode,
    /// Whether the element value may be null
    #[serde(default)]
    pub is_nullable: bool,
    /// Occurrence, `1..1` when absent
    #[serde(default)]
    pub occurrence: Option<OccurrenceNode>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// A reference to a global element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementReferenceNode {
    /// Referenced global element
    pub reference: QualifiableNameNode,
    /// Member name, the element's local name when absent
    #[serde(default)]
    pub member_name: Option<NameNode>,
    /// Occurrence, `1..1` when absent
    #[serde(default)]
    pub occurrence: Option<OccurrenceNode>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// A nested child set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedSetNode {
    /// Member name, generated from the kind and position when absent
    #[serde(default)]
    pub name: Option<NameNode>,
    /// The set
    pub set: ChildSetNode,
    /// Occurrence, `1..1` when absent
    #[serde(default)]
    pub occurrence: Option<OccurrenceNode>,
}

/// `[min..max]` occurrence of a child member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceNode {
    /// Minimum occurrences
    pub min: u64,
    /// Maximum occurrences, `u64::MAX` for unbounded
    pub max: u64,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

// =============================================================================
// Facets
// =============================================================================

/// The facets declared by a simple type restriction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FacetsNode {
    /// `lengthrange min .. max`
    #[serde(default)]
    pub length_range: Option<LengthRangeNode>,
    /// `precision n`
    #[serde(default)]
    pub precision: Option<IntegerFacetNode>,
    /// `scale n`
    #[serde(default)]
    pub scale: Option<IntegerFacetNode>,
    /// `valuerange [min .. max)`
    #[serde(default)]
    pub value_range: Option<ValueRangeNode>,
    /// `enums { ... }`, possibly several
    #[serde(default)]
    pub enums: Vec<EnumsNode>,
    /// `pattern "..."`, possibly several
    #[serde(default)]
    pub patterns: Vec<PatternNode>,
    /// `lists ItemType`
    #[serde(default)]
    pub list_item_type: Option<QualifiableNameNode>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

impl FacetsNode {
    /// Create an empty facet block
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the length range
    pub fn length_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.length_range = Some(LengthRangeNode {
            min,
            max,
            span: None,
        });
        self
    }

    /// Set the precision
    pub fn precision(mut self, value: u64) -> Self {
        self.precision = Some(IntegerFacetNode { value, span: None });
        self
    }

    /// Set the scale
    pub fn scale(mut self, value: u64) -> Self {
        self.scale = Some(IntegerFacetNode { value, span: None });
        self
    }

    /// Set the value range
    pub fn value_range(mut self, min: Option<ValueBoundNode>, max: Option<ValueBoundNode>) -> Self {
        self.value_range = Some(ValueRangeNode {
            min,
            max,
            span: None,
        });
        self
    }

    /// Add an enumeration with unnamed items
    pub fn enums(mut self, values: &[&str]) -> Self {
        self.enums.push(EnumsNode {
            items: values
                .iter()
                .map(|v| EnumItemNode {
                    name: None,
                    value: v.to_string(),
                    span: None,
                })
                .collect(),
            span: None,
        });
        self
    }

    /// Add a pattern
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.patterns.push(PatternNode {
            pattern: pattern.to_string(),
            span: None,
        });
        self
    }

    /// Set the list item type
    pub fn lists(mut self, item: &str) -> Self {
        self.list_item_type = Some(QualifiableNameNode::parse(item));
        self
    }
}

/// `lengthrange min .. max`, either bound may be omitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRangeNode {
    /// Minimum length
    #[serde(default)]
    pub min: Option<u64>,
    /// Maximum length
    #[serde(default)]
    pub max: Option<u64>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// An integer facet value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerFacetNode {
    /// Value
    pub value: u64,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// `valuerange` with optional bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRangeNode {
    /// Lower bound
    #[serde(default)]
    pub min: Option<ValueBoundNode>,
    /// Upper bound
    #[serde(default)]
    pub max: Option<ValueBoundNode>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// One bound of a value range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueBoundNode {
    /// Literal of the bound value
    pub value: String,
    /// Whether the bound value itself is in range
    #[serde(default = "default_inclusive")]
    pub inclusive: bool,
}

fn default_inclusive() -> bool {
    true
}

impl ValueBoundNode {
    /// Inclusive bound
    pub fn inclusive(value: &str) -> Self {
        Self {
            value: value.to_string(),
            inclusive: true,
        }
    }

    /// Exclusive bound
    pub fn exclusive(value: &str) -> Self {
        Self {
            value: value.to_string(),
            inclusive: false,
        }
    }
}

/// `enums { [name =] value, ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumsNode {
    /// Items in declaration order
    #[serde(default)]
    pub items: Vec<EnumItemNode>,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// One enumeration item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumItemNode {
    /// Display name
    #[serde(default)]
    pub name: Option<NameNode>,
    /// Value literal
    pub value: String,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

/// `pattern "regex"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternNode {
    /// Regular expression text
    pub pattern: String,
    /// Source location
    #[serde(default)]
    pub span: Option<TextSpan>,
}

// =============================================================================
// Loading
// =============================================================================

/// Load the namespace declarations of one schema file in JSON form
///
/// A file holds either a single namespace object or an array of them.
pub fn load_namespaces(path: impl AsRef<Path>) -> Result<Vec<NamespaceNode>> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_namespaces(&text)
}

/// Parse namespace declarations from JSON text
pub fn parse_namespaces(text: &str) -> Result<Vec<NamespaceNode>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(NamespaceNode),
        Many(Vec<NamespaceNode>),
    }

    Ok(match serde_json::from_str::<OneOrMany>(text)? {
        OneOrMany::One(node) => vec![node],
        OneOrMany::Many(nodes) => nodes,
    })
}
