//! Symbol graph export
//!
//! A [`SchemaDump`] is a plain, serializable view of a compiled
//! [`SchemaSet`]: every user namespace with its global members in
//! declaration order. It is the shape code generators read.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{
    AttributeInfo, AttributeSetInfo, ChildInfo, ChildKind, ChildSetInfo, ChildSetKind,
    ChildrenInfo, DerivationMethod, ElementInfo, FacetSet, GlobalId, SchemaSet, TypeContent,
    TypeId,
};

/// Serializable view of a compiled schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDump {
    /// User namespaces in registration order
    pub namespaces: Vec<NamespaceDump>,
}

/// One namespace and its global members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDump {
    /// Namespace URI
    pub uri: String,
    /// Global members in declaration order
    pub members: Vec<MemberDump>,
}

/// A global declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberDump {
    /// Type declaration
    Type(TypeDump),
    /// Global attribute
    Attribute(AttributeDump),
    /// Global element
    Element(ElementDump),
}

/// A type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDump {
    /// Full name, `{uri}name`
    pub name: String,
    /// Built-in kind the type belongs to
    pub type_kind: String,
    /// Base type full name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// `extension`, `restriction` or absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation: Option<String>,
    /// Abstract flag
    pub is_abstract: bool,
    /// Sealed flag
    pub is_sealed: bool,
    /// Facets of a simple type, as keyword/value pairs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<(String, String)>,
    /// Item type of a list type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    /// Attributes of a complex type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeDump>,
    /// Simple content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simple_content: Option<String>,
    /// Structural children
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<ChildSetDump>,
}

/// An attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDump {
    /// Full name
    pub name: String,
    /// Type full name
    pub type_name: String,
    /// Optional flag
    pub is_optional: bool,
    /// Nullable flag
    pub is_nullable: bool,
    /// Default value literal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// An element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDump {
    /// Full name
    pub name: String,
    /// Type full name
    pub type_name: String,
    /// Nullable flag
    pub is_nullable: bool,
    /// Abstract flag
    pub is_abstract: bool,
    /// Sealed flag
    pub is_sealed: bool,
    /// Substituted element full name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitutes: Option<String>,
    /// Referenced global element full name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

/// A sequence or choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSetDump {
    /// `sequence` or `choice`
    pub set_kind: String,
    /// Members in order
    pub members: Vec<ChildDump>,
}

/// A member of a child set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDump {
    /// Member name
    pub member_name: String,
    /// Whether the member may be absent
    pub is_optional: bool,
    /// Element declaration of an element member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementDump>,
    /// Nested set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<ChildSetDump>,
    /// Item of a list member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Box<ChildDump>>,
    /// Occurrence of a list member, `[min..max]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurs: Option<String>,
}

impl SchemaDump {
    /// Build the dump of a compiled schema
    pub fn from_schema(schema: &SchemaSet) -> Self {
        let namespaces = schema
            .namespaces()
            .filter(|ns| !ns.is_system())
            .map(|ns| NamespaceDump {
                uri: ns.uri.clone(),
                members: ns
                    .members()
                    .map(|(_, id)| match id {
                        GlobalId::Type(id) => MemberDump::Type(dump_type(schema, id)),
                        GlobalId::Attribute(id) => {
                            MemberDump::Attribute(dump_attribute(schema, schema.attribute(id)))
                        }
                        GlobalId::Element(id) => {
                            MemberDump::Element(dump_element(schema, schema.element(id)))
                        }
                    })
                    .collect(),
            })
            .collect();
        Self { namespaces }
    }

    /// Serialize to JSON
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }

    /// Write the JSON form to a file
    pub fn write_to(&self, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
        fs::write(path, self.to_json(pretty)?)?;
        Ok(())
    }
}

fn type_name(schema: &SchemaSet, id: TypeId) -> String {
    schema.type_info(id).full_name.to_string()
}

fn dump_type(schema: &SchemaSet, id: TypeId) -> TypeDump {
    let info = schema.type_info(id);
    let mut dump = TypeDump {
        name: info.full_name.to_string(),
        type_kind: info.kind.to_string(),
        base: info.base.map(|base| type_name(schema, base)),
        derivation: match info.derivation {
            DerivationMethod::None => None,
            DerivationMethod::Extension => Some("extension".to_string()),
            DerivationMethod::Restriction => Some("restriction".to_string()),
        },
        is_abstract: info.is_abstract,
        is_sealed: info.is_sealed,
        facets: Vec::new(),
        item_type: None,
        attributes: Vec::new(),
        simple_content: None,
        children: None,
    };
    match &info.content {
        TypeContent::Simple(simple) => {
            dump.facets = simple.facets.as_ref().map(dump_facets).unwrap_or_default();
            dump.item_type = simple.item_type.map(|item| type_name(schema, item));
        }
        TypeContent::Complex(complex) => {
            dump.attributes = complex
                .attributes
                .as_ref()
                .map(|set| dump_attributes(schema, set))
                .unwrap_or_default();
            match &complex.children {
                Some(ChildrenInfo::Simple(content)) => {
                    dump.simple_content = Some(type_name(schema, *content))
                }
                Some(ChildrenInfo::Set(set)) => dump.children = Some(dump_child_set(schema, set)),
                None => {}
            }
        }
    }
    dump
}

fn dump_facets(facets: &FacetSet) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(min) = facets.min_length {
        pairs.push(("min_length".to_string(), min.to_string()));
    }
    if let Some(max) = facets.max_length {
        pairs.push(("max_length".to_string(), max.to_string()));
    }
    if let Some(precision) = facets.precision {
        pairs.push(("precision".to_string(), precision.to_string()));
    }
    if let Some(scale) = facets.scale {
        pairs.push(("scale".to_string(), scale.to_string()));
    }
    if let Some(min) = &facets.min_value {
        pairs.push(("min_value".to_string(), min.to_string()));
    }
    if let Some(max) = &facets.max_value {
        pairs.push(("max_value".to_string(), max.to_string()));
    }
    if let Some(enumeration) = &facets.enumeration {
        for (value, display) in enumeration {
            let text = match display {
                Some(display) => format!("{} as {}", value, display),
                None => value.to_string(),
            };
            pairs.push(("enum".to_string(), text));
        }
    }
    for pattern in &facets.patterns {
        pairs.push(("pattern".to_string(), pattern.clone()));
    }
    pairs
}

fn dump_attributes(schema: &SchemaSet, set: &AttributeSetInfo) -> Vec<AttributeDump> {
    set.iter().map(|a| dump_attribute(schema, a)).collect()
}

fn dump_attribute(schema: &SchemaSet, info: &AttributeInfo) -> AttributeDump {
    AttributeDump {
        name: info.full_name.to_string(),
        type_name: type_name(schema, info.type_id),
        is_optional: info.is_optional,
        is_nullable: info.is_nullable,
        default_value: info.default_value.as_ref().map(|v| v.to_string()),
    }
}

fn dump_element(schema: &SchemaSet, info: &ElementInfo) -> ElementDump {
    ElementDump {
        name: info.full_name.to_string(),
        type_name: type_name(schema, info.type_id),
        is_nullable: info.is_nullable,
        is_abstract: info.is_abstract,
        is_sealed: info.is_sealed,
        substitutes: info
            .substituted
            .map(|id| schema.element(id).full_name.to_string()),
        references: info
            .referenced
            .map(|id| schema.element(id).full_name.to_string()),
    }
}

fn dump_child_set(schema: &SchemaSet, set: &ChildSetInfo) -> ChildSetDump {
    ChildSetDump {
        set_kind: match set.kind {
            ChildSetKind::Sequence => "sequence".to_string(),
            ChildSetKind::Choice => "choice".to_string(),
        },
        members: set.members.iter().map(|m| dump_child(schema, m)).collect(),
    }
}

fn dump_child(schema: &SchemaSet, child: &ChildInfo) -> ChildDump {
    let mut dump = ChildDump {
        member_name: child.member_name.clone(),
        is_optional: child.is_optional(),
        element: None,
        set: None,
        item: None,
        occurs: None,
    };
    match &child.kind {
        ChildKind::Element { element, .. } => dump.element = Some(dump_element(schema, element)),
        ChildKind::Set(set) => dump.set = Some(dump_child_set(schema, set)),
        ChildKind::List(list) => {
            dump.item = Some(Box::new(dump_child(schema, &list.item)));
            dump.occurs = Some(list.occurs.to_string());
        }
    }
    dump
}
