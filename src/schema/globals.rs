//! The compiled schema set
//!
//! A [`SchemaSet`] owns every symbol of one compilation in three arenas
//! (types, global attributes, global elements) and indexes the global ones by
//! namespace. Ids handed out by a set are only meaningful for that set.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::attributes::{AttributeId, AttributeInfo};
use super::builtins::TypeKind;
use super::elements::{ElementId, ElementInfo};
use super::types::{
    ComplexTypeInfo, DerivationMethod, SimpleTypeInfo, TypeContent, TypeId, TypeInfo,
};
use crate::diagnostics::Diagnostic;
use crate::namespaces::{FullName, SYSTEM_URI};
use crate::values::{AtomicValue, SimpleValue};

/// Id of any global declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalId {
    /// Global type
    Type(TypeId),
    /// Global attribute
    Attribute(AttributeId),
    /// Global element
    Element(ElementId),
}

impl GlobalId {
    /// Member kind name used in messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            GlobalId::Type(_) => "type",
            GlobalId::Attribute(_) => "attribute",
            GlobalId::Element(_) => "element",
        }
    }
}

/// The global members of one namespace, in declaration order
#[derive(Debug, Clone)]
pub struct NamespaceSymbol {
    /// Namespace URI
    pub uri: String,
    members: IndexMap<String, GlobalId>,
}

impl NamespaceSymbol {
    /// Create an empty namespace
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            members: IndexMap::new(),
        }
    }

    /// Get a member by local name
    pub fn get(&self, name: &str) -> Option<GlobalId> {
        self.members.get(name).copied()
    }

    /// Iterate members in declaration order
    pub fn members(&self) -> impl Iterator<Item = (&str, GlobalId)> {
        self.members.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the namespace has no member
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether this is the system namespace
    pub fn is_system(&self) -> bool {
        self.uri == SYSTEM_URI
    }
}

/// All symbols of one compilation
#[derive(Debug, Clone)]
pub struct SchemaSet {
    types: Vec<TypeInfo>,
    attributes: Vec<AttributeInfo>,
    elements: Vec<ElementInfo>,
    namespaces: IndexMap<String, NamespaceSymbol>,
    substitutors: HashMap<ElementId, Vec<ElementId>>,
}

impl Default for SchemaSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaSet {
    /// Create a set holding only the system namespace
    pub fn new() -> Self {
        let mut set = Self {
            types: Vec::new(),
            attributes: Vec::new(),
            elements: Vec::new(),
            namespaces: IndexMap::new(),
            substitutors: HashMap::new(),
        };
        for kind in TypeKind::ALL {
            let content = if kind.is_complex() {
                TypeContent::Complex(ComplexTypeInfo::default())
            } else {
                TypeContent::Simple(SimpleTypeInfo::default())
            };
            let base = kind.base_kind().map(|b| set.system_type(b));
            let id = set.add_type(TypeInfo {
                full_name: FullName::system(kind.name()),
                kind,
                base,
                derivation: if kind.base_kind().is_some() {
                    DerivationMethod::Restriction
                } else {
                    DerivationMethod::None
                },
                is_abstract: !kind.is_atomic(),
                is_sealed: false,
                content,
                span: None,
            });
            set.add_member(SYSTEM_URI, kind.name(), GlobalId::Type(id));
        }
        set
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub(crate) fn add_type(&mut self, info: TypeInfo) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(info);
        id
    }

    pub(crate) fn type_mut(&mut self, id: TypeId) -> &mut TypeInfo {
        &mut self.types[id.index()]
    }

    pub(crate) fn add_attribute(&mut self, info: AttributeInfo) -> AttributeId {
        let id = AttributeId(self.attributes.len() as u32);
        self.attributes.push(info);
        id
    }

    pub(crate) fn add_element(&mut self, info: ElementInfo) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(info);
        id
    }

    /// Register a global member. Returns `false` if the name is already taken.
    pub(crate) fn add_member(&mut self, uri: &str, name: &str, id: GlobalId) -> bool {
        let namespace = self
            .namespaces
            .entry(uri.to_string())
            .or_insert_with(|| NamespaceSymbol::new(uri));
        if namespace.members.contains_key(name) {
            return false;
        }
        namespace.members.insert(name.to_string(), id);
        true
    }

    pub(crate) fn add_substitutor(&mut self, head: ElementId, substitutor: ElementId) {
        let list = self.substitutors.entry(head).or_default();
        if !list.contains(&substitutor) {
            list.push(substitutor);
        }
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Get a type by id
    ///
    /// # Panics
    ///
    /// Panics if the id was not issued by this set.
    pub fn type_info(&self, id: TypeId) -> &TypeInfo {
        &self.types[id.index()]
    }

    /// Get a global attribute by id
    ///
    /// # Panics
    ///
    /// Panics if the id was not issued by this set.
    pub fn attribute(&self, id: AttributeId) -> &AttributeInfo {
        &self.attributes[id.index()]
    }

    /// Get a global element by id
    ///
    /// # Panics
    ///
    /// Panics if the id was not issued by this set.
    pub fn element(&self, id: ElementId) -> &ElementInfo {
        &self.elements[id.index()]
    }

    /// Id of the built-in type of a kind
    pub fn system_type(&self, kind: TypeKind) -> TypeId {
        let index = TypeKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default();
        TypeId(index as u32)
    }

    /// Find a global declaration by full name
    pub fn lookup(&self, name: &FullName) -> Option<GlobalId> {
        self.namespaces.get(&name.uri)?.get(&name.name)
    }

    /// Find a global type by full name
    pub fn lookup_type(&self, name: &FullName) -> Option<TypeId> {
        match self.lookup(name)? {
            GlobalId::Type(id) => Some(id),
            _ => None,
        }
    }

    /// Find a global attribute by full name
    pub fn lookup_attribute(&self, name: &FullName) -> Option<AttributeId> {
        match self.lookup(name)? {
            GlobalId::Attribute(id) => Some(id),
            _ => None,
        }
    }

    /// Find a global element by full name
    pub fn lookup_element(&self, name: &FullName) -> Option<ElementId> {
        match self.lookup(name)? {
            GlobalId::Element(id) => Some(id),
            _ => None,
        }
    }

    /// Get a namespace by URI
    pub fn namespace(&self, uri: &str) -> Option<&NamespaceSymbol> {
        self.namespaces.get(uri)
    }

    /// Iterate namespaces, system namespace first
    pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceSymbol> {
        self.namespaces.values()
    }

    /// Iterate all types with their ids
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeInfo)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId(i as u32), t))
    }

    /// Number of types, built-in ones included
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // -------------------------------------------------------------------------
    // Values
    // -------------------------------------------------------------------------

    /// Parse a literal as a value of a simple type
    ///
    /// List literals are whitespace-separated item literals. Facets are not
    /// checked; see [`SchemaSet::check_value`].
    pub fn parse_value(&self, id: TypeId, text: &str) -> Option<SimpleValue> {
        let info = self.type_info(id);
        if info.kind.is_atomic() {
            return AtomicValue::parse(info.kind, text).map(SimpleValue::Atomic);
        }
        if !info.kind.is_list() {
            return None;
        }
        let item = info.as_simple()?.item_type?;
        let item_kind = self.type_info(item).kind;
        if !item_kind.is_atomic() {
            return None;
        }
        text.split_whitespace()
            .map(|literal| AtomicValue::parse(item_kind, literal).map(SimpleValue::Atomic))
            .collect::<Option<Vec<_>>>()
            .map(SimpleValue::List)
    }

    /// Check a value against the facets of a simple type, and each list item
    /// against the facets of the item type
    pub fn check_value(&self, id: TypeId, value: &SimpleValue) -> Vec<Diagnostic> {
        let info = self.type_info(id);
        let mut failures = info
            .facets()
            .map(|facets| facets.validate(value))
            .unwrap_or_default();
        if let (Some(items), Some(item_type)) =
            (value.as_list(), info.as_simple().and_then(|s| s.item_type))
        {
            for item in items {
                failures.extend(self.check_value(item_type, item));
            }
        }
        failures
    }

    // -------------------------------------------------------------------------
    // Derivation and substitution
    // -------------------------------------------------------------------------

    /// Whether `derived` is `base` or derives from it through the base chain
    pub fn is_equal_or_derive_from(&self, derived: TypeId, base: TypeId) -> bool {
        let mut current = Some(derived);
        let mut steps = 0;
        while let Some(id) = current {
            if id == base {
                return true;
            }
            steps += 1;
            if steps > self.types.len() {
                return false;
            }
            current = self.types[id.index()].base;
        }
        false
    }

    /// Length of the base chain of a type
    pub fn derivation_depth(&self, id: TypeId) -> usize {
        let mut depth = 0;
        let mut current = self.types[id.index()].base;
        while let Some(base) = current {
            depth += 1;
            if depth > self.types.len() {
                break;
            }
            current = self.types[base.index()].base;
        }
        depth
    }

    /// Direct substitutors of a global element
    pub fn substitutors(&self, head: ElementId) -> &[ElementId] {
        self.substitutors
            .get(&head)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every element that can stand for `head`, directly or transitively,
    /// `head` excluded
    pub fn transitive_substitutors(&self, head: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(head);
        let mut pending = vec![head];
        while let Some(current) = pending.pop() {
            for &substitutor in self.substitutors(current) {
                if visited.insert(substitutor) {
                    result.push(substitutor);
                    pending.push(substitutor);
                }
            }
        }
        result
    }

    /// Whether `candidate` is `head` or one of its transitive substitutors
    pub fn is_equal_or_substitute(&self, candidate: ElementId, head: ElementId) -> bool {
        let mut current = Some(candidate);
        let mut steps = 0;
        while let Some(id) = current {
            if id == head {
                return true;
            }
            steps += 1;
            if steps > self.elements.len() {
                return false;
            }
            current = self.elements[id.index()].substituted;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_namespace() {
        let set = SchemaSet::new();
        let system = set.namespace(SYSTEM_URI).unwrap();
        assert_eq!(system.len(), TypeKind::ALL.len());
        assert!(system.is_system());

        let int32 = set.lookup_type(&FullName::system("Int32")).unwrap();
        assert_eq!(int32, set.system_type(TypeKind::Int32));
        assert_eq!(set.type_info(int32).kind, TypeKind::Int32);
    }

    #[test]
    fn test_system_derivation_chains() {
        let set = SchemaSet::new();
        let byte = set.system_type(TypeKind::Byte);
        let decimal = set.system_type(TypeKind::Decimal);
        let int64 = set.system_type(TypeKind::Int64);
        let atomic = set.system_type(TypeKind::AtomicType);
        let simple = set.system_type(TypeKind::SimpleType);

        assert!(set.is_equal_or_derive_from(byte, decimal));
        assert!(set.is_equal_or_derive_from(byte, simple));
        assert!(!set.is_equal_or_derive_from(byte, int64));
        assert!(!set.is_equal_or_derive_from(decimal, byte));
        assert!(set.is_equal_or_derive_from(atomic, atomic));
        assert_eq!(set.derivation_depth(decimal), 2);
    }

    #[test]
    fn test_roots_are_abstract() {
        let set = SchemaSet::new();
        assert!(set.type_info(set.system_type(TypeKind::ComplexType)).is_abstract);
        assert!(set.type_info(set.system_type(TypeKind::ListType)).is_abstract);
        assert!(!set.type_info(set.system_type(TypeKind::String)).is_abstract);
    }

    #[test]
    fn test_duplicate_member() {
        let mut set = SchemaSet::new();
        let id = set.system_type(TypeKind::String);
        assert!(set.add_member("urn:a", "Name", GlobalId::Type(id)));
        assert!(!set.add_member("urn:a", "Name", GlobalId::Type(id)));
        assert_eq!(set.namespace("urn:a").unwrap().len(), 1);
    }
}
