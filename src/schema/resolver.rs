//! Name and symbol resolution
//!
//! Names are resolved against the declarations of all namespace nodes of a
//! compilation. A qualified name `alias:Name` looks in the namespace bound to
//! the alias (`sys` always denotes the system namespace). An unqualified name
//! looks in the declaring namespace, then in every imported namespace, and
//! finally in the system namespace; two imports providing the same name make
//! the reference ambiguous.
//!
//! Each declaration is turned into a symbol at most once. The per-declaration
//! state moves from unresolved to in-progress to resolved; meeting an
//! in-progress declaration again means the declarations reference each other
//! in a cycle. Base-type and substitution chains are walked iteratively, so a
//! cycle of any length is reported exactly once without deep recursion.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use super::attributes::AttributeId;
use super::compiler::Compiler;
use super::elements::ElementId;
use super::globals::GlobalId;
use super::types::TypeId;
use crate::ast::{MemberNode, QualifiableNameNode, TypeBody};
use crate::diagnostics::DiagnosticCode;
use crate::error::{Error, Result};
use crate::namespaces::{FullName, SYSTEM_ALIAS, SYSTEM_URI};

/// A declaration: member `member` of namespace node `node`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct DeclRef {
    pub node: usize,
    pub member: usize,
}

/// Resolution state of one declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclState {
    Unresolved,
    InProgress,
    Resolved(GlobalId),
}

/// What a name denotes before its symbol is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// A built-in type
    System(TypeId),
    /// A declaration of this compilation
    Declared(DeclRef),
}

/// Declarations indexed by namespace URI and local name
///
/// Several namespace nodes with the same URI share one entry.
#[derive(Debug, Default)]
pub(crate) struct NameTable {
    namespaces: HashMap<String, IndexMap<String, DeclRef>>,
}

impl NameTable {
    pub fn add_namespace(&mut self, uri: &str) {
        self.namespaces.entry(uri.to_string()).or_default();
    }

    /// Register a declaration. Returns `false` if the name is already taken.
    pub fn insert(&mut self, uri: &str, name: &str, decl: DeclRef) -> bool {
        let members = self.namespaces.entry(uri.to_string()).or_default();
        if members.contains_key(name) {
            return false;
        }
        members.insert(name.to_string(), decl);
        true
    }

    pub fn get(&self, uri: &str, name: &str) -> Option<DeclRef> {
        self.namespaces.get(uri)?.get(name).copied()
    }

    pub fn contains_namespace(&self, uri: &str) -> bool {
        uri == SYSTEM_URI || self.namespaces.contains_key(uri)
    }
}

impl<'a> Compiler<'a> {
    // -------------------------------------------------------------------------
    // Names
    // -------------------------------------------------------------------------

    fn lookup_in(&self, uri: &str, name: &str) -> Option<Target> {
        if uri == SYSTEM_URI {
            self.schema
                .lookup_type(&FullName::system(name))
                .map(Target::System)
        } else {
            self.names.get(uri, name).map(Target::Declared)
        }
    }

    /// Resolve a name used in namespace node `node`
    pub(crate) fn resolve_name(&mut self, name: &QualifiableNameNode, node: usize) -> Result<Target> {
        let local = name.name.value.as_str();

        if let Some(alias) = &name.alias {
            let uri = if alias.value == SYSTEM_ALIAS {
                SYSTEM_URI.to_string()
            } else {
                match self.imports[node].get_uri(&alias.value) {
                    Some(uri) => uri.to_string(),
                    None => {
                        self.ctx.error(
                            DiagnosticCode::InvalidImportAliasReference,
                            format!("invalid import alias reference '{}'", alias.value),
                            alias.span.as_ref().or(name.span()),
                        );
                        return Err(Error::Aborted);
                    }
                }
            };
            return match self.lookup_in(&uri, local) {
                Some(target) => Ok(target),
                None => {
                    self.ctx.error(
                        DiagnosticCode::InvalidNameReference,
                        format!("invalid name reference '{}'", name),
                        name.span(),
                    );
                    Err(Error::Aborted)
                }
            };
        }

        let declaring = self.nodes[node].uri.as_str();
        if let Some(target) = self.lookup_in(declaring, local) {
            return Ok(target);
        }

        let mut found: Vec<(String, Target)> = Vec::new();
        for uri in self.imports[node].uris() {
            if uri == declaring {
                continue;
            }
            if let Some(target) = self.lookup_in(uri, local) {
                found.push((uri.to_string(), target));
            }
        }
        match found.len() {
            0 => {}
            1 => return Ok(found[0].1),
            _ => {
                let uris: Vec<&str> = found.iter().map(|(uri, _)| uri.as_str()).collect();
                self.ctx.error(
                    DiagnosticCode::AmbiguousNameReference,
                    format!(
                        "ambiguous name reference '{}': found in {}",
                        name,
                        uris.join(", ")
                    ),
                    name.span(),
                );
                return Err(Error::Aborted);
            }
        }

        if let Some(target) = self.lookup_in(SYSTEM_URI, local) {
            return Ok(target);
        }

        self.ctx.error(
            DiagnosticCode::InvalidNameReference,
            format!("invalid name reference '{}'", name),
            name.span(),
        );
        Err(Error::Aborted)
    }

    /// Resolve a name that must denote a type
    pub(crate) fn resolve_type_name(&mut self, name: &QualifiableNameNode, node: usize) -> Result<TypeId> {
        match self.resolve_name(name, node)? {
            Target::System(id) => Ok(id),
            Target::Declared(decl) => match self.member(decl) {
                MemberNode::Type(_) => self.resolve_type_decl(decl),
                other => {
                    self.ctx.error(
                        DiagnosticCode::InvalidTypeNameReference,
                        format!(
                            "'{}' is {}, a type is required",
                            name,
                            member_kind_name(other)
                        ),
                        name.span(),
                    );
                    Err(Error::Aborted)
                }
            },
        }
    }

    /// Resolve a name that must denote a global attribute
    pub(crate) fn resolve_attribute_name(
        &mut self,
        name: &QualifiableNameNode,
        node: usize,
    ) -> Result<AttributeId> {
        match self.resolve_name(name, node)? {
            Target::Declared(decl) if matches!(self.member(decl), MemberNode::Attribute(_)) => {
                match self.resolve_decl(decl)? {
                    GlobalId::Attribute(id) => Ok(id),
                    _ => Err(self.internal_error("attribute declaration built as another kind")),
                }
            }
            _ => {
                self.ctx.error(
                    DiagnosticCode::InvalidAttributeNameReference,
                    format!("'{}' is not a global attribute", name),
                    name.span(),
                );
                Err(Error::Aborted)
            }
        }
    }

    /// Resolve a name that must denote a global element
    pub(crate) fn resolve_element_name(
        &mut self,
        name: &QualifiableNameNode,
        node: usize,
    ) -> Result<ElementId> {
        match self.resolve_name(name, node)? {
            Target::Declared(decl) if matches!(self.member(decl), MemberNode::Element(_)) => {
                self.resolve_element_decl(decl)
            }
            _ => {
                self.ctx.error(
                    DiagnosticCode::InvalidElementNameReference,
                    format!("'{}' is not a global element", name),
                    name.span(),
                );
                Err(Error::Aborted)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    pub(crate) fn state(&self, decl: DeclRef) -> DeclState {
        self.states
            .get(&decl)
            .copied()
            .unwrap_or(DeclState::Unresolved)
    }

    /// Build the symbol of a declaration, or return the memoized one
    pub(crate) fn resolve_decl(&mut self, decl: DeclRef) -> Result<GlobalId> {
        if let DeclState::Resolved(id) = self.state(decl) {
            debug!(name = %self.decl_name(decl), "memoized symbol");
            return Ok(id);
        }
        match self.member(decl) {
            MemberNode::Type(_) => self.resolve_type_decl(decl).map(GlobalId::Type),
            MemberNode::Element(_) => self.resolve_element_decl(decl).map(GlobalId::Element),
            MemberNode::Attribute(node) => {
                if self.state(decl) == DeclState::InProgress {
                    return Err(self.circular_reference(decl, node.type_name.span()));
                }
                self.states.insert(decl, DeclState::InProgress);
                match self.build_global_attribute(decl, node) {
                    Ok(id) => {
                        self.states
                            .insert(decl, DeclState::Resolved(GlobalId::Attribute(id)));
                        Ok(GlobalId::Attribute(id))
                    }
                    Err(e) => {
                        self.states.insert(decl, DeclState::Unresolved);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Build the header of a type declaration and of every declaration on its
    /// base chain
    pub(crate) fn resolve_type_decl(&mut self, decl: DeclRef) -> Result<TypeId> {
        let mut chain: Vec<DeclRef> = Vec::new();
        let mut current = decl;
        let base = loop {
            match self.state(current) {
                DeclState::Resolved(GlobalId::Type(id)) => {
                    if chain.is_empty() {
                        debug!(name = %self.decl_name(current), "memoized symbol");
                        return Ok(id);
                    }
                    break id;
                }
                DeclState::Resolved(_) => {
                    self.reset(&chain);
                    return Err(self.internal_error("type declaration built as another kind"));
                }
                DeclState::InProgress => {
                    let closing = chain.last().copied().unwrap_or(current);
                    let span = self.type_node(closing).and_then(base_name).and_then(|b| b.span());
                    let error = self.circular_reference(current, span);
                    self.reset(&chain);
                    return Err(error);
                }
                DeclState::Unresolved => {}
            }

            self.states.insert(current, DeclState::InProgress);
            chain.push(current);

            let node = match self.type_node(current) {
                Some(node) => node,
                None => {
                    self.reset(&chain);
                    return Err(self.internal_error("type declaration expected"));
                }
            };
            let base_name = match base_name(node) {
                Some(name) => name,
                None => break self.implicit_base(node),
            };
            let target = match self.resolve_name(base_name, current.node) {
                Ok(target) => target,
                Err(e) => {
                    self.reset(&chain);
                    return Err(e);
                }
            };
            match target {
                Target::System(id) => break id,
                Target::Declared(next) => {
                    if let MemberNode::Type(_) = self.member(next) {
                        current = next;
                    } else {
                        self.ctx.error(
                            DiagnosticCode::InvalidTypeNameReference,
                            format!("'{}' is not a type", base_name),
                            base_name.span(),
                        );
                        self.reset(&chain);
                        return Err(Error::Aborted);
                    }
                }
            }
        };

        let mut base = base;
        while let Some(decl) = chain.pop() {
            match self.create_type_header(decl, base) {
                Ok(id) => {
                    self.states.insert(decl, DeclState::Resolved(GlobalId::Type(id)));
                    base = id;
                }
                Err(e) => {
                    chain.push(decl);
                    self.reset(&chain);
                    return Err(e);
                }
            }
        }
        Ok(base)
    }

    /// Build a global element declaration and every element on its
    /// substitution chain
    pub(crate) fn resolve_element_decl(&mut self, decl: DeclRef) -> Result<ElementId> {
        let mut chain: Vec<DeclRef> = Vec::new();
        let mut current = decl;
        let mut head: Option<ElementId> = None;
        loop {
            match self.state(current) {
                DeclState::Resolved(GlobalId::Element(id)) => {
                    if chain.is_empty() {
                        debug!(name = %self.decl_name(current), "memoized symbol");
                        return Ok(id);
                    }
                    head = Some(id);
                    break;
                }
                DeclState::Resolved(_) => {
                    self.reset(&chain);
                    return Err(self.internal_error("element declaration built as another kind"));
                }
                DeclState::InProgress => {
                    let closing = chain.last().copied().unwrap_or(current);
                    let span = match self.member(closing) {
                        MemberNode::Element(e) => e.substitutes.as_ref().and_then(|s| s.span()),
                        _ => None,
                    };
                    let error = self.circular_reference(current, span);
                    self.reset(&chain);
                    return Err(error);
                }
                DeclState::Unresolved => {}
            }

            self.states.insert(current, DeclState::InProgress);
            chain.push(current);

            let substitutes = match self.member(current) {
                MemberNode::Element(e) => e.substitutes.as_ref(),
                _ => None,
            };
            let substitutes = match substitutes {
                Some(name) => name,
                None => break,
            };
            match self.resolve_name(substitutes, current.node) {
                Ok(Target::Declared(next)) if matches!(self.member(next), MemberNode::Element(_)) => {
                    current = next;
                }
                Ok(_) => {
                    self.ctx.error(
                        DiagnosticCode::InvalidElementNameReference,
                        format!("'{}' is not a global element", substitutes),
                        substitutes.span(),
                    );
                    self.reset(&chain);
                    return Err(Error::Aborted);
                }
                Err(e) => {
                    self.reset(&chain);
                    return Err(e);
                }
            }
        }

        let mut result = None;
        while let Some(decl) = chain.pop() {
            match self.create_global_element(decl, head) {
                Ok(id) => {
                    self.states
                        .insert(decl, DeclState::Resolved(GlobalId::Element(id)));
                    head = Some(id);
                    result = Some(id);
                }
                Err(e) => {
                    chain.push(decl);
                    self.reset(&chain);
                    return Err(e);
                }
            }
        }
        result.ok_or_else(|| self.internal_error("empty substitution chain"))
    }

    fn reset(&mut self, chain: &[DeclRef]) {
        for decl in chain {
            if self.state(*decl) == DeclState::InProgress {
                self.states.insert(*decl, DeclState::Unresolved);
            }
        }
    }

    fn circular_reference(&mut self, decl: DeclRef, span: Option<&crate::diagnostics::TextSpan>) -> Error {
        let name = self.decl_name(decl);
        let span = span.or(self.member(decl).name().span.as_ref()).cloned();
        self.ctx.error(
            DiagnosticCode::CircularReferenceDetected,
            format!("circular reference detected at '{}'", name),
            span.as_ref(),
        );
        Error::Aborted
    }

    pub(crate) fn internal_error(&mut self, message: &str) -> Error {
        self.ctx.error(DiagnosticCode::InternalCompilerError, message, None);
        Error::Aborted
    }

    pub(crate) fn decl_name(&self, decl: DeclRef) -> FullName {
        FullName::new(
            self.nodes[decl.node].uri.clone(),
            self.member(decl).name().value.clone(),
        )
    }
}

fn base_name(node: &crate::ast::TypeNode) -> Option<&QualifiableNameNode> {
    match &node.body {
        TypeBody::Extension { base, .. } | TypeBody::Restriction { base, .. } => Some(base),
        TypeBody::List { .. } | TypeBody::Complex { .. } => None,
    }
}

fn member_kind_name(member: &MemberNode) -> &'static str {
    match member {
        MemberNode::Type(_) => "a type",
        MemberNode::Attribute(_) => "an attribute",
        MemberNode::Element(_) => "an element",
    }
}
