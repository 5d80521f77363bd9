//! Schema compilation
//!
//! [`compile`] turns the parse trees of one or more namespace declarations
//! into a [`SchemaSet`]. Compilation runs in four passes:
//!
//! 1. register every namespace and its member names, merging declarations
//!    that share a URI;
//! 2. build the import table of each declaration;
//! 3. resolve every declaration into a symbol header (kind, base, flags),
//!    resolving referenced declarations on demand;
//! 4. build the body of every type (effective attributes, children and
//!    facets), bases before derived types.
//!
//! Most faults are recorded and compilation continues. Faults that leave a
//! name unresolved abort the whole pass; the diagnostic explaining the abort
//! is always recorded first.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use super::attributes::{AttributeId, AttributeInfo, AttributeSetInfo, DeclarationKind};
use super::builtins::TypeKind;
use super::elements::{ElementId, ElementInfo};
use super::globals::SchemaSet;
use super::groups::{ChildInfo, ChildKind, ChildListInfo, ChildSetInfo, ChildSetKind};
use super::particles::Occurs;
use super::resolver::{DeclRef, DeclState, NameTable};
use super::types::{
    ComplexTypeInfo, DerivationMethod, SimpleTypeInfo, TypeContent, TypeId, TypeInfo,
};
use crate::ast::{
    self, AttributeMemberNode, AttributesNode, ChildMemberNode, ChildSetNode, ChildrenNode,
    GlobalAttributeNode, MemberNode, NamespaceNode, OccurrenceNode, QualifiableNameNode,
    TypeBody, TypeNode,
};
use crate::diagnostics::{Context, Diagnostic, DiagnosticCode, TextPosition, TextSpan};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::names::is_valid_name;
use crate::namespaces::{FullName, ImportTable, SYSTEM_ALIAS, SYSTEM_URI};
use crate::values::SimpleValue;

/// Compiler configuration
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Depth limits
    pub limits: Limits,
}

/// Result of a compilation
#[derive(Debug)]
pub struct CompileOutput {
    /// Every diagnostic recorded, in order
    pub diagnostics: Vec<Diagnostic>,
    /// The compiled schema, present iff compilation succeeded
    pub schema: Option<SchemaSet>,
    /// Whether no error was recorded
    pub is_valid: bool,
}

impl CompileOutput {
    /// Error-severity diagnostics
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Number of diagnostics carrying `code`
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }
}

/// Compile namespace declarations
pub fn compile(namespaces: &[NamespaceNode], options: &CompilerOptions) -> CompileOutput {
    info!(declarations = namespaces.len(), "compiling schema");
    let mut compiler = Compiler::new(namespaces, options);
    let result = compiler.run();
    if let Err(e) = &result {
        warn!("compilation stopped: {}", e);
        if !e.is_abort() {
            compiler.ctx.error(
                DiagnosticCode::InternalCompilerError,
                e.to_string(),
                None,
            );
        }
    }

    let is_valid = result.is_ok() && !compiler.ctx.has_errors();
    let diagnostics = compiler.ctx.into_diagnostics();
    info!(
        is_valid,
        diagnostics = diagnostics.len(),
        "schema compilation finished"
    );
    CompileOutput {
        diagnostics,
        schema: if is_valid {
            Some(compiler.schema)
        } else {
            None
        },
        is_valid,
    }
}

/// Load serialized parse trees from files and compile them
///
/// A file that cannot be read yields `InvalidSchemaFile`; a file that is not
/// a valid parse tree yields `Parsing`. Either makes the output invalid.
pub fn compile_files<P: AsRef<Path>>(paths: &[P], options: &CompilerOptions) -> CompileOutput {
    let mut load_errors = Vec::new();
    let mut namespaces = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match ast::load_namespaces(path) {
            Ok(nodes) => namespaces.extend(nodes),
            Err(Error::Json(e)) => {
                let position = TextPosition::new(e.line() as u32, e.column() as u32);
                let span = TextSpan::new(path.display().to_string(), position, position);
                load_errors.push(
                    Diagnostic::error(DiagnosticCode::Parsing, e.to_string())
                        .with_span(Some(&span)),
                );
            }
            Err(e) => load_errors.push(Diagnostic::error(
                DiagnosticCode::InvalidSchemaFile,
                format!("cannot load '{}': {}", path.display(), e),
            )),
        }
    }
    if !load_errors.is_empty() {
        return CompileOutput {
            diagnostics: load_errors,
            schema: None,
            is_valid: false,
        };
    }
    compile(&namespaces, options)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyState {
    Pending,
    Building,
    Done,
}

/// State of one compilation
pub(crate) struct Compiler<'a> {
    pub(crate) nodes: &'a [NamespaceNode],
    pub(crate) options: &'a CompilerOptions,
    pub(crate) ctx: Context,
    pub(crate) schema: SchemaSet,
    pub(crate) names: NameTable,
    pub(crate) imports: Vec<ImportTable>,
    pub(crate) states: HashMap<DeclRef, DeclState>,
    bodies: HashMap<TypeId, (DeclRef, BodyState)>,
    skipped: Vec<bool>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(nodes: &'a [NamespaceNode], options: &'a CompilerOptions) -> Self {
        Self {
            nodes,
            options,
            ctx: Context::new(),
            schema: SchemaSet::new(),
            names: NameTable::default(),
            imports: vec![ImportTable::new(); nodes.len()],
            states: HashMap::new(),
            bodies: HashMap::new(),
            skipped: vec![false; nodes.len()],
        }
    }

    fn run(&mut self) -> Result<()> {
        self.register_namespaces();
        self.register_imports();

        for decl in self.declarations() {
            self.resolve_decl(decl)?;
        }

        let mut pending: Vec<TypeId> = self.bodies.keys().copied().collect();
        pending.sort();
        for id in pending {
            self.ensure_body(id)?;
        }

        self.publish();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    pub(crate) fn register_namespaces(&mut self) {
        let nodes = self.nodes;
        for (index, node) in nodes.iter().enumerate() {
            if node.uri == SYSTEM_URI {
                self.ctx.error(
                    DiagnosticCode::InvalidNamespaceReference,
                    format!("namespace '{}' is reserved for built-in types", SYSTEM_URI),
                    node.span.as_ref(),
                );
                self.skipped[index] = true;
                continue;
            }
            self.names.add_namespace(&node.uri);
            for (position, member) in node.members.iter().enumerate() {
                let name = member.name();
                if !is_valid_name(&name.value) {
                    self.ctx.error(
                        DiagnosticCode::Parsing,
                        format!("invalid identifier '{}'", name.value),
                        name.span.as_ref(),
                    );
                    continue;
                }
                let decl = DeclRef {
                    node: index,
                    member: position,
                };
                if !self.names.insert(&node.uri, &name.value, decl) {
                    self.ctx.error(
                        DiagnosticCode::DuplicateNamespaceMember,
                        format!(
                            "duplicate namespace member '{}' in '{}'",
                            name.value, node.uri
                        ),
                        name.span.as_ref(),
                    );
                }
            }
        }
    }

    pub(crate) fn register_imports(&mut self) {
        let nodes = self.nodes;
        for (index, node) in nodes.iter().enumerate() {
            if self.skipped[index] {
                continue;
            }
            for import in &node.imports {
                let alias = import.alias.as_ref();
                if let Some(alias) = alias {
                    if alias.value == SYSTEM_ALIAS {
                        self.ctx.error(
                            DiagnosticCode::AliasSysIsReserved,
                            format!("alias '{}' is reserved", SYSTEM_ALIAS),
                            alias.span.as_ref().or(import.span.as_ref()),
                        );
                        continue;
                    }
                }
                if !self.names.contains_namespace(&import.uri) {
                    self.ctx.error(
                        DiagnosticCode::InvalidNamespaceReference,
                        format!("invalid namespace reference '{}'", import.uri),
                        import.span.as_ref(),
                    );
                    continue;
                }
                if !self.imports[index].add(import.uri.as_str(), alias.map(|a| a.value.as_str())) {
                    self.ctx.error(
                        DiagnosticCode::DuplicateImportAlias,
                        format!(
                            "duplicate import alias '{}'",
                            alias.map(|a| a.value.as_str()).unwrap_or_default()
                        ),
                        alias.and_then(|a| a.span.as_ref()).or(import.span.as_ref()),
                    );
                }
            }
        }
    }

    /// Registered declarations in declaration order
    fn declarations(&self) -> Vec<DeclRef> {
        let mut result = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if self.skipped[index] {
                continue;
            }
            for (position, member) in node.members.iter().enumerate() {
                let decl = DeclRef {
                    node: index,
                    member: position,
                };
                if self.names.get(&node.uri, &member.name().value) == Some(decl) {
                    result.push(decl);
                }
            }
        }
        result
    }

    /// Expose resolved members in declaration order
    fn publish(&mut self) {
        for decl in self.declarations() {
            if let DeclState::Resolved(id) = self.state(decl) {
                let uri = &self.nodes[decl.node].uri;
                let name = &self.member(decl).name().value;
                self.schema.add_member(uri, name, id);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Parse-tree access
    // -------------------------------------------------------------------------

    pub(crate) fn member(&self, decl: DeclRef) -> &'a MemberNode {
        let nodes = self.nodes;
        &nodes[decl.node].members[decl.member]
    }

    pub(crate) fn type_node(&self, decl: DeclRef) -> Option<&'a TypeNode> {
        match self.member(decl) {
            MemberNode::Type(node) => Some(node),
            _ => None,
        }
    }

    pub(crate) fn namespace_uri(&self, node: usize) -> &'a str {
        let nodes = self.nodes;
        &nodes[node].uri
    }

    /// Base of a type declared without `extends` or `restricts`
    pub(crate) fn implicit_base(&self, node: &TypeNode) -> TypeId {
        match node.body {
            TypeBody::List { .. } => self.schema.system_type(TypeKind::ListType),
            _ => self.schema.system_type(TypeKind::ComplexType),
        }
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    /// Create the symbol of a type declaration whose base is already built
    pub(crate) fn create_type_header(&mut self, decl: DeclRef, base: TypeId) -> Result<TypeId> {
        let node = match self.type_node(decl) {
            Some(node) => node,
            None => return Err(self.internal_error("type declaration expected")),
        };

        let (kind, derivation) = match &node.body {
            TypeBody::List { .. } => (TypeKind::ListType, DerivationMethod::None),
            TypeBody::Complex { .. } => (TypeKind::ComplexType, DerivationMethod::None),
            TypeBody::Extension { base: name, .. } => {
                self.check_derivable(base, name.span());
                (TypeKind::ComplexType, DerivationMethod::Extension)
            }
            TypeBody::Restriction { base: name, .. } => {
                self.check_derivable(base, name.span());
                (self.schema.type_info(base).kind, DerivationMethod::Restriction)
            }
        };

        let content = if kind.is_complex() {
            TypeContent::Complex(ComplexTypeInfo::default())
        } else {
            TypeContent::Simple(SimpleTypeInfo::default())
        };
        let full_name = self.decl_name(decl);
        let id = self.schema.add_type(TypeInfo {
            full_name: full_name.clone(),
            kind,
            base: Some(base),
            derivation,
            is_abstract: node.is_abstract,
            is_sealed: node.is_sealed,
            content,
            span: node.name.span.clone(),
        });
        self.bodies.insert(id, (decl, BodyState::Pending));
        debug!(name = %full_name, kind = %kind, "created type");

        let depth = self.schema.derivation_depth(id);
        if let Err(e) = self.options.limits.check_derivation_depth(depth) {
            self.ctx.error(
                DiagnosticCode::DerivationTooDeep,
                format!("type '{}': {}", full_name, e),
                node.name.span.as_ref(),
            );
        }
        Ok(id)
    }

    /// Build the body of a type and of every pending type on its base chain
    pub(crate) fn ensure_body(&mut self, id: TypeId) -> Result<()> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(type_id) = current {
            match self.bodies.get(&type_id) {
                Some((decl, BodyState::Pending)) => chain.push((type_id, *decl)),
                Some((_, BodyState::Building)) => {
                    return Err(self.internal_error("type body re-entered while building"));
                }
                Some((_, BodyState::Done)) | None => break,
            }
            current = self.schema.type_info(type_id).base;
        }

        while let Some((type_id, decl)) = chain.pop() {
            self.bodies.insert(type_id, (decl, BodyState::Building));
            self.build_body(type_id, decl)?;
            self.bodies.insert(type_id, (decl, BodyState::Done));
        }
        Ok(())
    }

    fn build_body(&mut self, id: TypeId, decl: DeclRef) -> Result<()> {
        let node = match self.type_node(decl) {
            Some(node) => node,
            None => return Err(self.internal_error("type declaration expected")),
        };
        let ns = decl.node;
        match &node.body {
            TypeBody::List { item } => {
                let item_type = self.resolve_simple_type(item, ns)?;
                self.set_content(
                    id,
                    TypeContent::Simple(SimpleTypeInfo {
                        facets: None,
                        item_type: Some(item_type),
                    }),
                );
            }
            TypeBody::Complex {
                attributes,
                children,
            } => {
                let attributes = match attributes {
                    Some(block) => Some(self.build_attribute_set(block, ns)?),
                    None => None,
                };
                let children = match children {
                    Some(children) => self.build_children(children, ns)?,
                    None => None,
                };
                self.set_content(
                    id,
                    TypeContent::Complex(ComplexTypeInfo {
                        attributes,
                        children,
                    }),
                );
            }
            TypeBody::Extension {
                attributes,
                children,
                ..
            } => self.build_extension(id, ns, attributes.as_ref(), children.as_ref())?,
            TypeBody::Restriction {
                facets,
                attributes,
                children,
                ..
            } => self.build_restriction(
                id,
                ns,
                facets.as_ref(),
                attributes.as_ref(),
                children.as_ref(),
            )?,
        }
        Ok(())
    }

    pub(crate) fn set_content(&mut self, id: TypeId, content: TypeContent) {
        self.schema.type_mut(id).content = content;
    }

    /// Resolve a type name that must denote a simple type
    ///
    /// A complex type is reported and still returned so that compilation can
    /// go on.
    pub(crate) fn resolve_simple_type(
        &mut self,
        name: &QualifiableNameNode,
        ns: usize,
    ) -> Result<TypeId> {
        let id = self.resolve_type_name(name, ns)?;
        if !self.schema.type_info(id).is_simple() {
            self.ctx.error(
                DiagnosticCode::TypeIsNotSimple,
                format!("type '{}' is not a simple type", name),
                name.span(),
            );
        }
        Ok(id)
    }

    /// Parse and check a default value literal
    pub(crate) fn default_value(
        &mut self,
        type_id: TypeId,
        text: Option<&str>,
        span: Option<&TextSpan>,
    ) -> Result<Option<SimpleValue>> {
        let text = match text {
            Some(text) => text,
            None => return Ok(None),
        };
        if !self.schema.type_info(type_id).is_simple() {
            return Ok(None);
        }
        self.ensure_body(type_id)?;

        let type_name = &self.schema.type_info(type_id).full_name;
        match self.schema.parse_value(type_id, text) {
            Some(value) => {
                let failures = self.schema.check_value(type_id, &value);
                if let Some(failure) = failures.first() {
                    let message = format!(
                        "default value '{}' is invalid for '{}': {}",
                        text, type_name, failure.message
                    );
                    self.ctx
                        .error(DiagnosticCode::InvalidAtomValueLiteral, message, span);
                    Ok(None)
                } else {
                    Ok(Some(value))
                }
            }
            None => {
                let message = format!("invalid literal '{}' for type '{}'", text, type_name);
                self.ctx
                    .error(DiagnosticCode::InvalidAtomValueLiteral, message, span);
                Ok(None)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    pub(crate) fn build_global_attribute(
        &mut self,
        decl: DeclRef,
        node: &'a GlobalAttributeNode,
    ) -> Result<AttributeId> {
        let type_id = self.resolve_simple_type(&node.type_name, decl.node)?;
        let span = node.span.as_ref().or(node.name.span.as_ref());
        let default_value = self.default_value(type_id, node.default_value.as_deref(), span)?;
        let full_name = self.decl_name(decl);
        debug!(name = %full_name, "created global attribute");
        Ok(self.schema.add_attribute(AttributeInfo {
            full_name,
            kind: DeclarationKind::Global,
            type_id,
            is_optional: false,
            is_nullable: node.is_nullable,
            default_value,
            referenced: None,
            span: span.cloned(),
        }))
    }

    /// Build a local attribute or an attribute reference; `None` for deletions
    pub(crate) fn build_attribute(
        &mut self,
        member: &'a AttributeMemberNode,
        ns: usize,
    ) -> Result<Option<AttributeInfo>> {
        match member {
            AttributeMemberNode::Local(node) => {
                let type_id = self.resolve_simple_type(&node.type_name, ns)?;
                let span = member.span();
                let default_value =
                    self.default_value(type_id, node.default_value.as_deref(), span)?;
                Ok(Some(AttributeInfo {
                    full_name: FullName::local(node.name.value.as_str()),
                    kind: DeclarationKind::Local,
                    type_id,
                    is_optional: node.is_optional,
                    is_nullable: node.is_nullable,
                    default_value,
                    referenced: None,
                    span: span.cloned(),
                }))
            }
            AttributeMemberNode::Reference(node) => {
                let id = self.resolve_attribute_name(&node.reference, ns)?;
                let global = self.schema.attribute(id);
                Ok(Some(AttributeInfo {
                    full_name: global.full_name.clone(),
                    kind: DeclarationKind::Reference,
                    type_id: global.type_id,
                    is_optional: node.is_optional,
                    is_nullable: global.is_nullable,
                    default_value: global.default_value.clone(),
                    referenced: Some(id),
                    span: member.span().cloned(),
                }))
            }
            AttributeMemberNode::Delete(_) => Ok(None),
        }
    }

    /// Build the attribute set of a type that inherits no attributes
    pub(crate) fn build_attribute_set(
        &mut self,
        block: &'a AttributesNode,
        ns: usize,
    ) -> Result<AttributeSetInfo> {
        let mut set = AttributeSetInfo::new();
        self.add_attributes(&mut set, block, ns)?;
        Ok(set)
    }

    /// Add the attributes of a block to a set, reporting name collisions
    pub(crate) fn add_attributes(
        &mut self,
        set: &mut AttributeSetInfo,
        block: &'a AttributesNode,
        ns: usize,
    ) -> Result<()> {
        for member in &block.members {
            if let AttributeMemberNode::Delete(node) = member {
                self.ctx.error(
                    DiagnosticCode::CannotFindRestrictedAttribute,
                    format!(
                        "cannot delete attribute '{}' outside a restriction",
                        node.name.value
                    ),
                    member.span(),
                );
                continue;
            }
            if let Some(attribute) = self.build_attribute(member, ns)? {
                let name = attribute.name().to_string();
                if !set.insert(attribute) {
                    self.ctx.error(
                        DiagnosticCode::DuplicateAttributeName,
                        format!("duplicate attribute name '{}'", name),
                        member.span(),
                    );
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Elements
    // -------------------------------------------------------------------------

    /// Create the symbol of a global element whose substitution head, if any,
    /// is already built
    pub(crate) fn create_global_element(
        &mut self,
        decl: DeclRef,
        head: Option<ElementId>,
    ) -> Result<ElementId> {
        let node = match self.member(decl) {
            MemberNode::Element(node) => node,
            _ => return Err(self.internal_error("element declaration expected")),
        };
        let type_id = self.resolve_type_name(&node.type_name, decl.node)?;
        let full_name = self.decl_name(decl);
        let id = self.schema.add_element(ElementInfo {
            full_name: full_name.clone(),
            kind: DeclarationKind::Global,
            type_id,
            is_nullable: node.is_nullable,
            is_abstract: node.is_abstract,
            is_sealed: node.is_sealed,
            substituted: head,
            referenced: None,
            span: node.span.clone().or_else(|| node.name.span.clone()),
        });
        debug!(name = %full_name, "created global element");

        if let Some(head) = head {
            let span = node.substitutes.as_ref().and_then(|s| s.span());
            self.check_substitution(id, head, span);
            self.schema.add_substitutor(head, id);
        }
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    /// Build the children of a type that inherits no children
    pub(crate) fn build_children(
        &mut self,
        node: &'a ChildrenNode,
        ns: usize,
    ) -> Result<Option<super::types::ChildrenInfo>> {
        use super::types::ChildrenInfo;
        match node {
            ChildrenNode::Simple { type_name, .. } => {
                let id = self.resolve_simple_type(type_name, ns)?;
                Ok(Some(ChildrenInfo::Simple(id)))
            }
            ChildrenNode::Set(set) => Ok(Some(ChildrenInfo::Set(self.build_child_set(set, ns)?))),
        }
    }

    pub(crate) fn build_child_set(&mut self, node: &'a ChildSetNode, ns: usize) -> Result<ChildSetInfo> {
        let mut set = ChildSetInfo::new(node.kind);
        set.span = node.span.clone();
        self.add_members(&mut set, node, ns)?;
        Ok(set)
    }

    /// Append the members of a set node to `set`, reporting name collisions
    pub(crate) fn add_members(
        &mut self,
        set: &mut ChildSetInfo,
        node: &'a ChildSetNode,
        ns: usize,
    ) -> Result<()> {
        for member in &node.members {
            if let ChildMemberNode::Delete(delete) = member {
                self.ctx.error(
                    DiagnosticCode::CannotFindRestrictedChildMember,
                    format!(
                        "cannot delete member '{}' outside a restriction",
                        delete.name.value
                    ),
                    member.span(),
                );
                continue;
            }
            let order = set.members.len();
            if let Some(child) = self.build_member(member, order, ns)? {
                if set.contains(&child.member_name) {
                    self.ctx.error(
                        DiagnosticCode::DuplicateMemberName,
                        format!("duplicate member name '{}'", child.member_name),
                        member.span(),
                    );
                } else {
                    set.members.push(child);
                }
            }
        }
        Ok(())
    }

    /// Member name of a member node: the element name, the reference's member
    /// name or referenced local name, or the set name
    pub(crate) fn member_name(member: &ChildMemberNode, order: usize) -> String {
        match member {
            ChildMemberNode::Element(node) => node.name.value.clone(),
            ChildMemberNode::Reference(node) => node
                .member_name
                .as_ref()
                .map(|n| n.value.clone())
                .unwrap_or_else(|| node.reference.name.value.clone()),
            ChildMemberNode::Set(node) => match &node.name {
                Some(name) => name.value.clone(),
                None => match node.set.kind {
                    ChildSetKind::Sequence => format!("Seq{}", order),
                    ChildSetKind::Choice => format!("Choice{}", order),
                },
            },
            ChildMemberNode::Delete(node) => node.name.value.clone(),
        }
    }

    /// Build one member; `None` if it was rejected or is a deletion
    pub(crate) fn build_member(
        &mut self,
        member: &'a ChildMemberNode,
        order: usize,
        ns: usize,
    ) -> Result<Option<ChildInfo>> {
        let member_name = Self::member_name(member, order);
        let span = member.span().cloned();
        let occurs = match self.occurs(member.occurrence()) {
            Some(occurs) => occurs,
            None => return Ok(None),
        };
        let single = occurs.max == 1;
        let optional = single && occurs.min == 0;

        let kind = match member {
            ChildMemberNode::Element(node) => {
                let type_id = self.resolve_type_name(&node.type_name, ns)?;
                ChildKind::Element {
                    element: ElementInfo {
                        full_name: FullName::new(self.namespace_uri(ns), node.name.value.as_str()),
                        kind: DeclarationKind::Local,
                        type_id,
                        is_nullable: node.is_nullable,
                        is_abstract: false,
                        is_sealed: false,
                        substituted: None,
                        referenced: None,
                        span: span.clone(),
                    },
                    is_optional: optional,
                }
            }
            ChildMemberNode::Reference(node) => {
                let id = self.resolve_element_name(&node.reference, ns)?;
                ChildKind::Element {
                    element: self.element_reference(id, span.clone()),
                    is_optional: optional,
                }
            }
            ChildMemberNode::Set(node) => {
                let set = self.build_child_set(&node.set, ns)?;
                if occurs == Occurs::once() {
                    ChildKind::Set(set)
                } else {
                    return Ok(Some(Self::wrap_list(member_name, order, ChildKind::Set(set), occurs, span)));
                }
            }
            ChildMemberNode::Delete(_) => return Ok(None),
        };

        if single {
            Ok(Some(ChildInfo {
                member_name,
                order,
                kind,
                span,
            }))
        } else {
            let kind = match kind {
                ChildKind::Element { element, .. } => ChildKind::Element {
                    element,
                    is_optional: false,
                },
                other => other,
            };
            Ok(Some(Self::wrap_list(member_name, order, kind, occurs, span)))
        }
    }

    /// An element standing for a global element inside a child set
    pub(crate) fn element_reference(&self, id: ElementId, span: Option<TextSpan>) -> ElementInfo {
        let global = self.schema.element(id);
        ElementInfo {
            full_name: global.full_name.clone(),
            kind: DeclarationKind::Reference,
            type_id: global.type_id,
            is_nullable: global.is_nullable,
            is_abstract: global.is_abstract,
            is_sealed: global.is_sealed,
            substituted: None,
            referenced: Some(id),
            span,
        }
    }

    pub(crate) fn wrap_list(
        member_name: String,
        order: usize,
        item: ChildKind,
        occurs: Occurs,
        span: Option<TextSpan>,
    ) -> ChildInfo {
        ChildInfo {
            member_name: member_name.clone(),
            order,
            kind: ChildKind::List(ChildListInfo {
                item: Box::new(ChildInfo {
                    member_name,
                    order: 0,
                    kind: item,
                    span: span.clone(),
                }),
                occurs,
            }),
            span,
        }
    }

    /// Occurrence of a member, `1..1` when absent; `None` if invalid
    pub(crate) fn occurs(&mut self, node: Option<&OccurrenceNode>) -> Option<Occurs> {
        let node = match node {
            Some(node) => node,
            None => return Some(Occurs::once()),
        };
        let occurs = Occurs::new(node.min, node.max);
        if occurs.is_valid() {
            Some(occurs)
        } else {
            self.ctx.error(
                DiagnosticCode::InvalidOccurrence,
                format!("invalid occurrence {}", occurs),
                node.span.as_ref(),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{GlobalElementNode, TypeNode};

    fn options() -> CompilerOptions {
        CompilerOptions::default()
    }

    #[test]
    fn test_resolution_is_memoized() {
        let nodes = vec![NamespaceNode::new("urn:a")
            .member(TypeNode::restriction("Base", "String"))
            .member(TypeNode::restriction("Derived", "Base"))];
        let options = options();
        let mut compiler = Compiler::new(&nodes, &options);
        compiler.register_namespaces();
        compiler.register_imports();

        let name = QualifiableNameNode::parse("Base");
        let first = compiler.resolve_type_name(&name, 0).unwrap();
        let count = compiler.schema.type_count();
        let second = compiler.resolve_type_name(&name, 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(compiler.schema.type_count(), count);

        let derived = compiler
            .resolve_type_name(&QualifiableNameNode::parse("Derived"), 0)
            .unwrap();
        assert_eq!(compiler.schema.type_info(derived).base, Some(first));
    }

    #[test]
    fn test_system_namespace_is_reserved() {
        let nodes = vec![NamespaceNode::new(SYSTEM_URI).member(TypeNode::complex("Foo"))];
        let output = compile(&nodes, &options());
        assert!(!output.is_valid);
        assert_eq!(output.count(DiagnosticCode::InvalidNamespaceReference), 1);
    }

    #[test]
    fn test_members_are_published_in_declaration_order() {
        let nodes = vec![NamespaceNode::new("urn:a")
            .member(GlobalElementNode::new("Root", "Late"))
            .member(TypeNode::complex("Late"))];
        let output = compile(&nodes, &options());
        assert!(output.is_valid, "{:?}", output.diagnostics);
        let schema = output.schema.unwrap();
        let names: Vec<&str> = schema
            .namespace("urn:a")
            .unwrap()
            .members()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["Root", "Late"]);
    }

    #[test]
    fn test_unnamed_sets_get_generated_names() {
        let set = ChildMemberNode::Set(crate::ast::NestedSetNode {
            name: None,
            set: ChildSetNode::choice(),
            occurrence: None,
        });
        assert_eq!(Compiler::member_name(&set, 2), "Choice2");
    }
}
