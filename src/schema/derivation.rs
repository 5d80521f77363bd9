//! Derivation legality
//!
//! Builds the effective content of extended and restricted types and checks
//! that every derivation is legal. An extension may only add: attributes to
//! the attribute set, members to the end of the root child set. A restriction
//! may only narrow: an instance of the restricted type must always be a valid
//! instance of its base.
//!
//! An inherited attribute or child member that a restriction block does not
//! mention is deleted, exactly like an explicit `delete`; deletion is legal
//! only for optional attributes and members. A restriction without an
//! attribute block keeps the base attributes. Alternatives of a choice may
//! always be dropped as long as one remains.

use std::collections::{HashMap, HashSet};

use super::attributes::{AttributeInfo, AttributeSetInfo};
use super::builtins::TypeKind;
use super::compiler::Compiler;
use super::elements::ElementId;
use super::facets::narrow;
use super::groups::{ChildInfo, ChildKind, ChildListInfo, ChildSetInfo, ChildSetKind};
use super::particles::Occurs;
use super::types::{ChildrenInfo, ComplexTypeInfo, SimpleTypeInfo, TypeContent, TypeId};
use crate::ast::{
    AttributeMemberNode, AttributesNode, ChildMemberNode, ChildSetNode, ChildrenNode, FacetsNode,
};
use crate::diagnostics::{DiagnosticCode, TextSpan};
use crate::error::Result;

impl<'a> Compiler<'a> {
    /// Report a base type that cannot be extended or restricted
    pub(crate) fn check_derivable(&mut self, base: TypeId, span: Option<&TextSpan>) {
        let info = self.schema.type_info(base);
        let name = info.full_name.clone();
        let is_sealed = info.is_sealed;
        let is_system = info.is_system();
        let kind = info.kind;

        if is_sealed {
            self.ctx.error(
                DiagnosticCode::BaseTypeIsSealed,
                format!("base type '{}' is sealed", name),
                span,
            );
        }
        if is_system && kind == TypeKind::ComplexType {
            self.ctx.error(
                DiagnosticCode::CannotExtendOrRestrictSysComplexType,
                "cannot extend or restrict sys:ComplexType",
                span,
            );
        } else if is_system && kind.is_simple_root() {
            self.ctx.error(
                DiagnosticCode::CannotExtendOrRestrictSysSimpleType,
                format!("cannot extend or restrict sys:{}", kind),
                span,
            );
        }
    }

    fn base_of(&self, id: TypeId) -> TypeId {
        self.schema
            .type_info(id)
            .base
            .unwrap_or_else(|| self.schema.system_type(TypeKind::ComplexType))
    }

    // -------------------------------------------------------------------------
    // Extension
    // -------------------------------------------------------------------------

    pub(crate) fn build_extension(
        &mut self,
        id: TypeId,
        ns: usize,
        attributes: Option<&'a AttributesNode>,
        children: Option<&'a ChildrenNode>,
    ) -> Result<()> {
        let base = self.base_of(id);
        let base_info = self.schema.type_info(base);
        let mut content = match &base_info.content {
            TypeContent::Complex(complex) => complex.clone(),
            TypeContent::Simple(_) => ComplexTypeInfo {
                attributes: None,
                children: Some(ChildrenInfo::Simple(base)),
            },
        };

        if let Some(block) = attributes {
            let mut set = content.attributes.take().unwrap_or_default();
            self.add_attributes(&mut set, block, ns)?;
            content.attributes = Some(set);
        }

        if let Some(node) = children {
            content.children = match (content.children.take(), node) {
                (None, node) => self.build_children(node, ns)?,
                (Some(ChildrenInfo::Simple(simple)), node) => {
                    let code = match node {
                        ChildrenNode::Set(_) => {
                            DiagnosticCode::CannotExtendSimpleChildWithComplexChildren
                        }
                        ChildrenNode::Simple { .. } => {
                            DiagnosticCode::CannotExtendChildrenWithSimpleChild
                        }
                    };
                    self.ctx.error(
                        code,
                        "cannot extend simple content with more children",
                        children_span(node),
                    );
                    Some(ChildrenInfo::Simple(simple))
                }
                (Some(ChildrenInfo::Set(set)), ChildrenNode::Simple { span, .. }) => {
                    self.ctx.error(
                        DiagnosticCode::CannotExtendChildrenWithSimpleChild,
                        "cannot extend structural children with simple content",
                        span.as_ref(),
                    );
                    Some(ChildrenInfo::Set(set))
                }
                (Some(ChildrenInfo::Set(mut set)), ChildrenNode::Set(node)) => {
                    self.add_members(&mut set, node, ns)?;
                    Some(ChildrenInfo::Set(set))
                }
            };
        }

        self.set_content(id, TypeContent::Complex(content));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Restriction
    // -------------------------------------------------------------------------

    pub(crate) fn build_restriction(
        &mut self,
        id: TypeId,
        ns: usize,
        facets: Option<&'a FacetsNode>,
        attributes: Option<&'a AttributesNode>,
        children: Option<&'a ChildrenNode>,
    ) -> Result<()> {
        let base = self.base_of(id);
        let base_content = self.schema.type_info(base).content.clone();
        match base_content {
            TypeContent::Simple(simple) => {
                let content = self.restrict_simple(id, ns, simple, facets, attributes, children)?;
                self.set_content(id, TypeContent::Simple(content));
            }
            TypeContent::Complex(complex) => {
                if let Some(facets) = facets {
                    self.ctx.error(
                        DiagnosticCode::FacetsNotAllowedOnComplexType,
                        "facets are not allowed on a complex type",
                        facets.span.as_ref(),
                    );
                }
                let attributes = match attributes {
                    Some(block) => Some(self.restrict_attributes(complex.attributes.as_ref(), block, ns)?),
                    None => complex.attributes,
                };
                let children = match children {
                    Some(node) => self.restrict_children(complex.children, node, ns)?,
                    None => complex.children,
                };
                self.set_content(
                    id,
                    TypeContent::Complex(ComplexTypeInfo {
                        attributes,
                        children,
                    }),
                );
            }
        }
        Ok(())
    }

    fn restrict_simple(
        &mut self,
        id: TypeId,
        ns: usize,
        base: SimpleTypeInfo,
        facets: Option<&'a FacetsNode>,
        attributes: Option<&'a AttributesNode>,
        children: Option<&'a ChildrenNode>,
    ) -> Result<SimpleTypeInfo> {
        if attributes.is_some() || children.is_some() {
            let span = attributes
                .and_then(|a| a.span.as_ref())
                .or_else(|| children.and_then(children_span));
            self.ctx.error(
                DiagnosticCode::AttributesOrChildrenNotAllowedOnSimpleType,
                "attributes or children are not allowed on a simple type",
                span,
            );
        }

        let mut content = base.clone();
        let facets = match facets {
            Some(facets) => facets,
            None => return Ok(content),
        };

        let kind = self.schema.type_info(id).kind;
        match narrow(kind, base.facets.as_ref(), facets) {
            Ok(narrowed) => content.facets = Some(narrowed),
            Err(errors) => self.ctx.extend(errors),
        }

        if let (true, Some(item)) = (kind.is_list(), facets.list_item_type.as_ref()) {
            let item_type = self.resolve_simple_type(item, ns)?;
            match base.item_type {
                Some(base_item) if !self.schema.is_equal_or_derive_from(item_type, base_item) => {
                    let message = format!(
                        "list item type '{}' is not equal to or derived from '{}'",
                        self.schema.type_info(item_type).full_name,
                        self.schema.type_info(base_item).full_name
                    );
                    self.ctx.error(
                        DiagnosticCode::ListItemTypeNotEqualToOrDeriveFromRestricted,
                        message,
                        item.span(),
                    );
                }
                _ => content.item_type = Some(item_type),
            }
        }
        Ok(content)
    }

    // -------------------------------------------------------------------------
    // Attribute restriction
    // -------------------------------------------------------------------------

    fn restrict_attributes(
        &mut self,
        base: Option<&AttributeSetInfo>,
        block: &'a AttributesNode,
        ns: usize,
    ) -> Result<AttributeSetInfo> {
        let empty = AttributeSetInfo::new();
        let base = base.unwrap_or(&empty);
        let mut handled: HashSet<String> = HashSet::new();
        let mut restricted: HashMap<String, AttributeInfo> = HashMap::new();

        for member in &block.members {
            let span = member.span();
            if let AttributeMemberNode::Delete(node) = member {
                let name = &node.name.value;
                match base.get(name) {
                    None => self.ctx.error(
                        DiagnosticCode::CannotFindRestrictedAttribute,
                        format!("cannot find restricted attribute '{}'", name),
                        span,
                    ),
                    Some(attribute) if !attribute.is_optional => self.ctx.error(
                        DiagnosticCode::RequiredAttributeNotRestricting,
                        format!("cannot delete required attribute '{}'", name),
                        span,
                    ),
                    Some(_) => {}
                }
                handled.insert(name.clone());
                continue;
            }

            let attribute = match self.build_attribute(member, ns)? {
                Some(attribute) => attribute,
                None => continue,
            };
            let name = attribute.name().to_string();
            if handled.contains(&name) {
                self.ctx.error(
                    DiagnosticCode::DuplicateAttributeName,
                    format!("duplicate attribute name '{}'", name),
                    span,
                );
                continue;
            }
            handled.insert(name.clone());
            match base.get(&name) {
                None => self.ctx.error(
                    DiagnosticCode::CannotFindRestrictedAttribute,
                    format!("cannot find restricted attribute '{}'", name),
                    span,
                ),
                Some(restricted_attribute) => {
                    self.check_attribute_restriction(&attribute, restricted_attribute, span);
                    restricted.insert(name, attribute);
                }
            }
        }

        // Unmentioned attributes count as deleted
        let mut result = AttributeSetInfo::new();
        for attribute in base.iter() {
            if let Some(derived) = restricted.remove(attribute.name()) {
                result.insert(derived);
            } else if !handled.contains(attribute.name()) && !attribute.is_optional {
                self.ctx.error(
                    DiagnosticCode::RequiredAttributeNotRestricting,
                    format!("required attribute '{}' is not restricted", attribute.name()),
                    block.span.as_ref(),
                );
            }
        }
        Ok(result)
    }

    fn check_attribute_restriction(
        &mut self,
        derived: &AttributeInfo,
        base: &AttributeInfo,
        span: Option<&TextSpan>,
    ) {
        let name = derived.name();
        if derived.is_optional && !base.is_optional {
            self.ctx.error(
                DiagnosticCode::AttributeIsOptionalButRestrictedIsRequired,
                format!("attribute '{}' is optional but the restricted one is required", name),
                span,
            );
        }
        if derived.is_nullable && !base.is_nullable {
            self.ctx.error(
                DiagnosticCode::AttributeIsNullableButRestrictedIsNotNullable,
                format!(
                    "attribute '{}' is nullable but the restricted one is not nullable",
                    name
                ),
                span,
            );
        }
        if !self.schema.is_equal_or_derive_from(derived.type_id, base.type_id) {
            let message = format!(
                "type '{}' of attribute '{}' is not equal to or derived from '{}'",
                self.schema.type_info(derived.type_id).full_name,
                name,
                self.schema.type_info(base.type_id).full_name
            );
            self.ctx.error(
                DiagnosticCode::AttributeTypeNotEqualToOrDeriveFromRestricted,
                message,
                span,
            );
        }
    }

    // -------------------------------------------------------------------------
    // Children restriction
    // -------------------------------------------------------------------------

    fn restrict_children(
        &mut self,
        base: Option<ChildrenInfo>,
        node: &'a ChildrenNode,
        ns: usize,
    ) -> Result<Option<ChildrenInfo>> {
        match (base, node) {
            (None, node) => {
                self.ctx.error(
                    DiagnosticCode::CannotFindRestrictedChildMember,
                    "the restricted type has no children",
                    children_span(node),
                );
                Ok(None)
            }
            (Some(ChildrenInfo::Simple(base)), ChildrenNode::Simple { type_name, .. }) => {
                let derived = self.resolve_simple_type(type_name, ns)?;
                if self.schema.is_equal_or_derive_from(derived, base) {
                    Ok(Some(ChildrenInfo::Simple(derived)))
                } else {
                    self.ctx.error(
                        DiagnosticCode::SimpleChildTypeNotEqualToOrDeriveFromRestricted,
                        format!(
                            "simple child type '{}' is not equal to or derived from '{}'",
                            type_name,
                            self.schema.type_info(base).full_name
                        ),
                        type_name.span(),
                    );
                    Ok(Some(ChildrenInfo::Simple(base)))
                }
            }
            (Some(ChildrenInfo::Set(base)), ChildrenNode::Set(node)) if base.kind == node.kind => {
                Ok(Some(ChildrenInfo::Set(self.restrict_child_set(&base, node, ns)?)))
            }
            (Some(base), node) => {
                self.ctx.error(
                    DiagnosticCode::MemberKindNotEqualToRestricted,
                    "children kind is not equal to the restricted children kind",
                    children_span(node),
                );
                Ok(Some(base))
            }
        }
    }

    fn restrict_child_set(
        &mut self,
        base: &ChildSetInfo,
        node: &'a ChildSetNode,
        ns: usize,
    ) -> Result<ChildSetInfo> {
        let mut handled: HashSet<String> = HashSet::new();
        let mut restricted: HashMap<String, ChildInfo> = HashMap::new();

        for (order, member) in node.members.iter().enumerate() {
            let span = member.span();
            let name = Self::member_name(member, order);

            if let ChildMemberNode::Delete(_) = member {
                match base.member(&name) {
                    None => self.ctx.error(
                        DiagnosticCode::CannotFindRestrictedChildMember,
                        format!("cannot find restricted child member '{}'", name),
                        span,
                    ),
                    Some(child) if base.kind == ChildSetKind::Sequence && !child.is_optional() => {
                        self.ctx.error(
                            DiagnosticCode::RequiredChildMemberNotRestricting,
                            format!("cannot delete required child member '{}'", name),
                            span,
                        )
                    }
                    Some(_) => {}
                }
                handled.insert(name);
                continue;
            }

            if handled.contains(&name) {
                self.ctx.error(
                    DiagnosticCode::DuplicateMemberName,
                    format!("duplicate member name '{}'", name),
                    span,
                );
                continue;
            }
            handled.insert(name.clone());

            match base.member(&name) {
                None => self.ctx.error(
                    DiagnosticCode::CannotFindRestrictedChildMember,
                    format!("cannot find restricted child member '{}'", name),
                    span,
                ),
                Some(child) => {
                    if let Some(derived) = self.restrict_member(child, member, ns)? {
                        restricted.insert(name, derived);
                    }
                }
            }
        }

        let mut result = ChildSetInfo::new(base.kind);
        result.span = node.span.clone().or_else(|| base.span.clone());
        for child in &base.members {
            if let Some(mut derived) = restricted.remove(&child.member_name) {
                derived.order = result.members.len();
                result.members.push(derived);
            } else if !handled.contains(&child.member_name)
                && base.kind == ChildSetKind::Sequence
                && !child.is_optional()
            {
                self.ctx.error(
                    DiagnosticCode::RequiredChildMemberNotRestricting,
                    format!(
                        "required child member '{}' must be restricted",
                        child.member_name
                    ),
                    node.span.as_ref(),
                );
            }
        }

        if base.kind == ChildSetKind::Choice && result.members.is_empty() && !base.members.is_empty() {
            self.ctx.error(
                DiagnosticCode::RequiredChildMemberNotRestricting,
                "a restricted choice must keep at least one member",
                node.span.as_ref(),
            );
        }
        Ok(result)
    }

    /// Restrict one inherited member; `None` if the restricting member was
    /// rejected
    fn restrict_member(
        &mut self,
        base: &ChildInfo,
        member: &'a ChildMemberNode,
        ns: usize,
    ) -> Result<Option<ChildInfo>> {
        let span = member.span();
        let occurs = match member.occurrence() {
            Some(node) => match self.occurs(Some(node)) {
                Some(occurs) => occurs,
                None => return Ok(None),
            },
            None => Occurs::once(),
        };

        if let ChildKind::List(list) = &base.kind {
            if occurs.min < list.occurs.min {
                self.ctx.error(
                    DiagnosticCode::MinOccursNotGreaterThanOrEqualToRestricted,
                    format!(
                        "min occurs {} of '{}' is less than the restricted {}",
                        occurs.min, base.member_name, list.occurs.min
                    ),
                    span,
                );
            }
            if occurs.max > list.occurs.max {
                self.ctx.error(
                    DiagnosticCode::MaxOccursNotLessThanOrEqualToRestricted,
                    format!(
                        "occurrence {} of '{}' exceeds the restricted {}",
                        occurs, base.member_name, list.occurs
                    ),
                    span,
                );
            }
            let item = self.restrict_single(&list.item, member, ns, false)?;
            return Ok(item.map(|item| ChildInfo {
                member_name: base.member_name.clone(),
                order: base.order,
                kind: ChildKind::List(ChildListInfo {
                    item: Box::new(item),
                    occurs,
                }),
                span: span.cloned(),
            }));
        }

        if occurs.max != 1 {
            self.ctx.error(
                DiagnosticCode::MemberKindNotEqualToRestricted,
                format!(
                    "member '{}' is a list but the restricted member is not",
                    base.member_name
                ),
                span,
            );
            return Ok(None);
        }
        let is_optional = occurs.min == 0;
        if is_optional && !base.is_optional() {
            self.ctx.error(
                DiagnosticCode::MinOccursNotGreaterThanOrEqualToRestricted,
                format!(
                    "member '{}' is optional but the restricted member is required",
                    base.member_name
                ),
                span,
            );
        }
        self.restrict_single(base, member, ns, is_optional)
    }

    fn restrict_single(
        &mut self,
        base: &ChildInfo,
        member: &'a ChildMemberNode,
        ns: usize,
        is_optional: bool,
    ) -> Result<Option<ChildInfo>> {
        let span = member.span();
        let kind = match (member, &base.kind) {
            (ChildMemberNode::Element(node), ChildKind::Element { element, .. })
                if element.referenced.is_none() =>
            {
                let type_id = self.resolve_type_name(&node.type_name, ns)?;
                if node.is_nullable && !element.is_nullable {
                    self.ctx.error(
                        DiagnosticCode::ElementIsNullableButRestrictedIsNotNullable,
                        format!(
                            "element '{}' is nullable but the restricted one is not nullable",
                            node.name.value
                        ),
                        span,
                    );
                }
                if !self.schema.is_equal_or_derive_from(type_id, element.type_id) {
                    let message = format!(
                        "type '{}' of element '{}' is not equal to or derived from '{}'",
                        node.type_name,
                        node.name.value,
                        self.schema.type_info(element.type_id).full_name
                    );
                    self.ctx.error(
                        DiagnosticCode::ElementTypeNotEqualToOrDeriveFromRestricted,
                        message,
                        span,
                    );
                }
                let mut restricted = element.clone();
                restricted.type_id = type_id;
                restricted.is_nullable = node.is_nullable;
                restricted.span = span.cloned();
                ChildKind::Element {
                    element: restricted,
                    is_optional,
                }
            }
            (ChildMemberNode::Reference(node), ChildKind::Element { element, .. }) => {
                let restricted = match element.referenced {
                    Some(restricted) => restricted,
                    None => return Ok(self.kind_mismatch(base, span)),
                };
                let id = self.resolve_element_name(&node.reference, ns)?;
                if !self.schema.is_equal_or_substitute(id, restricted) {
                    let message = format!(
                        "element reference '{}' is not equal to or a substitute of '{}'",
                        node.reference,
                        self.schema.element(restricted).full_name
                    );
                    self.ctx.error(
                        DiagnosticCode::ElementReferenceNotEqualToOrSubstituteRestricted,
                        message,
                        span,
                    );
                }
                ChildKind::Element {
                    element: self.element_reference(id, span.cloned()),
                    is_optional,
                }
            }
            (ChildMemberNode::Set(node), ChildKind::Set(set)) if node.set.kind == set.kind => {
                ChildKind::Set(self.restrict_child_set(set, &node.set, ns)?)
            }
            _ => return Ok(self.kind_mismatch(base, span)),
        };

        Ok(Some(ChildInfo {
            member_name: base.member_name.clone(),
            order: base.order,
            kind,
            span: span.cloned(),
        }))
    }

    fn kind_mismatch(&mut self, base: &ChildInfo, span: Option<&TextSpan>) -> Option<ChildInfo> {
        self.ctx.error(
            DiagnosticCode::MemberKindNotEqualToRestricted,
            format!(
                "member '{}' must restrict a {}",
                base.member_name,
                base.member_kind()
            ),
            span,
        );
        None
    }

    // -------------------------------------------------------------------------
    // Substitution
    // -------------------------------------------------------------------------

    /// Check that `substitutor` may join the substitution group of `head`
    pub(crate) fn check_substitution(
        &mut self,
        substitutor: ElementId,
        head: ElementId,
        span: Option<&TextSpan>,
    ) {
        let head_info = self.schema.element(head).clone();
        let info = self.schema.element(substitutor).clone();

        if head_info.is_sealed {
            self.ctx.error(
                DiagnosticCode::SubstitutedElementIsSealed,
                format!("substituted element '{}' is sealed", head_info.full_name),
                span,
            );
        }
        if !self.schema.is_equal_or_derive_from(info.type_id, head_info.type_id) {
            let message = format!(
                "type '{}' of element '{}' is not equal to or derived from '{}'",
                self.schema.type_info(info.type_id).full_name,
                info.full_name,
                self.schema.type_info(head_info.type_id).full_name
            );
            self.ctx.error(
                DiagnosticCode::ElementTypeNotEqualToOrDeriveFromSubstituted,
                message,
                span,
            );
        }
        if info.is_nullable && !head_info.is_nullable {
            self.ctx.error(
                DiagnosticCode::ElementIsNullableButSubstitutedIsNotNullable,
                format!(
                    "element '{}' is nullable but the substituted element '{}' is not",
                    info.full_name, head_info.full_name
                ),
                span,
            );
        }
    }
}

fn children_span(node: &ChildrenNode) -> Option<&TextSpan> {
    match node {
        ChildrenNode::Simple { span, type_name } => span.as_ref().or(type_name.span()),
        ChildrenNode::Set(set) => set.span.as_ref(),
    }
}
