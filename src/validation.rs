//! Structural validation of object trees
//!
//! A [`Validator`] checks an [`XTree`] against a compiled [`SchemaSet`].
//! Every visited object goes through two phases: the pre-validation hook
//! ([`ValidationHooks::try_validating`]), the core checks, then the
//! post-validation hook ([`ValidationHooks::try_validated`]). Failures are
//! recorded in the [`Context`] and validation continues; the result of a
//! call is whether no error was recorded since it started.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, trace};

use crate::diagnostics::{Context, Diagnostic, DiagnosticCode, Severity};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::FullName;
use crate::objects::{ObjectId, ObjectKind, XTree};
use crate::schema::{
    AttributeSetInfo, ChildInfo, ChildKind, ChildListInfo, ChildSetInfo, ChildSetKind,
    ChildrenInfo, ElementId, ElementInfo, SchemaSet, TypeId,
};
use crate::values::SimpleValue;

/// How strictly instance data is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Every failure is an error
    #[default]
    Strict,
    /// Undeclared attributes and children are reported as warnings
    Lax,
    /// Nothing is checked
    Skip,
}

impl ValidationMode {
    /// Parse validation mode from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            "skip" => Ok(ValidationMode::Skip),
            _ => Err(Error::Other(format!(
                "invalid validation mode: '{}', must be 'strict', 'lax' or 'skip'",
                s
            ))),
        }
    }

    /// Get the mode as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Lax => "lax",
            ValidationMode::Skip => "skip",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validator configuration
#[derive(Debug, Clone, Default)]
pub struct ValidatorOptions {
    /// Validation mode
    pub mode: ValidationMode,
    /// Depth and reference-chain limits
    pub limits: Limits,
}

/// Pre- and post-validation extension points
///
/// Both hooks run for every visited object. A `false` from `try_validating`
/// skips the core checks of that object (its subtree included) and fails it.
pub trait ValidationHooks {
    /// Called before an object is checked
    fn try_validating(&mut self, _tree: &XTree, _object: ObjectId, _ctx: &mut Context) -> bool {
        true
    }

    /// Called after an object was checked; `success` is the core result
    fn try_validated(
        &mut self,
        _tree: &XTree,
        _object: ObjectId,
        _ctx: &mut Context,
        success: bool,
    ) -> bool {
        success
    }
}

/// Hooks that change nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ValidationHooks for NoHooks {}

/// Checks object trees against a schema
#[derive(Debug, Clone)]
pub struct Validator<'s> {
    schema: &'s SchemaSet,
    options: ValidatorOptions,
}

impl<'s> Validator<'s> {
    /// Create a validator with default options
    pub fn new(schema: &'s SchemaSet) -> Self {
        Self::with_options(schema, ValidatorOptions::default())
    }

    /// Create a validator with explicit options
    pub fn with_options(schema: &'s SchemaSet, options: ValidatorOptions) -> Self {
        Self { schema, options }
    }

    /// The options in use
    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Validate a type instance against `expected`
    ///
    /// Returns whether no error was recorded. Unknown object ids are an
    /// [`Error`], not a diagnostic.
    pub fn try_validate(
        &self,
        tree: &XTree,
        object: ObjectId,
        expected: TypeId,
        ctx: &mut Context,
    ) -> Result<bool> {
        self.try_validate_with(tree, object, expected, ctx, &mut NoHooks)
    }

    /// Validate a type instance, calling `hooks` around every object
    pub fn try_validate_with<H>(
        &self,
        tree: &XTree,
        object: ObjectId,
        expected: TypeId,
        ctx: &mut Context,
        hooks: &mut H,
    ) -> Result<bool>
    where
        H: ValidationHooks + ?Sized,
    {
        if self.options.mode == ValidationMode::Skip {
            return Ok(true);
        }
        let marker = ctx.mark();
        let mut walk = Walk {
            schema: self.schema,
            options: &self.options,
            tree,
            ctx: &mut *ctx,
            hooks,
        };
        walk.visit(object, 0, |walk, depth| walk.validate_type(object, expected, depth))?;
        let valid = !ctx.has_errors_since(marker);
        debug!(object = %object, valid, "validated type instance");
        Ok(valid)
    }

    /// Validate an element object against a global element
    ///
    /// The object may be named after the element or one of its
    /// substitutors.
    pub fn try_validate_element(
        &self,
        tree: &XTree,
        object: ObjectId,
        element: ElementId,
        ctx: &mut Context,
    ) -> Result<bool> {
        if self.options.mode == ValidationMode::Skip {
            return Ok(true);
        }
        let marker = ctx.mark();
        let mut walk = Walk {
            schema: self.schema,
            options: &self.options,
            tree,
            ctx: &mut *ctx,
            hooks: &mut NoHooks,
        };
        let name = match tree.get(object)? {
            ObjectKind::Element { name, .. } => name.clone(),
            other => {
                return Err(Error::InvalidObject(format!(
                    "object {} is a {} object, expected element",
                    object,
                    other.kind_name()
                )))
            }
        };
        match walk.match_global(&name, element) {
            Some(info) => {
                let info = info.clone();
                walk.visit(object, 0, |walk, depth| walk.validate_element(object, &info, depth))?;
            }
            None => walk.report(
                DiagnosticCode::InvalidObjectType,
                format!(
                    "element '{}' cannot stand for '{}'",
                    name,
                    self.schema.element(element).full_name
                ),
                object,
            ),
        }
        let valid = !ctx.has_errors_since(marker);
        debug!(object = %object, valid, "validated element");
        Ok(valid)
    }
}

/// One validation run
struct Walk<'a, H: ?Sized> {
    schema: &'a SchemaSet,
    options: &'a ValidatorOptions,
    tree: &'a XTree,
    ctx: &'a mut Context,
    hooks: &'a mut H,
}

impl<H: ValidationHooks + ?Sized> Walk<'_, H> {
    fn report(&mut self, code: DiagnosticCode, message: impl Into<String>, object: ObjectId) {
        let diagnostic = Diagnostic::error(code, message)
            .with_span(self.tree.span(object))
            .with_object(object);
        self.ctx.add(diagnostic);
    }

    fn redundant(&mut self, code: DiagnosticCode, message: impl Into<String>, object: ObjectId) {
        let severity = match self.options.mode {
            ValidationMode::Lax => Severity::Warning,
            _ => Severity::Error,
        };
        let diagnostic = Diagnostic::new(severity, code, message)
            .with_span(self.tree.span(object))
            .with_object(object);
        self.ctx.add(diagnostic);
    }

    /// Run the hooks and `core` for one object
    fn visit<F>(&mut self, object: ObjectId, depth: usize, core: F) -> Result<bool>
    where
        F: FnOnce(&mut Self, usize) -> Result<()>,
    {
        let marker = self.ctx.mark();
        if !self.hooks.try_validating(self.tree, object, self.ctx) {
            return Ok(self.hooks.try_validated(self.tree, object, self.ctx, false));
        }
        if self.options.limits.check_object_depth(depth).is_err() {
            self.report(
                DiagnosticCode::ObjectTooDeep,
                format!(
                    "object {} is nested deeper than {}",
                    object, self.options.limits.max_object_depth
                ),
                object,
            );
        } else {
            core(self, depth + 1)?;
        }
        let success = !self.ctx.has_errors_since(marker);
        trace!(object = %object, success, "visited");
        Ok(self.hooks.try_validated(self.tree, object, self.ctx, success))
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    fn validate_type(&mut self, object: ObjectId, expected: TypeId, depth: usize) -> Result<()> {
        let (tree, schema) = (self.tree, self.schema);
        let kind = tree.get(object)?;
        if !kind.is_type() {
            self.report(
                DiagnosticCode::InvalidObjectKind,
                format!("{} object {} is not a type instance", kind.kind_name(), object),
                object,
            );
            return Ok(());
        }

        let actual = match kind.type_name() {
            None => expected,
            Some(name) => match schema.lookup_type(name) {
                None => {
                    self.report(
                        DiagnosticCode::UnknownTypeName,
                        format!("unknown type '{}'", name),
                        object,
                    );
                    return Ok(());
                }
                Some(actual) if !schema.is_equal_or_derive_from(actual, expected) => {
                    self.report(
                        DiagnosticCode::InvalidObjectType,
                        format!(
                            "type '{}' is not equal to or derived from '{}'",
                            name,
                            schema.type_info(expected).full_name
                        ),
                        object,
                    );
                    return Ok(());
                }
                Some(actual) => actual,
            },
        };

        let info = schema.type_info(actual);
        if info.is_abstract {
            self.report(
                DiagnosticCode::TypeIsAbstract,
                format!("type '{}' is abstract", info.full_name),
                object,
            );
        }

        match kind {
            ObjectKind::Simple { value, .. } => {
                if !info.is_simple() {
                    self.report(
                        DiagnosticCode::ValueKindMismatch,
                        format!("type '{}' is not a simple type", info.full_name),
                        object,
                    );
                    return Ok(());
                }
                self.validate_value(object, actual, value);
            }
            ObjectKind::Complex { .. } => {
                let Some(complex) = info.as_complex() else {
                    self.report(
                        DiagnosticCode::ValueKindMismatch,
                        format!("type '{}' is not a complex type", info.full_name),
                        object,
                    );
                    return Ok(());
                };
                self.validate_attributes(object, complex.attributes.as_ref(), depth)?;
                self.validate_children(object, complex.children.as_ref(), depth)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn validate_value(&mut self, object: ObjectId, type_id: TypeId, value: &SimpleValue) {
        let schema = self.schema;
        let info = schema.type_info(type_id);
        let kind_matches = match value.as_atomic() {
            Some(atomic) => info.kind.is_atomic() && atomic.kind() == info.kind,
            None => {
                info.kind.is_list()
                    && self.list_items_match(type_id, value.as_list().unwrap_or_default())
            }
        };
        if !kind_matches {
            self.report(
                DiagnosticCode::ValueKindMismatch,
                format!("value does not match the kind of type '{}'", info.full_name),
                object,
            );
            return;
        }
        for failure in schema.check_value(type_id, value) {
            self.ctx.add(
                failure
                    .with_span(self.tree.span(object))
                    .with_object(object),
            );
        }
    }

    fn list_items_match(&self, type_id: TypeId, items: &[SimpleValue]) -> bool {
        let Some(item_type) = self
            .schema
            .type_info(type_id)
            .as_simple()
            .and_then(|s| s.item_type)
        else {
            return false;
        };
        let item_kind = self.schema.type_info(item_type).kind;
        items
            .iter()
            .all(|item| item.as_atomic().map_or(false, |a| a.kind() == item_kind))
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    fn validate_attributes(
        &mut self,
        complex: ObjectId,
        declared: Option<&AttributeSetInfo>,
        depth: usize,
    ) -> Result<()> {
        let present = self.tree.attributes(complex)?;
        let mut consumed = HashSet::new();

        if let Some(declared) = declared {
            for info in declared.iter() {
                match self.tree.find_attribute(complex, info.name())? {
                    Some(attribute) => {
                        consumed.insert(attribute);
                        self.visit(attribute, depth, |walk, depth| {
                            walk.validate_holder(attribute, info.type_id, info.is_nullable, depth)
                        })?;
                    }
                    None if !info.is_optional && info.default_value.is_none() => self.report(
                        DiagnosticCode::RequiredAttributeNotFound,
                        format!("required attribute '{}' not found", info.name()),
                        complex,
                    ),
                    None => {}
                }
            }
        }

        for attribute in present {
            if consumed.contains(&attribute) {
                continue;
            }
            let name = match self.tree.get(attribute)? {
                ObjectKind::Attribute { name, .. } => name.clone(),
                other => other.kind_name().to_string(),
            };
            self.redundant(
                DiagnosticCode::RedundantAttribute,
                format!("attribute '{}' is not declared", name),
                attribute,
            );
        }
        Ok(())
    }

    /// Check the value of an attribute or element, read through references
    fn validate_holder(
        &mut self,
        holder: ObjectId,
        type_id: TypeId,
        is_nullable: bool,
        depth: usize,
    ) -> Result<()> {
        let chain = match self.tree.reference_depth(holder) {
            Ok(chain) => chain,
            Err(Error::CircularReference(message)) => {
                self.report(DiagnosticCode::InvalidObjectKind, message, holder);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if let Err(e) = self.options.limits.check_reference_chain(chain) {
            self.report(DiagnosticCode::ObjectTooDeep, e.to_string(), holder);
            return Ok(());
        }

        let is_attribute = matches!(self.tree.get(holder)?, ObjectKind::Attribute { .. });
        match self.tree.value_of(holder)? {
            None if is_nullable => {}
            None if is_attribute => self.report(
                DiagnosticCode::AttributeIsNotNullable,
                format!("attribute {} has no value and is not nullable", holder),
                holder,
            ),
            None => self.report(
                DiagnosticCode::ElementIsNotNullable,
                format!("element {} has no value and is not nullable", holder),
                holder,
            ),
            Some(value) => {
                self.visit(value, depth, |walk, depth| {
                    walk.validate_type(value, type_id, depth)
                })?;
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    fn validate_children(
        &mut self,
        complex: ObjectId,
        declared: Option<&ChildrenInfo>,
        depth: usize,
    ) -> Result<()> {
        let present = match self.tree.get(complex)? {
            ObjectKind::Complex { children, .. } => *children,
            _ => None,
        };
        match (declared, present) {
            (None, None) => {}
            (None, Some(children)) => self.redundant(
                DiagnosticCode::RedundantChildMember,
                "type declares no children",
                children,
            ),
            (Some(ChildrenInfo::Simple(type_id)), Some(children)) => {
                let type_id = *type_id;
                self.visit(children, depth, |walk, depth| {
                    walk.validate_type(children, type_id, depth)
                })?;
            }
            (Some(ChildrenInfo::Simple(_)), None) => self.report(
                DiagnosticCode::RequiredChildMemberNotFound,
                "simple content not found",
                complex,
            ),
            (Some(ChildrenInfo::Set(set)), Some(children)) => {
                if matches!(self.tree.get(children)?, ObjectKind::ChildSet { .. }) {
                    self.visit(children, depth, |walk, depth| {
                        walk.validate_child_set(children, set, depth)
                    })?;
                } else {
                    self.report(
                        DiagnosticCode::InvalidObjectKind,
                        format!("object {} is not a child set", children),
                        children,
                    );
                }
            }
            (Some(ChildrenInfo::Set(set)), None) if !set.is_optional() => self.report(
                DiagnosticCode::RequiredChildMemberNotFound,
                "required children not found",
                complex,
            ),
            (Some(ChildrenInfo::Set(_)), None) => {}
        }
        Ok(())
    }

    fn validate_child_set(&mut self, set: ObjectId, info: &ChildSetInfo, depth: usize) -> Result<()> {
        let present = self.tree.items(set)?;
        let mut consumed = HashSet::new();
        let mut matched_members = Vec::new();
        // Sequence members only match after the previous match
        let mut cursor = 0;

        for member in &info.members {
            let found = present
                .iter()
                .copied()
                .enumerate()
                .skip(cursor)
                .filter(|(_, id)| !consumed.contains(id))
                .find_map(|(index, id)| self.match_member(id, member).map(|m| (index, id, m)));
            match found {
                Some((index, object, element)) => {
                    if info.kind == ChildSetKind::Sequence {
                        cursor = index + 1;
                    }
                    consumed.insert(object);
                    matched_members.push(member.member_name.as_str());
                    self.visit(object, depth, |walk, depth| {
                        walk.validate_member(object, member, element.as_ref(), depth)
                    })?;
                }
                None if info.kind == ChildSetKind::Sequence && !member.is_optional() => {
                    self.report(
                        DiagnosticCode::RequiredChildMemberNotFound,
                        format!("required member '{}' not found", member.member_name),
                        set,
                    )
                }
                None => {}
            }
        }

        if info.kind == ChildSetKind::Choice {
            if matched_members.len() > 1 {
                self.report(
                    DiagnosticCode::MultipleChoiceMembers,
                    format!("choice holds members {}", matched_members.join(", ")),
                    set,
                );
            } else if matched_members.is_empty() && !info.is_optional() {
                self.report(
                    DiagnosticCode::RequiredChildMemberNotFound,
                    "choice holds none of its members",
                    set,
                );
            }
        }

        for object in present {
            if !consumed.contains(&object) {
                self.redundant(
                    DiagnosticCode::RedundantChildMember,
                    format!("child {} is not declared", object),
                    object,
                );
            }
        }
        Ok(())
    }

    fn validate_member(
        &mut self,
        object: ObjectId,
        member: &ChildInfo,
        element: Option<&ElementInfo>,
        depth: usize,
    ) -> Result<()> {
        match (&member.kind, element) {
            (ChildKind::Element { .. }, Some(element)) => {
                self.validate_element(object, element, depth)
            }
            (ChildKind::Set(set), _) => self.validate_child_set(object, set, depth),
            (ChildKind::List(list), _) => self.validate_child_list(object, list, depth),
            (ChildKind::Element { .. }, None) => Ok(()),
        }
    }

    fn validate_child_list(&mut self, list: ObjectId, info: &ChildListInfo, depth: usize) -> Result<()> {
        let items = self.tree.items(list)?;
        let count = items.len() as u64;
        if info.occurs.is_missing(count) {
            self.report(
                DiagnosticCode::ChildListCountLessThanMinOccurs,
                format!("{} items, at least {} required", count, info.occurs.min),
                list,
            );
        } else if info.occurs.is_exceeded(count) {
            self.report(
                DiagnosticCode::ChildListCountGreaterThanMaxOccurs,
                format!("{} items, at most {} allowed", count, info.occurs.max),
                list,
            );
        }

        for item in items {
            match self.match_item(item, &info.item) {
                Some(element) => {
                    self.visit(item, depth, |walk, depth| {
                        walk.validate_member(item, &info.item, element.as_ref(), depth)
                    })?;
                }
                None => self.report(
                    DiagnosticCode::InvalidObjectKind,
                    format!("item {} does not match '{}'", item, info.item.member_name),
                    item,
                ),
            }
        }
        Ok(())
    }

    fn validate_element(&mut self, object: ObjectId, element: &ElementInfo, depth: usize) -> Result<()> {
        if element.is_abstract {
            self.report(
                DiagnosticCode::ElementIsAbstract,
                format!("element '{}' is abstract", element.full_name),
                object,
            );
        }
        self.validate_holder(object, element.type_id, element.is_nullable, depth)
    }

    // -------------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------------

    /// Match a child object against a set member
    ///
    /// Element members yield the declaration the object is an instance of.
    fn match_member(&self, object: ObjectId, member: &ChildInfo) -> Option<Option<ElementInfo>> {
        let kind = self.tree.get(object).ok()?;
        match (&member.kind, kind) {
            (ChildKind::Element { element, .. }, ObjectKind::Element { name, .. }) => {
                self.match_declaration(name, element).map(Some)
            }
            (ChildKind::Set(_), ObjectKind::ChildSet { member_name, .. })
            | (ChildKind::List(_), ObjectKind::ChildList { member_name, .. }) => {
                (member_name.as_deref() == Some(member.member_name.as_str())).then_some(None)
            }
            _ => None,
        }
    }

    /// Match a list item, whose sets carry no member name
    fn match_item(&self, object: ObjectId, item: &ChildInfo) -> Option<Option<ElementInfo>> {
        let kind = self.tree.get(object).ok()?;
        match (&item.kind, kind) {
            (ChildKind::Element { element, .. }, ObjectKind::Element { name, .. }) => {
                self.match_declaration(name, element).map(Some)
            }
            (ChildKind::Set(_), ObjectKind::ChildSet { member_name, .. }) => {
                member_name
                    .as_deref()
                    .map_or(true, |n| n == item.member_name)
                    .then_some(None)
            }
            _ => None,
        }
    }

    fn match_declaration(&self, name: &FullName, element: &ElementInfo) -> Option<ElementInfo> {
        match element.global() {
            Some(global) => self.match_global(name, global).cloned(),
            None => names_match(name, &element.full_name).then(|| element.clone()),
        }
    }

    /// The global element or substitutor that `name` denotes
    fn match_global(&self, name: &FullName, global: ElementId) -> Option<&ElementInfo> {
        std::iter::once(global)
            .chain(self.schema.transitive_substitutors(global))
            .map(|id| self.schema.element(id))
            .find(|info| names_match(name, &info.full_name))
    }
}

/// An empty instance URI matches any declaring namespace
fn names_match(instance: &FullName, declared: &FullName) -> bool {
    instance.name == declared.name && (instance.uri.is_empty() || instance.uri == declared.uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_mode() {
        assert_eq!(ValidationMode::from_str("lax").unwrap(), ValidationMode::Lax);
        assert_eq!(ValidationMode::default(), ValidationMode::Strict);
        assert_eq!(ValidationMode::Skip.to_string(), "skip");
        assert!(ValidationMode::from_str("loose").is_err());
    }

    #[test]
    fn test_names_match() {
        let declared = FullName::new("urn:a", "name");
        assert!(names_match(&FullName::local("name"), &declared));
        assert!(names_match(&FullName::new("urn:a", "name"), &declared));
        assert!(!names_match(&FullName::new("urn:b", "name"), &declared));
        assert!(!names_match(&FullName::local("other"), &declared));
    }
}
