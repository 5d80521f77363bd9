//! Validation integration tests
//!
//! Compile a small shop schema, build object trees by hand and validate
//! them against it.

use pretty_assertions::assert_eq;

use sdata::ast::{
    AttributeMemberNode, AttributesNode, ChildMemberNode, ChildSetNode, ChildrenNode, FacetsNode,
    GlobalElementNode, NamespaceNode, TypeNode,
};
use sdata::diagnostics::{Context, DiagnosticCode, Severity};
use sdata::limits::Limits;
use sdata::namespaces::FullName;
use sdata::objects::{ObjectId, XTree};
use sdata::schema::{compile, CompilerOptions, SchemaSet, TypeId, UNBOUNDED};
use sdata::validation::{ValidationHooks, ValidationMode, Validator, ValidatorOptions};
use sdata::values::{AtomicValue, SimpleValue};

const SHOP: &str = "urn:shop";

fn shop_schema() -> SchemaSet {
    let mut hidden = GlobalElementNode::new("Hidden", "String");
    hidden.is_abstract = true;

    let nodes = vec![NamespaceNode::new(SHOP)
        .member(
            TypeNode::restriction("Code", "String")
                .facets(FacetsNode::new().length_range(Some(2), Some(8))),
        )
        .member(
            TypeNode::complex("Tagged").attributes(
                AttributesNode::new()
                    .member(AttributeMemberNode::local("id", "Int32"))
                    .member(AttributeMemberNode::local("name", "String"))
                    .member(AttributeMemberNode::optional("nick", "String"))
                    .member(AttributeMemberNode::optional("code", "Code")),
            ),
        )
        .member(
            TypeNode::complex("Person").children(ChildrenNode::Set(
                ChildSetNode::sequence()
                    .member(ChildMemberNode::element("Name", "String"))
                    .member(ChildMemberNode::element("Tag", "String").occurs(0, 3))
                    .member(ChildMemberNode::set(
                        "Contact",
                        ChildSetNode::choice()
                            .member(ChildMemberNode::element("Email", "String"))
                            .member(ChildMemberNode::element("Phone", "String")),
                    )),
            )),
        )
        .member(TypeNode::complex("Shape").set_abstract())
        .member(
            TypeNode::extension("Circle", "Shape")
                .attributes(AttributesNode::new().member(AttributeMemberNode::local("radius", "Double"))),
        )
        .member(GlobalElementNode::new("AnyShape", "Shape"))
        .member(GlobalElementNode::new("ACircle", "Circle").substitutes("AnyShape"))
        .member(hidden)
        .member(
            TypeNode::complex("Drawing").children(ChildrenNode::Set(
                ChildSetNode::sequence().member(ChildMemberNode::reference("AnyShape").occurs(1, UNBOUNDED)),
            )),
        )];
    let output = compile(&nodes, &CompilerOptions::default());
    assert!(output.is_valid, "{:#?}", output.diagnostics);
    output.schema.unwrap()
}

fn type_id(schema: &SchemaSet, name: &str) -> TypeId {
    schema.lookup_type(&FullName::new(SHOP, name)).unwrap()
}

fn string(tree: &mut XTree, value: &str) -> ObjectId {
    tree.new_simple(None, SimpleValue::Atomic(AtomicValue::String(value.to_string())))
}

fn int(tree: &mut XTree, value: i32) -> ObjectId {
    tree.new_simple(None, SimpleValue::Atomic(AtomicValue::Int32(value)))
}

fn with_attributes(tree: &mut XTree, attributes: Vec<(&str, ObjectId)>) -> ObjectId {
    typed_with_attributes(tree, None, attributes)
}

fn typed_with_attributes(
    tree: &mut XTree,
    type_name: Option<&str>,
    attributes: Vec<(&str, ObjectId)>,
) -> ObjectId {
    let complex = tree.new_complex(type_name.map(|name| FullName::new(SHOP, name)));
    let set = tree.new_attribute_set();
    for (name, value) in attributes {
        let attribute = tree.new_attribute(name);
        tree.set_value(attribute, Some(value)).unwrap();
        tree.add_attribute(set, attribute).unwrap();
    }
    tree.set_attributes(complex, set).unwrap();
    complex
}

fn element(tree: &mut XTree, name: &str, value: Option<ObjectId>) -> ObjectId {
    let element = tree.new_element(FullName::local(name));
    tree.set_value(element, value).unwrap();
    element
}

fn string_element(tree: &mut XTree, name: &str, value: &str) -> ObjectId {
    let value = string(tree, value);
    element(tree, name, Some(value))
}

/// A person with a name, `tags` tags and the given contact elements
fn person(tree: &mut XTree, tags: usize, contacts: &[&str]) -> ObjectId {
    let complex = tree.new_complex(None);
    let root = tree.new_child_set(None);
    let name = string_element(tree, "Name", "Tank");
    tree.add_child(root, name).unwrap();
    if tags > 0 {
        let list = tree.new_child_list(Some("Tag"));
        for i in 0..tags {
            let tag = string_element(tree, "Tag", &format!("t{}", i));
            tree.add_child(list, tag).unwrap();
        }
        tree.add_child(root, list).unwrap();
    }
    let contact = tree.new_child_set(Some("Contact"));
    for name in contacts {
        let item = string_element(tree, name, "x");
        tree.add_child(contact, item).unwrap();
    }
    tree.add_child(root, contact).unwrap();
    tree.set_children(complex, root).unwrap();
    complex
}

fn validate(schema: &SchemaSet, tree: &XTree, object: ObjectId, ty: &str) -> (bool, Context) {
    let mut ctx = Context::new();
    let valid = Validator::new(schema)
        .try_validate(tree, object, type_id(schema, ty), &mut ctx)
        .unwrap();
    (valid, ctx)
}

fn codes(ctx: &Context) -> Vec<DiagnosticCode> {
    ctx.diagnostics().iter().map(|d| d.code).collect()
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_valid_attributes() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let id = int(&mut tree, 7);
    let name = string(&mut tree, "Tank");
    let code = string(&mut tree, "AB12");
    let object = with_attributes(&mut tree, vec![("id", id), ("name", name), ("code", code)]);
    let (valid, ctx) = validate(&schema, &tree, object, "Tagged");
    assert!(valid, "{:?}", ctx.diagnostics());
    assert!(ctx.is_empty());
}

#[test]
fn test_validation_reports_every_failure() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let nick = string(&mut tree, "T");
    let extra = string(&mut tree, "?");
    let object = with_attributes(&mut tree, vec![("nick", nick), ("extra", extra)]);

    let (valid, ctx) = validate(&schema, &tree, object, "Tagged");
    assert!(!valid);
    assert_eq!(ctx.count(DiagnosticCode::RequiredAttributeNotFound), 2);
    assert_eq!(ctx.count(DiagnosticCode::RedundantAttribute), 1);
    assert_eq!(ctx.len(), 3);
}

#[test]
fn test_marker_rollback() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let object = with_attributes(&mut tree, vec![]);

    let mut ctx = Context::new();
    let marker = ctx.mark();
    let valid = Validator::new(&schema)
        .try_validate(&tree, object, type_id(&schema, "Tagged"), &mut ctx)
        .unwrap();
    assert!(!valid);
    assert!(ctx.has_errors_since(marker));

    ctx.restore(marker);
    assert!(ctx.is_empty());
    assert!(!ctx.has_errors());
}

#[test]
fn test_value_checks() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let id = string(&mut tree, "seven");
    let name = string(&mut tree, "Tank");
    let code = string(&mut tree, "X");
    let object = with_attributes(&mut tree, vec![("id", id), ("name", name), ("code", code)]);

    let (valid, ctx) = validate(&schema, &tree, object, "Tagged");
    assert!(!valid);
    assert_eq!(
        codes(&ctx),
        vec![
            DiagnosticCode::ValueKindMismatch,
            DiagnosticCode::LengthNotInRange
        ]
    );
    assert!(ctx.diagnostics().iter().all(|d| d.object.is_some()));
}

#[test]
fn test_null_attribute() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let complex = tree.new_complex(None);
    let set = tree.new_attribute_set();
    for name in ["id", "name"] {
        let attribute = tree.new_attribute(name);
        tree.add_attribute(set, attribute).unwrap();
    }
    tree.set_attributes(complex, set).unwrap();

    let (valid, ctx) = validate(&schema, &tree, complex, "Tagged");
    assert!(!valid);
    assert_eq!(ctx.count(DiagnosticCode::AttributeIsNotNullable), 2);
}

#[test]
fn test_attribute_references_are_followed() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let shared = tree.new_attribute("id");
    let seven = int(&mut tree, 7);
    tree.set_value(shared, Some(seven)).unwrap();

    let id = tree.new_attribute("id");
    tree.set_reference(id, shared).unwrap();
    let name = tree.new_attribute("name");
    let tank = string(&mut tree, "Tank");
    tree.set_value(name, Some(tank)).unwrap();

    let complex = tree.new_complex(None);
    let set = tree.new_attribute_set();
    tree.add_attribute(set, id).unwrap();
    tree.add_attribute(set, name).unwrap();
    tree.set_attributes(complex, set).unwrap();

    let (valid, ctx) = validate(&schema, &tree, complex, "Tagged");
    assert!(valid, "{:?}", ctx.diagnostics());
}

// ============================================================================
// Modes
// ============================================================================

#[test]
fn test_lax_mode_downgrades_redundant_members() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let id = int(&mut tree, 1);
    let name = string(&mut tree, "n");
    let extra = string(&mut tree, "?");
    let object = with_attributes(&mut tree, vec![("id", id), ("name", name), ("extra", extra)]);

    let options = ValidatorOptions {
        mode: ValidationMode::Lax,
        ..Default::default()
    };
    let mut ctx = Context::new();
    let valid = Validator::with_options(&schema, options)
        .try_validate(&tree, object, type_id(&schema, "Tagged"), &mut ctx)
        .unwrap();
    assert!(valid);
    assert_eq!(ctx.len(), 1);
    assert_eq!(ctx.diagnostics()[0].severity, Severity::Warning);
}

#[test]
fn test_skip_mode() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let object = tree.new_complex(None);
    let options = ValidatorOptions {
        mode: ValidationMode::Skip,
        ..Default::default()
    };
    let mut ctx = Context::new();
    let valid = Validator::with_options(&schema, options)
        .try_validate(&tree, object, type_id(&schema, "Tagged"), &mut ctx)
        .unwrap();
    assert!(valid);
    assert!(ctx.is_empty());
}

#[test]
fn test_object_depth_limit() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let object = person(&mut tree, 1, &["Email"]);
    let options = ValidatorOptions {
        mode: ValidationMode::Strict,
        limits: Limits {
            max_object_depth: 2,
            ..Limits::default()
        },
    };
    let mut ctx = Context::new();
    let valid = Validator::with_options(&schema, options)
        .try_validate(&tree, object, type_id(&schema, "Person"), &mut ctx)
        .unwrap();
    assert!(!valid);
    assert!(ctx.count(DiagnosticCode::ObjectTooDeep) >= 1);
}

// ============================================================================
// Children
// ============================================================================

#[test]
fn test_valid_children() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let object = person(&mut tree, 2, &["Phone"]);
    let (valid, ctx) = validate(&schema, &tree, object, "Person");
    assert!(valid, "{:?}", ctx.diagnostics());
}

#[test]
fn test_children_failures() {
    let schema = shop_schema();
    let mut tree = XTree::new();

    let object = person(&mut tree, 4, &["Email", "Phone"]);
    let (valid, ctx) = validate(&schema, &tree, object, "Person");
    assert!(!valid);
    assert_eq!(
        codes(&ctx),
        vec![
            DiagnosticCode::ChildListCountGreaterThanMaxOccurs,
            DiagnosticCode::MultipleChoiceMembers
        ]
    );

    let object = person(&mut tree, 0, &[]);
    let (_, ctx) = validate(&schema, &tree, object, "Person");
    assert_eq!(codes(&ctx), vec![DiagnosticCode::RequiredChildMemberNotFound]);
}

#[test]
fn test_missing_and_redundant_children() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let complex = tree.new_complex(None);
    let root = tree.new_child_set(None);
    let contact = tree.new_child_set(Some("Contact"));
    let email = string_element(&mut tree, "Email", "a@b");
    tree.add_child(contact, email).unwrap();
    tree.add_child(root, contact).unwrap();
    let stray = string_element(&mut tree, "Stray", "?");
    tree.add_child(root, stray).unwrap();
    tree.set_children(complex, root).unwrap();

    let (valid, ctx) = validate(&schema, &tree, complex, "Person");
    assert!(!valid);
    assert_eq!(
        codes(&ctx),
        vec![
            DiagnosticCode::RequiredChildMemberNotFound,
            DiagnosticCode::RedundantChildMember
        ]
    );
}

#[test]
fn test_sequence_members_follow_declaration_order() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let complex = tree.new_complex(None);
    let root = tree.new_child_set(None);
    let contact = tree.new_child_set(Some("Contact"));
    let email = string_element(&mut tree, "Email", "a@b");
    tree.add_child(contact, email).unwrap();
    tree.add_child(root, contact).unwrap();
    let name = string_element(&mut tree, "Name", "Tank");
    tree.add_child(root, name).unwrap();
    tree.set_children(complex, root).unwrap();

    let (valid, ctx) = validate(&schema, &tree, complex, "Person");
    assert!(!valid);
    assert_eq!(
        codes(&ctx),
        vec![
            DiagnosticCode::RequiredChildMemberNotFound,
            DiagnosticCode::RedundantChildMember
        ]
    );
    assert_eq!(ctx.diagnostics()[1].object, Some(contact));
}

#[test]
fn test_null_element() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let complex = tree.new_complex(None);
    let root = tree.new_child_set(None);
    let name = element(&mut tree, "Name", None);
    tree.add_child(root, name).unwrap();
    let contact = tree.new_child_set(Some("Contact"));
    let phone = string_element(&mut tree, "Phone", "1");
    tree.add_child(contact, phone).unwrap();
    tree.add_child(root, contact).unwrap();
    tree.set_children(complex, root).unwrap();

    let (_, ctx) = validate(&schema, &tree, complex, "Person");
    assert_eq!(codes(&ctx), vec![DiagnosticCode::ElementIsNotNullable]);
}

// ============================================================================
// Types and substitution
// ============================================================================

fn circle(tree: &mut XTree, type_name: Option<&str>) -> ObjectId {
    let radius = tree.new_simple(None, SimpleValue::Atomic(AtomicValue::Double(1.5)));
    typed_with_attributes(tree, type_name, vec![("radius", radius)])
}

fn drawing(tree: &mut XTree, shapes: Vec<ObjectId>) -> ObjectId {
    let complex = tree.new_complex(None);
    let root = tree.new_child_set(None);
    let list = tree.new_child_list(Some("AnyShape"));
    for shape in shapes {
        tree.add_child(list, shape).unwrap();
    }
    tree.add_child(root, list).unwrap();
    tree.set_children(complex, root).unwrap();
    complex
}

#[test]
fn test_substitutors_match_references() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let value = circle(&mut tree, None);
    let shape = element(&mut tree, "ACircle", Some(value));
    let object = drawing(&mut tree, vec![shape]);
    let (valid, ctx) = validate(&schema, &tree, object, "Drawing");
    assert!(valid, "{:?}", ctx.diagnostics());
}

#[test]
fn test_abstract_type_needs_explicit_subtype() {
    let schema = shop_schema();
    let mut tree = XTree::new();

    let plain = with_attributes(&mut tree, vec![]);
    let shape = element(&mut tree, "AnyShape", Some(plain));
    let object = drawing(&mut tree, vec![shape]);
    let (_, ctx) = validate(&schema, &tree, object, "Drawing");
    assert_eq!(codes(&ctx), vec![DiagnosticCode::TypeIsAbstract]);

    let typed = circle(&mut tree, Some("Circle"));
    let shape = element(&mut tree, "AnyShape", Some(typed));
    let object = drawing(&mut tree, vec![shape]);
    let (valid, ctx) = validate(&schema, &tree, object, "Drawing");
    assert!(valid, "{:?}", ctx.diagnostics());
}

#[test]
fn test_instance_type_checks() {
    let schema = shop_schema();
    let mut tree = XTree::new();

    let unknown = tree.new_complex(Some(FullName::new(SHOP, "Nope")));
    let (_, ctx) = validate(&schema, &tree, unknown, "Shape");
    assert_eq!(codes(&ctx), vec![DiagnosticCode::UnknownTypeName]);

    let unrelated = tree.new_complex(Some(FullName::new(SHOP, "Person")));
    let (_, ctx) = validate(&schema, &tree, unrelated, "Shape");
    assert_eq!(codes(&ctx), vec![DiagnosticCode::InvalidObjectType]);
}

#[test]
fn test_global_elements() {
    let schema = shop_schema();
    let validator = Validator::new(&schema);
    let head = schema.lookup_element(&FullName::new(SHOP, "AnyShape")).unwrap();
    let hidden = schema.lookup_element(&FullName::new(SHOP, "Hidden")).unwrap();
    let mut tree = XTree::new();

    let value = circle(&mut tree, None);
    let shape = element(&mut tree, "ACircle", Some(value));
    let mut ctx = Context::new();
    assert!(validator.try_validate_element(&tree, shape, head, &mut ctx).unwrap());

    let secret = string_element(&mut tree, "Hidden", "x");
    let mut ctx = Context::new();
    assert!(!validator.try_validate_element(&tree, secret, hidden, &mut ctx).unwrap());
    assert_eq!(codes(&ctx), vec![DiagnosticCode::ElementIsAbstract]);

    let mut ctx = Context::new();
    assert!(!validator.try_validate_element(&tree, secret, head, &mut ctx).unwrap());
    assert_eq!(codes(&ctx), vec![DiagnosticCode::InvalidObjectType]);
}

// ============================================================================
// Hooks
// ============================================================================

#[derive(Default)]
struct Recorder {
    visited: Vec<ObjectId>,
    reject: Option<ObjectId>,
}

impl ValidationHooks for Recorder {
    fn try_validating(&mut self, _tree: &XTree, object: ObjectId, _ctx: &mut Context) -> bool {
        self.visited.push(object);
        self.reject != Some(object)
    }

    fn try_validated(
        &mut self,
        _tree: &XTree,
        object: ObjectId,
        ctx: &mut Context,
        success: bool,
    ) -> bool {
        if self.reject == Some(object) {
            ctx.error(DiagnosticCode::InvalidObjectKind, "rejected by hook", None);
        }
        success
    }
}

#[test]
fn test_hooks_run_for_every_object() {
    let schema = shop_schema();
    let mut tree = XTree::new();
    let id = int(&mut tree, 1);
    let name = string(&mut tree, "n");
    let object = with_attributes(&mut tree, vec![("id", id), ("name", name)]);
    let ty = type_id(&schema, "Tagged");

    let mut hooks = Recorder::default();
    let mut ctx = Context::new();
    let valid = Validator::new(&schema)
        .try_validate_with(&tree, object, ty, &mut ctx, &mut hooks)
        .unwrap();
    assert!(valid);
    assert!(hooks.visited.contains(&object));
    assert!(hooks.visited.contains(&id));
    assert!(hooks.visited.contains(&name));

    let mut hooks = Recorder {
        reject: Some(name),
        ..Default::default()
    };
    let mut ctx = Context::new();
    let valid = Validator::new(&schema)
        .try_validate_with(&tree, object, ty, &mut ctx, &mut hooks)
        .unwrap();
    assert!(!valid);
    assert_eq!(codes(&ctx), vec![DiagnosticCode::InvalidObjectKind]);
}
