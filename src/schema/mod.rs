//! Schema type system
//!
//! The compiled form of SData schemas: built-in types, facets, types,
//! attributes, elements and child sets, held by a [`SchemaSet`]. The
//! [`compile`] entry point builds a set from namespace parse trees.

pub mod attributes;
pub mod builtins;
pub mod compiler;
mod derivation;
pub mod elements;
pub mod facets;
pub mod globals;
pub mod groups;
pub mod particles;
mod resolver;
pub mod types;

pub use attributes::{AttributeId, AttributeInfo, AttributeSetInfo, DeclarationKind};
pub use builtins::{FacetKind, TypeKind};
pub use compiler::{compile, compile_files, CompileOutput, CompilerOptions};
pub use elements::{ElementId, ElementInfo};
pub use facets::{narrow, FacetPatch, FacetSet, ValueBound};
pub use globals::{GlobalId, NamespaceSymbol, SchemaSet};
pub use groups::{ChildInfo, ChildKind, ChildListInfo, ChildSetInfo, ChildSetKind, MemberKind};
pub use particles::{Occurs, UNBOUNDED};
pub use types::{
    ChildrenInfo, ComplexTypeInfo, DerivationMethod, SimpleTypeInfo, TypeContent, TypeId, TypeInfo,
};
