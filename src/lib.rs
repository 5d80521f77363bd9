//! # sdata-schema
//!
//! The type system of the SData schema language: a compiler that turns
//! namespace parse trees into a checked symbol graph, a runtime object model
//! for instance data, and a validator that checks object trees against the
//! compiled schema.
//!
//! ## Features
//!
//! - Name resolution across namespaces and imports, with cycle detection
//! - Facet narrowing along simple-type restriction chains
//! - Extension/restriction legality for attributes, children and elements
//! - Substitution groups
//! - Arena object trees with clone-on-reattach ownership and references
//! - Two-phase validation with pluggable hooks
//! - JSON export of the symbol graph
//!
//! ## Example
//!
//! ```rust
//! use sdata::ast::{AttributeMemberNode, AttributesNode, NamespaceNode, TypeNode};
//! use sdata::diagnostics::Context;
//! use sdata::objects::XTree;
//! use sdata::schema::{compile, CompilerOptions};
//! use sdata::validation::Validator;
//!
//! let nodes = vec![NamespaceNode::new("urn:demo").member(
//!     TypeNode::complex("Person")
//!         .attributes(AttributesNode::new().member(AttributeMemberNode::local("name", "String"))),
//! )];
//! let output = compile(&nodes, &CompilerOptions::default());
//! assert!(output.is_valid);
//! let schema = output.schema.unwrap();
//!
//! let person = schema
//!     .lookup_type(&sdata::namespaces::FullName::new("urn:demo", "Person"))
//!     .unwrap();
//! let mut tree = XTree::new();
//! let object = tree.new_complex(None);
//!
//! let mut ctx = Context::new();
//! let valid = Validator::new(&schema)
//!     .try_validate(&tree, object, person, &mut ctx)
//!     .unwrap();
//! assert!(!valid); // `name` is required
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod diagnostics;
pub mod error;
pub mod limits;

// Names and values
pub mod names;
pub mod namespaces;
pub mod values;

// Compiler
pub mod ast;
pub mod schema;

// Runtime
pub mod objects;
pub mod validation;

// Output
pub mod exports;

// Re-exports for convenience
pub use diagnostics::{Context, Diagnostic, DiagnosticCode, Severity, TextSpan};
pub use error::{Error, Result};
pub use namespaces::{FullName, SYSTEM_ALIAS, SYSTEM_URI};
pub use objects::{ObjectId, XTree};
pub use schema::{compile, compile_files, CompileOutput, CompilerOptions, SchemaSet};
pub use validation::{ValidationMode, Validator, ValidatorOptions};

/// Version of the sdata-schema library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_system_namespace() {
        assert_eq!(SYSTEM_URI, "urn:sdata:system");
        assert_eq!(SYSTEM_ALIAS, "sys");
    }
}
