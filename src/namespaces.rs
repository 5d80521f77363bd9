//! Namespace handling
//!
//! This module provides full names (namespace URI + local name), the reserved
//! system namespace and the per-declaration import table used to resolve
//! alias-qualified names.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// URI of the system namespace holding the built-in types
pub const SYSTEM_URI: &str = "urn:sdata:system";

/// Alias reserved for the system namespace
pub const SYSTEM_ALIAS: &str = "sys";

/// Full name - the unique key of a global declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FullName {
    /// Namespace URI (empty for local declarations)
    pub uri: String,
    /// Local name
    pub name: String,
}

impl FullName {
    /// Create a new full name
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
        }
    }

    /// Create a full name without a namespace
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(String::new(), name)
    }

    /// Create a full name in the system namespace
    pub fn system(name: impl Into<String>) -> Self {
        Self::new(SYSTEM_URI, name)
    }

    /// Whether this name lives in the system namespace
    pub fn is_system(&self) -> bool {
        self.uri == SYSTEM_URI
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{{{}}}{}", self.uri, self.name)
        }
    }
}

/// The imports of one namespace declaration
///
/// Aliased imports can be addressed as `alias:Name`; every import, aliased or
/// not, is searched for unqualified names in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    /// Imported namespace URIs in declaration order
    uris: Vec<String>,
    /// Mapping from alias to namespace URI
    aliases: IndexMap<String, String>,
}

impl ImportTable {
    /// Create a new empty import table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an import. Returns `false` if the alias is already taken.
    pub fn add(&mut self, uri: impl Into<String>, alias: Option<&str>) -> bool {
        let uri = uri.into();
        if let Some(alias) = alias {
            if self.aliases.contains_key(alias) {
                return false;
            }
            self.aliases.insert(alias.to_string(), uri.clone());
        }
        if !self.uris.contains(&uri) {
            self.uris.push(uri);
        }
        true
    }

    /// Get the namespace URI bound to an alias
    pub fn get_uri(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(|s| s.as_str())
    }

    /// Iterate over imported URIs in declaration order
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.uris.iter().map(|s| s.as_str())
    }

    /// Number of imported namespaces
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    /// Whether nothing is imported
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_creation() {
        let name = FullName::new("urn:example", "Person");
        assert_eq!(name.uri, "urn:example");
        assert_eq!(name.name, "Person");
        assert!(!name.is_system());
        assert!(FullName::system("Int32").is_system());
    }

    #[test]
    fn test_full_name_display() {
        assert_eq!(
            FullName::new("urn:example", "Person").to_string(),
            "{urn:example}Person"
        );
        assert_eq!(FullName::local("Id").to_string(), "Id");
    }

    #[test]
    fn test_import_table() {
        let mut imports = ImportTable::new();
        assert!(imports.add("urn:a", Some("a")));
        assert!(imports.add("urn:b", None));
        assert!(!imports.add("urn:c", Some("a")));

        assert_eq!(imports.get_uri("a"), Some("urn:a"));
        assert_eq!(imports.get_uri("b"), None);
        assert_eq!(imports.uris().collect::<Vec<_>>(), vec!["urn:a", "urn:b"]);
    }

    #[test]
    fn test_import_same_uri_twice() {
        let mut imports = ImportTable::new();
        assert!(imports.add("urn:a", Some("x")));
        assert!(imports.add("urn:a", Some("y")));
        assert_eq!(imports.len(), 1);
        assert_eq!(imports.get_uri("y"), Some("urn:a"));
    }
}
