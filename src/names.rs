//! Identifier validation and utilities
//!
//! Names in the schema language are C-like identifiers; qualified names take
//! the form `alias:Name`.

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid"));

/// Check if a string is a valid identifier
pub fn is_valid_name(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Split a qualified name into alias and local name
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    if let Some((alias, local)) = name.split_once(':') {
        (Some(alias), local)
    } else {
        (None, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("Person"));
        assert!(is_valid_name("_id"));
        assert!(is_valid_name("Item2"));

        assert!(!is_valid_name(""));
        assert!(!is_valid_name("2Item"));
        assert!(!is_valid_name("my-item"));
        assert!(!is_valid_name("sys:Int32"));
    }

    #[test]
    fn test_split_qualified_name() {
        assert_eq!(split_qualified_name("Int32"), (None, "Int32"));
        assert_eq!(split_qualified_name("sys:Int32"), (Some("sys"), "Int32"));
    }
}
