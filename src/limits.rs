//! Limits for schema compilation and object validation
//!
//! Cycles are excluded by construction-time checks; these limits bound the
//! remaining depth-first walks so that pathological but acyclic input cannot
//! exhaust the stack.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum length of a type derivation chain
    pub max_derivation_depth: usize,

    /// Maximum depth of an object tree during validation
    pub max_object_depth: usize,

    /// Maximum length of an attribute/element reference chain
    pub max_reference_chain: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_derivation_depth: 256,
            max_object_depth: 1000,
            max_reference_chain: 64,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_derivation_depth: 32,
            max_object_depth: 100,
            max_reference_chain: 8,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_derivation_depth: 4096,
            max_object_depth: 100_000,
            max_reference_chain: 1024,
        }
    }

    /// Check if a derivation chain length is within limits
    pub fn check_derivation_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_derivation_depth {
            Err(Error::LimitExceeded(format!(
                "derivation depth {} exceeds maximum {}",
                depth, self.max_derivation_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if an object tree depth is within limits
    pub fn check_object_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_object_depth {
            Err(Error::LimitExceeded(format!(
                "object depth {} exceeds maximum {}",
                depth, self.max_object_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a reference chain length is within limits
    pub fn check_reference_chain(&self, length: usize) -> Result<()> {
        if length > self.max_reference_chain {
            Err(Error::LimitExceeded(format!(
                "reference chain length {} exceeds maximum {}",
                length, self.max_reference_chain
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_derivation_depth, 256);
        assert_eq!(limits.max_object_depth, 1000);
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_derivation_depth < Limits::default().max_derivation_depth);
        assert!(limits.check_object_depth(100).is_ok());
        assert!(limits.check_object_depth(101).is_err());
    }

    #[test]
    fn test_check_derivation_depth() {
        let limits = Limits::default();
        assert!(limits.check_derivation_depth(10).is_ok());
        assert!(limits.check_derivation_depth(257).is_err());
    }

    #[test]
    fn test_check_reference_chain() {
        let limits = Limits::permissive();
        assert!(limits.check_reference_chain(1024).is_ok());
        assert!(matches!(
            limits.check_reference_chain(1025),
            Err(Error::LimitExceeded(_))
        ));
    }
}
