//! Error types for sdata-schema
//!
//! Expected, data-dependent failures (bad names, illegal derivations, invalid
//! instance data) are reported as [`Diagnostic`](crate::diagnostics::Diagnostic)s
//! collected in a [`Context`](crate::diagnostics::Context). The [`Error`] type
//! defined here covers the two remaining cases: the short-circuit signal that
//! stops a whole compilation pass, and programming-contract faults that
//! indicate a caller bug.

use thiserror::Error;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sdata-schema operations
#[derive(Error, Debug)]
pub enum Error {
    /// The current pass was aborted. The diagnostic explaining why has
    /// already been recorded in the context.
    #[error("compilation aborted")]
    Aborted,

    /// An operation would have introduced a cycle into an object tree or a
    /// reference chain
    #[error("circular reference: {0}")]
    CircularReference(String),

    /// An object id does not denote a live object of the expected kind
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// An operation was invoked in a state that does not permit it
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A limit from [`Limits`](crate::limits::Limits) was exceeded
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this is the pass-abort signal rather than a contract fault
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CircularReference("object #3 is an ancestor of #7".to_string());
        assert_eq!(
            err.to_string(),
            "circular reference: object #3 is an ancestor of #7"
        );
        assert_eq!(Error::Aborted.to_string(), "compilation aborted");
    }

    #[test]
    fn test_is_abort() {
        assert!(Error::Aborted.is_abort());
        assert!(!Error::Other("x".to_string()).is_abort());
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
