//! Error types for proxrust.

use thiserror::Error;

/// Error type for proxrust operations.
#[derive(Debug, Error)]
pub enum ProxError {
    /// Operand kind is not supported by the requested algebraic operation.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Domains or ranges that must be identical are not.
    #[error("domain mismatch: expected {expected}, got {got}")]
    DomainMismatch { expected: String, got: String },

    /// The requested derived property has no definition for this node.
    #[error("{what} is not implemented for {on}")]
    UnsupportedOperation { what: &'static str, on: String },

    /// A scaling factor, coefficient, or step size is out of its required range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ProxError {
    /// Shorthand for a `DomainMismatch` built from two displayable values.
    pub(crate) fn domain_mismatch(
        expected: impl std::fmt::Display,
        got: impl std::fmt::Display,
    ) -> Self {
        ProxError::DomainMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Shorthand for an `UnsupportedOperation` on a named node.
    pub(crate) fn unsupported(what: &'static str, on: impl std::fmt::Display) -> Self {
        ProxError::UnsupportedOperation {
            what,
            on: on.to_string(),
        }
    }
}

/// Result type for proxrust operations.
pub type Result<T> = std::result::Result<T, ProxError>;
