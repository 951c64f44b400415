use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

use crate::data::DataType;

// Errors surfaced by context lookups, substitution and loading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    // No entry exists under the requested name and no default was supplied
    #[error("context entry not found: {name}")]
    NotFound { name: String },

    // The stored value cannot produce the requested type
    #[error("context entry \"{name}\" holds {found}, which cannot be read as {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: DataType,
    },

    // Variable expansion nested deeper than the substitution limit
    #[error("substitution exceeded the maximum recursion depth of {depth}")]
    RecursionLimitExceeded { depth: usize },

    // Malformed input handed to a loader or the command line
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// Type alias for results that use `ContextError` as the error type
pub type Result<T> = std::result::Result<T, ContextError>;
