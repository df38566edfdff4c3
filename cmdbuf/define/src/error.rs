//! Errors raised while assembling protocol definitions.

use thiserror::Error;

/// Errors that can occur while constructing registries and override tables.
///
/// These are startup errors: a definition that fails here never reaches the
/// signature parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefineError {
    /// A name was looked up that the registry does not contain.
    #[error("unknown named type '{0}'")]
    UnknownType(String),

    /// Two named types share an identifier.
    #[error("named type '{0}' is declared more than once")]
    DuplicateType(String),

    /// A named type violates one of its invariants.
    #[error("named type '{name}' is invalid: {reason}")]
    InvalidNamedType {
        /// The offending type.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two overrides target the same function.
    #[error("function '{0}' has more than one override")]
    DuplicateOverride(String),
}
