//! Errors raised by the variable store.

use thiserror::Error;

use crate::variables::VariableKind;

/// Errors that can occur while declaring, reading or writing variables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Variable '{0}' is not declared")]
    UnknownVariable(String),

    #[error("Variable name '{0}' must have the form Namespace.Variable")]
    InvalidVariableName(String),

    #[error("Variable '{name}' holds {expected} values, but a {found} value was given")]
    TypeMismatch {
        name: String,
        expected: VariableKind,
        found: VariableKind,
    },

    #[error("Variable '{0}' is already declared")]
    DuplicateVariable(String),

    /// A variable declared inside a shadow scope would have no snapshot to restore.
    #[error("Cannot declare '{0}' while a shadow scope is active")]
    DeclareWhileShadowed(String),

    #[error("Unsupported default value for '{name}': {found}")]
    UnsupportedDeclaration { name: String, found: String },

    #[error("Failed to parse variable declarations: {0}")]
    ParseDeclarations(String),
}
