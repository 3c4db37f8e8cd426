//! Contract-model error types

use thiserror::Error;

use crate::model::ClauseKind;

/// Main error type for model building and combination
#[derive(Error, Debug)]
pub enum CovenantError {
    /// Malformed or unclassifiable clause input
    #[error("specification error: {0}")]
    Specification(String),

    /// Two synthesized contract methods collide on (kind, target, id)
    #[error("duplicate contract method identity {kind:?}/{target:?}#{id} in type '{type_name}'")]
    DuplicateIdentity {
        type_name: String,
        kind: ClauseKind,
        target: String,
        id: u32,
    },

    /// A clause names a method the enclosing type does not declare
    #[error("unknown contract target '{target}' in type '{type_name}'")]
    UnknownTarget { type_name: String, target: String },

    /// The ancestor chain loops back on itself
    #[error("inheritance cycle detected at '{0}'")]
    InheritanceCycle(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result type for model operations
pub type CovenantResult<T> = Result<T, CovenantError>;
