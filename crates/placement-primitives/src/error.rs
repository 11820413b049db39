use thiserror::Error as ThisError;

///
/// PrimitiveError
/// String-validation failures raised by scalar primitives.
/// Callers map these onto the crate-wide `BadRequest` class.
///

#[derive(Clone, Debug, ThisError, Eq, PartialEq)]
pub enum PrimitiveError {
    #[error("resource class {0:?} is empty")]
    EmptyResourceClass(String),

    #[error("resource class {0:?} must be upper snake case ascii")]
    InvalidResourceClass(String),

    #[error("trait name {0:?} is empty")]
    EmptyTraitName(String),

    #[error("trait name {0:?} must be upper snake case ascii")]
    InvalidTraitName(String),

    #[error("custom trait name {0:?} must start with CUSTOM_")]
    CustomTraitMissingPrefix(String),

    #[error("{0:?} is not a valid ulid")]
    InvalidId(String),
}
