use thiserror::Error as ThisError;

///
/// StoreError
/// Low-level failures raised by a `TransactionalStore` implementation,
/// independent of the crate-wide `Error` taxonomy it gets wrapped into.
///

#[derive(Clone, Debug, ThisError, Eq, PartialEq)]
pub enum StoreError {
    #[error("entity not found: {key}")]
    NotFound { key: String },

    #[error("store corrupt: {message}")]
    Corrupt { message: String },

    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },
}
