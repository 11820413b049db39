use placement_primitives::PrimitiveError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
/// Structured runtime error with a stable internal classification.
/// `code()` is the only part of this type external callers should depend on;
/// `message` is free text for humans and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
    code_override: Option<&'static str>,
}

impl Error {
    #[must_use]
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            code_override: None,
        }
    }

    pub fn not_found(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NotFound, origin, message)
    }

    pub fn conflict(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, origin, message)
    }

    pub fn bad_request(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::BadRequest, origin, message)
    }

    /// A `BadRequest` whose query parameter value was present but malformed.
    pub fn bad_value(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::BadRequest, origin, message)
            .with_code("placement.query.bad_value")
    }

    /// A `BadRequest` whose query parameter was required but absent.
    pub fn missing_value(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::BadRequest, origin, message)
            .with_code("placement.query.missing_value")
    }

    /// A `Conflict` raised because an inventory's capacity would be exceeded.
    pub fn inventory_inuse(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, origin, message).with_code("placement.inventory.inuse")
    }

    pub fn timeout(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Timeout, origin, message)
    }

    pub fn invariant_violation(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, origin, message)
    }

    #[must_use]
    fn with_code(mut self, code: &'static str) -> Self {
        self.code_override = Some(code);
        self
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.class, ErrorClass::Conflict)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    /// Stable code for the `{errors:[{title,code,detail}]}` response envelope.
    /// Never depends on the `message` text, only on `class` (and an optional
    /// finer-grained override set at construction).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        if let Some(code) = self.code_override {
            return code;
        }
        match self.class {
            ErrorClass::BadRequest => "placement.query.bad_value",
            ErrorClass::Conflict => "placement.concurrent_update",
            ErrorClass::NotFound | ErrorClass::Timeout => "placement.undefined_code",
            ErrorClass::InvariantViolation => "placement.inventory.inuse",
        }
    }

    /// Render the `{errors:[{title,code,detail}]}` envelope body described in
    /// the external interface contract. Serialization onto the wire is left
    /// to the caller.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            errors: vec![ErrorEntry {
                title: self.class.to_string(),
                code: self.code().to_string(),
                detail: self.message.clone(),
            }],
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<PrimitiveError> for Error {
    fn from(err: PrimitiveError) -> Self {
        Self::bad_request(ErrorOrigin::Query, err.to_string())
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    BadRequest,
    Conflict,
    InvariantViolation,
    NotFound,
    Timeout,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Timeout => "timeout",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which component raised the error.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Entity,
    Index,
    Query,
    Solver,
    Store,
    Writer,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Store => "store",
            Self::Entity => "entity",
            Self::Index => "index",
            Self::Solver => "solver",
            Self::Writer => "writer",
            Self::Query => "query",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorEnvelope / ErrorEntry
/// Wire shape from the external interface contract: `{errors:[{title,code,detail}]}`.
/// This crate only constructs the value; serializing it is the HTTP layer's job.
///

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorEnvelope {
    pub errors: Vec<ErrorEntry>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorEntry {
    pub title: String,
    pub code: String,
    pub detail: String,
}
