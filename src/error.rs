//! Error types for xmlbind
//!
//! Every schema rule the engine enforces has its own variant, raised at the
//! exact point the rule is violated. None of them are recoverable inside a
//! read or write: the first error aborts the whole call.

use std::fmt;
use thiserror::Error;

/// Result type alias using the xmlbind [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while mapping objects to and from element trees
#[derive(Error, Debug)]
pub enum Error {
    /// An attribute has no matching label, or a required attribute value is absent
    #[error("attribute error: {0}")]
    Attribute(String),

    /// A child element has no matching label, or a required element value is absent
    #[error("element error: {0}")]
    Element(String),

    /// A required label was never satisfied by the document
    #[error("field required: {0}")]
    FieldRequired(String),

    /// A root binding is missing or does not match the element it represents
    #[error("root error: {0}")]
    Root(String),

    /// A type could not be constructed or is not assignable to the declared type
    #[error("instantiation error: {0}")]
    Instantiation(String),

    /// A type's declarations are internally inconsistent
    #[error("schema error: {0}")]
    Schema(String),

    /// A list entry is not assignable to the list's declared entry type
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Leaf text could not be converted to or from its scalar type
    #[error("value error: {0}")]
    Value(String),

    /// A configured limit was exceeded
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Document text could not be parsed or written
    #[error("XML error: {0}")]
    Xml(String),

    /// Schema dump serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discriminant of an [`Error`], convenient for matching in callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Attribute`]
    Attribute,
    /// See [`Error::Element`]
    Element,
    /// See [`Error::FieldRequired`]
    FieldRequired,
    /// See [`Error::Root`]
    Root,
    /// See [`Error::Instantiation`]
    Instantiation,
    /// See [`Error::Schema`]
    Schema,
    /// See [`Error::TypeMismatch`]
    TypeMismatch,
    /// See [`Error::Value`]
    Value,
    /// See [`Error::LimitExceeded`]
    LimitExceeded,
    /// See [`Error::Xml`]
    Xml,
    /// See [`Error::Json`]
    Json,
    /// See [`Error::Io`]
    Io,
    /// A [`PersistenceError`] raised without an underlying cause
    Other,
}

impl Error {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Attribute(_) => ErrorKind::Attribute,
            Error::Element(_) => ErrorKind::Element,
            Error::FieldRequired(_) => ErrorKind::FieldRequired,
            Error::Root(_) => ErrorKind::Root,
            Error::Instantiation(_) => ErrorKind::Instantiation,
            Error::Schema(_) => ErrorKind::Schema,
            Error::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Error::Value(_) => ErrorKind::Value,
            Error::LimitExceeded(_) => ErrorKind::LimitExceeded,
            Error::Xml(_) => ErrorKind::Xml,
            Error::Json(_) => ErrorKind::Json,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Attribute => "attribute",
            ErrorKind::Element => "element",
            ErrorKind::FieldRequired => "field required",
            ErrorKind::Root => "root",
            ErrorKind::Instantiation => "instantiation",
            ErrorKind::Schema => "schema",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::Value => "value",
            ErrorKind::LimitExceeded => "limit exceeded",
            ErrorKind::Xml => "xml",
            ErrorKind::Json => "json",
            ErrorKind::Io => "io",
            ErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Error surfaced at the [`Persister`](crate::Persister) boundary
///
/// Wraps an engine [`Error`] with a message naming the operation that
/// failed. The wrapped error stays reachable through [`cause`](Self::cause)
/// and [`std::error::Error::source`].
#[derive(Error, Debug)]
#[error("{message}")]
pub struct PersistenceError {
    message: String,
    #[source]
    cause: Option<Error>,
}

impl PersistenceError {
    /// Create a new persistence error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Set the underlying cause
    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Get the message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the underlying cause
    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_ref()
    }

    /// Get the kind of the underlying cause
    pub fn kind(&self) -> ErrorKind {
        self.cause.as_ref().map_or(ErrorKind::Other, Error::kind)
    }

    /// Consume the error and return the underlying cause
    pub fn into_cause(self) -> Option<Error> {
        self.cause
    }
}
