use crate::{config::ConfigError, value::RowError};
use thiserror::Error as ThisError;

///
/// ErrorClass
/// Coarse classification callers branch on without matching every variant.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Broken repository declaration or configuration; never retried.
    Configuration,
    /// Provider or runtime failure while executing a query.
    Execution,
    /// Expected a row and found none.
    NotFound,
    /// Found more rows than the operation allows, or a constraint clash.
    Conflict,
}

///
/// PersistenceError
///
/// Errors reported by a persistence context.
/// These surface to callers unwrapped through `QueryError::Persistence`.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PersistenceError {
    #[error("no result for query on '{entity}'")]
    NoResult { entity: String },

    #[error("expected one result for query on '{entity}', found {count}")]
    NonUnique { entity: String, count: usize },

    #[error("entity '{entity}' with key {key} not found")]
    EntityNotFound { entity: String, key: String },

    #[error("constraint violation on '{entity}': {message}")]
    ConstraintViolation { entity: String, message: String },

    #[error("syntax error in query '{query}': {message}")]
    Syntax { query: String, message: String },

    #[error("unknown entity '{name}'")]
    UnknownEntity { name: String },

    #[error("unknown attribute '{path}' on entity '{entity}'")]
    UnknownAttribute { entity: String, path: String },

    #[error("unknown named query '{name}'")]
    UnknownNamedQuery { name: String },

    #[error("query parameter {parameter} is not bound")]
    MissingParameter { parameter: String },

    #[error("unsupported operation: {message}")]
    Unsupported { message: String },
}

impl PersistenceError {
    pub(crate) fn syntax(query: &str, message: impl Into<String>) -> Self {
        Self::Syntax {
            query: query.to_string(),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NoResult { .. } | Self::EntityNotFound { .. } => ErrorClass::NotFound,
            Self::NonUnique { .. } | Self::ConstraintViolation { .. } => ErrorClass::Conflict,
            Self::Syntax { .. }
            | Self::UnknownEntity { .. }
            | Self::UnknownAttribute { .. }
            | Self::UnknownNamedQuery { .. } => ErrorClass::Configuration,
            Self::MissingParameter { .. } | Self::Unsupported { .. } => ErrorClass::Execution,
        }
    }
}

///
/// MethodExpressionError
///
/// Raised when a derived method name cannot be turned into a predicate tree.
/// Always a configuration-time failure.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MethodExpressionError {
    #[error("method '{method}' does not start with a recognized query prefix")]
    UnknownPrefix { method: String },

    #[error("method '{method}': no attribute matches '{segment}' on entity '{entity}'")]
    UnresolvedAttribute {
        method: String,
        entity: String,
        segment: String,
    },

    #[error("method '{method}' has an empty clause")]
    EmptyClause { method: String },

    #[error("method '{method}' declares an invalid result limit")]
    InvalidLimit { method: String },

    #[error("method '{method}': {keyword} requires {requirement} attribute '{path}'")]
    InvalidComparator {
        method: String,
        keyword: &'static str,
        requirement: &'static str,
        path: String,
    },

    #[error("method '{method}' binds {expected} parameters but declares {declared}")]
    ArityMismatch {
        method: String,
        expected: usize,
        declared: usize,
    },

    #[error("unknown entity '{name}'")]
    UnknownEntity { name: String },
}

///
/// QueryError
/// Top-level error returned by every public query operation.
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error(transparent)]
    Method(#[from] MethodExpressionError),

    #[error("invalid query declaration on '{method}': {message}")]
    Explicit { method: String, message: String },

    #[error("cannot derive a count query from '{query}': no from clause")]
    CountRewrite { query: String },

    #[error("unknown repository method '{name}'")]
    UnknownMethod { name: String },

    #[error("invalid signature for '{method}': {message}")]
    Signature { method: String, message: String },

    #[error("invalid arguments for '{method}': {message}")]
    Argument { method: String, message: String },

    #[error("cannot decode entity '{entity}': {source}")]
    RowDecode {
        entity: String,
        #[source]
        source: RowError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl QueryError {
    pub(crate) fn argument(method: &str, message: impl Into<String>) -> Self {
        Self::Argument {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn explicit(method: &str, message: impl Into<String>) -> Self {
        Self::Explicit {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn signature(method: &str, message: impl Into<String>) -> Self {
        Self::Signature {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn row_decode(entity: &str, source: RowError) -> Self {
        Self::RowDecode {
            entity: entity.to_string(),
            source,
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Method(_)
            | Self::Explicit { .. }
            | Self::CountRewrite { .. }
            | Self::UnknownMethod { .. }
            | Self::Signature { .. }
            | Self::Config(_) => ErrorClass::Configuration,
            Self::Argument { .. } | Self::RowDecode { .. } => ErrorClass::Execution,
            Self::Persistence(err) => err.class(),
        }
    }

    #[must_use]
    pub const fn is_no_result(&self) -> bool {
        matches!(self, Self::Persistence(PersistenceError::NoResult { .. }))
    }

    #[must_use]
    pub const fn is_non_unique(&self) -> bool {
        matches!(self, Self::Persistence(PersistenceError::NonUnique { .. }))
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class(), ErrorClass::Configuration)
    }

    /// The provider error, when this error originated in the persistence context.
    #[must_use]
    pub const fn persistence(&self) -> Option<&PersistenceError> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}
