use crate::home::HomeError;
use std::fmt;

///
/// HomeOperation
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HomeOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for HomeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };

        write!(f, "{label}")
    }
}

///
/// EntityMessage
///
/// Emitted by the write operations of an `EntityHome`. Failures keep the
/// entity that was being written and the error that stopped it.
///

#[derive(Debug)]
pub enum EntityMessage<E> {
    Created(E),
    Updated(E),
    Deleted(E),
    Failed {
        entity: Option<E>,
        operation: HomeOperation,
        error: HomeError,
    },
}

impl<E> EntityMessage<E> {
    #[must_use]
    pub const fn operation(&self) -> HomeOperation {
        match self {
            Self::Created(_) => HomeOperation::Create,
            Self::Updated(_) => HomeOperation::Update,
            Self::Deleted(_) => HomeOperation::Delete,
            Self::Failed { operation, .. } => *operation,
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    #[must_use]
    pub const fn entity(&self) -> Option<&E> {
        match self {
            Self::Created(entity) | Self::Updated(entity) | Self::Deleted(entity) => Some(entity),
            Self::Failed { entity, .. } => entity.as_ref(),
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&HomeError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}
