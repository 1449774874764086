use crate::db::result::QueryResult;

///
/// Outcome
/// Result of one repository invocation, shaped by the method's return kind.
///

#[derive(Debug)]
pub enum Outcome<'a, E> {
    Entity(E),
    Maybe(Option<E>),
    List(Vec<E>),
    Cursor(QueryResult<'a, E>),
    Count(u64),
    Exists(bool),
    /// Rows touched by a bulk statement.
    Affected(u64),
    Unit,
}

impl<'a, E> Outcome<'a, E> {
    #[must_use]
    pub fn into_entity(self) -> Option<E> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Maybe(entity) => entity,
            _ => None,
        }
    }

    #[must_use]
    pub fn into_list(self) -> Option<Vec<E>> {
        match self {
            Self::List(list) => Some(list),
            Self::Entity(entity) => Some(vec![entity]),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_cursor(self) -> Option<QueryResult<'a, E>> {
        match self {
            Self::Cursor(cursor) => Some(cursor),
            _ => None,
        }
    }

    #[must_use]
    pub const fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) | Self::Affected(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn exists(&self) -> Option<bool> {
        match self {
            Self::Exists(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}
