//! Persistence context boundary.
//!
//! The engine prepares queries, binds parameters and applies modifiers
//! through these traits only; `memory` is the bundled implementation.

use crate::{
    db::criteria::CriteriaQuery,
    error::PersistenceError,
    model::MetadataRegistry,
    value::{Row, Value},
};
use std::fmt;

///
/// QuerySource
/// Which statement form a prepared query was created from.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuerySource {
    Text,
    Named,
    Native,
    Criteria,
}

///
/// LockMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LockMode {
    #[default]
    None,
    Read,
    Write,
    Optimistic,
    OptimisticForceIncrement,
    PessimisticRead,
    PessimisticWrite,
    PessimisticForceIncrement,
}

///
/// FlushMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FlushMode {
    #[default]
    Auto,
    Commit,
}

///
/// Output
/// One result element: a full entity row, or a scalar projection.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Output {
    Row(Row),
    Scalar(Value),
}

impl Output {
    #[must_use]
    pub fn into_row(self) -> Option<Row> {
        match self {
            Self::Row(row) => Some(row),
            Self::Scalar(_) => None,
        }
    }

    #[must_use]
    pub fn into_scalar(self) -> Option<Value> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::Row(_) => None,
        }
    }
}

///
/// PreparedQuery
///
/// Executable query object. Setters record state; nothing runs until
/// `result_list`, `single_result` or `execute_update`.
///

pub trait PreparedQuery: fmt::Debug {
    fn source(&self) -> QuerySource;

    /// Name of the queried entity.
    fn entity_name(&self) -> &str;

    /// Bind a one-based positional parameter.
    fn set_parameter(&mut self, position: usize, value: Value);

    fn set_named_parameter(&mut self, name: &str, value: Value);

    fn set_first_result(&mut self, first: u32);

    fn set_max_results(&mut self, max: u32);

    fn set_lock_mode(&mut self, mode: LockMode);

    fn set_flush_mode(&mut self, mode: FlushMode);

    fn set_hint(&mut self, name: &str, value: Value);

    fn first_result(&self) -> u32;

    fn max_results(&self) -> Option<u32>;

    fn lock_mode(&self) -> LockMode;

    fn flush_mode(&self) -> FlushMode;

    fn hint(&self, name: &str) -> Option<&Value>;

    fn result_list(&self) -> Result<Vec<Output>, PersistenceError>;

    /// Exactly one result; `NoResult` / `NonUnique` otherwise.
    fn single_result(&self) -> Result<Output, PersistenceError> {
        let mut results = self.result_list()?;
        match results.len() {
            0 => Err(PersistenceError::NoResult {
                entity: self.entity_name().to_string(),
            }),
            1 => Ok(results.remove(0)),
            count => Err(PersistenceError::NonUnique {
                entity: self.entity_name().to_string(),
                count,
            }),
        }
    }

    /// Run a bulk statement and return the affected row count.
    fn execute_update(&self) -> Result<u64, PersistenceError>;
}

///
/// PersistenceContext
///
/// One logical unit of work. Rows exchanged here carry attribute names
/// as declared in the registry's entity models.
///

pub trait PersistenceContext {
    fn registry(&self) -> &MetadataRegistry;

    fn create_query<'a>(
        &'a self,
        query: &str,
    ) -> Result<Box<dyn PreparedQuery + 'a>, PersistenceError>;

    fn create_named_query<'a>(
        &'a self,
        name: &str,
    ) -> Result<Box<dyn PreparedQuery + 'a>, PersistenceError>;

    fn create_native_query<'a>(
        &'a self,
        sql: &str,
    ) -> Result<Box<dyn PreparedQuery + 'a>, PersistenceError>;

    fn create_criteria_query<'a>(
        &'a self,
        query: CriteriaQuery,
    ) -> Result<Box<dyn PreparedQuery + 'a>, PersistenceError>;

    /// Insert a new row; returns the stored row with any generated key.
    fn persist(&self, entity: &str, row: Row) -> Result<Row, PersistenceError>;

    /// Update an existing row, or insert it if the key is unknown.
    fn merge(&self, entity: &str, row: Row) -> Result<Row, PersistenceError>;

    fn remove(&self, entity: &str, key: &Value) -> Result<(), PersistenceError>;

    fn find(&self, entity: &str, key: &Value) -> Result<Option<Row>, PersistenceError>;

    fn flush(&self) -> Result<(), PersistenceError>;
}
