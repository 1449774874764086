//! In-memory persistence context.
//!
//! Tables live behind `RefCell`s for one logical unit of work. String,
//! named, native and criteria queries all lower to `CriteriaQuery` and
//! run through the same evaluator.

mod eval;
mod lexer;
mod parser;
mod query;

#[cfg(test)]
mod tests;

use crate::{
    db::{
        criteria::CriteriaQuery,
        provider::{PersistenceContext, PreparedQuery, QuerySource},
    },
    error::PersistenceError,
    model::{EntityModel, FieldKind, MetadataRegistry},
    value::{Row, Value},
};
use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
};
use tracing::trace;

pub use query::MemoryQuery;

///
/// Table
/// Rows in insertion order plus the generated-key sequence.
///

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    sequence: u64,
}

impl Table {
    fn position(&self, primary_key: &str, key: &Value) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.value(primary_key).loose_eq(key) == Some(true))
    }

    // keep the sequence ahead of explicitly assigned integer keys
    fn observe_key(&mut self, key: &Value) {
        if let Some(n) = key.as_count() {
            self.sequence = self.sequence.max(n);
        }
    }
}

///
/// MemoryContext
///

#[derive(Debug)]
pub struct MemoryContext {
    registry: MetadataRegistry,
    tables: RefCell<BTreeMap<&'static str, Table>>,
    flushes: Cell<u64>,
}

impl MemoryContext {
    #[must_use]
    pub fn new(registry: MetadataRegistry) -> Self {
        Self {
            registry,
            tables: RefCell::new(BTreeMap::new()),
            flushes: Cell::new(0),
        }
    }

    /// Number of stored rows for an entity.
    #[must_use]
    pub fn len(&self, entity: &str) -> usize {
        self.registry.get(entity).map_or(0, |model| {
            self.tables
                .borrow()
                .get(model.entity_name)
                .map_or(0, |table| table.rows.len())
        })
    }

    #[must_use]
    pub fn is_empty(&self, entity: &str) -> bool {
        self.len(entity) == 0
    }

    /// Number of `flush` calls observed.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.flushes.get()
    }

    fn model(&self, entity: &str) -> Result<&'static EntityModel, PersistenceError> {
        self.registry
            .get(entity)
            .ok_or_else(|| PersistenceError::UnknownEntity {
                name: entity.to_string(),
            })
    }

    fn prepare(
        &self,
        source: QuerySource,
        statement: CriteriaQuery,
    ) -> Result<Box<dyn PreparedQuery + '_>, PersistenceError> {
        let model = self.model(&statement.entity)?;
        trace!(entity = model.entity_name, ?source, "prepared query");

        Ok(Box::new(MemoryQuery::new(self, model, source, statement)))
    }

    /// Matching rows in insertion order.
    pub(crate) fn scan(
        &self,
        model: &'static EntityModel,
        mut keep: impl FnMut(&Row) -> Result<bool, PersistenceError>,
    ) -> Result<Vec<Row>, PersistenceError> {
        let tables = self.tables.borrow();
        let Some(table) = tables.get(model.entity_name) else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for row in &table.rows {
            if keep(row)? {
                rows.push(row.clone());
            }
        }

        Ok(rows)
    }

    /// Remove matching rows; returns how many were removed.
    pub(crate) fn delete_where(
        &self,
        model: &'static EntityModel,
        mut remove: impl FnMut(&Row) -> Result<bool, PersistenceError>,
    ) -> Result<u64, PersistenceError> {
        let mut tables = self.tables.borrow_mut();
        let Some(table) = tables.get_mut(model.entity_name) else {
            return Ok(0);
        };

        // evaluate every row before touching the table
        let doomed = table
            .rows
            .iter()
            .map(&mut remove)
            .collect::<Result<Vec<bool>, _>>()?;

        let mut flags = doomed.iter();
        table.rows.retain(|_| !flags.next().copied().unwrap_or(false));

        Ok(doomed.iter().fold(0_u64, |n, &d| n + u64::from(d)))
    }

    fn insert(&self, model: &'static EntityModel, mut row: Row) -> Result<Row, PersistenceError> {
        let mut tables = self.tables.borrow_mut();
        let table = tables.entry(model.entity_name).or_default();
        let key = row.value(model.primary_key).clone();

        if key.is_null() {
            let kind = model.primary_key_field().map(|field| field.kind);
            let generated = match kind {
                Some(FieldKind::Int) => {
                    table.sequence += 1;
                    Value::Int(i64::try_from(table.sequence).map_err(|_| {
                        PersistenceError::ConstraintViolation {
                            entity: model.entity_name.to_string(),
                            message: "key sequence exhausted".to_string(),
                        }
                    })?)
                }
                Some(FieldKind::Uint) => {
                    table.sequence += 1;
                    Value::Uint(table.sequence)
                }
                _ => {
                    return Err(PersistenceError::ConstraintViolation {
                        entity: model.entity_name.to_string(),
                        message: format!("primary key '{}' must be assigned", model.primary_key),
                    });
                }
            };
            row.insert(model.primary_key.to_string(), generated);
        } else {
            if table.position(model.primary_key, &key).is_some() {
                return Err(PersistenceError::ConstraintViolation {
                    entity: model.entity_name.to_string(),
                    message: format!("duplicate primary key {key}"),
                });
            }
            table.observe_key(&key);
        }

        table.rows.push(row.clone());

        Ok(row)
    }
}

impl PersistenceContext for MemoryContext {
    fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    fn create_query<'a>(
        &'a self,
        query: &str,
    ) -> Result<Box<dyn PreparedQuery + 'a>, PersistenceError> {
        let statement = parser::parse_statement(query, &self.registry, false)?;
        self.prepare(QuerySource::Text, statement)
    }

    fn create_named_query<'a>(
        &'a self,
        name: &str,
    ) -> Result<Box<dyn PreparedQuery + 'a>, PersistenceError> {
        let query = self
            .registry
            .named_query(name)
            .ok_or_else(|| PersistenceError::UnknownNamedQuery {
                name: name.to_string(),
            })?;
        let statement = parser::parse_statement(query, &self.registry, false)?;
        self.prepare(QuerySource::Named, statement)
    }

    fn create_native_query<'a>(
        &'a self,
        sql: &str,
    ) -> Result<Box<dyn PreparedQuery + 'a>, PersistenceError> {
        let statement = parser::parse_statement(sql, &self.registry, true)?;
        self.prepare(QuerySource::Native, statement)
    }

    fn create_criteria_query<'a>(
        &'a self,
        query: CriteriaQuery,
    ) -> Result<Box<dyn PreparedQuery + 'a>, PersistenceError> {
        self.prepare(QuerySource::Criteria, query)
    }

    fn persist(&self, entity: &str, row: Row) -> Result<Row, PersistenceError> {
        let model = self.model(entity)?;
        self.insert(model, row)
    }

    fn merge(&self, entity: &str, row: Row) -> Result<Row, PersistenceError> {
        let model = self.model(entity)?;
        let key = row.value(model.primary_key).clone();
        if key.is_null() {
            return self.insert(model, row);
        }

        let mut tables = self.tables.borrow_mut();
        let table = tables.entry(model.entity_name).or_default();
        match table.position(model.primary_key, &key) {
            Some(index) => table.rows[index] = row.clone(),
            None => {
                table.observe_key(&key);
                table.rows.push(row.clone());
            }
        }

        Ok(row)
    }

    fn remove(&self, entity: &str, key: &Value) -> Result<(), PersistenceError> {
        let model = self.model(entity)?;
        let mut tables = self.tables.borrow_mut();
        let index = tables
            .get(model.entity_name)
            .and_then(|table| table.position(model.primary_key, key));

        match (index, tables.get_mut(model.entity_name)) {
            (Some(index), Some(table)) => {
                table.rows.remove(index);
                Ok(())
            }
            _ => Err(PersistenceError::EntityNotFound {
                entity: model.entity_name.to_string(),
                key: key.to_string(),
            }),
        }
    }

    fn find(&self, entity: &str, key: &Value) -> Result<Option<Row>, PersistenceError> {
        let model = self.model(entity)?;
        let tables = self.tables.borrow();

        Ok(tables.get(model.entity_name).and_then(|table| {
            table
                .position(model.primary_key, key)
                .map(|index| table.rows[index].clone())
        }))
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        self.flushes.set(self.flushes.get() + 1);
        Ok(())
    }
}
