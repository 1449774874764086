use super::{
    MemoryContext,
    eval::{self, Bindings},
};
use crate::{
    db::{
        criteria::{CriteriaQuery, Projection, StatementKind},
        provider::{FlushMode, LockMode, Output, PreparedQuery, QuerySource},
    },
    error::PersistenceError,
    model::EntityModel,
    value::{Row, Value},
};
use std::collections::BTreeMap;

///
/// MemoryQuery
///
/// Prepared query against a `MemoryContext`. Counts ignore
/// `first_result` / `max_results`.
///

#[derive(Debug)]
pub struct MemoryQuery<'a> {
    ctx: &'a MemoryContext,
    model: &'static EntityModel,
    source: QuerySource,
    statement: CriteriaQuery,
    positional: BTreeMap<usize, Value>,
    named: BTreeMap<String, Value>,
    first: u32,
    max: Option<u32>,
    lock: LockMode,
    flush: FlushMode,
    hints: BTreeMap<String, Value>,
}

impl<'a> MemoryQuery<'a> {
    pub(super) fn new(
        ctx: &'a MemoryContext,
        model: &'static EntityModel,
        source: QuerySource,
        statement: CriteriaQuery,
    ) -> Self {
        Self {
            ctx,
            model,
            source,
            statement,
            positional: BTreeMap::new(),
            named: BTreeMap::new(),
            first: 0,
            max: None,
            lock: LockMode::default(),
            flush: FlushMode::default(),
            hints: BTreeMap::new(),
        }
    }

    /// The statement this query executes.
    #[must_use]
    pub const fn statement(&self) -> &CriteriaQuery {
        &self.statement
    }

    const fn bindings(&self) -> Bindings<'_> {
        Bindings {
            positional: &self.positional,
            named: &self.named,
        }
    }

    fn matching_rows(&self) -> Result<Vec<Row>, PersistenceError> {
        let bindings = self.bindings();
        let mut rows = self.ctx.scan(self.model, |row| match &self.statement.predicate {
            Some(expr) => Ok(eval::matches(expr, row, bindings)? == Some(true)),
            None => Ok(true),
        })?;

        if self.statement.distinct {
            let mut unique: Vec<Row> = Vec::with_capacity(rows.len());
            for row in rows {
                if !unique.contains(&row) {
                    unique.push(row);
                }
            }
            rows = unique;
        }

        eval::sort_rows(&mut rows, &self.statement.order);

        Ok(rows)
    }
}

impl PreparedQuery for MemoryQuery<'_> {
    fn source(&self) -> QuerySource {
        self.source
    }

    fn entity_name(&self) -> &str {
        self.model.entity_name
    }

    fn set_parameter(&mut self, position: usize, value: Value) {
        self.positional.insert(position, value);
    }

    fn set_named_parameter(&mut self, name: &str, value: Value) {
        self.named.insert(name.to_string(), value);
    }

    fn set_first_result(&mut self, first: u32) {
        self.first = first;
    }

    fn set_max_results(&mut self, max: u32) {
        self.max = Some(max);
    }

    fn set_lock_mode(&mut self, mode: LockMode) {
        self.lock = mode;
    }

    fn set_flush_mode(&mut self, mode: FlushMode) {
        self.flush = mode;
    }

    fn set_hint(&mut self, name: &str, value: Value) {
        self.hints.insert(name.to_string(), value);
    }

    fn first_result(&self) -> u32 {
        self.first
    }

    fn max_results(&self) -> Option<u32> {
        self.max
    }

    fn lock_mode(&self) -> LockMode {
        self.lock
    }

    fn flush_mode(&self) -> FlushMode {
        self.flush
    }

    fn hint(&self, name: &str) -> Option<&Value> {
        self.hints.get(name)
    }

    fn result_list(&self) -> Result<Vec<Output>, PersistenceError> {
        if self.statement.kind == StatementKind::Delete {
            return Err(PersistenceError::Unsupported {
                message: "bulk delete must run through execute_update".to_string(),
            });
        }

        let rows = self.matching_rows()?;
        if self.statement.projection == Projection::Count {
            let count = u64::try_from(rows.len()).unwrap_or(u64::MAX);
            return Ok(vec![Output::Scalar(Value::Uint(count))]);
        }

        let first = usize::try_from(self.first).unwrap_or(usize::MAX);
        let max = self
            .max
            .map_or(usize::MAX, |max| usize::try_from(max).unwrap_or(usize::MAX));

        Ok(rows
            .into_iter()
            .skip(first)
            .take(max)
            .map(Output::Row)
            .collect())
    }

    fn execute_update(&self) -> Result<u64, PersistenceError> {
        if self.statement.kind != StatementKind::Delete {
            return Err(PersistenceError::Unsupported {
                message: "execute_update requires a delete statement".to_string(),
            });
        }

        let bindings = self.bindings();
        self.ctx
            .delete_where(self.model, |row| match &self.statement.predicate {
                Some(expr) => Ok(eval::matches(expr, row, bindings)? == Some(true)),
                None => Ok(true),
            })
    }
}
