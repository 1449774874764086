//! Generic DAO over the criteria backend.
//!
//! Independent of method-name parsing: every query here is built as a
//! `CriteriaQuery` and executed through a `QueryResult`.

#[cfg(test)]
mod tests;

use crate::{
    DEFAULT_PAGE_SIZE, LIKE_ESCAPE,
    db::{
        compile::CompiledQuery,
        context::{InvocationContext, Parameters},
        criteria::{CriteriaQuery, Expr},
        provider::{Output, PersistenceContext},
        result::{QueryResult, decode},
    },
    error::{PersistenceError, QueryError},
    model::FieldModel,
    obs::{ExecKind, MetricsSink, sink::Span},
    traits::EntityKind,
    value::{Value, escape_like},
};
use std::{fmt, marker::PhantomData};
use tracing::debug;

///
/// EntityDao
///
/// `save` inserts when the primary key is `Null` and merges otherwise.
/// Example and like searches skip attributes whose value is `Null`.
///

pub struct EntityDao<'a, E> {
    persistence: &'a dyn PersistenceContext,
    sink: Option<&'a dyn MetricsSink>,
    page_size: u32,
    _marker: PhantomData<fn() -> E>,
}

impl<E: EntityKind> fmt::Debug for EntityDao<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDao")
            .field("entity", &E::entity_name())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl<'a, E: EntityKind> EntityDao<'a, E> {
    #[must_use]
    pub const fn new(persistence: &'a dyn PersistenceContext) -> Self {
        Self {
            persistence,
            sink: None,
            page_size: DEFAULT_PAGE_SIZE,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn with_metrics_sink(mut self, sink: Option<&'a dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn persistence(&self) -> &'a dyn PersistenceContext {
        self.persistence
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Insert or update depending on whether the primary key is set.
    pub fn save(&self, entity: &E) -> Result<E, QueryError> {
        let mut span = Span::new(self.sink, ExecKind::Save, E::entity_name());
        let row = entity.to_row();

        let stored = if entity.primary_key().is_null() {
            self.persistence.persist(E::entity_name(), row)?
        } else {
            self.persistence.merge(E::entity_name(), row)?
        };
        span.set_rows(1);

        decode(Output::Row(stored))
    }

    pub fn save_and_flush(&self, entity: &E) -> Result<E, QueryError> {
        let saved = self.save(entity)?;
        self.flush()?;

        Ok(saved)
    }

    pub fn remove(&self, entity: &E) -> Result<(), QueryError> {
        let mut span = Span::new(self.sink, ExecKind::Remove, E::entity_name());
        self.persistence.remove(E::entity_name(), &entity.primary_key())?;
        span.set_rows(1);

        Ok(())
    }

    /// Reload the stored state of an entity.
    pub fn refresh(&self, entity: &E) -> Result<E, QueryError> {
        let key = entity.primary_key();
        self.find(key.clone())?.ok_or_else(|| {
            PersistenceError::EntityNotFound {
                entity: E::entity_name().to_string(),
                key: key.to_string(),
            }
            .into()
        })
    }

    pub fn flush(&self) -> Result<(), QueryError> {
        self.persistence.flush()?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn find(&self, key: impl Into<Value>) -> Result<Option<E>, QueryError> {
        let mut span = Span::new(self.sink, ExecKind::Query, E::entity_name());
        let Some(row) = self.persistence.find(E::entity_name(), &key.into())? else {
            return Ok(None);
        };
        span.set_rows(1);

        decode(Output::Row(row)).map(Some)
    }

    pub fn find_all(&self) -> Result<Vec<E>, QueryError> {
        self.all().result_list()
    }

    pub fn find_all_range(&self, start: u32, max: u32) -> Result<Vec<E>, QueryError> {
        ranged(self.all(), start, max).result_list()
    }

    /// Equality match on the example's non-null attributes.
    ///
    /// An empty attribute list means every singular attribute.
    pub fn find_by_example(
        &self,
        example: &E,
        attributes: &[&str],
    ) -> Result<Vec<E>, QueryError> {
        self.example(example, attributes, false)?.result_list()
    }

    pub fn find_by_example_range(
        &self,
        example: &E,
        start: u32,
        max: u32,
        attributes: &[&str],
    ) -> Result<Vec<E>, QueryError> {
        ranged(self.example(example, attributes, false)?, start, max).result_list()
    }

    /// Like `find_by_example`, but text attributes match as `%value%`.
    pub fn find_by_like(&self, example: &E, attributes: &[&str]) -> Result<Vec<E>, QueryError> {
        self.example(example, attributes, true)?.result_list()
    }

    pub fn find_by_like_range(
        &self,
        example: &E,
        start: u32,
        max: u32,
        attributes: &[&str],
    ) -> Result<Vec<E>, QueryError> {
        ranged(self.example(example, attributes, true)?, start, max).result_list()
    }

    // ------------------------------------------------------------------
    // Counting
    // ------------------------------------------------------------------

    pub fn count(&self) -> Result<u64, QueryError> {
        self.all().count()
    }

    pub fn count_by_example(&self, example: &E, attributes: &[&str]) -> Result<u64, QueryError> {
        self.example(example, attributes, false)?.count()
    }

    pub fn count_like(&self, example: &E, attributes: &[&str]) -> Result<u64, QueryError> {
        self.example(example, attributes, true)?.count()
    }

    // ------------------------------------------------------------------
    // Cursors
    // ------------------------------------------------------------------

    /// Cursor over every stored entity.
    #[must_use]
    pub fn all(&self) -> QueryResult<'a, E> {
        self.cursor(CriteriaQuery::select(E::entity_name()))
    }

    /// Cursor over an arbitrary criteria query.
    #[must_use]
    pub fn cursor(&self, criteria: CriteriaQuery) -> QueryResult<'a, E> {
        let context = InvocationContext::new(
            self.persistence,
            E::MODEL,
            CompiledQuery::Criteria(criteria),
            Parameters::new(),
        )
        .with_metrics_sink(self.sink);

        QueryResult::new(context, self.page_size)
    }

    fn example(
        &self,
        example: &E,
        attributes: &[&str],
        like: bool,
    ) -> Result<QueryResult<'a, E>, QueryError> {
        let fields = example_fields::<E>(attributes)?;
        let row = example.to_row();

        let mut predicates = Vec::with_capacity(fields.len());
        for field in fields {
            let value = row.value(field.name);
            if value.is_null() {
                continue;
            }

            let predicate = match value.as_text() {
                Some(text) if like => Expr::like(
                    field.name,
                    format!("%{}%", escape_like(text, LIKE_ESCAPE)),
                    LIKE_ESCAPE,
                ),
                _ => Expr::equals(field.name, value.clone()),
            };
            predicates.push(predicate);
        }

        debug!(
            entity = E::entity_name(),
            like,
            predicates = predicates.len(),
            "example query"
        );

        let mut criteria = CriteriaQuery::select(E::entity_name());
        if !predicates.is_empty() {
            criteria = criteria.filter(Expr::and(predicates));
        }

        Ok(self.cursor(criteria))
    }
}

fn ranged<E: EntityKind>(result: QueryResult<'_, E>, start: u32, max: u32) -> QueryResult<'_, E> {
    result.first_result(start).max_results(max)
}

fn example_fields<E: EntityKind>(
    attributes: &[&str],
) -> Result<Vec<&'static FieldModel>, QueryError> {
    if attributes.is_empty() {
        return Ok(E::MODEL.singular_fields().collect());
    }

    attributes
        .iter()
        .map(|name| match E::MODEL.field(name) {
            Some(field) if field.is_singular() && !field.kind.is_embedded() => Ok(field),
            Some(_) => Err(QueryError::argument(
                "find_by_example",
                format!("attribute '{name}' is not a singular value"),
            )),
            None => Err(PersistenceError::UnknownAttribute {
                entity: E::entity_name().to_string(),
                path: (*name).to_string(),
            }
            .into()),
        })
        .collect()
}
