//! Fluent result cursor over one logical query.


use crate::{
    db::{
        context::InvocationContext,
        postprocess::{OrderBy, QueryPostProcessor, StringPostProcessor},
        predicate::Direction,
        provider::{FlushMode, LockMode, Output, PreparedQuery},
    },
    error::{PersistenceError, QueryError},
    model::AttributePath,
    obs::{ExecKind, sink::Span},
    traits::EntityKind,
    value::{RowError, Value},
};
use std::marker::PhantomData;

///
/// QueryResult
///
/// Modifiers are recorded as post-processors on the owned context and
/// only take effect when a terminal operation runs. Terminals borrow the
/// cursor, so it can be executed repeatedly.
///

#[derive(Debug)]
pub struct QueryResult<'a, E> {
    context: InvocationContext<'a>,
    page: u32,
    page_size: u32,
    _marker: PhantomData<fn() -> E>,
}

impl<'a, E: EntityKind> QueryResult<'a, E> {
    #[must_use]
    pub const fn new(context: InvocationContext<'a>, page_size: u32) -> Self {
        Self {
            context,
            page: 0,
            page_size,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn context(&self) -> &InvocationContext<'a> {
        &self.context
    }

    #[must_use]
    pub fn into_context(self) -> InvocationContext<'a> {
        self.context
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    #[must_use]
    pub fn order_asc(self, path: impl Into<AttributePath>) -> Self {
        self.order(path.into(), Direction::Asc)
    }

    #[must_use]
    pub fn order_desc(self, path: impl Into<AttributePath>) -> Self {
        self.order(path.into(), Direction::Desc)
    }

    // an existing term for the same path is updated in place
    fn order(mut self, path: AttributePath, direction: Direction) -> Self {
        match self.find_order(&path) {
            Some(existing) => existing.direction = direction,
            None => self
                .context
                .add_string_processor(OrderBy::new(path, direction).into()),
        }
        self
    }

    /// Toggle the direction of an existing term, or add it ascending.
    #[must_use]
    pub fn change_order(mut self, path: impl Into<AttributePath>) -> Self {
        let path = path.into();
        match self.find_order(&path) {
            Some(existing) => existing.toggle(),
            None => self.context.add_string_processor(OrderBy::asc(path).into()),
        }
        self
    }

    #[must_use]
    pub fn clear_order(mut self) -> Self {
        self.context
            .string_processors_mut()
            .retain(|processor| processor.as_order().is_none());
        self
    }

    fn find_order(&mut self, path: &AttributePath) -> Option<&mut OrderBy> {
        self.context
            .string_processors_mut()
            .iter_mut()
            .filter_map(StringPostProcessor::as_order_mut)
            .find(|order| &order.path == path)
    }

    // ------------------------------------------------------------------
    // Query modifiers
    // ------------------------------------------------------------------

    /// Limit the result size; also becomes the page size.
    #[must_use]
    pub fn max_results(mut self, max: u32) -> Self {
        self.set_processor(QueryPostProcessor::MaxResults(max));
        self.page_size = max;
        self
    }

    #[must_use]
    pub fn first_result(mut self, first: u32) -> Self {
        self.set_processor(QueryPostProcessor::FirstResult(first));
        self
    }

    #[must_use]
    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.set_processor(QueryPostProcessor::LockMode(mode));
        self
    }

    #[must_use]
    pub fn flush_mode(mut self, mode: FlushMode) -> Self {
        self.set_processor(QueryPostProcessor::FlushMode(mode));
        self
    }

    #[must_use]
    pub fn hint(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_processor(QueryPostProcessor::hint(name, value));
        self
    }

    fn set_processor(&mut self, processor: QueryPostProcessor) {
        let chain = self.context.query_processors_mut();
        chain.retain(|existing| !existing.same_kind(&processor));
        chain.push(processor);
    }

    // ------------------------------------------------------------------
    // Paging
    // ------------------------------------------------------------------

    #[must_use]
    pub fn with_page_size(self, page_size: u32) -> Self {
        self.max_results(page_size)
    }

    #[must_use]
    pub fn to_page(mut self, page: u32) -> Self {
        self.page = page;
        self.seek()
    }

    #[must_use]
    pub fn next_page(mut self) -> Self {
        self.page = self.page.saturating_add(1);
        self.seek()
    }

    #[must_use]
    pub fn previous_page(mut self) -> Self {
        self.page = self.page.saturating_sub(1);
        self.seek()
    }

    fn seek(self) -> Self {
        let first = self.page.saturating_mul(self.page_size);
        self.first_result(first)
    }

    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    // ------------------------------------------------------------------
    // Terminals
    // ------------------------------------------------------------------

    pub fn result_list(&self) -> Result<Vec<E>, QueryError> {
        let mut span = self.span(ExecKind::Query);
        let outputs = self.context.execute()?.result_list()?;
        span.set_rows(outputs.len() as u64);

        outputs.into_iter().map(decode::<E>).collect()
    }

    /// Exactly one entity; provider `NoResult` / `NonUnique` errors pass through.
    pub fn single_result(&self) -> Result<E, QueryError> {
        let mut span = self.span(ExecKind::Query);
        let output = self.context.execute()?.single_result()?;
        span.set_rows(1);

        decode(output)
    }

    /// Zero or one entity; more than one is `NonUnique`.
    pub fn optional_result(&self) -> Result<Option<E>, QueryError> {
        match self.single_result() {
            Ok(entity) => Ok(Some(entity)),
            Err(err) if err.is_no_result() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Row count of the unpaged query.
    ///
    /// The count rewrite is appended to a copy of the chain for this call
    /// only, so later terminals never see it.
    pub fn count(&self) -> Result<u64, QueryError> {
        let _span = self.span(ExecKind::Count);
        let prepared = self.context.execute_with(&[QueryPostProcessor::Count])?;

        read_count(prepared.as_ref())
    }

    /// Number of pages at the current page size.
    pub fn count_pages(&self) -> Result<u64, QueryError> {
        if self.page_size == 0 {
            return Ok(0);
        }

        Ok(self.count()?.div_ceil(u64::from(self.page_size)))
    }

    fn span(&self, kind: ExecKind) -> Span<'a> {
        Span::new(
            self.context.metrics_sink(),
            kind,
            self.context.entity().entity_name,
        )
    }
}

// ---------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------

pub(crate) fn decode<E: EntityKind>(output: Output) -> Result<E, QueryError> {
    match output {
        Output::Row(row) => {
            E::from_row(&row).map_err(|err| QueryError::row_decode(E::entity_name(), err))
        }
        Output::Scalar(value) => Err(QueryError::row_decode(
            E::entity_name(),
            RowError::Type {
                field: "*".to_string(),
                expected: "entity row",
                found: value,
            },
        )),
    }
}

pub(crate) fn read_count(prepared: &dyn PreparedQuery) -> Result<u64, QueryError> {
    let output = prepared.single_result()?;
    let value = match output {
        Output::Scalar(value) => value,
        Output::Row(_) => Value::Null,
    };

    value.as_count().ok_or_else(|| {
        PersistenceError::Unsupported {
            message: format!("count query on '{}' returned {value}", prepared.entity_name()),
        }
        .into()
    })
}
