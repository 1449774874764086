//! Per-call invocation context.
//!
//! Holds the compiled query, the bound arguments and both post-processor
//! chains for exactly one logical call. Never shared across calls.

mod params;


use crate::{
    db::{
        compile::CompiledQuery,
        postprocess::{QueryPostProcessor, StringPostProcessor},
        provider::{PersistenceContext, PreparedQuery},
    },
    error::QueryError,
    model::EntityModel,
    obs::MetricsSink,
};
use tracing::{debug, warn};

pub use params::Parameters;

///
/// InvocationContext
///
/// Execution order:
/// 1. string processors rewrite the query string (or criteria ordering);
/// 2. the query is prepared and parameters are bound;
/// 3. query processors run against the prepared query, in registration order.
///

#[derive(Clone)]
pub struct InvocationContext<'a> {
    persistence: &'a dyn PersistenceContext,
    entity: &'static EntityModel,
    query: CompiledQuery,
    params: Parameters,
    string_processors: Vec<StringPostProcessor>,
    query_processors: Vec<QueryPostProcessor>,
    sink: Option<&'a dyn MetricsSink>,
}

impl<'a> InvocationContext<'a> {
    #[must_use]
    pub const fn new(
        persistence: &'a dyn PersistenceContext,
        entity: &'static EntityModel,
        query: CompiledQuery,
        params: Parameters,
    ) -> Self {
        Self {
            persistence,
            entity,
            query,
            params,
            string_processors: Vec::new(),
            query_processors: Vec::new(),
            sink: None,
        }
    }

    #[must_use]
    pub const fn with_metrics_sink(mut self, sink: Option<&'a dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn persistence(&self) -> &'a dyn PersistenceContext {
        self.persistence
    }

    #[must_use]
    pub const fn entity(&self) -> &'static EntityModel {
        self.entity
    }

    #[must_use]
    pub const fn query(&self) -> &CompiledQuery {
        &self.query
    }

    #[must_use]
    pub const fn params(&self) -> &Parameters {
        &self.params
    }

    pub const fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    #[must_use]
    pub const fn metrics_sink(&self) -> Option<&'a dyn MetricsSink> {
        self.sink
    }

    #[must_use]
    pub fn string_processors(&self) -> &[StringPostProcessor] {
        &self.string_processors
    }

    pub const fn string_processors_mut(&mut self) -> &mut Vec<StringPostProcessor> {
        &mut self.string_processors
    }

    #[must_use]
    pub fn query_processors(&self) -> &[QueryPostProcessor] {
        &self.query_processors
    }

    pub const fn query_processors_mut(&mut self) -> &mut Vec<QueryPostProcessor> {
        &mut self.query_processors
    }

    pub fn add_string_processor(&mut self, processor: StringPostProcessor) {
        self.string_processors.push(processor);
    }

    pub fn add_query_processor(&mut self, processor: QueryPostProcessor) {
        self.query_processors.push(processor);
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Compiled query with every string processor applied.
    #[must_use]
    pub fn finalized_query(&self) -> CompiledQuery {
        match &self.query {
            CompiledQuery::Text(query) => CompiledQuery::Text(self.process_string(query)),
            CompiledQuery::Native(sql) => CompiledQuery::Native(self.process_string(sql)),
            CompiledQuery::Criteria(criteria) => {
                let mut criteria = criteria.clone();
                for processor in &self.string_processors {
                    processor.post_process_criteria(&mut criteria);
                }
                CompiledQuery::Criteria(criteria)
            }
            CompiledQuery::Named(name) => {
                if !self.string_processors.is_empty() {
                    warn!(
                        query = name.as_str(),
                        skipped = self.string_processors.len(),
                        "string post-processors do not apply to named queries"
                    );
                }
                CompiledQuery::Named(name.clone())
            }
        }
    }

    fn process_string(&self, query: &str) -> String {
        self.string_processors
            .iter()
            .fold(query.to_string(), |query, processor| {
                processor.post_process(&query)
            })
    }

    /// Prepare a query and bind the invocation's parameters.
    pub(crate) fn prepare(
        &self,
        query: &CompiledQuery,
    ) -> Result<Box<dyn PreparedQuery + 'a>, QueryError> {
        let mut prepared = match query {
            CompiledQuery::Text(query) => self.persistence.create_query(query)?,
            CompiledQuery::Named(name) => self.persistence.create_named_query(name)?,
            CompiledQuery::Native(sql) => self.persistence.create_native_query(sql)?,
            CompiledQuery::Criteria(criteria) => {
                self.persistence.create_criteria_query(criteria.clone())?
            }
        };
        self.params.apply_to(prepared.as_mut());

        Ok(prepared)
    }

    /// Run the full chain and return the executable query.
    pub fn execute(&self) -> Result<Box<dyn PreparedQuery + 'a>, QueryError> {
        self.execute_with(&[])
    }

    /// Run the full chain with `extra` processors appended for this call only.
    pub fn execute_with(
        &self,
        extra: &[QueryPostProcessor],
    ) -> Result<Box<dyn PreparedQuery + 'a>, QueryError> {
        let finalized = self.finalized_query();
        debug!(
            entity = self.entity.entity_name,
            query = ?finalized,
            params = self.params.len(),
            "preparing query"
        );

        let mut prepared = self.prepare(&finalized)?;
        for processor in self.query_processors.iter().chain(extra) {
            prepared = processor.post_process(self, &finalized, prepared)?;
        }

        Ok(prepared)
    }
}

impl std::fmt::Debug for InvocationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("entity", &self.entity.entity_name)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("string_processors", &self.string_processors)
            .field("query_processors", &self.query_processors)
            .finish_non_exhaustive()
    }
}
