//! Post-processor chains.
//!
//! String processors rewrite the query before it is prepared; query
//! processors adjust the prepared query afterwards. Both run in
//! registration order. The built-in variants cover ordering, paging,
//! locking, flush mode, hints and the count rewrite; `Custom` variants
//! carry caller-supplied processors.

mod count;
mod order;


use crate::{
    db::{
        compile::CompiledQuery,
        context::InvocationContext,
        criteria::CriteriaQuery,
        provider::{FlushMode, LockMode, PreparedQuery},
    },
    error::QueryError,
    value::Value,
};
use std::{fmt, sync::Arc};

pub use count::rewrite_count;
pub use order::OrderBy;

///
/// QueryStringPostProcessor
/// Rewrites a query-language string before preparation.
///

pub trait QueryStringPostProcessor: fmt::Debug + Send + Sync {
    fn post_process(&self, query: &str) -> String;
}

///
/// PreparedQueryPostProcessor
/// Adjusts an already-prepared query.
///

pub trait PreparedQueryPostProcessor: fmt::Debug + Send + Sync {
    fn post_process(&self, query: &mut dyn PreparedQuery) -> Result<(), QueryError>;
}

///
/// StringPostProcessor
///

#[derive(Clone, Debug)]
pub enum StringPostProcessor {
    OrderBy(OrderBy),
    Custom(Arc<dyn QueryStringPostProcessor>),
}

impl StringPostProcessor {
    #[must_use]
    pub fn post_process(&self, query: &str) -> String {
        match self {
            Self::OrderBy(order) => order.apply_to_string(query),
            Self::Custom(processor) => processor.post_process(query),
        }
    }

    /// Criteria queries only honor ordering; custom string rewrites
    /// have nothing to act on.
    pub fn post_process_criteria(&self, query: &mut CriteriaQuery) {
        if let Self::OrderBy(order) = self {
            order.apply_to_criteria(query);
        }
    }

    #[must_use]
    pub const fn as_order(&self) -> Option<&OrderBy> {
        match self {
            Self::OrderBy(order) => Some(order),
            Self::Custom(_) => None,
        }
    }

    pub const fn as_order_mut(&mut self) -> Option<&mut OrderBy> {
        match self {
            Self::OrderBy(order) => Some(order),
            Self::Custom(_) => None,
        }
    }
}

impl From<OrderBy> for StringPostProcessor {
    fn from(order: OrderBy) -> Self {
        Self::OrderBy(order)
    }
}

///
/// QueryPostProcessor
///

#[derive(Clone, Debug)]
pub enum QueryPostProcessor {
    FirstResult(u32),
    MaxResults(u32),
    LockMode(LockMode),
    FlushMode(FlushMode),
    Hint { name: String, value: Value },
    /// Replace the prepared query with its count projection.
    Count,
    Custom(Arc<dyn PreparedQueryPostProcessor>),
}

impl QueryPostProcessor {
    #[must_use]
    pub fn hint(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Hint {
            name: name.into(),
            value: value.into(),
        }
    }

    /// True when both processors set the same query property.
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Hint { name: a, .. }, Self::Hint { name: b, .. }) => a == b,
            (Self::Custom(_), _) | (_, Self::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    pub fn post_process<'a>(
        &self,
        ctx: &InvocationContext<'a>,
        finalized: &CompiledQuery,
        mut prepared: Box<dyn PreparedQuery + 'a>,
    ) -> Result<Box<dyn PreparedQuery + 'a>, QueryError> {
        match self {
            Self::FirstResult(first) => prepared.set_first_result(*first),
            Self::MaxResults(max) => prepared.set_max_results(*max),
            Self::LockMode(mode) => prepared.set_lock_mode(*mode),
            Self::FlushMode(mode) => prepared.set_flush_mode(*mode),
            Self::Hint { name, value } => prepared.set_hint(name, value.clone()),
            Self::Count => return count::apply(ctx, finalized, prepared),
            Self::Custom(processor) => processor.post_process(prepared.as_mut())?,
        }

        Ok(prepared)
    }
}
