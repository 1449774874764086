use crate::{
    db::{
        compile::Backend,
        provider::{LockMode, PersistenceContext},
        repository::{Argument, Outcome},
    },
    error::QueryError,
};
use std::{fmt, sync::Arc};

///
/// ParamKind
/// One formal parameter of a repository method.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParamKind {
    /// Bound to a query placeholder; `name` binds `:name` on explicit queries.
    Value { name: Option<String> },
    /// Consumed as first/max results.
    Page,
    /// Consumed as ordering.
    Sort,
}

impl ParamKind {
    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value { .. })
    }
}

///
/// ReturnKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReturnKind {
    Single,
    Optional,
    List,
    Cursor,
    Count,
    Exists,
    Void,
}

///
/// QueryDeclaration
///
/// Explicit query attached to a method. When several sources are set,
/// `value` wins over `named`, which wins over `sql`.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryDeclaration {
    pub value: Option<String>,
    pub named: Option<String>,
    pub sql: Option<String>,
    pub max_results: Option<u32>,
    pub lock_mode: Option<LockMode>,
}

impl QueryDeclaration {
    #[must_use]
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            value: Some(query.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            named: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn native(sql: impl Into<String>) -> Self {
        Self {
            sql: Some(sql.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_max_results(mut self, max: u32) -> Self {
        self.max_results = Some(max);
        self
    }

    #[must_use]
    pub const fn with_lock_mode(mut self, mode: LockMode) -> Self {
        self.lock_mode = Some(mode);
        self
    }

    /// True when no query source carries a non-blank string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.value, &self.named, &self.sql]
            .into_iter()
            .all(|source| source.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

///
/// Delegate
/// Concrete method body invoked directly, bypassing query derivation.
///

pub type DelegateFn<E> =
    dyn for<'a> Fn(&'a dyn PersistenceContext, &[Argument]) -> DelegateResult<'a, E> + Send + Sync;

pub type DelegateResult<'a, E> = Result<Outcome<'a, E>, QueryError>;

pub struct Delegate<E>(Arc<DelegateFn<E>>);

impl<E> Delegate<E> {
    pub fn call<'a>(
        &self,
        persistence: &'a dyn PersistenceContext,
        args: &[Argument],
    ) -> DelegateResult<'a, E> {
        (self.0)(persistence, args)
    }
}

impl<E> Clone for Delegate<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> fmt::Debug for Delegate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Delegate")
    }
}

///
/// MethodSignature
/// Declared shape of one repository method.
///

#[derive(Clone, Debug)]
pub struct MethodSignature<E> {
    pub(crate) name: String,
    pub(crate) params: Vec<ParamKind>,
    pub(crate) returns: ReturnKind,
    pub(crate) declaration: Option<QueryDeclaration>,
    pub(crate) delegate: Option<Delegate<E>>,
    pub(crate) backend: Option<Backend>,
}

impl<E> MethodSignature<E> {
    #[must_use]
    pub fn new(name: impl Into<String>, returns: ReturnKind) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns,
            declaration: None,
            delegate: None,
            backend: None,
        }
    }

    /// Append a positional value parameter.
    #[must_use]
    pub fn param(mut self) -> Self {
        self.params.push(ParamKind::Value { name: None });
        self
    }

    /// Append `n` positional value parameters.
    #[must_use]
    pub fn params(mut self, n: usize) -> Self {
        for _ in 0..n {
            self.params.push(ParamKind::Value { name: None });
        }
        self
    }

    #[must_use]
    pub fn named_param(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamKind::Value {
            name: Some(name.into()),
        });
        self
    }

    #[must_use]
    pub fn page(mut self) -> Self {
        self.params.push(ParamKind::Page);
        self
    }

    #[must_use]
    pub fn sort(mut self) -> Self {
        self.params.push(ParamKind::Sort);
        self
    }

    #[must_use]
    pub fn query(mut self, declaration: QueryDeclaration) -> Self {
        self.declaration = Some(declaration);
        self
    }

    #[must_use]
    pub fn delegate<F>(mut self, body: F) -> Self
    where
        F: for<'a> Fn(&'a dyn PersistenceContext, &[Argument]) -> DelegateResult<'a, E>
            + Send
            + Sync
            + 'static,
    {
        self.delegate = Some(Delegate(Arc::new(body)));
        self
    }

    #[must_use]
    pub const fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn param_kinds(&self) -> &[ParamKind] {
        &self.params
    }

    #[must_use]
    pub const fn returns(&self) -> ReturnKind {
        self.returns
    }

    #[must_use]
    pub const fn declaration(&self) -> Option<&QueryDeclaration> {
        self.declaration.as_ref()
    }

    /// Number of parameters bound to query placeholders.
    #[must_use]
    pub fn value_params(&self) -> usize {
        self.params.iter().filter(|param| param.is_value()).count()
    }
}
