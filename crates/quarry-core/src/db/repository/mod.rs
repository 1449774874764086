//! Repositories: classified methods plus the invocation entry point.

mod outcome;

#[cfg(test)]
mod tests;

use crate::{
    LIKE_ESCAPE,
    config::QueryConfig,
    db::{
        context::{InvocationContext, Parameters},
        method::{Dispatch, MethodDescriptor, MethodKind, MethodSignature, ParamKind, ReturnKind},
        postprocess::{OrderBy, QueryPostProcessor},
        predicate::{OrderItem, PredicateTree, Selector},
        provider::PersistenceContext,
        result::QueryResult,
    },
    error::{MethodExpressionError, QueryError},
    model::MetadataRegistry,
    obs::{
        ExecKind, MetricsEvent, MetricsSink,
        sink::{self, Span},
    },
    traits::EntityKind,
    value::Value,
};
use std::{collections::BTreeMap, fmt};
use tracing::debug;

pub use outcome::Outcome;

///
/// Argument
/// One actual argument, matched positionally against `ParamKind`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Argument {
    Value(Value),
    Page { first: u32, max: u32 },
    Sort(Vec<OrderItem>),
}

impl Argument {
    #[must_use]
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    const fn matches(&self, param: &ParamKind) -> bool {
        matches!(
            (self, param),
            (Self::Value(_), ParamKind::Value { .. })
                | (Self::Page { .. }, ParamKind::Page)
                | (Self::Sort(_), ParamKind::Sort)
        )
    }
}

///
/// RepositoryBuilder
///

pub struct RepositoryBuilder<E> {
    methods: Vec<MethodSignature<E>>,
    sink: Option<&'static dyn MetricsSink>,
}

impl<E: EntityKind> RepositoryBuilder<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            methods: Vec::new(),
            sink: None,
        }
    }

    #[must_use]
    pub fn method(mut self, signature: MethodSignature<E>) -> Self {
        self.methods.push(signature);
        self
    }

    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Classify and validate every method; the first failure aborts.
    pub fn build(
        self,
        registry: &MetadataRegistry,
        config: &QueryConfig,
    ) -> Result<Repository<E>, QueryError> {
        config.validate()?;
        let model = registry
            .get(E::entity_name())
            .ok_or_else(|| MethodExpressionError::UnknownEntity {
                name: E::entity_name().to_string(),
            })?;

        let mut methods = BTreeMap::new();
        for signature in self.methods {
            let name = signature.name().to_string();
            if methods.contains_key(&name) {
                return Err(QueryError::signature(&name, "declared more than once"));
            }

            let descriptor = MethodDescriptor::new(signature, model, registry, config)?;
            debug!(
                entity = model.entity_name,
                method = name.as_str(),
                kind = ?descriptor.kind(),
                "classified repository method"
            );
            sink::record(
                self.sink,
                MetricsEvent::Classified {
                    kind: descriptor.kind(),
                    entity: model.entity_name,
                },
            );
            methods.insert(name, descriptor);
        }

        Ok(Repository {
            config: config.clone(),
            methods,
            sink: self.sink,
        })
    }
}

impl<E: EntityKind> Default for RepositoryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

///
/// Repository
///
/// Built once, then shared. All per-call state lives in the
/// `InvocationContext` created by `invoke`.
///

pub struct Repository<E> {
    config: QueryConfig,
    methods: BTreeMap<String, MethodDescriptor<E>>,
    sink: Option<&'static dyn MetricsSink>,
}

impl<E: EntityKind> Repository<E> {
    #[must_use]
    pub fn builder() -> RepositoryBuilder<E> {
        RepositoryBuilder::new()
    }

    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor<E>> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    #[must_use]
    pub fn kind(&self, name: &str) -> Option<MethodKind> {
        self.method(name).map(MethodDescriptor::kind)
    }

    /// Invoke one repository method.
    pub fn invoke<'a>(
        &self,
        persistence: &'a dyn PersistenceContext,
        name: &str,
        args: Vec<Argument>,
    ) -> Result<Outcome<'a, E>, QueryError> {
        let descriptor = self
            .methods
            .get(name)
            .ok_or_else(|| QueryError::UnknownMethod {
                name: name.to_string(),
            })?;
        let signature = descriptor.signature();
        check_arguments(signature, &args)?;

        let tree = match descriptor.dispatch() {
            Dispatch::Delegate(delegate) => return delegate.call(persistence, &args),
            Dispatch::Derive(tree) => Some(tree),
            Dispatch::Explicit { .. } => None,
        };
        let Some(query) = descriptor.compiled(&self.config) else {
            return Err(QueryError::signature(name, "method has no query"));
        };

        let params = match tree {
            Some(tree) => derived_params(tree, &args),
            None => explicit_params(signature, &args),
        };
        let mut context = InvocationContext::new(persistence, E::MODEL, query.clone(), params)
            .with_metrics_sink(self.sink);

        if let Some(limit) = tree.and_then(|tree| tree.root.limit) {
            context.add_query_processor(QueryPostProcessor::MaxResults(limit));
        }
        if let Some(declaration) = signature.declaration() {
            if let Some(max) = declaration.max_results {
                context.add_query_processor(QueryPostProcessor::MaxResults(max));
            }
            if let Some(mode) = declaration.lock_mode {
                context.add_query_processor(QueryPostProcessor::LockMode(mode));
            }
        }
        for arg in &args {
            match arg {
                Argument::Page { first, max } => {
                    context.add_query_processor(QueryPostProcessor::FirstResult(*first));
                    context.add_query_processor(QueryPostProcessor::MaxResults(*max));
                }
                Argument::Sort(items) => {
                    for item in items {
                        context.add_string_processor(OrderBy::from(item.clone()).into());
                    }
                }
                Argument::Value(_) => {}
            }
        }

        let modifying = match descriptor.dispatch() {
            Dispatch::Explicit { modifying, .. } => *modifying,
            _ => tree.is_some_and(|tree| tree.root.selector == Selector::Delete),
        };

        self.execute(context, signature.returns(), modifying)
    }

    fn execute<'a>(
        &self,
        context: InvocationContext<'a>,
        returns: ReturnKind,
        modifying: bool,
    ) -> Result<Outcome<'a, E>, QueryError> {
        if modifying {
            let mut span = Span::new(context.metrics_sink(), ExecKind::Update, E::entity_name());
            let affected = context.execute()?.execute_update()?;
            span.set_rows(affected);

            return Ok(match returns {
                ReturnKind::Void => Outcome::Unit,
                _ => Outcome::Affected(affected),
            });
        }

        let result = QueryResult::new(context, self.config.default_page_size);
        let outcome = match returns {
            ReturnKind::Single => Outcome::Entity(result.single_result()?),
            ReturnKind::Optional => Outcome::Maybe(result.optional_result()?),
            ReturnKind::List => Outcome::List(result.result_list()?),
            ReturnKind::Cursor => Outcome::Cursor(result),
            ReturnKind::Count => Outcome::Count(result.count()?),
            ReturnKind::Exists => Outcome::Exists(result.count()? > 0),
            ReturnKind::Void => Outcome::Unit,
        };

        Ok(outcome)
    }
}

impl<E> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("config", &self.config)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------
// Argument binding
// ---------------------------------------------------------------------

fn check_arguments<E>(
    signature: &MethodSignature<E>,
    args: &[Argument],
) -> Result<(), QueryError> {
    let params = signature.param_kinds();
    if params.len() != args.len() {
        return Err(QueryError::argument(
            signature.name(),
            format!("expected {} arguments, got {}", params.len(), args.len()),
        ));
    }

    for (i, (param, arg)) in params.iter().zip(args).enumerate() {
        if !arg.matches(param) {
            return Err(QueryError::argument(
                signature.name(),
                format!("argument {} does not match {param:?}", i + 1),
            ));
        }
    }

    Ok(())
}

// Derived placeholders are positional in value order; like-wrapped
// comparators receive their escaped and wrapped operand.
fn derived_params(tree: &PredicateTree, args: &[Argument]) -> Parameters {
    let mut values: Vec<Value> = args
        .iter()
        .filter_map(|arg| match arg {
            Argument::Value(value) => Some(value.clone()),
            _ => None,
        })
        .collect();

    for clause in tree.clauses() {
        let Some(wrap) = clause.comparator.like_wrap() else {
            continue;
        };
        if let Some(Value::Text(text)) = values.get_mut(clause.slot) {
            *text = wrap.apply(text, LIKE_ESCAPE);
        }
    }

    Parameters::positional(values)
}

fn explicit_params<E>(signature: &MethodSignature<E>, args: &[Argument]) -> Parameters {
    let mut params = Parameters::new();
    for (param, arg) in signature.param_kinds().iter().zip(args) {
        match (param, arg) {
            (ParamKind::Value { name: Some(name) }, Argument::Value(value)) => {
                params.set_named(name.clone(), value.clone());
            }
            (ParamKind::Value { name: None }, Argument::Value(value)) => {
                params.push(value.clone());
            }
            _ => {}
        }
    }

    params
}
