//! Method classification.
//!
//! Every repository method is classified exactly once, when the
//! repository is built: an explicit query declaration wins, then a
//! delegate body, then the method name is parsed. Any failure is a
//! configuration error and keeps the repository from being built.

mod signature;


use crate::{
    config::QueryConfig,
    db::{
        compile::{self, CompiledQuery},
        parse::parse_method_name,
        predicate::{PredicateTree, Selector},
        scan,
    },
    error::{MethodExpressionError, QueryError},
    model::{AttributePath, EntityModel, MetadataRegistry},
};
use std::sync::OnceLock;

pub use signature::{
    Delegate, DelegateFn, DelegateResult, MethodSignature, ParamKind, QueryDeclaration, ReturnKind,
};

///
/// MethodKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MethodKind {
    Explicit,
    Delegate,
    Derive,
}

///
/// Dispatch
/// Classification result, carrying what each kind needs at call time.
///

#[derive(Clone, Debug)]
pub enum Dispatch<E> {
    Explicit {
        query: CompiledQuery,
        /// Statement is a bulk `delete` / `update`.
        modifying: bool,
    },
    Delegate(Delegate<E>),
    Derive(PredicateTree),
}

impl<E> Dispatch<E> {
    #[must_use]
    pub const fn kind(&self) -> MethodKind {
        match self {
            Self::Explicit { .. } => MethodKind::Explicit,
            Self::Delegate(_) => MethodKind::Delegate,
            Self::Derive(_) => MethodKind::Derive,
        }
    }
}

///
/// MethodDescriptor
///
/// Immutable after construction apart from the memoized compiled query,
/// so descriptors are shared freely across threads.
///

#[derive(Debug)]
pub struct MethodDescriptor<E> {
    signature: MethodSignature<E>,
    dispatch: Dispatch<E>,
    compiled: OnceLock<CompiledQuery>,
}

impl<E> MethodDescriptor<E> {
    pub fn new(
        signature: MethodSignature<E>,
        model: &'static EntityModel,
        registry: &MetadataRegistry,
        config: &QueryConfig,
    ) -> Result<Self, QueryError> {
        let dispatch = classify(&signature, model, registry, config)?;

        Ok(Self {
            signature,
            dispatch,
            compiled: OnceLock::new(),
        })
    }

    #[must_use]
    pub const fn signature(&self) -> &MethodSignature<E> {
        &self.signature
    }

    #[must_use]
    pub const fn dispatch(&self) -> &Dispatch<E> {
        &self.dispatch
    }

    #[must_use]
    pub const fn kind(&self) -> MethodKind {
        self.dispatch.kind()
    }

    /// Compiled query for this method; derived queries compile on first use.
    #[must_use]
    pub fn compiled(&self, config: &QueryConfig) -> Option<&CompiledQuery> {
        match &self.dispatch {
            Dispatch::Explicit { query, .. } => Some(query),
            Dispatch::Delegate(_) => None,
            Dispatch::Derive(tree) => Some(self.compiled.get_or_init(|| {
                let backend = self.signature.backend.unwrap_or(config.backend);
                compile::compile(tree, backend, &config.entity_alias)
            })),
        }
    }
}

// ---------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------

/// Classify a method signature against its entity.
pub fn classify<E>(
    signature: &MethodSignature<E>,
    model: &'static EntityModel,
    registry: &MetadataRegistry,
    config: &QueryConfig,
) -> Result<Dispatch<E>, QueryError> {
    if let Some(declaration) = signature
        .declaration
        .as_ref()
        .filter(|declaration| !declaration.is_empty())
    {
        return explicit(signature, declaration, registry, config);
    }

    if let Some(delegate) = &signature.delegate {
        return Ok(Dispatch::Delegate(delegate.clone()));
    }

    let tree = parse_method_name(&signature.name, model)?;
    check_derived_returns(signature, &tree)?;

    let declared = signature.value_params();
    if config.strict_arity && tree.bind_slots() != declared {
        return Err(MethodExpressionError::ArityMismatch {
            method: signature.name.clone(),
            expected: tree.bind_slots(),
            declared,
        }
        .into());
    }

    Ok(Dispatch::Derive(tree))
}

fn explicit<E>(
    signature: &MethodSignature<E>,
    declaration: &QueryDeclaration,
    registry: &MetadataRegistry,
    config: &QueryConfig,
) -> Result<Dispatch<E>, QueryError> {
    let method = signature.name.as_str();
    let non_blank = |source: &Option<String>| {
        source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    };

    let (query, text) = if let Some(value) = non_blank(&declaration.value) {
        (CompiledQuery::Text(value.clone()), value)
    } else if let Some(name) = non_blank(&declaration.named) {
        let Some(text) = registry.named_query(&name) else {
            return Err(QueryError::explicit(
                method,
                format!("unknown named query '{name}'"),
            ));
        };
        (CompiledQuery::Named(name), text.to_string())
    } else if let Some(sql) = non_blank(&declaration.sql) {
        (CompiledQuery::Native(sql.clone()), sql)
    } else {
        return Err(QueryError::explicit(method, "empty query declaration"));
    };

    let first = scan::words(&text).first().map(|(_, word)| word.to_ascii_lowercase());
    let modifying = matches!(first.as_deref(), Some("delete" | "update"));
    if !modifying && scan::find_keyword(&text, "from").is_none() {
        return Err(QueryError::explicit(method, format!("no from clause in '{text}'")));
    }

    let native = matches!(query, CompiledQuery::Native(_));
    check_statement(method, &text, registry, native)?;
    check_explicit_returns(signature, modifying)?;
    if config.strict_arity {
        check_placeholders(signature, &text)?;
    }

    Ok(Dispatch::Explicit { query, modifying })
}

// Entity, literals and alias-qualified attribute paths are resolved
// against the registry. Native statements name columns, so only their
// table is checked.
fn check_statement(
    method: &str,
    text: &str,
    registry: &MetadataRegistry,
    native: bool,
) -> Result<(), QueryError> {
    if !scan::literals_closed(text) {
        return Err(QueryError::explicit(
            method,
            format!("unterminated string literal in '{text}'"),
        ));
    }

    let Some(entity) = scan::statement_entity(text) else {
        return Err(QueryError::explicit(method, format!("no entity in '{text}'")));
    };
    let Some(model) = registry.get(entity) else {
        return Err(QueryError::explicit(method, format!("unknown entity '{entity}'")));
    };
    if native {
        return Ok(());
    }

    let Some(alias) = scan::statement_alias(text) else {
        return Ok(());
    };
    for path in scan::qualified_paths(text, alias) {
        if model.resolve(&AttributePath::parse(path)).is_none() {
            return Err(QueryError::explicit(
                method,
                format!("unknown attribute '{path}' on entity '{}'", model.entity_name),
            ));
        }
    }

    Ok(())
}

fn check_placeholders<E>(signature: &MethodSignature<E>, text: &str) -> Result<(), QueryError> {
    let found = scan::placeholders(text);
    let positional = signature
        .params
        .iter()
        .filter(|param| matches!(param, ParamKind::Value { name: None }))
        .count();

    if found.positional_count() != positional {
        return Err(MethodExpressionError::ArityMismatch {
            method: signature.name.clone(),
            expected: found.positional_count(),
            declared: positional,
        }
        .into());
    }

    for param in &signature.params {
        if let ParamKind::Value { name: Some(name) } = param
            && !found.named.contains(name)
        {
            return Err(QueryError::explicit(
                &signature.name,
                format!("parameter ':{name}' does not appear in the query"),
            ));
        }
    }
    if found.named.len()
        > signature
            .params
            .iter()
            .filter(|param| matches!(param, ParamKind::Value { name: Some(_) }))
            .count()
    {
        return Err(QueryError::explicit(
            &signature.name,
            "query references undeclared named parameters",
        ));
    }

    Ok(())
}

fn check_explicit_returns<E>(
    signature: &MethodSignature<E>,
    modifying: bool,
) -> Result<(), QueryError> {
    let ok = if modifying {
        matches!(signature.returns, ReturnKind::Void | ReturnKind::Count)
    } else {
        signature.returns != ReturnKind::Void
    };

    if ok {
        Ok(())
    } else {
        Err(QueryError::signature(
            &signature.name,
            format!("{:?} does not fit the declared query", signature.returns),
        ))
    }
}

fn check_derived_returns<E>(
    signature: &MethodSignature<E>,
    tree: &PredicateTree,
) -> Result<(), QueryError> {
    let returns = signature.returns;
    let ok = match tree.root.selector {
        Selector::Find => returns != ReturnKind::Void,
        Selector::Count | Selector::Exists => {
            matches!(returns, ReturnKind::Count | ReturnKind::Exists)
        }
        Selector::Delete => matches!(returns, ReturnKind::Void | ReturnKind::Count),
    };

    if ok {
        Ok(())
    } else {
        Err(QueryError::signature(
            &signature.name,
            format!("{returns:?} does not fit a {:?} method", tree.root.selector),
        ))
    }
}
