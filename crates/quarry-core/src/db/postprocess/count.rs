use crate::{
    db::{
        compile::CompiledQuery,
        context::InvocationContext,
        provider::{PersistenceContext, PreparedQuery},
        scan,
    },
    error::{PersistenceError, QueryError},
    obs::sink::{self, MetricsEvent},
};
use tracing::trace;

/// Rewrite a query-language (or native) string into its count form.
///
/// The projection is taken from the original `select` segment, falling
/// back to the `from` alias, then `*`. Any `order by` tail is dropped.
pub fn rewrite_count(query: &str) -> Result<String, QueryError> {
    let from = scan::find_keyword(query, "from").ok_or_else(|| QueryError::CountRewrite {
        query: query.to_string(),
    })?;

    let head = &query[..from];
    let select = scan::find_keyword(head, "select")
        .map(|start| head[start + "select".len()..].trim())
        .unwrap_or_default();

    let mut tail = &query[from..];
    if let Some(order) = scan::find_keyword(tail, "order by") {
        tail = &tail[..order];
    }
    let tail = tail.trim_end();

    let projection = if starts_with_ignore_case(select, "count(") {
        select.to_string()
    } else {
        let target = if select.is_empty() {
            scan::from_alias(query).unwrap_or("*")
        } else {
            select
        };
        format!("count({target})")
    };

    Ok(format!("select {projection} {tail}"))
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Replace `prepared` with a count-projected query over the same statement.
pub(super) fn apply<'a>(
    ctx: &InvocationContext<'a>,
    finalized: &CompiledQuery,
    prepared: Box<dyn PreparedQuery + 'a>,
) -> Result<Box<dyn PreparedQuery + 'a>, QueryError> {
    let persistence: &'a dyn PersistenceContext = ctx.persistence();
    let entity = ctx.entity().entity_name;

    let mut counted = match finalized {
        CompiledQuery::Text(query) => {
            let rewritten = rewrite_count(query)?;
            trace!(original = query.as_str(), rewritten = rewritten.as_str(), "count rewrite");
            persistence.create_query(&rewritten)?
        }
        CompiledQuery::Native(sql) => {
            let rewritten = rewrite_count(sql)?;
            trace!(original = sql.as_str(), rewritten = rewritten.as_str(), "count rewrite");
            persistence.create_native_query(&rewritten)?
        }
        CompiledQuery::Named(name) => {
            let query = persistence.registry().named_query(name).ok_or_else(|| {
                PersistenceError::UnknownNamedQuery { name: name.clone() }
            })?;
            let rewritten = rewrite_count(query)?;
            trace!(
                named = name.as_str(),
                original = query,
                rewritten = rewritten.as_str(),
                "count rewrite"
            );
            persistence.create_query(&rewritten)?
        }
        CompiledQuery::Criteria(criteria) => {
            trace!(entity, "count rewrite on criteria query");
            persistence.create_criteria_query(criteria.to_count())?
        }
    };

    ctx.params().apply_to(counted.as_mut());
    counted.set_lock_mode(prepared.lock_mode());
    counted.set_flush_mode(prepared.flush_mode());
    sink::record(ctx.metrics_sink(), MetricsEvent::CountRewrite { entity });

    Ok(counted)
}
