//! Query compiler: `PredicateTree` → executable query artifact.
//!
//! Two backends walk the same tree. The text backend renders a
//! query-language string with `?n` placeholders; the criteria backend
//! builds a structured `CriteriaQuery`. Bind slots map to positions
//! `slot + 1` in both.

mod criteria;
mod text;


use crate::db::{criteria::CriteriaQuery, predicate::PredicateTree};
use serde::{Deserialize, Serialize};

pub use criteria::lower_criteria;
pub use text::render_text;

///
/// Backend
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Text,
    Criteria,
}

///
/// CompiledQuery
///
/// Immutable compiled artifact, memoized per method descriptor and
/// cloned into each invocation.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CompiledQuery {
    /// Query-language string.
    Text(String),
    /// Reference to a named query resolved by the persistence context.
    Named(String),
    /// Native SQL string.
    Native(String),
    /// Structured query graph.
    Criteria(CriteriaQuery),
}

impl CompiledQuery {
    /// String form, for the variants that have one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(query) | Self::Native(query) => Some(query),
            Self::Named(_) | Self::Criteria(_) => None,
        }
    }

    #[must_use]
    pub const fn is_criteria(&self) -> bool {
        matches!(self, Self::Criteria(_))
    }
}

/// Compile a predicate tree with the chosen backend.
#[must_use]
pub fn compile(tree: &PredicateTree, backend: Backend, alias: &str) -> CompiledQuery {
    match backend {
        Backend::Text => CompiledQuery::Text(render_text(tree, alias)),
        Backend::Criteria => CompiledQuery::Criteria(lower_criteria(tree)),
    }
}
