//! Query derivation engine.
//!
//! Method names parse into a `PredicateTree`, compile to a query string
//! or a `CriteriaQuery`, and run through an `InvocationContext` against
//! a `PersistenceContext`.

pub mod compile;
pub mod context;
pub mod criteria;
pub mod dao;
pub mod memory;
pub mod method;
pub mod parse;
pub mod postprocess;
pub mod predicate;
pub mod provider;
pub mod repository;
pub mod result;

pub(crate) mod scan;

// re-exports
pub use compile::{Backend, CompiledQuery};
pub use context::{InvocationContext, Parameters};
pub use dao::EntityDao;
pub use method::MethodKind;
pub use repository::{Argument, Outcome, Repository, RepositoryBuilder};
pub use result::QueryResult;
