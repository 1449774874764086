//! ## Crate layout
//! - `core`: the query-derivation engine, DAO, result cursors and the
//!   in-memory persistence context.
//! - `home`: the `EntityHome` create/retrieve/update/delete helper built
//!   on top of the DAO.
//!
//! The `prelude` module mirrors the surface used by repository code.
#![warn(unreachable_pub)]

pub use quarry_core as core;

pub mod home;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::{config::QueryConfig, error::QueryError};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        core::{
            db::{
                Argument, Backend, EntityDao, MethodKind, Outcome, QueryResult, Repository,
                method::{MethodSignature, QueryDeclaration, ReturnKind},
                postprocess::OrderBy,
                predicate::{Direction, OrderItem},
                provider::{FlushMode, LockMode, PersistenceContext},
            },
            error::QueryError,
            model::{AttributePath, EntityModel, FieldKind, FieldModel, MetadataRegistry},
            traits::EntityKind,
            value::{Row, RowError, Value},
        },
        home::{EntityHome, EntityMessage, HomeOperation, HomeOutcome},
    };
}
