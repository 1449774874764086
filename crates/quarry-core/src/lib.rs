//! Core runtime for Quarry: entity metadata, values, the method-name query
//! derivation engine, invocation contexts, post-processors, result cursors,
//! the generic DAO, and an in-memory persistence context.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Page size used by result cursors when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Alias used for the root entity in rendered query strings.
pub const DEFAULT_ENTITY_ALIAS: &str = "e";

/// Escape character used when wrapping LIKE operands.
pub const LIKE_ESCAPE: char = '\\';

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No executors, providers, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        model::{AttributePath, EntityModel, FieldKind, FieldModel, MetadataRegistry},
        traits::EntityKind,
        value::{Row, Value},
    };
}
