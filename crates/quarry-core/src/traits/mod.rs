use crate::{
    model::EntityModel,
    value::{Row, RowError, Value},
};
use std::fmt::Debug;

// ============================================================================
// ENTITY IDENTITY & SCHEMA
// ============================================================================
//
// These traits describe *what an entity is*, not how it is stored
// or queried at runtime.
//

///
/// EntityKind
///
/// Bridges a typed entity to the row representation exchanged with a
/// persistence context.
///
/// ## Semantics
/// - `MODEL` is the static metadata the parser and compilers resolve against
/// - `to_row` / `from_row` must agree on attribute names with `MODEL.fields`
/// - An unset primary key is represented as `Value::Null`
///

pub trait EntityKind: Clone + Debug + 'static {
    const MODEL: &'static EntityModel;

    /// Encode this entity as a row.
    fn to_row(&self) -> Row;

    /// Decode an entity from a row produced by a persistence context.
    fn from_row(row: &Row) -> Result<Self, RowError>;

    /// Current value of one top-level attribute.
    fn get_value(&self, field: &str) -> Value {
        self.to_row().value(field).clone()
    }

    /// Current primary key value (`Null` when unset).
    fn primary_key(&self) -> Value {
        self.get_value(Self::MODEL.primary_key)
    }

    /// Entity name as used in query strings.
    #[must_use]
    fn entity_name() -> &'static str {
        Self::MODEL.entity_name
    }
}
