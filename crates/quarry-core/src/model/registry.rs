use crate::{model::EntityModel, traits::EntityKind};
use std::collections::BTreeMap;

///
/// MetadataRegistry
///
/// Explicit entity metadata registry, built at startup and passed to the
/// parser, compilers and providers. Lookups accept either the entity name
/// or the table name.
///

#[derive(Clone, Debug, Default)]
pub struct MetadataRegistry {
    entities: BTreeMap<&'static str, &'static EntityModel>,
}

impl MetadataRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
        }
    }

    /// Register an entity model.
    #[must_use]
    pub fn register(mut self, model: &'static EntityModel) -> Self {
        self.entities.insert(model.entity_name, model);
        self
    }

    /// Register the model of an entity type.
    #[must_use]
    pub fn with<E: EntityKind>(self) -> Self {
        self.register(E::MODEL)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static EntityModel> {
        self.entities.get(name).copied().or_else(|| {
            self.entities
                .values()
                .copied()
                .find(|model| model.table_name.eq_ignore_ascii_case(name))
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn models(&self) -> impl Iterator<Item = &'static EntityModel> + '_ {
        self.entities.values().copied()
    }

    /// Find a named query across all registered entities.
    #[must_use]
    pub fn named_query(&self, name: &str) -> Option<&'static str> {
        self.models().find_map(|model| model.named_query(name))
    }
}
