//! Create/retrieve/update/delete orchestration over an [`EntityDao`].
//!
//! An `EntityHome` holds the state of one editing session: the key being
//! edited, the working entity, a search template and the current page of a
//! listing. Write operations hand back a [`HomeOutcome`] naming where the
//! caller should go next together with an [`EntityMessage`] describing
//! what happened.

mod message;


use quarry_core::{
    DEFAULT_PAGE_SIZE,
    db::{EntityDao, QueryResult},
    error::QueryError,
    traits::EntityKind,
    value::Value,
};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

pub use message::{EntityMessage, HomeOperation};

///
/// HomeError
///

#[derive(Debug, ThisError)]
pub enum HomeError {
    #[error("no entity is being edited")]
    NoEntity,

    #[error("no entity key is set")]
    NoKey,

    #[error("entity '{entity}' with key {key} not found")]
    NotFound { entity: &'static str, key: Value },

    #[error(transparent)]
    Query(#[from] QueryError),
}

///
/// HomeOutcome
/// Navigation intent returned by the home operations.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HomeOutcome {
    /// Show the creation form.
    Create,
    /// Return to the search listing.
    Search,
    /// Show the entity with this key.
    View(Value),
    /// Show the failure page.
    Exception,
}

///
/// EntityHome
///

#[derive(Debug)]
pub struct EntityHome<'a, E: EntityKind> {
    dao: EntityDao<'a, E>,
    key: Option<Value>,
    entity: Option<E>,
    search: E,
    page: u32,
    page_size: u32,
    count: u64,
    page_items: Vec<E>,
}

impl<'a, E: EntityKind> EntityHome<'a, E> {
    /// Build a home over `dao`. `search` is the blank template used when
    /// retrieving without a key.
    #[must_use]
    pub const fn new(dao: EntityDao<'a, E>, search: E) -> Self {
        Self {
            dao,
            key: None,
            entity: None,
            search,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            count: 0,
            page_items: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn create(&self) -> HomeOutcome {
        HomeOutcome::Create
    }

    /// Load the working entity: the stored row for the current key, or a
    /// copy of the search template when no key is set.
    pub fn retrieve(&mut self) -> Result<(), HomeError> {
        let Some(key) = self.key.clone() else {
            self.entity = Some(self.search.clone());
            return Ok(());
        };

        let entity = self.dao.find(key.clone())?.ok_or(HomeError::NotFound {
            entity: E::entity_name(),
            key,
        })?;
        self.entity = Some(entity);

        Ok(())
    }

    /// Save the working entity.
    ///
    /// Without a key this is a create and leads back to the search page;
    /// with a key it is an update and leads to the entity view.
    pub fn update(&mut self) -> (HomeOutcome, EntityMessage<E>) {
        let operation = if self.key.is_some() {
            HomeOperation::Update
        } else {
            HomeOperation::Create
        };

        let Some(entity) = self.entity.as_ref() else {
            return self.failed(operation, HomeError::NoEntity);
        };

        match self.dao.save(entity) {
            Ok(saved) => {
                debug!(
                    entity = E::entity_name(),
                    %operation,
                    key = %saved.primary_key(),
                    "home write"
                );
                self.entity = Some(saved.clone());

                match operation {
                    HomeOperation::Create => (HomeOutcome::Search, EntityMessage::Created(saved)),
                    _ => {
                        let key = saved.primary_key();
                        (HomeOutcome::View(key), EntityMessage::Updated(saved))
                    }
                }
            }
            Err(err) => self.failed(operation, err.into()),
        }
    }

    /// Remove the entity with the current key and flush.
    pub fn delete(&mut self) -> (HomeOutcome, EntityMessage<E>) {
        match self.remove_current() {
            Ok(removed) => {
                debug!(entity = E::entity_name(), key = %removed.primary_key(), "home delete");
                self.entity = None;
                self.key = None;
                (HomeOutcome::Search, EntityMessage::Deleted(removed))
            }
            Err(err) => self.failed(HomeOperation::Delete, err),
        }
    }

    fn remove_current(&self) -> Result<E, HomeError> {
        let key = self.key.clone().ok_or(HomeError::NoKey)?;
        let entity = self.dao.find(key.clone())?.ok_or(HomeError::NotFound {
            entity: E::entity_name(),
            key,
        })?;
        self.dao.remove(&entity)?;
        self.dao.flush()?;

        Ok(entity)
    }

    fn failed(
        &self,
        operation: HomeOperation,
        error: HomeError,
    ) -> (HomeOutcome, EntityMessage<E>) {
        warn!(entity = E::entity_name(), %operation, %error, "home operation failed");

        (
            HomeOutcome::Exception,
            EntityMessage::Failed {
                entity: self.entity.clone(),
                operation,
                error,
            },
        )
    }

    /// Restart the listing at the first page.
    pub const fn search(&mut self) {
        self.page = 0;
    }

    /// Load the current page over every stored entity.
    pub fn paginate(&mut self) -> Result<(), QueryError> {
        let query = self.dao.all();
        self.paginate_with(query)
    }

    /// Load the current page of `query`, recording its total count.
    pub fn paginate_with(&mut self, query: QueryResult<'a, E>) -> Result<(), QueryError> {
        self.count = query.count()?;

        let query = query
            .first_result(self.page.saturating_mul(self.page_size))
            .max_results(self.page_size);
        self.page_items = query.result_list()?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn key(&self) -> Option<&Value> {
        self.key.as_ref()
    }

    pub fn set_key(&mut self, key: Option<Value>) {
        self.key = key;
    }

    #[must_use]
    pub const fn entity(&self) -> Option<&E> {
        self.entity.as_ref()
    }

    pub const fn entity_mut(&mut self) -> Option<&mut E> {
        self.entity.as_mut()
    }

    pub fn set_entity(&mut self, entity: Option<E>) {
        self.entity = entity;
    }

    #[must_use]
    pub const fn search_template(&self) -> &E {
        &self.search
    }

    pub fn set_search_template(&mut self, search: E) {
        self.search = search;
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub const fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size;
    }

    /// Total rows seen by the last `paginate`.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn page_items(&self) -> &[E] {
        &self.page_items
    }
}
