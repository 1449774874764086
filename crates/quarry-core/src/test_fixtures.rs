//! Shared entities for unit tests.

use crate::{
    model::{EntityModel, FieldKind, FieldModel, MetadataRegistry, NamedQuery},
    traits::EntityKind,
    value::{Row, RowError, Value},
};

// ---------------------------------------------------------------------
// Simple
// ---------------------------------------------------------------------

pub(crate) static SIMPLE_FIELDS: [FieldModel; 4] = [
    FieldModel::new("id", FieldKind::Int),
    FieldModel::new("name", FieldKind::Text),
    FieldModel::new("counter", FieldKind::Int),
    FieldModel::new("enabled", FieldKind::Bool),
];

pub(crate) static SIMPLE_MODEL: EntityModel = EntityModel {
    entity_name: "Simple",
    table_name: "simple_table",
    primary_key: "id",
    fields: &SIMPLE_FIELDS,
    named_queries: &[
        NamedQuery {
            name: "Simple.byName",
            query: "select s from Simple s where s.name = ?1",
        },
        NamedQuery {
            name: "Simple.countAll",
            query: "select count(s) from Simple s",
        },
    ],
};

///
/// Simple
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Simple {
    pub(crate) id: Option<i64>,
    pub(crate) name: Option<String>,
    pub(crate) counter: Option<i64>,
    pub(crate) enabled: bool,
}

impl Simple {
    pub(crate) fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            enabled: true,
            ..Self::default()
        }
    }

    pub(crate) fn with_counter(mut self, counter: i64) -> Self {
        self.counter = Some(counter);
        self
    }
}

impl EntityKind for Simple {
    const MODEL: &'static EntityModel = &SIMPLE_MODEL;

    fn to_row(&self) -> Row {
        Row::new()
            .with("id", self.id)
            .with("name", self.name.clone())
            .with("counter", self.counter)
            .with("enabled", self.enabled)
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_int("id")?,
            name: row.get_text("name")?,
            counter: row.get_int("counter")?,
            enabled: row.get_bool("enabled")?.unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------
// Person (embedded address, collection attribute)
// ---------------------------------------------------------------------

pub(crate) static GEO_FIELDS: [FieldModel; 2] = [
    FieldModel::new("lat", FieldKind::Int),
    FieldModel::new("lng", FieldKind::Int),
];

pub(crate) static ADDRESS_FIELDS: [FieldModel; 4] = [
    FieldModel::new("street", FieldKind::Text),
    FieldModel::new("city", FieldKind::Text),
    FieldModel::new("zip_code", FieldKind::Text),
    FieldModel::new("geo", FieldKind::Embedded(&GEO_FIELDS)),
];

pub(crate) static PERSON_FIELDS: [FieldModel; 7] = [
    FieldModel::new("id", FieldKind::Int),
    FieldModel::new("first_name", FieldKind::Text),
    FieldModel::new("last_name", FieldKind::Text),
    FieldModel::new("age", FieldKind::Int),
    FieldModel::new("active", FieldKind::Bool),
    FieldModel::new("address", FieldKind::Embedded(&ADDRESS_FIELDS)),
    FieldModel::new("tags", FieldKind::List(&FieldKind::Text)),
];

pub(crate) static PERSON_MODEL: EntityModel = EntityModel {
    entity_name: "Person",
    table_name: "person",
    primary_key: "id",
    fields: &PERSON_FIELDS,
    named_queries: &[],
};

///
/// Person
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Person {
    pub(crate) id: Option<i64>,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) age: i64,
    pub(crate) active: bool,
    pub(crate) city: Option<String>,
    pub(crate) tags: Vec<String>,
}

impl Person {
    pub(crate) fn new(first_name: &str, last_name: &str, age: i64) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
            active: true,
            ..Self::default()
        }
    }

    pub(crate) fn in_city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    pub(crate) fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(ToString::to_string).collect();
        self
    }
}

impl EntityKind for Person {
    const MODEL: &'static EntityModel = &PERSON_MODEL;

    fn to_row(&self) -> Row {
        let address = self
            .city
            .as_ref()
            .map_or(Value::Null, |city| Row::new().with("city", city.as_str()).into_embedded());

        Row::new()
            .with("id", self.id)
            .with("first_name", self.first_name.as_str())
            .with("last_name", self.last_name.as_str())
            .with("age", self.age)
            .with("active", self.active)
            .with("address", address)
            .with("tags", self.tags.clone())
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        let city = match row.get_embedded("address")? {
            Some(address) => address.get_text("city")?,
            None => None,
        };
        let tags = row
            .get_list("tags")?
            .into_iter()
            .filter_map(|tag| tag.as_text().map(ToString::to_string))
            .collect();

        Ok(Self {
            id: row.get_int("id")?,
            first_name: Row::require(row.get_text("first_name")?, "first_name")?,
            last_name: Row::require(row.get_text("last_name")?, "last_name")?,
            age: Row::require(row.get_int("age")?, "age")?,
            active: row.get_bool("active")?.unwrap_or_default(),
            city,
            tags,
        })
    }
}

// ---------------------------------------------------------------------
// Customer (literal attribute shadowing an embedded path)
// ---------------------------------------------------------------------

pub(crate) static CUSTOMER_FIELDS: [FieldModel; 3] = [
    FieldModel::new("id", FieldKind::Uint),
    FieldModel::new("address", FieldKind::Embedded(&ADDRESS_FIELDS)),
    FieldModel::new("address_city", FieldKind::Text),
];

pub(crate) static CUSTOMER_MODEL: EntityModel = EntityModel {
    entity_name: "Customer",
    table_name: "customer",
    primary_key: "id",
    fields: &CUSTOMER_FIELDS,
    named_queries: &[],
};

pub(crate) fn registry() -> MetadataRegistry {
    MetadataRegistry::new()
        .with::<Simple>()
        .with::<Person>()
        .register(&CUSTOMER_MODEL)
}
