use crate::{model::AttributePath, value::Value};
use derive_more::{Deref, DerefMut};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

static NULL: Value = Value::Null;

///
/// RowError
/// Errors raised while materializing an entity from a row.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RowError {
    #[error("required attribute '{field}' is null or missing")]
    Missing { field: String },

    #[error("attribute '{field}' expected {expected}, found {found}")]
    Type {
        field: String,
        expected: &'static str,
        found: Value,
    },
}

///
/// Row
///
/// Attribute-name → value map exchanged with the persistence context.
/// Ordered so that rendered rows and equality are deterministic.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, Eq, PartialEq)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Value of a top-level attribute; absent attributes read as `Null`.
    #[must_use]
    pub fn value(&self, field: &str) -> &Value {
        self.0.get(field).unwrap_or(&NULL)
    }

    /// Value at a (possibly nested) attribute path.
    #[must_use]
    pub fn path_value(&self, path: &AttributePath) -> &Value {
        let mut segments = path.segments().iter();
        let Some(first) = segments.next() else {
            return &NULL;
        };

        let mut current = self.value(first);
        for segment in segments {
            current = current.map_get(segment).unwrap_or(&NULL);
        }

        current
    }

    // ------------------------------------------------------------------
    // Typed accessors for `EntityKind::from_row`
    // ------------------------------------------------------------------

    pub fn get_text(&self, field: &str) -> Result<Option<String>, RowError> {
        match self.value(field) {
            Value::Null => Ok(None),
            Value::Text(text) => Ok(Some(text.clone())),
            other => Err(type_error(field, "text", other)),
        }
    }

    pub fn get_int(&self, field: &str) -> Result<Option<i64>, RowError> {
        match self.value(field) {
            Value::Null => Ok(None),
            Value::Int(n) => Ok(Some(*n)),
            Value::Uint(n) => i64::try_from(*n)
                .map(Some)
                .map_err(|_| type_error(field, "int", &Value::Uint(*n))),
            other => Err(type_error(field, "int", other)),
        }
    }

    pub fn get_uint(&self, field: &str) -> Result<Option<u64>, RowError> {
        match self.value(field) {
            Value::Null => Ok(None),
            Value::Uint(n) => Ok(Some(*n)),
            Value::Int(n) => u64::try_from(*n)
                .map(Some)
                .map_err(|_| type_error(field, "uint", &Value::Int(*n))),
            other => Err(type_error(field, "uint", other)),
        }
    }

    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, RowError> {
        match self.value(field) {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(*b)),
            other => Err(type_error(field, "bool", other)),
        }
    }

    pub fn get_list(&self, field: &str) -> Result<Vec<Value>, RowError> {
        match self.value(field) {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => Ok(items.clone()),
            other => Err(type_error(field, "list", other)),
        }
    }

    /// Embedded object as a nested row; `Null` reads as `None`.
    pub fn get_embedded(&self, field: &str) -> Result<Option<Self>, RowError> {
        match self.value(field) {
            Value::Null => Ok(None),
            Value::Map(entries) => {
                let mut nested = Self::new();
                for (key, value) in entries {
                    let Some(key) = key.as_text() else {
                        return Err(type_error(field, "map with text keys", key));
                    };
                    nested.insert(key.to_string(), value.clone());
                }
                Ok(Some(nested))
            }
            other => Err(type_error(field, "map", other)),
        }
    }

    /// Require a present value from one of the typed accessors.
    pub fn require<T>(value: Option<T>, field: &str) -> Result<T, RowError> {
        value.ok_or_else(|| RowError::Missing {
            field: field.to_string(),
        })
    }

    /// Encode this row as an embedded-object value.
    #[must_use]
    pub fn into_embedded(self) -> Value {
        Value::Map(
            self.0
                .into_iter()
                .map(|(k, v)| (Value::Text(k), v))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn type_error(field: &str, expected: &'static str, found: &Value) -> RowError {
    RowError::Type {
        field: field.to_string(),
        expected,
        found: found.clone(),
    }
}
