mod compare;
mod row;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

// re-exports
pub use compare::{TextMode, escape_like, like_match};
pub use row::{Row, RowError};

///
/// Value
/// can be used in WHERE statements and as bound query parameters
///
/// Null        → the attribute has no value (SQL NULL).
/// Map         → embedded object; keys are `Text` attribute names.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
    /// Ordered list of values.
    /// Used for collection attributes and IN-list parameters.
    List(Vec<Self>),
    /// Embedded object as ordered `(key, value)` entries.
    Map(Vec<(Self, Self)>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Integral view of this value, if it is numeric and non-negative.
    #[must_use]
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Self::Int(n) => u64::try_from(*n).ok(),
            Self::Uint(n) => Some(*n),
            _ => None,
        }
    }

    /// Look up an entry of an embedded object by attribute name.
    #[must_use]
    pub fn map_get(&self, key: &str) -> Option<&Self> {
        let Self::Map(entries) = self else {
            return None;
        };

        entries
            .iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }

    /// Compare two values under loose numeric widening.
    ///
    /// Returns `None` when the values are not comparable, which includes
    /// any comparison involving `Null`.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        compare::compare(self, other)
    }

    /// Equality under the same rules as [`Value::compare`].
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> Option<bool> {
        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                if a.len() != b.len() {
                    return Some(false);
                }
                let mut all = true;
                for (x, y) in a.iter().zip(b) {
                    all &= x.loose_eq(y)?;
                }
                Some(all)
            }
            _ => self.compare(other).map(Ordering::is_eq),
        }
    }

    /// Apply a case fold to text values; other values pass through.
    #[must_use]
    pub fn fold_case(&self, mode: TextMode) -> Self {
        match (self, mode) {
            (Self::Text(text), TextMode::Upper) => Self::Text(text.to_uppercase()),
            (Self::Text(text), TextMode::Lower) => Self::Text(text.to_lowercase()),
            _ => self.clone(),
        }
    }

    /// Emptiness of a collection value. `Null` collections count as empty.
    #[must_use]
    pub const fn is_empty_collection(&self) -> Option<bool> {
        match self {
            Self::Null => Some(true),
            Self::List(items) => Some(items.is_empty()),
            _ => None,
        }
    }

    /// True when a collection value holds an element equal to `needle`.
    #[must_use]
    pub fn contains_element(&self, needle: &Self) -> bool {
        self.as_list()
            .is_some_and(|items| items.iter().any(|item| item.loose_eq(needle) == Some(true)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
            Self::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

// ---------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Uint(u64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}
