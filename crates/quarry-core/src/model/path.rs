use serde::{Deserialize, Serialize};
use std::fmt;

///
/// AttributePath
///
/// Dot-separated sequence of attribute names, e.g. `address.city`.
/// Structural equality is what ordering post-processors match on.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    /// Parse a dotted path. Empty segments are dropped.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }

    #[must_use]
    pub const fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prefix this path with a query alias (`e.address.city`).
    #[must_use]
    pub fn qualified(&self, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => format!("{alias}.{self}"),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for AttributePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}
