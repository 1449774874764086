//! Runtime configuration for repositories and result cursors.

use crate::{DEFAULT_ENTITY_ALIAS, DEFAULT_PAGE_SIZE, db::Backend};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

///
/// QueryConfig
///
/// Defaults applied by repositories when a method does not override them.
///
/// ```toml
/// default_page_size = 25
/// backend = "criteria"
/// entity_alias = "e"
/// strict_arity = true
/// ```
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Page size for result cursors until `max_results` or `with_page_size` changes it.
    pub default_page_size: u32,

    /// Compiler backend for derived methods.
    pub backend: Backend,

    /// Alias for the root entity in rendered query strings.
    pub entity_alias: String,

    /// Reject derived methods whose bind-slot count differs from their
    /// declared value parameters.
    pub strict_arity: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            backend: Backend::default(),
            entity_alias: DEFAULT_ENTITY_ALIAS.to_string(),
            strict_arity: true,
        }
    }
}

impl QueryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "default_page_size must be at least 1".to_string(),
            ));
        }

        let alias = self.entity_alias.as_str();
        let valid_alias = alias
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_alias {
            return Err(ConfigError::Invalid(format!(
                "entity_alias '{alias}' is not a valid identifier"
            )));
        }
        if is_reserved(alias) {
            return Err(ConfigError::Invalid(format!(
                "entity_alias '{alias}' is a reserved word"
            )));
        }

        Ok(())
    }

    #[must_use]
    pub const fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }
}


// words the rendered query grammar reserves
const RESERVED_WORDS: &[&str] = &[
    "and", "as", "asc", "between", "by", "count", "delete", "desc", "distinct", "empty", "escape",
    "from", "group", "having", "in", "is", "join", "like", "lower", "member", "not", "null", "of",
    "or", "order", "select", "set", "update", "upper", "where",
];

fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(word))
}

#[cfg(test)]
mod tests;
