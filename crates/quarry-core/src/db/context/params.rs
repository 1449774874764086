use crate::{db::provider::PreparedQuery, value::Value};
use std::collections::BTreeMap;

///
/// Parameters
///
/// Ordered runtime argument bindings for one invocation.
/// Positions are one-based, matching `?n` placeholders.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Parameters {
    positional: BTreeMap<usize, Value>,
    named: BTreeMap<String, Value>,
}

impl Parameters {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positional: BTreeMap::new(),
            named: BTreeMap::new(),
        }
    }

    /// Bind values to `?1..?n` in order.
    #[must_use]
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        let mut params = Self::new();
        for value in values {
            params.push(value);
        }
        params
    }

    /// Bind the next free position; returns it.
    pub fn push(&mut self, value: Value) -> usize {
        let position = self.positional.keys().next_back().map_or(1, |last| last + 1);
        self.positional.insert(position, value);
        position
    }

    pub fn set(&mut self, position: usize, value: Value) {
        self.positional.insert(position, value);
    }

    pub fn set_named(&mut self, name: impl Into<String>, value: Value) {
        self.named.insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.positional.get(&position)
    }

    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Bind every parameter onto a prepared query.
    pub fn apply_to<Q: PreparedQuery + ?Sized>(&self, query: &mut Q) {
        for (position, value) in &self.positional {
            query.set_parameter(*position, value.clone());
        }
        for (name, value) in &self.named {
            query.set_named_parameter(name, value.clone());
        }
    }
}
