//! Named parameter collection handed to the driver with each statement.

use serde::{Deserialize, Serialize};

use crate::ast::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Input,
    /// Filled by the database, e.g. `RETURNING ... INTO :p`.
    Output,
}

/// One named binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
    #[serde(default)]
    pub direction: Direction,
}

/// Ordered mapping of parameter name to value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    items: Vec<Parameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input parameter, replacing an existing one of the same name in place.
    pub fn add(&mut self, name: impl Into<String>, value: Value) {
        self.insert(Parameter {
            name: name.into(),
            value,
            direction: Direction::Input,
        });
    }

    /// Register an output parameter.
    pub fn add_output(&mut self, name: impl Into<String>) {
        self.insert(Parameter {
            name: name.into(),
            value: Value::Null,
            direction: Direction::Output,
        });
    }

    /// Builder-style [`Parameters::add`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add(name, value.into());
        self
    }

    fn insert(&mut self, parameter: Parameter) {
        match self.items.iter_mut().find(|p| p.name == parameter.name) {
            Some(existing) => *existing = parameter,
            None => self.items.push(parameter),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.items.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Rename a parameter, keeping its position. Returns false if `old` is absent.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> bool {
        let new = new.into();
        if !self.contains(old) {
            return false;
        }
        if old != new {
            self.items.retain(|p| p.name != new);
        }
        if let Some(p) = self.items.iter_mut().find(|p| p.name == old) {
            p.name = new;
        }
        true
    }

    /// Replace the value of a parameter. Returns false if `name` is absent.
    pub fn modify_value(&mut self, name: &str, value: Value) -> bool {
        match self.items.iter_mut().find(|p| p.name == name) {
            Some(p) => {
                p.value = value;
                true
            }
            None => false,
        }
    }

    /// Merge `other` into `self`; entries of `other` win on a name collision.
    pub fn union(&mut self, other: Parameters) {
        for parameter in other.items {
            self.insert(parameter);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.items.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|p| p.name.as_str())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Parameter> {
        self.items.iter().filter(|p| p.direction == Direction::Output)
    }
}

impl IntoIterator for Parameters {
    type Item = Parameter;
    type IntoIter = std::vec::IntoIter<Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
