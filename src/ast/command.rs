use serde::{Deserialize, Serialize};

use crate::ast::{CalculateOp, Query, Value};
use crate::params::Parameters;

/// A data-modifying command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Insert(InsertCommand),
    Update(UpdateCommand),
    Delete(DeleteCommand),
    Text(TextCommand),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertCommand {
    pub entity: String,
    /// Property values; missing properties bind NULL.
    pub values: Vec<(String, Value)>,
    #[serde(default = "default_true")]
    pub must_affect_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCommand {
    pub entity: String,
    pub assignments: Vec<(String, Assignment)>,
    #[serde(default)]
    pub query: Option<Query>,
    /// Split values selecting the physical tables to touch.
    #[serde(default)]
    pub split_values: Vec<Value>,
    #[serde(default = "default_true")]
    pub must_affect_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteCommand {
    pub entity: String,
    #[serde(default)]
    pub query: Option<Query>,
    #[serde(default)]
    pub split_values: Vec<Value>,
    #[serde(default = "default_true")]
    pub must_affect_data: bool,
}

/// Raw script or stored procedure call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCommand {
    pub script: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub kind: ScriptKind,
    #[serde(default)]
    pub must_affect_data: bool,
}

/// New value of an updated field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Assignment {
    Value(Value),
    /// `COL = COL <op> value`
    Calculate { op: CalculateOp, value: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScriptKind {
    #[default]
    Text,
    Procedure,
}

fn default_true() -> bool {
    true
}

impl Command {
    pub fn insert(entity: impl Into<String>) -> InsertCommand {
        InsertCommand {
            entity: entity.into(),
            values: Vec::new(),
            must_affect_data: true,
        }
    }

    pub fn update(entity: impl Into<String>) -> UpdateCommand {
        UpdateCommand {
            entity: entity.into(),
            assignments: Vec::new(),
            query: None,
            split_values: Vec::new(),
            must_affect_data: true,
        }
    }

    pub fn delete(entity: impl Into<String>) -> DeleteCommand {
        DeleteCommand {
            entity: entity.into(),
            query: None,
            split_values: Vec::new(),
            must_affect_data: true,
        }
    }

    pub fn text(script: impl Into<String>, parameters: Parameters) -> TextCommand {
        TextCommand {
            script: script.into(),
            parameters,
            kind: ScriptKind::Text,
            must_affect_data: false,
        }
    }

    pub fn must_affect_data(&self) -> bool {
        match self {
            Command::Insert(c) => c.must_affect_data,
            Command::Update(c) => c.must_affect_data,
            Command::Delete(c) => c.must_affect_data,
            Command::Text(c) => c.must_affect_data,
        }
    }
}

impl InsertCommand {
    pub fn value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((field.into(), value.into()));
        self
    }

    pub fn build(self) -> Command {
        Command::Insert(self)
    }
}

impl UpdateCommand {
    pub fn set_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments
            .push((field.into(), Assignment::Value(value.into())));
        self
    }

    pub fn calculate(mut self, field: impl Into<String>, op: CalculateOp, value: impl Into<Value>) -> Self {
        self.assignments.push((
            field.into(),
            Assignment::Calculate {
                op,
                value: value.into(),
            },
        ));
        self
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    pub fn split_value(mut self, value: impl Into<Value>) -> Self {
        self.split_values.push(value.into());
        self
    }

    pub fn allow_no_rows(mut self) -> Self {
        self.must_affect_data = false;
        self
    }

    pub fn build(self) -> Command {
        Command::Update(self)
    }
}

impl DeleteCommand {
    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    pub fn split_value(mut self, value: impl Into<Value>) -> Self {
        self.split_values.push(value.into());
        self
    }

    pub fn allow_no_rows(mut self) -> Self {
        self.must_affect_data = false;
        self
    }

    pub fn build(self) -> Command {
        Command::Delete(self)
    }
}

impl TextCommand {
    pub fn procedure(mut self) -> Self {
        self.kind = ScriptKind::Procedure;
        self
    }

    pub fn must_affect(mut self) -> Self {
        self.must_affect_data = true;
        self
    }

    pub fn build(self) -> Command {
        Command::Text(self)
    }
}
