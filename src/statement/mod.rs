//! Statement builder: complete Oracle statements from commands and queries.
//!
//! - `select.rs` - row, paging, count, exists and aggregate shapes
//! - `insert.rs` - INSERT with `RETURNING ... INTO`
//! - `update.rs` - UPDATE or MERGE INTO
//! - `delete.rs` - DELETE or correlated `DELETE FROM ... WHERE (pk) IN`

mod delete;
mod insert;
mod select;
mod update;


pub use select::{ROW_NUMBER_COLUMN, TOTAL_COUNT_COLUMN};

use serde::Serialize;
use tracing::debug;

use crate::ast::{Command, ScriptKind, TextCommand};
use crate::config::OracleOptions;
use crate::error::Result;
use crate::params::Parameters;
use crate::schema::Schema;
use crate::transpiler::TranslationContext;

/// A ready-to-run script with its bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStatement {
    pub script: String,
    pub parameters: Parameters,
    pub kind: ScriptKind,
    /// At least one row must change, else the statement failed.
    pub must_affect_data: bool,
    pub has_pre_script: bool,
    /// Cannot share a text-concatenated batch with other statements.
    pub perform_alone: bool,
}

impl ExecutionStatement {
    fn new(script: String, parameters: Parameters, must_affect_data: bool, has_pre_script: bool) -> Self {
        debug!(script = %script, parameters = parameters.len(), "compiled statement");
        Self {
            script,
            parameters,
            kind: ScriptKind::Text,
            must_affect_data,
            has_pre_script,
            perform_alone: has_pre_script,
        }
    }

    fn from_text(command: &TextCommand) -> Self {
        let mut statement = Self::new(
            command.script.clone(),
            command.parameters.clone(),
            command.must_affect_data,
            false,
        );
        statement.kind = command.kind;
        statement.perform_alone = true;
        statement
    }
}

/// Statements of one command and where parameter numbering continues.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub statements: Vec<ExecutionStatement>,
    pub next_parameter: usize,
}

/// Assembles statements; holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    schema: &'a Schema,
    options: OracleOptions,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(schema: &'a Schema, options: OracleOptions) -> Self {
        Self { schema, options }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    fn context(&self, parameter_offset: usize) -> TranslationContext<'a> {
        TranslationContext::new(self.schema, self.options).with_parameter_offset(parameter_offset)
    }

    /// Compile one command, numbering parameters from `parameter_offset`.
    pub fn command(&self, command: &Command, parameter_offset: usize) -> Result<Compiled> {
        match command {
            Command::Insert(insert) => self.insert(insert, parameter_offset),
            Command::Update(update) => self.update(update, parameter_offset),
            Command::Delete(delete) => self.delete(delete, parameter_offset),
            Command::Text(text) => Ok(Compiled {
                statements: vec![ExecutionStatement::from_text(text)],
                next_parameter: parameter_offset,
            }),
        }
    }

    /// Compile a sequence of commands with continuous parameter numbering.
    pub fn commands(&self, commands: &[Command]) -> Result<Vec<ExecutionStatement>> {
        let mut statements = Vec::with_capacity(commands.len());
        let mut offset = 0;
        for command in commands {
            let compiled = self.command(command, offset)?;
            offset = compiled.next_parameter;
            statements.extend(compiled.statements);
        }
        Ok(statements)
    }
}

/// One statement per physical table, sharing the bindings.
fn per_table<F>(
    tables: Vec<String>,
    parameters: Parameters,
    must_affect_data: bool,
    has_pre_script: bool,
    script: F,
) -> Vec<ExecutionStatement>
where
    F: Fn(&str) -> String,
{
    tables
        .iter()
        .map(|table| {
            ExecutionStatement::new(script(table), parameters.clone(), must_affect_data, has_pre_script)
        })
        .collect()
}
