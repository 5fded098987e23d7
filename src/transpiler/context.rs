//! Per-compile translation state.

use crate::ast::Value;
use crate::config::OracleOptions;
use crate::params::Parameters;
use crate::schema::Schema;
use crate::transpiler::format::Formatter;

/// Alias of the outermost table of a statement.
pub const ROOT_ALIAS: &str = "TB";
const SUB_ALIAS_PREFIX: &str = "TSB";

/// State owned by one top-level compile: the parameter collection plus
/// the parameter and alias counters. Threaded through every nested
/// translation and dropped when the statement is built.
#[derive(Debug)]
pub struct TranslationContext<'a> {
    schema: &'a Schema,
    formatter: Formatter,
    parameters: Parameters,
    parameter_seq: usize,
    alias_seq: usize,
}

impl<'a> TranslationContext<'a> {
    pub fn new(schema: &'a Schema, options: OracleOptions) -> Self {
        Self {
            schema,
            formatter: Formatter::new(options),
            parameters: Parameters::new(),
            parameter_seq: 0,
            alias_seq: 0,
        }
    }

    /// Continue parameter numbering from a statement batched earlier.
    pub fn with_parameter_offset(mut self, offset: usize) -> Self {
        self.parameter_seq = offset;
        self
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Next unique sub-alias: TSB0, TSB1, ...
    pub fn next_alias(&mut self) -> String {
        let alias = format!("{}{}", SUB_ALIAS_PREFIX, self.alias_seq);
        self.alias_seq += 1;
        alias
    }

    /// Bind `value` under `{name}{seq}` and return its placeholder.
    pub fn add_parameter(&mut self, name: &str, value: Value) -> String {
        let name = self.next_parameter_name(name);
        let value = self.normalize(value);
        let placeholder = self.formatter.parameter(&name);
        self.parameters.add(name, value);
        placeholder
    }

    /// Register an output parameter under `{name}{seq}` and return its placeholder.
    pub fn add_output_parameter(&mut self, name: &str) -> String {
        let name = self.next_parameter_name(name);
        let placeholder = self.formatter.parameter(&name);
        self.parameters.add_output(name);
        placeholder
    }

    fn next_parameter_name(&mut self, name: &str) -> String {
        let name = format!("{}{}", name, self.parameter_seq);
        self.parameter_seq += 1;
        name
    }

    fn normalize(&self, value: Value) -> Value {
        match value {
            Value::Uuid(u) if self.formatter.options().formatting_guid => {
                Value::Bytes(u.as_bytes().to_vec())
            }
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.normalize(v)).collect())
            }
            other => other,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Sequence number the next parameter will receive.
    pub fn parameter_sequence(&self) -> usize {
        self.parameter_seq
    }

    pub fn into_parameters(self) -> Parameters {
        self.parameters
    }
}
