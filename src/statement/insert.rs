use crate::ast::{InsertCommand, Value};
use crate::error::{Error, Result};
use crate::statement::{Compiled, StatementBuilder, per_table};

impl<'a> StatementBuilder<'a> {
    /// `INSERT INTO T (cols) VALUES (:params)`, one per physical table, with
    /// `RETURNING col INTO :out` for an auto-increment field.
    pub(crate) fn insert(&self, command: &InsertCommand, parameter_offset: usize) -> Result<Compiled> {
        let entity = self.schema.entity(&command.entity)?;
        let auto_increment = entity.auto_increment_field();
        let split = entity.split_field();
        if auto_increment.is_some() && split.is_some() {
            return Err(Error::AutoIncrementWithSplit(entity.name.clone()));
        }
        for (property, _) in &command.values {
            entity.get_field(property)?;
        }

        let mut ctx = self.context(parameter_offset);
        let mut columns = Vec::with_capacity(entity.fields.len());
        let mut values = Vec::with_capacity(entity.fields.len());
        for field in entity.fields.iter().filter(|f| !f.role.auto_increment) {
            let value = command
                .values
                .iter()
                .find(|(property, _)| *property == field.property)
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Null);
            columns.push(ctx.formatter().format_identifier(&field.column));
            values.push(ctx.add_parameter(&field.property, value));
        }

        let returning = match auto_increment {
            Some(field) => {
                let output = ctx.add_output_parameter(&field.property);
                format!(
                    " RETURNING {} INTO {}",
                    ctx.formatter().format_identifier(&field.column),
                    output
                )
            }
            None => String::new(),
        };

        let split_values: Vec<Value> = split
            .and_then(|field| {
                command
                    .values
                    .iter()
                    .find(|(property, _)| *property == field.property)
                    .map(|(_, value)| value.clone())
            })
            .into_iter()
            .collect();
        let tables = entity.table_names(&split_values)?;

        let formatter = *ctx.formatter();
        let next_parameter = ctx.parameter_sequence();
        let columns = columns.join(", ");
        let values = values.join(", ");
        let statements = per_table(
            tables,
            ctx.into_parameters(),
            command.must_affect_data,
            false,
            |table| {
                format!(
                    "INSERT INTO {} ({}) VALUES ({}){}",
                    formatter.format_identifier(table),
                    columns,
                    values,
                    returning
                )
            },
        );
        Ok(Compiled {
            statements,
            next_parameter,
        })
    }
}
