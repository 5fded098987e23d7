use crate::ast::{Assignment, Query, UpdateCommand};
use crate::error::{Error, Result};
use crate::statement::{Compiled, StatementBuilder, per_table};
use crate::transpiler::ROOT_ALIAS;

const MERGE_SOURCE_ALIAS: &str = "UTB";

impl<'a> StatementBuilder<'a> {
    /// Single-table `UPDATE` without joins or pre-scripts, else
    /// `MERGE INTO ... USING (...) ON (pk) WHEN MATCHED THEN UPDATE SET ...`.
    pub(crate) fn update(&self, command: &UpdateCommand, parameter_offset: usize) -> Result<Compiled> {
        let entity = self.schema.entity(&command.entity)?;
        if command.assignments.is_empty() {
            return Err(Error::EmptyUpdate(entity.name.clone()));
        }
        let query = scoped_query(command.query.as_ref(), &command.entity);

        let mut ctx = self.context(parameter_offset);
        let translation = ctx.translate(&query, ROOT_ALIAS, false)?;

        let mut sets = Vec::with_capacity(command.assignments.len());
        let mut assigned_fields = Vec::with_capacity(command.assignments.len());
        for (property, assignment) in &command.assignments {
            let field = entity.get_field(property)?;
            let column = ctx.formatter().format_identifier(&field.column);
            let expression = match assignment {
                Assignment::Value(value) => ctx.add_parameter(property, value.clone()),
                Assignment::Calculate { op, value } => {
                    let current = ctx.formatter().column(ROOT_ALIAS, field);
                    let placeholder = ctx.add_parameter(property, value.clone());
                    format!("{} {} {}", current, op.symbol(), placeholder)
                }
            };
            sets.push(format!("{} = {}", column, expression));
            assigned_fields.push(field);
        }
        let sets = sets.join(", ");

        let has_pre_script = translation.has_pre_script();
        let merge = translation.has_join() || has_pre_script;
        let formatter = *ctx.formatter();
        let tables = entity.table_names(&command.split_values)?;
        let next_parameter = ctx.parameter_sequence();
        let parameters = ctx.into_parameters();

        let statements = if merge {
            let keys = entity.require_primary_keys()?;
            if let Some(key) = assigned_fields.iter().find(|f| f.role.primary_key) {
                return Err(Error::Unsupported(format!(
                    "MERGE update of primary key {}.{}",
                    entity.name, key.property
                )));
            }
            let key_columns = formatter.format_fields(ROOT_ALIAS, keys.iter().copied(), false);
            let on = keys
                .iter()
                .map(|k| {
                    let column = formatter.format_identifier(&k.column);
                    format!("{}.{} = {}.{}", ROOT_ALIAS, column, MERGE_SOURCE_ALIAS, column)
                })
                .collect::<Vec<_>>()
                .join(" AND ");
            per_table(tables, parameters, command.must_affect_data, has_pre_script, |table| {
                let table = formatter.format_identifier(table);
                let mut source = format!("SELECT {} FROM {} {}", key_columns, table, ROOT_ALIAS);
                if translation.has_join() {
                    source.push(' ');
                    source.push_str(translation.usable_join());
                }
                if !translation.condition.is_empty() {
                    source.push_str(" WHERE ");
                    source.push_str(&translation.condition);
                }
                format!(
                    "MERGE INTO {} {} USING ({}) {} ON ({}) WHEN MATCHED THEN UPDATE SET {}",
                    table, ROOT_ALIAS, source, MERGE_SOURCE_ALIAS, on, sets
                )
            })
        } else {
            per_table(tables, parameters, command.must_affect_data, false, |table| {
                let mut script = format!(
                    "UPDATE {} {} SET {}",
                    formatter.format_identifier(table),
                    ROOT_ALIAS,
                    sets
                );
                if !translation.condition.is_empty() {
                    script.push_str(" WHERE ");
                    script.push_str(&translation.condition);
                }
                script
            })
        };
        Ok(Compiled {
            statements,
            next_parameter,
        })
    }
}

/// Query of an update/delete, defaulting to the whole entity.
pub(super) fn scoped_query(query: Option<&Query>, entity: &str) -> Query {
    let mut query = query.cloned().unwrap_or_default();
    if query.entity.is_empty() {
        query.entity = entity.to_string();
    }
    query
}
