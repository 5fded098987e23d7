use crate::ast::DeleteCommand;
use crate::error::Result;
use crate::statement::update::scoped_query;
use crate::statement::{Compiled, StatementBuilder, per_table};
use crate::transpiler::ROOT_ALIAS;

const DELETE_TARGET_ALIAS: &str = "DTB";

impl<'a> StatementBuilder<'a> {
    /// `DELETE T TB WHERE ...` without joins or pre-scripts, else
    /// `DELETE FROM T DTB WHERE (pk) IN (SELECT pk FROM T TB <join> WHERE ...)`.
    pub(crate) fn delete(&self, command: &DeleteCommand, parameter_offset: usize) -> Result<Compiled> {
        let entity = self.schema.entity(&command.entity)?;
        let query = scoped_query(command.query.as_ref(), &command.entity);

        let mut ctx = self.context(parameter_offset);
        let translation = ctx.translate(&query, ROOT_ALIAS, false)?;
        let has_pre_script = translation.has_pre_script();
        let correlated = translation.has_join() || has_pre_script;
        let formatter = *ctx.formatter();
        let tables = entity.table_names(&command.split_values)?;
        let next_parameter = ctx.parameter_sequence();
        let parameters = ctx.into_parameters();

        let statements = if correlated {
            let keys = entity.require_primary_keys()?;
            let target_keys = formatter.format_fields(DELETE_TARGET_ALIAS, keys.iter().copied(), false);
            let source_keys = formatter.format_fields(ROOT_ALIAS, keys.iter().copied(), false);
            per_table(tables, parameters, command.must_affect_data, has_pre_script, |table| {
                let table = formatter.format_identifier(table);
                let mut source = format!("SELECT {} FROM {} {}", source_keys, table, ROOT_ALIAS);
                if translation.has_join() {
                    source.push(' ');
                    source.push_str(translation.usable_join());
                }
                if !translation.condition.is_empty() {
                    source.push_str(" WHERE ");
                    source.push_str(&translation.condition);
                }
                format!(
                    "DELETE FROM {} {} WHERE ({}) IN ({})",
                    table, DELETE_TARGET_ALIAS, target_keys, source
                )
            })
        } else {
            per_table(tables, parameters, command.must_affect_data, false, |table| {
                let mut script = format!("DELETE {} {}", formatter.format_identifier(table), ROOT_ALIAS);
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
