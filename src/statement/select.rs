use crate::ast::{AggregateFunc, Output, Paging, Query};
use crate::error::{Error, Result};
use crate::schema::{Entity, EntityField};
use crate::statement::{ExecutionStatement, StatementBuilder};
use crate::transpiler::{ROOT_ALIAS, SelectParts, TranslationContext, Translation};

/// Synthetic total-count column of a paged query.
pub const TOTAL_COUNT_COLUMN: &str = "QUERY_TOTAL_COUNT";
/// Synthetic row-number column of a paged query.
pub const ROW_NUMBER_COLUMN: &str = "PAGING_ROW_NUMBER";

impl<'a> StatementBuilder<'a> {
    /// Compile a query into a single SELECT of the requested output shape.
    pub fn query(&self, query: &Query) -> Result<ExecutionStatement> {
        if let Some(text) = &query.text {
            return Ok(ExecutionStatement::new(
                text.script.clone(),
                text.parameters.clone(),
                false,
                false,
            ));
        }

        let entity = self.schema.entity(&query.entity)?;
        let mut ctx = self.context(0);
        let (script, has_pre_script) = match (query.output, query.paging) {
            (Output::Rows, Some(paging)) => paged(&mut ctx, entity, query, paging)?,
            (Output::Rows, None) => rows(&mut ctx, entity, query)?,
            (Output::Count, _) => count(&mut ctx, entity, query)?,
            (Output::Exists, _) => exists(&mut ctx, entity, query)?,
            (Output::Aggregate(function), _) => aggregate(&mut ctx, entity, query, function)?,
        };
        Ok(ExecutionStatement::new(
            script,
            ctx.into_parameters(),
            false,
            has_pre_script,
        ))
    }
}

/// Translation plus the select skeleton shared by every shape.
fn skeleton(
    ctx: &mut TranslationContext<'_>,
    entity: &Entity,
    query: &Query,
    fields: &[&EntityField],
    use_sort: bool,
) -> Result<(Translation, SelectParts<'static>)> {
    let translation = ctx.translate(query, ROOT_ALIAS, use_sort)?;
    let group = group_clause(ctx, entity, query)?;
    let formatter = ctx.formatter();
    let parts = SelectParts {
        inner_fields: formatter.format_fields(ROOT_ALIAS, fields.iter().copied(), false),
        outer_fields: formatter.format_fields(ROOT_ALIAS, fields.iter().copied(), true),
        table: formatter.format_identifier(&entity.table),
        alias: ROOT_ALIAS,
        join: translation.usable_join().to_string(),
        condition: translation.condition.clone(),
        compound: translation.condition_is_compound(),
        group,
        combine: translation.combine.clone(),
        sort: translation.sort.clone(),
        distinct: query.distinct,
    };
    Ok((translation, parts))
}

fn group_clause(ctx: &mut TranslationContext<'_>, entity: &Entity, query: &Query) -> Result<String> {
    if query.group_by.is_empty() {
        return Ok(String::new());
    }
    let columns = query
        .group_by
        .iter()
        .map(|p| Ok(ctx.formatter().column(ROOT_ALIAS, entity.get_field(p)?)))
        .collect::<Result<Vec<_>>>()?;
    let mut clause = format!(" GROUP BY {}", columns.join(", "));
    let having = ctx.translate_conditions(entity, ROOT_ALIAS, &query.having)?;
    if !having.is_empty() {
        clause.push_str(" HAVING ");
        clause.push_str(&having.text);
    }
    Ok(clause)
}

fn rows(ctx: &mut TranslationContext<'_>, entity: &Entity, query: &Query) -> Result<(String, bool)> {
    let fields = entity.query_fields(&query.fields)?;
    let (translation, parts) = skeleton(ctx, entity, query, &fields, true)?;
    let limit = (query.size > 0).then_some(query.size);
    Ok((parts.limited(limit), translation.has_pre_script()))
}

/// `ROW_NUMBER()` window over the sort with a `COUNT() OVER()` total,
/// returning rows `offset+1 ..= offset+size`.
fn paged(
    ctx: &mut TranslationContext<'_>,
    entity: &Entity,
    query: &Query,
    paging: Paging,
) -> Result<(String, bool)> {
    let fields = entity.query_fields(&query.fields)?;
    let default = entity
        .default_field()
        .ok_or_else(|| Error::MissingQueryField(entity.name.clone()))?;
    let (translation, parts) = skeleton(ctx, entity, query, &fields, true)?;
    let derived = !parts.combine.is_empty() || parts.distinct || !parts.group.is_empty();
    // a derived table only exposes the projected columns
    let (counted, default_order) = match (derived, fields.first()) {
        (true, Some(first)) => ("1".to_string(), ctx.formatter().column(ROOT_ALIAS, first)),
        _ => {
            let column = ctx.formatter().column(ROOT_ALIAS, default);
            (column.clone(), column)
        }
    };
    let order = if parts.sort.is_empty() {
        format!("{} DESC", default_order)
    } else {
        parts.sort.clone()
    };
    let window = format!(
        "COUNT({}) OVER() AS {}, ROW_NUMBER() OVER(ORDER BY {}) AS {}, {}",
        counted, TOTAL_COUNT_COLUMN, order, ROW_NUMBER_COLUMN, parts.inner_fields
    );
    let numbered = if derived {
        format!(
            "SELECT {} FROM ({}) {}",
            window,
            parts.unordered(&parts.inner_fields),
            ROOT_ALIAS
        )
    } else {
        parts.unordered(&window)
    };
    let begin = paging.offset + 1;
    let end = paging.offset + paging.size.max(1);
    let script = format!(
        "SELECT {}, {} FROM ({}) {} WHERE {} BETWEEN {} AND {} ORDER BY {}",
        parts.outer_fields,
        TOTAL_COUNT_COLUMN,
        numbered,
        ROOT_ALIAS,
        ROW_NUMBER_COLUMN,
        begin,
        end,
        ROW_NUMBER_COLUMN
    );
    Ok((script, translation.has_pre_script()))
}

fn count(ctx: &mut TranslationContext<'_>, entity: &Entity, query: &Query) -> Result<(String, bool)> {
    let fields = entity.query_fields(&query.fields)?;
    let (translation, parts) = skeleton(ctx, entity, query, &fields, false)?;
    let limit = (query.size > 0).then_some(query.size);
    let script = format!("SELECT COUNT(1) FROM ({}) {}", parts.limited(limit), ROOT_ALIAS);
    Ok((script, translation.has_pre_script()))
}

fn exists(ctx: &mut TranslationContext<'_>, entity: &Entity, query: &Query) -> Result<(String, bool)> {
    let mut fields: Vec<&EntityField> = entity.primary_keys().collect();
    if fields.is_empty() {
        fields.extend(entity.default_field());
    }
    if fields.is_empty() {
        return Err(Error::MissingPrimaryKey(entity.name.clone()));
    }
    let mut probe = query.clone();
    if !probe.combines.is_empty() {
        probe.fields = fields.iter().map(|f| f.property.clone()).collect();
    }
    let (translation, parts) = skeleton(ctx, entity, &probe, &fields, false)?;
    let script = format!(
        "SELECT CASE WHEN EXISTS({}) THEN 1 ELSE 0 END FROM DUAL",
        parts.unordered(&parts.inner_fields)
    );
    Ok((script, translation.has_pre_script()))
}

fn aggregate(
    ctx: &mut TranslationContext<'_>,
    entity: &Entity,
    query: &Query,
    function: AggregateFunc,
) -> Result<(String, bool)> {
    let field = match (query.fields.first(), function) {
        (Some(property), _) => entity.get_field(property)?,
        (None, AggregateFunc::Count) => entity
            .default_field()
            .ok_or_else(|| Error::MissingQueryField(entity.name.clone()))?,
        (None, _) => {
            return Err(Error::MissingAggregateField {
                entity: entity.name.clone(),
                function: function.to_string(),
            });
        }
    };
    let fields = entity.query_fields(&query.fields)?;
    let (translation, mut parts) = skeleton(ctx, entity, query, &fields, false)?;
    let column = ctx.formatter().column(ROOT_ALIAS, field);
    let distinct = if parts.distinct { "DISTINCT " } else { "" };
    let expression = format!("{}({}{})", function.keyword(), distinct, column);
    parts.distinct = false;
    let script = if parts.combine.is_empty() {
        parts.unordered(&expression)
    } else {
        format!(
            "SELECT {} FROM ({}) {}",
            expression,
            parts.unordered(&parts.inner_fields),
            ROOT_ALIAS
        )
    };
    Ok((script, translation.has_pre_script()))
}
