//! Query translation: conditions, sort, combines, joins and recursion.

use crate::ast::{Join, JoinKind, Query, RecursionDirection};
use crate::error::{Error, Result};
use crate::schema::{Entity, EntityField};
use crate::transpiler::context::TranslationContext;
use crate::transpiler::criterion::Fragment;

const ANCHOR_ALL: &str = "1 = 1";

/// Unassembled fragments of one translated query node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    pub condition: String,
    pub sort: String,
    pub join: String,
    pub combine: String,
    pub pre_scripts: Vec<String>,
    pub allow_join: bool,
    /// Formatted table of this node's recursion, else of the last nested one.
    pub recurse_object_name: Option<String>,
    /// Alias the recursive traversal runs under.
    pub recurse_pet_name: Option<String>,
    condition_has_or: bool,
}

impl Translation {
    pub fn has_pre_script(&self) -> bool {
        !self.pre_scripts.is_empty()
    }

    /// Join text when this node may carry its joins, else empty.
    pub fn usable_join(&self) -> &str {
        if self.allow_join { &self.join } else { "" }
    }

    /// Whether OR connects top-level siblings of the condition.
    pub fn condition_is_compound(&self) -> bool {
        self.condition_has_or
    }

    /// Whether this node owns a join that statements must honor.
    pub fn has_join(&self) -> bool {
        !self.usable_join().is_empty()
    }

    fn condition_fragment(&self) -> Fragment {
        Fragment {
            text: self.condition.clone(),
            has_or: self.condition_has_or,
            ..Default::default()
        }
    }
}

/// Pieces of a SELECT that may need ROWNUM wrapping.
///
/// `ROWNUM` is assigned before ORDER BY, DISTINCT, GROUP BY and set
/// operations run, so the row cap goes on an outer layer whenever any of
/// those are present.
#[derive(Debug, Clone)]
pub struct SelectParts<'s> {
    /// Projection of the innermost layer.
    pub inner_fields: String,
    /// Projection of the outermost layer (may carry `AS` aliases).
    pub outer_fields: String,
    pub table: String,
    pub alias: &'s str,
    pub join: String,
    pub condition: String,
    /// Condition has a top-level OR and needs parentheses before an AND.
    pub compound: bool,
    /// ` GROUP BY ... HAVING ...`, leading space included.
    pub group: String,
    pub combine: String,
    pub sort: String,
    pub distinct: bool,
}

impl SelectParts<'_> {
    fn select(&self, fields: &str, condition: &str) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(fields);
        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        sql.push(' ');
        sql.push_str(self.alias);
        if !self.join.is_empty() {
            sql.push(' ');
            sql.push_str(&self.join);
        }
        if !condition.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        sql.push_str(&self.group);
        if !self.combine.is_empty() {
            sql.push(' ');
            sql.push_str(&self.combine);
        }
        sql
    }

    fn order_by(&self) -> String {
        if self.sort.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", self.sort)
        }
    }

    fn wrap(&self, fields: &str, inner: String) -> String {
        format!("SELECT {} FROM ({}) {}", fields, inner, self.alias)
    }

    /// Plain SELECT without ORDER BY or row cap.
    pub fn unordered(&self, fields: &str) -> String {
        self.select(fields, &self.condition)
    }

    /// Full SELECT, capping rows at `limit` after ordering.
    pub fn limited(&self, limit: Option<usize>) -> String {
        let has_combine = !self.combine.is_empty();
        let has_sort = !self.sort.is_empty();
        let shaped = has_sort || self.distinct || !self.group.is_empty();

        let Some(limit) = limit else {
            return if has_combine && has_sort {
                let inner = self.select(&self.inner_fields, &self.condition);
                format!("{}{}", self.wrap(&self.outer_fields, inner), self.order_by())
            } else {
                format!("{}{}", self.select(&self.outer_fields, &self.condition), self.order_by())
            };
        };

        let cap = format!("ROWNUM <= {}", limit);
        match (has_combine, shaped) {
            (false, false) => {
                let condition = match (self.condition.is_empty(), self.compound) {
                    (true, _) => cap,
                    (false, true) => format!("({}) AND {}", self.condition, cap),
                    (false, false) => format!("{} AND {}", self.condition, cap),
                };
                self.select(&self.outer_fields, &condition)
            }
            (false, true) => {
                let inner = format!(
                    "{}{}",
                    self.select(&self.inner_fields, &self.condition),
                    self.order_by()
                );
                format!("{} WHERE {}", self.wrap(&self.outer_fields, inner), cap)
            }
            (true, _) if !has_sort => {
                let inner = self.select(&self.inner_fields, &self.condition);
                format!("{} WHERE {}", self.wrap(&self.outer_fields, inner), cap)
            }
            (true, _) => {
                let combined = self.select(&self.inner_fields, &self.condition);
                let sorted = format!("{}{}", self.wrap(&self.inner_fields, combined), self.order_by());
                format!("{} WHERE {}", self.wrap(&self.outer_fields, sorted), cap)
            }
        }
    }
}

impl<'a> TranslationContext<'a> {
    /// Translate `query` with `alias` as its table alias.
    pub fn translate(&mut self, query: &Query, alias: &str, use_sort: bool) -> Result<Translation> {
        let entity = self.schema().entity(&query.entity)?;
        let condition_alias = match query.recursion {
            Some(_) => self.next_alias(),
            None => alias.to_string(),
        };

        // condition
        let mut condition = self.translate_conditions(entity, &condition_alias, &query.conditions)?;
        let mut pre_scripts = std::mem::take(&mut condition.pre_scripts);

        // sort
        let sort = if use_sort {
            self.translate_sort(entity, alias, query)?
        } else {
            String::new()
        };

        // combine
        let mut combines = Vec::with_capacity(query.combines.len());
        for combine in &query.combines {
            let combine_alias = self.next_alias();
            let target = self.schema().entity(&combine.query.entity)?;
            let sub = self.translate(&combine.query, &combine_alias, false)?;
            let fields = self.combine_fields(entity, target, query, &combine_alias)?;
            let mut text = format!(
                "{} SELECT {} FROM {} {}",
                combine.kind.keyword(),
                fields,
                self.formatter().format_identifier(&target.table),
                combine_alias
            );
            push_clause(&mut text, sub.usable_join());
            if !sub.condition.is_empty() {
                text.push_str(" WHERE ");
                text.push_str(&sub.condition);
            }
            push_clause(&mut text, &sub.combine);
            pre_scripts.extend(sub.pre_scripts);
            condition.inherit_recursion(sub.recurse_object_name, sub.recurse_pet_name);
            combines.push(text);
        }

        // join
        let mut joins = Vec::with_capacity(query.joins.len());
        for join in &query.joins {
            let join_alias = self.next_alias();
            let target = self.schema().entity(&join.query.entity)?;
            let sub = self.translate(&join.query, &join_alias, false)?;
            pre_scripts.extend(sub.pre_scripts.iter().cloned());
            condition.inherit_recursion(sub.recurse_object_name.clone(), sub.recurse_pet_name.clone());
            let table = self.formatter().format_identifier(&target.table);

            let text = if sub.combine.is_empty() {
                let mut on = self.join_predicate(entity, target, join, &condition_alias, &join_alias)?;
                let sub_condition = sub.condition_fragment();
                if !sub_condition.is_empty() {
                    if sub.allow_join && join.kind != JoinKind::Cross {
                        on.push(sub_condition.and_operand());
                    } else {
                        condition.and(sub_condition);
                    }
                }
                let mut text = format!("{} {} {}", join.kind.keyword(), table, join_alias);
                push_on(&mut text, &on);
                push_clause(&mut text, sub.usable_join());
                text
            } else {
                // a set-combined target must be joined as a derived table
                let derived_alias = self.next_alias();
                let fields = target.query_fields(&join.query.fields)?;
                let mut inner = format!(
                    "SELECT {} FROM {} {}",
                    self.formatter().format_fields(&join_alias, fields, false),
                    table,
                    join_alias
                );
                push_clause(&mut inner, sub.usable_join());
                if !sub.condition.is_empty() {
                    inner.push_str(" WHERE ");
                    inner.push_str(&sub.condition);
                }
                push_clause(&mut inner, &sub.combine);
                let on = self.join_predicate(entity, target, join, &condition_alias, &derived_alias)?;
                let mut text = format!("{} ({}) {}", join.kind.keyword(), inner, derived_alias);
                push_on(&mut text, &on);
                text
            };
            joins.push(text);
        }

        let mut translation = Translation {
            condition: condition.text,
            sort,
            join: joins.join(" "),
            combine: combines.join(" "),
            pre_scripts,
            allow_join: true,
            recurse_object_name: condition.recurse_object_name,
            recurse_pet_name: condition.recurse_pet_name,
            condition_has_or: condition.has_or,
        };

        // recursion
        if let Some(recursion) = &query.recursion {
            let key = entity.get_field(&recursion.data_field)?;
            let relation = entity.get_field(&recursion.relation_field)?;
            let table = self.formatter().format_identifier(&entity.table);
            let key_column = self.formatter().column(&condition_alias, key);
            let relation_column = self.formatter().column(&condition_alias, relation);
            let link = match recursion.direction {
                RecursionDirection::Up => format!("{} = {}", relation_column, key_column),
                RecursionDirection::Down => format!("{} = {}", key_column, relation_column),
            };
            let anchor = if translation.condition.is_empty() {
                ANCHOR_ALL
            } else {
                translation.condition.as_str()
            };
            let mut script = format!("SELECT {} FROM {} {}", key_column, table, condition_alias);
            push_clause(&mut script, &translation.join);
            script.push_str(&format!(" START WITH {} CONNECT BY PRIOR {}", anchor, link));

            translation.condition = format!(
                "{} IN ({})",
                self.formatter().column(alias, key),
                script
            );
            translation.condition_has_or = false;
            translation.pre_scripts.push(script);
            translation.allow_join = false;
            translation.recurse_object_name = Some(table);
            translation.recurse_pet_name = Some(condition_alias);
        }

        Ok(translation)
    }

    fn translate_sort(&mut self, entity: &Entity, alias: &str, query: &Query) -> Result<String> {
        let mut items = Vec::with_capacity(query.sorts.len());
        for sort in &query.sorts {
            let field = entity.get_field(&sort.field)?;
            let column = self.formatter().column(alias, field);
            let column = self.convert(column, &sort.field, sort.conversion.as_ref())?;
            items.push(format!("{} {}", column, sort.order.keyword()));
        }
        Ok(items.join(", "))
    }

    /// Parent projection resolved against the combined entity.
    fn combine_fields(&self, parent: &Entity, target: &Entity, query: &Query, alias: &str) -> Result<String> {
        let properties: Vec<&str> = if query.fields.is_empty() {
            parent.fields.iter().map(|f| f.property.as_str()).collect()
        } else {
            query.fields.iter().map(String::as_str).collect()
        };
        let fields = properties
            .into_iter()
            .map(|p| target.get_field(p))
            .collect::<Result<Vec<&EntityField>>>()?;
        Ok(self.formatter().format_fields(alias, fields, false))
    }

    /// `src.F op tgt.G` items: explicit pairs, else primary keys for a
    /// self join, else relations forward then reverse.
    fn join_predicate(
        &self,
        source: &Entity,
        target: &Entity,
        join: &Join,
        source_alias: &str,
        target_alias: &str,
    ) -> Result<Vec<String>> {
        if join.kind == JoinKind::Cross {
            return Ok(Vec::new());
        }
        let pairs = if !join.fields.is_empty() {
            join.fields.clone()
        } else if source.name == target.name {
            source
                .primary_keys()
                .map(|k| (k.property.clone(), k.property.clone()))
                .collect()
        } else {
            let forward = source.relation_fields(&target.name);
            if forward.is_empty() {
                target
                    .relation_fields(&source.name)
                    .into_iter()
                    .map(|(target_field, source_field)| (source_field, target_field))
                    .collect()
            } else {
                forward
            }
        };
        if pairs.is_empty() {
            return Err(Error::MissingJoinPredicate {
                from: source.name.clone(),
                to: target.name.clone(),
            });
        }
        pairs
            .iter()
            .map(|(s, t)| {
                Ok(format!(
                    "{} {} {}",
                    self.formatter().column(source_alias, source.get_field(s)?),
                    join.operator.sql(),
                    self.formatter().column(target_alias, target.get_field(t)?)
                ))
            })
            .collect()
    }
}

fn push_clause(sql: &mut String, clause: &str) {
    if !clause.is_empty() {
        sql.push(' ');
        sql.push_str(clause);
    }
}

fn push_on(sql: &mut String, predicates: &[String]) {
    if !predicates.is_empty() {
        sql.push_str(" ON ");
        sql.push_str(&predicates.join(" AND "));
    }
}
