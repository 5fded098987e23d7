//! Criterion translation: predicates, groups and subqueries.

use crate::ast::{Condition, ConditionEntry, Criterion, LogicalOp, Operator, Query, Value, ValueTransform};
use crate::error::{Error, Result};
use crate::schema::Entity;
use crate::transpiler::context::TranslationContext;
use crate::transpiler::query::SelectParts;

const ALWAYS_TRUE: &str = "1 = 1";
const ALWAYS_FALSE: &str = "1 = 0";

/// Boolean SQL fragment produced by a criterion or group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub text: String,
    /// Anchoring scripts of nested recursive subqueries.
    pub pre_scripts: Vec<String>,
    /// Whether OR appears between top-level siblings of `text`.
    pub has_or: bool,
    /// Table and alias of the last nested recursive subquery.
    pub recurse_object_name: Option<String>,
    pub recurse_pet_name: Option<String>,
}

impl Fragment {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    fn constant(value: bool) -> Self {
        Self::text(if value { ALWAYS_TRUE } else { ALWAYS_FALSE })
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text safe to place next to an AND.
    pub fn and_operand(&self) -> String {
        if self.has_or {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }

    /// AND another fragment onto this one, parenthesizing OR lists.
    pub fn and(&mut self, other: Fragment) {
        if other.is_empty() {
            return;
        }
        let operand = other.and_operand();
        self.inherit_recursion(other.recurse_object_name, other.recurse_pet_name);
        self.pre_scripts.extend(other.pre_scripts);
        if self.is_empty() {
            self.text = other.text;
            self.has_or = other.has_or;
            return;
        }
        self.text = format!("{} AND {}", self.and_operand(), operand);
        self.has_or = false;
    }

    /// Take recursion metadata from a later nested translation, if it has any.
    pub fn inherit_recursion(&mut self, object_name: Option<String>, pet_name: Option<String>) {
        if object_name.is_some() {
            self.recurse_object_name = object_name;
            self.recurse_pet_name = pet_name;
        }
    }
}

impl<'a> TranslationContext<'a> {
    /// Fold a connective list left to right, keeping sibling order.
    pub fn translate_conditions(
        &mut self,
        entity: &Entity,
        alias: &str,
        entries: &[ConditionEntry],
    ) -> Result<Fragment> {
        let mut folded = Fragment::default();
        for entry in entries {
            let fragment = self.translate_condition(entity, alias, &entry.condition)?;
            if fragment.is_empty() {
                continue;
            }
            folded.pre_scripts.extend(fragment.pre_scripts);
            folded.inherit_recursion(fragment.recurse_object_name, fragment.recurse_pet_name);
            if folded.text.is_empty() {
                folded.text = fragment.text;
                folded.has_or = fragment.has_or;
                continue;
            }
            folded.text.push(' ');
            folded.text.push_str(entry.connector.keyword());
            folded.text.push(' ');
            folded.text.push_str(&fragment.text);
            folded.has_or |= entry.connector == LogicalOp::Or || fragment.has_or;
        }
        Ok(folded)
    }

    pub fn translate_condition(
        &mut self,
        entity: &Entity,
        alias: &str,
        condition: &Condition,
    ) -> Result<Fragment> {
        match condition {
            Condition::Constant(value) => Ok(Fragment::constant(*value)),
            Condition::Criterion(criterion) => self.translate_criterion(entity, alias, criterion),
            Condition::Group(entries) => {
                if let [only] = entries.as_slice() {
                    return self.translate_condition(entity, alias, &only.condition);
                }
                let mut fragment = self.translate_conditions(entity, alias, entries)?;
                if !fragment.is_empty() {
                    fragment.text = format!("({})", fragment.text);
                    fragment.has_or = false;
                }
                Ok(fragment)
            }
        }
    }

    pub fn translate_criterion(
        &mut self,
        entity: &Entity,
        alias: &str,
        criterion: &Criterion,
    ) -> Result<Fragment> {
        let field = entity.get_field(&criterion.field)?;
        let column = self.formatter().column(alias, field);
        let column = self.convert(column, &criterion.field, criterion.conversion.as_ref())?;
        let spec = criterion.operator.spec();
        if !spec.needs_parameter {
            return Ok(Fragment::text(format!("{} {}", column, spec.sql)));
        }

        let name = criterion.field.as_str();
        let membership = criterion.operator.is_membership();
        match &criterion.value {
            Value::Subquery(query) => {
                let sub = self.translate_subquery(query, criterion.operator)?;
                Ok(Fragment {
                    text: format!("{} {} ({})", column, spec.sql, sub.text),
                    ..sub
                })
            }
            Value::Array(items) if membership => {
                if items.is_empty() {
                    // nothing is IN an empty set
                    return Ok(Fragment::constant(criterion.operator == Operator::NotIn));
                }
                if items.iter().all(Value::binds_in_collection) {
                    let placeholder = self.add_parameter(name, criterion.value.clone());
                    return Ok(Fragment::text(format!("{} {} {}", column, spec.sql, placeholder)));
                }
                let placeholders: Vec<String> = items
                    .iter()
                    .map(|item| self.add_parameter(name, item.clone()))
                    .collect();
                Ok(Fragment::text(format!(
                    "{} {} ({})",
                    column,
                    spec.sql,
                    placeholders.join(", ")
                )))
            }
            Value::Array(_) => Err(Error::InvalidValue(format!(
                "collection value for operator {:?} on {}.{}",
                criterion.operator, entity.name, criterion.field
            ))),
            value if membership => {
                let placeholder = self.add_parameter(name, value.clone());
                Ok(Fragment::text(format!("{} {} ({})", column, spec.sql, placeholder)))
            }
            value => {
                let value = match spec.transform {
                    ValueTransform::None => value.clone(),
                    transform => Value::String(transform.apply(&value.as_text())),
                };
                let placeholder = self.add_parameter(name, value);
                Ok(Fragment::text(format!("{} {} {}", column, spec.sql, placeholder)))
            }
        }
    }

    /// Scalar comparisons take at most one row; IN/NOT IN honor the query size.
    /// Every branch, combined ones included, projects only the first field.
    fn translate_subquery(&mut self, query: &Query, operator: Operator) -> Result<Fragment> {
        let entity = self.schema().entity(&query.entity)?;
        let property = query
            .fields
            .first()
            .ok_or_else(|| Error::MissingQueryField(entity.name.clone()))?;
        let field = entity.get_field(property)?;
        let limit = if operator.is_membership() {
            (query.size > 0).then_some(query.size)
        } else {
            Some(1)
        };

        let projected = Query {
            fields: vec![property.clone()],
            ..query.clone()
        };
        let alias = self.next_alias();
        let translation = self.translate(&projected, &alias, limit.is_some())?;
        let column = self.formatter().column(&alias, field);
        let parts = SelectParts {
            inner_fields: column.clone(),
            outer_fields: column,
            table: self.formatter().format_identifier(&entity.table),
            alias: &alias,
            join: translation.usable_join().to_string(),
            condition: translation.condition.clone(),
            compound: translation.condition_is_compound(),
            group: String::new(),
            combine: translation.combine.clone(),
            sort: translation.sort.clone(),
            distinct: query.distinct,
        };
        Ok(Fragment {
            text: parts.limited(limit),
            pre_scripts: translation.pre_scripts,
            has_or: false,
            recurse_object_name: translation.recurse_object_name,
            recurse_pet_name: translation.recurse_pet_name,
        })
    }
}
