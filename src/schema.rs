//! Entity metadata: column names, keys and role flags.
//!
//! The surrounding access layer owns entity definitions; this module only
//! holds what the translator needs to resolve properties into columns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::Value;
use crate::error::{Error, Result};

/// Role flags of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRole {
    pub primary_key: bool,
    pub auto_increment: bool,
    /// Value selects the physical table.
    pub split: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityField {
    pub property: String,
    pub column: String,
    #[serde(default)]
    pub role: FieldRole,
    /// Output template, `{0}` is replaced by the qualified column.
    #[serde(default)]
    pub query_format: Option<String>,
}

impl EntityField {
    pub fn new(property: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            column: column.into(),
            role: FieldRole::default(),
            query_format: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.role.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.role.auto_increment = true;
        self
    }

    pub fn split(mut self) -> Self {
        self.role.split = true;
        self
    }

    pub fn format(mut self, template: impl Into<String>) -> Self {
        self.query_format = Some(template.into());
        self
    }
}

/// Declared link from one of this entity's fields to a field of another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub field: String,
    pub target_entity: String,
    pub target_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub table: String,
    pub fields: Vec<EntityField>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Entity {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn field(mut self, field: EntityField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(
        mut self,
        field: impl Into<String>,
        target_entity: impl Into<String>,
        target_field: impl Into<String>,
    ) -> Self {
        self.relations.push(Relation {
            field: field.into(),
            target_entity: target_entity.into(),
            target_field: target_field.into(),
        });
        self
    }

    pub fn get_field(&self, property: &str) -> Result<&EntityField> {
        self.fields
            .iter()
            .find(|f| f.property == property)
            .ok_or_else(|| Error::unknown_field(&self.name, property))
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &EntityField> {
        self.fields.iter().filter(|f| f.role.primary_key)
    }

    /// Primary keys, or an error naming the entity when none are declared.
    pub fn require_primary_keys(&self) -> Result<Vec<&EntityField>> {
        let keys: Vec<_> = self.primary_keys().collect();
        if keys.is_empty() {
            return Err(Error::MissingPrimaryKey(self.name.clone()));
        }
        Ok(keys)
    }

    pub fn auto_increment_field(&self) -> Option<&EntityField> {
        let mut candidates = self.fields.iter().filter(|f| f.role.auto_increment);
        let first = candidates.next()?;
        // prefer a primary key when several fields are auto-generated
        Some(
            std::iter::once(first)
                .chain(candidates)
                .find(|f| f.role.primary_key)
                .unwrap_or(first),
        )
    }

    pub fn split_field(&self) -> Option<&EntityField> {
        self.fields.iter().find(|f| f.role.split)
    }

    /// First primary key, else first field.
    pub fn default_field(&self) -> Option<&EntityField> {
        self.primary_keys().next().or_else(|| self.fields.first())
    }

    /// Fields projected when a query names none.
    pub fn query_fields<'a>(&'a self, properties: &[String]) -> Result<Vec<&'a EntityField>> {
        if properties.is_empty() {
            return Ok(self.fields.iter().collect());
        }
        properties.iter().map(|p| self.get_field(p)).collect()
    }

    /// Physical tables addressed by the given split values.
    pub fn table_names(&self, split_values: &[Value]) -> Result<Vec<String>> {
        if self.split_field().is_none() {
            return Ok(vec![self.table.clone()]);
        }
        if split_values.is_empty() {
            return Err(Error::MissingSplitValue(self.name.clone()));
        }
        let mut tables: Vec<String> = Vec::with_capacity(split_values.len());
        for value in split_values {
            if value.is_null() {
                return Err(Error::MissingSplitValue(self.name.clone()));
            }
            let table = format!("{}_{}", self.table, value.as_text());
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        Ok(tables)
    }

    /// (this field, target field) pairs declared from this entity to `target`.
    pub fn relation_fields(&self, target: &str) -> Vec<(String, String)> {
        self.relations
            .iter()
            .filter(|r| r.target_entity == target)
            .map(|r| (r.field.clone(), r.target_field.clone()))
            .collect()
    }
}

/// Entity registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    entities: HashMap<String, Entity>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: Entity) {
        self.entities.insert(entity.name.clone(), entity);
    }

    pub fn with(mut self, entity: Entity) -> Self {
        self.register(entity);
        self
    }

    pub fn entity(&self, name: &str) -> Result<&Entity> {
        self.entities
            .get(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<Entity> for Schema {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for entity in iter {
            schema.register(entity);
        }
        schema
    }
}
