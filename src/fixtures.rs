//! Shared entity fixtures for unit tests.

use crate::config::OracleOptions;
use crate::schema::{Entity, EntityField, Schema};
use crate::statement::StatementBuilder;
use crate::transpiler::TranslationContext;

pub fn schema() -> Schema {
    Schema::new()
        .with(
            Entity::new("User", "users")
                .field(EntityField::new("Id", "ID").primary_key())
                .field(EntityField::new("Name", "name"))
                .field(EntityField::new("Age", "AGE"))
                .field(EntityField::new("Email", "EMAIL"))
                .field(EntityField::new("Timeout", "TIMEOUT")),
        )
        .with(
            Entity::new("Order", "orders")
                .field(EntityField::new("Id", "ID").primary_key().auto_increment())
                .field(EntityField::new("UserId", "USER_ID"))
                .field(EntityField::new("Amount", "AMOUNT"))
                .field(EntityField::new("Status", "STATUS"))
                .relation("UserId", "User", "Id"),
        )
        .with(
            Entity::new("Department", "departments")
                .field(EntityField::new("Id", "ID").primary_key())
                .field(EntityField::new("ParentId", "PARENT_ID"))
                .field(EntityField::new("Name", "NAME")),
        )
        .with(
            Entity::new("Log", "logs")
                .field(EntityField::new("Id", "ID").primary_key())
                .field(EntityField::new("Region", "REGION").split())
                .field(EntityField::new("Message", "MESSAGE")),
        )
        .with(
            Entity::new("Audit", "audits")
                .field(EntityField::new("Id", "ID").primary_key().auto_increment())
                .field(EntityField::new("Tenant", "TENANT").split()),
        )
        .with(
            Entity::new("Note", "notes")
                .field(EntityField::new("Text", "TEXT")),
        )
}

pub fn context(schema: &Schema) -> TranslationContext<'_> {
    TranslationContext::new(schema, OracleOptions::default())
}

pub fn builder(schema: &Schema) -> StatementBuilder<'_> {
    StatementBuilder::new(schema, OracleOptions::default())
}
