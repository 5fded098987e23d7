//! # qail-oracle
//!
//! Compiles a database-agnostic query/command IR into Oracle SQL with
//! named parameters, then batches and transactionally executes the
//! resulting statements through a pluggable [`Connection`](engine::Connection).
//!
//! ## Quick Example
//!
//! ```rust
//! use qail_oracle::prelude::*;
//!
//! let schema = Schema::new().with(
//!     Entity::new("User", "users")
//!         .field(EntityField::new("Id", "id").primary_key())
//!         .field(EntityField::new("Name", "name"))
//!         .field(EntityField::new("Age", "age")),
//! );
//!
//! let query = Query::new("User")
//!     .where_eq("Name", "a")
//!     .filter("Age", Operator::GreaterThan, 18)
//!     .columns(["Id"]);
//!
//! let statement = StatementBuilder::new(&schema, OracleOptions::default())
//!     .query(&query)
//!     .unwrap();
//! assert_eq!(
//!     statement.script,
//!     "SELECT TB.\"ID\" AS \"Id\" FROM \"USERS\" TB WHERE TB.\"NAME\" = :Name0 AND TB.\"AGE\" > :Age1"
//! );
//! ```

pub mod ast;
pub mod bulk;
pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod schema;
pub mod statement;
pub mod transpiler;

#[cfg(test)]
mod fixtures;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::{BatchConfig, Config, OracleOptions};
    pub use crate::engine::{
        Connection, ConnectionProvider, ExecutionOptions, IsolationLevel, OracleEngine, Row,
    };
    pub use crate::error::Error;
    pub use crate::params::{Direction, Parameter, Parameters};
    pub use crate::schema::{Entity, EntityField, Schema};
    pub use crate::statement::{ExecutionStatement, StatementBuilder};
    pub use crate::transpiler::{Formatter, TranslationContext};
}
