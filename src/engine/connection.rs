//! Driver seam: the engine talks to Oracle only through these traits.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::ast::Value;
use crate::error::Result;
use crate::statement::ExecutionStatement;

/// One result row keyed by column label.
pub type Row = HashMap<String, Value>;

/// Isolation levels Oracle supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsolationLevel {
    ReadCommitted,
    Serializable,
}

impl IsolationLevel {
    /// Statement issued at the start of the transaction.
    pub fn to_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            IsolationLevel::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

/// A single database connection. Binding parameters and running scripts
/// is the driver's job; errors it raises are returned as [`crate::Error::Driver`].
#[async_trait]
pub trait Connection: Send {
    async fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// Run a non-query script and return the affected row count.
    async fn execute(&mut self, statement: &ExecutionStatement, cancel: &CancellationToken) -> Result<u64>;

    async fn query(&mut self, statement: &ExecutionStatement, cancel: &CancellationToken) -> Result<Vec<Row>>;

    /// First column of the first row.
    async fn scalar(&mut self, statement: &ExecutionStatement, cancel: &CancellationToken) -> Result<Value>;
}

/// Hands out one connection per top-level call.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_sql() {
        assert_eq!(
            IsolationLevel::ReadCommitted.to_sql(),
            "SET TRANSACTION ISOLATION LEVEL READ COMMITTED"
        );
        let level: IsolationLevel = serde_json::from_str("\"Serializable\"").unwrap();
        assert_eq!(level.to_sql(), "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE");
    }
}
