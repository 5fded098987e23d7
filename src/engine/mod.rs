//! Execution engine: compiles commands, batches them and runs them on one
//! connection, inside a transaction when more than one statement runs.
//!
//! - `batch.rs` - statement grouping
//! - `connection.rs` - driver traits

mod batch;
mod connection;

pub use batch::Batcher;
pub use connection::{Connection, ConnectionProvider, IsolationLevel, Row};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ast::{AggregateFunc, Command, Output, Paging, Query, Value};
use crate::config::{BatchConfig, Config};
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::statement::{ExecutionStatement, StatementBuilder, TOTAL_COUNT_COLUMN};

/// Per-call execution switches.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Force a transaction on or off; `None` uses one for more than one statement.
    pub transaction: Option<bool>,
    pub isolation: Option<IsolationLevel>,
    pub cancel: CancellationToken,
}

impl ExecutionOptions {
    pub fn transaction(mut self, on: bool) -> Self {
        self.transaction = Some(on);
        self
    }

    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

/// One page of rows plus the total matching row count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub rows: Vec<Row>,
    pub total: u64,
}

/// Oracle execution engine.
#[derive(Clone)]
pub struct OracleEngine {
    schema: Arc<Schema>,
    config: Config,
    provider: Arc<dyn ConnectionProvider>,
}

impl OracleEngine {
    pub fn new(schema: Arc<Schema>, config: Config, provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            schema,
            config,
            provider,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn builder(&self) -> StatementBuilder<'_> {
        StatementBuilder::new(&self.schema, self.config.oracle)
    }

    // ==================== COMPILE ====================

    /// Compile commands into the batches [`OracleEngine::execute`] would run,
    /// together with the number of statements before batching.
    pub fn compile_commands(&self, commands: &[Command]) -> Result<(Vec<ExecutionStatement>, usize)> {
        compile_batches(&self.builder(), self.config.batch, commands)
    }

    pub fn compile_query(&self, query: &Query) -> Result<ExecutionStatement> {
        self.builder().query(query)
    }

    // ==================== EXECUTE ====================

    /// Execute commands and return the affected row count, 0 when a
    /// transaction was rolled back because a statement changed no rows.
    pub async fn execute(&self, commands: &[Command], options: &ExecutionOptions) -> Result<u64> {
        if commands.is_empty() {
            return Ok(0);
        }
        let (batches, statements) = self.compile_commands(commands)?;
        let use_transaction = options.transaction.unwrap_or(statements > 1);
        let mut connection = self.provider.connect().await?;
        run_batches(connection.as_mut(), &batches, use_transaction, options).await
    }

    // ==================== QUERY ====================

    pub async fn query(&self, query: &Query, cancel: &CancellationToken) -> Result<Vec<Row>> {
        let statement = self.compile_query(&shaped(query, Output::Rows))?;
        let mut connection = self.provider.connect().await?;
        cancellable(cancel, connection.query(&statement, cancel)).await
    }

    /// Rows of one page; the synthetic total column is removed from each row.
    pub async fn query_paging(&self, query: &Query, paging: Paging, cancel: &CancellationToken) -> Result<Page> {
        let mut paged = shaped(query, Output::Rows);
        paged.paging = Some(paging);
        let statement = self.compile_query(&paged)?;
        let mut connection = self.provider.connect().await?;
        let mut rows = cancellable(cancel, connection.query(&statement, cancel)).await?;
        let mut total = 0;
        for row in &mut rows {
            if let Some(value) = row.remove(TOTAL_COUNT_COLUMN) {
                total = as_count(&value)?;
            }
        }
        Ok(Page { rows, total })
    }

    pub async fn count(&self, query: &Query, cancel: &CancellationToken) -> Result<u64> {
        let value = self.scalar(&shaped(query, Output::Count), cancel).await?;
        as_count(&value)
    }

    pub async fn exists(&self, query: &Query, cancel: &CancellationToken) -> Result<bool> {
        let value = self.scalar(&shaped(query, Output::Exists), cancel).await?;
        Ok(as_count(&value)? > 0)
    }

    pub async fn aggregate(&self, query: &Query, function: AggregateFunc, cancel: &CancellationToken) -> Result<Value> {
        self.scalar(&shaped(query, Output::Aggregate(function)), cancel).await
    }

    async fn scalar(&self, query: &Query, cancel: &CancellationToken) -> Result<Value> {
        let statement = self.compile_query(query)?;
        let mut connection = self.provider.connect().await?;
        cancellable(cancel, connection.scalar(&statement, cancel)).await
    }
}

/// Compile commands in order and group the statements into batches.
/// Also returns the number of statements before batching.
pub fn compile_batches(
    builder: &StatementBuilder<'_>,
    config: BatchConfig,
    commands: &[Command],
) -> Result<(Vec<ExecutionStatement>, usize)> {
    let mut batcher = Batcher::new(config);
    let mut statements = 0;
    for command in commands {
        let compiled = builder.command(command, batcher.parameter_offset())?;
        statements += compiled.statements.len();
        batcher.add(compiled);
    }
    Ok((batcher.finish(), statements))
}

fn shaped(query: &Query, output: Output) -> Query {
    let mut query = query.clone();
    query.output = output;
    query
}

fn as_count(value: &Value) -> Result<u64> {
    match value {
        Value::Int(n) if *n >= 0 => Ok(*n as u64),
        Value::Float(n) if *n >= 0.0 => Ok(*n as u64),
        Value::Null => Ok(0),
        other => Err(Error::InvalidValue(format!("expected a count, got {}", other))),
    }
}

/// Run batches in order on one connection.
///
/// Inside a transaction the first batch that must affect data but changes
/// no rows stops execution, rolls back and yields 0. Driver errors and
/// cancellation roll back and are returned unchanged.
pub async fn run_batches(
    connection: &mut dyn Connection,
    batches: &[ExecutionStatement],
    use_transaction: bool,
    options: &ExecutionOptions,
) -> Result<u64> {
    if use_transaction {
        connection.begin(options.isolation).await?;
        info!(batches = batches.len(), "transaction started");
    }

    let mut affected = 0;
    let mut success = true;
    for batch in batches {
        if options.cancel.is_cancelled() {
            return abort(connection, use_transaction, Error::Cancelled).await;
        }
        let rows = match cancellable(&options.cancel, connection.execute(batch, &options.cancel)).await {
            Ok(rows) => rows,
            Err(err) => return abort(connection, use_transaction, err).await,
        };
        debug!(rows, must_affect_data = batch.must_affect_data, "batch executed");
        affected += rows;
        if batch.must_affect_data && rows == 0 {
            success = false;
            if use_transaction {
                warn!("statement affected no rows, rolling back");
                break;
            }
        }
    }

    if !use_transaction {
        return Ok(affected);
    }
    if success {
        connection.commit().await?;
        info!(affected, "transaction committed");
        Ok(affected)
    } else {
        connection.rollback().await?;
        info!("transaction rolled back");
        Ok(0)
    }
}

/// Await a driver call, giving up with `Cancelled` as soon as `cancel` fires.
/// The dropped call is left to the driver to abandon.
async fn cancellable<T>(cancel: &CancellationToken, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        result = call => result,
        _ = cancel.cancelled() => Err(Error::Cancelled),
    }
}

async fn abort(connection: &mut dyn Connection, use_transaction: bool, err: Error) -> Result<u64> {
    if use_transaction {
        match connection.rollback().await {
            Ok(()) => info!(error = %err, "transaction rolled back"),
            Err(rollback) => warn!(error = %rollback, "rollback failed"),
        }
    }
    Err(err)
}
