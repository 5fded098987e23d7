//! Engine integration tests against a recording in-memory connection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use qail_oracle::engine::{ExecutionOptions, OracleEngine, Page};
use qail_oracle::prelude::*;
use qail_oracle::statement::TOTAL_COUNT_COLUMN;
use qail_oracle::Result;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Begin(Option<IsolationLevel>),
    Commit,
    Rollback,
    Execute(String),
    Query(String),
    Scalar(String),
}

/// Scripted driver behavior shared by every connection it hands out.
#[derive(Default)]
struct MockProvider {
    calls: Arc<Mutex<Vec<Call>>>,
    /// Rows reported per execute; 1 once exhausted.
    affected: Vec<u64>,
    /// Execute index that fails with a driver error.
    fail_on: Option<usize>,
    /// Token cancelled while the first execute runs.
    cancel_during_execute: Option<CancellationToken>,
    /// Execute never completes, like a statement stuck on a lock.
    hang: bool,
    rows: Vec<Row>,
    scalar: Option<Value>,
}

impl MockProvider {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

struct MockConnection {
    calls: Arc<Mutex<Vec<Call>>>,
    affected: VecDeque<u64>,
    fail_on: Option<usize>,
    cancel_during_execute: Option<CancellationToken>,
    hang: bool,
    executed: usize,
    rows: Vec<Row>,
    scalar: Value,
}

impl MockConnection {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<()> {
        self.record(Call::Begin(isolation));
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.record(Call::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.record(Call::Rollback);
        Ok(())
    }

    async fn execute(&mut self, statement: &ExecutionStatement, _cancel: &CancellationToken) -> Result<u64> {
        self.record(Call::Execute(statement.script.clone()));
        let index = self.executed;
        self.executed += 1;
        if let Some(token) = self.cancel_during_execute.take() {
            token.cancel();
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail_on == Some(index) {
            return Err(Error::driver(std::io::Error::other(
                "ORA-00001: unique constraint violated",
            )));
        }
        Ok(self.affected.pop_front().unwrap_or(1))
    }

    async fn query(&mut self, statement: &ExecutionStatement, _cancel: &CancellationToken) -> Result<Vec<Row>> {
        self.record(Call::Query(statement.script.clone()));
        Ok(self.rows.clone())
    }

    async fn scalar(&mut self, statement: &ExecutionStatement, _cancel: &CancellationToken) -> Result<Value> {
        self.record(Call::Scalar(statement.script.clone()));
        Ok(self.scalar.clone())
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(MockConnection {
            calls: Arc::clone(&self.calls),
            affected: self.affected.iter().copied().collect(),
            fail_on: self.fail_on,
            cancel_during_execute: self.cancel_during_execute.clone(),
            hang: self.hang,
            executed: 0,
            rows: self.rows.clone(),
            scalar: self.scalar.clone().unwrap_or(Value::Null),
        }))
    }
}

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new().with(
            Entity::new("Department", "departments")
                .field(EntityField::new("Id", "ID").primary_key())
                .field(EntityField::new("ParentId", "PARENT_ID"))
                .field(EntityField::new("Name", "NAME")),
        ),
    )
}

fn engine(provider: Arc<MockProvider>, group_statements: i64) -> OracleEngine {
    let config = Config::builder().group_statements(group_statements).build();
    OracleEngine::new(schema(), config, provider)
}

fn insert(id: i64) -> Command {
    Command::insert("Department")
        .value("Id", id)
        .value("Name", format!("d{}", id))
        .build()
}

const INSERT_FIRST: &str =
    "INSERT INTO \"DEPARTMENTS\" (\"ID\", \"PARENT_ID\", \"NAME\") VALUES (:Id0, :ParentId1, :Name2)";
const INSERT_SECOND: &str =
    "INSERT INTO \"DEPARTMENTS\" (\"ID\", \"PARENT_ID\", \"NAME\") VALUES (:Id3, :ParentId4, :Name5)";

#[tokio::test]
async fn test_batches_run_in_one_transaction() {
    let provider = Arc::new(MockProvider {
        affected: vec![2, 1],
        ..Default::default()
    });
    let engine = engine(Arc::clone(&provider), 2);

    let affected = engine
        .execute(&[insert(1), insert(2), insert(3)], &ExecutionOptions::default())
        .await
        .unwrap();

    assert_eq!(affected, 3);
    assert_eq!(
        provider.calls(),
        vec![
            Call::Begin(None),
            Call::Execute(format!("{}\n{}", INSERT_FIRST, INSERT_SECOND)),
            // numbering restarts once a batch is flushed
            Call::Execute(INSERT_FIRST.to_string()),
            Call::Commit,
        ]
    );
}

#[tokio::test]
async fn test_single_statement_skips_transaction() {
    let provider = Arc::new(MockProvider::default());
    let engine = engine(Arc::clone(&provider), 10);

    let affected = engine.execute(&[insert(1)], &ExecutionOptions::default()).await.unwrap();

    assert_eq!(affected, 1);
    assert_eq!(provider.calls(), vec![Call::Execute(INSERT_FIRST.to_string())]);
}

#[tokio::test]
async fn test_forced_transaction_with_isolation() {
    let provider = Arc::new(MockProvider::default());
    let engine = engine(Arc::clone(&provider), 10);
    let options = ExecutionOptions::default()
        .transaction(true)
        .isolation(IsolationLevel::Serializable);

    engine.execute(&[insert(1)], &options).await.unwrap();

    assert_eq!(
        provider.calls(),
        vec![
            Call::Begin(Some(IsolationLevel::Serializable)),
            Call::Execute(INSERT_FIRST.to_string()),
            Call::Commit,
        ]
    );
}

#[tokio::test]
async fn test_zero_rows_rolls_back() {
    let provider = Arc::new(MockProvider {
        affected: vec![0],
        ..Default::default()
    });
    let engine = engine(Arc::clone(&provider), 1);

    let affected = engine
        .execute(&[insert(1), insert(2)], &ExecutionOptions::default())
        .await
        .unwrap();

    assert_eq!(affected, 0);
    assert_eq!(
        provider.calls(),
        vec![
            Call::Begin(None),
            Call::Execute(INSERT_FIRST.to_string()),
            Call::Rollback,
        ]
    );
}

#[tokio::test]
async fn test_grouped_batch_checked_on_summed_rows() {
    let provider = Arc::new(MockProvider {
        affected: vec![1, 0],
        ..Default::default()
    });
    let grouped = engine(Arc::clone(&provider), 2);

    // the batch of two reports one row, so the must-affect check passes
    let affected = grouped
        .execute(&[insert(1), insert(2)], &ExecutionOptions::default())
        .await
        .unwrap();
    assert_eq!(affected, 1);
    assert_eq!(provider.calls().last(), Some(&Call::Commit));

    // one statement per round trip catches the zero-row insert
    let provider = Arc::new(MockProvider {
        affected: vec![1, 0],
        ..Default::default()
    });
    let single = engine(Arc::clone(&provider), 1);
    let affected = single
        .execute(&[insert(1), insert(2)], &ExecutionOptions::default())
        .await
        .unwrap();
    assert_eq!(affected, 0);
    assert_eq!(provider.calls().last(), Some(&Call::Rollback));
}

#[tokio::test]
async fn test_zero_rows_without_transaction_continues() {
    let provider = Arc::new(MockProvider {
        affected: vec![0, 1],
        ..Default::default()
    });
    let engine = engine(Arc::clone(&provider), 1);
    let options = ExecutionOptions::default().transaction(false);

    let affected = engine.execute(&[insert(1), insert(2)], &options).await.unwrap();

    assert_eq!(affected, 1);
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_allow_no_rows_commits() {
    let provider = Arc::new(MockProvider {
        affected: vec![0, 0],
        ..Default::default()
    });
    let engine = engine(Arc::clone(&provider), 1);
    let commands = vec![
        Command::delete("Department").allow_no_rows().build(),
        Command::update("Department")
            .set_value("Name", "x")
            .allow_no_rows()
            .build(),
    ];

    let affected = engine.execute(&commands, &ExecutionOptions::default()).await.unwrap();

    assert_eq!(affected, 0);
    assert_eq!(provider.calls().last(), Some(&Call::Commit));
}

#[tokio::test]
async fn test_driver_error_rolls_back_and_propagates() {
    let provider = Arc::new(MockProvider {
        fail_on: Some(1),
        ..Default::default()
    });
    let engine = engine(Arc::clone(&provider), 1);

    let err = engine
        .execute(&[insert(1), insert(2), insert(3)], &ExecutionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Driver(_)));
    assert_eq!(err.to_string(), "ORA-00001: unique constraint violated");
    let calls = provider.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls.last(), Some(&Call::Rollback));
}

#[tokio::test]
async fn test_cancellation_between_batches() {
    let token = CancellationToken::new();
    let provider = Arc::new(MockProvider {
        cancel_during_execute: Some(token.clone()),
        ..Default::default()
    });
    let engine = engine(Arc::clone(&provider), 1);
    let options = ExecutionOptions::default().cancel(token);

    let err = engine
        .execute(&[insert(1), insert(2)], &options)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(
        provider.calls(),
        vec![
            Call::Begin(None),
            Call::Execute(INSERT_FIRST.to_string()),
            Call::Rollback,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_running_statement() {
    let token = CancellationToken::new();
    let provider = Arc::new(MockProvider {
        hang: true,
        ..Default::default()
    });
    let engine = engine(Arc::clone(&provider), 1);
    let options = ExecutionOptions::default().cancel(token.clone());
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        token.cancel();
    });

    let err = engine
        .execute(&[insert(1), insert(2)], &options)
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(
        provider.calls(),
        vec![
            Call::Begin(None),
            Call::Execute(INSERT_FIRST.to_string()),
            Call::Rollback,
        ]
    );
}

#[tokio::test]
async fn test_translation_error_runs_nothing() {
    let provider = Arc::new(MockProvider::default());
    let engine = engine(Arc::clone(&provider), 10);
    let commands = vec![insert(1), Command::update("Department").build()];

    let err = engine.execute(&commands, &ExecutionOptions::default()).await.unwrap_err();

    assert!(err.is_configuration());
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_query_paging_strips_total() {
    let mut row = Row::new();
    row.insert("Name".to_string(), Value::from("a"));
    row.insert(TOTAL_COUNT_COLUMN.to_string(), Value::Int(42));
    let provider = Arc::new(MockProvider {
        rows: vec![row.clone(), row],
        ..Default::default()
    });
    let engine = engine(Arc::clone(&provider), 10);
    let query = Query::new("Department").columns(["Name"]);

    let page: Page = engine
        .query_paging(&query, Paging::page(1, 2), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.total, 42);
    assert_eq!(page.rows.len(), 2);
    assert!(page.rows.iter().all(|r| !r.contains_key(TOTAL_COUNT_COLUMN)));
    assert!(matches!(&provider.calls()[0], Call::Query(sql) if sql.contains("BETWEEN 1 AND 2")));
}

#[tokio::test]
async fn test_scalar_shapes() {
    let provider = Arc::new(MockProvider {
        scalar: Some(Value::Int(1)),
        ..Default::default()
    });
    let engine = engine(Arc::clone(&provider), 10);
    let cancel = CancellationToken::new();
    let query = Query::new("Department").where_eq("Name", "root");

    assert!(engine.exists(&query, &cancel).await.unwrap());
    assert_eq!(engine.count(&query, &cancel).await.unwrap(), 1);

    let calls = provider.calls();
    assert!(matches!(&calls[0], Call::Scalar(sql) if sql.starts_with("SELECT CASE WHEN EXISTS(")));
    assert!(matches!(&calls[1], Call::Scalar(sql) if sql.starts_with("SELECT COUNT(1) FROM (")));
}

#[tokio::test]
async fn test_empty_command_list() {
    let provider = Arc::new(MockProvider::default());
    let engine = engine(Arc::clone(&provider), 10);
    assert_eq!(engine.execute(&[], &ExecutionOptions::default()).await.unwrap(), 0);
    assert!(provider.calls().is_empty());
}
