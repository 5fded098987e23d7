//! Groups statements into round trips.

use tracing::debug;

use crate::ast::ScriptKind;
use crate::config::BatchConfig;
use crate::params::Parameters;
use crate::statement::{Compiled, ExecutionStatement};

const LINE_SEPARATOR: &str = "\n";

/// Accumulates statements into text-concatenated batches.
///
/// Either idle or holding one open batch; every flush moves the open batch
/// into the flushed list. Perform-alone statements close the open batch
/// and are flushed on their own.
#[derive(Debug)]
pub struct Batcher {
    max_statements: usize,
    max_parameters: usize,
    state: BatchState,
    flushed: Vec<ExecutionStatement>,
    next_parameter: usize,
}

#[derive(Debug)]
enum BatchState {
    Idle,
    Accumulating(OpenBatch),
}

#[derive(Debug, Default)]
struct OpenBatch {
    scripts: Vec<String>,
    parameters: Parameters,
    /// Any statement must affect data; checked against the batch's summed rows.
    must_affect_data: bool,
}

impl OpenBatch {
    fn append(&mut self, statement: ExecutionStatement) {
        self.scripts.push(statement.script);
        self.parameters.union(statement.parameters);
        self.must_affect_data |= statement.must_affect_data;
    }

    fn close(self) -> ExecutionStatement {
        ExecutionStatement {
            script: self.scripts.join(LINE_SEPARATOR),
            parameters: self.parameters,
            kind: ScriptKind::Text,
            must_affect_data: self.must_affect_data,
            has_pre_script: false,
            perform_alone: false,
        }
    }
}

impl Batcher {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            max_statements: config.statements_threshold(),
            max_parameters: config.parameters_threshold(),
            state: BatchState::Idle,
            flushed: Vec::new(),
            next_parameter: 0,
        }
    }

    /// Sequence the next compiled command should number parameters from.
    /// Restarts at 0 whenever no batch is open.
    pub fn parameter_offset(&self) -> usize {
        self.next_parameter
    }

    /// Add every statement of a compiled command.
    pub fn add(&mut self, compiled: Compiled) {
        for statement in compiled.statements {
            self.push(statement);
        }
        self.next_parameter = match self.state {
            BatchState::Idle => 0,
            BatchState::Accumulating(_) => compiled.next_parameter,
        };
    }

    pub fn push(&mut self, statement: ExecutionStatement) {
        if statement.perform_alone {
            self.flush();
            debug!("flushing perform-alone statement");
            self.flushed.push(statement);
            return;
        }

        let mut open = match std::mem::replace(&mut self.state, BatchState::Idle) {
            BatchState::Idle => OpenBatch::default(),
            BatchState::Accumulating(open) => open,
        };
        open.append(statement);
        if open.scripts.len() >= self.max_statements || open.parameters.len() >= self.max_parameters {
            self.close(open);
        } else {
            self.state = BatchState::Accumulating(open);
        }
    }

    /// Close the open batch, if any.
    pub fn flush(&mut self) {
        if let BatchState::Accumulating(open) = std::mem::replace(&mut self.state, BatchState::Idle) {
            self.close(open);
        }
    }

    fn close(&mut self, open: OpenBatch) {
        debug!(
            statements = open.scripts.len(),
            parameters = open.parameters.len(),
            "flushing batch"
        );
        self.flushed.push(open.close());
        self.next_parameter = 0;
    }

    /// Flush and return every batch in execution order.
    pub fn finish(mut self) -> Vec<ExecutionStatement> {
        self.flush();
        self.flushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;

    fn statement(script: &str, params: &[&str]) -> ExecutionStatement {
        let mut parameters = Parameters::new();
        for name in params {
            parameters.add(*name, Value::Int(1));
        }
        ExecutionStatement {
            script: script.to_string(),
            parameters,
            kind: ScriptKind::Text,
            must_affect_data: false,
            has_pre_script: false,
            perform_alone: false,
        }
    }

    fn batcher(statements: i64, parameters: i64) -> Batcher {
        Batcher::new(BatchConfig {
            group_statements_count: statements,
            group_parameters_count: parameters,
        })
    }

    #[test]
    fn test_statement_threshold() {
        let mut b = batcher(2, 100);
        b.push(statement("A", &["a0"]));
        b.push(statement("B", &["b1"]));
        b.push(statement("C", &["c0"]));
        let batches = b.finish();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].script, "A\nB");
        assert_eq!(batches[0].parameters.len(), 2);
        assert_eq!(batches[1].script, "C");
    }

    #[test]
    fn test_parameter_threshold() {
        let mut b = batcher(100, 3);
        b.push(statement("A", &["a0", "a1"]));
        b.push(statement("B", &["b2", "b3"]));
        b.push(statement("C", &["c0"]));
        let batches = b.finish();
        assert_eq!(batches.iter().map(|s| s.script.as_str()).collect::<Vec<_>>(), vec!["A\nB", "C"]);
    }

    #[test]
    fn test_perform_alone_flushes_open_batch() {
        let mut b = batcher(100, 100);
        b.push(statement("A", &[]));
        let mut alone = statement("ALONE", &[]);
        alone.perform_alone = true;
        b.push(alone);
        b.push(statement("B", &[]));
        let scripts: Vec<_> = b.finish().into_iter().map(|s| s.script).collect();
        assert_eq!(scripts, vec!["A", "ALONE", "B"]);
    }

    #[test]
    fn test_parameter_offset_resets_after_flush() {
        let mut b = batcher(2, 100);
        b.add(Compiled {
            statements: vec![statement("A", &["a0"])],
            next_parameter: 1,
        });
        assert_eq!(b.parameter_offset(), 1);
        b.add(Compiled {
            statements: vec![statement("B", &["b1"])],
            next_parameter: 2,
        });
        assert_eq!(b.parameter_offset(), 0);
    }

    #[test]
    fn test_must_affect_data_is_any() {
        let mut b = batcher(10, 10);
        b.push(statement("A", &[]));
        let mut must = statement("B", &[]);
        must.must_affect_data = true;
        b.push(must);
        assert!(b.finish()[0].must_affect_data);
    }
}
