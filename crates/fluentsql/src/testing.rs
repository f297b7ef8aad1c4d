//! In-memory connection that records every call, for unit tests.

use crate::connection::{Connection, IsolationLevel, Statement, TransactionState};
use crate::error::{DbError, DbResult};
use crate::value::Value;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub(crate) struct RecordingConnection {
    events: Mutex<Vec<String>>,
    state: Mutex<TransactionState>,
    fail_prepare: bool,
    fail_commit: bool,
}

impl RecordingConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_prepare() -> Self {
        Self {
            fail_prepare: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_commit() -> Self {
        Self {
            fail_commit: true,
            ..Self::default()
        }
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

#[derive(Debug)]
pub(crate) struct RecordingStatement<'c> {
    conn: &'c RecordingConnection,
    pub(crate) sql: String,
    pub(crate) bound: Vec<(String, Value)>,
}

impl Statement for RecordingStatement<'_> {
    fn bind(&mut self, name: &str, value: Value) -> DbResult<()> {
        self.bound.push((name.to_string(), value));
        Ok(())
    }

    async fn execute(&self) -> DbResult<u64> {
        self.conn.record(format!("execute-statement {}", self.sql));
        Ok(1)
    }
}

impl Connection for RecordingConnection {
    type Statement<'c> = RecordingStatement<'c>;

    async fn set_isolation_level(&self, level: IsolationLevel) -> DbResult<()> {
        self.record(level.set_transaction_sql());
        Ok(())
    }

    async fn begin_transaction(&self) -> DbResult<()> {
        self.state.lock().unwrap().begin()?;
        self.record("BEGIN");
        Ok(())
    }

    async fn rollback(&self) -> DbResult<()> {
        self.state.lock().unwrap().finish()?;
        self.record("ROLLBACK");
        Ok(())
    }

    async fn commit(&self) -> DbResult<()> {
        if self.fail_commit {
            return Err(DbError::Other("commit refused".to_string()));
        }
        self.state.lock().unwrap().finish()?;
        self.record("COMMIT");
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.state.lock().unwrap().is_active()
    }

    async fn prepare(&self, sql: &str) -> DbResult<RecordingStatement<'_>> {
        if self.fail_prepare {
            return Err(DbError::Other(format!("cannot prepare: {sql}")));
        }
        self.record(format!("prepare {sql}"));
        Ok(RecordingStatement {
            conn: self,
            sql: sql.to_string(),
            bound: Vec::new(),
        })
    }

    async fn last_insert_id(&self) -> DbResult<String> {
        Ok("1".to_string())
    }

    async fn execute(&self, sql: &str) -> DbResult<()> {
        self.record(format!("execute {sql}"));
        Ok(())
    }
}
