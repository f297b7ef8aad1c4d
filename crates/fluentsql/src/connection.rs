//! Connection and statement contracts.
//!
//! The query builder only talks to a database through these two traits. A
//! backend implements [`Connection`] over its native client and hands out a
//! [`Statement`] from [`Connection::prepare`]; the builder binds named
//! parameters onto that statement and the caller executes it.
//!
//! All methods take `&self` so a builder can hold a shared reference to the
//! connection while the caller keeps driving transactions on it.

use crate::builder::QueryBuilder;
use crate::error::{DbError, DbResult};
use crate::value::Value;
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Standard SQL transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// The SQL keyword form, e.g. `READ COMMITTED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }

    /// The command that applies this level to the current transaction.
    pub fn set_transaction_sql(&self) -> String {
        format!("SET TRANSACTION ISOLATION LEVEL {};", self.as_str())
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IsolationLevel {
    type Err = DbError;

    /// Accepts the keyword form in any case, with `_` or `-` standing in for
    /// the space (`read_committed`, `REPEATABLE READ`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "READ UNCOMMITTED" => Ok(IsolationLevel::ReadUncommitted),
            "READ COMMITTED" => Ok(IsolationLevel::ReadCommitted),
            "REPEATABLE READ" => Ok(IsolationLevel::RepeatableRead),
            "SERIALIZABLE" => Ok(IsolationLevel::Serializable),
            _ => Err(DbError::validation(format!("unknown isolation level '{s}'"))),
        }
    }
}

/// Transaction sub-state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Idle,
    InTransaction,
}

impl TransactionState {
    /// Move `Idle -> InTransaction`.
    ///
    /// Fails with [`DbError::Transaction`] if a transaction is already open.
    pub fn begin(&mut self) -> DbResult<()> {
        match self {
            TransactionState::Idle => {
                *self = TransactionState::InTransaction;
                Ok(())
            }
            TransactionState::InTransaction => Err(DbError::transaction(
                "there is already an active transaction",
            )),
        }
    }

    /// Move `InTransaction -> Idle`.
    ///
    /// Fails with [`DbError::Transaction`] if no transaction is open.
    pub fn finish(&mut self) -> DbResult<()> {
        match self {
            TransactionState::InTransaction => {
                *self = TransactionState::Idle;
                Ok(())
            }
            TransactionState::Idle => Err(DbError::transaction("there is no active transaction")),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::InTransaction)
    }
}

/// A prepared command with named parameters.
pub trait Statement: Send {
    /// Bind `value` to the placeholder `name` (with or without the leading `:`).
    fn bind(&mut self, name: &str, value: Value) -> DbResult<()>;

    /// Execute the statement and return the number of affected rows.
    fn execute(&self) -> impl Future<Output = DbResult<u64>> + Send;
}

/// A database connection the query builder can prepare statements on.
pub trait Connection: Send + Sync {
    /// The statement type returned by [`Connection::prepare`].
    type Statement<'c>: Statement
    where
        Self: 'c;

    /// Apply an isolation level to the current (or next) transaction.
    fn set_isolation_level(
        &self,
        level: IsolationLevel,
    ) -> impl Future<Output = DbResult<()>> + Send;

    /// Start a transaction.
    fn begin_transaction(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Roll back the active transaction.
    fn rollback(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Commit the active transaction.
    fn commit(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Whether a transaction is currently open.
    fn in_transaction(&self) -> bool;

    /// Prepare `sql` (which may contain `:name` placeholders).
    fn prepare(&self, sql: &str) -> impl Future<Output = DbResult<Self::Statement<'_>>> + Send;

    /// The identifier generated by the most recent insert, as text.
    fn last_insert_id(&self) -> impl Future<Output = DbResult<String>> + Send;

    /// Run raw SQL without parameters, discarding any result.
    fn execute(&self, sql: &str) -> impl Future<Output = DbResult<()>> + Send;

    /// Start an empty [`QueryBuilder`] on this connection.
    fn builder(&self) -> QueryBuilder<'_, Self>
    where
        Self: Sized,
    {
        QueryBuilder::new(self)
    }
}
