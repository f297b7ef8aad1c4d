//! Postgres backend over `tokio-postgres`.
//!
//! [`PgConnection`] implements [`Connection`] on a single tokio-postgres
//! client. Named `:placeholders` are rewritten to `$n` when a statement is
//! prepared, and transactions are driven with plain `BEGIN` / `COMMIT` /
//! `ROLLBACK` so the connection can be shared by reference.
//!
//! # Example
//!
//! ```ignore
//! use fluentsql::pg::PgConnection;
//! use fluentsql::{Connection, Statement, params};
//!
//! let conn = PgConnection::connect("postgres://postgres@localhost/app").await?;
//! let mut qb = conn.builder();
//! qb.insert("users")
//!     .values(params! { "name" => "alice" })
//!     .prepare()
//!     .await?
//!     .execute()
//!     .await?;
//! let id = conn.last_insert_id().await?;
//! ```

mod config;
mod placeholder;
mod statement;

pub use config::ConnectOptions;
pub use placeholder::{NamedSql, rewrite_named};
pub use statement::PgStatement;

use crate::connection::{Connection, IsolationLevel, TransactionState};
use crate::error::{DbError, DbResult};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};
use tokio_postgres::{Client, NoTls, Socket};

/// SQLSTATE `55000`, raised by `lastval()` before any sequence was used.
const OBJECT_NOT_IN_PREREQUISITE_STATE: &str = "55000";

#[derive(Debug, Default)]
struct PgState {
    tx: TransactionState,
    /// Level requested while idle, applied right after the next `BEGIN`.
    pending_isolation: Option<IsolationLevel>,
}

impl PgState {
    /// Mark the transaction open and take the level requested for it.
    fn open(&mut self) -> DbResult<Option<IsolationLevel>> {
        self.tx.begin()?;
        Ok(self.pending_isolation.take())
    }

    /// Undo [`PgState::open`] after `BEGIN` or its isolation command failed.
    fn abort_open(&mut self, pending: Option<IsolationLevel>) {
        self.tx = TransactionState::Idle;
        self.pending_isolation = pending;
    }
}

/// A Postgres connection implementing [`Connection`].
///
/// Dropping the connection aborts the spawned connection task, which closes
/// the session; an open transaction is rolled back by the server.
pub struct PgConnection {
    client: Client,
    state: Mutex<PgState>,
    options: ConnectOptions,
    driver: Option<JoinHandle<()>>,
}

impl PgConnection {
    /// Connect with default options and no TLS.
    pub async fn connect(dsn: &str) -> DbResult<Self> {
        Self::connect_with(dsn, ConnectOptions::default()).await
    }

    /// Connect with the given options and no TLS.
    pub async fn connect_with(dsn: &str, options: ConnectOptions) -> DbResult<Self> {
        Self::connect_with_tls(dsn, NoTls, options).await
    }

    /// Connect using a custom TLS connector.
    ///
    /// The connection future is spawned on the current tokio runtime.
    pub async fn connect_with_tls<T>(dsn: &str, tls: T, options: ConnectOptions) -> DbResult<Self>
    where
        T: MakeTlsConnect<Socket>,
        T::Stream: Send + 'static,
        T::TlsConnect: Send,
        <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
    {
        let config: tokio_postgres::Config = dsn
            .parse()
            .map_err(|e: tokio_postgres::Error| DbError::Connection(e.to_string()))?;
        let (client, connection) = config
            .connect(tls)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                #[cfg(feature = "tracing")]
                tracing::error!(target: "fluentsql.sql", error = %e, "postgres connection error");
                #[cfg(not(feature = "tracing"))]
                let _ = e;
            }
        });

        let mut conn = Self::from_client(client, options);
        conn.driver = Some(driver);

        if let Some(sql) = conn.options.session_sql() {
            conn.client
                .batch_execute(&sql)
                .await
                .map_err(DbError::from_db_error)?;
        }

        Ok(conn)
    }

    /// Wrap an already connected client. The caller keeps driving its
    /// connection future. `ConnectOptions::statement_timeout` is not applied.
    pub fn from_client(client: Client, options: ConnectOptions) -> Self {
        Self {
            client,
            state: Mutex::new(PgState::default()),
            options,
            driver: None,
        }
    }

    /// The underlying tokio-postgres client.
    pub fn native(&self) -> &Client {
        &self.client
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    fn state(&self) -> MutexGuard<'_, PgState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log_sql(&self, action: &'static str, sql: &str) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "fluentsql.sql",
            action,
            sql = %self.options.truncate_for_log(sql),
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (action, sql);
    }

    async fn run_control(&self, sql: &str) -> DbResult<()> {
        self.log_sql("transaction", sql);
        self.client
            .batch_execute(sql)
            .await
            .map_err(DbError::from_db_error)
    }

    /// Current value of a named sequence in this session, as text.
    pub async fn last_insert_id_of(&self, sequence: &str) -> DbResult<String> {
        let row = self
            .client
            .query_one("SELECT currval($1::regclass)::text", &[&sequence])
            .await
            .map_err(DbError::from_db_error)?;
        Ok(row.try_get(0)?)
    }

    /// Roll back an open transaction, then close the session and wait for
    /// the connection task to finish.
    pub async fn close(mut self) -> DbResult<()> {
        if self.in_transaction() {
            self.rollback().await?;
        }
        let driver = self.driver.take();
        drop(self);
        if let Some(driver) = driver {
            driver
                .await
                .map_err(|e| DbError::Connection(e.to_string()))?;
        }
        Ok(())
    }
}

impl Connection for PgConnection {
    type Statement<'c> = PgStatement<'c>;

    async fn set_isolation_level(&self, level: IsolationLevel) -> DbResult<()> {
        let active = {
            let mut state = self.state();
            if !state.tx.is_active() {
                state.pending_isolation = Some(level);
            }
            state.tx.is_active()
        };

        if active {
            self.run_control(&level.set_transaction_sql()).await?;
        }
        Ok(())
    }

    async fn begin_transaction(&self) -> DbResult<()> {
        let pending = self.state().open()?;

        if let Err(e) = self.run_control("BEGIN").await {
            self.state().abort_open(pending);
            return Err(e);
        }
        if let Some(level) = pending.or(self.options.isolation_level) {
            if let Err(e) = self.run_control(&level.set_transaction_sql()).await {
                if let Err(_rollback) = self.run_control("ROLLBACK").await {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        target: "fluentsql.sql",
                        error = %_rollback,
                        "rollback after failed isolation level also failed"
                    );
                }
                self.state().abort_open(pending);
                return Err(e);
            }
        }
        Ok(())
    }

    async fn rollback(&self) -> DbResult<()> {
        self.state().tx.finish()?;
        self.run_control("ROLLBACK").await
    }

    async fn commit(&self) -> DbResult<()> {
        self.state().tx.finish()?;
        self.run_control("COMMIT").await
    }

    fn in_transaction(&self) -> bool {
        self.state().tx.is_active()
    }

    async fn prepare(&self, sql: &str) -> DbResult<PgStatement<'_>> {
        let named = rewrite_named(sql);
        self.log_sql("prepare", &named.sql);
        let inner = self
            .client
            .prepare(&named.sql)
            .await
            .map_err(DbError::from_db_error)?;
        Ok(PgStatement::new(self, inner, named))
    }

    async fn last_insert_id(&self) -> DbResult<String> {
        let row = self
            .client
            .query_one("SELECT lastval()::text", &[])
            .await
            .map_err(|e| match e.code() {
                Some(code) if code.code() == OBJECT_NOT_IN_PREREQUISITE_STATE => {
                    DbError::not_found("no value generated by a sequence in this session")
                }
                _ => DbError::from_db_error(e),
            })?;
        Ok(row.try_get(0)?)
    }

    async fn execute(&self, sql: &str) -> DbResult<()> {
        self.log_sql("execute", sql);
        self.client
            .batch_execute(sql)
            .await
            .map_err(DbError::from_db_error)
    }
}

impl Drop for PgConnection {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        if self.in_transaction() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                target: "fluentsql.sql",
                "PgConnection dropped with an open transaction; the server will roll it back"
            );
        }
    }
}
