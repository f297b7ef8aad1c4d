use super::PgConnection;
use super::placeholder::NamedSql;
use crate::connection::Statement;
use crate::error::{DbError, DbResult};
use crate::value::Value;
use std::fmt;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A statement prepared on a [`PgConnection`], with named parameter slots.
pub struct PgStatement<'c> {
    conn: &'c PgConnection,
    inner: tokio_postgres::Statement,
    sql: String,
    names: Vec<String>,
    values: Vec<Option<Value>>,
}

impl<'c> PgStatement<'c> {
    pub(crate) fn new(
        conn: &'c PgConnection,
        inner: tokio_postgres::Statement,
        named: NamedSql,
    ) -> Self {
        let values = vec![None; named.names.len()];
        Self {
            conn,
            inner,
            sql: named.sql,
            names: named.names,
            values,
        }
    }

    /// The SQL sent to the server (with `$n` placeholders).
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder names in `$n` order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The underlying tokio-postgres statement.
    pub fn native(&self) -> &tokio_postgres::Statement {
        &self.inner
    }

    fn params(&self) -> DbResult<Vec<&(dyn ToSql + Sync)>> {
        self.names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| {
                value
                    .as_ref()
                    .map(|v| v as &(dyn ToSql + Sync))
                    .ok_or_else(|| DbError::bind(format!("no value bound for :{name}")))
            })
            .collect()
    }

    /// Execute and return all rows.
    pub async fn fetch_all(&self) -> DbResult<Vec<Row>> {
        let params = self.params()?;
        self.conn
            .native()
            .query(&self.inner, &params)
            .await
            .map_err(DbError::from_db_error)
    }

    /// Execute and return the first row, if any.
    pub async fn fetch_opt(&self) -> DbResult<Option<Row>> {
        Ok(self.fetch_all().await?.into_iter().next())
    }
}

impl Statement for PgStatement<'_> {
    fn bind(&mut self, name: &str, value: Value) -> DbResult<()> {
        let name = name.strip_prefix(':').unwrap_or(name);
        let slot = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| DbError::bind(format!("parameter :{name} is not defined")))?;
        self.values[slot] = Some(value);
        Ok(())
    }

    async fn execute(&self) -> DbResult<u64> {
        let params = self.params()?;
        self.conn
            .native()
            .execute(&self.inner, &params)
            .await
            .map_err(DbError::from_db_error)
    }
}

impl fmt::Debug for PgStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgStatement")
            .field("sql", &self.sql)
            .field("names", &self.names)
            .field("values", &self.values)
            .finish()
    }
}
