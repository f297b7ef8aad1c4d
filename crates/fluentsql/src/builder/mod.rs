//! Fluent SQL builder with named parameters.
//!
//! A [`QueryBuilder`] accumulates typed clause fragments and named parameters,
//! then hands the rendered SQL to its [`Connection`] in [`QueryBuilder::prepare`].
//! Identifiers and raw expressions are emitted verbatim; only mapping inputs to
//! [`set`](QueryBuilder::set), [`where_`](QueryBuilder::where_) and
//! [`values`](QueryBuilder::values) produce bound parameters.
//!
//! # Example
//!
//! ```ignore
//! use fluentsql::{QueryBuilder, Statement, params};
//!
//! let mut qb = QueryBuilder::new(&conn);
//! let stmt = qb
//!     .update("users")
//!     .set(params! { "status" => "inactive" })
//!     .where_("id = :id")
//!     .bind_params(params! { "id" => 42 })
//!     .prepare()
//!     .await?;
//! stmt.execute().await?;
//!
//! // `qb` is empty again and can build the next query.
//! assert!(qb.to_sql().is_empty());
//! ```

mod clause;

pub use clause::{Clause, Columns, Expr, Fragment};

use crate::connection::{Connection, Statement};
use crate::error::{DbError, DbResult};
use crate::value::{Params, Value};
use std::fmt;

/// What kind of query the builder holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryKind {
    /// Set by [`QueryBuilder::select`].
    Select,
    /// Anything else.
    #[default]
    Execution,
}

/// Accumulates SQL fragments and parameters for one query at a time.
pub struct QueryBuilder<'c, C: Connection> {
    conn: &'c C,
    clauses: Vec<Clause>,
    params: Params,
    kind: QueryKind,
}

impl<'c, C: Connection> QueryBuilder<'c, C> {
    /// Create an empty builder that prepares statements on `conn`.
    pub fn new(conn: &'c C) -> Self {
        Self {
            conn,
            clauses: Vec::new(),
            params: Params::new(),
            kind: QueryKind::Execution,
        }
    }

    /// The connection statements are prepared on.
    pub fn connection(&self) -> &'c C {
        self.conn
    }

    fn push(&mut self, clause: Clause) -> &mut Self {
        self.clauses.push(clause);
        self
    }

    fn bind_fragment(&mut self, expr: Expr) -> Fragment {
        match expr {
            Expr::Raw(sql) => Fragment::Raw(sql),
            Expr::Map(map) => {
                let columns = map.keys().cloned().collect();
                self.bind_params(map);
                Fragment::Bound(columns)
            }
        }
    }

    /// `SELECT <columns>`. A list is joined with `,`.
    pub fn select(&mut self, columns: impl Into<Columns>) -> &mut Self {
        self.kind = QueryKind::Select;
        self.push(Clause::Select(columns.into()))
    }

    /// `UPDATE <table>`.
    pub fn update(&mut self, table: impl Into<String>) -> &mut Self {
        self.push(Clause::Update(table.into()))
    }

    /// ` SET <expr>`, or ` SET a = :a,b = :b` for a mapping (values bound).
    pub fn set(&mut self, expr: impl Into<Expr>) -> &mut Self {
        let fragment = self.bind_fragment(expr.into());
        self.push(Clause::Set(fragment))
    }

    /// `INSERT INTO <table>`.
    pub fn insert(&mut self, table: impl Into<String>) -> &mut Self {
        self.push(Clause::Insert(table.into()))
    }

    /// ` <values>`, or ` (a,b) VALUES (:a,:b)` for a mapping (values bound
    /// under the column names).
    pub fn values(&mut self, values: impl Into<Expr>) -> &mut Self {
        let fragment = self.bind_fragment(values.into());
        self.push(Clause::Values(fragment))
    }

    /// `DELETE`.
    pub fn delete(&mut self) -> &mut Self {
        self.push(Clause::Delete)
    }

    /// ` FROM <table>`.
    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        self.push(Clause::From(table.into()))
    }

    /// ` JOIN <table> ON <on>`.
    pub fn join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join_with("JOIN", table, on)
    }

    /// ` <join_type> <table> ON <on>`, e.g. `LEFT JOIN`.
    pub fn join_with(
        &mut self,
        join_type: impl Into<String>,
        table: impl Into<String>,
        on: impl Into<String>,
    ) -> &mut Self {
        self.push(Clause::Join {
            join_type: join_type.into(),
            table: table.into(),
            on: on.into(),
        })
    }

    /// ` WHERE <expr>`, or ` WHERE a = :a,b = :b` for a mapping (values bound).
    ///
    /// Mapping entries are joined with `,`; write a raw condition plus
    /// [`bind_params`](Self::bind_params) to combine several with `AND`.
    pub fn where_(&mut self, expr: impl Into<Expr>) -> &mut Self {
        let fragment = self.bind_fragment(expr.into());
        self.push(Clause::Where(fragment))
    }

    /// ` GROUP BY <expr>`.
    pub fn group_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.push(Clause::GroupBy(expr.into()))
    }

    /// ` HAVING <expr>`.
    pub fn having(&mut self, expr: impl Into<String>) -> &mut Self {
        self.push(Clause::Having(expr.into()))
    }

    /// ` ORDER BY <expr>`.
    pub fn order_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.push(Clause::OrderBy(expr.into()))
    }

    /// Merge named parameters; an existing name is overwritten.
    pub fn bind_params<K, V>(&mut self, params: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in params {
            self.params.insert(name.into(), value.into());
        }
        self
    }

    /// Parameters bound so far.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Fragments appended so far.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether the current query reads rows or executes a command.
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Render the accumulated SQL text.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for clause in &self.clauses {
            clause.write_sql(&mut out);
        }
        out
    }

    /// Whether nothing has been appended or bound.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty() && self.params.is_empty()
    }

    fn validate(&self) -> DbResult<()> {
        match self.clauses.iter().find(|c| c.has_empty_mapping()) {
            Some(clause) => Err(DbError::validation(format!(
                "{} was given an empty column mapping",
                clause.keyword()
            ))),
            None => Ok(()),
        }
    }

    /// Prepare the accumulated SQL on the connection, bind every parameter by
    /// name, and reset the builder.
    ///
    /// Errors from the connection or statement are returned unchanged. On
    /// error the builder keeps its state.
    pub async fn prepare(&mut self) -> DbResult<C::Statement<'c>> {
        self.validate()?;

        let sql = self.to_sql();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "fluentsql.sql",
            kind = ?self.kind,
            param_count = self.params.len(),
            sql = %sql,
            "preparing built query"
        );

        let conn = self.conn;
        let mut stmt = conn.prepare(&sql).await?;
        for (name, value) in &self.params {
            stmt.bind(name, value.clone())?;
        }

        self.clear();
        Ok(stmt)
    }

    /// Discard everything accumulated so far.
    pub fn clear(&mut self) {
        self.clauses.clear();
        self.params.clear();
        self.kind = QueryKind::Execution;
    }
}

impl<C: Connection> fmt::Debug for QueryBuilder<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("sql", &self.to_sql())
            .field("params", &self.params)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests;
