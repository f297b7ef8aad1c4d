//! # fluentsql
//!
//! A thin SQL statement builder with named parameters, over a pluggable
//! connection contract.
//!
//! ## Features
//!
//! - **SQL explicit**: clause methods append SQL text verbatim; nothing is
//!   rewritten or validated as a dialect
//! - **Named parameters**: mapping inputs to `set` / `where_` / `values` bind
//!   their values under `:column` placeholders
//! - **Driver-agnostic**: the builder only needs a [`Connection`] that can
//!   prepare SQL into a [`Statement`]
//! - **Transactions**: begin/commit/rollback on the connection, typed
//!   [`IsolationLevel`], and the [`transaction!`] macro
//! - **Postgres backend**: [`pg::PgConnection`] over tokio-postgres
//!   (feature `postgres`, on by default)
//!
//! ## Example
//!
//! ```ignore
//! use fluentsql::pg::PgConnection;
//! use fluentsql::{Connection, Statement, params};
//!
//! let conn = PgConnection::connect("postgres://postgres@localhost/app").await?;
//! let mut qb = conn.builder();
//!
//! // INSERT INTO users (name,email) VALUES (:name,:email)
//! qb.insert("users")
//!     .values(params! { "name" => "alice", "email" => "alice@example.com" })
//!     .prepare()
//!     .await?
//!     .execute()
//!     .await?;
//!
//! // SELECT id,name FROM users WHERE name = :name ORDER BY id
//! let rows = qb
//!     .select(["id", "name"])
//!     .from("users")
//!     .where_(params! { "name" => "alice" })
//!     .order_by("id")
//!     .prepare()
//!     .await?
//!     .fetch_all()
//!     .await?;
//! ```

pub mod builder;
pub mod connection;
pub mod error;
pub mod transaction;
pub mod value;

#[cfg(feature = "postgres")]
pub mod pg;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{Clause, Columns, Expr, Fragment, QueryBuilder, QueryKind};
pub use connection::{Connection, IsolationLevel, Statement, TransactionState};
pub use error::{DbError, DbResult};
pub use value::{Params, Value};

#[cfg(feature = "postgres")]
pub use pg::{ConnectOptions, PgConnection, PgStatement};
