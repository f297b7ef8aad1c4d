//! Transaction helper macro.
//!
//! [`Connection`](crate::Connection) exposes begin/commit/rollback as plain
//! calls; the [`transaction!`] macro wraps a block so that it commits on `Ok`
//! and rolls back on `Err`.
//!
//! # Example
//!
//! ```ignore
//! use fluentsql::{DbError, QueryBuilder, Statement, params};
//!
//! fluentsql::transaction!(&conn, {
//!     let mut qb = QueryBuilder::new(&conn);
//!     qb.update("accounts")
//!         .set("balance = balance - :amount")
//!         .where_("id = :id")
//!         .bind_params(params! { "amount" => 100, "id" => 1 })
//!         .prepare()
//!         .await?
//!         .execute()
//!         .await?;
//!     Ok::<(), DbError>(())
//! })?;
//! ```

/// Runs the given block inside a transaction on a [`Connection`](crate::Connection).
///
/// - Optionally applies an isolation level first (`transaction!(conn, level, { ... })`).
/// - Begins a transaction.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`; a failed rollback is reported together with the
///   original error.
///
/// The block must evaluate to `fluentsql::DbResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($conn:expr, $level:expr, $body:block) => {{
        let __fluentsql_conn = $conn;
        $crate::Connection::set_isolation_level(__fluentsql_conn, $level).await?;
        $crate::transaction!(__fluentsql_conn, $body)
    }};
    ($conn:expr, $body:block) => {{
        let __fluentsql_conn = $conn;
        $crate::Connection::begin_transaction(__fluentsql_conn).await?;

        let __fluentsql_tx_result = async { $body }.await;
        match __fluentsql_tx_result {
            Ok(value) => {
                $crate::Connection::commit(__fluentsql_conn).await?;
                Ok(value)
            }
            Err(error) => match $crate::Connection::rollback(__fluentsql_conn).await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::DbError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}
