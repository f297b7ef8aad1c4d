//! Typed clause fragments and the inputs accepted by clause methods.

use crate::value::{Params, Value};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// Column input for [`select`](super::QueryBuilder::select).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Columns {
    /// Emitted verbatim, e.g. `"id, name"` or `"COUNT(*)"`.
    Raw(String),
    /// Joined with `,`.
    List(Vec<String>),
}

impl From<&str> for Columns {
    fn from(s: &str) -> Self {
        Columns::Raw(s.to_string())
    }
}

impl From<String> for Columns {
    fn from(s: String) -> Self {
        Columns::Raw(s)
    }
}

impl<S: Into<String>> From<Vec<S>> for Columns {
    fn from(cols: Vec<S>) -> Self {
        Columns::List(cols.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Columns {
    fn from(cols: [S; N]) -> Self {
        Columns::List(cols.into_iter().map(Into::into).collect())
    }
}

impl<S: AsRef<str>> From<&[S]> for Columns {
    fn from(cols: &[S]) -> Self {
        Columns::List(cols.iter().map(|c| c.as_ref().to_string()).collect())
    }
}

/// Input for `set`, `where_` and `values`: a raw SQL expression or a
/// column -> value mapping whose values get bound as named parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Emitted verbatim; nothing is bound.
    Raw(String),
    /// Each key becomes a `:key` placeholder bound to its value.
    Map(Params),
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Raw(s.to_string())
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Raw(s)
    }
}

fn collect_params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Params
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl<K: Into<String>, V: Into<Value>> From<IndexMap<K, V>> for Expr {
    fn from(map: IndexMap<K, V>) -> Self {
        Expr::Map(collect_params(map))
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Expr {
    fn from(map: BTreeMap<K, V>) -> Self {
        Expr::Map(collect_params(map))
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Expr {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Expr::Map(collect_params(pairs))
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Expr {
    fn from(pairs: [(K, V); N]) -> Self {
        Expr::Map(collect_params(pairs))
    }
}

/// Body of a `SET` / `WHERE` / `VALUES` fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Caller-written SQL, emitted verbatim.
    Raw(String),
    /// Column names whose values were bound under the same placeholder names.
    Bound(Vec<String>),
}

impl Fragment {
    fn write_assignments(columns: &[String], out: &mut String) {
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{col} = :{col}");
        }
    }
}

/// One SQL fragment appended by a single builder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Select(Columns),
    Update(String),
    Set(Fragment),
    Insert(String),
    Values(Fragment),
    Delete,
    From(String),
    Join {
        join_type: String,
        table: String,
        on: String,
    },
    Where(Fragment),
    GroupBy(String),
    Having(String),
    OrderBy(String),
}

impl Clause {
    /// Leading keyword, used in diagnostics.
    pub fn keyword(&self) -> &str {
        match self {
            Clause::Select(_) => "SELECT",
            Clause::Update(_) => "UPDATE",
            Clause::Set(_) => "SET",
            Clause::Insert(_) => "INSERT INTO",
            Clause::Values(_) => "VALUES",
            Clause::Delete => "DELETE",
            Clause::From(_) => "FROM",
            Clause::Join { join_type, .. } => join_type,
            Clause::Where(_) => "WHERE",
            Clause::GroupBy(_) => "GROUP BY",
            Clause::Having(_) => "HAVING",
            Clause::OrderBy(_) => "ORDER BY",
        }
    }

    /// A mapping-based fragment that was given no columns.
    pub(crate) fn has_empty_mapping(&self) -> bool {
        match self {
            Clause::Set(Fragment::Bound(cols))
            | Clause::Values(Fragment::Bound(cols))
            | Clause::Where(Fragment::Bound(cols)) => cols.is_empty(),
            _ => false,
        }
    }

    /// Append this fragment's SQL text to `out`.
    pub fn write_sql(&self, out: &mut String) {
        match self {
            Clause::Select(Columns::Raw(cols)) => {
                out.push_str("SELECT ");
                out.push_str(cols);
            }
            Clause::Select(Columns::List(cols)) => {
                out.push_str("SELECT ");
                out.push_str(&cols.join(","));
            }
            Clause::Update(table) => {
                out.push_str("UPDATE ");
                out.push_str(table);
            }
            Clause::Set(Fragment::Raw(expr)) => {
                out.push_str(" SET ");
                out.push_str(expr);
            }
            Clause::Set(Fragment::Bound(cols)) => {
                out.push_str(" SET ");
                Fragment::write_assignments(cols, out);
            }
            Clause::Insert(table) => {
                out.push_str("INSERT INTO ");
                out.push_str(table);
            }
            Clause::Values(Fragment::Raw(values)) => {
                out.push(' ');
                out.push_str(values);
            }
            Clause::Values(Fragment::Bound(cols)) => {
                let _ = write!(out, " ({}) VALUES (", cols.join(","));
                for (i, col) in cols.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push(':');
                    out.push_str(col);
                }
                out.push(')');
            }
            Clause::Delete => out.push_str("DELETE"),
            Clause::From(table) => {
                out.push_str(" FROM ");
                out.push_str(table);
            }
            Clause::Join {
                join_type,
                table,
                on,
            } => {
                let _ = write!(out, " {join_type} {table} ON {on}");
            }
            Clause::Where(Fragment::Raw(expr)) => {
                out.push_str(" WHERE ");
                out.push_str(expr);
            }
            Clause::Where(Fragment::Bound(cols)) => {
                out.push_str(" WHERE ");
                Fragment::write_assignments(cols, out);
            }
            Clause::GroupBy(expr) => {
                out.push_str(" GROUP BY ");
                out.push_str(expr);
            }
            Clause::Having(expr) => {
                out.push_str(" HAVING ");
                out.push_str(expr);
            }
            Clause::OrderBy(expr) => {
                out.push_str(" ORDER BY ");
                out.push_str(expr);
            }
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        self.write_sql(&mut s);
        f.write_str(&s)
    }
}
