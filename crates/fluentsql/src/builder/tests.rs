use super::*;
use crate::params;
use crate::testing::RecordingConnection;
use indexmap::IndexMap;
use std::collections::BTreeMap;

#[test]
fn select_list_joins_with_commas() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.select(["id", "name", "email"]);

    assert_eq!(qb.to_sql(), "SELECT id,name,email");
    assert_eq!(qb.kind(), QueryKind::Select);
}

#[test]
fn select_string_is_verbatim() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.select("id, COUNT(*) AS n");

    assert_eq!(qb.to_sql(), "SELECT id, COUNT(*) AS n");
    assert_eq!(qb.kind(), QueryKind::Select);
}

#[test]
fn select_accepts_vec_and_slice() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.select(vec!["a".to_string(), "b".to_string()]);
    assert_eq!(qb.to_sql(), "SELECT a,b");

    qb.clear();
    let cols: &[&str] = &["x"];
    qb.select(cols);
    assert_eq!(qb.to_sql(), "SELECT x");
}

#[test]
fn kind_defaults_to_execution() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    assert_eq!(qb.kind(), QueryKind::Execution);

    qb.delete().from("users");
    assert_eq!(qb.kind(), QueryKind::Execution);
    assert_eq!(qb.to_sql(), "DELETE FROM users");
}

#[test]
fn full_select_renders_clauses_in_call_order() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.select("u.id, COUNT(o.id)")
        .from("users u")
        .join_with("LEFT JOIN", "orders o", "o.user_id = u.id")
        .join("teams t", "t.id = u.team_id")
        .where_("u.active = true")
        .group_by("u.id")
        .having("COUNT(o.id) > 1")
        .order_by("u.id DESC");

    assert_eq!(
        qb.to_sql(),
        "SELECT u.id, COUNT(o.id) FROM users u \
         LEFT JOIN orders o ON o.user_id = u.id \
         JOIN teams t ON t.id = u.team_id \
         WHERE u.active = true GROUP BY u.id HAVING COUNT(o.id) > 1 ORDER BY u.id DESC"
    );
    assert!(qb.params().is_empty());
    assert_eq!(qb.clauses().len(), 8);
}

#[test]
fn set_mapping_has_no_trailing_comma() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.update("t").set([("a", 1), ("b", 2)]);

    assert_eq!(qb.to_sql(), "UPDATE t SET a = :a,b = :b");
    assert_eq!(qb.params(), &params! { "a" => 1, "b" => 2 });
}

#[test]
fn set_string_binds_nothing() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.update("t").set("hits = hits + 1");

    assert_eq!(qb.to_sql(), "UPDATE t SET hits = hits + 1");
    assert!(qb.params().is_empty());
}

#[test]
fn where_mapping_binds_exactly_the_mapping() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    let filter = params! { "status" => "active", "team_id" => 7, "deleted_at" => None::<i64> };
    qb.select("*").from("users").where_(filter.clone());

    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE status = :status,team_id = :team_id,deleted_at = :deleted_at"
    );
    assert_eq!(qb.params(), &filter);
}

#[test]
fn where_single_entry() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.delete().from("users").where_([("id", 9)]);

    assert_eq!(qb.to_sql(), "DELETE FROM users WHERE id = :id");
    assert_eq!(qb.params()["id"], Value::Int(9));
}

#[test]
fn values_mapping_binds_values_by_column() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.insert("points").values([("x", 10), ("y", 20)]);

    assert_eq!(qb.to_sql(), "INSERT INTO points (x,y) VALUES (:x,:y)");
    assert_eq!(qb.params(), &params! { "x" => 10, "y" => 20 });
    assert!(!qb.params().contains_key(":x"));
}

#[test]
fn values_string_is_appended_after_a_space() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.insert("points").values("(x, y) VALUES (1, 2)");

    assert_eq!(qb.to_sql(), "INSERT INTO points (x, y) VALUES (1, 2)");
    assert!(qb.params().is_empty());
}

#[test]
fn mapping_inputs_from_std_and_indexmap() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);

    let mut sorted = BTreeMap::new();
    sorted.insert("b", "two");
    sorted.insert("a", "one");
    qb.update("t").set(sorted);
    assert_eq!(qb.to_sql(), "UPDATE t SET a = :a,b = :b");

    qb.clear();
    let mut ordered = IndexMap::new();
    ordered.insert("z", 1.5);
    ordered.insert("y", 2.5);
    qb.update("t").set(ordered);
    assert_eq!(qb.to_sql(), "UPDATE t SET z = :z,y = :y");

    qb.clear();
    qb.update("t").set(vec![("flag", true)]);
    assert_eq!(qb.params()["flag"], Value::Bool(true));
}

#[test]
fn bind_params_last_write_wins() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.bind_params([("a", 1)]);
    qb.bind_params([("a", 2)]);

    assert_eq!(qb.params(), &params! { "a" => 2 });
}

#[test]
fn mapping_clause_overwrites_earlier_bind() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.bind_params(params! { "id" => 1, "other" => "keep" });
    qb.update("t").set([("id", 5)]);

    assert_eq!(qb.params()["id"], Value::Int(5));
    assert_eq!(qb.params()["other"], Value::Text("keep".into()));
    // Overwriting keeps the key's original position.
    let keys: Vec<&str> = qb.params().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["id", "other"]);
}

#[test]
fn clear_resets_everything() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.select("*").from("t").where_([("id", 1)]);
    assert!(!qb.is_empty());

    qb.clear();
    assert_eq!(qb.to_sql(), "");
    assert!(qb.params().is_empty());
    assert_eq!(qb.kind(), QueryKind::Execution);
    assert!(qb.is_empty());
    assert!(conn.events().is_empty());
}

#[test]
fn clause_display_renders_single_fragment() {
    let clause = Clause::Values(Fragment::Bound(vec!["a".into(), "b".into()]));
    assert_eq!(clause.to_string(), " (a,b) VALUES (:a,:b)");
    assert_eq!(Clause::Delete.to_string(), "DELETE");
    assert_eq!(
        Clause::Join {
            join_type: "INNER JOIN".into(),
            table: "t".into(),
            on: "t.id = s.id".into(),
        }
        .keyword(),
        "INNER JOIN"
    );
}

#[tokio::test]
async fn prepare_round_trip_binds_each_param_once() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);

    let stmt = qb.insert("t").values([("x", 1)]).prepare().await.unwrap();

    assert_eq!(conn.events(), vec!["prepare INSERT INTO t (x) VALUES (:x)".to_string()]);
    assert_eq!(stmt.sql, "INSERT INTO t (x) VALUES (:x)");
    assert_eq!(stmt.bound, vec![("x".to_string(), Value::Int(1))]);
}

#[tokio::test]
async fn prepare_resets_builder() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);

    qb.select(["id"]).from("users").where_([("id", 3)]);
    let stmt = qb.prepare().await.unwrap();
    assert_eq!(stmt.bound.len(), 1);

    assert_eq!(qb.to_sql(), "");
    assert!(qb.params().is_empty());
    assert_eq!(qb.kind(), QueryKind::Execution);

    // Reusable for an unrelated query.
    let stmt = qb.delete().from("sessions").prepare().await.unwrap();
    assert_eq!(stmt.sql, "DELETE FROM sessions");
    assert!(stmt.bound.is_empty());
}

#[tokio::test]
async fn prepared_statement_executes_on_its_connection() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);

    let stmt = qb.update("t").set([("a", 1)]).prepare().await.unwrap();
    assert_eq!(stmt.execute().await.unwrap(), 1);
    assert_eq!(
        conn.events().last().map(String::as_str),
        Some("execute-statement UPDATE t SET a = :a")
    );
}

#[tokio::test]
async fn empty_mapping_is_refused_before_prepare() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.update("t").set(Params::new());

    assert_eq!(qb.to_sql(), "UPDATE t SET ");
    let err = qb.prepare().await.unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
    assert!(err.to_string().contains("SET"));
    assert!(conn.events().is_empty());
    // State is kept on failure.
    assert_eq!(qb.to_sql(), "UPDATE t SET ");
}

#[tokio::test]
async fn backend_prepare_error_is_returned_unchanged() {
    let conn = RecordingConnection::failing_prepare();
    let mut qb = QueryBuilder::new(&conn);
    qb.select("1");

    let err = qb.prepare().await.unwrap_err();
    assert_eq!(err.to_string(), "cannot prepare: SELECT 1");
    assert_eq!(qb.to_sql(), "SELECT 1");
    assert_eq!(qb.kind(), QueryKind::Select);
}

#[test]
fn debug_shows_rendered_sql() {
    let conn = RecordingConnection::new();
    let mut qb = QueryBuilder::new(&conn);
    qb.select("1");
    let dbg = format!("{qb:?}");
    assert!(dbg.contains("SELECT 1"));
    assert!(dbg.contains("Select"));
}
