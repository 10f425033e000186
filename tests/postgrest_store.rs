//! PostgREST store tests against an in-process mock of the REST surface.
//!
//! The mock honours the subset the store relies on: `eq.` filters, upsert via
//! `on_conflict` + `Prefer: resolution=merge-duplicates`, `order=updated_at.desc`,
//! `Prefer: return=representation` on delete, and the provisioning RPC.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use summary_manager::storage::{
    bootstrap_schema, schema_sql, DeleteOutcome, PostgrestStore, SchemaState, SummaryStore,
};
use summary_manager::types::{
    ClientId, Error, StoreConfig, SummaryKey, STORAGE_UNAVAILABLE,
};

const TABLE: &str = "conversation_summaries";
const KEY: &str = "test-key";

#[derive(Debug)]
struct MockDb {
    rows: Mutex<Vec<Map<String, Value>>>,
    table_exists: Mutex<bool>,
    allow_provision: bool,
    /// Status and body returned while the table is missing.
    missing: (StatusCode, Value),
    provisioned_sql: Mutex<Option<String>>,
}

impl MockDb {
    fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            table_exists: Mutex::new(true),
            allow_provision: true,
            missing: (
                StatusCode::NOT_FOUND,
                json!({"code": "PGRST205", "message": "table not found"}),
            ),
            provisioned_sql: Mutex::new(None),
        }
    }

    fn without_table(mut self, allow_provision: bool, missing: (StatusCode, Value)) -> Self {
        *self.table_exists.get_mut().unwrap() = false;
        self.allow_provision = allow_provision;
        self.missing = missing;
        self
    }

    fn row(&self, client: &str, key: &str) -> Option<Map<String, Value>> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r["client_id"] == client && r["summary_key"] == key)
            .cloned()
    }
}

type Db = State<Arc<MockDb>>;

fn authorized(headers: &HeaderMap) -> bool {
    let bearer = format!("Bearer {}", KEY);
    headers.get("apikey").map(|v| v.as_bytes()) == Some(KEY.as_bytes())
        && headers.get("authorization").map(|v| v.as_bytes()) == Some(bearer.as_bytes())
}

fn gate(db: &MockDb, headers: &HeaderMap) -> Option<Response> {
    if !authorized(headers) {
        return Some(
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"code": "PGRST301", "message": "JWT invalid"})),
            )
                .into_response(),
        );
    }
    if !*db.table_exists.lock().unwrap() {
        let (status, body) = db.missing.clone();
        return Some((status, Json(body)).into_response());
    }
    None
}

fn matches(row: &Map<String, Value>, query: &HashMap<String, String>) -> bool {
    ["client_id", "summary_key"].iter().all(|column| {
        match query.get(*column).and_then(|f| f.strip_prefix("eq.")) {
            Some(wanted) => row.get(*column).and_then(Value::as_str) == Some(wanted),
            None => true,
        }
    })
}

fn timestamp(row: &Map<String, Value>, column: &str) -> DateTime<Utc> {
    row.get(column)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

async fn select_rows(
    State(db): Db,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = gate(&db, &headers) {
        return rejection;
    }
    let mut rows: Vec<Map<String, Value>> = db
        .rows
        .lock()
        .unwrap()
        .iter()
        .filter(|r| matches(r, &query))
        .cloned()
        .collect();
    if query.get("order").map(String::as_str) == Some("updated_at.desc") {
        rows.sort_by_key(|r| std::cmp::Reverse(timestamp(r, "updated_at")));
    }
    if let Some(limit) = query.get("limit").and_then(|l| l.parse::<usize>().ok()) {
        rows.truncate(limit);
    }
    let selected: Vec<Value> = match query.get("select") {
        Some(columns) => rows
            .into_iter()
            .map(|r| {
                let picked: Map<String, Value> = columns
                    .split(',')
                    .filter_map(|c| r.get(c).map(|v| (c.to_string(), v.clone())))
                    .collect();
                Value::Object(picked)
            })
            .collect(),
        None => rows.into_iter().map(Value::Object).collect(),
    };
    (StatusCode::OK, Json(Value::Array(selected))).into_response()
}

async fn insert_rows(
    State(db): Db,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    if let Some(rejection) = gate(&db, &headers) {
        return rejection;
    }
    let merge = query.get("on_conflict").map(String::as_str) == Some("client_id,summary_key")
        && headers
            .get("prefer")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|p| p.contains("resolution=merge-duplicates"));

    let mut rows = db.rows.lock().unwrap();
    let existing = rows
        .iter_mut()
        .find(|r| r["client_id"] == body["client_id"] && r["summary_key"] == body["summary_key"]);
    match existing {
        Some(row) if merge => {
            for (column, value) in body {
                row.insert(column, value);
            }
            StatusCode::CREATED.into_response()
        }
        Some(_) => (
            StatusCode::CONFLICT,
            Json(json!({"code": "23505", "message": "duplicate key value"})),
        )
            .into_response(),
        None => {
            let mut row = body;
            row.insert("id".into(), json!(uuid::Uuid::new_v4()));
            row.insert("created_at".into(), json!(Utc::now()));
            row.entry("updated_at").or_insert_with(|| json!(Utc::now()));
            row.entry("last_accessed").or_insert(Value::Null);
            rows.push(row);
            StatusCode::CREATED.into_response()
        }
    }
}

async fn update_rows(
    State(db): Db,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    if let Some(rejection) = gate(&db, &headers) {
        return rejection;
    }
    for row in db.rows.lock().unwrap().iter_mut().filter(|r| matches(r, &query)) {
        for (column, value) in &body {
            row.insert(column.clone(), value.clone());
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_rows(
    State(db): Db,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = gate(&db, &headers) {
        return rejection;
    }
    let mut rows = db.rows.lock().unwrap();
    let (removed, kept): (Vec<_>, Vec<_>) = rows.drain(..).partition(|r| matches(r, &query));
    *rows = kept;
    let removed: Vec<Value> = removed.into_iter().map(Value::Object).collect();
    (StatusCode::OK, Json(Value::Array(removed))).into_response()
}

async fn exec_sql(State(db): Db, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if !db.allow_provision {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"code": "PGRST202", "message": "function not found"})),
        )
            .into_response();
    }
    let sql = body["query"].as_str().unwrap_or_default().to_string();
    *db.provisioned_sql.lock().unwrap() = Some(sql);
    *db.table_exists.lock().unwrap() = true;
    (StatusCode::OK, Json(Value::Null)).into_response()
}

/// Helper: serve `db` on a random local port and return its base URL.
async fn start_mock(db: Arc<MockDb>) -> String {
    let app = Router::new()
        .route(
            &format!("/rest/v1/{}", TABLE),
            get(select_rows)
                .post(insert_rows)
                .patch(update_rows)
                .delete(delete_rows),
        )
        .route("/rest/v1/rpc/exec_sql", post(exec_sql))
        .with_state(db);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

fn store(url: &str, key: &str) -> PostgrestStore {
    PostgrestStore::new(&StoreConfig {
        url: url.to_string(),
        api_key: key.to_string(),
        table: TABLE.to_string(),
        request_timeout: Duration::from_secs(5),
        ..StoreConfig::default()
    })
    .unwrap()
}

async fn setup() -> (Arc<MockDb>, PostgrestStore) {
    let db = Arc::new(MockDb::new());
    let url = start_mock(db.clone()).await;
    (db, store(&url, KEY))
}

fn client(s: &str) -> ClientId {
    ClientId::from_string(s.to_string()).unwrap()
}

fn key(s: &str) -> SummaryKey {
    SummaryKey::from_string(s.to_string()).unwrap()
}

#[tokio::test]
async fn test_save_then_load_refreshes_last_accessed() {
    let (db, store) = setup().await;

    let saved = store
        .save(&client("alice"), &key("standup"), "notes", true)
        .await
        .unwrap();
    assert_eq!(saved, key("standup"));
    assert_eq!(db.row("alice", "standup").unwrap()["last_accessed"], Value::Null);

    let content = store.load(&client("alice"), &key("standup")).await.unwrap();
    assert_eq!(content, "notes");
    assert!(db.row("alice", "standup").unwrap()["last_accessed"].is_string());
}

#[tokio::test]
async fn test_overwrite_replaces_content_and_keeps_created_at() {
    let (db, store) = setup().await;
    let (alice, k) = (client("alice"), key("plan"));

    store.save(&alice, &k, "v1", true).await.unwrap();
    let created = db.row("alice", "plan").unwrap()["created_at"].clone();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.save(&alice, &k, "v2", true).await.unwrap();

    let row = db.row("alice", "plan").unwrap();
    assert_eq!(row["content"], "v2");
    assert_eq!(row["created_at"], created);
    assert_eq!(db.rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_save_without_overwrite_conflicts() {
    let (db, store) = setup().await;
    let (alice, k) = (client("alice"), key("plan"));

    store.save(&alice, &k, "v1", false).await.unwrap();
    let err = store.save(&alice, &k, "v2", false).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(db.row("alice", "plan").unwrap()["content"], "v1");
}

#[tokio::test]
async fn test_load_missing_is_not_found() {
    let (_db, store) = setup().await;
    let err = store.load(&client("alice"), &key("nope")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_list_is_scoped_and_most_recent_first() {
    let (_db, store) = setup().await;
    let alice = client("alice");

    store.save(&alice, &key("first"), "1", true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.save(&alice, &key("second"), "2", true).await.unwrap();
    store
        .save(&client("bob"), &key("bobs"), "b", true)
        .await
        .unwrap();

    let keys: Vec<String> = store
        .list(&alice)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.summary_key.to_string())
        .collect();
    assert_eq!(keys, vec!["second", "first"]);

    tokio::time::sleep(Duration::from_millis(5)).await;
    store.save(&alice, &key("first"), "1b", true).await.unwrap();
    let listing = store.list(&alice).await.unwrap();
    assert_eq!(listing[0].summary_key, key("first"));
    assert!(listing[0].updated_at >= listing[0].created_at);
}

#[tokio::test]
async fn test_delete_outcomes() {
    let (db, store) = setup().await;
    let (alice, k) = (client("alice"), key("old"));
    store.save(&alice, &k, "x", true).await.unwrap();

    assert_eq!(
        store.delete(&alice, &k, false).await.unwrap(),
        DeleteOutcome::Cancelled
    );
    assert!(db.row("alice", "old").is_some());

    // Another client cannot remove alice's row.
    let err = store.delete(&client("bob"), &k, true).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    assert_eq!(
        store.delete(&alice, &k, true).await.unwrap(),
        DeleteOutcome::Deleted
    );
    assert!(db.row("alice", "old").is_none());

    let err = store.delete(&alice, &k, true).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_rejected_credentials_are_transport_errors() {
    let db = Arc::new(MockDb::new());
    let url = start_mock(db).await;
    let store = store(&url, "wrong-key");

    let err = store.list(&client("alice")).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.client_message(), STORAGE_UNAVAILABLE);
    assert!(!err.client_message().contains("401"));
}

#[tokio::test]
async fn test_bootstrap_finds_existing_table() {
    let (db, store) = setup().await;
    let state = bootstrap_schema(&store, &schema_sql(TABLE)).await.unwrap();
    assert_eq!(state, SchemaState::Ready);
    assert!(db.provisioned_sql.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_bootstrap_provisions_missing_table() {
    let db = Arc::new(MockDb::new().without_table(
        true,
        (
            StatusCode::BAD_REQUEST,
            json!({"code": "42P01", "message": "relation does not exist"}),
        ),
    ));
    let url = start_mock(db.clone()).await;
    let store = store(&url, KEY);

    let state = bootstrap_schema(&store, &schema_sql(TABLE)).await.unwrap();
    assert_eq!(state, SchemaState::Provisioned);
    let sql = db.provisioned_sql.lock().unwrap().clone().unwrap();
    assert!(sql.contains("CREATE TABLE IF NOT EXISTS conversation_summaries"));

    store
        .save(&client("alice"), &key("after"), "ok", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bootstrap_degrades_when_provisioning_unavailable() {
    let db = Arc::new(MockDb::new().without_table(
        false,
        (
            StatusCode::NOT_FOUND,
            json!({"code": "PGRST205", "message": "table not found"}),
        ),
    ));
    let url = start_mock(db).await;
    let store = store(&url, KEY);

    let state = bootstrap_schema(&store, &schema_sql(TABLE)).await.unwrap();
    assert!(state.is_degraded());

    // Still serving: calls fail cleanly instead of panicking.
    let err = store.list(&client("alice")).await.unwrap_err();
    assert!(err.is_transport());
}
