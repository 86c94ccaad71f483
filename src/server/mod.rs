//! Sync API - HTTP endpoints for the workout client application
//!
//! Clients pull plans (written by the planner) and push logs (written on the
//! device). There is no conflict detection; the last upload for a date wins.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::{Database, LAST_SYNC_KEY, Record, Table, utc_now};

pub const DEFAULT_PORT: u16 = 8002;
pub const TEST_PORT: u16 = 8003;
/// Days of logs returned by a full (non-delta) sync
pub const FULL_SYNC_LOG_DAYS: i64 = 30;

pub type SharedDb = Arc<Mutex<Database>>;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "sync request failed");
        Self::internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub last_modified: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    client_id: Option<String>,
    client_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub status: &'static str,
    pub client_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    client_id: Option<String>,
    last_sync_time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub plans: BTreeMap<String, Value>,
    pub logs: BTreeMap<String, Value>,
    pub server_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUpload {
    client_id: Option<String>,
    #[serde(default)]
    logs: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub applied_logs: Vec<String>,
    pub server_time: String,
}

/// Name recorded for a client that did not supply one
pub fn default_client_name(client_id: &str) -> String {
    format!("Client-{}", client_id.chars().take(8).collect::<String>())
}

fn require_client_id(client_id: Option<String>) -> Result<String, AppError> {
    client_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("client_id is required"))
}

fn keyed(records: Vec<Record>) -> BTreeMap<String, Value> {
    records
        .into_iter()
        .map(|r| {
            let payload = r.stamped_payload();
            (r.date, payload)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(db: SharedDb) -> Router {
    Router::new()
        .route("/api/workout/status", get(workout_status))
        .route("/api/workout/register", post(register_client))
        .route("/api/workout/sync", get(sync_pull).post(sync_push))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(db: SharedDb, bind: &str, port: u16) -> Result<()> {
    let app = build_router(db);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("sync API listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("sync API shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn workout_status(State(db): State<SharedDb>) -> Result<Json<StatusResponse>, AppError> {
    let db = db.lock().await;
    let last_modified = db.get_meta(LAST_SYNC_KEY)?;
    Ok(Json(StatusResponse { last_modified }))
}

async fn register_client(
    State(db): State<SharedDb>,
    Query(query): Query<RegisterQuery>,
) -> Result<Json<RegisterResponse>, AppError> {
    let client_id = require_client_id(query.client_id)?;
    let name = query
        .client_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| default_client_name(&client_id));

    db.lock().await.register_client(&client_id, &name)?;
    info!(client = %client_id, name = %name, "client registered");
    Ok(Json(RegisterResponse { status: "ok", client_id }))
}

/// Plans and logs for the client; only rows changed after `last_sync_time`
/// when it is given.
async fn sync_pull(
    State(db): State<SharedDb>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<SyncResponse>, AppError> {
    let client_id = require_client_id(query.client_id)?;
    let since = query.last_sync_time.filter(|s| !s.is_empty());

    let db = db.lock().await;
    let now = utc_now();
    db.touch_client(&client_id, &now)?;

    let (plans, logs) = match &since {
        Some(since) => (
            db.modified_since(Table::Plans, since)?,
            db.modified_since(Table::Logs, since)?,
        ),
        None => {
            let cutoff = (Local::now().date_naive() - Duration::days(FULL_SYNC_LOG_DAYS)).to_string();
            (db.all(Table::Plans)?, db.dated_from(Table::Logs, &cutoff)?)
        }
    };
    info!(
        client = %client_id,
        delta = since.is_some(),
        plans = plans.len(),
        logs = logs.len(),
        "sync pull"
    );

    Ok(Json(SyncResponse {
        plans: keyed(plans),
        logs: keyed(logs),
        server_time: now,
    }))
}

async fn sync_push(
    State(db): State<SharedDb>,
    Json(upload): Json<SyncUpload>,
) -> Result<Json<UploadResponse>, AppError> {
    let client_id = require_client_id(upload.client_id)?;
    let name = default_client_name(&client_id);

    let (applied_logs, server_time) = db.lock().await.apply_log_upload(&client_id, &name, &upload.logs)?;
    info!(client = %client_id, applied = applied_logs.len(), "sync push");

    Ok(Json(UploadResponse {
        success: true,
        applied_logs,
        server_time,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    fn shared_db() -> SharedDb {
        Arc::new(Mutex::new(Database::open_in_memory().unwrap()))
    }

    async fn send(db: SharedDb, request: Request<Body>) -> axum::response::Response {
        build_router(db).oneshot(request).await.unwrap()
    }

    async fn get_uri(db: SharedDb, uri: &str) -> axum::response::Response {
        send(db, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(db: SharedDb, uri: &str, body: Value) -> axum::response::Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(db, request).await
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_default_client_name() {
        assert_eq!(default_client_name("abcdef123456"), "Client-abcdef12");
        assert_eq!(default_client_name("abc"), "Client-abc");
    }

    #[tokio::test]
    async fn test_status_before_any_upload() {
        let resp = get_uri(shared_db(), "/api/workout/status").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"lastModified": null}));
    }

    #[tokio::test]
    async fn test_register_client() {
        let db = shared_db();
        let resp = send(
            db.clone(),
            Request::builder()
                .method("POST")
                .uri("/api/workout/register?client_id=phone-123456789")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"status": "ok", "clientId": "phone-123456789"}));
        assert!(db.lock().await.client_last_seen("phone-123456789").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sync_requires_client_id() {
        let resp = get_uri(shared_db(), "/api/workout/sync").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "client_id is required");

        let resp = post_json(shared_db(), "/api/workout/sync", json!({"logs": {}})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_push_then_status() {
        let db = shared_db();
        let resp = post_json(
            db.clone(),
            "/api/workout/sync",
            json!({"clientId": "c1", "logs": {"2026-02-02": {"ex_1": {"completed": true}}}}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["appliedLogs"], json!(["2026-02-02"]));

        let status = body_json(get_uri(db, "/api/workout/status").await).await;
        assert_eq!(status["lastModified"], body["serverTime"]);
    }

    #[tokio::test]
    async fn test_full_sync_stamps_payloads() {
        let db = shared_db();
        let ts = db
            .lock()
            .await
            .put(Table::Plans, "2020-01-01", &json!({"day_name": "Old", "exercises": []}), "mcp")
            .unwrap();

        let body = body_json(get_uri(db, "/api/workout/sync?client_id=c1").await).await;
        assert_eq!(body["plans"]["2020-01-01"]["day_name"], "Old");
        assert_eq!(body["plans"]["2020-01-01"]["_lastModified"], ts);
        assert!(body["serverTime"].is_string());
    }

    #[tokio::test]
    async fn test_full_sync_limits_logs_to_recent_dates() {
        let db = shared_db();
        let today = Local::now().date_naive().to_string();
        {
            let db = db.lock().await;
            db.put(Table::Logs, "2020-01-01", &json!({"old": true}), "c1").unwrap();
            db.put(Table::Logs, &today, &json!({"new": true}), "c1").unwrap();
        }
        let body = body_json(get_uri(db, "/api/workout/sync?client_id=c1").await).await;
        let logs = body["logs"].as_object().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[&today]["new"], true);
    }
}
