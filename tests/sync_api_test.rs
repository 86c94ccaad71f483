//! Integration tests for the sync API.
//!
//! Plans are written through the tool façade and logs through HTTP, both
//! against one file-backed database, the way `coach serve` and `coach tools`
//! share it in practice.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt;

use coach::db::Database;
use coach::server::{SharedDb, build_router};
use coach::tools::Tools;

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn temp_db_path() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coach.db").to_string_lossy().into_owned();
    (dir, path)
}

fn shared(path: &str) -> SharedDb {
    Arc::new(Mutex::new(Database::open(path).unwrap()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn pull(db: SharedDb, query: &str) -> Value {
    let uri = format!("/api/workout/sync?{query}");
    let resp = build_router(db)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

async fn push(db: SharedDb, body: Value) -> Value {
    let request = Request::builder()
        .method("POST")
        .uri("/api/workout/sync")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = build_router(db).oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

fn today() -> String {
    chrono::Local::now().date_naive().to_string()
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_planner_plan_reaches_client() {
    let (_dir, path) = temp_db_path();
    let db = shared(&path);

    let tools = Tools::new(Database::open(&path).unwrap(), 100);
    tools
        .set_block_plan(
            "2026-02-02",
            &json!({
                "theme": "Lower Body + Bike",
                "blocks": [
                    {"block_type": "warmup", "title": "Stability Start",
                     "exercises": [{"name": "Cat-Cow", "reps": 10}]},
                    {"block_type": "strength", "rest_guidance": "Rest 2 min",
                     "exercises": [{"name": "Squat", "sets": 3, "reps": 5}]},
                    {"block_type": "cardio", "duration_min": 15, "instructions": ["Zone 2"]}
                ]
            }),
        )
        .unwrap();

    let body = pull(db, "client_id=phone").await;
    let plan = &body["plans"]["2026-02-02"];
    assert_eq!(plan["day_name"], "Lower Body + Bike");
    assert_eq!(plan["exercises"].as_array().unwrap().len(), 3);
    assert_eq!(plan["exercises"][0]["items"], json!(["Cat-Cow x10"]));
    assert_eq!(plan["exercises"][1]["guidance_note"], "Rest 2 min");
    assert!(plan["_lastModified"].is_string());
}

#[tokio::test]
async fn test_log_round_trip_is_verbatim() {
    let (_dir, path) = temp_db_path();
    let db = shared(&path);
    let date = today();
    let log = json!({
        "strength_1_1": {"completed": true, "sets": [{"weight": 24, "reps": 5}]},
        "session_feedback": {"pain_discomfort": "None", "notes": "felt strong"}
    });

    push(db.clone(), json!({"clientId": "phone", "logs": {&date: log.clone()}})).await;
    let body = pull(db, "client_id=phone").await;

    let mut returned = body["logs"][&date].clone();
    returned.as_object_mut().unwrap().remove("_lastModified");
    assert_eq!(returned, log);

    let tools = Tools::new(Database::open(&path).unwrap(), 100);
    let logs = tools.get_workout_logs(&date, &date).unwrap();
    assert_eq!(logs[0].log, log);
}

#[tokio::test]
async fn test_upload_same_date_overwrites() {
    let (_dir, path) = temp_db_path();
    let db = shared(&path);
    let date = today();

    push(db.clone(), json!({"clientId": "phone", "logs": {&date: {"first": 1}}})).await;
    push(db.clone(), json!({"clientId": "tablet", "logs": {&date: {"second": 2}}})).await;

    let body = pull(db, "client_id=phone").await;
    assert_eq!(body["logs"][&date]["second"], 2);
    assert!(body["logs"][&date].get("first").is_none());
}

#[tokio::test]
async fn test_delta_sync_returns_only_newer_rows() {
    let (_dir, path) = temp_db_path();
    let db = shared(&path);

    let first = push(db.clone(), json!({"clientId": "phone", "logs": {"2026-01-01": {"a": 1}}})).await;
    let since = first["serverTime"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    push(db.clone(), json!({"clientId": "phone", "logs": {"2026-01-02": {"b": 2}}})).await;

    let body = pull(db.clone(), &format!("client_id=phone&last_sync_time={since}")).await;
    let logs = body["logs"].as_object().unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs.contains_key("2026-01-02"));
    assert_eq!(body["plans"], json!({}));

    let later = pull(db, &format!("client_id=phone&last_sync_time={}", body["serverTime"].as_str().unwrap())).await;
    assert_eq!(later["logs"], json!({}));
}

#[tokio::test]
async fn test_register_then_status() {
    let (_dir, path) = temp_db_path();
    let db = shared(&path);

    let resp = build_router(db.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/workout/register?client_id=abc&client_name=Kitchen%20Tablet")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["clientId"], "abc");

    let resp = build_router(db)
        .oneshot(Request::builder().uri("/api/workout/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await, json!({"lastModified": null}));
}
