//! Integration tests for the planning tools over a file-backed database.

use serde_json::{Value, json};

use coach::config::Config;
use coach::db::Database;
use coach::tools::Tools;
use coach::tools::stdio::handle_request;

fn open_tools() -> (tempfile::TempDir, Tools) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coach.db");
    // the façade only opens existing databases
    Database::open(&path.to_string_lossy()).unwrap();
    let tools = Tools::open(&Config::from_db_path(&path)).unwrap();
    (dir, tools)
}

fn call(tools: &Tools, id: i64, name: &str, arguments: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0", "id": id, "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    });
    let response = handle_request(tools, request).unwrap();
    assert_eq!(response["id"], id);
    response["result"].clone()
}

fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap()
}

#[test]
fn test_open_requires_existing_database() {
    let dir = tempfile::tempdir().unwrap();
    let err = Tools::open(&Config::from_db_path(dir.path().join("missing.db")))
        .err()
        .unwrap();
    assert!(err.to_string().starts_with("Database file not found"));
}

#[test]
fn test_planning_session() {
    let (_dir, tools) = open_tools();

    let saved = call(
        &tools,
        1,
        "set_block_plan",
        json!({"date": "2026-02-02", "plan": {
            "theme": "Full Body",
            "blocks": [
                {"block_type": "circuit", "rounds": 4, "exercises": [
                    {"name": "KB Swings", "reps": 15, "equipment": "kettlebell"},
                    {"name": "Plank", "reps": "30 sec"}
                ]},
                {"block_type": "cardio", "duration_min": 20,
                 "instructions": ["4 x 30s HARD", "90s easy"]}
            ]
        }}),
    );
    assert_eq!(saved["isError"], false);
    let saved: Value = serde_json::from_str(text(&saved)).unwrap();
    let exercises = saved["plan"]["exercises"].as_array().unwrap();
    assert_eq!(exercises[0]["id"], "circuit_0_1");
    assert_eq!(exercises[0]["target_sets"], 4);
    assert_eq!(exercises[1]["show_time"], true);
    assert_eq!(exercises[1]["hide_weight"], true);
    assert_eq!(exercises[2]["type"], "interval");
    assert_eq!(exercises[2]["name"], "VO2 Max Intervals");

    let updated = call(
        &tools,
        2,
        "update_exercise",
        json!({"date": "2026-02-02", "exercise_id": "circuit_0_1", "fields": {"target_reps": "20"}}),
    );
    assert_eq!(updated["isError"], false);

    let removed = call(&tools, 3, "remove_exercise", json!({"date": "2026-02-02", "exercise_id": "cardio_1_1"}));
    assert_eq!(removed["isError"], false);

    let plans = call(&tools, 4, "get_workout_plan", json!({"start_date": "2026-02-01", "end_date": "2026-02-07"}));
    let plans: Value = serde_json::from_str(text(&plans)).unwrap();
    let plan = &plans[0]["plan"];
    assert_eq!(plan["exercises"].as_array().unwrap().len(), 2);
    assert_eq!(plan["exercises"][0]["target_reps"], "20");
    assert_eq!(plan["blocks"][0]["exercises"][0]["target_reps"], "20");
    assert_eq!(plan["blocks"][1]["exercises"], json!([]));
}

#[test]
fn test_validation_errors_are_tool_results() {
    let (_dir, tools) = open_tools();

    let bad_date = call(&tools, 1, "get_workout_logs", json!({"start_date": "yesterday", "end_date": "2026-02-02"}));
    assert_eq!(bad_date["isError"], true);
    assert_eq!(text(&bad_date), "Invalid date format: yesterday. Use YYYY-MM-DD");

    let bad_plan = call(
        &tools,
        2,
        "set_workout_plan",
        json!({"date": "2026-02-02", "plan": {"day_name": "Test", "exercises": [
            {"id": "ex_1", "name": "Squat", "type": "yoga"}
        ]}}),
    );
    assert_eq!(bad_plan["isError"], true);
    assert!(text(&bad_plan).starts_with("Exercise 0 has invalid type: yoga"));

    let missing = call(&tools, 3, "update_plan_metadata", json!({"date": "2026-02-02", "phase": "Build"}));
    assert_eq!(text(&missing), "No workout plan found for 2026-02-02");
}
