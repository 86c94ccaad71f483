//! Line-delimited JSON-RPC 2.0 loop serving the tools over stdin/stdout

use anyhow::Result;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use super::guide::{GUIDE_URI, PLAN_GUIDE};
use super::{TOOLS, ToolError, Tools};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Serve requests until stdin closes
pub async fn run_stdio(tools: Tools) -> Result<()> {
    info!("tool server reading requests from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Value>(&line) {
            Ok(request) => handle_request(&tools, request),
            Err(e) => {
                warn!(error = %e, "unparsable request");
                Some(error_response(Value::Null, PARSE_ERROR, &format!("Parse error: {}", e)))
            }
        };
        if let Some(response) = response {
            stdout.write_all(response.to_string().as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    info!("stdin closed, tool server stopping");
    Ok(())
}

/// Answer one request; notifications (no `id`) get `None`.
pub fn handle_request(tools: &Tools, request: Value) -> Option<Value> {
    let id = request.get("id").cloned();
    let Some(method) = request.get("method").and_then(Value::as_str) else {
        return Some(error_response(id.unwrap_or(Value::Null), INVALID_REQUEST, "Missing method"));
    };
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    let outcome = match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}, "resources": {}},
            "serverInfo": {"name": env!("CARGO_PKG_NAME"), "version": env!("CARGO_PKG_VERSION")},
        })),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({"tools": tool_list()})),
        "tools/call" => call_tool(tools, &params),
        "resources/list" => Ok(json!({"resources": [{
            "uri": GUIDE_URI,
            "name": "Coach plan guide",
            "description": "How to write and edit workout plans",
            "mimeType": "text/markdown",
        }]})),
        "resources/read" => read_resource(&params),
        other => Err((METHOD_NOT_FOUND, format!("Method not found: {}", other))),
    };

    let id = id?;
    Some(match outcome {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err((code, message)) => error_response(id, code, &message),
    })
}

fn call_tool(tools: &Tools, params: &Value) -> Result<Value, (i64, String)> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or((INVALID_PARAMS, "Missing tool name".to_string()))?;
    let args = params.get("arguments").cloned().unwrap_or(Value::Null);

    match tools.call(name, args) {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value).map_err(|e| (INVALID_PARAMS, e.to_string()))?;
            Ok(json!({"content": [{"type": "text", "text": text}], "isError": false}))
        }
        Err(ToolError::UnknownTool(name)) => Err((METHOD_NOT_FOUND, format!("Unknown tool: {}", name))),
        Err(e) => {
            warn!(tool = name, error = %e, "tool call failed");
            Ok(json!({"content": [{"type": "text", "text": e.to_string()}], "isError": true}))
        }
    }
}

fn read_resource(params: &Value) -> Result<Value, (i64, String)> {
    match params.get("uri").and_then(Value::as_str) {
        Some(GUIDE_URI) => Ok(json!({"contents": [{
            "uri": GUIDE_URI,
            "mimeType": "text/markdown",
            "text": PLAN_GUIDE,
        }]})),
        Some(other) => Err((INVALID_PARAMS, format!("Unknown resource: {}", other))),
        None => Err((INVALID_PARAMS, "Missing resource uri".to_string())),
    }
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}

fn tool_list() -> Vec<Value> {
    TOOLS
        .iter()
        .map(|(name, description)| {
            json!({"name": name, "description": description, "inputSchema": input_schema(name)})
        })
        .collect()
}

fn input_schema(tool: &str) -> Value {
    let date = json!({"type": "string", "description": "YYYY-MM-DD"});
    let (properties, required) = match tool {
        "get_workout_plan" | "get_workout_logs" => (
            json!({"start_date": date, "end_date": date}),
            json!(["start_date", "end_date"]),
        ),
        "set_workout_plan" | "set_block_plan" => (
            json!({"date": date, "plan": {"type": "object"}}),
            json!(["date", "plan"]),
        ),
        "add_exercise" => (
            json!({"date": date, "exercise": {"type": "object"}, "after_id": {"type": "string"}}),
            json!(["date", "exercise"]),
        ),
        "remove_exercise" => (
            json!({"date": date, "exercise_id": {"type": "string"}}),
            json!(["date", "exercise_id"]),
        ),
        "update_exercise" => (
            json!({"date": date, "exercise_id": {"type": "string"}, "fields": {"type": "object"}}),
            json!(["date", "exercise_id", "fields"]),
        ),
        "update_plan_metadata" => (
            json!({
                "date": date,
                "day_name": {"type": "string"},
                "location": {"type": "string"},
                "phase": {"type": "string"},
                "total_duration_min": {"type": "integer", "minimum": 0},
            }),
            json!(["date"]),
        ),
        "get_workout_summary" => (
            json!({"days": {"type": "integer", "minimum": 0, "maximum": 365, "default": 30}}),
            json!([]),
        ),
        "list_scheduled_dates" => (json!({"start_date": date, "end_date": date}), json!([])),
        _ => (json!({}), json!([])),
    };
    json!({"type": "object", "properties": properties, "required": required})
}
