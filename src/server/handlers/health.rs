use axum::Json;
use serde_json::{json, Value};

/// Liveness probe: returns 200 OK if the server process is running.
pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
