use axum::Json;
use serde_json::{Value, json};

/// Liveness endpoint for `/health` and `/api/health`.
pub async fn health() -> Json<Value> {
	Json(json!({ "ok": true }))
}
