//! Health check endpoint handler.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// Liveness endpoint.
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "timestamp": state.clock.now().to_rfc3339(),
        "environment": state.config.server.environment,
    }))
}
