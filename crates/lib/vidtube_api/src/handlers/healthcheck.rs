//! Healthcheck handler.

use axum::extract::State;
use serde_json::json;

use crate::response::ApiResponse;
use crate::AppState;

/// `GET /api/v1/healthcheck` — liveness plus store reachability.
pub async fn healthcheck(State(state): State<AppState>) -> ApiResponse<serde_json::Value> {
    let db_connected = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();
    ApiResponse::ok(json!({ "dbConnected": db_connected }), "OK")
}
