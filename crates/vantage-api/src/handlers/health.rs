//! Health check handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::state::AppState;

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - critical dependencies (database).
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let mut response = serde_json::json!({
        "status": "healthy",
        "database": "unknown"
    });

    let mut overall_healthy = true;
    match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(&state.db.pool)).await {
        Ok(Ok(_)) => response["database"] = serde_json::json!("healthy"),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database health check failed");
            response["database"] = serde_json::json!(format!("unhealthy: {}", e));
            overall_healthy = false;
        }
        Err(_) => {
            tracing::error!("Database health check timed out");
            response["database"] = serde_json::json!("timeout");
            overall_healthy = false;
        }
    }

    if !overall_healthy {
        response["status"] = serde_json::json!("unhealthy");
    }

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
