//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health: answers `{"status":"ok"}` while the process is serving.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
