//! Liveness probe served on a reserved path ahead of the route table.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

/// Reserved path; configured routes targeting it are never reached.
pub const HEALTH_PATH: &str = "/_health";

/// Fixed liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
}

pub const HEALTHY: HealthStatus = HealthStatus {
    status: "ok",
    message: "mockery-api is running",
};

/// Health check endpoint. Answers every method.
pub async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(HEALTHY))
}
