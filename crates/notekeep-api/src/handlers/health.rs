//! Liveness and fallback handlers.

use axum::Json;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "OK",
        message: "Server is running",
    })
}

pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
