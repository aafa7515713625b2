//! Health check, behind operator Basic credentials

use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct HealthInfo {
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: String,
    pub version: &'static str,
}

/// GET /v1/health
pub async fn health(State(info): State<HealthInfo>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "available",
        environment: info.environment,
        version: env!("CARGO_PKG_VERSION"),
    })
}
