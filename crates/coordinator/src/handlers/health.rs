//! Liveness and readiness probes.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /live - Liveness probe.
pub async fn live() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ready - Readiness probe. Checks the metadata store and staging area.
pub async fn ready(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.coordinator.metadata().health_check().await?;
    state.coordinator.staging().health_check().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
