//! Administrative endpoints.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Response for a cache flush.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
}

/// POST /api/admin/cache/clear - Purge every cache entry regardless of expiry.
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult<Json<ClearCacheResponse>> {
    let removed = state.coordinator.clear_cache_all().await?;
    tracing::info!(removed, "Cache flushed");
    Ok(Json(ClearCacheResponse { removed }))
}
