//! HTTP request handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::NodeState;
use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strata_core::FileId;

/// Response for a stored fragment.
#[derive(Debug, Serialize, Deserialize)]
pub struct FilePartResponse {
    pub id: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

fn parse_id(raw: &str) -> ApiResult<FileId> {
    FileId::parse(raw.trim()).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// PUT /api/filepart - Store the fragment for a file id.
///
/// Expects multipart fields `id` and `file`. Unknown fields are ignored.
pub async fn put_filepart(
    State(state): State<NodeState>,
    mut multipart: Multipart,
) -> ApiResult<Json<FilePartResponse>> {
    let mut id = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_multipart("malformed multipart body", e))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::from_multipart("unreadable id field", e))?;
                id = Some(parse_id(&text)?);
            }
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::from_multipart("unreadable file field", e))?;
                data = Some(bytes);
            }
            _ => {}
        }
    }

    let id = id.ok_or_else(|| ApiError::BadRequest("missing id field".to_string()))?;
    let data = data.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;

    let size = data.len();
    state.fragments.put(&id, data).await?;
    tracing::debug!(file_id = %id, size, "Stored fragment");

    Ok(Json(FilePartResponse { id: id.to_string() }))
}

/// GET /api/filepart/{id} - Return the raw fragment bytes.
pub async fn get_filepart(
    State(state): State<NodeState>,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&raw_id)?;
    let data = state.fragments.get(&id).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

/// GET /live - Liveness probe.
pub async fn live() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ready - Readiness probe. Fails while fragment storage is unavailable.
pub async fn ready(State(state): State<NodeState>) -> ApiResult<Json<HealthResponse>> {
    state.fragments.health_check().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
