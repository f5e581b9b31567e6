//! File upload, download and delete handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strata_core::FileId;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_FILE_NAME: &str = "upload";

/// Response for a stored file.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: String,
}

/// An uploaded `file` form field.
struct UploadedFile {
    name: String,
    content_type: String,
    content: Bytes,
}

fn parse_id(raw: &str) -> ApiResult<FileId> {
    FileId::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Declared part content type, else a guess from the file name.
fn resolve_content_type(declared: Option<&str>, file_name: &str) -> String {
    match declared.map(str::trim) {
        Some(declared) if !declared.is_empty() => declared.to_string(),
        _ => mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string(),
    }
}

/// Reduce a stored file name to something safe inside a quoted
/// Content-Disposition parameter.
fn disposition_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned.to_string()
    }
}

async fn read_file_field(multipart: &mut Multipart) -> ApiResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_multipart("malformed multipart body", e))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field
            .file_name()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let content_type = resolve_content_type(field.content_type(), &name);
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::from_multipart("unreadable file field", e))?;

        return Ok(UploadedFile {
            name,
            content_type,
            content,
        });
    }
    Err(ApiError::BadRequest("missing file field".to_string()))
}

/// PUT /api/file - Store a file across the shard nodes.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let upload = read_file_field(&mut multipart).await?;
    let id = state
        .coordinator
        .put_file_item(&upload.name, &upload.content_type, upload.content)
        .await?;
    Ok(Json(UploadResponse { id: id.to_string() }))
}

/// GET /api/file/{id} - Download a file as an attachment.
pub async fn download_file(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&raw_id)?;
    let item = state.coordinator.get_file_item(id).await?;

    let content_type = HeaderValue::from_str(&item.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        disposition_file_name(&item.name)
    ))
    .map_err(|e| ApiError::Internal(format!("invalid content disposition: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(item.content.len())),
        ],
        item.content,
    )
        .into_response())
}

/// DELETE /api/file/{id} - Forget a file.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&raw_id)?;
    state.coordinator.delete_file_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_content_type() {
        assert_eq!(resolve_content_type(Some("image/png"), "a.txt"), "image/png");
        assert_eq!(resolve_content_type(None, "notes.txt"), "text/plain");
        assert_eq!(resolve_content_type(Some(" "), "page.html"), "text/html");
        assert_eq!(resolve_content_type(None, "blob"), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_disposition_file_name() {
        assert_eq!(disposition_file_name("report final.pdf"), "report final.pdf");
        assert_eq!(disposition_file_name("a\"b\\c\r\n.txt"), "a_b_c__.txt");
        assert_eq!(disposition_file_name("résumé.txt"), "r_sum_.txt");
        assert_eq!(disposition_file_name("\n"), "_");
        assert_eq!(disposition_file_name("  "), "download");
    }
}
