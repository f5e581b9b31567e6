//! Coordinator and API error types.

use crate::shard_client::ShardError;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use strata_core::ShardId;
use strata_metadata::MetadataError;
use strata_storage::StorageError;
use thiserror::Error;

/// Errors raised by coordinator operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Malformed identifier, empty file or no shard nodes.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("metadata backend error: {0}")]
    Backend(#[from] MetadataError),

    #[error("staging error: {0}")]
    Staging(StorageError),

    #[error("shard {shard_id} call failed: {source}")]
    Shard {
        shard_id: ShardId,
        #[source]
        source: ShardError,
    },

    /// Fewer fragments came back than the descriptor lists.
    #[error("incomplete fetch: expected {expected} fragments, received {received}")]
    IncompleteFetch { expected: usize, received: usize },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for CoordinatorError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidKey(msg) => Self::Validation(msg),
            other => Self::Staging(other),
        }
    }
}

impl From<strata_core::Error> for CoordinatorError {
    fn from(e: strata_core::Error) -> Self {
        match e {
            strata_core::Error::InvalidHash(_) => Self::Internal(e.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Result type for coordinator operations.
pub type CoordinatorResult<T> = std::result::Result<T, CoordinatorError>;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

impl From<MetadataError> for ApiError {
    fn from(e: MetadataError) -> Self {
        Self::Coordinator(e.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Coordinator(e.into())
    }
}

impl ApiError {
    /// Map a multipart read failure. Bodies over the upload limit keep
    /// axum's 413.
    pub fn from_multipart(context: &str, e: MultipartError) -> Self {
        let message = format!("{context}: {e}");
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(message)
        } else {
            Self::BadRequest(message)
        }
    }

    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Internal(_) => "internal_error",
            Self::Coordinator(e) => match e {
                CoordinatorError::Validation(_) => "validation_error",
                CoordinatorError::NotFound(_) => "not_found",
                CoordinatorError::Backend(_) => "metadata_error",
                CoordinatorError::Staging(_) => "staging_error",
                CoordinatorError::Shard {
                    source: ShardError::NotFound { .. },
                    ..
                } => "fragment_not_found",
                CoordinatorError::Shard {
                    source: ShardError::Timeout { .. },
                    ..
                } => "shard_timeout",
                CoordinatorError::Shard { .. } => "shard_error",
                CoordinatorError::IncompleteFetch { .. } => "incomplete_fetch",
                CoordinatorError::ChecksumMismatch { .. } => "checksum_mismatch",
                CoordinatorError::Internal(_) => "internal_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Coordinator(e) => match e {
                CoordinatorError::Validation(_) => StatusCode::BAD_REQUEST,
                CoordinatorError::NotFound(_) => StatusCode::NOT_FOUND,
                CoordinatorError::Backend(MetadataError::NotFound(_)) => StatusCode::NOT_FOUND,
                CoordinatorError::Shard {
                    source: ShardError::NotFound { .. },
                    ..
                } => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(CoordinatorError::Validation("empty".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(CoordinatorError::NotFound("file".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(CoordinatorError::Shard {
                    shard_id: 1,
                    source: ShardError::NotFound {
                        address: "http://n1".into(),
                    },
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(CoordinatorError::Shard {
                    shard_id: 1,
                    source: ShardError::Timeout {
                        address: "http://n1".into(),
                    },
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(CoordinatorError::IncompleteFetch {
                    expected: 3,
                    received: 2,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
        }
    }

    #[test]
    fn test_invalid_staging_key_is_validation() {
        let error = CoordinatorError::from(StorageError::InvalidKey("../x".into()));
        assert!(matches!(error, CoordinatorError::Validation(_)));
    }

    #[test]
    fn test_core_errors_are_validation() {
        let error = CoordinatorError::from(strata_core::Error::EmptyContent);
        assert!(matches!(error, CoordinatorError::Validation(_)));
        assert_eq!(ApiError::from(error).code(), "validation_error");
    }
}
