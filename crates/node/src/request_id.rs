//! Request id middleware.

use crate::state::NodeState;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use strata_core::{REQUEST_ID_HEADER, RequestId};
use tracing::Instrument;

/// Adopt the caller's `x-request-id` (or mint one), run the request inside a
/// span carrying it, and echo it on the response.
pub async fn request_id_middleware(
    State(state): State<NodeState>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(RequestId::from_client)
        .unwrap_or_default();
    req.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        service = %state.config.server.service_name,
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
