//! Request id middleware and propagation to shard calls.
//!
//! The middleware stores the id in a task-local so that outbound shard
//! requests made anywhere below the handler can forward it. Tasks spawned by
//! [`crate::fanout::fan_out`] are re-scoped with the caller's id.

use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::future::Future;
use strata_core::{REQUEST_ID_HEADER, RequestId};
use tracing::Instrument;

tokio::task_local! {
    static CURRENT_REQUEST_ID: RequestId;
}

/// The request id of the request being served by this task, if any.
pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID.try_with(RequestId::clone).ok()
}

/// Run `fut` with `request_id` as the current request id.
pub async fn with_request_id<F: Future>(request_id: Option<RequestId>, fut: F) -> F::Output {
    match request_id {
        Some(id) => CURRENT_REQUEST_ID.scope(id, fut).await,
        None => fut.await,
    }
}

/// Adopt the caller's `x-request-id` (or mint one), run the request inside a
/// span carrying it, and echo it on the response.
pub async fn request_id_middleware(
    State(state): State<AppState>,
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
    let mut response = with_request_id(Some(request_id.clone()), next.run(req))
        .instrument(span)
        .await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
