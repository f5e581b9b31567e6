//! Route configuration.

use crate::handlers;
use crate::request_id::request_id_middleware;
use crate::state::NodeState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, put};
use tower_http::trace::TraceLayer;

/// Allowance for the multipart boundaries, part headers and `id` field that
/// wrap a fragment on top of `server.max_upload_bytes`.
pub const MULTIPART_ENVELOPE_BYTES: usize = 64 * 1024;

/// Request body limit for a node accepting fragments of up to
/// `max_fragment_bytes`.
pub fn fragment_body_limit(max_fragment_bytes: usize) -> usize {
    max_fragment_bytes.saturating_add(MULTIPART_ENVELOPE_BYTES)
}

/// Create the shard node router.
pub fn create_router(state: NodeState) -> Router {
    let mut router: Router<NodeState> = Router::new()
        .route("/api/filepart", put(handlers::put_filepart))
        .route("/api/filepart/{id}", get(handlers::get_filepart))
        .route("/live", get(handlers::live))
        .route("/ready", get(handlers::ready))
        .layer(DefaultBodyLimit::max(fragment_body_limit(
            state.config.server.max_upload_bytes,
        )));

    if state.config.server.enable_tracing {
        router = router
            .layer(middleware::from_fn_with_state(
                state.clone(),
                request_id_middleware,
            ))
            .layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}
