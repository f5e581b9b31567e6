//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::request_id::request_id_middleware;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

/// Create the coordinator router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/file", put(handlers::upload_file))
        .route(
            "/api/file/{id}",
            get(handlers::download_file).delete(handlers::delete_file),
        )
        .route("/api/admin/cache/clear", post(handlers::clear_cache))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes));

    let health_routes = Router::new()
        .route("/live", get(handlers::live))
        .route("/ready", get(handlers::ready));

    let mut router: Router<AppState> = Router::new().merge(api_routes).merge(health_routes);

    // Unauthenticated; restrict at the network level when enabled.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

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
