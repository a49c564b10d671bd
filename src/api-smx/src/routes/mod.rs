use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{AppState, auth};

pub mod logging_middleware;
pub mod sitemap;

pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "healthy")
}

//
// Router
//

pub fn router(state: Arc<AppState>) -> Router {
    // Trigger routes (bearer token required in scheduler-only mode)
    let trigger_routes = Router::new()
        .route("/api/sitemap/run", post(sitemap::post_run))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_scheduler_token));

    Router::new()
        .route("/health", get(health_check))
        .merge(trigger_routes)
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware::log_route_access))
        .layer(TraceLayer::new_for_http())
}
