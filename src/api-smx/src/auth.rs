use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use core_smx::is_authentication_valid;
use tracing::debug;

use crate::AppState;

/// Middleware guarding the trigger in scheduler-only mode.
/// Outside that mode requests pass through. Inside it, the request needs
/// `Authorization: Bearer <sha1 of the scheduler token>`.
pub async fn require_scheduler_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    if !state.auth.only_scheduler_mode {
        debug!("Scheduler-only mode off, passing request through");
        return Ok(next.run(request).await);
    }

    let token = state.auth.scheduler_token().map_err(|e| {
        tracing::error!("Cannot check trigger authentication: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Authentication is misconfigured")
    })?;

    if is_authentication_valid(request.headers(), &token) {
        debug!("Request authenticated");
        Ok(next.run(request).await)
    } else {
        debug!("Request not authenticated, returning 401");
        Err(error_response(StatusCode::UNAUTHORIZED, "Authentication required"))
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = Json(serde_json::json!({
        "error": message
    }));

    (status, body).into_response()
}
