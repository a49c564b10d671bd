use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_smx::{RunReport, SitemapTask, StaticLanguages, rehydrate};

use crate::AppState;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("A sitemap run is already in progress")]
    InProgress,

    #[error(transparent)]
    Core(#[from] core_smx::Error),
}

impl IntoResponse for RunError {
    fn into_response(self) -> Response {
        let status = match self {
            RunError::InProgress => StatusCode::CONFLICT,
            RunError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));
        (status, body).into_response()
    }
}

// POST /api/sitemap/run - Generate all sitemaps and publish the index
pub async fn post_run(State(state): State<Arc<AppState>>) -> Result<Json<RunReport>, RunError> {
    let _running = state.run_lock.try_lock().map_err(|_| RunError::InProgress)?;

    let derived = rehydrate(&state.config, &state.auth).inspect_err(|e| tracing::error!("Rejecting run: {}", e))?;
    let languages = StaticLanguages(state.config.languages.clone());
    let task = SitemapTask::new(
        &state.config,
        derived,
        state.fetcher.as_ref(),
        state.sink.as_ref(),
        &languages,
    );

    let report = task.run().await.inspect_err(|e| tracing::error!("Sitemap run failed: {}", e))?;
    tracing::info!("Published {} with {} sitemap file(s)", report.index_url, report.entries());
    Ok(Json(report))
}
