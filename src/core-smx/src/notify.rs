//! Error events raised during a run and where they go.

use std::collections::BTreeMap;

use crate::fetch::FetchFailure;

/// Structured error event for the host's notification surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub message: String,
    pub context: BTreeMap<String, String>,
}

impl ErrorEvent {
    /// Event for a page request that failed.
    pub fn fetch_failed(url: &str, failure: &FetchFailure) -> Self {
        Self {
            message: format!("Failed to request sitemap URL \"{}\": {}", url, failure.message),
            context: failure.diagnostics.clone(),
        }
    }
}

/// Receives error events. Routing (log, flash message, mail) is up to the implementation.
pub trait NotificationSink: Send + Sync {
    fn error(&self, event: ErrorEvent);
}

/// Sink that writes events to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn error(&self, event: ErrorEvent) {
        tracing::error!(context = ?event.context, "{}", event.message);
    }
}
