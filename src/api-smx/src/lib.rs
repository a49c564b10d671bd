pub mod auth;
pub mod routes;

use std::sync::Arc;

use core_smx::{AuthSettings, NotificationSink, PageFetcher, TaskConfig};
use tokio::sync::Mutex;

/// Shared by all handlers. The configuration must already have its index path initialized.
pub struct AppState {
    pub config: TaskConfig,
    pub auth: AuthSettings,
    pub fetcher: Arc<dyn PageFetcher>,
    pub sink: Arc<dyn NotificationSink>,
    /// Held for the duration of a run: the host executes one job at a time.
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(
        config: TaskConfig,
        auth: AuthSettings,
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            auth,
            fetcher,
            sink,
            run_lock: Mutex::new(()),
        }
    }
}
