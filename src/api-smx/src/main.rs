use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use core_smx::{AuthSettings, HttpFetcher, TaskConfig, TracingSink, rehydrate, setup_logging};

use api_smx::{AppState, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if it exists
    dotenvy::dotenv().ok();

    setup_logging("api_smx=debug,core_smx=info,tower_http=debug");

    let config_path = std::env::var("SMX_CONFIG").context("SMX_CONFIG must point to the task configuration file")?;
    let config_path = std::path::PathBuf::from(config_path);
    let mut config = TaskConfig::load(&config_path)?;
    if config.ensure_index_file_path() {
        config.save(&config_path)?;
    }

    let auth = AuthSettings::from_env();
    // Fail at startup rather than on the first trigger.
    let derived = rehydrate(&config, &auth)?;
    tracing::info!("Sitemap index will be published at {}", derived.index_url());

    let timeout_secs = std::env::var("SMX_FETCH_TIMEOUT_S")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(300);
    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(timeout_secs))?;

    let state = Arc::new(AppState::new(config, auth, Arc::new(fetcher), Arc::new(TracingSink)));
    let app = routes::router(state);

    let addr = bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;
    tracing::info!("Trigger service listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// HOST and PORT, defaulting to `127.0.0.1:3000`.
fn bind_address() -> anyhow::Result<SocketAddr> {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = match std::env::var("PORT") {
        Ok(p) => p.trim().parse::<u16>().context("PORT must be a valid number")?,
        Err(_) => 3000,
    };
    format!("{}:{}", host, port)
        .parse::<SocketAddr>()
        .context("HOST must be an IP address")
}
