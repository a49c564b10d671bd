//! The boundary to the content endpoints: one GET per page, no retries.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

use crate::auth::AuthHeader;
use crate::errors::Result;

/// A page that could not be fetched. `diagnostics` carries whatever the transport knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    pub diagnostics: BTreeMap<String, String>,
}

impl FetchFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagnostics: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.diagnostics.insert(key.to_string(), value.to_string());
        self
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Interface to the HTTP transport: fetch the body behind a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, auth: Option<&AuthHeader>) -> std::result::Result<Vec<u8>, FetchFailure>;
}

/// Fetches pages over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client with a request timeout. The core itself never times out a fetch.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, auth: Option<&AuthHeader>) -> std::result::Result<Vec<u8>, FetchFailure> {
        let mut request = self.client.get(url);
        if let Some(header) = auth {
            request = request.header(AUTHORIZATION, header.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchFailure::new(e.to_string()).with("url", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::new(format!("unexpected HTTP status {}", status))
                .with("url", url)
                .with("status", status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::new(e.to_string()).with("url", url).with("status", status.as_u16()))?;

        if body.is_empty() {
            return Err(FetchFailure::new("empty response body")
                .with("url", url)
                .with("status", status.as_u16()));
        }

        tracing::debug!("Fetched {} bytes from '{}'", body.len(), url);
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response on a local port and returns the URL to request.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}/?eID=sitemap&offset=0&limit=1", addr)
    }

    fn local_fetcher() -> HttpFetcher {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpFetcher::new(client)
    }

    #[test]
    fn test_failure_diagnostics() {
        let failure = FetchFailure::new("connection refused").with("url", "http://localhost/").with("status", 502);

        assert_eq!(failure.to_string(), "connection refused");
        assert_eq!(failure.diagnostics.get("status").map(String::as_str), Some("502"));
        assert_eq!(failure.diagnostics.len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_failure() {
        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:9/?offset=0&limit=1", None).await;

        let failure = result.unwrap_err();
        assert_eq!(failure.diagnostics.get("url").map(String::as_str), Some("http://127.0.0.1:9/?offset=0&limit=1"));
    }

    #[tokio::test]
    async fn test_error_status_is_failure() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\nbusy").await;
        let fetcher = local_fetcher();

        let failure = fetcher.fetch(&url, None).await.unwrap_err();
        assert!(failure.message.contains("503"), "unexpected message: {}", failure.message);
        assert_eq!(failure.diagnostics.get("status").map(String::as_str), Some("503"));
        assert_eq!(failure.diagnostics.get("url"), Some(&url));
    }

    #[tokio::test]
    async fn test_empty_body_is_failure() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let fetcher = local_fetcher();

        let failure = fetcher.fetch(&url, None).await.unwrap_err();
        assert_eq!(failure.message, "empty response body");
        assert_eq!(failure.diagnostics.get("status").map(String::as_str), Some("200"));
    }

    #[tokio::test]
    async fn test_body_is_returned() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<url></url>").await;
        let fetcher = local_fetcher();

        let body = fetcher.fetch(&url, None).await.unwrap();
        assert_eq!(body, b"<url></url>");
    }
}
