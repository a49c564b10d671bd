//! Scripted collaborators for tests
//!
//! `MockFetcher` answers from a table of URL → response and records every request,
//! so tests can drive pagination without a network. `RecordingSink` keeps the
//! error events it receives.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::auth::AuthHeader;
use crate::fetch::{FetchFailure, PageFetcher};
use crate::notify::{ErrorEvent, NotificationSink};

/// A sitemap page with one `<url>` entry per location.
pub fn sitemap_page(locations: &[&str]) -> Vec<u8> {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for loc in locations {
        xml.push_str(&format!("<url><loc>{}</loc></url>\n", loc));
    }
    xml.push_str("</urlset>\n");
    xml.into_bytes()
}

/// A request the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub authorization: Option<String>,
}

/// Fetcher that answers from a script. Unscripted URLs get an empty `<urlset>`.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, Result<Vec<u8>, FetchFailure>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the body returned for `url`.
    pub fn with_page(mut self, url: &str, body: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), Ok(body));
        self
    }

    /// Scripts a failure for `url`.
    pub fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.responses
            .insert(url.to_string(), Err(FetchFailure::new(message).with("url", url)));
        self
    }

    /// Every request so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str, auth: Option<&AuthHeader>) -> Result<Vec<u8>, FetchFailure> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                url: url.to_string(),
                authorization: auth.map(|h| h.as_str().to_string()),
            });
        }
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(sitemap_page(&[])))
    }
}

/// Sink that keeps every event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ErrorEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ErrorEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn error(&self, event: ErrorEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
