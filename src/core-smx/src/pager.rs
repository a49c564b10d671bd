//! Per-source pagination: fetch a page, persist it, decide whether to keep going.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::auth::AuthHeader;
use crate::errors::{Error, Result};
use crate::fetch::PageFetcher;
use crate::layout::{SitemapNaming, public_url};
use crate::notify::{ErrorEvent, NotificationSink};
use crate::sources::ExpandedSource;

/// Only this much of a page is searched for a content marker.
pub const EMPTINESS_WINDOW: u64 = 10 * 1024;

/// Literal that marks at least one URL entry in a sitemap page.
pub const CONTENT_MARKER: &[u8] = b"<url>";

/// A page file that was kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapPart {
    pub path: PathBuf,
    pub public_url: String,
    pub content_hash: String,
}

/// Why pagination of a source ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EmptyPage,
    DuplicatePage,
    FetchFailed,
    PageCap,
}

/// What a source contributed to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedSource {
    pub parts: Vec<SitemapPart>,
    pub stop_reason: StopReason,
}

#[derive(Debug)]
struct PagingState {
    offset: u64,
    file_sequence: u32,
    last_content_hash: Option<String>,
}

impl PagingState {
    fn new() -> Self {
        Self {
            offset: 0,
            file_sequence: 1,
            last_content_hash: None,
        }
    }
}

enum PageVerdict {
    Empty,
    Content { hash: String },
}

/// Drives the fetch/persist/check loop for one source at a time.
///
/// Pagination ends on the first empty page, the first page identical to its
/// predecessor, or the first failed fetch. Endpoints are expected to run out of
/// content eventually; `max_pages` is the only other bound.
pub struct SitemapPager<'a> {
    pub fetcher: &'a dyn PageFetcher,
    pub sink: &'a dyn NotificationSink,
    pub auth_header: Option<&'a AuthHeader>,
    pub naming: &'a SitemapNaming,
    pub site_root: &'a Path,
    pub base_url: &'a str,
    pub max_urls_per_sitemap: u32,
    pub max_pages: Option<u32>,
}

impl SitemapPager<'_> {
    pub async fn paginate(&self, source: &ExpandedSource) -> Result<PagedSource> {
        let token = source.key.index_token();
        let mut state = PagingState::new();
        let mut parts = Vec::new();

        let stop_reason = loop {
            if self.max_pages.is_some_and(|max| parts.len() >= max as usize) {
                tracing::warn!("Source '{}' reached the cap of {} pages", token, parts.len());
                break StopReason::PageCap;
            }

            let relative_path = self.naming.part_path(&token, state.file_sequence);
            state.file_sequence += 1;
            let path = self.site_root.join(&relative_path);
            let url = page_url(&source.url, state.offset, self.max_urls_per_sitemap);

            match self.fetcher.fetch(&url, self.auth_header).await {
                Ok(body) => write_page(&path, &body).await?,
                Err(failure) => {
                    self.sink.error(ErrorEvent::fetch_failed(&url, &failure));
                    remove_if_exists(&path).await?;
                    break StopReason::FetchFailed;
                }
            }

            match inspect_page(&path).await? {
                PageVerdict::Empty => {
                    tracing::debug!("Page {} of '{}' has no entries", relative_path, token);
                    remove_if_exists(&path).await?;
                    break StopReason::EmptyPage;
                }
                PageVerdict::Content { hash } if state.last_content_hash.as_deref() == Some(hash.as_str()) => {
                    tracing::warn!(
                        "Page {} of '{}' repeats the previous page (md5 {}); the endpoint may ignore the offset",
                        relative_path,
                        token,
                        hash
                    );
                    remove_if_exists(&path).await?;
                    break StopReason::DuplicatePage;
                }
                PageVerdict::Content { hash } => {
                    tracing::debug!("Accepted page {} at offset {}", relative_path, state.offset);
                    parts.push(SitemapPart {
                        public_url: public_url(self.base_url, &relative_path),
                        path: PathBuf::from(relative_path),
                        content_hash: hash.clone(),
                    });
                    state.last_content_hash = Some(hash);
                    state.offset += u64::from(self.max_urls_per_sitemap);
                }
            }
        };

        tracing::info!("Source '{}' produced {} sitemap file(s), stopped: {:?}", token, parts.len(), stop_reason);
        Ok(PagedSource { parts, stop_reason })
    }
}

/// Source URL with the paging parameters appended.
pub fn page_url(source_url: &str, offset: u64, limit: u32) -> String {
    format!("{}&offset={}&limit={}", source_url, offset, limit)
}

async fn write_page(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| Error::fs(parent, e))?;
    }
    tokio::fs::write(path, body).await.map_err(|e| Error::fs(path, e))
}

/// Empty unless the marker shows up within the first [`EMPTINESS_WINDOW`] bytes.
/// Otherwise hashed over the whole file.
async fn inspect_page(path: &Path) -> Result<PageVerdict> {
    let mut head = Vec::with_capacity(EMPTINESS_WINDOW as usize);
    {
        let file = tokio::fs::File::open(path).await.map_err(|e| Error::fs(path, e))?;
        file.take(EMPTINESS_WINDOW)
            .read_to_end(&mut head)
            .await
            .map_err(|e| Error::fs(path, e))?;
    }

    if !contains_marker(&head) {
        return Ok(PageVerdict::Empty);
    }

    let content = tokio::fs::read(path).await.map_err(|e| Error::fs(path, e))?;
    Ok(PageVerdict::Content {
        hash: format!("{:x}", md5::compute(&content)),
    })
}

fn contains_marker(bytes: &[u8]) -> bool {
    bytes.windows(CONTENT_MARKER.len()).any(|window| window == CONTENT_MARKER)
}

pub(crate) async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::fs(path, e)),
    }
}
