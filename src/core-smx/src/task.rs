//! One sitemap index run, start to finish.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{DerivedState, TaskConfig};
use crate::errors::Result;
use crate::expand::{LanguageProvider, expand};
use crate::fetch::PageFetcher;
use crate::index_writer;
use crate::notify::NotificationSink;
use crate::pager::{SitemapPager, StopReason};

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub index_path: PathBuf,
    pub index_url: String,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    /// Number of sitemap files referenced by the index.
    pub fn entries(&self) -> usize {
        self.sources.iter().map(|s| s.parts.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub token: String,
    pub language_id: Option<u32>,
    pub parts: Vec<String>,
    pub stop_reason: StopReason,
}

/// Composes expansion, pagination and index publishing.
///
/// Sources are paginated strictly one after another. The index only becomes
/// visible once every source is drained.
pub struct SitemapTask<'a> {
    config: &'a TaskConfig,
    state: DerivedState,
    fetcher: &'a dyn PageFetcher,
    sink: &'a dyn NotificationSink,
    languages: &'a dyn LanguageProvider,
}

impl<'a> SitemapTask<'a> {
    pub fn new(
        config: &'a TaskConfig,
        state: DerivedState,
        fetcher: &'a dyn PageFetcher,
        sink: &'a dyn NotificationSink,
        languages: &'a dyn LanguageProvider,
    ) -> Self {
        Self {
            config,
            state,
            fetcher,
            sink,
            languages,
        }
    }

    pub fn state(&self) -> &DerivedState {
        &self.state
    }

    pub async fn run(&self) -> Result<RunReport> {
        let language_ids: Vec<u32> = if self.config.render_all_languages {
            self.languages.list_languages().iter().map(|l| l.id).collect()
        } else {
            Vec::new()
        };
        let sources = expand(&self.state.sources, self.config.render_all_languages, &language_ids);
        tracing::info!("Generating sitemaps for {} source(s)", sources.len());

        let pager = SitemapPager {
            fetcher: self.fetcher,
            sink: self.sink,
            auth_header: self.state.auth_header.as_ref(),
            naming: &self.state.naming,
            site_root: &self.config.site_root,
            base_url: &self.state.base_url,
            max_urls_per_sitemap: self.config.max_urls_per_sitemap,
            max_pages: self.config.max_pages_per_source,
        };

        let mut entries = Vec::new();
        let mut reports = Vec::with_capacity(sources.len());
        for source in &sources {
            let paged = pager.paginate(source).await?;
            let parts: Vec<String> = paged.parts.into_iter().map(|part| part.public_url).collect();
            entries.extend(parts.iter().cloned());
            reports.push(SourceReport {
                token: source.key.index_token(),
                language_id: source.language_id,
                parts,
                stop_reason: paged.stop_reason,
            });
        }

        let index_path = self.config.site_root.join(&self.state.index_file_path);
        let index_path = index_writer::write(&index_path, &entries).await?;

        Ok(RunReport {
            index_path,
            index_url: self.state.index_url(),
            sources: reports,
        })
    }
}
