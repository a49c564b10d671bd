//! # Sitemap index generation
//!
//! Builds a sitemaps.org sitemap index by paging through content-listing endpoints.
//! Each page is stored as its own sitemap file; a source is done once a page comes back
//! empty, repeats its predecessor, or fails to load. The index referencing every kept
//! file is written to a temp file and renamed into place.
//!
//! ```no_run
//! use core_smx::{AuthSettings, HttpFetcher, SitemapTask, StaticLanguages, TaskConfig, TracingSink, rehydrate};
//!
//! # async fn example() -> Result<(), core_smx::Error> {
//! let mut config = TaskConfig::new("https://example.com/?eID=sitemap&sitemap=pages", "/var/www/site");
//! config.ensure_index_file_path();
//!
//! let state = rehydrate(&config, &AuthSettings::from_env())?;
//! let fetcher = HttpFetcher::with_timeout(std::time::Duration::from_secs(60))?;
//! let languages = StaticLanguages(config.languages.clone());
//! let report = SitemapTask::new(&config, state, &fetcher, &TracingSink, &languages).run().await?;
//! println!("{} -> {} sitemap(s)", report.index_url, report.entries());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod common;
pub mod config;
mod errors;
pub mod expand;
pub mod fetch;
pub mod index_writer;
pub mod layout;
pub mod mock;
pub mod notify;
pub mod pager;
pub mod sources;
pub mod task;

pub use auth::{AuthHeader, AuthSettings, auth_header, is_authentication_valid, token_digest};
pub use common::{env_flag, setup_logging};
pub use config::{DerivedState, TaskConfig, rehydrate};
pub use errors::{Error, Result};
pub use expand::{Language, LanguageProvider, StaticLanguages, expand};
pub use fetch::{FetchFailure, HttpFetcher, PageFetcher};
pub use notify::{ErrorEvent, NotificationSink, TracingSink};
pub use pager::{SitemapPager, SitemapPart, StopReason};
pub use sources::{ExpandedSource, Source, SourceKey, parse_endpoint_declarations};
pub use task::{RunReport, SitemapTask, SourceReport};
