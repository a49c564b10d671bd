//! Task configuration and the state derived from it before a run.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthHeader, AuthSettings, auth_header};
use crate::errors::{Error, Result};
use crate::expand::Language;
use crate::layout::{SitemapNaming, base_url};
use crate::sources::{Source, parse_endpoint_declarations};

/// Directory (relative to the site root) for generated index paths.
pub const DEFAULT_FILE_DIR: &str = "temp/sitemaps";

/// Google's limit on entries in one sitemap file.
pub const DEFAULT_MAX_URLS_PER_SITEMAP: u32 = 50_000;

fn default_max_urls_per_sitemap() -> u32 {
    DEFAULT_MAX_URLS_PER_SITEMAP
}

/// Persisted configuration of the sitemap task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Newline-separated endpoint declarations: bare URLs or `key => url`.
    pub endpoints: String,
    #[serde(default = "default_max_urls_per_sitemap")]
    pub max_urls_per_sitemap: u32,
    #[serde(default)]
    pub render_all_languages: bool,
    /// Index file location relative to `site_root`. Generated once when missing.
    #[serde(default)]
    pub index_file_path: Option<String>,
    pub site_root: PathBuf,
    /// Site languages, in expansion order.
    #[serde(default)]
    pub languages: Vec<Language>,
    /// Stop a source after this many accepted pages. Unset means no cap.
    #[serde(default)]
    pub max_pages_per_source: Option<u32>,
}

impl TaskConfig {
    pub fn new(endpoints: impl Into<String>, site_root: impl Into<PathBuf>) -> Self {
        Self {
            endpoints: endpoints.into(),
            max_urls_per_sitemap: DEFAULT_MAX_URLS_PER_SITEMAP,
            render_all_languages: false,
            index_file_path: None,
            site_root: site_root.into(),
            languages: Vec::new(),
            max_pages_per_source: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| Error::fs(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Writes the configuration as pretty JSON, through a temp file so a crash never leaves half a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| Error::fs(&tmp_path, e))?;
        std::fs::rename(&tmp_path, path).map_err(|e| Error::fs(path, e))?;
        Ok(())
    }

    /// Picks a random index path if none is configured. Returns true when the
    /// configuration changed and should be persisted.
    pub fn ensure_index_file_path(&mut self) -> bool {
        if self.index_file_path.as_deref().is_some_and(|p| !p.trim().is_empty()) {
            return false;
        }
        let path = random_index_file_path(&mut rand::thread_rng());
        tracing::info!("Generated index file path '{}'", path);
        self.index_file_path = Some(path);
        true
    }
}

fn random_index_file_path<R: Rng>(rng: &mut R) -> String {
    let bytes: [u8; 12] = rng.r#gen();
    format!("{}/{}.xml", DEFAULT_FILE_DIR, hex::encode(bytes))
}

/// Everything a run needs that is computed from configuration rather than stored.
#[derive(Debug, Clone)]
pub struct DerivedState {
    pub sources: Vec<Source>,
    pub index_file_path: String,
    pub naming: SitemapNaming,
    pub auth_header: Option<AuthHeader>,
    pub base_url: String,
}

impl DerivedState {
    pub fn index_url(&self) -> String {
        crate::layout::public_url(&self.base_url, &self.index_file_path)
    }
}

/// Validates the configuration and derives the run state. Fails before any fetch happens.
pub fn rehydrate(config: &TaskConfig, auth: &AuthSettings) -> Result<DerivedState> {
    if config.max_urls_per_sitemap == 0 {
        return Err(Error::Config("max_urls_per_sitemap must be a positive number".to_string()));
    }

    let index_file_path = config
        .index_file_path
        .clone()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| Error::Config("index_file_path is not initialized".to_string()))?;

    let sources = parse_endpoint_declarations(&config.endpoints)?;
    let base_url = base_url(&sources[0].url)?;

    Ok(DerivedState {
        naming: SitemapNaming::from_index_path(&index_file_path),
        auth_header: auth_header(auth)?,
        base_url,
        sources,
        index_file_path,
    })
}
