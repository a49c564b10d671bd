//! Error types for sitemap index generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a run. Fetch failures are not in here: they end a single
/// source's pagination and are reported through the notification sink instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The task configuration cannot produce a run (bad declarations, bad URLs, missing token material).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reading, writing, renaming or deleting a file failed.
    #[error("Filesystem error on '{}': {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted task configuration is not valid JSON for this version.
    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Result with the crate's Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("not a valid URL: {}", err))
    }
}
