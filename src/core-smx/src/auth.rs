//! Scheduler token handling: the bearer header sent with fetches and checked on triggers.

use std::env;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use sha1::{Digest, Sha1};

use crate::common::env_flag;
use crate::errors::{Error, Result};

/// Number of trailing encryption-key characters used when no scheduler token is configured.
const FALLBACK_TOKEN_LEN: usize = 12;

static BEARER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Bearer\s+(\S+)$").expect("static regex"));

/// Site-wide settings that decide whether fetches and triggers are authenticated.
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    /// Content endpoints and the trigger only accept requests from the scheduler.
    pub only_scheduler_mode: bool,
    pub scheduler_token: Option<String>,
    /// The host's system-wide encryption key, the token source of last resort.
    pub encryption_key: Option<String>,
}

impl AuthSettings {
    /// Reads SMX_ONLY_SCHEDULER_MODE, SMX_SCHEDULER_TOKEN and SMX_ENCRYPTION_KEY.
    pub fn from_env() -> Self {
        Self {
            only_scheduler_mode: env_flag("SMX_ONLY_SCHEDULER_MODE"),
            scheduler_token: env::var("SMX_SCHEDULER_TOKEN").ok(),
            encryption_key: env::var("SMX_ENCRYPTION_KEY").ok(),
        }
    }

    /// The configured token, or the last 12 characters of the encryption key when the token is unset or empty.
    pub fn scheduler_token(&self) -> Result<String> {
        if let Some(token) = self.scheduler_token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(token.to_string());
        }

        let key = self.encryption_key.as_deref().unwrap_or_default();
        if key.is_empty() {
            return Err(Error::Config(
                "scheduler-only mode needs SMX_SCHEDULER_TOKEN or SMX_ENCRYPTION_KEY".to_string(),
            ));
        }
        let skip = key.chars().count().saturating_sub(FALLBACK_TOKEN_LEN);
        Ok(key.chars().skip(skip).collect())
    }
}

/// Value of the `Authorization` header attached to every fetch of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader(String);

impl AuthHeader {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthHeader(Bearer ***)")
    }
}

/// Lowercase hex SHA-1 of the token: the bearer credential shared by fetcher and trigger.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha1::digest(token.as_bytes()))
}

/// The header to send with fetches, or `None` outside scheduler-only mode.
pub fn auth_header(settings: &AuthSettings) -> Result<Option<AuthHeader>> {
    if !settings.only_scheduler_mode {
        return Ok(None);
    }
    let token = settings.scheduler_token()?;
    Ok(Some(AuthHeader(format!("Bearer {}", token_digest(&token)))))
}

/// True if an `Authorization` header value carries the bearer digest of `token`.
pub fn bearer_matches(header_value: &str, token: &str) -> bool {
    BEARER
        .captures(header_value.trim())
        .and_then(|captures| captures.get(1))
        .is_some_and(|credential| credential.as_str().trim() == token_digest(token))
}

/// Checks a request's headers against the scheduler token. Header names are case-insensitive.
pub fn is_authentication_valid(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| bearer_matches(value, token))
}
