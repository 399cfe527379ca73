//! Client configuration.
//!
//! There is no global API root: every client is constructed from a `Config`.

use std::time::Duration;

use url::Url;

use crate::auth::Credentials;
use crate::error::ApiError;

pub const DEFAULT_API_BASE: &str = "https://api.pinboard.in/v1/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Large enough for a full `posts/all` export of a big account.
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 1 << 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub credentials: Credentials,
    /// Applied by transports that support it.
    pub timeout: Duration,
    /// Largest response body a transport will read.
    pub max_response_bytes: u64,
}

impl Config {
    /// Configuration for the public Pinboard API.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL"),
            credentials,
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    /// Point the client at another API root, e.g. a mock server.
    ///
    /// A trailing `/` is added when missing so endpoint paths resolve below
    /// the root rather than replacing its last segment.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ApiError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, bytes: u64) -> Self {
        self.max_response_bytes = bytes;
        self
    }

    /// Read configuration from `PINBOARD_*` environment variables.
    ///
    /// `PINBOARD_USER` is required, plus `PINBOARD_TOKEN` or
    /// `PINBOARD_PASSWORD`. `PINBOARD_API_BASE`, `PINBOARD_TIMEOUT_SECS` and
    /// `PINBOARD_MAX_RESPONSE_BYTES` are optional.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let user = lookup("PINBOARD_USER")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Config("PINBOARD_USER is required".to_string()))?;

        let mut credentials = Credentials::new(user);
        if let Some(token) = lookup("PINBOARD_TOKEN") {
            credentials = credentials.token(token);
        }
        if let Some(password) = lookup("PINBOARD_PASSWORD") {
            credentials = credentials.password(password);
        }
        // Surface a missing secret now rather than on the first call.
        credentials.mode()?;

        let mut config = Self::new(credentials);
        if let Some(base) = lookup("PINBOARD_API_BASE") {
            config = config.with_base_url(&base)?;
        }
        if let Some(secs) = lookup("PINBOARD_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ApiError::Config(format!(
                    "PINBOARD_TIMEOUT_SECS must be a whole number of seconds, got {secs:?}"
                ))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(bytes) = lookup("PINBOARD_MAX_RESPONSE_BYTES") {
            let bytes: u64 = bytes.parse().map_err(|_| {
                ApiError::Config(format!(
                    "PINBOARD_MAX_RESPONSE_BYTES must be a whole number of bytes, got {bytes:?}"
                ))
            })?;
            config = config.with_max_response_bytes(bytes);
        }
        Ok(config)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url =
        Url::parse(raw).map_err(|e| ApiError::Config(format!("invalid API base {raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::Config(format!("API base {raw:?} cannot have paths")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
