//! Client configuration shared by both HTTP clients.

use ipwarden_core::{Result, WardenError};
use std::time::Duration;

/// The Linode v4 API base URL
pub const DEFAULT_API_URL: &str = "https://api.linode.com/v4";

/// Plain-text "what is my IP" endpoint
pub const DEFAULT_LOOKUP_URL: &str = "http://ifconfig.me/ip";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport settings applied to every request a client makes
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Upper bound on a single request, connect to last body byte
    pub timeout: Duration,

    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("ipwarden/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Build a reqwest client from these settings
    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| WardenError::Http(format!("failed to build HTTP client: {e}")))
    }

    /// Map a reqwest transport failure, reporting timeouts with this config's bound
    pub(crate) fn transport_error(&self, err: &reqwest::Error) -> WardenError {
        if err.is_timeout() {
            WardenError::Timeout(self.timeout)
        } else {
            WardenError::Http(err.to_string())
        }
    }
}

/// Parse and normalize a base URL, dropping any trailing slash
pub(crate) fn normalize_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw).map_err(|e| WardenError::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(WardenError::InvalidUrl(format!(
            "{raw}: unsupported scheme {}",
            parsed.scheme()
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
