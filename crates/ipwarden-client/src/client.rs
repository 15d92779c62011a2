//! Linode API client implementation.

use crate::api::FirewallApi;
use crate::config::{normalize_url, HttpConfig, DEFAULT_API_URL};
use ipwarden_core::{Result, WardenError};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Linode API client
#[derive(Clone)]
pub struct LinodeClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    config: HttpConfig,
    token: String,
    base_url: String,
}

impl std::fmt::Debug for LinodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinodeClient")
            .field("base_url", &self.inner.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl LinodeClient {
    /// Create a new client with the given API token using default settings
    pub fn new(token: impl Into<String>) -> Result<Self> {
        LinodeClientBuilder::new(token).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(token: impl Into<String>) -> LinodeClientBuilder {
        LinodeClientBuilder::new(token)
    }

    /// Access cloud firewall endpoints
    #[must_use]
    pub fn firewalls(&self) -> FirewallApi<'_> {
        FirewallApi::new(self)
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Perform a GET request
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path);
        debug!(url = %url, "GET request");

        let response = self
            .inner
            .http
            .get(&url)
            .bearer_auth(&self.inner.token)
            .send()
            .await
            .map_err(|e| self.inner.config.transport_error(&e))?;

        self.handle_response(response).await
    }

    /// Perform a PUT request with JSON body
    pub(crate) async fn put<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        debug!(url = %url, "PUT request");

        let response = self
            .inner
            .http
            .put(&url)
            .bearer_auth(&self.inner.token)
            .json(body)
            .send()
            .await
            .map_err(|e| self.inner.config.transport_error(&e))?;

        self.handle_response(response).await
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Handle an API response that returns JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| self.inner.config.transport_error(&e))?;
            serde_json::from_str(&body).map_err(WardenError::Json)
        } else {
            Self::handle_error(status.as_u16(), response).await
        }
    }

    /// Convert an error response to a [`WardenError`]
    async fn handle_error<T>(status: u16, response: reqwest::Response) -> Result<T> {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await.unwrap_or_default();
        let message = error_reasons(&body).unwrap_or(body);

        match status {
            401 => Err(WardenError::Unauthorized),
            404 => Err(WardenError::NotFound { resource: message }),
            429 => {
                warn!("Rate limited by Linode API");
                Err(WardenError::RateLimited { retry_after })
            }
            _ => Err(WardenError::Api {
                code: status,
                message,
            }),
        }
    }
}

/// Extract `errors[].reason` from a Linode error body, joined with `; `
fn error_reasons(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let reasons: Vec<String> = value
        .get("errors")?
        .as_array()?
        .iter()
        .filter_map(|e| {
            let reason = e.get("reason")?.as_str()?;
            Some(match e.get("field").and_then(|f| f.as_str()) {
                Some(field) => format!("{field}: {reason}"),
                None => reason.to_string(),
            })
        })
        .collect();

    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join("; "))
    }
}

/// Builder for configuring a [`LinodeClient`]
pub struct LinodeClientBuilder {
    token: String,
    base_url: String,
    config: HttpConfig,
}

impl LinodeClientBuilder {
    /// Create a new builder with the given API token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_API_URL.to_string(),
            config: HttpConfig::default(),
        }
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<LinodeClient> {
        let base_url = normalize_url(&self.base_url)?;
        let http = self.config.http_client()?;

        Ok(LinodeClient {
            inner: Arc::new(ClientInner {
                http,
                config: self.config,
                token: self.token,
                base_url,
            }),
        })
    }
}
