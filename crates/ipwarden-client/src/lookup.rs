//! Public address discovery.

use crate::config::{normalize_url, HttpConfig, DEFAULT_LOOKUP_URL};
use ipwarden_core::{PublicIp, Result, WardenError};
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::debug;

/// Client for a plain-text "echo my IP" endpoint
#[derive(Debug, Clone)]
pub struct IpLookup {
    http: HttpClient,
    config: HttpConfig,
    url: String,
}

impl IpLookup {
    /// Lookup client for [`DEFAULT_LOOKUP_URL`]
    pub fn new() -> Result<Self> {
        IpLookupBuilder::new().build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> IpLookupBuilder {
        IpLookupBuilder::new()
    }

    /// Endpoint this client queries
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the caller's public IP address.
    ///
    /// The response body is read fully and trimmed; it is not validated.
    pub async fn current_ip(&self) -> Result<PublicIp> {
        debug!(url = %self.url, "GET request");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.config.transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.config.transport_error(&e))?;

        if !status.is_success() {
            return Err(WardenError::Api {
                code: status.as_u16(),
                message: body.trim().to_string(),
            });
        }

        Ok(PublicIp::from_body(&body))
    }
}

/// Builder for configuring an [`IpLookup`]
pub struct IpLookupBuilder {
    url: String,
    config: HttpConfig,
}

impl Default for IpLookupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IpLookupBuilder {
    /// Create a builder pointed at [`DEFAULT_LOOKUP_URL`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            url: DEFAULT_LOOKUP_URL.to_string(),
            config: HttpConfig::default(),
        }
    }

    /// Set the lookup endpoint
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<IpLookup> {
        let url = normalize_url(&self.url)?;
        let http = self.config.http_client()?;
        Ok(IpLookup {
            http,
            config: self.config,
            url,
        })
    }
}
