// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for the inverter's local API.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::TransportError;
use crate::protocol::{Endpoint, Transport};

// ============================================================================
// HttpConfig
// ============================================================================

/// Connection parameters for an inverter.
///
/// The device API is plaintext HTTP on the local network; there are no
/// credentials and no TLS.
///
/// # Examples
///
/// ```
/// use ezhi_local::protocol::HttpConfig;
///
/// let config = HttpConfig::new("192.168.1.100");
/// assert_eq!(config.base_url(), "http://192.168.1.100");
///
/// let config = HttpConfig::new("192.168.1.100").with_port(8080);
/// assert_eq!(config.base_url(), "http://192.168.1.100:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default TCP connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

    /// Creates a new configuration for the specified host.
    ///
    /// `host` may be a bare IP address or hostname, or a full `http://` URL.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    ///
    /// Ignored when the host is a full URL; give the port inside that URL
    /// instead.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the TCP connect timeout.
    ///
    /// The per-request timeout is chosen by the caller of
    /// [`Transport::fetch`].
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Builds the base URL from this configuration.
    ///
    /// A host that already carries a scheme is used verbatim, without the
    /// configured port.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            return self.host.trim_end_matches('/').to_string();
        }
        if self.port == Self::DEFAULT_PORT {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }

    /// Creates an [`HttpClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be
    /// created.
    pub fn into_client(self) -> Result<HttpClient, TransportError> {
        if self.host.trim().is_empty() {
            return Err(TransportError::InvalidAddress(
                "host is required".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(HttpClient {
            base_url: self.base_url(),
            client,
        })
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// reqwest-backed [`Transport`] for one inverter.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use ezhi_local::protocol::{Endpoint, HttpConfig, Transport};
///
/// # async fn example() -> ezhi_local::Result<()> {
/// let client = HttpConfig::new("192.168.1.100").into_client()?;
/// let body = client
///     .fetch(Endpoint::DeviceInfo, &[], Duration::from_secs(5))
///     .await?;
/// println!("{body}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Creates a client for the specified host with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(host: impl Into<String>) -> Result<Self, TransportError> {
        HttpConfig::new(host).into_client()
    }

    /// Returns the base URL of the device.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for an endpoint, without query parameters.
    fn build_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl Transport for HttpClient {
    async fn fetch(
        &self,
        endpoint: Endpoint,
        query: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        let url = self.build_url(endpoint);

        tracing::debug!(%endpoint, url = %url, ?query, "Sending HTTP request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(&e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(&e, timeout))?;

        tracing::debug!(%endpoint, body = %body, "Received HTTP response");

        serde_json::from_str(&body)
            .map_err(|e| TransportError::MalformedJson(e.to_string()))
    }
}
