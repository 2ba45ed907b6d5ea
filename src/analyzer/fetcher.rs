//! HTTP fetch capability
//!
//! This module handles every outbound request made during an analysis:
//! - Building the HTTP client with the configured user agent, timeouts and redirect limit
//! - GET requests for the primary document
//! - HEAD requests for link reachability probes
//!
//! The pipeline only sees the [`WebClient`] trait, so tests can substitute an
//! in-process implementation.

use crate::config::ClientConfig;
use crate::AnalyzerError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Method};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Status code and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code of the final response
    pub status: u16,

    /// Response body; empty for HEAD requests
    pub body: Vec<u8>,
}

/// Capability to perform one HTTP request
///
/// Any status code is a successful fetch; only transport failures are errors.
/// Implementations must return promptly once `token` is cancelled.
#[async_trait]
pub trait WebClient: Send + Sync {
    async fn fetch(
        &self,
        token: &CancellationToken,
        url: &str,
        method: Method,
    ) -> Result<FetchResponse, AnalyzerError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The client configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use page_analyzer::analyzer::build_http_client;
/// use page_analyzer::config::ClientConfig;
///
/// let client = build_http_client(&ClientConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`WebClient`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpWebClient {
    client: Client,
}

impl HttpWebClient {
    /// Creates a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, AnalyzerError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an already configured reqwest client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> AnalyzerError {
    let message = if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_redirect() {
        format!("redirect limit exceeded: {}", error)
    } else {
        error.to_string()
    };

    AnalyzerError::Fetch {
        url: url.to_string(),
        status: error.status().map(|status| status.as_u16()),
        message,
    }
}

#[async_trait]
impl WebClient for HttpWebClient {
    async fn fetch(
        &self,
        token: &CancellationToken,
        url: &str,
        method: Method,
    ) -> Result<FetchResponse, AnalyzerError> {
        tracing::trace!("{} {}", method, url);

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(AnalyzerError::Cancelled),
            response = self.client.request(method, url).send() => {
                response.map_err(|e| transport_error(url, e))?
            }
        };

        let status = response.status().as_u16();

        let body = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(AnalyzerError::Cancelled),
            body = response.bytes() => body.map_err(|e| transport_error(url, e))?,
        };

        tracing::trace!("{} returned {} ({} bytes)", url, status, body.len());

        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}
