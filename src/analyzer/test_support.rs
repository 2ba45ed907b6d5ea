//! In-process [`WebClient`] for unit tests

use crate::analyzer::fetcher::{FetchResponse, WebClient};
use crate::AnalyzerError;
use async_trait::async_trait;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: Vec<u8> },
    TransportError,
}

/// Serves canned replies per URL; unknown URLs answer 200 with an empty body
#[derive(Debug, Default)]
pub struct StubClient {
    replies: HashMap<String, Reply>,
    delay: Duration,
    requests: Mutex<Vec<(Method, String)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.replies.insert(
            url.to_string(),
            Reply::Respond {
                status,
                body: body.as_bytes().to_vec(),
            },
        );
        self
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_page(url, status, "")
    }

    pub fn with_bytes(mut self, url: &str, status: u16, body: &[u8]) -> Self {
        self.replies.insert(
            url.to_string(),
            Reply::Respond {
                status,
                body: body.to_vec(),
            },
        );
        self
    }

    pub fn with_transport_error(mut self, url: &str) -> Self {
        self.replies.insert(url.to_string(), Reply::TransportError);
        self
    }

    /// Delays every reply; the delay is abandoned when the token is cancelled
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebClient for StubClient {
    async fn fetch(
        &self,
        token: &CancellationToken,
        url: &str,
        method: Method,
    ) -> Result<FetchResponse, AnalyzerError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((method, url.to_string()));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let cancelled = tokio::select! {
            biased;
            _ = token.cancelled() => true,
            _ = tokio::time::sleep(self.delay) => false,
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if cancelled {
            return Err(AnalyzerError::Cancelled);
        }

        match self.replies.get(url) {
            Some(Reply::Respond { status, body }) => Ok(FetchResponse {
                status: *status,
                body: body.clone(),
            }),
            Some(Reply::TransportError) => Err(AnalyzerError::Fetch {
                url: url.to_string(),
                status: None,
                message: "connection refused".to_string(),
            }),
            None => Ok(FetchResponse {
                status: 200,
                body: Vec::new(),
            }),
        }
    }
}
