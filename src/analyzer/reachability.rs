//! Link reachability probing
//!
//! Probes every link with a HEAD request through a dedicated [`TaskPool`] whose
//! worker count is the probe concurrency ceiling. The sub-pool's lifetime is a
//! child of the calling task's token, so cancelling the analysis cancels every
//! probe in flight.

use crate::analyzer::extract::LinkInfo;
use crate::analyzer::fetcher::WebClient;
use crate::pool::{PoolConfig, TaskPool};
use crate::AnalyzerError;
use reqwest::Method;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Default number of probes allowed in flight at once
pub const DEFAULT_PROBE_CONCURRENCY: usize = 10;

/// Bounded fan-out of reachability probes
#[derive(Clone)]
pub struct LinkProbe {
    client: Arc<dyn WebClient>,
    concurrency: usize,
}

impl LinkProbe {
    /// Creates a probe that keeps at most `concurrency` requests in flight
    pub fn new(client: Arc<dyn WebClient>, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// The concurrency ceiling
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Probes every link and counts the inaccessible ones
    ///
    /// A link is inaccessible if its HEAD request fails in transport or returns
    /// a status of 400 or above. Probe failures are findings, so the sub-pool
    /// runs without fail-fast and every probe reports.
    ///
    /// # Arguments
    ///
    /// * `token` - Lifetime of the calling task
    /// * `links` - Links to probe; duplicates are probed once per occurrence
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - Number of inaccessible links
    /// * `Err(AnalyzerError::Cancelled)` - The run was cancelled before every probe reported
    pub async fn count_inaccessible(
        &self,
        token: &CancellationToken,
        links: &[LinkInfo],
    ) -> Result<usize, AnalyzerError> {
        if links.is_empty() {
            return Ok(0);
        }

        let workers = self.concurrency.min(links.len());
        let mut pool: TaskPool<usize, bool, Infallible> =
            TaskPool::new(token, PoolConfig::new(workers, false));
        let handle = pool.handle();

        tracing::debug!(
            "Probing {} links with {} concurrent requests",
            links.len(),
            workers
        );

        let feed = async {
            for (index, link) in links.iter().enumerate() {
                let client = self.client.clone();
                let url = link.url.clone();
                let submitted = handle
                    .submit(index, move |token| async move {
                        Ok(probe(client.as_ref(), &token, &url).await)
                    })
                    .await;
                if let Err(e) = submitted {
                    tracing::debug!("Stopped submitting probes: {}", e);
                    break;
                }
            }
        };

        let collect = async {
            let mut reported = 0;
            let mut inaccessible = 0;
            while reported < links.len() {
                let Some(result) = pool.next_result().await else {
                    return Err(AnalyzerError::Cancelled);
                };
                reported += 1;
                if let Ok(false) = result.outcome {
                    inaccessible += 1;
                }
            }
            Ok(inaccessible)
        };

        let ((), counted) = tokio::join!(feed, collect);
        pool.shutdown().await;

        let inaccessible = counted?;
        tracing::debug!("{} of {} links are inaccessible", inaccessible, links.len());
        Ok(inaccessible)
    }
}

/// Returns true if the link answered a HEAD request with a status below 400
async fn probe(client: &dyn WebClient, token: &CancellationToken, url: &str) -> bool {
    match client.fetch(token, url, Method::HEAD).await {
        Ok(response) if response.status < 400 => true,
        Ok(response) => {
            tracing::debug!("Link {} returned status {}", url, response.status);
            false
        }
        Err(e) => {
            tracing::debug!("Link {} is unreachable: {}", url, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::test_support::StubClient;
    use std::time::Duration;

    fn links(urls: &[&str]) -> Vec<LinkInfo> {
        urls.iter()
            .map(|url| LinkInfo {
                url: url.to_string(),
                internal: true,
            })
            .collect()
    }

    fn mixed_client() -> StubClient {
        StubClient::new()
            .with_status("http://x.test/ok", 200)
            .with_status("http://x.test/moved", 301)
            .with_status("http://x.test/missing", 404)
            .with_status("http://x.test/broken", 500)
            .with_transport_error("http://x.test/down")
    }

    #[tokio::test]
    async fn test_empty_link_list() {
        let probe = LinkProbe::new(Arc::new(StubClient::new()), 5);
        let token = CancellationToken::new();
        assert_eq!(probe.count_inaccessible(&token, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_is_independent_of_concurrency() {
        let urls = links(&[
            "http://x.test/ok",
            "http://x.test/moved",
            "http://x.test/missing",
            "http://x.test/broken",
            "http://x.test/down",
            "http://x.test/ok",
            "http://x.test/missing",
        ]);

        for concurrency in [1, 5, urls.len()] {
            let probe = LinkProbe::new(Arc::new(mixed_client()), concurrency);
            let token = CancellationToken::new();
            let count = probe.count_inaccessible(&token, &urls).await.unwrap();
            assert_eq!(count, 4, "concurrency {}", concurrency);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_probes_stay_under_ceiling() {
        let client = Arc::new(StubClient::new().with_delay(Duration::from_millis(15)));
        let urls: Vec<_> = (0..20)
            .map(|i| LinkInfo {
                url: format!("http://x.test/{}", i),
                internal: true,
            })
            .collect();

        let probe = LinkProbe::new(client.clone(), 3);
        let token = CancellationToken::new();
        let count = probe.count_inaccessible(&token, &urls).await.unwrap();

        assert_eq!(count, 0);
        assert!(client.peak_in_flight() <= 3);
        assert!(client.peak_in_flight() >= 1);
        assert_eq!(client.requests().len(), 20);
    }

    #[tokio::test]
    async fn test_probes_use_head() {
        let client = Arc::new(mixed_client());
        let probe = LinkProbe::new(client.clone(), 2);
        let token = CancellationToken::new();
        probe
            .count_inaccessible(&token, &links(&["http://x.test/ok"]))
            .await
            .unwrap();

        assert_eq!(
            client.requests(),
            vec![(Method::HEAD, "http://x.test/ok".to_string())]
        );
    }

    #[tokio::test]
    async fn test_cancellation_fails_probe() {
        let client = Arc::new(StubClient::new().with_delay(Duration::from_secs(3600)));
        let probe = LinkProbe::new(client, 2);
        let token = CancellationToken::new();
        let urls = links(&["http://x.test/1", "http://x.test/2", "http://x.test/3"]);

        let canceller = {
            let token = token.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token.cancel();
            }
        };

        let (result, ()) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(probe.count_inaccessible(&token, &urls), canceller)
        })
        .await
        .expect("probe did not observe cancellation");

        assert!(matches!(result, Err(AnalyzerError::Cancelled)));
    }
}
