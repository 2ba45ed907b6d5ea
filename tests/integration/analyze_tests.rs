//! End-to-end analysis runs
//!
//! These tests use wiremock to serve pages and link targets and run the full
//! two-stage pipeline over real HTTP.

use page_analyzer::analyzer::{HttpWebClient, TaskLabel};
use page_analyzer::config::{AnalyzerConfig, ClientConfig};
use page_analyzer::output::AnalysisReport;
use page_analyzer::{Analyzer, AnalyzerError, PipelineStage};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates an analyzer backed by a real HTTP client
fn create_analyzer(probe_concurrency: usize) -> Analyzer {
    let client = HttpWebClient::new(&ClientConfig {
        request_timeout_secs: 2,
        connect_timeout_secs: 1,
        ..ClientConfig::default()
    })
    .expect("Failed to build HTTP client");

    Analyzer::new(
        Arc::new(client),
        AnalyzerConfig {
            analysis_workers: Some(4),
            probe_concurrency,
            queue_capacity: None,
        },
    )
}

fn scenario_page(external: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Scenario</title></head>
<body>
  <h1>Heading</h1>
  <h2>First</h2>
  <h2>Second</h2>
  <a href="/a">internal</a>
  <a href="{}/">external</a>
</body>
</html>"#,
        external
    )
}

#[tokio::test]
async fn test_full_analysis_with_broken_internal_link() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(scenario_page(&other.uri()))
                .insert_header("content-type", "text/html"),
        )
        .mount(&site)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&site)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&other)
        .await;

    let token = CancellationToken::new();
    let outcome = create_analyzer(5).analyze(&token, &site.uri()).await;

    assert_eq!(outcome.stage, PipelineStage::Done, "error: {:?}", outcome.error);
    let result = outcome.into_result().expect("analysis should succeed");

    assert_eq!(result.status_code, Some(200));
    assert_eq!(result.html_version, "HTML5");
    assert_eq!(result.title, "Scenario");
    assert_eq!(result.headings.get("h1"), 1);
    assert_eq!(result.headings.get("h2"), 2);
    for tag in ["h3", "h4", "h5", "h6"] {
        assert_eq!(result.headings.get(tag), 0);
    }
    // Same host on a different port is external
    assert_eq!(result.internal_links, 1);
    assert_eq!(result.external_links, 1);
    assert_eq!(result.inaccessible_links, 1);
    assert!(!result.has_login_form);
}

#[tokio::test]
async fn test_not_found_stops_after_prerequisite_stage() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&site)
        .await;

    let url = format!("{}/missing", site.uri());
    let token = CancellationToken::new();
    let outcome = create_analyzer(5).analyze(&token, &url).await;

    assert_eq!(outcome.stage, PipelineStage::Failed);
    assert_eq!(outcome.failed_in, Some(PipelineStage::Prerequisite));
    assert_eq!(outcome.result.status_code, Some(404));
    assert_eq!(outcome.result.html_version, "");
    assert_eq!(outcome.result.internal_links, 0);

    let error = outcome.error.as_ref().expect("error expected");
    assert!(matches!(
        error,
        AnalyzerError::Task {
            label: TaskLabel::FetchPage,
            ..
        }
    ));

    // The report carries the observed status as its error code
    let report = AnalysisReport::from_outcome(&url, &outcome);
    assert_eq!(report.error.as_ref().map(|e| e.code), Some(404));

    // Only the primary fetch reached the server
    let requests = site.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method.to_string(), "GET");
}

#[tokio::test]
async fn test_unreachable_links_count_as_inaccessible() {
    let site = MockServer::start().await;

    let page = r##"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN">
<html><head><title>Login</title></head>
<body>
  <form action="/login"><input name="user"><input type="password" name="pass"></form>
  <a href="/ok">ok</a>
  <a href="/gone">gone</a>
  <a href="http://127.0.0.1:1/refused">refused</a>
  <a href="mailto:admin@example.com">mail</a>
  <a href="#top">top</a>
</body></html>"##;

    Mock::given(method("GET"))
        .and(path("/login-page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&site)
        .await;
    // The #top anchor is probed as the page itself
    Mock::given(method("HEAD"))
        .and(path("/login-page"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&site)
        .await;

    let token = CancellationToken::new();
    for concurrency in [1, 3] {
        let result = create_analyzer(concurrency)
            .analyze(&token, &format!("{}/login-page", site.uri()))
            .await
            .into_result()
            .expect("analysis should succeed");

        assert_eq!(result.html_version, "HTML 4.01 Transitional");
        assert_eq!(result.title, "Login");
        assert!(result.has_login_form);
        assert_eq!(result.internal_links, 3);
        assert_eq!(result.external_links, 1);
        assert_eq!(result.inaccessible_links, 2, "concurrency {}", concurrency);
    }
}

#[tokio::test]
async fn test_transport_failure_on_primary_fetch() {
    let token = CancellationToken::new();
    let outcome = create_analyzer(2)
        .analyze(&token, "http://127.0.0.1:1/")
        .await;

    assert_eq!(outcome.stage, PipelineStage::Failed);
    assert_eq!(outcome.result.status_code, None);

    let error = outcome.error.expect("error expected");
    assert!(matches!(error.root_cause(), AnalyzerError::Fetch { status: None, .. }));
    assert!(error.is_client_error());
}

#[tokio::test]
async fn test_deadline_cancels_slow_probes() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<!DOCTYPE html><a href="/slow-1">1</a><a href="/slow-2">2</a>"#,
        ))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&site)
        .await;

    let analyzer = Analyzer::new(
        Arc::new(
            HttpWebClient::new(&ClientConfig {
                request_timeout_secs: 60,
                ..ClientConfig::default()
            })
            .expect("Failed to build HTTP client"),
        ),
        AnalyzerConfig::default(),
    );

    let url = site.uri();
    let token = CancellationToken::new();
    let deadline = {
        let token = token.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            token.cancel();
        }
    };

    let (outcome, ()) = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(analyzer.analyze(&token, &url), deadline)
    })
    .await
    .expect("cancellation should end the run promptly");

    assert_eq!(outcome.stage, PipelineStage::Failed);
    assert_eq!(outcome.failed_in, Some(PipelineStage::Analysis));
    // Stage-1 facts survive the failure
    assert_eq!(outcome.result.status_code, Some(200));
    assert!(outcome.result.document.is_some());
}
