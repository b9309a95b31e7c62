//! Integration tests for the HTTP uptime collector
//!
//! These tests verify that:
//! - Healthy sites produce successful results
//! - Non-200 responses are failures, not errors
//! - Slow responses are judged against the site budget
//! - Unreachable sites are reported with status code 0

use std::time::Duration;

use assert_matches::assert_matches;
use site_pulse::collectors::{Collector, UptimeCollector};
use site_pulse::{Metrics, ResultKind};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::create_test_site;

#[tokio::test]
async fn test_uptime_check_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let site = create_test_site("villas", &format!("{}/", mock_server.uri()));
    let collector = UptimeCollector::new().unwrap();

    let result = collector.collect(&site).await;

    assert_eq!(collector.kind(), ResultKind::Uptime);
    assert_eq!(result.site, "villas");
    assert!(result.success);
    assert!(result.error.is_none());
    assert_matches!(result.metrics, Metrics::Uptime(m) if m.status_code == 200);
}

#[tokio::test]
async fn test_uptime_check_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let site = create_test_site("shop", &mock_server.uri());
    let result = UptimeCollector::new().unwrap().collect(&site).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("HTTP 503"));
    assert_matches!(result.metrics, Metrics::Uptime(m) if m.status_code == 503);
}

#[tokio::test]
async fn test_uptime_check_slow_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;

    let mut site = create_test_site("slow", &mock_server.uri());
    site.budget.uptime_threshold_ms = 50;

    let result = UptimeCollector::new().unwrap().collect(&site).await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.starts_with("Slow response: "), "{error}");
    assert!(error.ends_with("ms > 50ms"), "{error}");
}

#[tokio::test]
async fn test_uptime_check_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let site = create_test_site("hanging", &mock_server.uri());
    let collector = UptimeCollector::with_timeout(Duration::from_millis(100)).unwrap();

    let result = collector.collect(&site).await;

    assert!(!result.success);
    assert!(result.error.is_some());
    assert_matches!(result.metrics, Metrics::Uptime(m) if m.status_code == 0);
}

#[tokio::test]
async fn test_uptime_check_connection_refused() {
    // nothing listens on port 1
    let site = create_test_site("gone", "http://127.0.0.1:1/");
    let result = UptimeCollector::new().unwrap().collect(&site).await;

    assert!(!result.success);
    assert_matches!(result.metrics, Metrics::Uptime(m) if m.status_code == 0);
}
