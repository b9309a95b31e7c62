//! End-to-end runs over a temporary data directory
//!
//! These tests verify that:
//! - An uptime run collects, stores and alerts
//! - A quiet run sends nothing
//! - Externally collected results are baselined across runs
//! - Status updates are sent even when nothing is wrong

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;
use site_pulse::collectors::UptimeCollector;
use site_pulse::pipeline::{NotifyMode, Pipeline};
use site_pulse::storage::ResultStore;
use site_pulse::{ResultKind, Severity};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{create_order_result, create_test_config, create_test_site, webhook_sink};

async fn mock_sink() -> MockServer {
    let sink = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&sink)
        .await;
    sink
}

async fn sent(sink: &MockServer) -> Vec<Value> {
    sink.received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_uptime_run_alerts_on_failing_site() {
    let sites = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&sites)
        .await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&sites)
        .await;
    let sink = mock_sink().await;

    let dir = tempdir().unwrap();
    let mut config = create_test_config(
        vec![
            create_test_site("up", &format!("{}/up", sites.uri())),
            create_test_site("down", &format!("{}/down", sites.uri())),
        ],
        dir.path(),
    );
    config.notifications = webhook_sink(format!("{}/hook", sink.uri()));

    let pipeline = Pipeline::open(config).await.unwrap();
    let results = pipeline.collect(Arc::new(UptimeCollector::new().unwrap())).await;
    let report = pipeline.ingest(ResultKind::Uptime, results).await.unwrap();

    assert!(report.has_failures());
    assert!(pipeline.notify(&report, NotifyMode::Alerts).await);

    let bodies = sent(&sink).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["title"], "🚨 Site Uptime Alert");
    let fields = bodies[0]["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    assert!(fields[0]["name"].as_str().unwrap().starts_with("down ("));

    assert_eq!(pipeline.store().latest(ResultKind::Uptime).await.len(), 2);
    assert!(dir.path().join("uptime/uptime-latest.json").exists());
}

#[tokio::test]
async fn test_healthy_run_is_silent_but_reports_status() {
    let sites = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&sites)
        .await;
    let sink = mock_sink().await;

    let dir = tempdir().unwrap();
    let mut config = create_test_config(vec![create_test_site("up", &sites.uri())], dir.path());
    config.notifications = webhook_sink(format!("{}/hook", sink.uri()));

    let pipeline = Pipeline::open(config).await.unwrap();
    let results = pipeline.collect(Arc::new(UptimeCollector::new().unwrap())).await;
    let report = pipeline.ingest(ResultKind::Uptime, results).await.unwrap();

    assert!(!report.has_failures());
    assert!(!pipeline.notify(&report, NotifyMode::Alerts).await);
    assert!(sent(&sink).await.is_empty());

    assert!(pipeline.notify(&report, NotifyMode::Status).await);
    let bodies = sent(&sink).await;
    assert_eq!(bodies[0]["title"], "📊 Uptime Check Complete");
    assert_eq!(bodies[0]["fields"][1]["value"], "All systems operational");
}

#[tokio::test]
async fn test_order_spike_across_runs() {
    let sink = mock_sink().await;
    let dir = tempdir().unwrap();
    let mut config = create_test_config(
        vec![create_test_site("store", "https://store.example")],
        dir.path(),
    );
    config.notifications = webhook_sink(format!("{}/hook", sink.uri()));

    // one run per day over the last week
    let start = Utc::now() - Duration::days(8);
    for (day, orders) in [10, 11, 9, 10, 12, 10, 11].into_iter().enumerate() {
        let pipeline = Pipeline::open(config.clone()).await.unwrap();
        let result = create_order_result("store", orders).at(start + Duration::days(day as i64));
        let report = pipeline.ingest(ResultKind::Commerce, vec![result]).await.unwrap();
        assert!(!report.should_alert());
    }

    let pipeline = Pipeline::open(config.clone()).await.unwrap();
    let report = pipeline
        .ingest(ResultKind::Commerce, vec![create_order_result("store", 35)])
        .await
        .unwrap();

    let spike = report
        .anomalies()
        .find(|a| a.anomaly_type == "order_spike")
        .unwrap();
    assert_eq!(spike.severity, Severity::High);
    assert!(spike.message.contains("35"));
    assert!(spike.message.contains("10"));

    // the alert run only sees stored data
    let pipeline = Pipeline::open(config).await.unwrap();
    let latest = pipeline.report_latest(ResultKind::Commerce).await;
    assert!(latest.should_alert());
    assert!(pipeline.notify(&latest, NotifyMode::Alerts).await);

    let bodies = sent(&sink).await;
    assert_eq!(bodies[0]["title"], "🛒 Order Anomaly Alert");
}

#[tokio::test]
async fn test_results_of_unknown_sites_are_not_stored() {
    let dir = tempdir().unwrap();
    let config = create_test_config(vec![create_test_site("store", "https://store.example")], dir.path());
    let pipeline = Pipeline::open(config).await.unwrap();

    let report = pipeline
        .ingest(
            ResultKind::Commerce,
            vec![create_order_result("elsewhere", 3), create_order_result("store", 3)],
        )
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    let latest = pipeline.store().latest(ResultKind::Commerce).await;
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].site, "store");
}
