//! Integration tests for notification delivery
//!
//! These tests verify that:
//! - Discord sinks receive the payload wrapped in an embed message
//! - Webhook sinks receive the bare payload document
//! - Delivery failures are swallowed
//! - No sink means no request at all
//! - A sink that never answers does not stall the run

use pretty_assertions::assert_eq;
use serde_json::Value;
use std::time::{Duration, Instant};
use site_pulse::Severity;
use site_pulse::alerts::Alert;
use site_pulse::dispatch::Dispatcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{discord_sink, webhook_sink};

fn test_alert(severity: Severity) -> Alert {
    Alert::new("🚨 Site Uptime Alert", severity)
        .description("1 site down")
        .field("villas (https://villas.example)", "**Status:** 503", false)
}

async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_discord_sink_receives_embed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discord"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::new(discord_sink(
        format!("{}/discord", mock_server.uri()),
        Some("1234"),
    ));
    dispatcher.send(&test_alert(Severity::High)).await;

    let bodies = received_bodies(&mock_server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["content"], "<@1234>");
    assert_eq!(bodies[0]["embeds"][0]["title"], "🚨 Site Uptime Alert");
    assert_eq!(bodies[0]["embeds"][0]["footer"]["text"], "SitePulse Monitoring");
}

#[tokio::test]
async fn test_discord_mention_only_for_high_severity() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::new(discord_sink(mock_server.uri(), Some("1234")));
    dispatcher.send(&test_alert(Severity::Medium)).await;

    let bodies = received_bodies(&mock_server).await;
    assert!(bodies[0].get("content").is_none());
}

#[tokio::test]
async fn test_webhook_sink_receives_bare_payload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let alert = test_alert(Severity::High);
    let dispatcher = Dispatcher::new(webhook_sink(format!("{}/hook", mock_server.uri())));
    dispatcher.send(&alert).await;

    let bodies = received_bodies(&mock_server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["title"], "🚨 Site Uptime Alert");
    assert_eq!(bodies[0]["description"], "1 site down");
    assert_eq!(bodies[0]["color"], alert.color);
    assert_eq!(bodies[0]["fields"][0]["inline"], false);
    assert_eq!(bodies[0]["timestamp"], alert.created_at.to_rfc3339());
    assert!(bodies[0].get("embeds").is_none());
}

#[tokio::test]
async fn test_delivery_failure_is_swallowed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::new(webhook_sink(mock_server.uri()));
    dispatcher.send(&test_alert(Severity::High)).await;

    // unreachable sink
    let dispatcher = Dispatcher::new(webhook_sink("http://127.0.0.1:1/hook".to_string()));
    dispatcher.send(&test_alert(Severity::High)).await;
}

#[tokio::test]
async fn test_hanging_sink_is_abandoned_after_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::with_timeout(
        webhook_sink(mock_server.uri()),
        Duration::from_millis(200),
    );
    let started = Instant::now();
    dispatcher.send(&test_alert(Severity::High)).await;

    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_no_sink_is_a_noop() {
    let dispatcher = Dispatcher::new(None);
    assert!(!dispatcher.is_configured());
    dispatcher.send(&test_alert(Severity::High)).await;
}
