//! Helper functions for integration tests

use site_pulse::{
    CommerceMetrics, Metrics, SiteResult,
    config::{Budget, Config, Discord, NotificationSink, SiteConfig, SiteType, StorageConfig, Webhook},
};
use std::path::Path;

pub fn create_test_site(name: &str, url: &str) -> SiteConfig {
    SiteConfig {
        name: name.to_string(),
        url: url.to_string(),
        site_type: SiteType::Static,
        budget: Budget::default(),
        tags: vec!["test".to_string()],
    }
}

pub fn create_test_config(sites: Vec<SiteConfig>, data_dir: &Path) -> Config {
    Config {
        sites,
        storage: Some(StorageConfig::Files {
            path: data_dir.to_path_buf(),
            summary_cap: 100,
            history_days: 30,
        }),
        notifications: None,
        anomaly: None,
    }
}

pub fn discord_sink(url: String, user_id: Option<&str>) -> Option<NotificationSink> {
    Some(NotificationSink::Discord(Discord {
        url,
        user_id: user_id.map(str::to_string),
    }))
}

pub fn webhook_sink(url: String) -> Option<NotificationSink> {
    Some(NotificationSink::Webhook(Webhook { url }))
}

pub fn create_order_result(site: &str, orders_24h: u64) -> SiteResult {
    SiteResult::new(
        site,
        Metrics::Commerce(CommerceMetrics {
            orders_24h,
            revenue_24h: orders_24h as f64 * 42.0,
            ..Default::default()
        }),
    )
}
