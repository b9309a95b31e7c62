pub mod alerts;
pub mod collectors;
pub mod config;
pub mod discord;
pub mod dispatch;
pub mod monitors;
pub mod pipeline;
pub mod storage;
pub mod util;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered classification shared by issues, anomalies and alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(text)
    }
}

/// The collector kind a result originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Uptime,
    Performance,
    Analytics,
    Commerce,
    Integrity,
}

impl ResultKind {
    pub const ALL: [ResultKind; 5] = [
        ResultKind::Uptime,
        ResultKind::Performance,
        ResultKind::Analytics,
        ResultKind::Commerce,
        ResultKind::Integrity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Uptime => "uptime",
            ResultKind::Performance => "perf",
            ResultKind::Analytics => "analytics",
            ResultKind::Commerce => "commerce",
            ResultKind::Integrity => "integrity",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResultKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uptime" => Ok(ResultKind::Uptime),
            "perf" | "performance" | "lighthouse" => Ok(ResultKind::Performance),
            "analytics" | "matomo" => Ok(ResultKind::Analytics),
            "commerce" | "shopify" | "orders" => Ok(ResultKind::Commerce),
            "integrity" | "wordpress" | "security" => Ok(ResultKind::Integrity),
            other => Err(anyhow::anyhow!("unknown result kind: {other}")),
        }
    }
}

/// One collector invocation for one site.
///
/// Results are immutable once built; defaults for fields a collector could not
/// provide are applied when the result is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteResult {
    pub timestamp: DateTime<Utc>,

    /// Name of the configured site this result belongs to
    pub site: String,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub metrics: Metrics,
}

impl SiteResult {
    pub fn new(site: impl ToString, metrics: Metrics) -> Self {
        Self {
            timestamp: Utc::now(),
            site: site.to_string(),
            success: true,
            error: None,
            metrics,
        }
    }

    pub fn failed(site: impl ToString, metrics: Metrics, error: impl ToString) -> Self {
        Self {
            timestamp: Utc::now(),
            site: site.to_string(),
            success: false,
            error: Some(error.to_string()),
            metrics,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn kind(&self) -> ResultKind {
        self.metrics.kind()
    }
}

/// Kind specific payload of a [`SiteResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Metrics {
    Uptime(UptimeMetrics),
    Performance(PerformanceMetrics),
    Analytics(AnalyticsMetrics),
    Commerce(CommerceMetrics),
    Integrity(IntegrityMetrics),
}

impl Metrics {
    /// All-default payload of `kind`, used for results that carry no data
    pub fn empty(kind: ResultKind) -> Self {
        match kind {
            ResultKind::Uptime => Metrics::Uptime(UptimeMetrics::default()),
            ResultKind::Performance => Metrics::Performance(PerformanceMetrics::default()),
            ResultKind::Analytics => Metrics::Analytics(AnalyticsMetrics::default()),
            ResultKind::Commerce => Metrics::Commerce(CommerceMetrics::default()),
            ResultKind::Integrity => Metrics::Integrity(IntegrityMetrics::default()),
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            Metrics::Uptime(_) => ResultKind::Uptime,
            Metrics::Performance(_) => ResultKind::Performance,
            Metrics::Analytics(_) => ResultKind::Analytics,
            Metrics::Commerce(_) => ResultKind::Commerce,
            Metrics::Integrity(_) => ResultKind::Integrity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UptimeMetrics {
    /// HTTP status code, `0` when no response was received
    pub status_code: u16,
    pub response_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    /// Lighthouse performance score (0-100)
    #[serde(alias = "performance_score")]
    pub score: u8,
    pub lcp_ms: u64,
    pub tbt_ms: u64,
    pub cls: f64,
    pub fcp_ms: u64,
    pub speed_index: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsMetrics {
    pub visits: u64,
    pub unique_visitors: u64,
    pub page_views: u64,
    /// Bounce rate in percent
    pub bounce_rate: f64,
    pub avg_time_on_site: f64,
    pub avg_page_load_time: f64,
    pub visitors_online: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommerceMetrics {
    pub orders_24h: u64,
    pub revenue_24h: f64,
    pub orders_1h: u64,
    pub revenue_1h: f64,
    #[serde(alias = "avg_order_value_24h")]
    pub avg_order_value: f64,
    pub top_products: Vec<ProductSales>,
    pub order_sources: BTreeMap<String, u64>,
    pub payment_methods: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityMetrics {
    pub checks: IntegrityChecks,
    pub issues: Vec<Issue>,
    pub security_score: u8,
}

impl IntegrityMetrics {
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// Outcome of the individual integrity probes.
///
/// Only the verified good practices are typed; everything else a collector
/// reports is carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityChecks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_working: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_enumeration_blocked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins_needing_updates: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive_files_protected: Option<bool>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    pub fn new(issue_type: impl ToString, severity: Severity, message: impl ToString) -> Self {
        Self {
            issue_type: issue_type.to_string(),
            severity,
            message: message.to_string(),
        }
    }
}
