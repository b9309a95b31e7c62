//! Rolling summary entries
//!
//! The daily logs keep complete results. The rolling summary of a site
//! keeps only the handful of numbers a dashboard plots, which keeps the
//! file small enough to be rewritten on every append.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Metrics, Severity, SiteResult};

/// One reduced result inside a rolling site summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub timestamp: DateTime<Utc>,
    pub success: bool,

    /// Kind specific headline values (e.g. `lcp_ms`, `orders_24h`)
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl SummaryEntry {
    /// Reduce a full result to its summary entry
    pub fn from_result(result: &SiteResult) -> Self {
        let values: Vec<(&str, f64)> = match &result.metrics {
            Metrics::Uptime(m) => vec![
                ("status_code", m.status_code as f64),
                ("response_ms", m.response_ms as f64),
            ],
            Metrics::Performance(m) => vec![
                ("performance_score", m.score as f64),
                ("lcp_ms", m.lcp_ms as f64),
                ("tbt_ms", m.tbt_ms as f64),
                ("cls", m.cls),
            ],
            Metrics::Analytics(m) => vec![
                ("visits", m.visits as f64),
                ("unique_visitors", m.unique_visitors as f64),
                ("bounce_rate", m.bounce_rate),
            ],
            Metrics::Commerce(m) => vec![
                ("orders_24h", m.orders_24h as f64),
                ("revenue_24h", m.revenue_24h),
                ("orders_1h", m.orders_1h as f64),
            ],
            Metrics::Integrity(m) => vec![
                ("security_score", m.security_score as f64),
                ("issues", m.issues.len() as f64),
                ("high_issues", m.count(Severity::High) as f64),
            ],
        };

        Self {
            timestamp: result.timestamp,
            success: result.success,
            values: values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}
